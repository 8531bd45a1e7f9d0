//! Inactive category tracking.
//!
//! Two sets are kept:
//! - the raw set: categories the user explicitly toggled off, persisted to
//!   `categories.txt` one namespace per line
//! - the flattened set: folded namespaces of every raw-inactive category and
//!   all of its descendants, rebuilt wholesale whenever the raw set changes
//!
//! Render-path queries only touch the flattened set. Each set has its own
//! lock, and neither is held while the other is taken except to copy a
//! snapshot.

use pack_model::{normalize_namespace, CategoryId};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{DirtyCadence, GameTime, Lifecycle, LineStore, ManagedState, RootCategory};

pub const CATEGORY_STATE_FILE: &str = "categories.txt";

pub const INTERVAL_SAVE_STATE: Duration = Duration::from_millis(5000);
pub const INTERVAL_UPDATE_INACTIVE_CATEGORIES: Duration = Duration::from_millis(100);

/// How many times each background pass has actually run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassCounts {
    pub recalculations: u64,
    pub saves: u64,
}

#[derive(Debug)]
pub struct CategoryStates {
    lifecycle: Lifecycle,
    root: RootCategory,
    store: LineStore,

    /// Explicitly inactive categories with the namespace they were toggled under.
    raw_inactive: Mutex<HashMap<CategoryId, String>>,
    /// Folded namespaces that are effectively inactive.
    inactive_namespaces: RwLock<HashSet<String>>,

    save_pass: DirtyCadence,
    calculation_pass: DirtyCadence,

    /// Serializes initialize and reload.
    load_gate: tokio::sync::Mutex<()>,
    /// Held across a save's dirty check and write, and across reload's clear.
    persist_gate: Mutex<()>,

    recalculations: AtomicU64,
    saves: AtomicU64,
}

impl CategoryStates {
    /// Toggles resolved against `root`, persisted under `state_dir`.
    pub fn new(root: RootCategory, state_dir: impl AsRef<Path>) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            root,
            store: LineStore::new(state_dir, CATEGORY_STATE_FILE),
            raw_inactive: Mutex::new(HashMap::new()),
            inactive_namespaces: RwLock::new(HashSet::new()),
            save_pass: DirtyCadence::new(INTERVAL_SAVE_STATE),
            calculation_pass: DirtyCadence::new(INTERVAL_UPDATE_INACTIVE_CATEGORIES),
            load_gate: tokio::sync::Mutex::new(()),
            persist_gate: Mutex::new(()),
            recalculations: AtomicU64::new(0),
            saves: AtomicU64::new(0),
        }
    }

    pub fn state_file(&self) -> &Path {
        self.store.path()
    }

    /// Whether a namespace is effectively inactive (itself or an ancestor toggled off).
    ///
    /// Reflects the last recalculation pass, not toggles made since.
    pub fn is_namespace_inactive(&self, namespace: &str) -> bool {
        self.inactive_namespaces
            .read()
            .contains(normalize_namespace(namespace).as_ref())
    }

    /// Whether this exact category was explicitly toggled off.
    pub fn is_category_inactive(&self, category: CategoryId) -> bool {
        self.raw_inactive.lock().contains_key(&category)
    }

    /// Toggle a category. Ids that do not belong to the current tree are ignored.
    pub fn set_inactive(&self, category: CategoryId, is_inactive: bool) {
        let namespace = self
            .root
            .current()
            .and_then(|tree| tree.namespace(category));

        let Some(namespace) = namespace else {
            warn!(%category, "ignoring toggle for a category outside the loaded tree");
            return;
        };

        {
            let mut raw = self.raw_inactive.lock();
            raw.remove(&category);
            if is_inactive {
                raw.insert(category, namespace);
            }
        }

        self.save_pass.mark_dirty();
        self.calculation_pass.mark_dirty();
    }

    /// Toggle a category by namespace, creating it if the tree lacks it.
    pub fn set_namespace_inactive(&self, namespace: &str, is_inactive: bool) {
        match self.root.current() {
            Some(tree) => self.set_inactive(tree.get_or_add(namespace), is_inactive),
            None => warn!(namespace, "ignoring toggle while no packs are loaded"),
        }
    }

    /// Namespaces of the explicitly inactive categories.
    pub fn inactive_category_namespaces(&self) -> Vec<String> {
        self.raw_inactive.lock().values().cloned().collect()
    }

    /// How many resolve and save passes have run so far.
    pub fn pass_counts(&self) -> PassCounts {
        PassCounts {
            recalculations: self.recalculations.load(Ordering::Relaxed),
            saves: self.saves.load(Ordering::Relaxed),
        }
    }

    /// Rebuild the flattened set from a snapshot of the raw set.
    fn calculate_optimized_category_states(&self) {
        let inactive: Vec<CategoryId> = self.raw_inactive.lock().keys().copied().collect();

        let mut namespaces = HashSet::new();
        if let Some(tree) = self.root.current() {
            for category in inactive {
                tree.collect_subtree_namespaces(category, &mut namespaces);
            }
        }

        debug!(count = namespaces.len(), "recalculated inactive namespaces");
        *self.inactive_namespaces.write() = namespaces;
        self.recalculations.fetch_add(1, Ordering::Relaxed);
    }

    /// Write the raw set. Returns `false` if the write failed.
    fn save_state(&self) -> bool {
        let namespaces = self.inactive_category_namespaces();
        self.saves.fetch_add(1, Ordering::Relaxed);

        match self.store.write_records(&namespaces) {
            Ok(()) => {
                debug!(count = namespaces.len(), "saved category states");
                true
            }
            Err(e) => {
                let path = self.store.path().display();
                error!(path = %path, error = %e, "failed to write {CATEGORY_STATE_FILE}");
                false
            }
        }
    }

    /// Read the persisted record into the raw set, resolving each namespace
    /// against the current tree.
    async fn load_state(&self) -> bool {
        let (recorded, ok) = match self.store.read_records().await {
            Ok(records) => (records, true),
            Err(e) => {
                let path = self.store.path().display();
                error!(path = %path, error = %e, "failed to read {CATEGORY_STATE_FILE}");
                (Vec::new(), false)
            }
        };

        let Some(tree) = self.root.current() else {
            warn!("no category tree loaded, recorded category states were not applied");
            return ok;
        };

        // Namespaces the tree no longer defines are created as phantom categories.
        let resolved: Vec<(CategoryId, String)> = recorded
            .into_iter()
            .map(|namespace| (tree.get_or_add(&namespace), namespace))
            .collect();

        {
            let mut raw = self.raw_inactive.lock();
            raw.clear();
            raw.extend(resolved);
        }

        self.calculation_pass.mark_dirty();
        ok
    }
}

impl ManagedState for CategoryStates {
    fn name(&self) -> &'static str {
        "categories"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn initialize(&self) -> bool {
        let _gate = self.load_gate.lock().await;
        self.load_state().await
    }

    async fn reload(&self) {
        let _gate = self.load_gate.lock().await;

        {
            let _persist = self.persist_gate.lock();
            self.save_pass.flush(|| self.save_state());

            self.inactive_namespaces.write().clear();
            self.raw_inactive.lock().clear();
        }

        self.load_state().await;
    }

    fn update(&self, game_time: &GameTime) {
        self.calculation_pass.run_if_due(game_time, || {
            self.calculate_optimized_category_states();
            true
        });

        let _persist = self.persist_gate.lock();
        self.save_pass.run_if_due(game_time, || self.save_state());
    }

    fn unload(&self) {
        let _persist = self.persist_gate.lock();
        self.save_pass.flush(|| self.save_state());
    }
}
