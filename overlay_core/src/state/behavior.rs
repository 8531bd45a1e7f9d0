//! Marker visibility driven by behaviors (hidden after activation).

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{DirtyCadence, GameTime, Lifecycle, LineStore, ManagedState};

pub const BEHAVIOR_STATE_FILE: &str = "hidden_markers.txt";

pub const INTERVAL_SAVE_BEHAVIOR_STATE: Duration = Duration::from_millis(5000);

/// How long a marker stays hidden once its behavior hides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HideScope {
    /// Until the player changes maps.
    MapChange,
    /// For good; persisted across sessions.
    Permanent,
}

/// Markers hidden by their behaviors, keyed by marker GUID.
#[derive(Debug)]
pub struct BehaviorStates {
    lifecycle: Lifecycle,
    store: LineStore,
    hidden_permanently: Mutex<HashSet<Uuid>>,
    hidden_until_map_change: Mutex<HashSet<Uuid>>,
    save_pass: DirtyCadence,
    load_gate: tokio::sync::Mutex<()>,
    /// Held across a save's dirty check and write, and across reload's clear.
    persist_gate: Mutex<()>,
}

impl BehaviorStates {
    /// Create an empty store persisting to `hidden_markers.txt` in `state_dir`.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            store: LineStore::new(state_dir, BEHAVIOR_STATE_FILE),
            hidden_permanently: Mutex::new(HashSet::new()),
            hidden_until_map_change: Mutex::new(HashSet::new()),
            save_pass: DirtyCadence::new(INTERVAL_SAVE_BEHAVIOR_STATE),
            load_gate: tokio::sync::Mutex::new(()),
            persist_gate: Mutex::new(()),
        }
    }

    /// Hide a marker for the given scope.
    pub fn hide(&self, guid: Uuid, scope: HideScope) {
        match scope {
            HideScope::MapChange => {
                self.hidden_until_map_change.lock().insert(guid);
            }
            HideScope::Permanent => {
                if self.hidden_permanently.lock().insert(guid) {
                    self.save_pass.mark_dirty();
                }
            }
        }
    }

    /// Whether a marker is hidden under either scope.
    pub fn is_hidden(&self, guid: Uuid) -> bool {
        self.hidden_permanently.lock().contains(&guid)
            || self.hidden_until_map_change.lock().contains(&guid)
    }

    /// Forget map-scoped hides; called when the current map changes.
    pub fn clear_map_scoped(&self) {
        let mut hidden = self.hidden_until_map_change.lock();
        if !hidden.is_empty() {
            debug!(count = hidden.len(), "clearing map-scoped hidden markers");
            hidden.clear();
        }
    }

    fn save_state(&self) -> bool {
        let hidden: Vec<String> = self
            .hidden_permanently
            .lock()
            .iter()
            .map(|guid| guid.hyphenated().to_string())
            .collect();

        match self.store.write_records(&hidden) {
            Ok(()) => true,
            Err(e) => {
                let path = self.store.path().display();
                error!(path = %path, error = %e, "failed to write {BEHAVIOR_STATE_FILE}");
                false
            }
        }
    }

    async fn load_state(&self) -> bool {
        let records = match self.store.read_records().await {
            Ok(records) => records,
            Err(e) => {
                let path = self.store.path().display();
                error!(path = %path, error = %e, "failed to read {BEHAVIOR_STATE_FILE}");
                return false;
            }
        };

        let mut guids = HashSet::with_capacity(records.len());
        for record in records {
            match Uuid::parse_str(record.trim()) {
                Ok(guid) => {
                    guids.insert(guid);
                }
                Err(_) => warn!(record = %record, "skipping malformed hidden marker record"),
            }
        }

        // Merged, so hides recorded while the file was being read are kept.
        self.hidden_permanently.lock().extend(guids);
        true
    }
}

impl ManagedState for BehaviorStates {
    fn name(&self) -> &'static str {
        "behaviors"
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

            self.hidden_permanently.lock().clear();
            self.hidden_until_map_change.lock().clear();
        }

        self.load_state().await;
    }

    fn update(&self, game_time: &GameTime) {
        let _persist = self.persist_gate.lock();
        self.save_pass.run_if_due(game_time, || self.save_state());
    }

    fn unload(&self) {
        let _persist = self.persist_gate.lock();
        self.save_pass.flush(|| self.save_state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permanent_hides_persist() {
        let dir = tempfile::tempdir().unwrap();
        let guid = Uuid::new_v4();

        let states = BehaviorStates::new(dir.path());
        states.start().await;
        states.hide(guid, HideScope::Permanent);
        states.shutdown();

        let reloaded = BehaviorStates::new(dir.path());
        reloaded.start().await;
        assert!(reloaded.is_hidden(guid));
    }

    #[tokio::test]
    async fn test_map_scoped_hides_clear() {
        let dir = tempfile::tempdir().unwrap();
        let guid = Uuid::new_v4();

        let states = BehaviorStates::new(dir.path());
        states.start().await;
        states.hide(guid, HideScope::MapChange);
        assert!(states.is_hidden(guid));

        states.clear_map_scoped();
        assert!(!states.is_hidden(guid));

        states.shutdown();
        assert!(!dir.path().join(BEHAVIOR_STATE_FILE).exists());
    }

    #[tokio::test]
    async fn test_reload_keeps_persisted_and_pending_hides() {
        let dir = tempfile::tempdir().unwrap();
        let recorded = Uuid::new_v4();
        let pending = Uuid::new_v4();
        let contents = format!("{}\n", recorded.hyphenated());
        std::fs::write(dir.path().join(BEHAVIOR_STATE_FILE), contents).unwrap();

        let states = BehaviorStates::new(dir.path());
        states.hide(pending, HideScope::Permanent);
        assert!(states.start().await);
        assert!(states.is_hidden(recorded));
        assert!(states.is_hidden(pending));

        states.reload().await;
        assert!(states.is_hidden(recorded));
        assert!(states.is_hidden(pending));

        let saved = std::fs::read_to_string(dir.path().join(BEHAVIOR_STATE_FILE)).unwrap();
        assert_eq!(saved.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let guid = Uuid::new_v4();
        std::fs::write(
            dir.path().join(BEHAVIOR_STATE_FILE),
            format!("not-a-guid\n{}\n", guid.hyphenated()),
        )
        .unwrap();

        let states = BehaviorStates::new(dir.path());
        assert!(states.start().await);
        assert!(states.is_hidden(guid));
    }
}
