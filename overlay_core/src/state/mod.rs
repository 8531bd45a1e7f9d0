//! Persisted per-user state and the lifecycle every state component shares.
//!
//! Each component is started once (`start` → `initialize`), ticked every
//! frame (`tick` → `update`), reloaded on pack swaps, and flushed on shutdown.
//! Expensive work inside `update` is gated by [`Cadence`] and dirty flags so
//! the frame tick itself stays cheap.

mod behavior;
mod cadence;
mod category;
mod map;
mod store;
mod ui;
mod user_resource;

pub use behavior::*;
pub use cadence::*;
pub use category::*;
pub use map::*;
pub use store::*;
pub use ui::*;
pub use user_resource::*;

use pack_model::CategoryTree;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Frame timing handed to every update tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTime {
    /// Time since the host started.
    pub total: Duration,
    /// Time since the previous frame.
    pub elapsed: Duration,
}

impl GameTime {
    pub fn new(total: Duration, elapsed: Duration) -> Self {
        Self { total, elapsed }
    }

    /// A frame at `total_ms` with no elapsed time.
    pub fn from_millis(total_ms: u64) -> Self {
        Self::new(Duration::from_millis(total_ms), Duration::ZERO)
    }

    /// Total game time in milliseconds, as shaders expect it.
    pub fn total_millis(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }
}

/// Slot holding the category tree of the currently loaded packs.
///
/// Shared by the pack state aggregate (which replaces it on every load) and
/// the state components (which resolve namespaces against it).
#[derive(Debug, Clone, Default)]
pub struct RootCategory(Arc<RwLock<Option<Arc<CategoryTree>>>>);

impl RootCategory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaded tree, or `None` between unload and the next load.
    pub fn current(&self) -> Option<Arc<CategoryTree>> {
        self.0.read().clone()
    }

    /// Publish a freshly loaded tree.
    pub fn replace(&self, tree: Arc<CategoryTree>) {
        *self.0.write() = Some(tree);
    }

    /// Drop the tree on unload.
    pub fn clear(&self) {
        *self.0.write() = None;
    }
}

/// Running flag shared by the lifecycle wrapper methods.
#[derive(Debug, Default)]
pub struct Lifecycle {
    running: AtomicBool,
}

impl Lifecycle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn set_running(&self, running: bool) -> bool {
        self.running.swap(running, Ordering::AcqRel)
    }
}

/// Contract implemented by every persisted-state component.
pub trait ManagedState: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn lifecycle(&self) -> &Lifecycle;

    /// One-time setup, e.g. reading the persisted record. Returns `false` if
    /// setup failed; the component then runs with empty state.
    fn initialize(&self) -> impl Future<Output = bool> + Send;

    /// Drop all in-memory state and load again against the current tree.
    fn reload(&self) -> impl Future<Output = ()> + Send;

    /// Per-frame work. Must stay cheap.
    fn update(&self, game_time: &GameTime);

    /// Flush pending state to durable storage.
    fn unload(&self);

    /// Initialize, then accept update ticks.
    fn start(&self) -> impl Future<Output = bool> + Send {
        async move {
            let initialized = self.initialize().await;
            if !initialized {
                warn!(state = self.name(), "initialization failed, continuing with empty state");
            }
            self.lifecycle().set_running(true);
            debug!(state = self.name(), "started");
            initialized
        }
    }

    /// Run `update` if the component has been started.
    fn tick(&self, game_time: &GameTime) {
        if self.lifecycle().is_running() {
            self.update(game_time);
        }
    }

    /// Stop ticking and flush. Only the first call after `start` unloads.
    fn shutdown(&self) {
        if self.lifecycle().set_running(false) {
            self.unload();
            debug!(state = self.name(), "unloaded");
        }
    }
}
