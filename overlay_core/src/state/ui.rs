//! Global display toggles set from the settings UI.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{GameTime, Lifecycle, ManagedState};

#[derive(Debug, Default)]
pub struct UiStates {
    lifecycle: Lifecycle,
    hide_all_markers: AtomicBool,
    hide_all_trails: AtomicBool,
}

impl UiStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the user has hidden all markers.
    pub fn markers_hidden(&self) -> bool {
        self.hide_all_markers.load(Ordering::Relaxed)
    }

    pub fn set_markers_hidden(&self, hidden: bool) {
        self.hide_all_markers.store(hidden, Ordering::Relaxed);
    }

    /// Whether the user has hidden all trails.
    pub fn trails_hidden(&self) -> bool {
        self.hide_all_trails.load(Ordering::Relaxed)
    }

    pub fn set_trails_hidden(&self, hidden: bool) {
        self.hide_all_trails.store(hidden, Ordering::Relaxed);
    }
}

impl ManagedState for UiStates {
    fn name(&self) -> &'static str {
        "ui"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn initialize(&self) -> bool {
        true
    }

    /// Toggles are session-scoped and survive pack swaps.
    async fn reload(&self) {}

    fn update(&self, _game_time: &GameTime) {}

    fn unload(&self) {}
}
