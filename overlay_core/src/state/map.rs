//! Tracks the map the player is on.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::info;

use super::{BehaviorStates, GameTime, Lifecycle, ManagedState};

#[derive(Debug)]
pub struct MapStates {
    lifecycle: Lifecycle,
    current_map_id: AtomicU32,
    behavior_states: Arc<BehaviorStates>,
}

impl MapStates {
    /// Map tracking starts on map 0, meaning no map loaded.
    pub fn new(behavior_states: Arc<BehaviorStates>) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            current_map_id: AtomicU32::new(0),
            behavior_states,
        }
    }

    pub fn current_map_id(&self) -> u32 {
        self.current_map_id.load(Ordering::Acquire)
    }

    /// Record the player's map. Returns `true` if it changed.
    pub fn set_current_map(&self, map_id: u32) -> bool {
        let previous = self.current_map_id.swap(map_id, Ordering::AcqRel);
        if previous == map_id {
            return false;
        }

        info!(from = previous, to = map_id, "map changed");
        self.behavior_states.clear_map_scoped();
        true
    }
}

impl ManagedState for MapStates {
    fn name(&self) -> &'static str {
        "maps"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn initialize(&self) -> bool {
        true
    }

    async fn reload(&self) {}

    fn update(&self, _game_time: &GameTime) {}

    fn unload(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HideScope;
    use uuid::Uuid;

    #[test]
    fn test_map_change_clears_map_scoped_hides() {
        let dir = tempfile::tempdir().unwrap();
        let behaviors = Arc::new(BehaviorStates::new(dir.path()));
        let maps = MapStates::new(behaviors.clone());

        let guid = Uuid::new_v4();
        behaviors.hide(guid, HideScope::MapChange);

        assert!(maps.set_current_map(15));
        assert_eq!(maps.current_map_id(), 15);
        assert!(!behaviors.is_hidden(guid));

        behaviors.hide(guid, HideScope::MapChange);
        assert!(!maps.set_current_map(15));
        assert!(behaviors.is_hidden(guid));
    }
}
