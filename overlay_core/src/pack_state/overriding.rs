//! A pack state view with selected values replaced, used for previews.

use pack_model::CategoryTree;
use std::sync::Arc;

use super::PackState;
use crate::{
    BehaviorStates, CategoryStates, MapStates, MarkerEffect, OverlaySettings, PathingEntity,
    TrailEffect, UiStates, UserResourceStates,
};

/// Delegates to another [`PackState`] except where an override is set.
pub struct OverridingPackState {
    reference: Arc<dyn PackState>,
    current_map_id: Option<u32>,
}

impl OverridingPackState {
    /// A view with no overrides yet.
    pub fn new(reference: Arc<dyn PackState>) -> Self {
        Self {
            reference,
            current_map_id: None,
        }
    }

    /// Report `map_id` as the current map regardless of the reference.
    pub fn with_current_map_id(mut self, map_id: u32) -> Self {
        self.current_map_id = Some(map_id);
        self
    }
}

impl PackState for OverridingPackState {
    fn settings(&self) -> &OverlaySettings {
        self.reference.settings()
    }

    fn current_map_id(&self) -> u32 {
        self.current_map_id
            .unwrap_or_else(|| self.reference.current_map_id())
    }

    fn root_category(&self) -> Option<Arc<CategoryTree>> {
        self.reference.root_category()
    }

    fn shared_marker_effect(&self) -> &Arc<MarkerEffect> {
        self.reference.shared_marker_effect()
    }

    fn shared_trail_effect(&self) -> &Arc<TrailEffect> {
        self.reference.shared_trail_effect()
    }

    fn behavior_states(&self) -> &Arc<BehaviorStates> {
        self.reference.behavior_states()
    }

    fn category_states(&self) -> &Arc<CategoryStates> {
        self.reference.category_states()
    }

    fn map_states(&self) -> &Arc<MapStates> {
        self.reference.map_states()
    }

    fn user_resource_states(&self) -> &Arc<UserResourceStates> {
        self.reference.user_resource_states()
    }

    fn ui_states(&self) -> &Arc<UiStates> {
        self.reference.ui_states()
    }

    fn entities(&self) -> Vec<Arc<dyn PathingEntity>> {
        self.reference.entities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{is_entity_visible, EntityRegistry, NullEffect, SharedPackState};
    use pack_model::{PackCollection, PointOfInterest};

    fn shared_state(dir: &std::path::Path) -> Arc<SharedPackState> {
        let settings = OverlaySettings {
            data_dir: Some(dir.to_path_buf()),
            ..Default::default()
        };
        let registry = Arc::new(EntityRegistry::new());
        let effect = Arc::new(NullEffect);
        let state = SharedPackState::new(settings, registry, effect.clone(), effect);
        Arc::new(state.unwrap())
    }

    #[tokio::test]
    async fn test_map_override_changes_visibility_only_in_the_view() {
        let dir = tempfile::tempdir().unwrap();
        let shared = shared_state(dir.path());
        shared
            .load_pack_collection(PackCollection::new(
                CategoryTree::from_namespaces(["wvw"]),
                vec![PointOfInterest::marker("wvw").with_map_id(38)],
            ))
            .await
            .unwrap();
        shared.set_current_map(15);

        let preview = OverridingPackState::new(shared.clone()).with_current_map_id(38);
        let marker = shared.entities().remove(0);

        assert_eq!(preview.current_map_id(), 38);
        assert_eq!(shared.current_map_id(), 15);
        assert!(is_entity_visible(&preview, marker.as_ref()));
        assert!(!is_entity_visible(&*shared, marker.as_ref()));
        assert!(Arc::ptr_eq(preview.category_states(), shared.category_states()));
    }

    #[test]
    fn test_without_override_map_id_is_delegated() {
        let dir = tempfile::tempdir().unwrap();
        let shared = shared_state(dir.path());
        shared.set_current_map(50);

        let view = OverridingPackState::new(shared.clone());
        assert_eq!(view.current_map_id(), 50);
        assert!(view.root_category().is_none());
    }
}
