//! The pack state aggregate - root of everything a loaded pack collection drives.
//!
//! [`SharedPackState`] owns the live entity set and the five state components.
//! Consumers get the read-only [`PackState`] view; only the host calls the
//! loading and per-frame methods.
//!
//! The live entity set sits behind one lock shared by the load fold, the
//! unload step, the focus pass, and interact dispatch.

mod overriding;
mod pipeline;

pub use overriding::*;
pub use pipeline::*;

use pack_model::{CategoryTree, PackCollection, PointOfInterest, Vec3};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    BehaviorStates, CategoryStates, EffectParameters, EntityContext, EntityKind, FrameView,
    GameTime, ManagedState, MapStates, MarkerEffect, OverlaySettings, PathingEntity, Result,
    RootCategory, TrailEffect, UiStates, UserResourceStates, WorldRenderer,
};

/// Read-only view of the loaded packs and user state.
pub trait PackState: Send + Sync {
    fn settings(&self) -> &OverlaySettings;

    fn current_map_id(&self) -> u32;

    fn root_category(&self) -> Option<Arc<CategoryTree>>;

    fn shared_marker_effect(&self) -> &Arc<MarkerEffect>;

    fn shared_trail_effect(&self) -> &Arc<TrailEffect>;

    fn behavior_states(&self) -> &Arc<BehaviorStates>;

    fn category_states(&self) -> &Arc<CategoryStates>;

    fn map_states(&self) -> &Arc<MapStates>;

    fn user_resource_states(&self) -> &Arc<UserResourceStates>;

    fn ui_states(&self) -> &Arc<UiStates>;

    /// Snapshot of the live entities.
    fn entities(&self) -> Vec<Arc<dyn PathingEntity>>;
}

/// Whether an entity should be drawn this frame.
pub fn is_entity_visible(pack: &dyn PackState, entity: &dyn PathingEntity) -> bool {
    let ui = pack.ui_states();
    let hidden_by_ui = match entity.kind() {
        EntityKind::Marker => ui.markers_hidden(),
        EntityKind::Trail => ui.trails_hidden(),
    };

    !hidden_by_ui
        && entity.map_id() == pack.current_map_id()
        && !pack.category_states().is_namespace_inactive(entity.category())
        && !entity.core().is_hidden_by_behavior()
}

pub struct SharedPackState {
    settings: OverlaySettings,
    root: RootCategory,

    marker_effect: Arc<MarkerEffect>,
    trail_effect: Arc<TrailEffect>,

    category_states: Arc<CategoryStates>,
    behavior_states: Arc<BehaviorStates>,
    map_states: Arc<MapStates>,
    user_resource_states: Arc<UserResourceStates>,
    ui_states: Arc<UiStates>,

    entities: Mutex<Vec<Arc<dyn PathingEntity>>>,
    renderer: Arc<dyn WorldRenderer>,

    initialized: AtomicBool,
    /// Queues overlapping pack loads.
    load_gate: tokio::sync::Mutex<()>,
}

impl SharedPackState {
    /// Build the aggregate. State components are created here but not started
    /// until the first pack load.
    pub fn new(
        settings: OverlaySettings,
        renderer: Arc<dyn WorldRenderer>,
        marker_sink: Arc<dyn EffectParameters>,
        trail_sink: Arc<dyn EffectParameters>,
    ) -> Result<Self> {
        let state_dir = settings.state_dir()?;
        let root = RootCategory::new();

        let behavior_states = Arc::new(BehaviorStates::new(&state_dir));

        Ok(Self {
            category_states: Arc::new(CategoryStates::new(root.clone(), &state_dir)),
            map_states: Arc::new(MapStates::new(behavior_states.clone())),
            user_resource_states: Arc::new(UserResourceStates::new(&state_dir)),
            ui_states: Arc::new(UiStates::new()),
            behavior_states,
            marker_effect: Arc::new(MarkerEffect::new(marker_sink)),
            trail_effect: Arc::new(TrailEffect::new(trail_sink)),
            entities: Mutex::new(Vec::new()),
            renderer,
            initialized: AtomicBool::new(false),
            load_gate: tokio::sync::Mutex::new(()),
            settings,
            root,
        })
    }

    /// Swap in a new pack collection and build its entities.
    ///
    /// The first load starts every state component; later loads reload them.
    /// Either way they run one after another in the order category, behavior,
    /// map, user resource, UI. Entities of an earlier load stay live until
    /// [`unload_packs`](Self::unload_packs) is called.
    pub async fn load_pack_collection(&self, collection: PackCollection) -> Result<usize> {
        let _gate = self.load_gate.lock().await;

        let PackCollection {
            categories,
            points_of_interest,
        } = collection;

        info!(
            categories = categories.len(),
            points = points_of_interest.len(),
            "loading pack collection"
        );
        self.root.replace(categories);

        if self.initialized.load(Ordering::Acquire) {
            self.reload_states().await;
        } else {
            self.init_states().await;
        }

        self.init_points_of_interest(points_of_interest).await
    }

    async fn init_states(&self) {
        self.category_states.start().await;
        self.behavior_states.start().await;
        self.map_states.start().await;
        self.user_resource_states.start().await;
        self.ui_states.start().await;

        self.initialized.store(true, Ordering::Release);
    }

    async fn reload_states(&self) {
        self.category_states.reload().await;
        self.behavior_states.reload().await;
        self.map_states.reload().await;
        self.user_resource_states.reload().await;
        self.ui_states.reload().await;
    }

    /// Build entities off the async runtime, then register them under the entity lock.
    async fn init_points_of_interest(
        &self,
        points_of_interest: Vec<PointOfInterest>,
    ) -> Result<usize> {
        let context = self.entity_context();
        let skip_unsupported = self.settings.skip_unsupported_points;

        let built = tokio::task::spawn_blocking(move || {
            build_entities(&context, points_of_interest, skip_unsupported)
        })
        .await??;

        let count = built.len();
        {
            let mut entities = self.entities.lock();
            entities.reserve(count);

            for entity in built {
                entities.push(entity.clone());
                self.renderer.add_entity(entity.clone());
                entity.fade_in();
            }
        }

        info!(count, "points of interest loaded");
        Ok(count)
    }

    fn entity_context(&self) -> EntityContext {
        EntityContext {
            population: self.user_resource_states.population(),
            behavior_states: self.behavior_states.clone(),
            marker_effect: self.marker_effect.clone(),
            trail_effect: self.trail_effect.clone(),
        }
    }

    /// Drop every live entity and the category tree.
    pub fn unload_packs(&self) {
        {
            let mut entities = self.entities.lock();

            for entity in entities.iter() {
                entity.core().clear_behaviors();
            }

            self.renderer.remove_entities(&entities);

            info!(count = entities.len(), "unloading packs");
            entities.clear();
        }

        self.root.clear();
    }

    /// Per-frame work: state component ticks, then the focus pass.
    pub fn update(&self, game_time: &GameTime) {
        self.category_states.tick(game_time);
        self.behavior_states.tick(game_time);
        self.map_states.tick(game_time);
        self.user_resource_states.tick(game_time);
        self.ui_states.tick(game_time);

        self.focus_pass();
    }

    /// Focus entities whose trigger range contains the player; unfocus the rest.
    fn focus_pass(&self) {
        let entities = self.entities.lock();

        for entity in entities.iter() {
            if entity.distance_to_player() <= entity.trigger_range() {
                entity.focus();
            } else {
                entity.unfocus();
            }
        }
    }

    /// Recompute every live entity's distance to the player.
    pub fn update_player_distances(&self, player_position: Vec3) {
        let entities = self.entities.lock();

        for entity in entities.iter() {
            entity.set_distance_to_player(entity.distance_from(player_position));
        }
    }

    /// Interact with every entity in range. Returns how many were interacted with.
    pub fn on_interact_pressed(&self) -> usize {
        let entities = self.entities.lock();
        let mut interacted = 0;

        for entity in entities.iter() {
            if entity.distance_to_player() <= entity.trigger_range() {
                entity.interact(false);
                interacted += 1;
            }
        }

        debug!(interacted, "interact pressed");
        interacted
    }

    /// Push this frame's shared parameters into both effects.
    pub fn prepare_frame(&self, game_time: &GameTime, view: &FrameView) {
        self.marker_effect.update(game_time, view);
        self.trail_effect.update(game_time, view);
    }

    /// Load each visible entity's draw state into its effect, then hand it to `draw`.
    pub fn draw_visible(&self, mut draw: impl FnMut(&dyn PathingEntity)) -> usize {
        let entities = self.entities.lock();
        let mut drawn = 0;

        for entity in entities.iter() {
            if is_entity_visible(self, entity.as_ref()) {
                entity.apply_effect_state();
                draw(entity.as_ref());
                drawn += 1;
            }
        }

        drawn
    }

    /// Switch the player to `map_id`. Returns whether the map changed.
    pub fn set_current_map(&self, map_id: u32) -> bool {
        self.map_states.set_current_map(map_id)
    }

    /// Flush every state component, in load order.
    pub fn shutdown(&self) {
        self.category_states.shutdown();
        self.behavior_states.shutdown();
        self.map_states.shutdown();
        self.user_resource_states.shutdown();
        self.ui_states.shutdown();
    }

    /// Number of live entities from the last load.
    pub fn entity_count(&self) -> usize {
        self.entities.lock().len()
    }
}

impl PackState for SharedPackState {
    fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    fn current_map_id(&self) -> u32 {
        self.map_states.current_map_id()
    }

    fn root_category(&self) -> Option<Arc<CategoryTree>> {
        self.root.current()
    }

    fn shared_marker_effect(&self) -> &Arc<MarkerEffect> {
        &self.marker_effect
    }

    fn shared_trail_effect(&self) -> &Arc<TrailEffect> {
        &self.trail_effect
    }

    fn behavior_states(&self) -> &Arc<BehaviorStates> {
        &self.behavior_states
    }

    fn category_states(&self) -> &Arc<CategoryStates> {
        &self.category_states
    }

    fn map_states(&self) -> &Arc<MapStates> {
        &self.map_states
    }

    fn user_resource_states(&self) -> &Arc<UserResourceStates> {
        &self.user_resource_states
    }

    fn ui_states(&self) -> &Arc<UiStates> {
        &self.ui_states
    }

    fn entities(&self) -> Vec<Arc<dyn PathingEntity>> {
        self.entities.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::RecordingEffect;
    use crate::entity::testing::CountingBehavior;
    use crate::{EntityRegistry, NullEffect, OverlayError};
    use pack_model::TrailShape;
    use tempfile::TempDir;

    fn pack_state() -> (TempDir, Arc<EntityRegistry>, SharedPackState) {
        let dir = tempfile::tempdir().unwrap();
        let settings = OverlaySettings {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let registry = Arc::new(EntityRegistry::new());
        let state = SharedPackState::new(
            settings,
            registry.clone(),
            Arc::new(NullEffect),
            Arc::new(NullEffect),
        )
        .unwrap();
        (dir, registry, state)
    }

    fn collection() -> PackCollection {
        PackCollection::new(
            CategoryTree::from_namespaces(["wvw.reset", "pve"]),
            vec![
                PointOfInterest::marker("wvw.reset")
                    .with_map_id(38)
                    .with_attribute("xpos", "0")
                    .with_attribute("ypos", "0")
                    .with_attribute("zpos", "0"),
                PointOfInterest::marker("pve")
                    .with_map_id(38)
                    .with_attribute("xpos", "100"),
                PointOfInterest::trail("pve", TrailShape::new(38, vec![Vec3::new(50.0, 0.0, 0.0)])),
            ],
        )
    }

    #[tokio::test]
    async fn test_load_registers_every_entity() {
        let (_dir, registry, state) = pack_state();

        let count = state.load_pack_collection(collection()).await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(state.entity_count(), 3);
        assert_eq!(registry.len(), 3);
        assert!(state.root_category().is_some());
        for entity in state.entities() {
            assert_eq!(entity.core().appearance(), crate::Appearance::FadingIn);
        }
    }

    #[tokio::test]
    async fn test_focus_pass_follows_player_distance() {
        let (_dir, _registry, state) = pack_state();
        state.load_pack_collection(collection()).await.unwrap();

        state.update_player_distances(Vec3::new(1.0, 0.0, 0.0));
        state.update(&GameTime::from_millis(16));

        let focused: Vec<_> = state
            .entities()
            .into_iter()
            .filter(|e| e.core().is_focused())
            .map(|e| e.category().to_string())
            .collect();
        assert_eq!(focused, vec!["wvw.reset".to_string()]);

        state.update_player_distances(Vec3::new(100.0, 0.0, 0.0));
        state.update(&GameTime::from_millis(32));

        let focused: Vec<_> = state
            .entities()
            .into_iter()
            .filter(|e| e.core().is_focused())
            .map(|e| e.category().to_string())
            .collect();
        assert_eq!(focused, vec!["pve".to_string()]);
    }

    #[tokio::test]
    async fn test_interact_reaches_every_entity_in_range() {
        let (_dir, _registry, state) = pack_state();
        state
            .load_pack_collection(PackCollection::new(
                CategoryTree::from_namespaces(["wvw"]),
                vec![
                    PointOfInterest::marker("wvw").with_attribute("triggerrange", "5"),
                    PointOfInterest::marker("wvw").with_attribute("triggerrange", "5"),
                    PointOfInterest::marker("wvw").with_attribute("xpos", "50"),
                ],
            ))
            .await
            .unwrap();

        let interacted = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        for entity in state.entities() {
            entity.core().add_behavior(Box::new(CountingBehavior {
                interacted: interacted.clone(),
                ..Default::default()
            }));
        }

        state.update_player_distances(Vec3::ZERO);
        assert_eq!(state.on_interact_pressed(), 2);
        assert_eq!(interacted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unload_clears_entities_and_tree() {
        let (_dir, registry, state) = pack_state();
        state.load_pack_collection(collection()).await.unwrap();
        let entities = state.entities();

        state.unload_packs();

        assert_eq!(state.entity_count(), 0);
        assert!(registry.is_empty());
        assert!(state.root_category().is_none());
        assert!(entities.iter().all(|e| e.core().behavior_count() == 0));
    }

    #[tokio::test]
    async fn test_routes_abort_the_load_by_default() {
        let (_dir, registry, state) = pack_state();
        let mut collection = collection();
        collection.points_of_interest.push(PointOfInterest::route("pve"));

        let result = state.load_pack_collection(collection).await;

        assert!(matches!(result, Err(OverlayError::Unsupported(_))));
        assert_eq!(state.entity_count(), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_second_load_reloads_states() {
        let (_dir, _registry, state) = pack_state();
        state.load_pack_collection(collection()).await.unwrap();

        state.category_states().set_namespace_inactive("wvw", true);
        state.unload_packs();

        let next = PackCollection::new(CategoryTree::from_namespaces(["pve"]), Vec::new());
        state.load_pack_collection(next).await.unwrap();
        state.update(&GameTime::from_millis(100));

        let tree = state.root_category().unwrap();
        assert!(state.category_states().is_category_inactive(tree.find("wvw").unwrap()));
        assert!(state.category_states().is_namespace_inactive("wvw"));
    }

    #[tokio::test]
    async fn test_visibility_combines_all_filters() {
        let (_dir, _registry, state) = pack_state();
        state.load_pack_collection(collection()).await.unwrap();
        state.set_current_map(38);

        let marker = state
            .entities()
            .into_iter()
            .find(|e| e.category() == "wvw.reset")
            .unwrap();
        assert!(is_entity_visible(&state, marker.as_ref()));

        state.category_states().set_namespace_inactive("wvw", true);
        state.update(&GameTime::from_millis(100));
        assert!(!is_entity_visible(&state, marker.as_ref()));

        state.category_states().set_namespace_inactive("wvw", false);
        state.update(&GameTime::from_millis(200));
        assert!(is_entity_visible(&state, marker.as_ref()));

        state.ui_states().set_markers_hidden(true);
        assert!(!is_entity_visible(&state, marker.as_ref()));
        state.ui_states().set_markers_hidden(false);

        state.set_current_map(15);
        assert!(!is_entity_visible(&state, marker.as_ref()));
    }

    #[tokio::test]
    async fn test_draw_pushes_state_of_visible_entities_only() {
        let dir = tempfile::tempdir().unwrap();
        let settings = OverlaySettings {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let markers = Arc::new(RecordingEffect::default());
        let trails = Arc::new(RecordingEffect::default());
        let registry = Arc::new(EntityRegistry::new());
        let state =
            SharedPackState::new(settings, registry, markers.clone(), trails.clone()).unwrap();
        state.load_pack_collection(collection()).await.unwrap();
        state.set_current_map(38);

        state.prepare_frame(&GameTime::from_millis(16), &FrameView::default());
        assert_eq!(markers.count("TotalMilliseconds"), 1);
        assert_eq!(trails.count("TotalMilliseconds"), 1);

        state.ui_states().set_trails_hidden(true);
        let mut drawn = Vec::new();
        assert_eq!(state.draw_visible(|e| drawn.push(e.kind())), 2);

        assert_eq!(drawn, vec![EntityKind::Marker, EntityKind::Marker]);
        assert_eq!(markers.count("Opacity"), 1);
        assert_eq!(trails.count("Opacity"), 0);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_category_state() {
        let (dir, _registry, state) = pack_state();
        state.load_pack_collection(collection()).await.unwrap();

        state.category_states().set_namespace_inactive("pve", true);
        state.shutdown();

        let path = dir.path().join(crate::STATE_DIR).join(crate::CATEGORY_STATE_FILE);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "pve\n");
    }
}
