//! Runtime entities built from points of interest.

mod behavior;
mod marker;
mod trail;

pub use behavior::*;
pub use marker::*;
pub use trail::*;

use pack_model::Vec3;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::{BehaviorStates, MarkerEffect, PopulationDefaults, TrailEffect};

/// Unique identifier for live entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an entity ID from a pack-supplied GUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Marker,
    Trail,
}

/// Where an entity is in its appearance transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Hidden,
    FadingIn,
}

/// Everything entity construction needs from the pack state, cloned once per load.
#[derive(Debug, Clone)]
pub struct EntityContext {
    pub population: PopulationDefaults,
    pub behavior_states: Arc<BehaviorStates>,
    pub marker_effect: Arc<MarkerEffect>,
    pub trail_effect: Arc<TrailEffect>,
}

/// State shared by every kind of entity.
#[derive(Debug)]
pub struct EntityCore {
    id: EntityId,
    category: String,
    map_id: u32,
    position: Vec3,
    trigger_range: f32,
    /// `f32` bits; written by the distance pass, read by the focus pass.
    distance_to_player: AtomicU32,
    focused: AtomicBool,
    appearance: Mutex<Appearance>,
    behaviors: Mutex<Vec<Box<dyn Behavior>>>,
}

impl EntityCore {
    pub fn new(
        id: EntityId,
        category: impl Into<String>,
        map_id: u32,
        position: Vec3,
        trigger_range: f32,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            map_id,
            position,
            trigger_range,
            distance_to_player: AtomicU32::new(f32::MAX.to_bits()),
            focused: AtomicBool::new(false),
            appearance: Mutex::new(Appearance::Hidden),
            behaviors: Mutex::new(Vec::new()),
        }
    }

    /// Stable while the pack keeps the same GUID.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Namespace of the category this entity is filed under.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn map_id(&self) -> u32 {
        self.map_id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn trigger_range(&self) -> f32 {
        self.trigger_range
    }

    /// Distance from the last player update, `f32::MAX` before the first.
    pub fn distance_to_player(&self) -> f32 {
        f32::from_bits(self.distance_to_player.load(Ordering::Relaxed))
    }

    pub fn set_distance_to_player(&self, distance: f32) {
        self.distance_to_player
            .store(distance.to_bits(), Ordering::Relaxed);
    }

    /// Whether the player is inside the trigger range.
    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::Acquire)
    }

    pub fn appearance(&self) -> Appearance {
        *self.appearance.lock()
    }

    pub fn add_behavior(&self, behavior: Box<dyn Behavior>) {
        self.behaviors.lock().push(behavior);
    }

    pub fn behavior_count(&self) -> usize {
        self.behaviors.lock().len()
    }

    pub fn clear_behaviors(&self) {
        self.behaviors.lock().clear();
    }

    /// Whether any attached behavior currently hides this entity.
    pub fn is_hidden_by_behavior(&self) -> bool {
        self.behaviors.lock().iter().any(|b| b.is_hiding(self))
    }

    /// Mark focused. Behaviors hear about it only on the transition; returns
    /// whether this call was the transition.
    pub fn focus(&self) -> bool {
        if self.focused.swap(true, Ordering::AcqRel) {
            return false;
        }
        for behavior in self.behaviors.lock().iter() {
            behavior.focus(self);
        }
        true
    }

    pub fn unfocus(&self) -> bool {
        if !self.focused.swap(false, Ordering::AcqRel) {
            return false;
        }
        for behavior in self.behaviors.lock().iter() {
            behavior.unfocus(self);
        }
        true
    }

    /// Run every attached behavior's interaction.
    pub fn interact(&self, autotriggered: bool) {
        for behavior in self.behaviors.lock().iter() {
            behavior.interact(self, autotriggered);
        }
    }

    pub fn fade_in(&self) {
        *self.appearance.lock() = Appearance::FadingIn;
    }
}

/// A live marker or trail.
///
/// Shared between the pack state (which owns the live set) and the renderer
/// (which only holds a registration).
pub trait PathingEntity: Send + Sync + std::fmt::Debug {
    fn core(&self) -> &EntityCore;

    fn kind(&self) -> EntityKind;

    /// Push this entity's per-draw values into its shared effect.
    fn apply_effect_state(&self);

    fn id(&self) -> EntityId {
        self.core().id()
    }

    fn category(&self) -> &str {
        self.core().category()
    }

    fn map_id(&self) -> u32 {
        self.core().map_id()
    }

    fn trigger_range(&self) -> f32 {
        self.core().trigger_range()
    }

    fn distance_to_player(&self) -> f32 {
        self.core().distance_to_player()
    }

    fn set_distance_to_player(&self, distance: f32) {
        self.core().set_distance_to_player(distance);
    }

    /// Distance from a player position to this entity.
    fn distance_from(&self, player: Vec3) -> f32 {
        self.core().position().distance(player)
    }

    fn focus(&self) {
        self.core().focus();
    }

    fn unfocus(&self) {
        self.core().unfocus();
    }

    fn interact(&self, autotriggered: bool) {
        self.core().interact(autotriggered);
    }

    /// Begin the appearance transition.
    fn fade_in(&self) {
        self.core().fade_in();
    }
}
