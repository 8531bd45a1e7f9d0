//! Behaviors attached to entities.

use std::sync::Arc;

use super::EntityCore;
use crate::{BehaviorStates, HideScope};

/// Reacts to an entity's focus, unfocus, and interact transitions.
pub trait Behavior: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn focus(&self, _entity: &EntityCore) {}

    fn unfocus(&self, _entity: &EntityCore) {}

    fn interact(&self, _entity: &EntityCore, _autotriggered: bool) {}

    /// Whether this behavior currently hides the entity.
    fn is_hiding(&self, _entity: &EntityCore) -> bool {
        false
    }
}

/// TacO-style `behavior` attribute values understood by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityBehavior {
    AlwaysVisible,
    ReappearOnMapChange,
    OnlyVisibleBeforeActivation,
}

impl VisibilityBehavior {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::AlwaysVisible),
            1 => Some(Self::ReappearOnMapChange),
            3 => Some(Self::OnlyVisibleBeforeActivation),
            _ => None,
        }
    }

    fn hide_scope(&self) -> Option<HideScope> {
        match self {
            Self::AlwaysVisible => None,
            Self::ReappearOnMapChange => Some(HideScope::MapChange),
            Self::OnlyVisibleBeforeActivation => Some(HideScope::Permanent),
        }
    }
}

/// Hides its entity once interacted with, for as long as the scope lasts.
#[derive(Debug)]
pub struct ActivationFilter {
    scope: HideScope,
    states: Arc<BehaviorStates>,
}

impl ActivationFilter {
    /// `None` for behaviors that never hide anything.
    pub fn new(behavior: VisibilityBehavior, states: Arc<BehaviorStates>) -> Option<Self> {
        behavior.hide_scope().map(|scope| Self { scope, states })
    }
}

impl Behavior for ActivationFilter {
    fn name(&self) -> &'static str {
        "activation"
    }

    fn interact(&self, entity: &EntityCore, _autotriggered: bool) {
        self.states.hide(entity.id().0, self.scope);
    }

    fn is_hiding(&self, entity: &EntityCore) -> bool {
        self.states.is_hidden(entity.id().0)
    }
}
