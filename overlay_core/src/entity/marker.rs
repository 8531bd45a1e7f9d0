//! Standard markers: a billboard icon with an optional title.

use pack_model::{AttributeCollection, Color, PointOfInterest, Vec3};
use std::sync::Arc;
use tracing::{trace, warn};

use super::{
    ActivationFilter, EntityContext, EntityCore, EntityId, EntityKind, PathingEntity,
    VisibilityBehavior,
};
use crate::{MarkerEffect, MarkerEntityState};

const ATTR_XPOS: &str = "xpos";
const ATTR_YPOS: &str = "ypos";
const ATTR_ZPOS: &str = "zpos";

// TacO uses `text` for WvW markers; `title` wins when both are set.
const ATTR_TEXT: &str = "text";
const ATTR_TITLE: &str = "title";
const ATTR_TITLE_COLOR: &str = "title-color";

const ATTR_GUID: &str = "guid";
const ATTR_TRIGGER_RANGE: &str = "triggerrange";
const ATTR_AUTO_TRIGGER: &str = "autotrigger";
const ATTR_BEHAVIOR: &str = "behavior";

const ATTR_ICON_FILE: &str = "iconfile";
const ATTR_ALPHA: &str = "alpha";
const ATTR_FADE_NEAR: &str = "fadenear";
const ATTR_FADE_FAR: &str = "fadefar";
const ATTR_COLOR: &str = "color";

#[derive(Debug)]
pub struct StandardMarker {
    core: EntityCore,
    billboard_text: Option<String>,
    billboard_text_color: Color,
    auto_trigger: bool,
    draw_state: MarkerEntityState,
    effect: Arc<MarkerEffect>,
}

impl StandardMarker {
    pub fn new(context: &EntityContext, mut poi: PointOfInterest) -> Self {
        let defaults = &context.population.marker;
        let attributes = &mut poi.attributes;

        let position = populate_position(attributes);

        let id = match attributes.try_pop(ATTR_GUID).map(|a| a.value_as_guid()) {
            Some(Ok(guid)) => EntityId::from_uuid(guid),
            Some(Err(e)) => {
                warn!(error = %e, "marker has an unreadable guid, assigning a random one");
                EntityId::new()
            }
            None => EntityId::new(),
        };

        let trigger_range = attributes
            .try_pop(ATTR_TRIGGER_RANGE)
            .map(|a| a.value_as_float(defaults.trigger_range))
            .unwrap_or(defaults.trigger_range);

        let auto_trigger = attributes
            .try_pop(ATTR_AUTO_TRIGGER)
            .is_some_and(|a| a.value_as_bool());

        let mut billboard_text = attributes.try_pop(ATTR_TEXT).map(|a| a.value);
        if let Some(title) = attributes.try_pop(ATTR_TITLE) {
            billboard_text = Some(title.value);
        }
        let billboard_text_color = attributes
            .try_pop(ATTR_TITLE_COLOR)
            .map(|a| a.value_as_color(defaults.title_color))
            .unwrap_or(defaults.title_color);

        let draw_state = MarkerEntityState {
            texture: attributes.try_pop(ATTR_ICON_FILE).map(|a| a.value),
            opacity: attributes.try_pop(ATTR_ALPHA).map_or(1.0, |a| a.value_as_float(1.0)),
            fade_near: attributes
                .try_pop(ATTR_FADE_NEAR)
                .map_or(defaults.fade_near, |a| a.value_as_float(defaults.fade_near)),
            fade_far: attributes
                .try_pop(ATTR_FADE_FAR)
                .map_or(defaults.fade_far, |a| a.value_as_float(defaults.fade_far)),
            tint_color: attributes
                .try_pop(ATTR_COLOR)
                .map_or(Color::WHITE, |a| a.value_as_color(Color::WHITE)),
        };

        let behavior = attributes.try_pop(ATTR_BEHAVIOR).map(|a| a.value_as_int(0));

        if !attributes.is_empty() {
            trace!(remaining = attributes.len(), "marker attributes left unused");
        }

        let core = EntityCore::new(id, poi.category, poi.map_id, position, trigger_range);

        if let Some(code) = behavior {
            match VisibilityBehavior::from_code(code) {
                Some(behavior) => {
                    let states = context.behavior_states.clone();
                    if let Some(filter) = ActivationFilter::new(behavior, states) {
                        core.add_behavior(Box::new(filter));
                    }
                }
                None => warn!(code, "unsupported marker behavior, treating as always visible"),
            }
        }

        Self {
            core,
            billboard_text,
            billboard_text_color,
            auto_trigger,
            draw_state,
            effect: context.marker_effect.clone(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.core.position()
    }

    pub fn billboard_text(&self) -> Option<&str> {
        self.billboard_text.as_deref()
    }

    pub fn billboard_text_color(&self) -> Color {
        self.billboard_text_color
    }

    pub fn auto_trigger(&self) -> bool {
        self.auto_trigger
    }

    pub fn draw_state(&self) -> &MarkerEntityState {
        &self.draw_state
    }
}

/// Pack coordinates have y and z swapped relative to world space.
fn populate_position(attributes: &mut AttributeCollection) -> Vec3 {
    let mut coordinate = |name| attributes.try_pop(name).map_or(0.0, |a| a.value_as_float(0.0));

    let x = coordinate(ATTR_XPOS);
    let y = coordinate(ATTR_YPOS);
    let z = coordinate(ATTR_ZPOS);

    Vec3::new(x, z, y)
}

impl PathingEntity for StandardMarker {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Marker
    }

    fn apply_effect_state(&self) {
        self.effect.set_entity_state(&self.draw_state);
    }

    fn focus(&self) {
        if self.core.focus() && self.auto_trigger {
            self.core.interact(true);
        }
    }
}
