//! Standard trails: a textured path through a list of points.

use pack_model::{Color, PointOfInterest, TrailShape, Vec3};
use std::sync::Arc;
use tracing::trace;

use super::{EntityContext, EntityCore, EntityId, EntityKind, PathingEntity};
use crate::{OverlayError, Result, TrailEffect, TrailEntityState};

const ATTR_TEXTURE: &str = "texture";
const ATTR_ANIM_SPEED: &str = "animspeed";
const ATTR_FADE_NEAR: &str = "fadenear";
const ATTR_FADE_FAR: &str = "fadefar";
const ATTR_ALPHA: &str = "alpha";
const ATTR_COLOR: &str = "color";

#[derive(Debug)]
pub struct StandardTrail {
    core: EntityCore,
    shape: TrailShape,
    draw_state: TrailEntityState,
    effect: Arc<TrailEffect>,
}

impl StandardTrail {
    /// Fails if the descriptor carries no trail shape.
    pub fn new(context: &EntityContext, mut poi: PointOfInterest) -> Result<Self> {
        let shape = poi.trail.take().ok_or_else(|| {
            OverlayError::InvalidPoi(format!("trail in `{}` has no trail data", poi.category))
        })?;

        let defaults = &context.population.trail;
        let attributes = &mut poi.attributes;

        let draw_state = TrailEntityState {
            texture: attributes.try_pop(ATTR_TEXTURE).map(|a| a.value),
            flow_speed: attributes
                .try_pop(ATTR_ANIM_SPEED)
                .map_or(defaults.flow_speed, |a| a.value_as_float(defaults.flow_speed)),
            fade_near: attributes
                .try_pop(ATTR_FADE_NEAR)
                .map_or(defaults.fade_near, |a| a.value_as_float(defaults.fade_near)),
            fade_far: attributes
                .try_pop(ATTR_FADE_FAR)
                .map_or(defaults.fade_far, |a| a.value_as_float(defaults.fade_far)),
            opacity: attributes
                .try_pop(ATTR_ALPHA)
                .map_or(defaults.opacity, |a| a.value_as_float(defaults.opacity)),
            player_fade_radius: 0.0,
            fade_center: false,
            tint_color: attributes
                .try_pop(ATTR_COLOR)
                .map_or(defaults.tint_color, |a| a.value_as_color(defaults.tint_color)),
        };

        if !attributes.is_empty() {
            trace!(remaining = attributes.len(), "trail attributes left unused");
        }

        let position = shape.points.first().copied().unwrap_or(Vec3::ZERO);
        let core = EntityCore::new(EntityId::new(), poi.category, shape.map_id, position, 0.0);

        Ok(Self {
            core,
            shape,
            draw_state,
            effect: context.trail_effect.clone(),
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.shape.points
    }

    pub fn tint_color(&self) -> Color {
        self.draw_state.tint_color
    }

    pub fn draw_state(&self) -> &TrailEntityState {
        &self.draw_state
    }
}

impl PathingEntity for StandardTrail {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Trail
    }

    fn apply_effect_state(&self) {
        self.effect.set_entity_state(&self.draw_state);
    }

    /// Distance to the nearest trail point.
    fn distance_from(&self, player: Vec3) -> f32 {
        self.shape
            .points
            .iter()
            .map(|point| point.distance(player))
            .fold(f32::MAX, f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::RecordingEffect;
    use crate::entity::testing::entity_context;
    use crate::ParameterValue;

    fn shape() -> TrailShape {
        TrailShape::new(
            38,
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0)],
        )
    }

    #[test]
    fn test_trail_requires_shape() {
        let dir = tempfile::tempdir().unwrap();
        let mut poi = PointOfInterest::trail("wvw.routes", shape());
        poi.trail = None;

        let result = StandardTrail::new(&entity_context(dir.path()), poi);
        assert!(matches!(result, Err(OverlayError::InvalidPoi(_))));
    }

    #[test]
    fn test_distance_is_to_nearest_point() {
        let dir = tempfile::tempdir().unwrap();
        let context = entity_context(dir.path());
        let trail = StandardTrail::new(&context, PointOfInterest::trail("wvw", shape())).unwrap();

        assert_eq!(trail.map_id(), 38);
        assert_eq!(trail.points().len(), 3);
        assert!((trail.distance_from(Vec3::new(12.0, 0.0, 0.0)) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_attributes_reach_effect() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingEffect::default());
        let mut context = entity_context(dir.path());
        context.trail_effect = Arc::new(TrailEffect::new(sink.clone()));

        let poi = PointOfInterest::trail("wvw", shape())
            .with_attribute("texture", "data/arrow.png")
            .with_attribute("animspeed", "2.5")
            .with_attribute("color", "00ff00");
        let trail = StandardTrail::new(&context, poi).unwrap();
        trail.apply_effect_state();

        assert_eq!(trail.tint_color(), Color::rgba(0, 255, 0, 255));
        assert_eq!(
            context.trail_effect.effect().parameter("FlowSpeed"),
            Some(ParameterValue::Float(2.5))
        );
        assert_eq!(
            context.trail_effect.effect().parameter("Texture"),
            Some(ParameterValue::Texture(Some("data/arrow.png".to_string())))
        );
        assert_eq!(sink.count("Opacity"), 1);
    }
}
