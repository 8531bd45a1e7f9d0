use pack_model::Color;
use std::sync::Arc;

use super::{EffectParameters, FrameView, ParameterValue, SharedEffect, FRAME_PARAMETERS};
use crate::GameTime;

const PARAMETER_TEXTURE: &str = "Texture";
const PARAMETER_FADE_TEXTURE: &str = "FadeTexture";
const PARAMETER_FLOW_SPEED: &str = "FlowSpeed";
const PARAMETER_FADE_NEAR: &str = "FadeNear";
const PARAMETER_FADE_FAR: &str = "FadeFar";
const PARAMETER_OPACITY: &str = "Opacity";
const PARAMETER_TINT_COLOR: &str = "TintColor";
const PARAMETER_PLAYER_FADE_RADIUS: &str = "PlayerFadeRadius";
const PARAMETER_FADE_CENTER: &str = "FadeCenter";

/// Per-trail values pushed before drawing a trail.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailEntityState {
    pub texture: Option<String>,
    pub flow_speed: f32,
    pub fade_near: f32,
    pub fade_far: f32,
    pub opacity: f32,
    pub player_fade_radius: f32,
    pub fade_center: bool,
    pub tint_color: Color,
}

/// Shared effect used to draw every trail.
#[derive(Debug)]
pub struct TrailEffect {
    effect: SharedEffect,
}

impl TrailEffect {
    /// Wrap the host's trail effect.
    pub fn new(sink: Arc<dyn EffectParameters>) -> Self {
        Self {
            effect: SharedEffect::new(sink),
        }
    }

    /// The underlying change-filtering effect.
    pub fn effect(&self) -> &SharedEffect {
        &self.effect
    }

    /// Texture masking trail segments near the player.
    pub fn set_fade_texture(&self, texture: Option<String>) {
        self.effect
            .set_parameter(PARAMETER_FADE_TEXTURE, ParameterValue::Texture(texture));
    }

    /// Load one trail's draw values before it is drawn.
    pub fn set_entity_state(&self, state: &TrailEntityState) {
        let effect = &self.effect;
        effect.set_parameter(PARAMETER_TEXTURE, ParameterValue::Texture(state.texture.clone()));
        effect.set_parameter(PARAMETER_FLOW_SPEED, ParameterValue::Float(state.flow_speed));
        effect.set_parameter(PARAMETER_FADE_NEAR, ParameterValue::Float(state.fade_near));
        effect.set_parameter(PARAMETER_FADE_FAR, ParameterValue::Float(state.fade_far));
        effect.set_parameter(PARAMETER_OPACITY, ParameterValue::Float(state.opacity));
        effect.set_parameter(
            PARAMETER_PLAYER_FADE_RADIUS,
            ParameterValue::Float(state.player_fade_radius),
        );
        effect.set_parameter(PARAMETER_FADE_CENTER, ParameterValue::Bool(state.fade_center));
        effect.set_parameter(PARAMETER_TINT_COLOR, ParameterValue::Color(state.tint_color));
    }

    /// Per-frame parameters: time, player, camera, race, and mount.
    pub fn update(&self, game_time: &GameTime, view: &FrameView) {
        self.effect
            .apply_frame(&FRAME_PARAMETERS, game_time.total_millis() as f32, view);
    }
}
