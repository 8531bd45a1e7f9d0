use pack_model::Color;
use std::sync::Arc;

use super::{EffectParameters, FrameView, ParameterValue, SharedEffect, FRAME_PARAMETERS};
use crate::GameTime;

const PARAMETER_TEXTURE: &str = "Texture";
const PARAMETER_OPACITY: &str = "Opacity";
const PARAMETER_FADE_NEAR: &str = "FadeNear";
const PARAMETER_FADE_FAR: &str = "FadeFar";
const PARAMETER_TINT_COLOR: &str = "TintColor";
const PARAMETER_SHOW_DEBUG_WIREFRAME: &str = "ShowDebugWireframe";

/// Per-marker values pushed before drawing a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntityState {
    pub texture: Option<String>,
    pub opacity: f32,
    pub fade_near: f32,
    pub fade_far: f32,
    pub tint_color: Color,
}

/// Shared effect used to draw every marker.
#[derive(Debug)]
pub struct MarkerEffect {
    effect: SharedEffect,
}

impl MarkerEffect {
    /// Wrap the host's marker effect.
    pub fn new(sink: Arc<dyn EffectParameters>) -> Self {
        Self {
            effect: SharedEffect::new(sink),
        }
    }

    /// The underlying change-filtering effect.
    pub fn effect(&self) -> &SharedEffect {
        &self.effect
    }

    /// Toggle the wireframe overlay drawn around marker billboards.
    pub fn set_debug_wireframe(&self, enabled: bool) {
        self.effect
            .set_parameter(PARAMETER_SHOW_DEBUG_WIREFRAME, ParameterValue::Bool(enabled));
    }

    /// Load one marker's draw values before it is drawn.
    pub fn set_entity_state(&self, state: &MarkerEntityState) {
        let effect = &self.effect;
        effect.set_parameter(PARAMETER_TEXTURE, ParameterValue::Texture(state.texture.clone()));
        effect.set_parameter(PARAMETER_OPACITY, ParameterValue::Float(state.opacity));
        effect.set_parameter(PARAMETER_FADE_NEAR, ParameterValue::Float(state.fade_near));
        effect.set_parameter(PARAMETER_FADE_FAR, ParameterValue::Float(state.fade_far));
        effect.set_parameter(PARAMETER_TINT_COLOR, ParameterValue::Color(state.tint_color));
    }

    /// Per-frame parameters shared by every marker.
    pub fn update(&self, game_time: &GameTime, view: &FrameView) {
        self.effect
            .apply_frame(&FRAME_PARAMETERS, game_time.total_millis() as f32, view);
    }
}
