//! Shader parameter sinks.
//!
//! The overlay never talks to the GPU. Effects are write-only key/value
//! targets supplied by the host; [`SharedEffect`] sits in front of one and
//! drops writes that would not change anything.

mod marker;
mod trail;

pub use marker::*;
pub use trail::*;

use pack_model::{Color, Vec3};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Column-major 4x4 matrix.
pub type Matrix = [f32; 16];

pub const IDENTITY: Matrix = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vector3(Vec3),
    Color(Color),
    Matrix(Matrix),
    /// Texture by pack-relative path; `None` unbinds.
    Texture(Option<String>),
}

/// Host-side effect accepting named parameter assignments.
pub trait EffectParameters: Send + Sync {
    fn set_parameter(&self, name: &str, value: ParameterValue);
}

/// Sink for hosts without a graphics backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEffect;

impl EffectParameters for NullEffect {
    fn set_parameter(&self, _name: &str, _value: ParameterValue) {}
}

/// Player and camera state read once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub world_view_projection: Matrix,
    pub player_view: Matrix,
    pub player_position: Vec3,
    pub camera_position: Vec3,
    pub race: i32,
    pub mount: i32,
}

impl Default for FrameView {
    fn default() -> Self {
        Self {
            world_view_projection: IDENTITY,
            player_view: IDENTITY,
            player_position: Vec3::ZERO,
            camera_position: Vec3::ZERO,
            race: 0,
            mount: 0,
        }
    }
}

/// Caches the last value written per parameter and forwards only changes.
pub struct SharedEffect {
    sink: Arc<dyn EffectParameters>,
    values: Mutex<HashMap<&'static str, ParameterValue>>,
}

impl SharedEffect {
    pub fn new(sink: Arc<dyn EffectParameters>) -> Self {
        Self {
            sink,
            values: Mutex::new(HashMap::new()),
        }
    }

    /// Forward `value` unless it equals the last value written. Returns whether it was forwarded.
    pub fn set_parameter(&self, name: &'static str, value: ParameterValue) -> bool {
        let mut values = self.values.lock();
        if values.get(name) == Some(&value) {
            return false;
        }

        self.sink.set_parameter(name, value.clone());
        values.insert(name, value);
        true
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.values.lock().get(name).cloned()
    }

    /// Write the per-frame parameters every effect shares.
    fn apply_frame(&self, names: &FrameParameterNames, total_ms: f32, view: &FrameView) {
        self.set_parameter(
            names.world_view_projection,
            ParameterValue::Matrix(view.world_view_projection),
        );
        self.set_parameter(names.player_view, ParameterValue::Matrix(view.player_view));
        self.set_parameter(names.player_position, ParameterValue::Vector3(view.player_position));
        self.set_parameter(names.camera_position, ParameterValue::Vector3(view.camera_position));
        self.set_parameter(names.total_milliseconds, ParameterValue::Float(total_ms));
        self.set_parameter(PARAMETER_RACE, ParameterValue::Int(view.race));
        self.set_parameter(PARAMETER_MOUNT, ParameterValue::Int(view.mount));
    }
}

impl std::fmt::Debug for SharedEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEffect")
            .field("values", &self.values.lock().len())
            .finish()
    }
}

pub const PARAMETER_RACE: &str = "Race";
pub const PARAMETER_MOUNT: &str = "Mount";

struct FrameParameterNames {
    world_view_projection: &'static str,
    player_view: &'static str,
    player_position: &'static str,
    camera_position: &'static str,
    total_milliseconds: &'static str,
}

const FRAME_PARAMETERS: FrameParameterNames = FrameParameterNames {
    world_view_projection: "WorldViewProjection",
    player_view: "PlayerView",
    player_position: "PlayerPosition",
    camera_position: "CameraPosition",
    total_milliseconds: "TotalMilliseconds",
};

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every forwarded write.
    #[derive(Debug, Default)]
    pub struct RecordingEffect {
        pub writes: Mutex<Vec<(String, ParameterValue)>>,
    }

    impl RecordingEffect {
        pub fn count(&self, name: &str) -> usize {
            self.writes.lock().iter().filter(|(n, _)| n == name).count()
        }
    }

    impl EffectParameters for RecordingEffect {
        fn set_parameter(&self, name: &str, value: ParameterValue) {
            self.writes.lock().push((name.to_string(), value));
        }
    }
}
