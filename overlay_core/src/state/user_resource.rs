//! User-editable resources, currently the population defaults applied to
//! markers and trails that leave an attribute unset.

use pack_model::Color;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use super::{GameTime, Lifecycle, ManagedState};
use crate::Result;

pub const USER_RESOURCE_FILE: &str = "user_resources.toml";

/// Defaults for marker attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerPopulationDefaults {
    #[serde(with = "hex_color")]
    pub title_color: Color,
    pub trigger_range: f32,
    pub fade_near: f32,
    pub fade_far: f32,
}

impl Default for MarkerPopulationDefaults {
    fn default() -> Self {
        Self {
            title_color: Color::WHITE,
            trigger_range: 2.0,
            fade_near: -1.0,
            fade_far: -1.0,
        }
    }
}

/// Defaults for trail attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailPopulationDefaults {
    pub flow_speed: f32,
    pub fade_near: f32,
    pub fade_far: f32,
    pub opacity: f32,
    #[serde(with = "hex_color")]
    pub tint_color: Color,
}

impl Default for TrailPopulationDefaults {
    fn default() -> Self {
        Self {
            flow_speed: 1.0,
            fade_near: -1.0,
            fade_far: -1.0,
            opacity: 1.0,
            tint_color: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationDefaults {
    pub marker: MarkerPopulationDefaults,
    pub trail: TrailPopulationDefaults,
}

impl PopulationDefaults {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug)]
pub struct UserResourceStates {
    lifecycle: Lifecycle,
    path: PathBuf,
    population: RwLock<PopulationDefaults>,
}

impl UserResourceStates {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            path: state_dir.as_ref().join(USER_RESOURCE_FILE),
            population: RwLock::new(PopulationDefaults::default()),
        }
    }

    /// A copy of the current population defaults.
    pub fn population(&self) -> PopulationDefaults {
        self.population.read().clone()
    }

    async fn load_state(&self) -> bool {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                *self.population.write() = PopulationDefaults::default();
                return true;
            }
            Err(e) => {
                let path = self.path.display();
                error!(path = %path, error = %e, "failed to read {USER_RESOURCE_FILE}");
                return false;
            }
        };

        match PopulationDefaults::from_toml_str(&contents) {
            Ok(population) => {
                debug!(path = %self.path.display(), "loaded user resources");
                *self.population.write() = population;
                true
            }
            Err(e) => {
                let path = self.path.display();
                error!(path = %path, error = %e, "malformed {USER_RESOURCE_FILE}, using defaults");
                *self.population.write() = PopulationDefaults::default();
                false
            }
        }
    }
}

impl ManagedState for UserResourceStates {
    fn name(&self) -> &'static str {
        "user resources"
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn initialize(&self) -> bool {
        self.load_state().await
    }

    async fn reload(&self) {
        self.load_state().await;
    }

    fn update(&self, _game_time: &GameTime) {}

    /// Read-only resources; nothing to flush.
    fn unload(&self) {}
}

mod hex_color {
    use pack_model::Color;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            color.r, color.g, color.b, color.a
        ))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let value = String::deserialize(deserializer)?;
        Color::from_hex(&value).map_err(serde::de::Error::custom)
    }
}
