//! # Overlay Core
//!
//! The engine behind the pathing overlay. It takes a parsed pack collection
//! from `pack_model`, turns its points of interest into live entities, and
//! tracks the per-user state that decides what is shown.
//!
//! ## Core Components
//!
//! - **state**: persisted-state lifecycle, cadence gating, and the five state
//!   components (category, behavior, map, user resource, UI)
//! - **entity**: runtime markers and trails with their behavior lists
//! - **pack_state**: the aggregate that loads packs, owns live entities, and
//!   runs the per-frame focus pass
//! - **effects** / **render**: opaque parameter sinks and renderer registration

pub mod config;
pub mod effects;
pub mod entity;
pub mod error;
pub mod pack_state;
pub mod render;
pub mod state;
pub mod telemetry;

pub use config::*;
pub use effects::*;
pub use entity::*;
pub use error::*;
pub use pack_state::*;
pub use render::*;
pub use state::*;
