//! # Pack Model
//!
//! The data side of the pathing overlay - the category tree, point-of-interest
//! descriptors, and attribute values supplied by a parsed marker pack.
//! This crate holds no runtime state and knows nothing about rendering.

pub mod category;
pub mod error;
pub mod math;
pub mod poi;

pub use category::*;
pub use error::*;
pub use math::*;
pub use poi::*;
