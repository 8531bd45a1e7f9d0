//! Point-of-interest descriptors as handed over by the pack parser.

mod attributes;

pub use attributes::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{CategoryTree, Vec3};

/// Kind tag of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoiKind {
    Marker,
    Trail,
    Route,
    /// Any element name the parser did not recognize.
    Other(String),
}

impl PoiKind {
    /// Map a pack element name (`POI`, `Trail`, `Route`) to a kind.
    pub fn from_element_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "poi" | "marker" => PoiKind::Marker,
            "trail" => PoiKind::Trail,
            "route" => PoiKind::Route,
            _ => PoiKind::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PoiKind::Marker => "marker",
            PoiKind::Trail => "trail",
            PoiKind::Route => "route",
            PoiKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for PoiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geometry of a trail, decoded from its binary trail data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrailShape {
    pub map_id: u32,
    pub points: Vec<Vec3>,
}

impl TrailShape {
    pub fn new(map_id: u32, points: Vec<Vec3>) -> Self {
        Self { map_id, points }
    }
}

/// One marker, trail, or route as parsed from a pack.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub kind: PoiKind,
    /// Namespace of the category this point is filed under.
    pub category: String,
    pub map_id: u32,
    /// Attributes not yet consumed by entity construction.
    pub attributes: AttributeCollection,
    /// Only present on trails.
    pub trail: Option<TrailShape>,
}

impl PointOfInterest {
    pub fn new(kind: PoiKind, category: impl Into<String>) -> Self {
        Self {
            kind,
            category: category.into(),
            map_id: 0,
            attributes: AttributeCollection::new(),
            trail: None,
        }
    }

    pub fn marker(category: impl Into<String>) -> Self {
        Self::new(PoiKind::Marker, category)
    }

    /// A trail descriptor; its map id follows the shape's.
    pub fn trail(category: impl Into<String>, shape: TrailShape) -> Self {
        let mut poi = Self::new(PoiKind::Trail, category);
        poi.map_id = shape.map_id;
        poi.trail = Some(shape);
        poi
    }

    pub fn route(category: impl Into<String>) -> Self {
        Self::new(PoiKind::Route, category)
    }

    pub fn with_map_id(mut self, map_id: u32) -> Self {
        self.map_id = map_id;
        self
    }

    /// Add a raw attribute (later values replace earlier ones).
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// The trail-specific shape, if this is a trail.
    pub fn as_trail(&self) -> Option<&TrailShape> {
        self.trail.as_ref()
    }
}

/// A parsed set of packs: the merged category tree plus every point of interest.
#[derive(Debug, Clone)]
pub struct PackCollection {
    pub categories: Arc<CategoryTree>,
    pub points_of_interest: Vec<PointOfInterest>,
}

impl PackCollection {
    pub fn new(categories: CategoryTree, points_of_interest: Vec<PointOfInterest>) -> Self {
        Self {
            categories: Arc::new(categories),
            points_of_interest,
        }
    }
}
