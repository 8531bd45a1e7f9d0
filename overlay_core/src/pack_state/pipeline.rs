//! Turning point-of-interest descriptors into live entities.

use pack_model::{PoiKind, PointOfInterest};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::warn;

use crate::{EntityContext, OverlayError, PathingEntity, Result, StandardMarker, StandardTrail};

/// Build the runtime entity for one descriptor.
pub fn build_entity(
    context: &EntityContext,
    poi: PointOfInterest,
) -> Result<Arc<dyn PathingEntity>> {
    match poi.kind.clone() {
        PoiKind::Marker => Ok(Arc::new(StandardMarker::new(context, poi))),
        PoiKind::Trail => Ok(Arc::new(StandardTrail::new(context, poi)?)),
        PoiKind::Route => Err(OverlayError::Unsupported("Routes".to_string())),
        PoiKind::Other(name) => Err(OverlayError::InvalidPoi(format!(
            "unknown element `{name}` in `{}`",
            poi.category
        ))),
    }
}

/// Build every descriptor in parallel.
///
/// With `skip_unsupported` unset the first failure aborts the batch and
/// nothing is returned; otherwise failing descriptors are logged and dropped.
/// Output order follows input order either way.
pub fn build_entities(
    context: &EntityContext,
    points_of_interest: Vec<PointOfInterest>,
    skip_unsupported: bool,
) -> Result<Vec<Arc<dyn PathingEntity>>> {
    if !skip_unsupported {
        return points_of_interest
            .into_par_iter()
            .map(|poi| build_entity(context, poi))
            .collect();
    }

    Ok(points_of_interest
        .into_par_iter()
        .filter_map(|poi| {
            let kind = poi.kind.clone();
            match build_entity(context, poi) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!(%kind, error = %e, "skipping point of interest");
                    None
                }
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::testing::entity_context;
    use crate::EntityKind;
    use pack_model::{TrailShape, Vec3};

    fn mixed() -> Vec<PointOfInterest> {
        vec![
            PointOfInterest::marker("wvw"),
            PointOfInterest::route("wvw.routes"),
            PointOfInterest::trail("wvw", TrailShape::new(38, vec![Vec3::ZERO])),
            PointOfInterest::new(PoiKind::Other("Beacon".to_string()), "wvw"),
        ]
    }

    #[test]
    fn test_kinds_map_to_entities() {
        let dir = tempfile::tempdir().unwrap();
        let context = entity_context(dir.path());

        let marker = build_entity(&context, PointOfInterest::marker("wvw")).unwrap();
        assert_eq!(marker.kind(), EntityKind::Marker);

        let shape = TrailShape::new(1, vec![Vec3::ZERO]);
        let trail = build_entity(&context, PointOfInterest::trail("wvw", shape)).unwrap();
        assert_eq!(trail.kind(), EntityKind::Trail);
    }

    #[test]
    fn test_routes_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_entity(&entity_context(dir.path()), PointOfInterest::route("wvw"));

        let err = result.unwrap_err();
        assert!(matches!(err, OverlayError::Unsupported(_)));
        assert_eq!(err.to_string(), "Routes have not been implemented");
    }

    #[test]
    fn test_batch_fails_on_first_unsupported_kind() {
        let dir = tempfile::tempdir().unwrap();
        let result = build_entities(&entity_context(dir.path()), mixed(), false);

        assert!(result.is_err());
    }

    #[test]
    fn test_skipping_keeps_supported_kinds_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let entities = build_entities(&entity_context(dir.path()), mixed(), true).unwrap();

        let kinds: Vec<_> = entities.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EntityKind::Marker, EntityKind::Trail]);
    }
}
