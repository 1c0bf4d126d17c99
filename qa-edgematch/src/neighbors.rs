//! Matching a border connection against connections across the border.
//!
//! For one connection the matcher finds candidate features of the opposite
//! side near its along-border geometry, and classifies each of their
//! connections:
//!
//! - **exact**: both along-border geometries share a stretch within the
//!   XY tolerance (the *common* geometry)
//! - **gap**: the neighbor runs along the border within the search
//!   distance but not on the same line
//!
//! A neighbor can be both, when it shares one stretch and runs apart along
//! another.
//!
//! Point contacts only need the candidates: their classification is a
//! distance between contact points, done by the check.

use crate::condition::RowPairCondition;
use crate::config::Side;
use crate::connection::{BorderConnection, ConnectionKey};
use crate::contact::{distance_to_shape, point_envelope};
use crate::error::Result;
use crate::feature::Feature;
use crate::linear;
use crate::source::{FeatureSource, RowFilter};
use geo_types::{Coord, MultiLineString};
use std::sync::Arc;

/// A candidate for a point contact and its distance from the contact.
#[derive(Debug, Clone)]
pub struct PointCandidate {
    pub feature: Arc<Feature>,
    pub distance: f64,
}

/// A classified neighbor of a border connection.
#[derive(Debug, Clone)]
pub struct NeighborConnection {
    pub neighbor: Arc<BorderConnection>,
    /// Exact: the shared stretch. Gap: the part of this connection's
    /// along-border geometry lying near the neighbor.
    pub common: MultiLineString<f64>,
    pub is_gap: bool,
}

impl NeighborConnection {
    pub fn other(&self) -> ConnectionKey {
        self.neighbor.key
    }
}

/// How a neighbor relates to a connection.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub common: Option<MultiLineString<f64>>,
    pub gap: Option<MultiLineString<f64>>,
}

impl Classification {
    /// Neighbor records for this classification, exact first.
    pub fn into_neighbors(self, neighbor: &Arc<BorderConnection>) -> Vec<NeighborConnection> {
        let exact = self.common.map(|common| NeighborConnection {
            neighbor: Arc::clone(neighbor),
            common,
            is_gap: false,
        });
        let gap = self.gap.map(|common| NeighborConnection {
            neighbor: Arc::clone(neighbor),
            common,
            is_gap: true,
        });
        exact.into_iter().chain(gap).collect()
    }
}

/// Finds and classifies neighbors across the border.
#[derive(Debug, Clone)]
pub struct NeighborMatcher {
    search_distance: f64,
    /// Side 1 feature bound to the first alias.
    match_condition: RowPairCondition,
}

impl NeighborMatcher {
    pub fn new(search_distance: f64, match_condition: RowPairCondition) -> Self {
        Self {
            search_distance,
            match_condition,
        }
    }

    pub fn search_distance(&self) -> f64 {
        self.search_distance
    }

    pub fn match_condition(&self) -> &RowPairCondition {
        &self.match_condition
    }

    /// Features of `neighbor_classes` within the search distance of a
    /// contact point of `feature` that fulfil the match condition.
    pub fn point_candidates(
        &self,
        feature: &Feature,
        at: Coord<f64>,
        side: Side,
        neighbor_classes: &[usize],
        source: &dyn FeatureSource,
    ) -> Result<Vec<PointCandidate>> {
        let filter: RowFilter<'_> = &|candidate: &Feature| {
            let (row1, row2) = side.order(feature, candidate);
            self.match_condition.is_fulfilled(row1, row2)
        };
        let envelope = point_envelope(at).expand(self.search_distance);

        let mut candidates = Vec::new();
        for &class_index in neighbor_classes {
            for candidate in source.search(class_index, &envelope, Some(filter))? {
                let distance = distance_to_shape(&candidate.shape, at);
                if distance <= self.search_distance {
                    candidates.push(PointCandidate {
                        feature: candidate,
                        distance,
                    });
                }
            }
        }
        Ok(candidates)
    }

    /// Features of `neighbor_classes` within the search distance of the
    /// connection's along-border geometry that fulfil the match condition.
    pub fn candidates(
        &self,
        connection: &BorderConnection,
        side: Side,
        neighbor_classes: &[usize],
        source: &dyn FeatureSource,
    ) -> Result<Vec<Arc<Feature>>> {
        let feature = connection.feature.as_ref();
        let filter: RowFilter<'_> = &|candidate: &Feature| {
            let (row1, row2) = side.order(feature, candidate);
            self.match_condition.is_fulfilled(row1, row2)
        };
        let envelope = connection.along_envelope.expand(self.search_distance);

        let mut candidates = Vec::new();
        for &class_index in neighbor_classes {
            for candidate in source.search(class_index, &envelope, Some(filter))? {
                let distance = linear::shape_distance(&connection.along_border, &candidate.shape);
                if distance <= self.search_distance {
                    candidates.push(candidate);
                }
            }
        }
        Ok(candidates)
    }

    /// Classify a neighbor connection. `tolerance` is the XY tolerance of
    /// the connection's class.
    pub fn classify(
        &self,
        connection: &BorderConnection,
        neighbor: &BorderConnection,
        tolerance: f64,
    ) -> Classification {
        let along = &connection.along_border;
        let common = linear::intersection(along, &neighbor.along_border, tolerance);
        let common = (!linear::is_empty(&common)).then_some(common);

        let gap = if self.search_distance > 0.0 {
            self.not_equal_line(along, &neighbor.along_border, common.as_ref(), tolerance)
        } else {
            None
        };
        Classification { common, gap }
    }

    /// Part of `along` near the stretch of the neighbor's geometry that is
    /// not shared.
    fn not_equal_line(
        &self,
        along: &MultiLineString<f64>,
        neighbor_along: &MultiLineString<f64>,
        common: Option<&MultiLineString<f64>>,
        tolerance: f64,
    ) -> Option<MultiLineString<f64>> {
        let rest = match common {
            Some(common) => linear::difference(neighbor_along, common, tolerance),
            None => {
                if linear::distance(neighbor_along, along) > self.search_distance {
                    return None;
                }
                neighbor_along.clone()
            }
        };
        if linear::is_empty(&rest) {
            return None;
        }
        let near = linear::near_part(&rest, along, self.search_distance);
        (!linear::is_empty(&near)).then_some(near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureKey;
    use crate::geometry::{parse_wkt, Envelope, GeometryKind};
    use crate::source::{ClassSchema, MemorySource};

    fn connection(class: usize, id: u64, wkt: &str) -> Arc<BorderConnection> {
        let shape = parse_wkt(wkt).unwrap();
        let feature = Arc::new(Feature::new(FeatureKey::new(class, id), shape.clone()));
        let border = Arc::new(Feature::new(FeatureKey::new(class + 1, 1), shape));
        let along_border = crate::geometry::shape_lines(&feature.shape).unwrap();
        let along_envelope = Envelope::of_lines(&along_border).unwrap();
        Arc::new(BorderConnection {
            key: ConnectionKey {
                feature: feature.key,
                border: border.key,
            },
            feature,
            border_feature: border,
            along_border,
            along_envelope,
        })
    }

    fn matcher(search_distance: f64) -> NeighborMatcher {
        let condition = RowPairCondition::new(None, "LINE1", "LINE2", true, false).unwrap();
        NeighborMatcher::new(search_distance, condition)
    }

    #[test]
    fn test_exact_neighbor() {
        let a = connection(0, 1, "LINESTRING (0 0, 10 0)");
        let b = connection(2, 1, "LINESTRING (10 0, 0 0)");
        let result = matcher(0.5).classify(&a, &b, 0.001);
        let common = result.common.unwrap();
        assert!((linear::length(&common) - 10.0).abs() < 1e-9);
        assert!(result.gap.is_none());
    }

    #[test]
    fn test_offset_neighbor_is_gap() {
        let a = connection(0, 1, "LINESTRING (0 0.1, 10 0.1)");
        let b = connection(2, 1, "LINESTRING (0 0, 10 0)");
        let result = matcher(0.3).classify(&a, &b, 0.001);
        assert!(result.common.is_none());
        assert!((linear::length(&result.gap.unwrap()) - 10.0).abs() < 1e-9);

        assert!(matcher(0.05).classify(&a, &b, 0.001).gap.is_none());
        assert!(matcher(0.0).classify(&a, &b, 0.001).gap.is_none());
    }

    #[test]
    fn test_partly_shared_neighbor() {
        // b shares 0..5 and runs 0.2 off the border from 6 to 10
        let a = connection(0, 1, "LINESTRING (0 0, 10 0)");
        let b = connection(2, 1, "LINESTRING (0 0, 5 0, 6 0.2, 10 0.2)");
        let result = matcher(0.5).classify(&a, &b, 0.001);
        assert!((linear::length(&result.common.unwrap()) - 5.0).abs() < 1e-6);
        let gap = result.gap.unwrap();
        assert!(linear::length(&gap) > 4.0);

        let neighbors = matcher(0.5).classify(&a, &b, 0.001).into_neighbors(&b);
        assert_eq!(neighbors.len(), 2);
        assert!(!neighbors[0].is_gap);
        assert!(neighbors[1].is_gap);
        assert_eq!(neighbors[1].other(), b.key);
    }

    #[test]
    fn test_point_candidates_within_search_distance() {
        let mut source = MemorySource::new();
        let points = source.add_class(ClassSchema::new("points2", GeometryKind::Point));
        for (id, wkt) in [(1, "POINT (5 0.3)"), (2, "POINT (5 0.6)")] {
            source
                .insert(points, id, parse_wkt(wkt).unwrap(), Vec::<(String, crate::Value)>::new())
                .unwrap();
        }
        let feature = Feature::new(FeatureKey::new(9, 1), parse_wkt("POINT (5 0)").unwrap());
        let at = Coord { x: 5.0, y: 0.0 };

        let found = matcher(0.5)
            .point_candidates(&feature, at, Side::One, &[points], &source)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].feature.key.row_id, 1);
        assert!((found[0].distance - 0.3).abs() < 1e-12);
    }
}
