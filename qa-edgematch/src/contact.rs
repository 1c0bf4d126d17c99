//! Point contacts: features meeting their border at single points.
//!
//! Points lying on the border and lines ending on it do not run along the
//! border. Their along-border geometry is the contact point itself, and two
//! contacts match where their points coincide within the coincidence
//! tolerance. A [`PointConnection`] pairs such a contact with the lines of
//! the border features it lies on.
//!
//! ```text
//!   side 1      |  line1
//!               |
//!   border  ----o----------   contact of line1 (start) and line2 (start)
//!               |
//!   side 2      |  line2
//! ```
//!
//! A point lies on a polyline border when it is within the XY tolerance of
//! it, and on a polygon border when it is within the tolerance of the
//! polygon's outline.

use crate::condition::RowPairCondition;
use crate::connection::{BorderConnectionCache, BorderSpec};
use crate::error::Result;
use crate::feature::{Feature, FeatureKey};
use crate::geometry::{shape_lines, Envelope};
use crate::linear;
use crate::source::{FeatureSource, RowFilter};
use crate::strategy::EdgeMatchStrategy;
use crate::tile::{Tile, TileCompletionEvictor, TileState};
use geo_types::{Coord, Geometry, Line, LineString, MultiLineString};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Which point of a feature a contact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactEnd {
    /// N-th point of a point shape.
    Point(usize),
    /// First coordinate of a polyline.
    Start,
    /// Last coordinate of a polyline.
    End,
}

/// A point of a feature that may lie on the border.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub at: Coord<f64>,
    pub end: ContactEnd,
    /// Segment of the line ending at the point, `None` for points.
    pub end_segment: Option<Line<f64>>,
}

/// Identity of a point connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactKey {
    pub feature: FeatureKey,
    pub end: ContactEnd,
}

/// A contact point lying on the border.
#[derive(Debug)]
pub struct PointConnection {
    pub key: ContactKey,
    pub feature: Arc<Feature>,
    pub at: Coord<f64>,
    /// Lines of the border features the point lies on. Never empty.
    pub border_lines: MultiLineString<f64>,
    /// The line's end segment runs along the border.
    pub end_segment_follows_border: bool,
}

impl PointConnection {
    pub fn class_index(&self) -> usize {
        self.key.feature.class_index
    }

    pub fn feature_envelope(&self) -> Envelope {
        self.feature
            .envelope()
            .unwrap_or_else(|| point_envelope(self.at))
    }
}

pub fn point_envelope(at: Coord<f64>) -> Envelope {
    Envelope::new(at.x, at.y, at.x, at.y)
}

/// Every point of a point or multipoint shape.
pub fn point_contacts(shape: &Geometry<f64>) -> Vec<ContactPoint> {
    let points: Vec<Coord<f64>> = match shape {
        Geometry::Point(p) => vec![p.0],
        Geometry::MultiPoint(mp) => mp.0.iter().map(|p| p.0).collect(),
        _ => Vec::new(),
    };
    points
        .into_iter()
        .enumerate()
        .map(|(i, at)| ContactPoint {
            at,
            end: ContactEnd::Point(i),
            end_segment: None,
        })
        .collect()
}

/// Start and end of a polyline shape: the first coordinate of its first
/// part and the last coordinate of its last part.
pub fn line_end_contacts(shape: &Geometry<f64>) -> Vec<ContactPoint> {
    let lines = match shape {
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            shape_lines(shape)
        }
        _ => None,
    };
    let Some(lines) = lines else {
        return Vec::new();
    };
    let parts: Vec<&LineString<f64>> = lines.0.iter().filter(|l| l.0.len() >= 2).collect();
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return Vec::new();
    };

    let n = last.0.len();
    vec![
        ContactPoint {
            at: first.0[0],
            end: ContactEnd::Start,
            end_segment: Some(Line::new(first.0[0], first.0[1])),
        },
        ContactPoint {
            at: last.0[n - 1],
            end: ContactEnd::End,
            end_segment: Some(Line::new(last.0[n - 2], last.0[n - 1])),
        },
    ]
}

/// Distance from a point to a shape: to its nearest point for point
/// shapes, to its nearest segment otherwise.
pub fn distance_to_shape(shape: &Geometry<f64>, at: Coord<f64>) -> f64 {
    match shape_lines(shape) {
        Some(lines) => linear::point_distance(&lines, at),
        None => point_contacts(shape)
            .iter()
            .map(|c| (c.at.x - at.x).hypot(c.at.y - at.y))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Lines of the border features `at` lies on whose condition holds for
/// `feature`. Empty if the point is not on the border.
pub fn border_lines_at(
    feature: &Feature,
    at: Coord<f64>,
    border: &BorderSpec,
    tolerance: f64,
    source: &dyn FeatureSource,
) -> Result<MultiLineString<f64>> {
    let filter: RowFilter<'_> =
        &|candidate: &Feature| border.condition.is_fulfilled(feature, candidate);
    let envelope = point_envelope(at).expand(tolerance);

    let mut lines = Vec::new();
    for border_feature in source.search(border.class_index, &envelope, Some(filter))? {
        let Some(outline) = shape_lines(&border_feature.shape) else {
            continue;
        };
        if linear::point_distance(&outline, at) <= tolerance {
            lines.extend(outline.0);
        }
    }
    Ok(MultiLineString::new(lines))
}

/// `at` lies on a border feature of `border` that `feature` may meet.
pub fn lies_on_border(
    feature: &Feature,
    at: Coord<f64>,
    border: &BorderSpec,
    tolerance: f64,
    source: &dyn FeatureSource,
) -> Result<bool> {
    Ok(!border_lines_at(feature, at, border, tolerance, source)?
        .0
        .is_empty())
}

/// Computes and caches point connections.
#[derive(Debug, Default)]
pub struct PointConnectionResolver {
    cache: BorderConnectionCache<PointConnection>,
    envelopes: FxHashMap<FeatureKey, Envelope>,
}

impl PointConnectionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contact points of `feature` lying on the border class in `border`.
    /// Repeated calls return the cached connections.
    pub fn resolve<S>(
        &mut self,
        feature: &Arc<Feature>,
        border: &BorderSpec,
        tolerance: f64,
        strategy: &S,
        source: &dyn FeatureSource,
    ) -> Result<Vec<Arc<PointConnection>>>
    where
        S: EdgeMatchStrategy + ?Sized,
    {
        if let Some(cached) = self.cache.get(feature.key, border.class_index) {
            return Ok(cached.to_vec());
        }

        let mut connections = Vec::new();
        for contact in strategy.contact_points(feature) {
            let border_lines = border_lines_at(feature, contact.at, border, tolerance, source)?;
            if border_lines.0.is_empty() {
                continue;
            }
            let end_segment_follows_border = contact.end_segment.is_some_and(|segment| {
                let segment = MultiLineString::new(vec![LineString::from(vec![
                    segment.start,
                    segment.end,
                ])]);
                !linear::is_empty(&linear::intersection(&segment, &border_lines, tolerance))
            });
            connections.push(Arc::new(PointConnection {
                key: ContactKey {
                    feature: feature.key,
                    end: contact.end,
                },
                feature: Arc::clone(feature),
                at: contact.at,
                border_lines,
                end_segment_follows_border,
            }));
        }
        tracing::trace!(
            feature = %feature.key,
            border_class = border.class_index,
            connections = connections.len(),
            "resolved point connections"
        );

        if let Some(env) = feature.envelope() {
            self.envelopes.insert(feature.key, env);
        }
        self.cache
            .insert(feature.key, border.class_index, connections.clone());
        Ok(connections)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.envelopes.clear();
    }

    pub fn cache(&self) -> &BorderConnectionCache<PointConnection> {
        &self.cache
    }
}

impl TileCompletionEvictor for PointConnectionResolver {
    fn evict_completed(&mut self, tile: &Tile) -> usize {
        if tile.state != TileState::Running {
            let count = self.cache.len();
            self.clear();
            return count;
        }
        let evicted = self.cache.evict_handled(tile, &self.envelopes);
        self.envelopes.retain(|_, env| !tile.is_handled(env));
        evicted
    }
}

/// Contacts already evaluated, kept until their feature is completely
/// processed.
#[derive(Debug, Default)]
pub struct EvaluatedContacts {
    envelopes: FxHashMap<ContactKey, Envelope>,
}

impl EvaluatedContacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a contact as evaluated. `false` if it already was.
    pub fn insert(&mut self, connection: &PointConnection) -> bool {
        match self.envelopes.entry(connection.key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(connection.feature_envelope());
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.envelopes.clear();
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }
}

impl TileCompletionEvictor for EvaluatedContacts {
    fn evict_completed(&mut self, tile: &Tile) -> usize {
        let before = self.envelopes.len();
        if tile.state == TileState::Running {
            self.envelopes.retain(|_, env| !tile.is_handled(env));
        } else {
            self.envelopes.clear();
        }
        before - self.envelopes.len()
    }
}

/// Features of a side meeting a contact point at one of their own ends
/// without forming a pair with the contact's feature.
pub fn same_side_connections(
    connection: &PointConnection,
    classes: &[usize],
    match_condition: &RowPairCondition,
    tolerance: f64,
    source: &dyn FeatureSource,
) -> Result<usize> {
    let feature = connection.feature.as_ref();
    let filter: RowFilter<'_> = &|other: &Feature| {
        other.key != feature.key && !match_condition.is_fulfilled(feature, other)
    };
    let envelope = point_envelope(connection.at).expand(tolerance);

    let mut count = 0;
    for &class_index in classes {
        for other in source.search(class_index, &envelope, Some(filter))? {
            let ends_here = line_end_contacts(&other.shape).iter().any(|c| {
                (c.at.x - connection.at.x).hypot(c.at.y - connection.at.y) <= tolerance
            });
            if ends_here {
                count += 1;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{parse_wkt, GeometryKind};
    use crate::source::{ClassSchema, MemorySource};
    use crate::strategy::{BorderingPoints, CrossingLines};
    use crate::Value;

    const TOL: f64 = 0.001;

    fn insert(source: &mut MemorySource, class: usize, id: u64, wkt: &str) -> Arc<Feature> {
        let key = source
            .insert(class, id, parse_wkt(wkt).unwrap(), Vec::<(String, Value)>::new())
            .unwrap();
        source
            .search(key.class_index, &Envelope::new(-1e9, -1e9, 1e9, 1e9), None)
            .unwrap()
            .into_iter()
            .find(|f| f.key == key)
            .unwrap()
    }

    fn border_spec(class_index: usize, kind: GeometryKind) -> BorderSpec {
        BorderSpec {
            class_index,
            kind,
            condition: RowPairCondition::new(None, "LINE", "BORDER", true, false).unwrap(),
        }
    }

    fn line_source() -> (MemorySource, usize, usize) {
        let mut source = MemorySource::new();
        let lines = source.add_class(ClassSchema::new("lines", GeometryKind::Polyline));
        let borders = source.add_class(ClassSchema::new("borders", GeometryKind::Polyline));
        insert(&mut source, borders, 1, "LINESTRING (0 0, 10 0)");
        (source, lines, borders)
    }

    #[test]
    fn test_line_end_contacts() {
        let shape = parse_wkt("MULTILINESTRING ((0 0, 1 0), (5 5, 6 6, 7 5))").unwrap();
        let contacts = line_end_contacts(&shape);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].at, Coord { x: 0.0, y: 0.0 });
        assert_eq!(contacts[1].end, ContactEnd::End);
        assert_eq!(
            contacts[1].end_segment,
            Some(Line::new(Coord { x: 6.0, y: 6.0 }, Coord { x: 7.0, y: 5.0 }))
        );
        assert!(line_end_contacts(&parse_wkt("POINT (1 1)").unwrap()).is_empty());
    }

    #[test]
    fn test_crossing_line_connects_at_start() {
        let (mut source, lines, borders) = line_source();
        let line = insert(&mut source, lines, 1, "LINESTRING (5 0, 5 5)");
        let mut resolver = PointConnectionResolver::new();
        let border = border_spec(borders, GeometryKind::Polyline);

        let connections = resolver
            .resolve(&line, &border, TOL, &CrossingLines, &source)
            .unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].key.end, ContactEnd::Start);
        assert!(!connections[0].end_segment_follows_border);

        let again = resolver
            .resolve(&line, &border, TOL, &CrossingLines, &source)
            .unwrap();
        assert!(Arc::ptr_eq(&connections[0], &again[0]));
    }

    #[test]
    fn test_end_segment_along_border() {
        let (mut source, lines, borders) = line_source();
        let line = insert(&mut source, lines, 1, "LINESTRING (1 0, 5 0, 5 5)");
        let connections = PointConnectionResolver::new()
            .resolve(
                &line,
                &border_spec(borders, GeometryKind::Polyline),
                TOL,
                &CrossingLines,
                &source,
            )
            .unwrap();
        assert_eq!(connections.len(), 1);
        assert!(connections[0].end_segment_follows_border);
    }

    #[test]
    fn test_point_on_polygon_outline() {
        let mut source = MemorySource::new();
        let points = source.add_class(ClassSchema::new("points", GeometryKind::Point));
        let borders = source.add_class(ClassSchema::new("borders", GeometryKind::Polygon));
        insert(&mut source, borders, 1, "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))");
        let on_outline = insert(&mut source, points, 1, "POINT (5 0)");
        let inside = insert(&mut source, points, 2, "POINT (5 5)");

        let mut resolver = PointConnectionResolver::new();
        let border = border_spec(borders, GeometryKind::Polygon);
        let found = resolver
            .resolve(&on_outline, &border, TOL, &BorderingPoints, &source)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key.end, ContactEnd::Point(0));
        assert!(resolver
            .resolve(&inside, &border, TOL, &BorderingPoints, &source)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_distance_to_shape() {
        let at = Coord { x: 0.0, y: 0.0 };
        let points = parse_wkt("MULTIPOINT ((3 4), (0 2))").unwrap();
        assert_eq!(distance_to_shape(&points, at), 2.0);
        let line = parse_wkt("LINESTRING (-5 1, 5 1)").unwrap();
        assert_eq!(distance_to_shape(&line, at), 1.0);
    }

    #[test]
    fn test_same_side_connections() {
        let (mut source, lines, borders) = line_source();
        let line = insert(&mut source, lines, 1, "LINESTRING (5 0, 5 5)");
        insert(&mut source, lines, 2, "LINESTRING (5 0, 7 5)");
        insert(&mut source, lines, 3, "LINESTRING (4 1, 6 -1)");
        let connection = PointConnectionResolver::new()
            .resolve(
                &line,
                &border_spec(borders, GeometryKind::Polyline),
                TOL,
                &CrossingLines,
                &source,
            )
            .unwrap()
            .remove(0);

        let never = RowPairCondition::new(Some("1 = 0"), "LINE1", "LINE2", true, false).unwrap();
        let count = same_side_connections(&connection, &[lines], &never, TOL, &source).unwrap();
        assert_eq!(count, 1);

        let always = RowPairCondition::new(None, "LINE1", "LINE2", true, false).unwrap();
        assert_eq!(
            same_side_connections(&connection, &[lines], &always, TOL, &source).unwrap(),
            0
        );
    }

    #[test]
    fn test_evaluated_contacts_evicted_with_feature() {
        let (mut source, lines, borders) = line_source();
        let line = insert(&mut source, lines, 1, "LINESTRING (2 0, 2 3)");
        let connection = PointConnectionResolver::new()
            .resolve(
                &line,
                &border_spec(borders, GeometryKind::Polyline),
                TOL,
                &CrossingLines,
                &source,
            )
            .unwrap()
            .remove(0);

        let mut evaluated = EvaluatedContacts::new();
        assert!(evaluated.insert(&connection));
        assert!(!evaluated.insert(&connection));

        let run = Envelope::new(0.0, -5.0, 20.0, 5.0);
        let first = Tile::new(TileState::Running, Envelope::new(0.0, -5.0, 1.0, 5.0), run);
        assert_eq!(evaluated.evict_completed(&first), 0);
        let second = Tile::new(TileState::Running, Envelope::new(1.0, -5.0, 10.0, 5.0), run);
        assert_eq!(evaluated.evict_completed(&second), 1);
        assert!(evaluated.is_empty());
    }
}
