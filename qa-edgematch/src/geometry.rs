//! Geometry helpers shared by the edge-match engine.
//!
//! This module provides:
//! - WKT parsing into `geo-types` geometries
//! - [`Envelope`], the axis-aligned extent used for tiles, searches and the
//!   eviction test
//! - Shape classification ([`GeometryKind`]) and the extraction of the
//!   linear parts of line and area shapes
//!
//! Tolerant linear overlay lives in [`crate::linear`].

use crate::error::{EdgeMatchError, Result};
use geo::{BoundingRect, Relate};
use geo_types::{Coord, Geometry, LineString, MultiLineString, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Geometry kind of a feature class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Polyline,
    Polygon,
}

impl GeometryKind {
    /// Classify a geo-types Geometry.
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<Self> {
        match geom {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(GeometryKind::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(GeometryKind::Polyline)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(GeometryKind::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }
}

/// Axis-aligned extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Envelope {
    /// Create a new envelope. Bounds are normalized.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin: xmin.min(xmax),
            ymin: ymin.min(ymax),
            xmax: xmin.max(xmax),
            ymax: ymin.max(ymax),
        }
    }

    /// Compute from a geo-types Geometry. `None` for empty geometries.
    pub fn of(geom: &Geometry<f64>) -> Option<Self> {
        geom.bounding_rect().map(Self::from)
    }

    /// Compute from lines. `None` when there are no coordinates.
    pub fn of_lines(lines: &MultiLineString<f64>) -> Option<Self> {
        lines.bounding_rect().map(Self::from)
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Check if this envelope intersects another (touching counts).
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    /// Check if this envelope fully contains another.
    pub fn contains(&self, other: &Envelope) -> bool {
        self.xmin <= other.xmin
            && self.ymin <= other.ymin
            && self.xmax >= other.xmax
            && self.ymax >= other.ymax
    }

    /// Grow the envelope by `distance` in every direction.
    pub fn expand(&self, distance: f64) -> Envelope {
        Envelope {
            xmin: self.xmin - distance,
            ymin: self.ymin - distance,
            xmax: self.xmax + distance,
            ymax: self.ymax + distance,
        }
    }

    /// Smallest envelope containing both.
    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

impl From<Rect<f64>> for Envelope {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            xmin: rect.min().x,
            ymin: rect.min().y,
            xmax: rect.max().x,
            ymax: rect.max().y,
        }
    }
}

impl From<Envelope> for Rect<f64> {
    fn from(env: Envelope) -> Self {
        Rect::new(
            Coord {
                x: env.xmin,
                y: env.ymin,
            },
            Coord {
                x: env.xmax,
                y: env.ymax,
            },
        )
    }
}

/// Parse WKT string to geo-types Geometry.
pub fn parse_wkt(wkt: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt)
        .map_err(|e| EdgeMatchError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| EdgeMatchError::WktParse(format!("{:?}", e)))
        })
}

/// Linear parts of a shape: polylines as-is, polygons as their boundary
/// rings. `None` for point and collection shapes.
pub fn shape_lines(geom: &Geometry<f64>) -> Option<MultiLineString<f64>> {
    match geom {
        Geometry::Line(line) => Some(MultiLineString::new(vec![LineString::from(vec![
            line.start, line.end,
        ])])),
        Geometry::LineString(ls) => Some(MultiLineString::new(vec![ls.clone()])),
        Geometry::MultiLineString(mls) => Some(mls.clone()),
        Geometry::Polygon(poly) => Some(polygon_boundary(poly)),
        Geometry::MultiPolygon(mp) => Some(MultiLineString::new(
            mp.0.iter().flat_map(|p| polygon_boundary(p).0).collect(),
        )),
        Geometry::Rect(rect) => Some(polygon_boundary(&rect.to_polygon())),
        Geometry::Triangle(tri) => Some(polygon_boundary(&tri.to_polygon())),
        Geometry::Point(_) | Geometry::MultiPoint(_) | Geometry::GeometryCollection(_) => None,
    }
}

fn polygon_boundary(poly: &Polygon<f64>) -> MultiLineString<f64> {
    let mut rings = Vec::with_capacity(1 + poly.interiors().len());
    rings.push(poly.exterior().clone());
    rings.extend(poly.interiors().iter().cloned());
    MultiLineString::new(rings)
}

/// First and last coordinate of every part of a polyline shape.
pub fn line_end_points(geom: &Geometry<f64>) -> Vec<Coord<f64>> {
    let Some(lines) = (match geom {
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            shape_lines(geom)
        }
        _ => None,
    }) else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(lines.0.len() * 2);
    for line in &lines.0 {
        if let (Some(first), Some(last)) = (line.0.first(), line.0.last()) {
            points.push(*first);
            points.push(*last);
        }
    }
    points
}

/// DE-9IM *touches*: the shapes meet but their interiors do not intersect.
pub fn touches(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    a.relate(b).is_touches()
}

/// Wrap lines as a geometry for reporting.
pub fn lines_geometry(lines: &MultiLineString<f64>) -> Geometry<f64> {
    if lines.0.len() == 1 {
        Geometry::LineString(lines.0[0].clone())
    } else {
        Geometry::MultiLineString(lines.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_linestring() {
        let geom = parse_wkt("LINESTRING (0 0, 10 0)").unwrap();
        assert_eq!(GeometryKind::from_geometry(&geom), Some(GeometryKind::Polyline));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_wkt("LINESTRING (0 0,"),
            Err(EdgeMatchError::WktParse(_))
        ));
    }

    #[test]
    fn test_envelope_of_polygon() {
        let geom = parse_wkt("POLYGON ((0 0, 10 0, 10 20, 0 20, 0 0))").unwrap();
        let env = Envelope::of(&geom).unwrap();
        assert_eq!(env, Envelope::new(0.0, 0.0, 10.0, 20.0));
        assert!(env.contains(&Envelope::new(1.0, 1.0, 2.0, 2.0)));
        assert!(env.intersects(&Envelope::new(10.0, 20.0, 30.0, 30.0)));
        assert!(!env.intersects(&Envelope::new(10.5, 0.0, 30.0, 30.0)));
    }

    #[test]
    fn test_polygon_lines_include_holes() {
        let geom = parse_wkt(
            "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 4, 2 2))",
        )
        .unwrap();
        assert_eq!(shape_lines(&geom).unwrap().0.len(), 2);
    }

    #[test]
    fn test_line_end_points() {
        let geom = parse_wkt("MULTILINESTRING ((0 0, 1 0), (5 5, 6 6, 7 5))").unwrap();
        let ends = line_end_points(&geom);
        assert_eq!(ends.len(), 4);
        assert_eq!(ends[3], Coord { x: 7.0, y: 5.0 });

        let area = parse_wkt("POLYGON ((0 0, 1 0, 1 1, 0 0))").unwrap();
        assert!(line_end_points(&area).is_empty());
    }

    #[test]
    fn test_touches_polygon_outline() {
        let border = parse_wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap();
        let outside = parse_wkt("LINESTRING (0 0, 10 0, 10 -5)").unwrap();
        let inside = parse_wkt("LINESTRING (5 -5, 5 5)").unwrap();
        assert!(touches(&outside, &border));
        assert!(!touches(&inside, &border));
    }
}
