//! Border connections: where a feature runs along its border.
//!
//! A [`BorderConnection`] pairs a feature with one border feature it meets
//! and holds the part of the feature's lines lying on that border (the
//! *along-border geometry*). Connections are resolved lazily, cached per
//! feature and border class, and dropped once the feature is completely
//! processed.
//!
//! Border features may be polylines or polygons. A polyline border is met
//! by any feature within the XY tolerance. A polygon border is met only by
//! features touching it: a feature running through the inside of the border
//! polygon is not connected to it.

use crate::condition::RowPairCondition;
use crate::error::Result;
use crate::feature::{Feature, FeatureKey};
use crate::geometry::{shape_lines, touches, Envelope, GeometryKind};
use crate::linear;
use crate::source::{FeatureSource, RowFilter};
use crate::strategy::EdgeMatchStrategy;
use crate::tile::{Tile, TileCompletionEvictor, TileState};
use geo_types::MultiLineString;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Identity of a border connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub feature: FeatureKey,
    pub border: FeatureKey,
}

/// A feature meeting one border feature.
#[derive(Debug)]
pub struct BorderConnection {
    pub key: ConnectionKey,
    pub feature: Arc<Feature>,
    pub border_feature: Arc<Feature>,
    /// Part of the feature's lines running along the border. Never empty.
    pub along_border: MultiLineString<f64>,
    pub along_envelope: Envelope,
}

impl BorderConnection {
    /// Class index of the feature.
    pub fn class_index(&self) -> usize {
        self.key.feature.class_index
    }

    /// Envelope of the feature, or of the along-border geometry for shapes
    /// without extent.
    pub fn feature_envelope(&self) -> Envelope {
        self.feature.envelope().unwrap_or(self.along_envelope)
    }
}

/// Border class of one side and the condition a feature/border pair must
/// fulfil.
#[derive(Debug, Clone)]
pub struct BorderSpec {
    pub class_index: usize,
    pub kind: GeometryKind,
    /// Feature bound to the first alias, border to the second.
    pub condition: RowPairCondition,
}

/// Resolved connections keyed by feature and border class.
#[derive(Debug)]
pub struct BorderConnectionCache<C = BorderConnection> {
    entries: FxHashMap<(FeatureKey, usize), Vec<Arc<C>>>,
}

impl<C> Default for BorderConnectionCache<C> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<C> BorderConnectionCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, feature: FeatureKey, border_class: usize) -> Option<&[Arc<C>]> {
        self.entries.get(&(feature, border_class)).map(Vec::as_slice)
    }

    pub fn insert(&mut self, feature: FeatureKey, border_class: usize, connections: Vec<Arc<C>>) {
        self.entries.insert((feature, border_class), connections);
    }

    /// Drop the connections of every feature the tile has completely
    /// processed. Returns the number of features dropped.
    pub fn evict_handled(
        &mut self,
        tile: &Tile,
        envelopes: &FxHashMap<FeatureKey, Envelope>,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(feature, _), _| {
            envelopes
                .get(feature)
                .is_none_or(|env| !tile.is_handled(env))
        });
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached (feature, border class) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Computes and caches border connections.
#[derive(Debug, Default)]
pub struct BorderConnectionResolver {
    cache: BorderConnectionCache,
    /// Envelope of every cached feature, for eviction.
    envelopes: FxHashMap<FeatureKey, Envelope>,
}

impl BorderConnectionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections of `feature` to the border class in `border`. Repeated
    /// calls return the cached connections.
    pub fn resolve<S>(
        &mut self,
        feature: &Arc<Feature>,
        border: &BorderSpec,
        tolerance: f64,
        strategy: &S,
        source: &dyn FeatureSource,
    ) -> Result<Vec<Arc<BorderConnection>>>
    where
        S: EdgeMatchStrategy + ?Sized,
    {
        if let Some(cached) = self.cache.get(feature.key, border.class_index) {
            return Ok(cached.to_vec());
        }

        let connections = compute_connections(feature, border, tolerance, strategy, source)?;
        tracing::trace!(
            feature = %feature.key,
            border_class = border.class_index,
            connections = connections.len(),
            "resolved border connections"
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

    pub fn cache(&self) -> &BorderConnectionCache {
        &self.cache
    }
}

impl TileCompletionEvictor for BorderConnectionResolver {
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

fn compute_connections<S>(
    feature: &Arc<Feature>,
    border: &BorderSpec,
    tolerance: f64,
    strategy: &S,
    source: &dyn FeatureSource,
) -> Result<Vec<Arc<BorderConnection>>>
where
    S: EdgeMatchStrategy + ?Sized,
{
    let (Some(lines), Some(env)) = (strategy.feature_lines(feature), feature.envelope()) else {
        return Ok(Vec::new());
    };
    if linear::is_empty(&lines) {
        return Ok(Vec::new());
    }

    let filter: RowFilter<'_> =
        &|candidate: &Feature| border.condition.is_fulfilled(feature, candidate);
    let borders = source.search(border.class_index, &env.expand(tolerance), Some(filter))?;

    let mut connections = Vec::new();
    for border_feature in borders {
        let Some(border_lines) = shape_lines(&border_feature.shape) else {
            continue;
        };
        let meets = match border.kind {
            GeometryKind::Polygon => touches(&feature.shape, &border_feature.shape),
            _ => !linear::is_disjoint(&lines, &border_lines, tolerance),
        };
        if !meets {
            continue;
        }
        let along_border = linear::intersection(&lines, &border_lines, tolerance);
        let Some(along_envelope) = linear::envelope(&along_border) else {
            continue;
        };
        connections.push(Arc::new(BorderConnection {
            key: ConnectionKey {
                feature: feature.key,
                border: border_feature.key,
            },
            feature: Arc::clone(feature),
            border_feature,
            along_border,
            along_envelope,
        }));
    }
    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_wkt;
    use crate::source::{ClassSchema, MemorySource};
    use crate::strategy::BorderingLines;

    const TOL: f64 = 0.001;

    fn insert(source: &mut MemorySource, class: usize, id: u64, wkt: &str) -> Arc<Feature> {
        let key = source
            .insert(class, id, parse_wkt(wkt).unwrap(), Vec::<(String, crate::Value)>::new())
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

    #[test]
    fn test_line_border_connection() {
        let mut source = MemorySource::new();
        let lines = source.add_class(ClassSchema::new("lines", GeometryKind::Polyline));
        let borders = source.add_class(ClassSchema::new("borders", GeometryKind::Polyline));
        insert(&mut source, borders, 1, "LINESTRING (-10 0, 20 0)");
        let line = insert(&mut source, lines, 7, "LINESTRING (0 5, 0 0, 10 0)");

        let mut resolver = BorderConnectionResolver::new();
        let border = border_spec(borders, GeometryKind::Polyline);
        let connections = resolver
            .resolve(&line, &border, TOL, &BorderingLines, &source)
            .unwrap();
        assert_eq!(connections.len(), 1);
        assert!((linear::length(&connections[0].along_border) - 10.0).abs() < 1e-9);
        assert_eq!(connections[0].key.border, FeatureKey::new(borders, 1));

        let again = resolver
            .resolve(&line, &border, TOL, &BorderingLines, &source)
            .unwrap();
        assert!(Arc::ptr_eq(&connections[0], &again[0]));
    }

    #[test]
    fn test_crossing_line_has_no_connection() {
        let mut source = MemorySource::new();
        let lines = source.add_class(ClassSchema::new("lines", GeometryKind::Polyline));
        let borders = source.add_class(ClassSchema::new("borders", GeometryKind::Polyline));
        insert(&mut source, borders, 1, "LINESTRING (-10 0, 20 0)");
        let line = insert(&mut source, lines, 1, "LINESTRING (5 -5, 5 5)");

        let mut resolver = BorderConnectionResolver::new();
        let connections = resolver
            .resolve(
                &line,
                &border_spec(borders, GeometryKind::Polyline),
                TOL,
                &BorderingLines,
                &source,
            )
            .unwrap();
        assert!(connections.is_empty());
        assert_eq!(resolver.cache().len(), 1);
    }

    #[test]
    fn test_polygon_border_requires_touch() {
        let mut source = MemorySource::new();
        let lines = source.add_class(ClassSchema::new("lines", GeometryKind::Polyline));
        let borders = source.add_class(ClassSchema::new("borders", GeometryKind::Polygon));
        insert(&mut source, borders, 1, "POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))");
        let outline = insert(&mut source, lines, 1, "LINESTRING (0 0, 10 0, 10 -5)");
        let through = insert(&mut source, lines, 2, "LINESTRING (-5 0, 5 0, 5 5)");

        let mut resolver = BorderConnectionResolver::new();
        let border = border_spec(borders, GeometryKind::Polygon);
        assert_eq!(
            resolver
                .resolve(&outline, &border, TOL, &BorderingLines, &source)
                .unwrap()
                .len(),
            1
        );
        assert!(resolver
            .resolve(&through, &border, TOL, &BorderingLines, &source)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_evict_handled_features() {
        let mut source = MemorySource::new();
        let lines = source.add_class(ClassSchema::new("lines", GeometryKind::Polyline));
        let borders = source.add_class(ClassSchema::new("borders", GeometryKind::Polyline));
        insert(&mut source, borders, 1, "LINESTRING (-10 0, 40 0)");
        let left = insert(&mut source, lines, 1, "LINESTRING (0 0, 4 0)");
        let right = insert(&mut source, lines, 2, "LINESTRING (6 0, 14 0)");

        let mut resolver = BorderConnectionResolver::new();
        let border = border_spec(borders, GeometryKind::Polyline);
        for line in [&left, &right] {
            resolver
                .resolve(line, &border, TOL, &BorderingLines, &source)
                .unwrap();
        }

        let run = Envelope::new(0.0, -5.0, 30.0, 5.0);
        let tile = Tile::new(TileState::Running, Envelope::new(0.0, -5.0, 10.0, 5.0), run);
        assert_eq!(resolver.evict_completed(&tile), 1);
        assert!(resolver.cache().get(right.key, borders).is_some());

        let last = Tile::new(TileState::Final, Envelope::new(20.0, -5.0, 30.0, 5.0), run);
        resolver.evict_completed(&last);
        assert!(resolver.cache().is_empty());
    }
}
