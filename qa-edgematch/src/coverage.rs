//! Per-side bookkeeping of which border stretches are matched.
//!
//! Every border connection of a side gets a [`Neighbors`] record holding
//! its classified neighbors and the part of its along-border geometry that
//! is still *uncovered*. At each tile completion the tracker:
//!
//! 1. folds new along-border geometry into the side's complete boundary
//!    and new exact commons into the matched boundary
//! 2. narrows each touched record's uncovered part to the unmatched
//!    boundary (complete minus matched)
//! 3. turns gap neighbors overlapping the uncovered part into
//!    [`HandledGap`]s once the tile has completely processed them
//! 4. returns the remaining uncovered parts that are completely processed
//!    as [`UncoveredPart`]s
//!
//! Records, and with them the boundaries, are dropped once their feature
//! is completely processed.

use crate::connection::{BorderConnection, ConnectionKey};
use crate::feature::Feature;
use crate::linear;
use crate::neighbors::NeighborConnection;
use crate::tile::{Tile, TileCompletionEvictor, TileState};
use geo_types::MultiLineString;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Neighbor record of one border connection.
#[derive(Debug)]
pub struct Neighbors {
    pub connection: Arc<BorderConnection>,
    /// XY tolerance of the connection's class.
    pub tolerance: f64,
    /// Along-border geometry not yet matched, bounded or reported.
    pub uncovered: MultiLineString<f64>,
    pub neighbors: Vec<NeighborConnection>,
    /// Bounding features touching the along-border geometry.
    pub bounding: Vec<Arc<Feature>>,
    /// Neighbor search done.
    pub searched: bool,
    classified: FxHashSet<ConnectionKey>,
}

impl Neighbors {
    fn new(connection: Arc<BorderConnection>, tolerance: f64) -> Self {
        Self {
            uncovered: connection.along_border.clone(),
            connection,
            tolerance,
            neighbors: Vec::new(),
            bounding: Vec::new(),
            searched: false,
            classified: FxHashSet::default(),
        }
    }

    /// `true` if the neighbor connection was already classified.
    pub fn contains(&self, neighbor: &ConnectionKey) -> bool {
        self.classified.contains(neighbor)
    }

    fn is_bounded(&self, part: &MultiLineString<f64>) -> bool {
        self.bounding
            .iter()
            .any(|b| linear::shape_distance(part, &b.shape) <= self.tolerance)
    }
}

/// A gap neighbor whose distance to the border is now final.
#[derive(Debug, Clone)]
pub struct HandledGap {
    pub connection: Arc<BorderConnection>,
    pub neighbor: Arc<BorderConnection>,
    /// Uncovered part of the connection's along-border geometry lying near
    /// the neighbor.
    pub line: MultiLineString<f64>,
}

/// An along-border stretch without any neighbor.
#[derive(Debug, Clone)]
pub struct UncoveredPart {
    pub connection: Arc<BorderConnection>,
    pub part: MultiLineString<f64>,
    /// The stretch is not completely inside the run extent.
    pub partly_outside: bool,
}

/// Findings of one tile completion.
#[derive(Debug, Default)]
pub struct CoverageOutcome {
    pub gaps: Vec<HandledGap>,
    pub uncovered: Vec<UncoveredPart>,
}

/// Tracks the coverage of one side's border connections.
#[derive(Debug)]
pub struct BoundaryCoverageTracker {
    records: FxHashMap<ConnectionKey, Neighbors>,
    tolerance: f64,
    complete: MultiLineString<f64>,
    matched: MultiLineString<f64>,
    pending_complete: Vec<MultiLineString<f64>>,
    pending_matched: Vec<MultiLineString<f64>>,
    /// Records were dropped; boundaries must be rebuilt.
    stale: bool,
}

impl BoundaryCoverageTracker {
    /// `tolerance` is used for the side's boundary unions.
    pub fn new(tolerance: f64) -> Self {
        Self {
            records: FxHashMap::default(),
            tolerance,
            complete: linear::empty(),
            matched: linear::empty(),
            pending_complete: Vec::new(),
            pending_matched: Vec::new(),
            stale: false,
        }
    }

    /// Record of a connection, created on first registration.
    pub fn register(
        &mut self,
        connection: &Arc<BorderConnection>,
        tolerance: f64,
    ) -> &mut Neighbors {
        let pending = &mut self.pending_complete;
        self.records.entry(connection.key).or_insert_with(|| {
            pending.push(connection.along_border.clone());
            Neighbors::new(Arc::clone(connection), tolerance)
        })
    }

    pub fn record(&self, key: &ConnectionKey) -> Option<&Neighbors> {
        self.records.get(key)
    }

    pub fn record_mut(&mut self, key: &ConnectionKey) -> Option<&mut Neighbors> {
        self.records.get_mut(key)
    }

    /// Add classified neighbors of one neighbor connection to a record.
    pub fn add_neighbors(&mut self, key: &ConnectionKey, neighbors: Vec<NeighborConnection>) {
        let Some(record) = self.records.get_mut(key) else {
            return;
        };
        for neighbor in neighbors {
            record.classified.insert(neighbor.other());
            if !neighbor.is_gap {
                self.pending_matched.push(neighbor.common.clone());
            }
            record.neighbors.push(neighbor);
        }
    }

    /// Mark a neighbor connection as classified without neighbors.
    pub fn mark_classified(&mut self, key: &ConnectionKey, neighbor: ConnectionKey) {
        if let Some(record) = self.records.get_mut(key) {
            record.classified.insert(neighbor);
        }
    }

    /// Update coverage at the completion of `tile`.
    ///
    /// Uncovered parts are only returned with `report_uncovered`.
    pub fn complete_tile(&mut self, tile: &Tile, report_uncovered: bool) -> CoverageOutcome {
        let mut outcome = CoverageOutcome::default();
        if tile.state == TileState::Initial {
            self.clear();
            return outcome;
        }

        self.update_boundaries();
        let unmatched = linear::difference(&self.complete, &self.matched, self.tolerance);

        let mut keys: Vec<ConnectionKey> = self.records.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let Some(record) = self.records.get_mut(&key) else {
                continue;
            };
            if linear::is_empty(&record.uncovered)
                || !tile.touches(&record.connection.along_envelope)
            {
                continue;
            }
            let tol = record.tolerance;
            if linear::is_disjoint(&record.connection.along_border, &unmatched, tol) {
                record.uncovered = linear::empty();
                continue;
            }
            record.uncovered = linear::intersection(&record.uncovered, &unmatched, tol);
            if linear::is_empty(&record.uncovered) {
                continue;
            }

            let mut incomplete = Vec::new();
            for neighbor in record.neighbors.iter().filter(|n| n.is_gap) {
                if linear::is_disjoint(&neighbor.common, &record.uncovered, tol) {
                    continue;
                }
                let line = linear::intersection(&record.uncovered, &neighbor.common, tol);
                let Some(env) = linear::envelope(&line) else {
                    continue;
                };
                if tile.is_handled(&env) {
                    outcome.gaps.push(HandledGap {
                        connection: Arc::clone(&record.connection),
                        neighbor: Arc::clone(&neighbor.neighbor),
                        line,
                    });
                } else {
                    incomplete.push(line);
                }
            }
            for gap in outcome.gaps.iter().filter(|g| g.connection.key == key) {
                record.uncovered = linear::difference(&record.uncovered, &gap.line, tol);
            }

            if !report_uncovered {
                continue;
            }
            let remaining = incomplete
                .iter()
                .fold(record.uncovered.clone(), |acc, gap| {
                    linear::difference(&acc, gap, tol)
                });
            for part in linear::parts(&remaining) {
                let Some(env) = linear::envelope(&part) else {
                    continue;
                };
                if !tile.is_handled(&env) {
                    continue;
                }
                if !record.is_bounded(&part) {
                    outcome.uncovered.push(UncoveredPart {
                        connection: Arc::clone(&record.connection),
                        partly_outside: !tile.run_extent.contains(&env),
                        part: part.clone(),
                    });
                }
                record.uncovered = linear::difference(&record.uncovered, &part, tol);
            }
        }

        self.evict_completed(tile);
        outcome
    }

    fn update_boundaries(&mut self) {
        if self.stale {
            self.complete = linear::union_all(
                self.records.values().map(|r| &r.connection.along_border),
                self.tolerance,
            );
            self.matched = linear::union_all(
                self.records
                    .values()
                    .flat_map(|r| r.neighbors.iter())
                    .filter(|n| !n.is_gap)
                    .map(|n| &n.common),
                self.tolerance,
            );
            self.pending_complete.clear();
            self.pending_matched.clear();
            self.stale = false;
            return;
        }
        for along in self.pending_complete.drain(..) {
            self.complete = linear::union(&self.complete, &along, self.tolerance);
        }
        for common in self.pending_matched.drain(..) {
            self.matched = linear::union(&self.matched, &common, self.tolerance);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.complete = linear::empty();
        self.matched = linear::empty();
        self.pending_complete.clear();
        self.pending_matched.clear();
        self.stale = false;
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TileCompletionEvictor for BoundaryCoverageTracker {
    fn evict_completed(&mut self, tile: &Tile) -> usize {
        let before = self.records.len();
        if tile.state != TileState::Running {
            self.clear();
            return before;
        }
        self.records
            .retain(|_, r| !tile.is_handled(&r.connection.feature_envelope()));
        let evicted = before - self.records.len();
        if evicted > 0 {
            self.stale = true;
        }
        evicted
    }
}
