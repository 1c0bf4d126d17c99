//! Raster tile sweep over a run extent.
//!
//! The driver cuts the run extent into square tiles, rows of increasing Y
//! and increasing X within a row, and feeds every row of the check's
//! feature classes to each tile it intersects. The last tile is the final
//! tile; an initial pseudo tile precedes the sweep.

use crate::check::EdgeMatchCheck;
use crate::error::{EdgeMatchError, Result};
use crate::geometry::Envelope;
use crate::issue::IssueReporter;
use crate::strategy::EdgeMatchStrategy;
use crate::tile::{Tile, TileState};

/// Tiles a run extent and drives a check through them.
#[derive(Debug, Clone, Copy)]
pub struct TileDriver {
    run_extent: Envelope,
    tile_size: f64,
}

impl TileDriver {
    pub fn new(run_extent: Envelope, tile_size: f64) -> Result<Self> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(EdgeMatchError::config(format!(
                "tile size must be a positive number, got {tile_size}"
            )));
        }
        Ok(Self {
            run_extent,
            tile_size,
        })
    }

    pub fn run_extent(&self) -> Envelope {
        self.run_extent
    }

    /// Data tiles in processing order. The last one is final.
    pub fn tiles(&self) -> Vec<Tile> {
        let run = self.run_extent;
        let columns = steps(run.width(), self.tile_size);
        let rows = steps(run.height(), self.tile_size);
        let edge = |start: f64, index: usize, count: usize, end: f64| {
            if index + 1 >= count {
                end
            } else {
                start + (index + 1) as f64 * self.tile_size
            }
        };

        let mut tiles = Vec::with_capacity(columns * rows);
        for row in 0..rows {
            let ymin = run.ymin + row as f64 * self.tile_size;
            let ymax = edge(run.ymin, row, rows, run.ymax);
            for column in 0..columns {
                let xmin = run.xmin + column as f64 * self.tile_size;
                let xmax = edge(run.xmin, column, columns, run.xmax);
                let last = row + 1 == rows && column + 1 == columns;
                let state = if last {
                    TileState::Final
                } else {
                    TileState::Running
                };
                tiles.push(Tile::new(state, Envelope::new(xmin, ymin, xmax, ymax), run));
            }
        }
        tiles
    }

    /// Run the check over all tiles. Returns the number of issues reported.
    pub fn run<S: EdgeMatchStrategy>(
        &self,
        check: &mut EdgeMatchCheck<'_, S>,
        reporter: &mut dyn IssueReporter,
    ) -> Result<usize> {
        check.begin_tile(Tile::initial(self.run_extent));
        let mut errors = check.complete_tile(reporter)?;

        let tiles = self.tiles();
        let classes: Vec<usize> = check.feature_classes().collect();
        for tile in tiles {
            let Some(extent) = tile.extent else {
                continue;
            };
            check.begin_tile(tile);
            for &class_index in &classes {
                for feature in check.source().search(class_index, &extent, None)? {
                    errors += check.execute(&feature, reporter)?;
                }
            }
            errors += check.complete_tile(reporter)?;
        }

        tracing::debug!(
            tile_size = self.tile_size,
            issues = errors,
            "edge-match run finished"
        );
        Ok(errors)
    }
}

fn steps(length: f64, size: f64) -> usize {
    ((length / size).ceil() as usize).max(1)
}
