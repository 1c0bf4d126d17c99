//! Tile lifecycle and the tile completion test.
//!
//! Tiles are processed in raster order: rows of increasing Y, and within a
//! row increasing X. Once a tile completes, anything whose envelope lies
//! left of the tile's right edge and below its top edge can never be
//! touched by a later tile, except along the run's own upper bounds.
//!
//! ```text
//!   y ^  +-----+-----+-----+
//!     |  |  4  |  5  |  6  |      after tile 2 completes, an envelope is
//!     |  +-----+-----+-----+      final if xmax < 2.xmax (or tile 2 is in
//!     |  |  1  |  2  |  3  |      the last column) and ymax < 2.ymax (or
//!     |  +-----+-----+-----+      tile 2 is in the last row)
//!     +------------------------> x
//! ```

use crate::geometry::Envelope;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileState {
    /// Pseudo tile before the first data tile; clears all state.
    Initial,
    Running,
    /// Last tile of the run; every pending decision is taken.
    Final,
}

/// A tile of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub state: TileState,
    /// Extent of this tile. Empty for the initial pseudo tile.
    pub extent: Option<Envelope>,
    /// Extent of the whole run.
    pub run_extent: Envelope,
}

impl Tile {
    pub fn initial(run_extent: Envelope) -> Self {
        Self {
            state: TileState::Initial,
            extent: None,
            run_extent,
        }
    }

    pub fn new(state: TileState, extent: Envelope, run_extent: Envelope) -> Self {
        Self {
            state,
            extent: Some(extent),
            run_extent,
        }
    }

    pub fn is_final(&self) -> bool {
        self.state == TileState::Final
    }

    /// `true` if an object with this envelope is completely processed.
    ///
    /// Always `true` in the final tile, never in the initial one.
    pub fn is_handled(&self, envelope: &Envelope) -> bool {
        match (self.state, &self.extent) {
            (TileState::Final, _) => true,
            (TileState::Initial, _) | (_, None) => false,
            (TileState::Running, Some(tile)) => verify_handled(envelope, tile, &self.run_extent),
        }
    }

    /// `true` if the envelope meets the tile (always at Final).
    pub fn touches(&self, envelope: &Envelope) -> bool {
        match (self.state, &self.extent) {
            (TileState::Final, _) => true,
            (_, Some(tile)) => tile.intersects(envelope),
            (_, None) => false,
        }
    }
}

/// A cache that forgets entries once the tiles processed so far can no
/// longer touch them.
pub trait TileCompletionEvictor {
    /// Drop every entry `tile` has completely processed. Everything is
    /// dropped at the final and at the initial tile. Returns the number of
    /// entries dropped.
    fn evict_completed(&mut self, tile: &Tile) -> usize;
}

/// Tile completion test for an envelope, independent of the tile state.
pub fn verify_handled(envelope: &Envelope, tile: &Envelope, run: &Envelope) -> bool {
    (tile.xmax >= run.xmax || envelope.xmax < tile.xmax)
        && (tile.ymax >= run.ymax || envelope.ymax < tile.ymax)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> Envelope {
        Envelope::new(0.0, 0.0, 30.0, 20.0)
    }

    #[test]
    fn test_verify_handled_inside_tile() {
        let tile = Envelope::new(0.0, 0.0, 10.0, 10.0);
        assert!(verify_handled(&Envelope::new(1.0, 1.0, 9.0, 9.0), &tile, &run()));
        assert!(!verify_handled(&Envelope::new(1.0, 1.0, 11.0, 9.0), &tile, &run()));
        assert!(!verify_handled(&Envelope::new(1.0, 1.0, 9.0, 10.0), &tile, &run()));
    }

    #[test]
    fn test_verify_handled_last_column_and_row() {
        let last_column = Envelope::new(20.0, 0.0, 30.0, 10.0);
        assert!(verify_handled(&Envelope::new(25.0, 1.0, 35.0, 9.0), &last_column, &run()));

        let last_tile = Envelope::new(20.0, 10.0, 30.0, 20.0);
        assert!(verify_handled(&Envelope::new(-5.0, -5.0, 50.0, 50.0), &last_tile, &run()));
    }

    #[test]
    fn test_tile_states() {
        let initial = Tile::initial(run());
        let any = Envelope::new(0.0, 0.0, 1.0, 1.0);
        assert!(!initial.is_handled(&any));
        assert!(!initial.touches(&any));

        let final_tile = Tile::new(TileState::Final, Envelope::new(20.0, 10.0, 30.0, 20.0), run());
        assert!(final_tile.is_handled(&Envelope::new(100.0, 100.0, 101.0, 101.0)));
        assert!(final_tile.touches(&any));
    }
}
