//! Edge matching of features across a border.
//!
//! Two data sets meet at a border: each side has its own feature classes
//! and its own border lines. Features touching the border on one side must
//! continue on the other side, on the same line and with compatible
//! attributes. This crate checks that for lines running along the border
//! ([`BorderingLines`]), areas whose outlines run along it
//! ([`CrossingAreas`]), points placed on it ([`BorderingPoints`]) and
//! lines ending on it ([`CrossingLines`]), processing the data tile by
//! tile with bounded memory.
//!
//! # Architecture
//!
//! ```text
//!   TileDriver ── begin_tile / execute(row) / complete_tile ──► EdgeMatchCheck
//!                                                                   │
//!        ┌───────────────────────────────┬──────────────────────────┤
//!        ▼                               ▼                          ▼
//!   BorderConnectionResolver        NeighborMatcher          ConstraintErrorCache
//!   (feature ∩ border, cached)      (exact / gap neighbors)  (pair findings, once
//!        │                               │                    per feature pair)
//!        └──────────────┬────────────────┘
//!                       ▼
//!           BoundaryCoverageTracker (per side)
//!           uncovered stretches ──► NoCandidate / CandidateExists findings
//! ```
//!
//! Everything geometric is done on the along-border lines with an XY
//! tolerance by [`linear`]. Points and line ends meet the border at single
//! points instead; [`contact`] resolves those and the check compares them
//! point by point. Caches are dropped per feature as soon as a
//! tile completes everything the feature's envelope touches.
//!
//! # Modules
//!
//! - [`check`]: the check and its tile lifecycle
//! - [`connection`]: border connections and their cache
//! - [`contact`]: point contacts of points and line ends
//! - [`neighbors`]: candidate search and neighbor classification
//! - [`coverage`]: per-side coverage of the border
//! - [`constraint`]: attribute rules and deferred pair findings
//! - [`condition`]: row-pair conditions and equal-field rules
//! - [`tile`]: tile states and the completion test shared by all caches
//! - [`driver`]: raster tile sweep
//! - [`source`]: feature source contract and in-memory source
//! - [`error`]: error types

pub mod check;
pub mod condition;
pub mod config;
pub mod connection;
pub mod contact;
pub mod constraint;
pub mod coverage;
pub mod driver;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod issue;
pub mod linear;
pub mod neighbors;
pub mod source;
pub mod strategy;
pub mod tile;

pub use check::{ClassRole, EdgeMatchCheck};
pub use condition::{ConditionOutcome, EqualFieldValuesCondition, RowPairCondition};
pub use config::{EdgeMatchConfig, EdgeMatchLayout, Side, DEFAULT_XY_TOLERANCE};
pub use connection::{
    BorderConnection, BorderConnectionCache, BorderConnectionResolver, ConnectionKey,
};
pub use constraint::{ConstraintErrorCache, ErrorShape, PairMember};
pub use contact::{
    ContactEnd, ContactKey, ContactPoint, EvaluatedContacts, PointConnection,
    PointConnectionResolver,
};
pub use coverage::BoundaryCoverageTracker;
pub use driver::TileDriver;
pub use error::{EdgeMatchError, Result};
pub use feature::{Feature, FeatureKey, Value};
pub use geometry::{parse_wkt, Envelope, GeometryKind};
pub use issue::{CollectingReporter, Issue, IssueCode, IssueCodes, IssueKind, IssueReporter};
pub use neighbors::NeighborMatcher;
pub use source::{ClassSchema, FeatureSource, MemorySource};
pub use strategy::{
    BorderContact, BorderingLines, BorderingPoints, CrossingAreas, CrossingLines,
    EdgeMatchStrategy,
};
pub use tile::{Tile, TileCompletionEvictor, TileState};
