//! Geometry-kind specific parts of an edge-match check.
//!
//! The engine is the same for every kind of feature meeting a border. What
//! differs is captured here: the aliases used in conditions, how a feature
//! meets its border and which kinds of issues a check can raise.
//!
//! Lines and areas meet the border *along* it: their along-border geometry
//! is the part of their lines lying on the border, and two features match
//! where those parts share a stretch. Points and line ends meet it *at
//! points*: the along-border geometry is the contact point itself, and two
//! features match where their contact points coincide.

use crate::contact::{line_end_contacts, point_contacts, ContactPoint};
use crate::feature::Feature;
use crate::geometry::{line_end_points, shape_lines, GeometryKind};
use crate::issue::{IssueCodes, IssueKind};
use geo_types::{Coord, MultiLineString};

/// How the features of a check meet their border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderContact {
    /// Along stretches of the border, compared with a tolerant overlay.
    Along,
    /// At single points, compared by their distance.
    AtPoints,
}

const ALONG_LINE_KINDS: &[IssueKind] = &[
    IssueKind::NoCandidate,
    IssueKind::NoCandidatePartlyOutsideVerifiedExtent,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
    IssueKind::EndPointNotCoincident,
    IssueKind::ConstraintsNotFulfilled,
];

const ALONG_AREA_KINDS: &[IssueKind] = &[
    IssueKind::NoCandidate,
    IssueKind::NoCandidatePartlyOutsideVerifiedExtent,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
    IssueKind::ConstraintsNotFulfilled,
];

const POINT_KINDS: &[IssueKind] = &[
    IssueKind::NoCandidate,
    IssueKind::CandidateExistsConstraintsFulfilled,
    IssueKind::CandidateExistsConstraintsNotFulfilled,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
    IssueKind::ConstraintsNotFulfilled,
];

const LINE_END_KINDS: &[IssueKind] = &[
    IssueKind::NoCandidate,
    IssueKind::NoCandidateConnectedOnSameSide,
    IssueKind::CandidateExistsConstraintsFulfilled,
    IssueKind::CandidateExistsConstraintsNotFulfilled,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled,
    IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
    IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsFulfilled,
    IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsNotFulfilled,
    IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsFulfilled,
    IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsNotFulfilled,
    IssueKind::ConstraintsNotFulfilled,
];

/// Per-kind behavior of an edge-match check.
pub trait EdgeMatchStrategy {
    /// Prefix of every issue code, e.g. `BorderingLines`.
    fn code_prefix(&self) -> &'static str;

    /// Geometry kind of the matched feature classes.
    fn feature_kind(&self) -> GeometryKind;

    /// Aliases of the feature and its border in border match conditions.
    fn border_aliases(&self) -> [&'static str; 2];

    /// Aliases of the side 1 and side 2 feature in pair conditions.
    fn pair_aliases(&self) -> [&'static str; 2];

    /// Lines of the feature compared with its border.
    fn feature_lines(&self, feature: &Feature) -> Option<MultiLineString<f64>> {
        shape_lines(&feature.shape)
    }

    /// Points that must coincide with a neighbor's end points when they lie
    /// on the common border.
    fn end_points(&self, _feature: &Feature) -> Vec<Coord<f64>> {
        Vec::new()
    }

    /// Whether unmatched borders may be closed by bounding features.
    fn supports_bounding_features(&self) -> bool {
        false
    }

    /// How features meet their border.
    fn border_contact(&self) -> BorderContact {
        BorderContact::Along
    }

    /// Points of the feature that may lie on the border. Only used for
    /// [`BorderContact::AtPoints`].
    fn contact_points(&self, _feature: &Feature) -> Vec<ContactPoint> {
        Vec::new()
    }

    /// Contact points are line ends: lines on the same side may share them,
    /// candidates are connected by error lines and may be matched on their
    /// interior.
    fn contacts_are_line_ends(&self) -> bool {
        false
    }

    /// Issue kinds the check can report, in listing order.
    fn issue_kinds(&self) -> &'static [IssueKind];

    fn issue_codes(&self) -> IssueCodes {
        IssueCodes::new(self.code_prefix(), self.issue_kinds())
    }
}

/// Polylines that continue across the border.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderingLines;

impl EdgeMatchStrategy for BorderingLines {
    fn code_prefix(&self) -> &'static str {
        "BorderingLines"
    }

    fn feature_kind(&self) -> GeometryKind {
        GeometryKind::Polyline
    }

    fn border_aliases(&self) -> [&'static str; 2] {
        ["LINE", "BORDER"]
    }

    fn pair_aliases(&self) -> [&'static str; 2] {
        ["LINE1", "LINE2"]
    }

    fn end_points(&self, feature: &Feature) -> Vec<Coord<f64>> {
        line_end_points(&feature.shape)
    }

    fn issue_kinds(&self) -> &'static [IssueKind] {
        ALONG_LINE_KINDS
    }
}

/// Polygons whose outlines meet at the border.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossingAreas;

impl EdgeMatchStrategy for CrossingAreas {
    fn code_prefix(&self) -> &'static str {
        "CrossingAreas"
    }

    fn feature_kind(&self) -> GeometryKind {
        GeometryKind::Polygon
    }

    fn border_aliases(&self) -> [&'static str; 2] {
        ["AREA", "BORDER"]
    }

    fn pair_aliases(&self) -> [&'static str; 2] {
        ["AREA1", "AREA2"]
    }

    fn supports_bounding_features(&self) -> bool {
        true
    }

    fn issue_kinds(&self) -> &'static [IssueKind] {
        ALONG_AREA_KINDS
    }
}

/// Points lying on the border, matched by a coincident point across it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderingPoints;

impl EdgeMatchStrategy for BorderingPoints {
    fn code_prefix(&self) -> &'static str {
        "BorderingPoints"
    }

    fn feature_kind(&self) -> GeometryKind {
        GeometryKind::Point
    }

    fn border_aliases(&self) -> [&'static str; 2] {
        ["POINT", "BORDER"]
    }

    fn pair_aliases(&self) -> [&'static str; 2] {
        ["POINT1", "POINT2"]
    }

    fn feature_lines(&self, _feature: &Feature) -> Option<MultiLineString<f64>> {
        None
    }

    fn border_contact(&self) -> BorderContact {
        BorderContact::AtPoints
    }

    fn contact_points(&self, feature: &Feature) -> Vec<ContactPoint> {
        point_contacts(&feature.shape)
    }

    fn issue_kinds(&self) -> &'static [IssueKind] {
        POINT_KINDS
    }
}

/// Polylines crossing the border, matched by a line starting where they end.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossingLines;

impl EdgeMatchStrategy for CrossingLines {
    fn code_prefix(&self) -> &'static str {
        "CrossingLines"
    }

    fn feature_kind(&self) -> GeometryKind {
        GeometryKind::Polyline
    }

    fn border_aliases(&self) -> [&'static str; 2] {
        ["LINE", "BORDER"]
    }

    fn pair_aliases(&self) -> [&'static str; 2] {
        ["LINE1", "LINE2"]
    }

    fn border_contact(&self) -> BorderContact {
        BorderContact::AtPoints
    }

    fn contact_points(&self, feature: &Feature) -> Vec<ContactPoint> {
        line_end_contacts(&feature.shape)
    }

    fn contacts_are_line_ends(&self) -> bool {
        true
    }

    fn issue_kinds(&self) -> &'static [IssueKind] {
        LINE_END_KINDS
    }
}
