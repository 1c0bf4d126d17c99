//! Issue codes, issues and the reporter contract.

use crate::feature::FeatureKey;
use geo_types::Geometry;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Kind of edge-match finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IssueKind {
    NoCandidate,
    NoCandidatePartlyOutsideVerifiedExtent,
    CandidateExistsBordersNotCoincidentConstraintsFulfilled,
    CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
    EndPointNotCoincident,
    ConstraintsNotFulfilled,
    NoCandidateConnectedOnSameSide,
    CandidateExistsConstraintsFulfilled,
    CandidateExistsConstraintsNotFulfilled,
    CandidateExistsEndPointOutsideToleranceConstraintsFulfilled,
    CandidateExistsEndPointOutsideToleranceConstraintsNotFulfilled,
    CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsFulfilled,
    CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsNotFulfilled,
}

impl IssueKind {
    pub const ALL: [IssueKind; 13] = [
        IssueKind::NoCandidate,
        IssueKind::NoCandidatePartlyOutsideVerifiedExtent,
        IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled,
        IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
        IssueKind::EndPointNotCoincident,
        IssueKind::ConstraintsNotFulfilled,
        IssueKind::NoCandidateConnectedOnSameSide,
        IssueKind::CandidateExistsConstraintsFulfilled,
        IssueKind::CandidateExistsConstraintsNotFulfilled,
        IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsFulfilled,
        IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsNotFulfilled,
        IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsFulfilled,
        IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsNotFulfilled,
    ];

    /// Kinds reported for point contacts without a coincident candidate.
    pub fn candidate_exists(
        borders_coincident: bool,
        constraints_fulfilled: bool,
        within_tolerance: bool,
    ) -> IssueKind {
        match (within_tolerance, borders_coincident, constraints_fulfilled) {
            (true, true, true) => IssueKind::CandidateExistsConstraintsFulfilled,
            (true, true, false) => IssueKind::CandidateExistsConstraintsNotFulfilled,
            (true, false, true) => {
                IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled
            }
            (true, false, false) => {
                IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled
            }
            (false, true, true) => {
                IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsFulfilled
            }
            (false, true, false) => {
                IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsNotFulfilled
            }
            (false, false, true) => {
                IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsFulfilled
            }
            (false, false, false) => {
                IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsNotFulfilled
            }
        }
    }

    /// Code id without the check prefix.
    pub fn local_id(self) -> &'static str {
        match self {
            IssueKind::NoCandidate => "NoMatch.NoCandidate",
            IssueKind::NoCandidatePartlyOutsideVerifiedExtent => {
                "NoMatch.NoCandidate.PartlyOutsideVerifiedExtent"
            }
            IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled => {
                "NoMatch.CandidateExists.BordersNotCoincident+ConstraintsFulfilled"
            }
            IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled => {
                "NoMatch.CandidateExists.BordersNotCoincident+ConstraintsNotFulfilled"
            }
            IssueKind::EndPointNotCoincident => "Match.EndPointNotCoincident",
            IssueKind::ConstraintsNotFulfilled => "Match.ConstraintsNotFulfilled",
            IssueKind::NoCandidateConnectedOnSameSide => "NoMatch.NoCandidate.ConnectedOnSameSide",
            IssueKind::CandidateExistsConstraintsFulfilled => {
                "NoMatch.CandidateExists.ConstraintsFulfilled"
            }
            IssueKind::CandidateExistsConstraintsNotFulfilled => {
                "NoMatch.CandidateExists.ConstraintsNotFulfilled"
            }
            IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsFulfilled => {
                "NoMatch.CandidateExists.EndPointOutsideTolerance+ConstraintsFulfilled"
            }
            IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsNotFulfilled => {
                "NoMatch.CandidateExists.EndPointOutsideTolerance+ConstraintsNotFulfilled"
            }
            IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsFulfilled => {
                "NoMatch.CandidateExists.EndPointOutsideTolerance+BordersNotCoincident+ConstraintsFulfilled"
            }
            IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsNotFulfilled => {
                "NoMatch.CandidateExists.EndPointOutsideTolerance+BordersNotCoincident+ConstraintsNotFulfilled"
            }
        }
    }
}

/// Issue code as reported: `<prefix>.<local id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IssueCode {
    pub kind: IssueKind,
    pub id: Arc<str>,
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Issue codes of one check, built once.
#[derive(Debug, Clone)]
pub struct IssueCodes {
    codes: Vec<IssueCode>,
    /// Kinds the check reports, in listing order.
    reported: &'static [IssueKind],
}

impl IssueCodes {
    pub fn new(prefix: &str, reported: &'static [IssueKind]) -> Self {
        Self {
            codes: IssueKind::ALL
                .iter()
                .map(|kind| IssueCode {
                    kind: *kind,
                    id: Arc::from(format!("{prefix}.{}", kind.local_id())),
                })
                .collect(),
            reported,
        }
    }

    pub fn get(&self, kind: IssueKind) -> &IssueCode {
        // ALL lists the kinds in declaration order
        &self.codes[kind as usize]
    }

    /// Codes of the kinds the check reports.
    pub fn iter(&self) -> impl Iterator<Item = &IssueCode> {
        self.reported.iter().map(|kind| self.get(*kind))
    }
}

/// A reported finding.
#[derive(Debug, Clone)]
pub struct Issue {
    pub description: String,
    pub involved: Vec<FeatureKey>,
    pub geometry: Geometry<f64>,
    pub code: IssueCode,
    /// Uppercased field names, sorted and space separated.
    pub affected_components: Option<String>,
    pub values: Vec<String>,
}

/// Receives findings from a check. Returns the number of issues recorded.
pub trait IssueReporter {
    fn report(&mut self, issue: Issue) -> usize;
}

/// Reporter that keeps every issue in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub issues: Vec<Issue>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues with the given kind.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.code.kind == kind)
    }
}

impl IssueReporter for CollectingReporter {
    fn report(&mut self, issue: Issue) -> usize {
        tracing::trace!(code = %issue.code, involved = ?issue.involved, "issue");
        self.issues.push(issue);
        1
    }
}

impl<R: IssueReporter + ?Sized> IssueReporter for &mut R {
    fn report(&mut self, issue: Issue) -> usize {
        (**self).report(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_ids_carry_prefix() {
        let codes = IssueCodes::new("BorderingLines", &IssueKind::ALL);
        for kind in IssueKind::ALL {
            assert_eq!(codes.get(kind).kind, kind);
        }
        assert_eq!(
            codes.get(IssueKind::NoCandidate).id.as_ref(),
            "BorderingLines.NoMatch.NoCandidate"
        );
        assert_eq!(
            codes
                .get(IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled)
                .to_string(),
            "BorderingLines.NoMatch.CandidateExists.BordersNotCoincident+ConstraintsFulfilled"
        );
    }

    #[test]
    fn test_listing_follows_reported_kinds() {
        let codes = IssueCodes::new(
            "BorderingPoints",
            &[IssueKind::NoCandidate, IssueKind::ConstraintsNotFulfilled],
        );
        let ids: Vec<&str> = codes.iter().map(|c| c.id.as_ref()).collect();
        assert_eq!(
            ids,
            vec![
                "BorderingPoints.NoMatch.NoCandidate",
                "BorderingPoints.Match.ConstraintsNotFulfilled"
            ]
        );
        assert_eq!(
            codes
                .get(IssueKind::CandidateExistsEndPointOutsideToleranceConstraintsFulfilled)
                .id
                .as_ref(),
            "BorderingPoints.NoMatch.CandidateExists.EndPointOutsideTolerance+ConstraintsFulfilled"
        );
    }

    #[test]
    fn test_candidate_exists_kinds() {
        assert_eq!(
            IssueKind::candidate_exists(true, true, true),
            IssueKind::CandidateExistsConstraintsFulfilled
        );
        assert_eq!(
            IssueKind::candidate_exists(false, false, true),
            IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled
        );
        assert_eq!(
            IssueKind::candidate_exists(false, true, false),
            IssueKind::CandidateExistsEndPointOutsideToleranceBordersNotCoincidentConstraintsFulfilled
        );
    }

    #[test]
    fn test_code_serializes_with_shared_id() {
        let codes = IssueCodes::new("CrossingLines", &IssueKind::ALL);
        let code = codes.get(IssueKind::NoCandidateConnectedOnSameSide);
        let json = serde_json::to_value(code).unwrap();
        assert_eq!(json["kind"], "NoCandidateConnectedOnSameSide");
        assert_eq!(
            json["id"],
            "CrossingLines.NoMatch.NoCandidate.ConnectedOnSameSide"
        );
    }
}
