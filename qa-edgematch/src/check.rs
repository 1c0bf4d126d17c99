//! The edge-match check and its tile lifecycle.
//!
//! A run drives the check with three hooks:
//!
//! ```text
//!   begin_tile(Initial)  complete_tile()          clears all state
//!   begin_tile(Running)  execute(row)*  complete_tile()
//!   ...
//!   begin_tile(Final)    execute(row)*  complete_tile()   reports the rest
//! ```
//!
//! A row is executed in every tile it intersects. The first execution
//! resolves its border connections and classifies all neighbors across the
//! border; later executions find everything in place. Pair findings are
//! raised while executing, coverage findings at tile completion once the
//! tile has completely processed the geometry involved.
//!
//! Checks whose features meet the border at points (see
//! [`BorderContact`]) evaluate each contact point once, on its first
//! execution; see the `points` submodule.

mod points;

use crate::condition::{EqualFieldValuesCondition, RowPairCondition};
use crate::config::{EdgeMatchConfig, EdgeMatchLayout, Side};
use crate::connection::{BorderConnection, BorderConnectionResolver, BorderSpec};
use crate::constraint::{
    AttributeRules, ConstraintError, ConstraintErrorCache, ErrorShape, PairMember,
};
use crate::contact::{EvaluatedContacts, PointConnectionResolver};
use crate::coverage::{BoundaryCoverageTracker, HandledGap, UncoveredPart};
use crate::error::{EdgeMatchError, Result};
use crate::feature::Feature;
use crate::geometry::{lines_geometry, GeometryKind};
use crate::issue::{Issue, IssueCodes, IssueKind, IssueReporter};
use crate::linear;
use crate::neighbors::NeighborMatcher;
use crate::source::{FeatureSource, RowFilter};
use crate::strategy::{BorderContact, EdgeMatchStrategy};
use crate::tile::{Tile, TileCompletionEvictor, TileState};
use geo_types::{Geometry, MultiLineString, Point};
use std::sync::Arc;

const NO_CANDIDATE: &str = "No potential match found within search distance.";
const PARTLY_OUTSIDE: &str = "Partly outside verified extent.";
const CANDIDATE_EXISTS: &str =
    "Match candidate exists within search distance, but borders are not coincident.";
const END_POINT_NOT_COINCIDENT: &str =
    "End point is not coincident with the end point of the matching feature on the border.";

/// Role of a class in the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRole {
    /// Matched feature class of a side.
    Feature(Side),
    /// Border class of a side.
    Border(Side),
    /// Bounding feature class of a side.
    Bounding(Side),
}

/// Classes and rules of one side.
#[derive(Debug)]
struct SideSetup {
    classes: Vec<usize>,
    border: BorderSpec,
    bounding_classes: Vec<usize>,
    /// Area bound to the first alias, bounding feature to the second.
    bounding_condition: RowPairCondition,
}

/// An edge-match check over one feature source.
pub struct EdgeMatchCheck<'s, S> {
    source: &'s dyn FeatureSource,
    strategy: S,
    layout: EdgeMatchLayout,
    config: EdgeMatchConfig,
    codes: IssueCodes,
    sides: [SideSetup; 2],
    matcher: NeighborMatcher,
    rules: AttributeRules,
    resolver: BorderConnectionResolver,
    trackers: [BoundaryCoverageTracker; 2],
    points: PointConnectionResolver,
    evaluated: EvaluatedContacts,
    constraint_errors: ConstraintErrorCache,
    tile: Option<Tile>,
}

impl<'s, S: EdgeMatchStrategy> EdgeMatchCheck<'s, S> {
    /// Validate the layout against the source and compile all conditions.
    pub fn new(
        strategy: S,
        layout: EdgeMatchLayout,
        config: EdgeMatchConfig,
        source: &'s dyn FeatureSource,
    ) -> Result<Self> {
        layout.validate()?;
        config.validate()?;
        for class_index in layout.all_classes() {
            if class_index >= source.class_count() {
                return Err(EdgeMatchError::UnknownClass(class_index));
            }
        }
        if !strategy.supports_bounding_features()
            && (!layout.bounding1.is_empty() || !layout.bounding2.is_empty())
        {
            return Err(EdgeMatchError::config(format!(
                "{} checks do not support bounding classes",
                strategy.code_prefix()
            )));
        }

        let cs = config.case_sensitive;
        let [feature_alias, border_alias] = strategy.border_aliases();
        let [alias1, alias2] = strategy.pair_aliases();

        let mut sides = Vec::with_capacity(2);
        for side in Side::BOTH {
            for &class_index in layout.classes(side) {
                expect_kind(source, class_index, &[strategy.feature_kind()])?;
            }
            let border_kind = expect_kind(
                source,
                layout.border(side),
                &[GeometryKind::Polyline, GeometryKind::Polygon],
            )?;
            for &class_index in layout.bounding(side) {
                expect_kind(
                    source,
                    class_index,
                    &[GeometryKind::Polyline, GeometryKind::Polygon],
                )?;
            }

            let (border_condition, bounding_condition) = match side {
                Side::One => (
                    &config.border_match_condition1,
                    &config.bounding_feature_match_condition1,
                ),
                Side::Two => (
                    &config.border_match_condition2,
                    &config.bounding_feature_match_condition2,
                ),
            };
            sides.push(SideSetup {
                classes: layout.classes(side).to_vec(),
                border: BorderSpec {
                    class_index: layout.border(side),
                    kind: border_kind,
                    condition: RowPairCondition::new(
                        border_condition.as_deref(),
                        feature_alias,
                        border_alias,
                        true,
                        cs,
                    )?,
                },
                bounding_classes: layout.bounding(side).to_vec(),
                bounding_condition: RowPairCondition::new(
                    bounding_condition.as_deref(),
                    feature_alias,
                    "BOUNDINGFEATURE",
                    true,
                    cs,
                )?,
            });
        }
        let sides: [SideSetup; 2] = sides
            .try_into()
            .map_err(|_| EdgeMatchError::config("expected exactly two sides"))?;

        let match_condition =
            RowPairCondition::new(config.match_condition.as_deref(), alias1, alias2, true, cs)?;
        let constraint = RowPairCondition::new(
            config.attribute_constraint.as_deref(),
            alias1,
            alias2,
            !config.is_attribute_constraint_symmetric,
            cs,
        )?;
        let equal_fields = EqualFieldValuesCondition::new(
            &config.equal_attributes,
            &config.equal_attribute_options,
            cs,
        )?;
        let rules = AttributeRules::new(
            constraint,
            equal_fields,
            config.report_individual_attribute_constraint_violations,
        );

        let side_tolerance = |side: Side| {
            layout
                .classes(side)
                .iter()
                .map(|&c| config.xy_tolerance(c))
                .fold(0.0, f64::max)
        };
        let trackers = [
            BoundaryCoverageTracker::new(side_tolerance(Side::One)),
            BoundaryCoverageTracker::new(side_tolerance(Side::Two)),
        ];

        tracing::debug!(
            check = strategy.code_prefix(),
            search_distance = config.search_distance,
            classes1 = ?layout.classes1,
            classes2 = ?layout.classes2,
            "edge-match check created"
        );

        Ok(Self {
            source,
            codes: strategy.issue_codes(),
            matcher: NeighborMatcher::new(config.search_distance, match_condition),
            strategy,
            layout,
            config,
            sides,
            rules,
            resolver: BorderConnectionResolver::new(),
            trackers,
            points: PointConnectionResolver::new(),
            evaluated: EvaluatedContacts::new(),
            constraint_errors: ConstraintErrorCache::new(),
            tile: None,
        })
    }

    pub fn source(&self) -> &'s dyn FeatureSource {
        self.source
    }

    pub fn layout(&self) -> &EdgeMatchLayout {
        &self.layout
    }

    pub fn config(&self) -> &EdgeMatchConfig {
        &self.config
    }

    pub fn codes(&self) -> &IssueCodes {
        &self.codes
    }

    /// Coverage bookkeeping of one side.
    pub fn coverage(&self, side: Side) -> &BoundaryCoverageTracker {
        &self.trackers[side.index()]
    }

    /// Role of a class, `None` for classes the check does not use.
    pub fn class_role(&self, class_index: usize) -> Option<ClassRole> {
        Side::BOTH.into_iter().find_map(|side| {
            let setup = &self.sides[side.index()];
            if setup.classes.contains(&class_index) {
                Some(ClassRole::Feature(side))
            } else if setup.border.class_index == class_index {
                Some(ClassRole::Border(side))
            } else if setup.bounding_classes.contains(&class_index) {
                Some(ClassRole::Bounding(side))
            } else {
                None
            }
        })
    }

    /// Matched feature classes of both sides, side 1 first.
    pub fn feature_classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.sides.iter().flat_map(|s| s.classes.iter().copied())
    }

    /// Start a tile. An initial tile clears all state.
    pub fn begin_tile(&mut self, tile: Tile) {
        if tile.state == TileState::Initial {
            self.clear();
        }
        self.tile = Some(tile);
    }

    /// Check one row of the current tile. Rows of border and bounding
    /// classes are ignored. Returns the number of issues reported.
    pub fn execute(
        &mut self,
        feature: &Arc<Feature>,
        reporter: &mut dyn IssueReporter,
    ) -> Result<usize> {
        let tile = self.current_tile("execute")?;
        if tile.state == TileState::Initial {
            return Ok(0);
        }
        let Some(ClassRole::Feature(side)) = self.class_role(feature.key.class_index) else {
            return Ok(0);
        };
        if self.strategy.border_contact() == BorderContact::AtPoints {
            return self.execute_contacts(side, feature, reporter);
        }

        let tolerance = self.config.xy_tolerance(feature.key.class_index);
        let connections = self.resolver.resolve(
            feature,
            &self.sides[side.index()].border,
            tolerance,
            &self.strategy,
            self.source,
        )?;

        let mut errors = 0;
        for connection in &connections {
            let record = self.trackers[side.index()].register(connection, tolerance);
            if record.searched {
                continue;
            }
            record.searched = true;

            errors += self.match_neighbors(side, connection, tolerance, reporter)?;

            if self.strategy.supports_bounding_features() {
                let bounding = self.bounding_features(side, connection, tolerance)?;
                if let Some(record) = self.trackers[side.index()].record_mut(&connection.key) {
                    record.bounding = bounding;
                }
            }
        }
        Ok(errors)
    }

    /// Finish the current tile: report what it completed and drop state
    /// that is no longer needed. Returns the number of issues reported.
    pub fn complete_tile(&mut self, reporter: &mut dyn IssueReporter) -> Result<usize> {
        let tile = self.current_tile("complete_tile")?;
        self.tile = None;
        if tile.state == TileState::Initial {
            self.clear();
            return Ok(0);
        }

        let mut errors = 0;
        let report_uncovered = !self.config.allow_no_feature_within_search_distance;
        for side in Side::BOTH {
            let outcome = self.trackers[side.index()].complete_tile(&tile, report_uncovered);
            for gap in &outcome.gaps {
                self.queue_gap_errors(side, gap);
            }
            for part in &outcome.uncovered {
                errors += self.report_no_candidate(part, reporter);
            }
        }
        errors += self.constraint_errors.flush(&tile, reporter);
        let evicted = self.resolver.evict_completed(&tile)
            + self.points.evict_completed(&tile);
        self.evaluated.evict_completed(&tile);
        if tile.is_final() {
            self.clear();
        }

        tracing::debug!(
            state = ?tile.state,
            issues = errors,
            evicted,
            cached = self.cached_connection_count(),
            tracked = self.tracked_connection_count(),
            pending = self.constraint_errors.len(),
            "tile completed"
        );
        Ok(errors)
    }

    /// Cached (feature, border class) connection entries.
    pub fn cached_connection_count(&self) -> usize {
        self.resolver.cache().len() + self.points.cache().len()
    }

    /// Border connections tracked for coverage on both sides, plus contact
    /// points already evaluated.
    pub fn tracked_connection_count(&self) -> usize {
        self.trackers
            .iter()
            .map(BoundaryCoverageTracker::len)
            .sum::<usize>()
            + self.evaluated.len()
    }

    /// Queued pair findings not yet reported.
    pub fn pending_constraint_error_count(&self) -> usize {
        self.constraint_errors.len()
    }

    fn current_tile(&self, hook: &str) -> Result<Tile> {
        self.tile
            .ok_or_else(|| EdgeMatchError::Lifecycle(format!("{hook} called outside of a tile")))
    }

    fn clear(&mut self) {
        self.resolver.clear();
        self.points.clear();
        self.evaluated.clear();
        for tracker in &mut self.trackers {
            tracker.clear();
        }
        self.constraint_errors.clear();
    }

    /// Classify every connection of the candidates across the border.
    fn match_neighbors(
        &mut self,
        side: Side,
        connection: &Arc<BorderConnection>,
        tolerance: f64,
        reporter: &mut dyn IssueReporter,
    ) -> Result<usize> {
        let other = side.opposite().index();
        let candidates = self.matcher.candidates(
            connection,
            side,
            &self.sides[other].classes,
            self.source,
        )?;

        let mut errors = 0;
        for candidate in candidates {
            let neighbor_tolerance = self.config.xy_tolerance(candidate.key.class_index);
            let neighbors = self.resolver.resolve(
                &candidate,
                &self.sides[other].border,
                neighbor_tolerance,
                &self.strategy,
                self.source,
            )?;

            for neighbor in &neighbors {
                let known = self.trackers[side.index()]
                    .record(&connection.key)
                    .is_some_and(|r| r.contains(&neighbor.key));
                if known {
                    continue;
                }

                let classification = self.matcher.classify(connection, neighbor, tolerance);
                if let Some(common) = &classification.common {
                    self.queue_match_errors(side, connection, neighbor, common, tolerance);
                    if !self.config.allow_non_coincident_end_points_on_border {
                        errors += self.check_end_points(
                            connection, neighbor, common, tolerance, reporter,
                        );
                    }
                }

                let tracker = &mut self.trackers[side.index()];
                let found = classification.into_neighbors(neighbor);
                if found.is_empty() {
                    tracker.mark_classified(&connection.key, neighbor.key);
                } else {
                    tracker.add_neighbors(&connection.key, found);
                }
            }
        }
        Ok(errors)
    }

    fn queue_match_errors(
        &mut self,
        side: Side,
        connection: &Arc<BorderConnection>,
        neighbor: &Arc<BorderConnection>,
        common: &MultiLineString<f64>,
        tolerance: f64,
    ) {
        let (c1, c2) = side.order(connection, neighbor);
        for violation in self.rules.violations(&c1.feature, &c2.feature) {
            self.constraint_errors.add(ConstraintError {
                member1: PairMember::from(&**c1),
                member2: PairMember::from(&**c2),
                shape: ErrorShape::Along {
                    line: common.clone(),
                    tolerance,
                },
                code: self.codes.get(IssueKind::ConstraintsNotFulfilled).clone(),
                description: violation.description,
                affected_components: violation.affected_components,
                text_value: Some(violation.text_value),
                from_side1: side == Side::One,
            });
        }
    }

    /// End points of the feature on the common border must not lie inside
    /// the neighbor's along-border geometry.
    fn check_end_points(
        &self,
        connection: &BorderConnection,
        neighbor: &BorderConnection,
        common: &MultiLineString<f64>,
        tolerance: f64,
        reporter: &mut dyn IssueReporter,
    ) -> usize {
        let mut errors = 0;
        for point in self.strategy.end_points(&connection.feature) {
            if linear::point_distance(common, point) > tolerance
                || !linear::contains_in_interior(&neighbor.along_border, point, tolerance)
            {
                continue;
            }
            errors += reporter.report(Issue {
                description: END_POINT_NOT_COINCIDENT.to_string(),
                involved: vec![connection.key.feature, neighbor.key.feature],
                geometry: Geometry::Point(Point::from(point)),
                code: self.codes.get(IssueKind::EndPointNotCoincident).clone(),
                affected_components: None,
                values: Vec::new(),
            });
        }
        errors
    }

    fn queue_gap_errors(&mut self, side: Side, gap: &HandledGap) {
        if self
            .config
            .allow_disjoint_candidate_feature_if_borders_are_not_coincident
        {
            return;
        }
        let tolerance = self.config.xy_tolerance(gap.connection.class_index());
        let near = linear::near_part(
            &gap.line,
            &gap.neighbor.along_border,
            self.matcher.search_distance(),
        );
        let error_line = linear::union(&gap.line, &near, tolerance);

        let (c1, c2) = side.order(&gap.connection, &gap.neighbor);
        let violations = self.rules.violations(&c1.feature, &c2.feature);
        let error = |kind: IssueKind, description: String, affected, text_value| ConstraintError {
            member1: PairMember::from(&**c1),
            member2: PairMember::from(&**c2),
            shape: ErrorShape::Along {
                line: error_line.clone(),
                tolerance,
            },
            code: self.codes.get(kind).clone(),
            description,
            affected_components: affected,
            text_value,
            from_side1: side == Side::One,
        };

        let mut errors = Vec::new();
        if violations.is_empty() {
            if !self
                .config
                .allow_disjoint_candidate_feature_if_attribute_constraints_are_fulfilled
            {
                errors.push(error(
                    IssueKind::CandidateExistsBordersNotCoincidentConstraintsFulfilled,
                    CANDIDATE_EXISTS.to_string(),
                    None,
                    None,
                ));
            }
        } else {
            for violation in violations {
                errors.push(error(
                    IssueKind::CandidateExistsBordersNotCoincidentConstraintsNotFulfilled,
                    format!("{CANDIDATE_EXISTS} {}.", violation.description),
                    violation.affected_components,
                    Some(violation.text_value),
                ));
            }
        }
        for e in errors {
            self.constraint_errors.add(e);
        }
    }

    fn report_no_candidate(
        &self,
        part: &UncoveredPart,
        reporter: &mut dyn IssueReporter,
    ) -> usize {
        let (kind, description) = if part.partly_outside {
            (
                IssueKind::NoCandidatePartlyOutsideVerifiedExtent,
                format!("{NO_CANDIDATE} {PARTLY_OUTSIDE}"),
            )
        } else {
            (IssueKind::NoCandidate, NO_CANDIDATE.to_string())
        };
        reporter.report(Issue {
            description,
            involved: vec![part.connection.key.feature],
            geometry: lines_geometry(&part.part),
            code: self.codes.get(kind).clone(),
            affected_components: None,
            values: Vec::new(),
        })
    }

    /// Bounding features of the side touching the along-border geometry.
    fn bounding_features(
        &self,
        side: Side,
        connection: &BorderConnection,
        tolerance: f64,
    ) -> Result<Vec<Arc<Feature>>> {
        let setup = &self.sides[side.index()];
        if setup.bounding_classes.is_empty() {
            return Ok(Vec::new());
        }
        let area = connection.feature.as_ref();
        let filter: RowFilter<'_> =
            &|candidate: &Feature| setup.bounding_condition.is_fulfilled(area, candidate);
        let envelope = connection
            .along_envelope
            .expand(self.matcher.search_distance());

        let mut bounding = Vec::new();
        for &class_index in &setup.bounding_classes {
            for candidate in self.source.search(class_index, &envelope, Some(filter))? {
                let distance = linear::shape_distance(&connection.along_border, &candidate.shape);
                if distance <= tolerance {
                    bounding.push(candidate);
                }
            }
        }
        Ok(bounding)
    }
}

fn expect_kind(
    source: &dyn FeatureSource,
    class_index: usize,
    allowed: &[GeometryKind],
) -> Result<GeometryKind> {
    let schema = source.schema(class_index)?;
    if allowed.contains(&schema.kind) {
        Ok(schema.kind)
    } else {
        Err(EdgeMatchError::config(format!(
            "class '{}' has {:?} geometry, expected one of {:?}",
            schema.name, schema.kind, allowed
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{parse_wkt, Envelope};
    use crate::issue::CollectingReporter;
    use crate::source::{ClassSchema, MemorySource};
    use crate::strategy::{BorderingLines, CrossingAreas};
    use crate::Value;

    fn line_source() -> MemorySource {
        let mut source = MemorySource::new();
        source.add_class(ClassSchema::new("lines1", GeometryKind::Polyline));
        source.add_class(ClassSchema::new("border1", GeometryKind::Polyline));
        source.add_class(ClassSchema::new("lines2", GeometryKind::Polyline));
        source.add_class(ClassSchema::new("border2", GeometryKind::Polyline));
        source
    }

    fn insert(source: &mut MemorySource, class: usize, id: u64, wkt: &str) {
        source
            .insert(class, id, parse_wkt(wkt).unwrap(), Vec::<(String, Value)>::new())
            .unwrap();
    }

    #[test]
    fn test_rejects_wrong_feature_kind() {
        let mut source = MemorySource::new();
        source.add_class(ClassSchema::new("areas", GeometryKind::Polygon));
        source.add_class(ClassSchema::new("border1", GeometryKind::Polyline));
        source.add_class(ClassSchema::new("lines2", GeometryKind::Polyline));
        source.add_class(ClassSchema::new("border2", GeometryKind::Polyline));
        let result = EdgeMatchCheck::new(
            BorderingLines,
            EdgeMatchLayout::new(0, 1, 2, 3),
            EdgeMatchConfig::new(1.0),
            &source,
        );
        assert!(matches!(result, Err(EdgeMatchError::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_class() {
        let source = line_source();
        let result = EdgeMatchCheck::new(
            BorderingLines,
            EdgeMatchLayout::new(0, 1, 2, 7),
            EdgeMatchConfig::new(1.0),
            &source,
        );
        assert!(matches!(result, Err(EdgeMatchError::UnknownClass(7))));
    }

    #[test]
    fn test_rejects_bounding_for_lines() {
        let mut source = line_source();
        source.add_class(ClassSchema::new("lakes", GeometryKind::Polygon));
        let layout = EdgeMatchLayout::new(0, 1, 2, 3).with_bounding(vec![4], vec![]);
        let result =
            EdgeMatchCheck::new(BorderingLines, layout, EdgeMatchConfig::new(1.0), &source);
        assert!(result.is_err());
        assert!(EdgeMatchCheck::new(
            CrossingAreas,
            EdgeMatchLayout::new(0, 1, 2, 3),
            EdgeMatchConfig::new(1.0),
            &source
        )
        .is_err());
    }

    #[test]
    fn test_rejects_bad_condition() {
        let source = line_source();
        let config = EdgeMatchConfig::new(1.0).with_match_condition("LINE1.STATE = ");
        let layout = EdgeMatchLayout::new(0, 1, 2, 3);
        let result = EdgeMatchCheck::new(BorderingLines, layout, config, &source);
        assert!(matches!(result, Err(EdgeMatchError::Condition(_))));
    }

    #[test]
    fn test_class_roles() {
        let source = line_source();
        let check = EdgeMatchCheck::new(
            BorderingLines,
            EdgeMatchLayout::new(0, 1, 2, 3),
            EdgeMatchConfig::new(1.0),
            &source,
        )
        .unwrap();
        assert_eq!(check.class_role(0), Some(ClassRole::Feature(Side::One)));
        assert_eq!(check.class_role(3), Some(ClassRole::Border(Side::Two)));
        assert_eq!(check.class_role(9), None);
        assert_eq!(check.feature_classes().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_execute_requires_tile() {
        let mut source = line_source();
        insert(&mut source, 0, 1, "LINESTRING (0 0, 10 0)");
        let check_source = &source;
        let mut check = EdgeMatchCheck::new(
            BorderingLines,
            EdgeMatchLayout::new(0, 1, 2, 3),
            EdgeMatchConfig::new(1.0),
            check_source,
        )
        .unwrap();
        let feature = check_source
            .search(0, &Envelope::new(-1.0, -1.0, 11.0, 1.0), None)
            .unwrap()
            .remove(0);
        let mut reporter = CollectingReporter::new();
        assert!(matches!(
            check.execute(&feature, &mut reporter),
            Err(EdgeMatchError::Lifecycle(_))
        ));
        assert!(check.complete_tile(&mut reporter).is_err());
    }

    #[test]
    fn test_single_tile_missing_neighbor() {
        let mut source = line_source();
        insert(&mut source, 1, 1, "LINESTRING (-5 0, 15 0)");
        insert(&mut source, 3, 1, "LINESTRING (-5 0, 15 0)");
        insert(&mut source, 0, 1, "LINESTRING (0 5, 0 0, 10 0)");

        let mut check = EdgeMatchCheck::new(
            BorderingLines,
            EdgeMatchLayout::new(0, 1, 2, 3),
            EdgeMatchConfig::new(0.5),
            &source,
        )
        .unwrap();
        let run = Envelope::new(-5.0, -5.0, 15.0, 5.0);
        let mut reporter = CollectingReporter::new();

        check.begin_tile(Tile::initial(run));
        check.complete_tile(&mut reporter).unwrap();

        check.begin_tile(Tile::new(TileState::Final, run, run));
        for feature in source.search(0, &run, None).unwrap() {
            check.execute(&feature, &mut reporter).unwrap();
        }
        let errors = check.complete_tile(&mut reporter).unwrap();

        assert_eq!(errors, 1);
        assert_eq!(reporter.issues.len(), 1);
        assert_eq!(
            reporter.issues[0].code.id.as_ref(),
            "BorderingLines.NoMatch.NoCandidate"
        );
        assert_eq!(check.cached_connection_count(), 0);
        assert_eq!(check.tracked_connection_count(), 0);
        assert_eq!(check.pending_constraint_error_count(), 0);
    }
}
