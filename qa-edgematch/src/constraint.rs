//! Attribute rules for matched pairs and the deferred constraint errors.
//!
//! Both sides of the border see the same pair of features, so most pair
//! findings are raised twice. They are queued in a [`ConstraintErrorCache`]
//! and reported once per feature pair, issue code and affected fields, when
//! both features are completely processed.

use crate::condition::{ConditionOutcome, EqualFieldValuesCondition, RowPairCondition};
use crate::connection::BorderConnection;
use crate::contact::PointConnection;
use crate::feature::{Feature, FeatureKey};
use crate::geometry::{lines_geometry, Envelope};
use crate::issue::{Issue, IssueCode, IssueKind, IssueReporter};
use crate::linear;
use crate::tile::{Tile, TileState};
use geo_types::{Geometry, MultiLineString};
use std::collections::BTreeMap;

/// One violated attribute rule of a feature pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeViolation {
    pub description: String,
    pub affected_components: Option<String>,
    pub text_value: String,
}

/// Attribute constraint plus equal-field rules of a check.
#[derive(Debug, Clone)]
pub struct AttributeRules {
    /// Side 1 feature bound to the first alias.
    constraint: RowPairCondition,
    equal_fields: EqualFieldValuesCondition,
    report_individually: bool,
}

impl AttributeRules {
    pub fn new(
        constraint: RowPairCondition,
        equal_fields: EqualFieldValuesCondition,
        report_individually: bool,
    ) -> Self {
        Self {
            constraint,
            equal_fields,
            report_individually,
        }
    }

    /// Violations of a side 1 / side 2 feature pair. Empty if all rules
    /// hold.
    pub fn violations(&self, feature1: &Feature, feature2: &Feature) -> Vec<AttributeViolation> {
        let outcome = self.constraint.evaluate(feature1, feature2);
        let unequal = self.equal_fields.non_equal_fields(feature1, feature2);

        if self.report_individually {
            let mut violations = Vec::new();
            if let ConditionOutcome::Violated { message, fields } = outcome {
                violations.push(AttributeViolation {
                    description: format!("Constraint is not fulfilled ({message})"),
                    affected_components: format_affected_components(
                        fields.iter().map(String::as_str),
                    ),
                    text_value: message,
                });
            }
            for field in unequal {
                violations.push(AttributeViolation {
                    description: format!("Values are not equal ({})", field.message),
                    affected_components: format_affected_components([field.field.as_str()]),
                    text_value: field.message,
                });
            }
            return violations;
        }

        let mut descriptions = Vec::new();
        let mut text_values = Vec::new();
        let mut affected: Vec<String> = Vec::new();
        if let ConditionOutcome::Violated { message, fields } = outcome {
            descriptions.push(format!("Constraint is not fulfilled ({message})"));
            text_values.push(message);
            affected.extend(fields);
        }
        if !unequal.is_empty() {
            let message = unequal
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>()
                .join(";");
            descriptions.push(format!("Values are not equal ({message})"));
            text_values.push(message);
            affected.extend(unequal.into_iter().map(|f| f.field));
        }
        if descriptions.is_empty() {
            return Vec::new();
        }
        vec![AttributeViolation {
            description: descriptions.join(". "),
            affected_components: format_affected_components(affected.iter().map(String::as_str)),
            text_value: text_values.join("|"),
        }]
    }
}

/// Uppercased field names, deduplicated, sorted and space separated.
/// `None` without fields.
pub fn format_affected_components<'a>(fields: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut names: Vec<String> = fields.into_iter().map(str::to_uppercase).collect();
    names.sort_unstable();
    names.dedup();
    (!names.is_empty()).then(|| names.join(" "))
}

/// One feature of a pair finding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMember {
    pub feature: FeatureKey,
    /// Envelope the feature is completely processed with.
    pub envelope: Envelope,
}

impl From<&BorderConnection> for PairMember {
    fn from(connection: &BorderConnection) -> Self {
        Self {
            feature: connection.key.feature,
            envelope: connection.feature_envelope(),
        }
    }
}

impl From<&PointConnection> for PairMember {
    fn from(connection: &PointConnection) -> Self {
        Self {
            feature: connection.key.feature,
            envelope: connection.feature_envelope(),
        }
    }
}

/// Where a pair finding is reported.
#[derive(Debug, Clone)]
pub enum ErrorShape {
    /// Stretch of the common border. The stretches of a group are merged.
    Along {
        line: MultiLineString<f64>,
        tolerance: f64,
    },
    /// Geometry reported as is, taken from the first finding of a group.
    Fixed(Geometry<f64>),
}

/// A pair finding waiting for its counterpart from the other side.
#[derive(Debug, Clone)]
pub struct ConstraintError {
    /// The side 1 feature.
    pub member1: PairMember,
    /// The side 2 feature.
    pub member2: PairMember,
    pub shape: ErrorShape,
    pub code: IssueCode,
    pub description: String,
    pub affected_components: Option<String>,
    pub text_value: Option<String>,
    /// Raised while processing the side 1 feature.
    pub from_side1: bool,
}

/// Findings of one pair agree on kind, fields and values from either side.
type GroupKey = (
    FeatureKey,
    FeatureKey,
    IssueKind,
    Option<String>,
    Option<String>,
);

impl ConstraintError {
    fn group_key(&self) -> GroupKey {
        (
            self.member1.feature,
            self.member2.feature,
            self.code.kind,
            self.affected_components.clone(),
            self.text_value.clone(),
        )
    }
}

/// Queue of pair findings, reported once per group.
#[derive(Debug, Default)]
pub struct ConstraintErrorCache {
    groups: BTreeMap<GroupKey, Vec<ConstraintError>>,
}

impl ConstraintErrorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ConstraintError) {
        self.groups.entry(error.group_key()).or_default().push(error);
    }

    /// Report every group whose two features are completely processed, and
    /// every group at the final tile. Returns the number of issues.
    pub fn flush(&mut self, tile: &Tile, reporter: &mut dyn IssueReporter) -> usize {
        if tile.state == TileState::Initial {
            self.clear();
            return 0;
        }

        let ready: Vec<GroupKey> = self
            .groups
            .iter()
            .filter(|(_, errors)| {
                errors.first().is_some_and(|e| {
                    tile.is_handled(&e.member1.envelope) && tile.is_handled(&e.member2.envelope)
                })
            })
            .map(|(key, _)| key.clone())
            .collect();

        let mut count = 0;
        for key in ready {
            if let Some(errors) = self.groups.remove(&key) {
                count += report_group(errors, reporter);
            }
        }
        count
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Number of queued findings.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn report_group(mut errors: Vec<ConstraintError>, reporter: &mut dyn IssueReporter) -> usize {
    errors.sort_by(|a, b| {
        b.from_side1
            .cmp(&a.from_side1)
            .then_with(|| a.description.cmp(&b.description))
    });
    let Some(first) = errors.first() else {
        return 0;
    };

    let (geometry, common_length) = match &first.shape {
        ErrorShape::Along { tolerance, .. } => {
            let lines = errors.iter().filter_map(|e| match &e.shape {
                ErrorShape::Along { line, .. } => Some(line),
                ErrorShape::Fixed(_) => None,
            });
            let line = linear::union_all(lines, *tolerance);
            (lines_geometry(&line), Some(linear::length(&line)))
        }
        ErrorShape::Fixed(geometry) => (geometry.clone(), None),
    };
    let description = match common_length {
        Some(length) if first.code.kind == IssueKind::ConstraintsNotFulfilled => format!(
            "Attribute constraints are not fulfilled along {:.3} of the common border: {}",
            length, first.description
        ),
        _ => first.description.clone(),
    };

    reporter.report(Issue {
        description,
        involved: vec![first.member1.feature, first.member2.feature],
        geometry,
        code: first.code.clone(),
        affected_components: first.affected_components.clone(),
        values: first.text_value.iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionKey;
    use crate::geometry::{parse_wkt, shape_lines};
    use crate::issue::{CollectingReporter, IssueCodes};
    use geo_types::{Coord, MultiPoint, Point};
    use std::sync::Arc;

    fn row(id: u64, state: &str, kind: &str) -> Feature {
        Feature::new(FeatureKey::new(0, id), parse_wkt("LINESTRING (0 0, 1 0)").unwrap())
            .with_attribute("STATE", state)
            .with_attribute("KIND", kind)
    }

    fn rules(individually: bool) -> AttributeRules {
        let constraint = RowPairCondition::new(
            Some("LINE1.STATE = LINE2.STATE"),
            "LINE1",
            "LINE2",
            true,
            false,
        )
        .unwrap();
        let equal = EqualFieldValuesCondition::new(&["KIND".to_string()], &[], false).unwrap();
        AttributeRules::new(constraint, equal, individually)
    }

    fn connection(class: usize, id: u64, wkt: &str) -> Arc<BorderConnection> {
        let shape = parse_wkt(wkt).unwrap();
        let feature = Arc::new(Feature::new(FeatureKey::new(class, id), shape.clone()));
        let along_border = shape_lines(&shape).unwrap();
        let along_envelope = Envelope::of_lines(&along_border).unwrap();
        Arc::new(BorderConnection {
            key: ConnectionKey {
                feature: feature.key,
                border: FeatureKey::new(class + 1, 1),
            },
            border_feature: Arc::clone(&feature),
            feature,
            along_border,
            along_envelope,
        })
    }

    #[test]
    fn test_combined_violation() {
        let violations = rules(false).violations(&row(1, "A", "x"), &row(2, "B", "y"));
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(
            v.description,
            "Constraint is not fulfilled (LINE1.STATE:'A';LINE2.STATE:'B'). \
             Values are not equal (KIND:'x','y')"
        );
        assert_eq!(v.affected_components.as_deref(), Some("KIND STATE"));
        assert_eq!(v.text_value, "LINE1.STATE:'A';LINE2.STATE:'B'|KIND:'x','y'");
    }

    #[test]
    fn test_individual_violations() {
        let violations = rules(true).violations(&row(1, "A", "x"), &row(2, "B", "y"));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].affected_components.as_deref(), Some("STATE"));
        assert_eq!(violations[1].affected_components.as_deref(), Some("KIND"));
        assert!(rules(true)
            .violations(&row(1, "A", "x"), &row(2, "A", "x"))
            .is_empty());
    }

    #[test]
    fn test_symmetric_findings_reported_once() {
        let codes = IssueCodes::new("BorderingLines", &IssueKind::ALL);
        let a = connection(0, 1, "LINESTRING (0 0, 10 0)");
        let b = connection(2, 1, "LINESTRING (0 0, 10 0)");
        let error = |from_side1| ConstraintError {
            member1: PairMember::from(&*a),
            member2: PairMember::from(&*b),
            shape: ErrorShape::Along {
                line: a.along_border.clone(),
                tolerance: 0.001,
            },
            code: codes.get(IssueKind::ConstraintsNotFulfilled).clone(),
            description: "Constraint is not fulfilled (x)".to_string(),
            affected_components: Some("STATE".to_string()),
            text_value: Some("x".to_string()),
            from_side1,
        };

        let mut cache = ConstraintErrorCache::new();
        cache.add(error(false));
        cache.add(error(true));
        assert_eq!(cache.len(), 2);

        let run = Envelope::new(0.0, -5.0, 20.0, 5.0);
        let mut reporter = CollectingReporter::new();
        let waiting = Tile::new(TileState::Running, Envelope::new(0.0, -5.0, 5.0, 5.0), run);
        assert_eq!(cache.flush(&waiting, &mut reporter), 0);

        let done = Tile::new(TileState::Running, Envelope::new(5.0, -5.0, 15.0, 5.0), run);
        assert_eq!(cache.flush(&done, &mut reporter), 1);
        assert!(cache.is_empty());

        let issue = &reporter.issues[0];
        assert_eq!(issue.involved, vec![a.key.feature, b.key.feature]);
        assert_eq!(
            issue.description,
            "Attribute constraints are not fulfilled along 10.000 of the common border: \
             Constraint is not fulfilled (x)"
        );
        assert_eq!(issue.values, vec!["x".to_string()]);
    }

    #[test]
    fn test_fixed_shape_taken_from_side1() {
        let codes = IssueCodes::new("CrossingLines", &IssueKind::ALL);
        let member = |class, x| PairMember {
            feature: FeatureKey::new(class, 1),
            envelope: Envelope::new(x, 0.0, x, 5.0),
        };
        let points = |x1: f64, x2: f64| {
            Geometry::MultiPoint(MultiPoint::new(vec![
                Point::from(Coord { x: x1, y: 0.0 }),
                Point::from(Coord { x: x2, y: 0.0 }),
            ]))
        };
        let error = |from_side1, geometry| ConstraintError {
            member1: member(0, 5.0),
            member2: member(2, 5.1),
            shape: ErrorShape::Fixed(geometry),
            code: codes
                .get(IssueKind::CandidateExistsConstraintsFulfilled)
                .clone(),
            description: "Match candidate exists".to_string(),
            affected_components: None,
            text_value: None,
            from_side1,
        };

        let mut cache = ConstraintErrorCache::new();
        cache.add(error(false, points(5.1, 5.0)));
        cache.add(error(true, points(5.0, 5.1)));

        let run = Envelope::new(0.0, -5.0, 20.0, 5.0);
        let mut reporter = CollectingReporter::new();
        assert_eq!(
            cache.flush(&Tile::new(TileState::Final, run, run), &mut reporter),
            1
        );
        assert_eq!(reporter.issues[0].geometry, points(5.0, 5.1));
        assert_eq!(reporter.issues[0].description, "Match candidate exists");
    }

    #[test]
    fn test_violations_of_same_field_kept_apart() {
        let codes = IssueCodes::new("CrossingLines", &IssueKind::ALL);
        let member = |class| PairMember {
            feature: FeatureKey::new(class, 1),
            envelope: Envelope::new(5.0, 0.0, 5.0, 5.0),
        };
        let error = |description: &str, text_value: &str| ConstraintError {
            member1: member(0),
            member2: member(2),
            shape: ErrorShape::Fixed(Geometry::Point(Point::new(5.0, 0.0))),
            code: codes.get(IssueKind::ConstraintsNotFulfilled).clone(),
            description: description.to_string(),
            affected_components: Some("FLD_DOUBLE".to_string()),
            text_value: Some(text_value.to_string()),
            from_side1: true,
        };

        let mut cache = ConstraintErrorCache::new();
        cache.add(error(
            "Constraint is not fulfilled (LINE1.FLD_DOUBLE:3;LINE2.FLD_DOUBLE:1)",
            "LINE1.FLD_DOUBLE:3;LINE2.FLD_DOUBLE:1",
        ));
        cache.add(error(
            "Values are not equal (FLD_DOUBLE:1,3)",
            "FLD_DOUBLE:1,3",
        ));

        let run = Envelope::new(0.0, -5.0, 20.0, 5.0);
        let mut reporter = CollectingReporter::new();
        assert_eq!(
            cache.flush(&Tile::new(TileState::Final, run, run), &mut reporter),
            2
        );
    }
}
