//! Edge-match check configuration types.
//!
//! [`EdgeMatchLayout`] says which source classes play which role; the
//! [`EdgeMatchConfig`] carries the tolerances, allowance flags and the
//! attribute rules. Both deserialize from the check definition files read
//! by the command-line runner.

use crate::error::{EdgeMatchError, Result};
use serde::{Deserialize, Serialize};

/// Default XY tolerance used when a class does not declare its own.
pub const DEFAULT_XY_TOLERANCE: f64 = 0.001;

/// One of the two sides of the border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    /// Order a pair given as (this side, other side) as (side 1, side 2).
    pub fn order<T>(self, own: T, other: T) -> (T, T) {
        match self {
            Side::One => (own, other),
            Side::Two => (other, own),
        }
    }
}

/// Assignment of source classes to the roles of an edge-match check.
///
/// All values are class indexes of the [`FeatureSource`](crate::FeatureSource)
/// the check runs against. Every index may appear in at most one role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeMatchLayout {
    /// Feature classes on side 1.
    pub classes1: Vec<usize>,
    /// Border class of side 1.
    pub border1: usize,
    /// Feature classes on side 2.
    pub classes2: Vec<usize>,
    /// Border class of side 2.
    pub border2: usize,
    /// Classes whose features may bound an unmatched area border on side 1.
    pub bounding1: Vec<usize>,
    /// Classes whose features may bound an unmatched area border on side 2.
    pub bounding2: Vec<usize>,
}

impl EdgeMatchLayout {
    /// Layout with one feature class and one border class per side.
    pub fn new(class1: usize, border1: usize, class2: usize, border2: usize) -> Self {
        Self {
            classes1: vec![class1],
            border1,
            classes2: vec![class2],
            border2,
            bounding1: Vec::new(),
            bounding2: Vec::new(),
        }
    }

    /// Set the bounding classes of both sides.
    pub fn with_bounding(mut self, bounding1: Vec<usize>, bounding2: Vec<usize>) -> Self {
        self.bounding1 = bounding1;
        self.bounding2 = bounding2;
        self
    }

    /// Feature classes of a side.
    pub fn classes(&self, side: Side) -> &[usize] {
        match side {
            Side::One => &self.classes1,
            Side::Two => &self.classes2,
        }
    }

    /// Border class of a side.
    pub fn border(&self, side: Side) -> usize {
        match side {
            Side::One => self.border1,
            Side::Two => self.border2,
        }
    }

    /// Bounding classes of a side.
    pub fn bounding(&self, side: Side) -> &[usize] {
        match side {
            Side::One => &self.bounding1,
            Side::Two => &self.bounding2,
        }
    }

    /// Every class index referenced by the layout, in role order.
    pub fn all_classes(&self) -> Vec<usize> {
        let mut all = Vec::new();
        all.extend(&self.classes1);
        all.push(self.border1);
        all.extend(&self.classes2);
        all.push(self.border2);
        all.extend(&self.bounding1);
        all.extend(&self.bounding2);
        all
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.classes1.is_empty() || self.classes2.is_empty() {
            return Err(EdgeMatchError::config(
                "each side needs at least one feature class",
            ));
        }
        let all = self.all_classes();
        let mut seen = all.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != all.len() {
            return Err(EdgeMatchError::config(
                "a class index may be assigned to only one role",
            ));
        }
        Ok(())
    }
}

/// Tolerances, allowances and attribute rules of an edge-match check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeMatchConfig {
    /// Maximum offset between features that are still considered candidates.
    pub search_distance: f64,

    /// XY tolerance per class index. Missing entries use
    /// [`DEFAULT_XY_TOLERANCE`].
    pub xy_tolerances: Vec<f64>,

    /// Condition between a side 1 feature (`LINE`/`AREA`) and its border
    /// (`BORDER`).
    pub border_match_condition1: Option<String>,
    /// Condition between a side 2 feature and its border.
    pub border_match_condition2: Option<String>,

    /// Condition a feature pair (`LINE1`/`LINE2` or `AREA1`/`AREA2`) must
    /// fulfil to be compared at all.
    pub match_condition: Option<String>,

    /// Constraint a matched feature pair must fulfil.
    pub attribute_constraint: Option<String>,

    /// Condition between a side 1 area and a bounding feature
    /// (`AREA`/`BOUNDINGFEATURE`).
    pub bounding_feature_match_condition1: Option<String>,
    /// Condition between a side 2 area and a bounding feature.
    pub bounding_feature_match_condition2: Option<String>,

    /// Evaluate the attribute constraint in both directions.
    pub is_attribute_constraint_symmetric: bool,

    /// Report each violated constraint part on its own.
    pub report_individual_attribute_constraint_violations: bool,

    /// Fields whose values must be equal for matched pairs.
    pub equal_attributes: Vec<String>,

    /// Field options: `FIELD:#` (multi-value separator),
    /// `FIELD:ignore=<regex>` and `FIELD:allowedDifferenceCondition=<expr>`.
    pub equal_attribute_options: Vec<String>,

    /// Compare text values case sensitively.
    pub case_sensitive: bool,

    pub allow_no_feature_within_search_distance: bool,
    pub allow_non_coincident_end_points_on_border: bool,
    pub allow_disjoint_candidate_feature_if_borders_are_not_coincident: bool,
    pub allow_disjoint_candidate_feature_if_attribute_constraints_are_fulfilled: bool,

    /// Distance within which two contact points on the border coincide.
    /// Negative: the larger XY tolerance of the two feature classes.
    pub coincidence_tolerance: f64,

    /// Unmatched end points closer than this are reported as a point pair
    /// instead of a connection line.
    pub minimum_error_connection_line_length: f64,

    /// Unmatched end points farther apart are reported as outside
    /// tolerance, connected to the nearest point of the candidate line.
    /// Zero: no maximum.
    pub maximum_end_point_connection_distance: f64,

    pub allow_no_feature_within_search_distance_if_connected_on_same_side: bool,
    /// Skip attribute rules where three or more lines meet at a border point.
    pub ignore_attribute_constraints_if_three_or_more_connected: bool,
    /// Skip line ends whose last segment runs along the border.
    pub ignore_end_points_of_bordering_lines: bool,
    /// Accept an end point lying on the interior of a candidate line that
    /// is itself connected to the border.
    pub allow_end_points_connecting_to_interior_of_valid_neighbor_line: bool,
    /// Skip candidate lines whose own border end point is beyond the search
    /// distance.
    pub ignore_neighbor_lines_with_border_connection_outside_search_distance: bool,
}

impl Default for EdgeMatchConfig {
    fn default() -> Self {
        Self {
            search_distance: 0.0,
            xy_tolerances: Vec::new(),
            border_match_condition1: None,
            border_match_condition2: None,
            match_condition: None,
            attribute_constraint: None,
            bounding_feature_match_condition1: None,
            bounding_feature_match_condition2: None,
            is_attribute_constraint_symmetric: false,
            report_individual_attribute_constraint_violations: false,
            equal_attributes: Vec::new(),
            equal_attribute_options: Vec::new(),
            case_sensitive: false,
            allow_no_feature_within_search_distance: false,
            allow_non_coincident_end_points_on_border: false,
            allow_disjoint_candidate_feature_if_borders_are_not_coincident: false,
            allow_disjoint_candidate_feature_if_attribute_constraints_are_fulfilled: false,
            coincidence_tolerance: 0.0,
            minimum_error_connection_line_length: 0.0,
            maximum_end_point_connection_distance: 0.0,
            allow_no_feature_within_search_distance_if_connected_on_same_side: true,
            ignore_attribute_constraints_if_three_or_more_connected: false,
            ignore_end_points_of_bordering_lines: true,
            allow_end_points_connecting_to_interior_of_valid_neighbor_line: false,
            ignore_neighbor_lines_with_border_connection_outside_search_distance: true,
        }
    }
}

impl EdgeMatchConfig {
    /// Create a config with the given search distance.
    pub fn new(search_distance: f64) -> Self {
        Self {
            search_distance,
            ..Self::default()
        }
    }

    /// Set the border match condition of both sides.
    pub fn with_border_match_conditions(
        mut self,
        condition1: impl Into<String>,
        condition2: impl Into<String>,
    ) -> Self {
        self.border_match_condition1 = Some(condition1.into());
        self.border_match_condition2 = Some(condition2.into());
        self
    }

    /// Set the pair match condition.
    pub fn with_match_condition(mut self, condition: impl Into<String>) -> Self {
        self.match_condition = Some(condition.into());
        self
    }

    /// Set the attribute constraint.
    pub fn with_attribute_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.attribute_constraint = Some(constraint.into());
        self
    }

    /// Set the bounding feature match condition of both sides.
    pub fn with_bounding_feature_match_conditions(
        mut self,
        condition1: impl Into<String>,
        condition2: impl Into<String>,
    ) -> Self {
        self.bounding_feature_match_condition1 = Some(condition1.into());
        self.bounding_feature_match_condition2 = Some(condition2.into());
        self
    }

    /// Set the equal attributes and their options.
    pub fn with_equal_attributes(
        mut self,
        fields: impl IntoIterator<Item = impl Into<String>>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.equal_attributes = fields.into_iter().map(Into::into).collect();
        self.equal_attribute_options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Set the XY tolerance of one class.
    pub fn with_xy_tolerance(mut self, class_index: usize, tolerance: f64) -> Self {
        if self.xy_tolerances.len() <= class_index {
            self.xy_tolerances
                .resize(class_index + 1, DEFAULT_XY_TOLERANCE);
        }
        self.xy_tolerances[class_index] = tolerance;
        self
    }

    /// Set the coincidence tolerance of contact points.
    pub fn with_coincidence_tolerance(mut self, tolerance: f64) -> Self {
        self.coincidence_tolerance = tolerance;
        self
    }

    /// XY tolerance of a class.
    pub fn xy_tolerance(&self, class_index: usize) -> f64 {
        self.xy_tolerances
            .get(class_index)
            .copied()
            .unwrap_or(DEFAULT_XY_TOLERANCE)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.search_distance.is_finite() || self.search_distance < 0.0 {
            return Err(EdgeMatchError::config(format!(
                "search distance must be a non-negative number, got {}",
                self.search_distance
            )));
        }
        if let Some(bad) = self
            .xy_tolerances
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0)
        {
            return Err(EdgeMatchError::config(format!(
                "XY tolerance must be a non-negative number, got {bad}"
            )));
        }
        if !self.coincidence_tolerance.is_finite() {
            return Err(EdgeMatchError::config(format!(
                "coincidence tolerance must be a number, got {}",
                self.coincidence_tolerance
            )));
        }
        for (name, value) in [
            (
                "minimum error connection line length",
                self.minimum_error_connection_line_length,
            ),
            (
                "maximum end point connection distance",
                self.maximum_end_point_connection_distance,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EdgeMatchError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
