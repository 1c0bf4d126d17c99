//! Evaluation of point contacts.
//!
//! A contact on one side is compared with the contacts of every candidate
//! across the border:
//!
//! 1. contacts within the coincidence tolerance are matches; only their
//!    attribute rules are checked
//! 2. for line ends, a contact lying on the interior of a candidate line
//!    that is itself on its border may count as a match
//! 3. otherwise the nearest contact of each candidate is a *candidate that
//!    exists* but does not connect
//! 4. without any candidate the contact has no match
//!
//! Pair findings go through the constraint error cache, so a pair seen from
//! both sides is reported once.

use super::{EdgeMatchCheck, NO_CANDIDATE};
use crate::config::Side;
use crate::constraint::{ConstraintError, ErrorShape, PairMember};
use crate::contact::{lies_on_border, same_side_connections, PointConnection};
use crate::error::Result;
use crate::feature::Feature;
use crate::geometry::shape_lines;
use crate::issue::{Issue, IssueKind, IssueReporter};
use crate::linear;
use crate::strategy::EdgeMatchStrategy;
use geo_types::{Coord, Geometry, LineString, MultiPoint, Point};
use std::sync::Arc;

const NO_CANDIDATE_CONNECTED_ON_SAME_SIDE: &str = "No potential match found within search \
     distance. The end point is connected to features on the same side.";
const BORDERS_NOT_COINCIDENT: &str = "Borders are not coincident.";

/// Distances up to this count as zero for a zero coincidence tolerance.
const ZERO_DISTANCE: f64 = 1e-9;

/// Nearest contact of a candidate that does not coincide.
struct UnconnectedContact {
    neighbor: Arc<PointConnection>,
    distance: f64,
}

#[derive(Default)]
struct ContactNeighbors {
    coincident: Vec<Arc<PointConnection>>,
    /// Candidates whose interior the contact lies on.
    on_neighbor_border: Vec<Arc<PointConnection>>,
    unconnected: Vec<UnconnectedContact>,
}

impl<S: EdgeMatchStrategy> EdgeMatchCheck<'_, S> {
    /// Evaluate the contacts of a row not evaluated yet.
    pub(super) fn execute_contacts(
        &mut self,
        side: Side,
        feature: &Arc<Feature>,
        reporter: &mut dyn IssueReporter,
    ) -> Result<usize> {
        let tolerance = self.config.xy_tolerance(feature.key.class_index);
        let connections = self.points.resolve(
            feature,
            &self.sides[side.index()].border,
            tolerance,
            &self.strategy,
            self.source,
        )?;

        let mut errors = 0;
        for connection in &connections {
            if !self.evaluated.insert(connection) {
                continue;
            }
            if self.strategy.contacts_are_line_ends()
                && self.config.ignore_end_points_of_bordering_lines
                && connection.end_segment_follows_border
            {
                continue;
            }
            errors += self.evaluate_contact(side, connection, tolerance, reporter)?;
        }
        Ok(errors)
    }

    fn evaluate_contact(
        &mut self,
        side: Side,
        connection: &Arc<PointConnection>,
        tolerance: f64,
        reporter: &mut dyn IssueReporter,
    ) -> Result<usize> {
        let line_ends = self.strategy.contacts_are_line_ends();
        let same_side = if line_ends {
            same_side_connections(
                connection,
                &self.sides[side.index()].classes,
                self.matcher.match_condition(),
                tolerance,
                self.source,
            )?
        } else {
            0
        };
        let found = self.contact_neighbors(side, connection)?;

        if !found.coincident.is_empty() {
            let connected = 1 + same_side + found.coincident.len();
            let ignore_rules = line_ends
                && self.config.ignore_attribute_constraints_if_three_or_more_connected
                && connected >= 3;
            if !ignore_rules {
                for neighbor in &found.coincident {
                    self.queue_contact_match_errors(side, connection, neighbor);
                }
            }
            return Ok(0);
        }
        if !found.on_neighbor_border.is_empty() {
            for neighbor in &found.on_neighbor_border {
                self.queue_contact_match_errors(side, connection, neighbor);
            }
            return Ok(0);
        }
        if found.unconnected.is_empty() {
            return Ok(self.report_no_contact_candidate(connection, same_side, reporter));
        }
        for unconnected in &found.unconnected {
            self.queue_candidate_errors(side, connection, unconnected)?;
        }
        Ok(0)
    }

    fn contact_neighbors(
        &mut self,
        side: Side,
        connection: &PointConnection,
    ) -> Result<ContactNeighbors> {
        let other = side.opposite().index();
        let line_ends = self.strategy.contacts_are_line_ends();
        let search_distance = self.matcher.search_distance();
        let candidates = self.matcher.point_candidates(
            &connection.feature,
            connection.at,
            side,
            &self.sides[other].classes,
            self.source,
        )?;

        let mut found = ContactNeighbors::default();
        for candidate in candidates {
            let neighbor_class = candidate.feature.key.class_index;
            let neighbor_tolerance = self.config.xy_tolerance(neighbor_class);
            let neighbors = self.points.resolve(
                &candidate.feature,
                &self.sides[other].border,
                neighbor_tolerance,
                &self.strategy,
                self.source,
            )?;
            let coincidence = self.coincidence_tolerance(connection.class_index(), neighbor_class);

            let mut nearest: Option<UnconnectedContact> = None;
            for neighbor in neighbors {
                let distance = point_distance(connection.at, neighbor.at);
                if distance <= coincidence || (coincidence == 0.0 && distance <= ZERO_DISTANCE) {
                    found.coincident.push(neighbor);
                    continue;
                }
                if distance > search_distance
                    && (!line_ends
                        || self
                            .config
                            .ignore_neighbor_lines_with_border_connection_outside_search_distance)
                {
                    continue;
                }
                if line_ends
                    && candidate.distance < neighbor_tolerance
                    && self
                        .config
                        .allow_end_points_connecting_to_interior_of_valid_neighbor_line
                    && lies_on_border(
                        &candidate.feature,
                        connection.at,
                        &self.sides[other].border,
                        neighbor_tolerance,
                        self.source,
                    )?
                {
                    found.on_neighbor_border.push(neighbor);
                    continue;
                }
                if nearest.as_ref().is_none_or(|n| distance < n.distance) {
                    nearest = Some(UnconnectedContact { neighbor, distance });
                }
            }
            found.unconnected.extend(nearest);
        }
        Ok(found)
    }

    /// Configured coincidence tolerance, or the larger XY tolerance of the
    /// two classes when negative.
    fn coincidence_tolerance(&self, class1: usize, class2: usize) -> f64 {
        if self.config.coincidence_tolerance >= 0.0 {
            self.config.coincidence_tolerance
        } else {
            self.config
                .xy_tolerance(class1)
                .max(self.config.xy_tolerance(class2))
        }
    }

    fn queue_contact_match_errors(
        &mut self,
        side: Side,
        connection: &Arc<PointConnection>,
        neighbor: &Arc<PointConnection>,
    ) {
        let (c1, c2) = side.order(connection, neighbor);
        for violation in self.rules.violations(&c1.feature, &c2.feature) {
            self.constraint_errors.add(ConstraintError {
                member1: PairMember::from(&**c1),
                member2: PairMember::from(&**c2),
                shape: ErrorShape::Fixed(Geometry::Point(Point::from(connection.at))),
                code: self.codes.get(IssueKind::ConstraintsNotFulfilled).clone(),
                description: violation.description,
                affected_components: violation.affected_components,
                text_value: Some(violation.text_value),
                from_side1: side == Side::One,
            });
        }
    }

    fn queue_candidate_errors(
        &mut self,
        side: Side,
        connection: &Arc<PointConnection>,
        unconnected: &UnconnectedContact,
    ) -> Result<()> {
        let neighbor = &unconnected.neighbor;
        let own = &self.sides[side.index()];
        let other = &self.sides[side.opposite().index()];
        let borders_coincident = lies_on_border(
            &neighbor.feature,
            connection.at,
            &other.border,
            self.config.xy_tolerance(neighbor.class_index()),
            self.source,
        )? && lies_on_border(
            &connection.feature,
            neighbor.at,
            &own.border,
            self.config.xy_tolerance(connection.class_index()),
            self.source,
        )?;
        if !borders_coincident
            && self
                .config
                .allow_disjoint_candidate_feature_if_borders_are_not_coincident
        {
            return Ok(());
        }

        let (c1, c2) = side.order(connection, neighbor);
        let violations = self.rules.violations(&c1.feature, &c2.feature);
        if violations.is_empty()
            && self
                .config
                .allow_disjoint_candidate_feature_if_attribute_constraints_are_fulfilled
        {
            return Ok(());
        }

        let line_ends = self.strategy.contacts_are_line_ends();
        let max_distance = self.config.maximum_end_point_connection_distance;
        let within = !line_ends || max_distance <= 0.0 || unconnected.distance <= max_distance;
        let target = if within {
            neighbor.at
        } else {
            shape_lines(&neighbor.feature.shape)
                .and_then(|lines| linear::closest_point(&lines, connection.at))
                .unwrap_or(neighbor.at)
        };
        let length = point_distance(connection.at, target);
        let geometry =
            if !line_ends || length < self.config.minimum_error_connection_line_length {
                Geometry::MultiPoint(MultiPoint::new(vec![
                    Point::from(connection.at),
                    Point::from(target),
                ]))
            } else {
                Geometry::LineString(LineString::from(vec![connection.at, target]))
            };

        let noun = if line_ends { "end point" } else { "point" };
        let mut base = if within {
            format!(
                "Match candidate exists within search distance, but its {noun} is not \
                 coincident (connection length {length:.3})."
            )
        } else {
            format!(
                "Match candidate exists within search distance, but its nearest {noun} is \
                 {:.3} away, beyond the maximum connection distance (connection length \
                 {length:.3}).",
                unconnected.distance
            )
        };
        if !borders_coincident {
            base = format!("{base} {BORDERS_NOT_COINCIDENT}");
        }

        let kind = IssueKind::candidate_exists(borders_coincident, violations.is_empty(), within);
        let error = |description, affected_components, text_value| ConstraintError {
            member1: PairMember::from(&**c1),
            member2: PairMember::from(&**c2),
            shape: ErrorShape::Fixed(geometry.clone()),
            code: self.codes.get(kind).clone(),
            description,
            affected_components,
            text_value,
            from_side1: side == Side::One,
        };
        let errors: Vec<ConstraintError> = if violations.is_empty() {
            vec![error(base, None, None)]
        } else {
            violations
                .into_iter()
                .map(|v| {
                    error(
                        format!("{base} {}.", v.description),
                        v.affected_components,
                        Some(v.text_value),
                    )
                })
                .collect()
        };
        for e in errors {
            self.constraint_errors.add(e);
        }
        Ok(())
    }

    fn report_no_contact_candidate(
        &self,
        connection: &PointConnection,
        same_side: usize,
        reporter: &mut dyn IssueReporter,
    ) -> usize {
        if self.config.allow_no_feature_within_search_distance {
            return 0;
        }
        let (kind, description) = if same_side == 0 {
            (IssueKind::NoCandidate, NO_CANDIDATE)
        } else if self
            .config
            .allow_no_feature_within_search_distance_if_connected_on_same_side
        {
            return 0;
        } else {
            (
                IssueKind::NoCandidateConnectedOnSameSide,
                NO_CANDIDATE_CONNECTED_ON_SAME_SIDE,
            )
        };
        reporter.report(Issue {
            description: description.to_string(),
            involved: vec![connection.key.feature],
            geometry: Geometry::Point(Point::from(connection.at)),
            code: self.codes.get(kind).clone(),
            affected_components: None,
            values: Vec::new(),
        })
    }
}

fn point_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
