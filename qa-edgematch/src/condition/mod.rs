//! Attribute conditions between two rows.
//!
//! - [`RowPairCondition`]: an SQL-like expression over two aliased rows
//!   (`LINE1.STATE = LINE2.STATE`), directed or symmetric
//! - [`EqualFieldValuesCondition`]: fields whose values must match, with
//!   per-field options

mod equal_fields;
mod lexer;
mod parser;

pub use equal_fields::{EqualFieldValuesCondition, UnequalField};

use crate::error::Result;
use crate::feature::{Feature, Value};
use parser::{Bindings, Expr, FieldRef};

/// Result of evaluating a [`RowPairCondition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    Fulfilled,
    Violated {
        /// Values of all referenced fields: `LINE1.STATE:'A';LINE2.STATE:'B'`.
        message: String,
        /// Uppercased names of the referenced fields.
        fields: Vec<String>,
    },
}

impl ConditionOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, ConditionOutcome::Fulfilled)
    }
}

/// A condition between two rows, each bound to an alias.
///
/// An empty condition is always fulfilled. A symmetric condition is
/// fulfilled if it holds for either assignment of the rows to the aliases.
#[derive(Debug, Clone)]
pub struct RowPairCondition {
    expr: Option<Expr>,
    aliases: [String; 2],
    fields: Vec<FieldRef>,
    directed: bool,
    case_sensitive: bool,
}

struct RowBindings<'a> {
    rows: [&'a Feature; 2],
}

impl Bindings for RowBindings<'_> {
    fn value(&self, slot: usize, field: &str) -> Value {
        self.rows[slot].value(field).clone()
    }
}

/// Row bindings with an extra unbound `_VALUE` column per row.
pub(crate) struct ValueBindings<'a> {
    pub rows: [&'a Feature; 2],
    pub values: [&'a Value; 2],
}

impl Bindings for ValueBindings<'_> {
    fn value(&self, slot: usize, field: &str) -> Value {
        if field == "_VALUE" {
            self.values[slot].clone()
        } else {
            self.rows[slot].value(field).clone()
        }
    }
}

impl RowPairCondition {
    /// Parse a condition. `None` or a blank string gives an empty condition.
    pub fn new(
        condition: Option<&str>,
        alias1: &str,
        alias2: &str,
        directed: bool,
        case_sensitive: bool,
    ) -> Result<Self> {
        let expr = match condition.map(str::trim).filter(|c| !c.is_empty()) {
            Some(source) => Some(parser::parse(source, [alias1, alias2])?),
            None => None,
        };
        let mut fields = Vec::new();
        if let Some(expr) = &expr {
            expr.fields(&mut fields);
        }
        Ok(Self {
            expr,
            aliases: [alias1.to_uppercase(), alias2.to_uppercase()],
            fields,
            directed,
            case_sensitive,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// `row1` is bound to the first alias, `row2` to the second.
    pub fn is_fulfilled(&self, row1: &Feature, row2: &Feature) -> bool {
        let direct = RowBindings { rows: [row1, row2] };
        let swapped = RowBindings { rows: [row2, row1] };
        self.evaluate_with(&direct, &swapped)
    }

    /// Evaluate and describe a violation.
    pub fn evaluate(&self, row1: &Feature, row2: &Feature) -> ConditionOutcome {
        let direct = RowBindings { rows: [row1, row2] };
        if self.evaluate_with(&direct, &RowBindings { rows: [row2, row1] }) {
            return ConditionOutcome::Fulfilled;
        }
        ConditionOutcome::Violated {
            message: self.message(&direct),
            fields: self.field_names(),
        }
    }

    pub(crate) fn evaluate_with(&self, direct: &dyn Bindings, swapped: &dyn Bindings) -> bool {
        let Some(expr) = &self.expr else {
            return true;
        };
        if expr.eval(direct, self.case_sensitive) == Some(true) {
            return true;
        }
        !self.directed && expr.eval(swapped, self.case_sensitive) == Some(true)
    }

    fn message(&self, bindings: &dyn Bindings) -> String {
        self.fields
            .iter()
            .map(|f| {
                format!(
                    "{}.{}:{}",
                    self.aliases[f.slot],
                    f.name,
                    bindings.value(f.slot, &f.name).display()
                )
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for field in &self.fields {
            if !names.contains(&field.name) {
                names.push(field.name.clone());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureKey;
    use crate::geometry::parse_wkt;

    fn row(id: u64, state: &str) -> Feature {
        Feature::new(
            FeatureKey::new(0, id),
            parse_wkt("LINESTRING (0 0, 1 0)").unwrap(),
        )
        .with_attribute("STATE", state)
    }

    #[test]
    fn test_empty_condition_is_fulfilled() {
        let condition = RowPairCondition::new(Some("  "), "LINE1", "LINE2", true, false).unwrap();
        assert!(condition.is_empty());
        assert!(condition.is_fulfilled(&row(1, "A"), &row(2, "B")));
    }

    #[test]
    fn test_directed_vs_symmetric() {
        let sql = "LINE1.STATE = 'A' AND LINE2.STATE = 'B'";
        let directed = RowPairCondition::new(Some(sql), "LINE1", "LINE2", true, false).unwrap();
        let symmetric = RowPairCondition::new(Some(sql), "LINE1", "LINE2", false, false).unwrap();
        let (a, b) = (row(1, "A"), row(2, "B"));

        assert!(directed.is_fulfilled(&a, &b));
        assert!(!directed.is_fulfilled(&b, &a));
        assert!(symmetric.is_fulfilled(&b, &a));
    }

    #[test]
    fn test_violation_message() {
        let condition = RowPairCondition::new(
            Some("LINE1.STATE = LINE2.STATE"),
            "LINE1",
            "LINE2",
            true,
            false,
        )
        .unwrap();
        match condition.evaluate(&row(1, "A"), &row(2, "B")) {
            ConditionOutcome::Violated { message, fields } => {
                assert_eq!(message, "LINE1.STATE:'A';LINE2.STATE:'B'");
                assert_eq!(fields, vec!["STATE".to_string()]);
            }
            ConditionOutcome::Fulfilled => panic!("expected violation"),
        }
    }
}
