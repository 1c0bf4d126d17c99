//! Fields that must carry equal values on matched features.
//!
//! Field list syntax: names separated by `,` or `;`. `NAME:#` declares `#`
//! as the multi-value separator of `NAME`; such values are compared as
//! sets of trimmed, non-empty tokens.
//!
//! Field options, one per string, `FIELD:option`:
//! - `ignore=<regex>`: remove all matches from text values before comparing
//! - `allowedDifferenceCondition=<expr>`: a difference is accepted when the
//!   expression holds; aliases `G1`/`G2`, the compared values are bound to
//!   `G1._VALUE` and `G2._VALUE`

use super::{RowPairCondition, ValueBindings};
use crate::error::{EdgeMatchError, Result};
use crate::feature::{Feature, Value};
use regex::Regex;
use std::collections::BTreeSet;

const IGNORE_PREFIX: &str = "ignore=";
const ALLOWED_DIFFERENCE_PREFIX: &str = "allowedDifferenceCondition=";

/// A field whose values differ between two rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnequalField {
    /// Uppercased field name.
    pub field: String,
    /// `FIELD:'a','b'`, values in ascending order.
    pub message: String,
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: String,
    separator: Option<String>,
    ignore: Vec<Regex>,
    allowed_difference: Option<RowPairCondition>,
}

/// Set of fields compared for equality.
#[derive(Debug, Clone, Default)]
pub struct EqualFieldValuesCondition {
    rules: Vec<FieldRule>,
    case_sensitive: bool,
}

impl EqualFieldValuesCondition {
    /// Parse field definitions and options.
    pub fn new(fields: &[String], options: &[String], case_sensitive: bool) -> Result<Self> {
        let mut rules: Vec<FieldRule> = Vec::new();

        for definition in fields
            .iter()
            .flat_map(|f| f.split([',', ';']))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let (name, separator) = match definition.split_once(':') {
                Some((name, sep)) => (name.trim(), Some(sep.to_string()).filter(|s| !s.is_empty())),
                None => (definition, None),
            };
            let name = name.to_uppercase();
            if rules.iter().any(|r| r.name == name) {
                return Err(EdgeMatchError::config(format!("duplicate field name: {name}")));
            }
            rules.push(FieldRule {
                name,
                separator,
                ignore: Vec::new(),
                allowed_difference: None,
            });
        }

        for option in options.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
            let (field, value) = option
                .split_once(':')
                .map(|(f, v)| (f.trim().to_uppercase(), v.trim()))
                .filter(|(f, v)| !f.is_empty() && !v.is_empty())
                .ok_or_else(|| invalid_option(option))?;

            let rule = rules
                .iter_mut()
                .find(|r| r.name == field)
                .ok_or_else(|| {
                    EdgeMatchError::config(format!(
                        "options specified for field name that is not checked for equal values: {field}"
                    ))
                })?;

            if let Some(pattern) = value.strip_prefix(IGNORE_PREFIX) {
                let regex = Regex::new(pattern).map_err(|e| {
                    EdgeMatchError::config(format!("invalid regular expression '{pattern}': {e}"))
                })?;
                rule.ignore.push(regex);
            } else if value
                .get(..ALLOWED_DIFFERENCE_PREFIX.len())
                .is_some_and(|p| p.eq_ignore_ascii_case(ALLOWED_DIFFERENCE_PREFIX))
            {
                if rule.allowed_difference.is_some() {
                    return Err(EdgeMatchError::config(
                        "only one 'allowedDifferenceCondition' is supported per field",
                    ));
                }
                let condition = &value[ALLOWED_DIFFERENCE_PREFIX.len()..];
                rule.allowed_difference = Some(RowPairCondition::new(
                    Some(condition),
                    "G1",
                    "G2",
                    false,
                    case_sensitive,
                )?);
            } else {
                return Err(invalid_option(option));
            }
        }

        Ok(Self {
            rules,
            case_sensitive,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fields with differing values, in definition order.
    pub fn non_equal_fields(&self, row1: &Feature, row2: &Feature) -> Vec<UnequalField> {
        self.rules
            .iter()
            .filter(|rule| !self.are_equal(rule, row1, row2))
            .map(|rule| {
                let (v1, v2) = (row1.value(&rule.name).display(), row2.value(&rule.name).display());
                let (lo, hi) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };
                UnequalField {
                    field: rule.name.clone(),
                    message: format!("{}:{},{}", rule.name, lo, hi),
                }
            })
            .collect()
    }

    fn are_equal(&self, rule: &FieldRule, row1: &Feature, row2: &Feature) -> bool {
        let (value1, value2) = (row1.value(&rule.name), row2.value(&rule.name));
        if value1.is_null() && value2.is_null() {
            return true;
        }

        if let Some(separator) = &rule.separator {
            if !is_number(value1) && !is_number(value2) {
                let set1 = self.token_set(rule, value1, separator);
                let set2 = self.token_set(rule, value2, separator);
                if set1 == set2 {
                    return true;
                }
                return rule.allowed_difference.as_ref().is_some_and(|cond| {
                    all_differences_allowed(cond, row1, &set1, row2, &set2)
                });
            }
        }

        let t1 = transform(rule, value1);
        let t2 = transform(rule, value2);
        if values_equal(&t1, &t2, self.case_sensitive) {
            return true;
        }
        rule.allowed_difference
            .as_ref()
            .is_some_and(|cond| allowed(cond, row1, &t1, row2, &t2))
    }

    fn token_set(&self, rule: &FieldRule, value: &Value, separator: &str) -> BTreeSet<String> {
        let Some(text) = value.as_text() else {
            return BTreeSet::new();
        };
        text.split(separator)
            .map(|token| match transform(rule, &Value::from(token.trim())) {
                Value::Text(t) => t,
                other => other.display(),
            })
            .filter(|t| !t.is_empty())
            .map(|t| {
                if self.case_sensitive {
                    t
                } else {
                    t.to_lowercase()
                }
            })
            .collect()
    }
}

fn invalid_option(option: &str) -> EdgeMatchError {
    EdgeMatchError::config(format!(
        "invalid field option: '{option}', expected <field>:<option>"
    ))
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

fn transform(rule: &FieldRule, value: &Value) -> Value {
    match value {
        Value::Text(text) if !rule.ignore.is_empty() => {
            let mut out = text.clone();
            for regex in &rule.ignore {
                out = regex.replace_all(&out, "").into_owned();
            }
            Value::Text(out)
        }
        other => other.clone(),
    }
}

fn values_equal(a: &Value, b: &Value, case_sensitive: bool) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Text(x), Value::Text(y)) if !case_sensitive => x.to_lowercase() == y.to_lowercase(),
        _ => super::parser::compare(a, b, case_sensitive) == Some(std::cmp::Ordering::Equal),
    }
}

fn allowed(
    cond: &RowPairCondition,
    row1: &Feature,
    v1: &Value,
    row2: &Feature,
    v2: &Value,
) -> bool {
    let direct = ValueBindings {
        rows: [row1, row2],
        values: [v1, v2],
    };
    let swapped = ValueBindings {
        rows: [row2, row1],
        values: [v2, v1],
    };
    cond.evaluate_with(&direct, &swapped)
}

/// Every value of one set must be an allowed difference to every value of
/// the other; an empty set counts as a single null value.
fn all_differences_allowed(
    cond: &RowPairCondition,
    row1: &Feature,
    set1: &BTreeSet<String>,
    row2: &Feature,
    set2: &BTreeSet<String>,
) -> bool {
    let as_values = |set: &BTreeSet<String>| -> Vec<Value> {
        if set.is_empty() {
            vec![Value::Null]
        } else {
            set.iter().map(|s| Value::Text(s.clone())).collect()
        }
    };
    let (values1, values2) = (as_values(set1), as_values(set2));
    values1
        .iter()
        .all(|v1| values2.iter().all(|v2| allowed(cond, row1, v1, row2, v2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::FeatureKey;
    use crate::geometry::parse_wkt;

    fn row(id: u64, attributes: &[(&str, Value)]) -> Feature {
        let mut feature = Feature::new(
            FeatureKey::new(0, id),
            parse_wkt("LINESTRING (0 0, 1 0)").unwrap(),
        );
        for (field, value) in attributes {
            feature.set_attribute(field, value.clone());
        }
        feature
    }

    fn condition(fields: &str, options: &[&str]) -> EqualFieldValuesCondition {
        EqualFieldValuesCondition::new(
            &[fields.to_string()],
            &options.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_unequal_message_sorted() {
        let cond = condition("FLD_TEXT; KIND", &[]);
        let a = row(1, &[("FLD_TEXT", Value::from("Y")), ("KIND", Value::Int(1))]);
        let b = row(2, &[("FLD_TEXT", Value::from("X")), ("KIND", Value::Int(1))]);
        assert_eq!(
            cond.non_equal_fields(&a, &b),
            vec![UnequalField {
                field: "FLD_TEXT".into(),
                message: "FLD_TEXT:'X','Y'".into()
            }]
        );
    }

    #[test]
    fn test_case_and_nulls() {
        let cond = condition("NAME,CODE", &[]);
        let a = row(1, &[("NAME", Value::from("Aare"))]);
        let b = row(2, &[("NAME", Value::from("AARE"))]);
        assert!(cond.non_equal_fields(&a, &b).is_empty());

        let c = row(3, &[("NAME", Value::from("Aare")), ("CODE", Value::Int(4))]);
        let unequal = cond.non_equal_fields(&a, &c);
        assert_eq!(unequal.len(), 1);
        assert_eq!(unequal[0].message, "CODE:4,<null>");
    }

    #[test]
    fn test_multi_value_sets() {
        let cond = condition("ROUTES:#", &[]);
        let a = row(1, &[("ROUTES", Value::from("A1#B2"))]);
        let b = row(2, &[("ROUTES", Value::from(" b2 # a1 #"))]);
        assert!(cond.non_equal_fields(&a, &b).is_empty());

        let c = row(3, &[("ROUTES", Value::from("A1"))]);
        assert_eq!(cond.non_equal_fields(&a, &c).len(), 1);
    }

    #[test]
    fn test_ignore_option() {
        let cond = condition("NAME", &["NAME:ignore=[() ]"]);
        let a = row(1, &[("NAME", Value::from("Main (North)"))]);
        let b = row(2, &[("NAME", Value::from("MainNorth"))]);
        assert!(cond.non_equal_fields(&a, &b).is_empty());
    }

    #[test]
    fn test_allowed_difference_condition() {
        let cond = condition(
            "KIND",
            &["KIND:allowedDifferenceCondition=G1._VALUE = 1 AND G2._VALUE = 2"],
        );
        let a = row(1, &[("KIND", Value::Int(1))]);
        let b = row(2, &[("KIND", Value::Int(2))]);
        let c = row(3, &[("KIND", Value::Int(3))]);
        assert!(cond.non_equal_fields(&a, &b).is_empty());
        assert!(cond.non_equal_fields(&b, &a).is_empty());
        assert_eq!(cond.non_equal_fields(&a, &c).len(), 1);
    }

    #[test]
    fn test_invalid_options() {
        let fields = ["NAME".to_string()];
        for option in ["NAME", "OTHER:ignore=x", "NAME:frobnicate", "NAME:ignore=("] {
            assert!(
                EqualFieldValuesCondition::new(&fields, &[option.to_string()], false).is_err(),
                "{option}"
            );
        }
        assert!(EqualFieldValuesCondition::new(&["A,a".to_string()], &[], false).is_err());
    }
}
