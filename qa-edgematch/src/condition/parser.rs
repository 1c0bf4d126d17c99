//! Recursive-descent parser and evaluator for condition expressions.
//!
//! Grammar (keywords are case-insensitive):
//!
//! ```text
//! expr       := and ( OR and )*
//! and        := unary ( AND unary )*
//! unary      := NOT unary | '(' expr ')' | predicate
//! predicate  := operand ( op operand
//!                       | IS [NOT] NULL
//!                       | [NOT] IN '(' operand ( ',' operand )* ')' )
//! operand    := ALIAS '.' FIELD | number | 'text' | NULL
//! ```
//!
//! Evaluation uses three-valued logic: comparisons involving null are
//! unknown, and only a definite `true` fulfils a condition.

use super::lexer::{tokenize, CompareOp, Token, TokenKind};
use crate::error::{EdgeMatchError, Result};
use crate::feature::Value;
use std::cmp::Ordering;

/// Reference to a field of one of the two rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FieldRef {
    /// 0 for the first alias, 1 for the second.
    pub slot: usize,
    /// Uppercased field name.
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Operand {
    Field(FieldRef),
    Literal(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        lhs: Operand,
        op: CompareOp,
        rhs: Operand,
    },
    IsNull {
        operand: Operand,
        negated: bool,
    },
    In {
        operand: Operand,
        list: Vec<Operand>,
        negated: bool,
    },
}

/// Field values of the two rows an expression is evaluated on.
pub(crate) trait Bindings {
    fn value(&self, slot: usize, field: &str) -> Value;
}

impl Expr {
    pub(crate) fn eval(&self, bindings: &dyn Bindings, case_sensitive: bool) -> Option<bool> {
        match self {
            Expr::Or(items) => {
                let mut unknown = false;
                for item in items {
                    match item.eval(bindings, case_sensitive) {
                        Some(true) => return Some(true),
                        Some(false) => {}
                        None => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
            Expr::And(items) => {
                let mut unknown = false;
                for item in items {
                    match item.eval(bindings, case_sensitive) {
                        Some(false) => return Some(false),
                        Some(true) => {}
                        None => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(true)
                }
            }
            Expr::Not(inner) => inner.eval(bindings, case_sensitive).map(|b| !b),
            Expr::Compare { lhs, op, rhs } => {
                let ordering = compare(
                    &resolve(lhs, bindings),
                    &resolve(rhs, bindings),
                    case_sensitive,
                )?;
                Some(match op {
                    CompareOp::Eq => ordering == Ordering::Equal,
                    CompareOp::Ne => ordering != Ordering::Equal,
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Ge => ordering != Ordering::Less,
                })
            }
            Expr::IsNull { operand, negated } => {
                Some(resolve(operand, bindings).is_null() != *negated)
            }
            Expr::In {
                operand,
                list,
                negated,
            } => {
                let value = resolve(operand, bindings);
                if value.is_null() {
                    return None;
                }
                let mut unknown = false;
                for item in list {
                    match compare(&value, &resolve(item, bindings), case_sensitive) {
                        Some(Ordering::Equal) => return Some(!*negated),
                        Some(_) => {}
                        None => unknown = true,
                    }
                }
                if unknown {
                    None
                } else {
                    Some(*negated)
                }
            }
        }
    }

    /// Referenced fields in order of first appearance.
    pub(crate) fn fields(&self, out: &mut Vec<FieldRef>) {
        match self {
            Expr::Or(items) | Expr::And(items) => {
                for item in items {
                    item.fields(out);
                }
            }
            Expr::Not(inner) => inner.fields(out),
            Expr::Compare { lhs, rhs, .. } => {
                push_field(out, lhs);
                push_field(out, rhs);
            }
            Expr::IsNull { operand, .. } => push_field(out, operand),
            Expr::In { operand, list, .. } => {
                push_field(out, operand);
                for item in list {
                    push_field(out, item);
                }
            }
        }
    }
}

fn push_field(out: &mut Vec<FieldRef>, operand: &Operand) {
    if let Operand::Field(field) = operand {
        if !out.contains(field) {
            out.push(field.clone());
        }
    }
}

fn resolve(operand: &Operand, bindings: &dyn Bindings) -> Value {
    match operand {
        Operand::Field(field) => bindings.value(field.slot, &field.name),
        Operand::Literal(value) => value.clone(),
    }
}

/// Compare two values. `None` if either is null or they are incomparable.
pub(crate) fn compare(a: &Value, b: &Value, case_sensitive: bool) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Text(x), Value::Text(y)) => Some(if case_sensitive {
            x.cmp(y)
        } else {
            x.to_lowercase().cmp(&y.to_lowercase())
        }),
        (Value::Text(t), other) => {
            let n = t.trim().parse::<f64>().ok()?;
            n.partial_cmp(&other.as_f64()?)
        }
        (other, Value::Text(t)) => {
            let n = t.trim().parse::<f64>().ok()?;
            other.as_f64()?.partial_cmp(&n)
        }
        (x, y) => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

/// Parse a condition with the two row aliases it may reference.
pub(crate) fn parse(source: &str, aliases: [&str; 2]) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = ExprParser {
        source,
        tokens,
        pos: 0,
        aliases,
    };
    let expr = parser.parse_or()?;
    if !parser.current().kind.eq(&TokenKind::Eof) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct ExprParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    aliases: [&'a str; 2],
}

impl ExprParser<'_> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        token
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if &self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn error(&self, message: &str) -> EdgeMatchError {
        EdgeMatchError::condition(format!(
            "{message} at position {} in '{}'",
            self.current().start,
            self.source
        ))
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_and()?];
        while self.eat_keyword("OR") {
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut items = vec![self.parse_unary()?];
        while self.eat_keyword("AND") {
            items.push(self.parse_unary()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        })
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.current().kind == TokenKind::LParen {
            self.advance();
            let inner = self.parse_or()?;
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(inner);
        }
        self.parse_predicate()
    }

    fn parse_predicate(&mut self) -> Result<Expr> {
        let operand = self.parse_operand()?;

        if let TokenKind::Op(op) = self.current().kind {
            self.advance();
            let rhs = self.parse_operand()?;
            return Ok(Expr::Compare {
                lhs: operand,
                op,
                rhs,
            });
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            if !self.eat_keyword("NULL") {
                return Err(self.error("expected NULL"));
            }
            return Ok(Expr::IsNull { operand, negated });
        }

        let negated = self.eat_keyword("NOT");
        if self.eat_keyword("IN") {
            self.expect(&TokenKind::LParen, "'('")?;
            let mut list = vec![self.parse_operand()?];
            while self.current().kind == TokenKind::Comma {
                self.advance();
                list.push(self.parse_operand()?);
            }
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Expr::In {
                operand,
                list,
                negated,
            });
        }

        Err(self.error("expected comparison operator, IS or IN"))
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        let token = self.advance();
        match token.kind {
            TokenKind::Integer(i) => Ok(Operand::Literal(Value::Int(i))),
            TokenKind::Float(f) => Ok(Operand::Literal(Value::Float(f))),
            TokenKind::Text(s) => Ok(Operand::Literal(Value::Text(s))),
            TokenKind::Ident(name) if name.eq_ignore_ascii_case("NULL") => {
                Ok(Operand::Literal(Value::Null))
            }
            TokenKind::Ident(alias) => {
                if self.current().kind != TokenKind::Dot {
                    return Err(EdgeMatchError::condition(format!(
                        "field '{alias}' must be qualified with {} or {} in '{}'",
                        self.aliases[0], self.aliases[1], self.source
                    )));
                }
                self.advance();
                let TokenKind::Ident(field) = self.advance().kind else {
                    return Err(self.error("expected field name"));
                };
                let slot = self
                    .aliases
                    .iter()
                    .position(|a| a.eq_ignore_ascii_case(&alias))
                    .ok_or_else(|| {
                        EdgeMatchError::condition(format!(
                            "unknown alias '{alias}' in '{}', expected {} or {}",
                            self.source, self.aliases[0], self.aliases[1]
                        ))
                    })?;
                Ok(Operand::Field(FieldRef {
                    slot,
                    name: field.to_uppercase(),
                }))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error("expected field or literal"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rows(Vec<(usize, &'static str, Value)>);

    impl Bindings for Rows {
        fn value(&self, slot: usize, field: &str) -> Value {
            self.0
                .iter()
                .find(|(s, f, _)| *s == slot && *f == field)
                .map(|(_, _, v)| v.clone())
                .unwrap_or(Value::Null)
        }
    }

    fn eval(condition: &str, rows: &Rows) -> Option<bool> {
        parse(condition, ["LINE1", "LINE2"])
            .unwrap()
            .eval(rows, false)
    }

    #[test]
    fn test_and_or_precedence() {
        let rows = Rows(vec![
            (0, "STATE", Value::from("A")),
            (1, "STATE", Value::from("B")),
        ]);
        assert_eq!(
            eval(
                "LINE1.STATE = 'A' OR LINE1.STATE = 'X' AND LINE2.STATE = 'X'",
                &rows
            ),
            Some(true)
        );
        assert_eq!(
            eval(
                "(LINE1.STATE = 'A' OR LINE1.STATE = 'X') AND LINE2.STATE = 'X'",
                &rows
            ),
            Some(false)
        );
    }

    #[test]
    fn test_case_insensitive_text() {
        let rows = Rows(vec![(0, "NAME", Value::from("Rhein")), (1, "NAME", Value::from("RHEIN"))]);
        assert_eq!(eval("line1.name = LINE2.NAME", &rows), Some(true));
        let expr = parse("LINE1.NAME = LINE2.NAME", ["LINE1", "LINE2"]).unwrap();
        assert_eq!(expr.eval(&rows, true), Some(false));
    }

    #[test]
    fn test_null_handling() {
        let rows = Rows(vec![(0, "KIND", Value::Int(1))]);
        assert_eq!(eval("LINE1.KIND = LINE2.KIND", &rows), None);
        assert_eq!(eval("LINE2.KIND IS NULL", &rows), Some(true));
        assert_eq!(eval("LINE1.KIND IS NOT NULL", &rows), Some(true));
        assert_eq!(eval("NOT LINE1.KIND = LINE2.KIND", &rows), None);
    }

    #[test]
    fn test_in_list_and_numbers() {
        let rows = Rows(vec![(0, "KIND", Value::Int(3)), (1, "WIDTH", Value::Float(2.5))]);
        assert_eq!(eval("LINE1.KIND IN (1, 2, 3)", &rows), Some(true));
        assert_eq!(eval("LINE1.KIND NOT IN (1, 2)", &rows), Some(true));
        assert_eq!(eval("LINE2.WIDTH >= 2.5 AND LINE1.KIND < '10'", &rows), Some(true));
    }

    #[test]
    fn test_fields_in_order() {
        let expr = parse(
            "LINE1.STATE = LINE2.STATE AND LINE1.KIND <> 1 AND LINE1.STATE <> 'X'",
            ["LINE1", "LINE2"],
        )
        .unwrap();
        let mut fields = Vec::new();
        expr.fields(&mut fields);
        let names: Vec<_> = fields.iter().map(|f| (f.slot, f.name.as_str())).collect();
        assert_eq!(names, vec![(0, "STATE"), (1, "STATE"), (0, "KIND")]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("STATE = 'A'", ["LINE1", "LINE2"]).is_err());
        assert!(parse("AREA.STATE = 'A'", ["LINE1", "LINE2"]).is_err());
        assert!(parse("LINE1.STATE = 'A' LINE2", ["LINE1", "LINE2"]).is_err());
        assert!(parse("(LINE1.STATE = 'A'", ["LINE1", "LINE2"]).is_err());
        assert!(parse("LINE1.STATE IS 'A'", ["LINE1", "LINE2"]).is_err());
    }
}
