//! Lexer for row-pair condition expressions.

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, opt};
use winnow::error::ContextError;
use winnow::stream::Location;
use winnow::token::{any, one_of, take_till, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use crate::error::{EdgeMatchError, Result};

/// Input type for the lexer - tracks position for error messages.
type Input<'a> = LocatingSlice<&'a str>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    /// Identifier or keyword, case preserved.
    Ident(String),
    Text(String),
    Integer(i64),
    Float(f64),
    Op(CompareOp),
    Dot,
    Comma,
    LParen,
    RParen,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Tokenize a condition. Fails on the first character that starts no token.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut input = LocatingSlice::new(source);

    loop {
        let _: ModalResult<&str, ContextError> = multispace0.parse_next(&mut input);

        let start = input.current_token_start();
        if input.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                start,
            });
            break;
        }

        match next_token(&mut input) {
            Ok(kind) => tokens.push(Token { kind, start }),
            Err(_) => {
                let bad = source[start..].chars().next().unwrap_or('?');
                let message = if bad == '\'' {
                    format!("unterminated string literal at position {start} in '{source}'")
                } else {
                    format!("unexpected character '{bad}' at position {start} in '{source}'")
                };
                return Err(EdgeMatchError::condition(message));
            }
        }
    }

    Ok(tokens)
}

fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        parse_operator,
        parse_number,
        parse_string,
        parse_ident,
        parse_punctuation,
    ))
    .parse_next(input)
}

fn parse_operator(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        "<>".value(CompareOp::Ne),
        "!=".value(CompareOp::Ne),
        "<=".value(CompareOp::Le),
        ">=".value(CompareOp::Ge),
        "=".value(CompareOp::Eq),
        "<".value(CompareOp::Lt),
        ">".value(CompareOp::Gt),
    ))
    .map(TokenKind::Op)
    .parse_next(input)
}

fn parse_number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let text: &str = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)?;

    if text.contains('.') {
        Ok(TokenKind::Float(text.parse().unwrap_or(f64::NAN)))
    } else {
        match text.parse::<i64>() {
            Ok(value) => Ok(TokenKind::Integer(value)),
            Err(_) => Ok(TokenKind::Float(text.parse().unwrap_or(f64::NAN))),
        }
    }
}

/// Single-quoted string; a doubled quote stands for one quote.
fn parse_string(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '\''.parse_next(input)?;
    let mut value = String::new();
    loop {
        let chunk: &str = take_till(0.., '\'').parse_next(input)?;
        value.push_str(chunk);
        '\''.parse_next(input)?;
        if input.starts_with('\'') {
            any.parse_next(input)?;
            value.push('\'');
        } else {
            break;
        }
    }
    Ok(TokenKind::Text(value))
}

fn parse_ident(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .map(|s: &str| TokenKind::Ident(s.to_string()))
        .parse_next(input)
}

fn parse_punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    any.verify_map(|c| match c {
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        _ => None,
    })
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_qualified_comparison() {
        assert_eq!(
            kinds("LINE1.STATE <> 'A'"),
            vec![
                TokenKind::Ident("LINE1".into()),
                TokenKind::Dot,
                TokenKind::Ident("STATE".into()),
                TokenKind::Op(CompareOp::Ne),
                TokenKind::Text("A".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_and_escaped_quotes() {
        assert_eq!(
            kinds("-3 2.5 'it''s'"),
            vec![
                TokenKind::Integer(-3),
                TokenKind::Float(2.5),
                TokenKind::Text("it's".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("A.X = 'abc").unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("A.X # 1").unwrap_err();
        assert!(err.to_string().contains("'#'"));
    }
}
