use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::many0,
    sequence::{pair, preceded, terminated},
};

use crate::LispError;
use crate::ast::Expr;

/// Deepest paren nesting `validate` accepts
pub const MAX_DEPTH: usize = 1024;

/// Lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    /// Any run of characters that is neither whitespace nor a paren, lower-cased
    Atom(String),
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && c != '(' && c != ')'
}

/// Any Unicode whitespace, the complement of what atoms and parens accept
fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while(char::is_whitespace)(input)
}

/// Parse one token, skipping leading whitespace
fn parse_token(input: &str) -> IResult<&str, Token> {
    preceded(
        whitespace,
        alt((
            value(Token::Open, char('(')),
            value(Token::Close, char(')')),
            map(take_while1(is_atom_char), |s: &str| {
                Token::Atom(s.to_lowercase())
            }),
        )),
    )(input)
}

/// Split source text into tokens. Never fails.
///
/// Every character is whitespace, a paren or part of an atom, so the whole
/// input is always consumed.
pub fn tokenize(input: &str) -> Vec<Token> {
    match all_consuming(terminated(many0(parse_token), whitespace))(input) {
        Ok((_, tokens)) => tokens,
        Err(err) => unreachable!("tokenizer stopped before end of input: {err}"),
    }
}

/// Check paren balance and that the stream holds exactly one top-level item
///
/// An item is counted each time a token is examined at depth 0, before that
/// token's own effect on the depth. Nesting past [`MAX_DEPTH`] is rejected
/// here so the recursive tree builder and evaluator stay within the stack.
pub fn validate(tokens: &[Token]) -> Result<(), LispError> {
    let mut depth = 0usize;
    let mut top_level = 0usize;

    for token in tokens {
        if depth == 0 {
            top_level += 1;
        }
        match token {
            Token::Open => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(LispError::TooDeep { limit: MAX_DEPTH });
                }
            }
            Token::Close => {
                if depth == 0 {
                    return Err(LispError::UnbalancedClose);
                }
                depth -= 1;
            }
            Token::Atom(_) => {}
        }
    }

    if depth > 0 {
        return Err(LispError::UnbalancedOpen);
    }
    if top_level != 1 {
        return Err(LispError::MultipleTopLevelForms { found: top_level });
    }
    Ok(())
}

/// Optional sign followed by decimal digits
fn integer_literal(input: &str) -> IResult<&str, &str> {
    all_consuming(recognize(pair(opt(one_of("+-")), digit1)))(input)
}

/// Classify an atom token: integer first, then `t` / `nil`, else symbol
fn parse_atom(atom: &str) -> Result<Expr, LispError> {
    if integer_literal(atom).is_ok() {
        return atom
            .parse::<i64>()
            .map(Expr::Integer)
            .map_err(|_| LispError::IntegerOverflow(atom.to_string()));
    }
    Ok(match atom {
        "t" => Expr::T,
        "nil" => Expr::Nil,
        _ => Expr::Symbol(atom.to_string()),
    })
}

/// Build one expression from the front of a validated stream
///
/// Returns the expression and the unconsumed tokens.
fn build_tree(tokens: &[Token]) -> Result<(Expr, &[Token]), LispError> {
    match tokens {
        [Token::Open, rest @ ..] => {
            let mut items = Vec::new();
            let mut rest = rest;
            while !matches!(rest.first(), Some(Token::Close)) {
                let (item, remaining) = build_tree(rest)?;
                items.push(item);
                rest = remaining;
            }
            Ok((Expr::list(items), &rest[1..]))
        }
        [Token::Atom(atom), rest @ ..] => Ok((parse_atom(atom)?, rest)),
        [Token::Close, ..] => unreachable!("validated stream has no stray close paren"),
        [] => unreachable!("validated stream ended inside a form"),
    }
}

/// Parse exactly one expression from source text
pub fn parse(input: &str) -> Result<Expr, LispError> {
    let tokens = tokenize(input);
    tracing::trace!(tokens = tokens.len(), "tokenized input");
    validate(&tokens)?;

    let (expr, rest) = build_tree(&tokens)?;
    assert!(
        rest.is_empty(),
        "tree builder left {} tokens after a validated form",
        rest.len()
    );
    Ok(expr)
}
