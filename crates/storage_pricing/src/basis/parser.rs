//! Recursive-descent parser for basis expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! basis   := term ('+' term)*
//! term    := factor ('*' factor)*
//! factor  := primary ('**' integer)?
//! primary := number | identifier | '(' term ('+' term)* ')'
//! ```
//!
//! Each top-level `+` separates two basis functions; a `+` inside
//! parentheses builds a single summed function.

use super::error::BasisError;
use super::expr::BasisExpr;
use super::lexer::{Token, TokenKind};

/// Largest exponent accepted after `**`.
const MAX_POWER: f64 = 64.0;

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    resolve: &'a dyn Fn(&str, usize) -> Result<usize, BasisError>,
    source_len: usize,
}

impl Parser<'_> {
    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn current_position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.source_len, |t| t.position)
    }

    fn error(&self, message: impl Into<String>) -> BasisError {
        BasisError::Parse {
            message: message.into(),
            position: self.current_position(),
        }
    }
}

/// Parse tokens into one expression per top-level term.
///
/// `resolve` maps a variable name and its position to a value index.
pub(crate) fn parse(
    tokens: Vec<Token>,
    source_len: usize,
    resolve: &dyn Fn(&str, usize) -> Result<usize, BasisError>,
) -> Result<Vec<BasisExpr>, BasisError> {
    if tokens.is_empty() {
        return Err(BasisError::Empty);
    }
    let mut p = Parser {
        tokens,
        pos: 0,
        resolve,
        source_len,
    };
    let mut terms = vec![parse_term(&mut p)?];
    while let Some(TokenKind::Plus) = p.peek_kind() {
        p.advance();
        terms.push(parse_term(&mut p)?);
    }
    if p.pos < p.tokens.len() {
        return Err(p.error(format!("unexpected {:?}", p.tokens[p.pos].kind)));
    }
    Ok(terms)
}

fn parse_term(p: &mut Parser) -> Result<BasisExpr, BasisError> {
    let mut left = parse_factor(p)?;
    while let Some(TokenKind::Star) = p.peek_kind() {
        p.advance();
        let right = parse_factor(p)?;
        left = BasisExpr::Multiply(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_factor(p: &mut Parser) -> Result<BasisExpr, BasisError> {
    let base = parse_primary(p)?;
    if let Some(TokenKind::StarStar) = p.peek_kind() {
        p.advance();
        let position = p.current_position();
        return match p.advance() {
            Some(Token {
                kind: TokenKind::Number(n),
                ..
            }) if n.fract() == 0.0 && (0.0..=MAX_POWER).contains(&n) => {
                Ok(BasisExpr::Power(Box::new(base), n as i32))
            }
            Some(tok) => Err(BasisError::Parse {
                message: format!("exponent must be an integer in [0, {}], got {:?}", MAX_POWER, tok.kind),
                position,
            }),
            None => Err(BasisError::Parse {
                message: "expected exponent, got end of input".to_string(),
                position,
            }),
        };
    }
    Ok(base)
}

fn parse_primary(p: &mut Parser) -> Result<BasisExpr, BasisError> {
    let position = p.current_position();
    match p.advance() {
        Some(Token {
            kind: TokenKind::Number(n),
            ..
        }) => Ok(BasisExpr::Constant(n)),
        Some(Token {
            kind: TokenKind::Ident(name),
            position,
        }) => {
            let index = (p.resolve)(&name, position)?;
            Ok(BasisExpr::Variable { index, name })
        }
        Some(Token {
            kind: TokenKind::LParen,
            ..
        }) => {
            let mut inner = parse_term(p)?;
            while let Some(TokenKind::Plus) = p.peek_kind() {
                p.advance();
                let right = parse_term(p)?;
                inner = BasisExpr::Add(Box::new(inner), Box::new(right));
            }
            match p.advance() {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => Ok(inner),
                _ => Err(BasisError::Parse {
                    message: "expected ')'".to_string(),
                    position,
                }),
            }
        }
        Some(tok) => Err(BasisError::Parse {
            message: format!("expected number, variable or '(', got {:?}", tok.kind),
            position,
        }),
        None => Err(BasisError::Parse {
            message: "expected number, variable or '(', got end of input".to_string(),
            position,
        }),
    }
}
