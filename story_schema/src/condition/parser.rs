//! Precedence-climbing parser.
//!
//! ```text
//! or_expr   := and_expr ("or" and_expr)*
//! and_expr  := not_expr ("and" not_expr)*
//! not_expr  := "not" not_expr | atom
//! atom      := "(" or_expr ")" | operand (comp_op operand)?
//! operand   := dot_path | literal
//! ```

use super::ast::{BoolExpr, Comparison, Literal, Operand};
use super::lexer::{tokenize, Token, TokenKind};
use super::SyntaxError;

/// Deepest nesting of `not`, parentheses and chained `and`/`or` a condition may use.
pub const MAX_NESTING: usize = 256;

/// Parse a complete condition.
///
/// The whole input must match; trailing tokens are an error.
pub fn parse(text: &str) -> Result<BoolExpr, SyntaxError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        input: text,
        tokens,
        pos: 0,
        nesting: 0,
    };
    let (expr, _) = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error_at(
            token.position,
            format!("Expected end of text, found {}", token.kind),
        )),
    }
}

/// A parsed subexpression and the height of its tree.
type Node = (BoolExpr, usize);

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it matches `kind`, returning its position.
    fn eat(&mut self, kind: &TokenKind) -> Option<usize> {
        let position = self
            .peek()
            .filter(|token| &token.kind == kind)
            .map(|token| token.position)?;
        self.pos += 1;
        Some(position)
    }

    fn error_at(&self, position: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, position, self.input)
    }

    fn end_of_input(&self, expected: &str) -> SyntaxError {
        self.error_at(
            self.input.chars().count(),
            format!("Expected {expected}, found end of text"),
        )
    }

    fn too_deep(&self, position: usize) -> SyntaxError {
        self.error_at(
            position,
            format!("Condition nesting exceeds {MAX_NESTING} levels"),
        )
    }

    /// Height of a node joining `left` and `right`, bounded by [`MAX_NESTING`].
    fn join_height(&self, left: usize, right: usize, position: usize) -> Result<usize, SyntaxError> {
        let height = left.max(right) + 1;
        if height > MAX_NESTING {
            return Err(self.too_deep(position));
        }
        Ok(height)
    }

    fn parse_or(&mut self) -> Result<Node, SyntaxError> {
        let (mut left, mut height) = self.parse_and()?;
        while let Some(position) = self.eat(&TokenKind::Or) {
            let (right, right_height) = self.parse_and()?;
            height = self.join_height(height, right_height, position)?;
            left = BoolExpr::or(left, right);
        }
        Ok((left, height))
    }

    fn parse_and(&mut self) -> Result<Node, SyntaxError> {
        let (mut left, mut height) = self.parse_not()?;
        while let Some(position) = self.eat(&TokenKind::And) {
            let (right, right_height) = self.parse_not()?;
            height = self.join_height(height, right_height, position)?;
            left = BoolExpr::and(left, right);
        }
        Ok((left, height))
    }

    fn parse_not(&mut self) -> Result<Node, SyntaxError> {
        let Some(position) = self.eat(&TokenKind::Not) else {
            return self.parse_atom();
        };
        let (inner, height) = self.nested(position, Self::parse_not)?;
        let height = self.join_height(height, 0, position)?;
        Ok((BoolExpr::not(inner), height))
    }

    /// Run `parse` one level deeper, failing at `position` past [`MAX_NESTING`].
    fn nested(
        &mut self,
        position: usize,
        parse: fn(&mut Self) -> Result<Node, SyntaxError>,
    ) -> Result<Node, SyntaxError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.too_deep(position));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn parse_atom(&mut self) -> Result<Node, SyntaxError> {
        if let Some(position) = self.eat(&TokenKind::LParen) {
            let node = self.nested(position, Self::parse_or)?;
            return match self.next() {
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => Ok(node),
                Some(token) => Err(self.error_at(
                    token.position,
                    format!("Expected ')', found {}", token.kind),
                )),
                None => Err(self.end_of_input("')'")),
            };
        }

        let left = self.parse_operand()?;
        let op = match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) => *op,
            _ => {
                let leaf = match left {
                    Operand::Path(path) => BoolExpr::Path(path),
                    Operand::Literal(lit) => BoolExpr::Literal(lit),
                };
                return Ok((leaf, 1));
            }
        };
        self.pos += 1;
        let right = self.parse_operand()?;
        Ok((BoolExpr::Comparison(Comparison { left, op, right }), 1))
    }

    fn parse_operand(&mut self) -> Result<Operand, SyntaxError> {
        let Some(token) = self.next() else {
            return Err(self.end_of_input("an expression"));
        };
        match token.kind {
            TokenKind::Path(path) => Ok(Operand::Path(path)),
            TokenKind::Str(s) => Ok(Operand::Literal(Literal::Str(s))),
            TokenKind::Int(i) => Ok(Operand::Literal(Literal::Int(i))),
            TokenKind::Float(x) => Ok(Operand::Literal(Literal::Float(x))),
            TokenKind::Bool(b) => Ok(Operand::Literal(Literal::Bool(b))),
            TokenKind::Ident(word) => Err(self.error_at(
                token.position,
                format!("Expected a dot path like '{word}.property', found identifier '{word}'"),
            )),
            other => Err(self.error_at(
                token.position,
                format!("Expected an expression, found {other}"),
            )),
        }
    }
}
