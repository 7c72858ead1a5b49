//! Condition syntax tree.
//!
//! All nodes are immutable values. `Display` renders a node back to source text that
//! parses to an equal tree.

use std::fmt;

/// A `snake_case` identifier segment of a dot path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnakeCase(pub String);

impl SnakeCase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnakeCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    /// Generic truthiness: empty strings and zero are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Str(s) => !s.is_empty(),
            Literal::Int(i) => *i != 0,
            Literal::Float(f) => *f != 0.0,
            Literal::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) if s.contains('\'') => write!(f, "\"{s}\""),
            Literal::Str(s) => write!(f, "'{s}'"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// `entity_id.property[.property[...]]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotPath {
    pub entity_id: SnakeCase,
    /// Never empty.
    pub property_chain: Vec<SnakeCase>,
}

impl DotPath {
    /// Build a path from plain strings.
    ///
    /// Does not validate the segments; use [`crate::parse`] for untrusted input.
    pub fn new<I, S>(entity_id: impl Into<String>, property_chain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_id: SnakeCase::new(entity_id),
            property_chain: property_chain.into_iter().map(SnakeCase::new).collect(),
        }
    }
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity_id)?;
        for prop in &self.property_chain {
            write!(f, ".{prop}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::In => "in",
        }
    }

    /// `<`, `<=`, `>` and `>=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::Lt
                | ComparisonOperator::Le
                | ComparisonOperator::Gt
                | ComparisonOperator::Ge
        )
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Path(DotPath),
    Literal(Literal),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Path(path) => write!(f, "{path}"),
            Operand::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl From<DotPath> for Operand {
    fn from(path: DotPath) -> Self {
        Operand::Path(path)
    }
}

impl From<Literal> for Operand {
    fn from(lit: Literal) -> Self {
        Operand::Literal(lit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Operand,
    pub op: ComparisonOperator,
    pub right: Operand,
}

/// A parsed boolean condition.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    Literal(Literal),
    Path(DotPath),
    Comparison(Comparison),
    Not(Box<BoolExpr>),
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
}

impl BoolExpr {
    pub fn literal(lit: Literal) -> Self {
        BoolExpr::Literal(lit)
    }

    pub fn path(path: DotPath) -> Self {
        BoolExpr::Path(path)
    }

    pub fn comparison(
        left: impl Into<Operand>,
        op: ComparisonOperator,
        right: impl Into<Operand>,
    ) -> Self {
        BoolExpr::Comparison(Comparison {
            left: left.into(),
            op,
            right: right.into(),
        })
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: BoolExpr) -> Self {
        BoolExpr::Not(Box::new(expr))
    }

    pub fn and(left: BoolExpr, right: BoolExpr) -> Self {
        BoolExpr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: BoolExpr, right: BoolExpr) -> Self {
        BoolExpr::Or(Box::new(left), Box::new(right))
    }

    /// Binding strength used when rendering; higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            BoolExpr::Or(..) => 1,
            BoolExpr::And(..) => 2,
            BoolExpr::Not(_) => 3,
            _ => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min_precedence: u8) -> fmt::Result {
        if self.precedence() < min_precedence {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl From<DotPath> for BoolExpr {
    fn from(path: DotPath) -> Self {
        BoolExpr::Path(path)
    }
}

impl From<Literal> for BoolExpr {
    fn from(lit: Literal) -> Self {
        BoolExpr::Literal(lit)
    }
}

impl From<Comparison> for BoolExpr {
    fn from(comparison: Comparison) -> Self {
        BoolExpr::Comparison(comparison)
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::Literal(lit) => write!(f, "{lit}"),
            BoolExpr::Path(path) => write!(f, "{path}"),
            BoolExpr::Comparison(c) => write!(f, "{} {} {}", c.left, c.op, c.right),
            BoolExpr::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(f, 3)
            }
            BoolExpr::And(left, right) => {
                left.fmt_operand(f, 2)?;
                f.write_str(" and ")?;
                // Left-associative: a right-hand `and` needs parentheses to round-trip.
                right.fmt_operand(f, 3)
            }
            BoolExpr::Or(left, right) => {
                left.fmt_operand(f, 1)?;
                f.write_str(" or ")?;
                right.fmt_operand(f, 2)
            }
        }
    }
}
