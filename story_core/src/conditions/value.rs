use std::cmp::Ordering;
use std::fmt;

use story_schema::condition::{ComparisonOperator, Literal};

use crate::entity::Entity;
use crate::error::{OperandSide, OperandTypeError};

/// A resolved operand: a literal or the value found at the end of a dot path.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<'a> {
    Entity(&'a Entity),
    Entities(Vec<&'a Entity>),
    Strs(&'a [String]),
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn partial_cmp(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl<'a> PropertyValue<'a> {
    pub fn from_literal(literal: &'a Literal) -> Self {
        match literal {
            Literal::Str(s) => PropertyValue::Str(s),
            Literal::Int(i) => PropertyValue::Int(*i),
            Literal::Float(f) => PropertyValue::Float(*f),
            Literal::Bool(b) => PropertyValue::Bool(*b),
        }
    }

    /// Name of the value's kind, as used in type error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Entity(_) => "entity",
            PropertyValue::Entities(_) | PropertyValue::Strs(_) => "list",
            PropertyValue::Str(_) => "str",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Bool(_) => "bool",
        }
    }

    /// Entities are truthy, collections and strings when non-empty, numbers when non-zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Entity(_) => true,
            PropertyValue::Entities(entities) => !entities.is_empty(),
            PropertyValue::Strs(items) => !items.is_empty(),
            PropertyValue::Str(s) => !s.is_empty(),
            PropertyValue::Int(i) => *i != 0,
            PropertyValue::Float(f) => *f != 0.0,
            PropertyValue::Bool(b) => *b,
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            PropertyValue::Int(i) => Some(Number::Int(*i)),
            PropertyValue::Float(f) => Some(Number::Float(*f)),
            PropertyValue::Bool(b) => Some(Number::Int(i64::from(*b))),
            _ => None,
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            PropertyValue::Entity(_) | PropertyValue::Entities(_) | PropertyValue::Strs(_)
        )
    }

    /// Equality defined for every pair; values of unrelated kinds are unequal.
    pub fn equals(&self, other: &PropertyValue<'_>) -> bool {
        match (self, other) {
            (PropertyValue::Entity(a), PropertyValue::Entity(b)) => same_entity(a, b),
            (PropertyValue::Entities(a), PropertyValue::Entities(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| same_entity(a, b))
            }
            (PropertyValue::Strs(a), PropertyValue::Strs(b)) => a == b,
            (PropertyValue::Str(a), PropertyValue::Str(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(b) == Some(Ordering::Equal),
                _ => false,
            },
        }
    }

    /// Apply `op` with `self` on the left.
    pub fn compare(
        &self,
        op: ComparisonOperator,
        right: &PropertyValue<'_>,
    ) -> Result<bool, OperandTypeError> {
        match op {
            ComparisonOperator::Eq => Ok(self.equals(right)),
            ComparisonOperator::Ne => Ok(!self.equals(right)),
            ComparisonOperator::In => right.contains(self),
            ComparisonOperator::Lt
            | ComparisonOperator::Le
            | ComparisonOperator::Gt
            | ComparisonOperator::Ge => {
                let ordering = self.ordering(op, right)?;
                Ok(match (op, ordering) {
                    (_, None) => false,
                    (ComparisonOperator::Lt, Some(o)) => o == Ordering::Less,
                    (ComparisonOperator::Le, Some(o)) => o != Ordering::Greater,
                    (ComparisonOperator::Gt, Some(o)) => o == Ordering::Greater,
                    (_, Some(o)) => o != Ordering::Less,
                })
            }
        }
    }

    /// Order two scalars. Strings order with strings, numbers with numbers.
    fn ordering(
        &self,
        op: ComparisonOperator,
        right: &PropertyValue<'_>,
    ) -> Result<Option<Ordering>, OperandTypeError> {
        for (side, value) in [(OperandSide::Left, self), (OperandSide::Right, right)] {
            if value.is_compound() {
                return Err(OperandTypeError::UnsupportedOperand {
                    side,
                    operand: value.to_string(),
                    op,
                });
            }
        }

        match (self, right) {
            (PropertyValue::Str(a), PropertyValue::Str(b)) => Ok(Some(a.cmp(b))),
            _ => match (self.as_number(), right.as_number()) {
                (Some(a), Some(b)) => Ok(a.partial_cmp(b)),
                _ => Err(OperandTypeError::Incomparable {
                    op,
                    left: self.type_name(),
                    right: right.type_name(),
                }),
            },
        }
    }

    /// `needle in self`.
    fn contains(&self, needle: &PropertyValue<'_>) -> Result<bool, OperandTypeError> {
        match self {
            PropertyValue::Entities(entities) => Ok(entities
                .iter()
                .any(|entity| needle.equals(&PropertyValue::Entity(*entity)))),
            PropertyValue::Strs(items) => Ok(match needle {
                PropertyValue::Str(s) => items.iter().any(|item| item == s),
                _ => false,
            }),
            PropertyValue::Str(haystack) => match needle {
                PropertyValue::Str(s) => Ok(haystack.contains(s)),
                other => Err(OperandTypeError::StringContainment {
                    left: other.type_name(),
                }),
            },
            other => Err(OperandTypeError::NotACollection {
                operand: other.to_string(),
            }),
        }
    }
}

fn same_entity(a: &Entity, b: &Entity) -> bool {
    a.id() == b.id() && a.entity_type_id() == b.entity_type_id()
}

fn write_list<'i>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'i str>) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(item)?;
    }
    f.write_str("]")
}

impl fmt::Display for PropertyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Entity(entity) => f.write_str(entity.id()),
            PropertyValue::Entities(entities) => write_list(f, entities.iter().map(|e| e.id())),
            PropertyValue::Strs(items) => write_list(f, items.iter().map(String::as_str)),
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
        }
    }
}
