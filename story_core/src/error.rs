//! Error types of the story model.
//!
//! Lookup and evaluation failures are kept apart from operand type misuse so callers
//! can tell an author's broken reference from an ill-typed comparison.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use story_schema::condition::ComparisonOperator;
use story_schema::{SchemaError, ValidationErrors};

/// Trait registration and lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Trait name must be normalized snake_case: {0}")]
    InvalidName(String),

    #[error("Trait already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Trait not found: {0}")]
    TraitNotFound(String),
}

/// Access to state that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateAccessError {
    #[error("Entity type not found: {0}")]
    EntityTypeNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Trait options not found: {0}")]
    TraitNotFound(String),
}

/// A typed lookup: the state may be missing or exist with the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error(transparent)]
    NotFound(#[from] StateAccessError),

    #[error("Entity has unexpected type: '{entity_id}' ({entity_type_id}) lacks the '{expected}' trait")]
    UnexpectedType {
        entity_id: String,
        entity_type_id: String,
        expected: String,
    },
}

/// Failures resolving entities and properties while evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionEvalError {
    #[error("Invalid entity ID: {entity_id}")]
    InvalidEntityId {
        entity_id: String,
        #[source]
        source: StateAccessError,
    },

    #[error("Expected property {property} on entity {entity_id} to be an entity")]
    NotAnEntity { property: String, entity_id: String },

    #[error("Property '{property}' not found on entity '{entity_id}'")]
    PropertyNotFound { property: String, entity_id: String },

    #[error("Circular condition: {}", .chain.join(" -> "))]
    CircularCondition { chain: Vec<String> },

    #[error("Condition nesting exceeds {limit} levels at {condition}")]
    DepthExceeded { limit: usize, condition: String },
}

/// Which side of a comparison an operand is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSide {
    Left,
    Right,
}

impl fmt::Display for OperandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandSide::Left => f.write_str("Left"),
            OperandSide::Right => f.write_str("Right"),
        }
    }
}

/// Operators applied to values they are not defined for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandTypeError {
    #[error("{side} operand '{operand}' not supported for comparison '{op}'")]
    UnsupportedOperand {
        side: OperandSide,
        operand: String,
        op: ComparisonOperator,
    },

    #[error("'{op}' not supported between instances of '{left}' and '{right}'")]
    Incomparable {
        op: ComparisonOperator,
        left: &'static str,
        right: &'static str,
    },

    #[error("Right operand '{operand}' of 'in' requires a collection")]
    NotACollection { operand: String },

    #[error("'in <string>' requires string as left operand, not {left}")]
    StringContainment { left: &'static str },
}

/// Anything that can go wrong evaluating a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error(transparent)]
    Eval(#[from] ExpressionEvalError),

    #[error(transparent)]
    Type(#[from] OperandTypeError),
}

/// Dangling references found after all entities exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Entity {entity_id}: edge {edge_id} could not be resolved: {source}")]
    Edge {
        entity_id: String,
        edge_id: String,
        #[source]
        source: LookupError,
    },

    #[error("Graph {graph_id}: node type could not be resolved: {source}")]
    NodeType {
        graph_id: String,
        #[source]
        source: LookupError,
    },

    #[error("Graph {graph_id}: node {node_id} could not be resolved: {source}")]
    Node {
        graph_id: String,
        node_id: String,
        #[source]
        source: LookupError,
    },

    #[error("Graph {graph_id}: current_node {node_id} not found")]
    CurrentNodeNotFound { graph_id: String, node_id: String },

    #[error("Property {property} not in argument for function {function}")]
    UnknownFunctionProperty { function: String, property: String },

    #[error("Duplicate entity id '{entity_id}' in entity types {first} and {second}")]
    DuplicateEntityId {
        entity_id: String,
        first: String,
        second: String,
    },
}

/// A transition to a node that is not an edge of the current node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{target} is not a valid transition for node {current}")]
pub struct InvalidTransitionError {
    pub current: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Invalid(#[from] InvalidTransitionError),
}

/// Errors from loading a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Composition(ValidationErrors),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl From<ValidationErrors> for ProjectError {
    fn from(errors: ValidationErrors) -> Self {
        ProjectError::Schema(SchemaError::Validation(errors))
    }
}
