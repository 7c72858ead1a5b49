//! Author-facing definitions.
//!
//! Definitions are read from plain data (`serde_json::Value`) so that YAML, TOML and
//! JSON sources share one validation path. Problems are collected with their location
//! and returned together.

mod entity;
mod expression;
mod project;
mod trait_def;
mod validation;

pub use entity::{EntityDefinition, EntityTypeDefinition};
pub use expression::BoolExprDefinition;
pub use project::ProjectDefinition;
pub use trait_def::{FunctionDefinition, TraitCatalog, TraitDefinition};
pub use validation::{ValidationError, ValidationErrors};
