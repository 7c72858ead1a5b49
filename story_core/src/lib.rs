//! # Story Core
//!
//! The runtime story model. This crate takes the definitions validated by
//! `story_schema`, composes entity types from registered traits, evaluates conditions
//! against the live entities and drives graph transitions requested by the LLM.
//!
//! ## Core Components
//!
//! - **registry**: Trait name to behavior table, built once and passed to the loader
//! - **traits**: The `described`, `graph_node` and `graph` components
//! - **entity**: Runtime entities and entity types
//! - **conditions**: Condition evaluation with dot-path resolution
//! - **project**: Loading, cross-entity resolution, template context and tools
//! - **tools**: Tool descriptors and call results for the LLM
//!
//! ## Design Philosophy
//!
//! - **Composition**: An entity is a core record plus one component per trait
//! - **Two Passes**: Entities are composed first, references between them resolved after
//! - **Lazy Conditions**: A broken condition fails when evaluated, not when loaded

pub mod conditions;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod project;
pub mod registry;
pub mod tools;
pub mod traits;

pub use conditions::{BoolExprEvaluator, PropertyValue};
pub use config::ProjectConfig;
pub use entity::{Entity, EntityRef, EntityType, RawProperty};
pub use error::*;
pub use project::Project;
pub use registry::{OptionsSchema, TraitBehavior, TraitEntry, TraitOptions, TraitRegistry};
pub use tools::{FunctionResult, StoryTool, ToolAction, ToolDefinition};
pub use traits::{Component, Described, Graph, GraphNode, GraphTraitOptions};
