//! # Story Schema
//!
//! The "Story Bible" crate - everything an author writes down before a story is loaded.
//! This crate validates and normalizes project definitions and parses the condition
//! language. It knows nothing about runtime entities.
//!
//! ## Core Components
//!
//! - **ids**: Normalized `snake_case` / `PascalCase` identifiers and id derivation from names
//! - **condition**: The boolean condition language (AST, lexer and parser)
//! - **definition**: Project, entity type, entity, trait and function definitions
//!
//! ## Design Philosophy
//!
//! - **Fail Early**: Definition problems are collected and reported together at load time
//! - **Data Only**: Definitions are plain values; behavior is attached by the runtime crate
//! - **Open for Traits**: Entity fields are kept as an open bag and claimed by traits later

pub mod condition;
pub mod definition;
mod error;
pub mod ids;

pub use condition::{parse, BoolExpr, SyntaxError};
pub use definition::*;
pub use error::*;
