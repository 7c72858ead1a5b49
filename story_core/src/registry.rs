//! Trait registry.
//!
//! Maps trait names to the behavior they add and, optionally, a schema for the
//! trait's options. The registry is an explicit value built once at startup and
//! handed to the loader.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use story_schema::ids::is_normalized_snake_case;
use story_schema::TraitCatalog;

use crate::error::RegistryError;
use crate::traits::{self, GraphTraitOptions};

/// The behavior a trait contributes to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraitBehavior {
    /// LLM-facing `name`, `description` and `enabled` condition.
    Described,
    /// A state in a graph, with outgoing edges.
    GraphNode,
    /// A graph over nodes of another entity type, with a current node.
    Graph,
}

impl TraitBehavior {
    /// Name the behavior is registered under by default.
    pub fn default_name(&self) -> &'static str {
        match self {
            TraitBehavior::Described => "described",
            TraitBehavior::GraphNode => "graph_node",
            TraitBehavior::Graph => "graph",
        }
    }
}

impl fmt::Display for TraitBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Validated trait options, keyed by trait name on the entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum TraitOptions {
    Graph(GraphTraitOptions),
}

impl TraitOptions {
    pub fn as_graph(&self) -> Option<&GraphTraitOptions> {
        match self {
            TraitOptions::Graph(options) => Some(options),
        }
    }
}

/// Validates raw trait options. The error is a user-facing message.
pub type OptionsSchema = fn(&Map<String, Value>) -> Result<TraitOptions, String>;

/// A registered trait.
#[derive(Clone, Copy)]
pub struct TraitEntry {
    pub behavior: TraitBehavior,
    pub options_schema: Option<OptionsSchema>,
}

impl fmt::Debug for TraitEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitEntry")
            .field("behavior", &self.behavior)
            .field("has_options_schema", &self.options_schema.is_some())
            .finish()
    }
}

/// Name-to-trait table. Append-only.
#[derive(Debug, Clone)]
pub struct TraitRegistry {
    entries: IndexMap<String, TraitEntry>,
}

impl TraitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Create a registry with `described`, `graph_node` and `graph` registered.
    pub fn with_builtin_traits() -> Self {
        let mut registry = Self::new();
        for (name, behavior, options_schema) in traits::builtin_traits() {
            registry.entries.insert(
                name.to_string(),
                TraitEntry {
                    behavior,
                    options_schema,
                },
            );
        }
        registry
    }

    /// Register a trait under `name`.
    ///
    /// Fails if `name` is not normalized `snake_case` or is already taken.
    pub fn register(
        &mut self,
        name: &str,
        behavior: TraitBehavior,
        options_schema: Option<OptionsSchema>,
    ) -> Result<(), RegistryError> {
        if !is_normalized_snake_case(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.entries.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        debug!(trait_name = name, %behavior, "Registered trait");
        self.entries.insert(
            name.to_string(),
            TraitEntry {
                behavior,
                options_schema,
            },
        );
        Ok(())
    }

    /// Look up a trait by name.
    pub fn get(&self, name: &str) -> Result<&TraitEntry, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::TraitNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TraitRegistry {
    fn default() -> Self {
        Self::with_builtin_traits()
    }
}

impl TraitCatalog for TraitRegistry {
    fn contains_trait(&self, name: &str) -> bool {
        self.contains(name)
    }
}
