//! Trait and function definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validation::kind_of;

/// Anything that can tell whether a trait name is known.
///
/// The runtime trait registry implements this; plain name lists do too, which keeps
/// definition loading testable without a registry.
pub trait TraitCatalog {
    fn contains_trait(&self, name: &str) -> bool;
}

impl<T: AsRef<str>> TraitCatalog for Vec<T> {
    fn contains_trait(&self, name: &str) -> bool {
        self.iter().any(|known| known.as_ref() == name)
    }
}

impl<T: AsRef<str>, const N: usize> TraitCatalog for [T; N] {
    fn contains_trait(&self, name: &str) -> bool {
        self.iter().any(|known| known.as_ref() == name)
    }
}

/// A trait applied to an entity type, with its options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitDefinition {
    /// The trait's registered name.
    pub name: String,
    /// Free-form options, validated later by the trait's options schema.
    pub options: Map<String, Value>,
}

impl TraitDefinition {
    /// Create a trait definition without options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
        }
    }

    /// Add an option (builder pattern).
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Normalize one of the three author forms:
    ///
    /// 1. shorthand: `"graph_node"`
    /// 2. inline: `{ "name": "graph", "node_type_id": "Location" }`
    /// 3. explicit: `{ "name": "graph", "options": { "node_type_id": "Location" } }`
    ///
    /// A non-mapping `options` value becomes `{ "value": <value> }`. Inline keys are merged
    /// into the options and win over explicit ones.
    pub fn from_value(data: &Value) -> Result<Self, String> {
        let mut payload = match data {
            Value::String(name) => return Ok(Self::new(name.clone())),
            Value::Object(map) => map.clone(),
            other => {
                return Err(format!(
                    "Expected a string or mapping for a trait, got {}",
                    kind_of(other)
                ))
            }
        };

        let name = match payload.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => return Err("Trait definition mapping must contain a 'name' key".to_string()),
        };

        let mut options = match payload.remove("options") {
            None => Map::new(),
            Some(Value::Object(options)) => options,
            Some(value) => Map::from_iter([("value".to_string(), value)]),
        };
        options.extend(payload);

        Ok(Self { name, options })
    }
}

/// An LLM-callable function exposed by an entity or entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDefinition {
    /// The behavior the function invokes, e.g. `transition`.
    pub target: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Maps function parameters to their descriptions.
    #[serde(default)]
    pub properties: Option<IndexMap<String, String>>,
}

impl FunctionDefinition {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            name: None,
            description: None,
            properties: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), description.into());
        self
    }

    /// Read a function definition from plain data.
    pub fn from_value(data: &Value) -> Result<Self, String> {
        serde_json::from_value(data.clone()).map_err(|err| err.to_string())
    }
}
