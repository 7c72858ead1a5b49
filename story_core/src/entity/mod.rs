//! Runtime entities.
//!
//! An entity is a fixed core record (`id`, `entity_type_id`, `functions`) plus one
//! component per trait of its entity type. Entities refer to each other through
//! [`EntityRef`] ids resolved against the owning [`Project`].

mod entity_type;
mod property;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use story_schema::{EntityDefinition, FunctionDefinition, ValidationErrors};

pub use entity_type::EntityType;
pub use property::RawProperty;

use crate::error::{ConditionError, LookupError};
use crate::project::Project;
use crate::registry::TraitBehavior;
use crate::tools::StoryTool;
use crate::traits::graph::TRANSITION_TARGET;
use crate::traits::{Component, Described, Graph, GraphNode};

/// Address of an entity within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type_id: String,
    pub entity_id: String,
}

impl EntityRef {
    pub fn new(entity_type_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type_id: entity_type_id.into(),
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type_id, self.entity_id)
    }
}

/// One runtime story object.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: String,
    entity_type_id: String,
    functions: Vec<FunctionDefinition>,
    components: Vec<Component>,
}

impl Entity {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity_type_id(&self) -> &str {
        &self.entity_type_id
    }

    /// Functions declared on this entity. Entity type functions are not included.
    pub fn functions(&self) -> &[FunctionDefinition] {
        &self.functions
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type_id.as_str(), self.id.as_str())
    }

    pub fn has_behavior(&self, behavior: TraitBehavior) -> bool {
        self.components.iter().any(|c| c.behavior() == behavior)
    }

    pub fn described(&self) -> Option<&Described> {
        self.components.iter().find_map(|c| match c {
            Component::Described(described) => Some(described),
            _ => None,
        })
    }

    pub fn graph_node(&self) -> Option<&GraphNode> {
        self.components.iter().find_map(|c| match c {
            Component::GraphNode(node) => Some(node),
            _ => None,
        })
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.components.iter().find_map(|c| match c {
            Component::Graph(graph) => Some(graph),
            _ => None,
        })
    }

    pub(crate) fn graph_node_mut(&mut self) -> Option<&mut GraphNode> {
        self.components.iter_mut().find_map(|c| match c {
            Component::GraphNode(node) => Some(node),
            _ => None,
        })
    }

    pub(crate) fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.components.iter_mut().find_map(|c| match c {
            Component::Graph(graph) => Some(graph),
            _ => None,
        })
    }

    /// This entity, if it has `behavior`; an unexpected type error otherwise.
    pub fn require(&self, behavior: TraitBehavior) -> Result<&Self, LookupError> {
        if self.has_behavior(behavior) {
            Ok(self)
        } else {
            Err(self.unexpected_type(behavior))
        }
    }

    pub(crate) fn unexpected_type(&self, expected: TraitBehavior) -> LookupError {
        LookupError::UnexpectedType {
            entity_id: self.id.clone(),
            entity_type_id: self.entity_type_id.clone(),
            expected: expected.to_string(),
        }
    }

    /// Look up a property by name: the core fields first, then each component in
    /// trait order.
    pub fn property(&self, name: &str) -> Option<RawProperty<'_>> {
        match name {
            "id" => Some(RawProperty::Str(&self.id)),
            "entity_type_id" => Some(RawProperty::Str(&self.entity_type_id)),
            _ => self.components.iter().find_map(|c| c.property(name)),
        }
    }

    /// The mapping handed to prompt templates.
    pub fn template_context(&self, project: &Project) -> Result<Map<String, Value>, ConditionError> {
        let mut context = Map::new();
        context.insert("id".to_string(), Value::from(self.id.as_str()));
        context.insert(
            "entity_type_id".to_string(),
            Value::from(self.entity_type_id.as_str()),
        );
        for component in &self.components {
            component.extend_template_context(self, project, &mut context)?;
        }
        Ok(context)
    }

    /// Tools this entity currently offers.
    ///
    /// A graph entity offers a transition tool for each `transition` function of its
    /// entity type and of its own, unless the current node has no edges.
    pub fn tools(&self, project: &Project) -> Vec<StoryTool> {
        let Some(graph) = self.graph() else {
            return Vec::new();
        };
        let type_functions = project
            .get_entity_type(&self.entity_type_id)
            .map(EntityType::functions)
            .unwrap_or_default();

        type_functions
            .iter()
            .chain(&self.functions)
            .filter(|function| function.target == TRANSITION_TARGET)
            .filter_map(|function| graph.transition_tool(self, function, project))
            .collect()
    }

    /// Build an entity from its definition, letting each trait claim its fields.
    ///
    /// Fields no trait claims are reported as one error under `path`.
    pub(crate) fn from_definition(
        definition: &EntityDefinition,
        entity_type_id: &str,
        traits: &IndexMap<String, TraitBehavior>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let mut fields = definition.extra.clone();
        let mut components = Vec::with_capacity(traits.len());
        let mut valid = true;
        for behavior in traits.values() {
            match Component::take_fields(*behavior, &mut fields, path, errors) {
                Some(component) => components.push(component),
                None => valid = false,
            }
        }

        if !fields.is_empty() {
            let trait_names: Vec<&str> = traits.keys().map(String::as_str).collect();
            let unknown: Vec<&str> = fields.keys().map(String::as_str).collect();
            errors.push(
                path,
                format!(
                    "Unknown properties for entity '{}' (traits: {}): {}",
                    definition.id,
                    trait_names.join(", "),
                    unknown.join(", ")
                ),
            );
            valid = false;
        }

        valid.then(|| Self {
            id: definition.id.clone(),
            entity_type_id: entity_type_id.to_string(),
            functions: definition.functions.clone(),
            components,
        })
    }
}
