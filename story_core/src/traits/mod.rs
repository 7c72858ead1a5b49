//! Built-in traits.
//!
//! Each trait is a typed component attached to an entity. The component claims its
//! fields from the entity definition, contributes to the template context and exposes
//! properties to conditions.

pub mod described;
pub mod graph;

use serde_json::{Map, Value};

pub use described::Described;
pub use graph::{Graph, GraphNode, GraphTraitOptions};

use story_schema::ValidationErrors;

use crate::entity::{Entity, RawProperty};
use crate::error::ConditionError;
use crate::project::Project;
use crate::registry::{OptionsSchema, TraitBehavior};

/// The traits every registry starts with.
pub(crate) fn builtin_traits() -> [(&'static str, TraitBehavior, Option<OptionsSchema>); 3] {
    [
        ("described", TraitBehavior::Described, None),
        ("graph_node", TraitBehavior::GraphNode, None),
        ("graph", TraitBehavior::Graph, Some(graph::validate_graph_options)),
    ]
}

/// Trait state carried by an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Described(Described),
    GraphNode(GraphNode),
    Graph(Graph),
}

impl Component {
    pub fn behavior(&self) -> TraitBehavior {
        match self {
            Component::Described(_) => TraitBehavior::Described,
            Component::GraphNode(_) => TraitBehavior::GraphNode,
            Component::Graph(_) => TraitBehavior::Graph,
        }
    }

    /// Build the component for `behavior`, removing its fields from `fields`.
    pub(crate) fn take_fields(
        behavior: TraitBehavior,
        fields: &mut Map<String, Value>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        match behavior {
            TraitBehavior::Described => {
                Described::take_fields(fields, path, errors).map(Component::Described)
            }
            TraitBehavior::GraphNode => {
                GraphNode::take_fields(fields, path, errors).map(Component::GraphNode)
            }
            TraitBehavior::Graph => Graph::take_fields(fields, path, errors).map(Component::Graph),
        }
    }

    pub(crate) fn property(&self, name: &str) -> Option<RawProperty<'_>> {
        match self {
            Component::Described(described) => described.property(name),
            Component::GraphNode(node) => node.property(name),
            Component::Graph(graph) => graph.property(name),
        }
    }

    pub(crate) fn extend_template_context(
        &self,
        entity: &Entity,
        project: &Project,
        context: &mut Map<String, Value>,
    ) -> Result<(), ConditionError> {
        match self {
            Component::Described(described) => {
                described.extend_template_context(entity, project, context)
            }
            Component::GraphNode(node) => {
                node.extend_template_context(context);
                Ok(())
            }
            Component::Graph(graph) => graph.extend_template_context(project, context),
        }
    }
}

/// Read a list of normalized `snake_case` ids from `fields[key]`.
///
/// A missing key yields `default`, or a "Field required" error when `default` is `None`.
pub(crate) fn take_id_list(
    fields: &mut Map<String, Value>,
    key: &str,
    path: &str,
    default: Option<Vec<String>>,
    errors: &mut ValidationErrors,
) -> Option<Vec<String>> {
    let field_path = format!("{path}.{key}");
    let items = match fields.remove(key) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(field_path, "Input should be a valid list");
            return None;
        }
        None if default.is_some() => return default,
        None => {
            errors.push(field_path, "Field required");
            return None;
        }
    };

    let mut ids = Vec::with_capacity(items.len());
    let mut valid = true;
    for (i, item) in items.into_iter().enumerate() {
        match take_id(item) {
            Ok(id) => ids.push(id),
            Err(message) => {
                errors.push(format!("{field_path}[{i}]"), message);
                valid = false;
            }
        }
    }
    valid.then_some(ids)
}

/// Read one normalized `snake_case` id from `fields[key]`.
pub(crate) fn take_required_id(
    fields: &mut Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let field_path = format!("{path}.{key}");
    match fields.remove(key) {
        Some(value) => take_id(value)
            .map_err(|message| errors.push(field_path, message))
            .ok(),
        None => {
            errors.push(field_path, "Field required");
            None
        }
    }
}

fn take_id(value: Value) -> Result<String, String> {
    match value {
        Value::String(id) => story_schema::ids::validate_snake_case(&id)
            .map(|()| id)
            .map_err(|err| err.to_string()),
        _ => Err("Input should be a valid string".to_string()),
    }
}

/// Read a required string from `fields[key]`.
pub(crate) fn take_required_string(
    fields: &mut Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let field_path = format!("{path}.{key}");
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.push(field_path, "Input should be a valid string");
            None
        }
        None => {
            errors.push(field_path, "Field required");
            None
        }
    }
}
