//! The `graph` and `graph_node` traits.
//!
//! A graph entity points at a set of node entities of another entity type and tracks a
//! current node. Nodes carry outgoing edges to sibling nodes. Transitions follow an edge
//! of the current node; there is no history.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use story_schema::ids::validate_pascal_case;
use story_schema::{FunctionDefinition, ValidationErrors};

use super::{take_id_list, take_required_id};
use crate::entity::{Entity, EntityRef, EntityType, RawProperty};
use crate::error::{ConditionError, InvalidTransitionError, LookupError, ResolutionError};
use crate::project::Project;
use crate::registry::{TraitBehavior, TraitOptions};
use crate::tools::{StoryTool, ToolAction, ToolDefinition};

/// Function `target` that exposes the transition tool.
pub const TRANSITION_TARGET: &str = "transition";

const TRANSITION_DESCRIPTION: &str = "Transition to another graph node.";
const TRANSITION_PARAMETERS: &[&str] = &["to"];

/// Options of the `graph` trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphTraitOptions {
    /// The entity type whose entities are the graph's nodes.
    pub node_type_id: String,
}

pub(crate) fn validate_graph_options(options: &Map<String, Value>) -> Result<TraitOptions, String> {
    let options: GraphTraitOptions =
        serde_json::from_value(Value::Object(options.clone())).map_err(|err| err.to_string())?;
    validate_pascal_case(&options.node_type_id).map_err(|err| format!("node_type_id: {err}"))?;
    Ok(TraitOptions::Graph(options))
}

/// A graph node with outgoing edges.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub edge_ids: Vec<String>,
    /// Resolved `edge_ids`; empty until the project is assembled.
    edges: Vec<EntityRef>,
}

impl GraphNode {
    pub fn new(edge_ids: Vec<String>) -> Self {
        Self {
            edge_ids,
            edges: Vec::new(),
        }
    }

    pub fn edges(&self) -> &[EntityRef] {
        &self.edges
    }

    pub(crate) fn set_edges(&mut self, edges: Vec<EntityRef>) {
        self.edges = edges;
    }

    pub(crate) fn take_fields(
        fields: &mut Map<String, Value>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        take_id_list(fields, "edge_ids", path, Some(Vec::new()), errors).map(Self::new)
    }

    pub(crate) fn property(&self, name: &str) -> Option<RawProperty<'_>> {
        match name {
            "edge_ids" => Some(RawProperty::StrList(&self.edge_ids)),
            "edges" => Some(RawProperty::Entities(&self.edges)),
            _ => None,
        }
    }

    pub(crate) fn extend_template_context(&self, context: &mut Map<String, Value>) {
        let edges = self.edges.iter().map(|edge| Value::from(edge.entity_id.as_str()));
        context.insert("edges".to_string(), Value::Array(edges.collect()));
    }

    /// Resolve `edge_ids` against the node's own entity type.
    pub(crate) fn resolve_edges(
        &self,
        entity: &Entity,
        entity_type: &EntityType,
    ) -> Result<Vec<EntityRef>, ResolutionError> {
        self.edge_ids
            .iter()
            .map(|edge_id| {
                entity_type
                    .get_entity_with(edge_id, TraitBehavior::GraphNode)
                    .map(Entity::entity_ref)
                    .map_err(|source| ResolutionError::Edge {
                        entity_id: entity.id().to_string(),
                        edge_id: edge_id.clone(),
                        source,
                    })
            })
            .collect()
    }
}

/// A graph over node entities with a current node.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub node_ids: Vec<String>,
    /// The authored `current_node_id`.
    initial_node_id: String,
    nodes: Vec<EntityRef>,
    current_node: Option<EntityRef>,
}

impl Graph {
    pub fn new(node_ids: Vec<String>, current_node_id: impl Into<String>) -> Self {
        Self {
            node_ids,
            initial_node_id: current_node_id.into(),
            nodes: Vec::new(),
            current_node: None,
        }
    }

    pub fn nodes(&self) -> &[EntityRef] {
        &self.nodes
    }

    pub fn current_node(&self) -> Option<&EntityRef> {
        self.current_node.as_ref()
    }

    /// Id of the current node; the authored one until the project is assembled.
    pub fn current_node_id(&self) -> &str {
        self.current_node
            .as_ref()
            .map_or(self.initial_node_id.as_str(), |node| node.entity_id.as_str())
    }

    pub fn initial_node_id(&self) -> &str {
        &self.initial_node_id
    }

    pub(crate) fn take_fields(
        fields: &mut Map<String, Value>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let node_ids = take_id_list(fields, "node_ids", path, None, errors);
        let current_node_id = take_required_id(fields, "current_node_id", path, errors);
        Some(Self::new(node_ids?, current_node_id?))
    }

    pub(crate) fn property(&self, name: &str) -> Option<RawProperty<'_>> {
        match name {
            "node_ids" => Some(RawProperty::StrList(&self.node_ids)),
            "nodes" => Some(RawProperty::Entities(&self.nodes)),
            "current_node_id" => Some(RawProperty::Str(self.current_node_id())),
            "current_node" => self.current_node.as_ref().map(RawProperty::Entity),
            _ => None,
        }
    }

    pub(crate) fn extend_template_context(
        &self,
        project: &Project,
        context: &mut Map<String, Value>,
    ) -> Result<(), ConditionError> {
        let nodes = self
            .nodes
            .iter()
            .filter_map(|node| project.entity(node))
            .map(|node| node.template_context(project).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()?;
        let current_node = match self.current_node.as_ref().and_then(|r| project.entity(r)) {
            Some(node) => Value::Object(node.template_context(project)?),
            None => Value::Null,
        };

        context.insert("nodes".to_string(), Value::Array(nodes));
        context.insert("current_node".to_string(), current_node);
        Ok(())
    }

    /// Resolve `node_ids` against the node type named in the trait options, then find the
    /// current node among them.
    pub(crate) fn resolve_nodes(
        &self,
        entity: &Entity,
        entity_type: &EntityType,
        project: &Project,
    ) -> Result<(Vec<EntityRef>, EntityRef), ResolutionError> {
        let graph_id = entity.id();
        let node_type = entity_type
            .graph_options()
            .map_err(LookupError::from)
            .and_then(|options| {
                project
                    .get_entity_type(&options.node_type_id)
                    .map_err(LookupError::from)
            })
            .map_err(|source| ResolutionError::NodeType {
                graph_id: graph_id.to_string(),
                source,
            })?;

        let nodes = self
            .node_ids
            .iter()
            .map(|node_id| {
                node_type
                    .get_entity_with(node_id, TraitBehavior::GraphNode)
                    .map(Entity::entity_ref)
                    .map_err(|source| ResolutionError::Node {
                        graph_id: graph_id.to_string(),
                        node_id: node_id.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let current = nodes
            .iter()
            .find(|node| node.entity_id == self.initial_node_id)
            .cloned()
            .ok_or_else(|| ResolutionError::CurrentNodeNotFound {
                graph_id: graph_id.to_string(),
                node_id: self.initial_node_id.clone(),
            })?;

        Ok((nodes, current))
    }

    pub(crate) fn set_resolved(&mut self, nodes: Vec<EntityRef>, current_node: EntityRef) {
        self.nodes = nodes;
        self.current_node = Some(current_node);
    }

    pub(crate) fn set_current_node(&mut self, node: EntityRef) {
        self.current_node = Some(node);
    }

    /// Ids of the edges leaving the current node.
    pub fn current_edge_ids<'p>(&self, project: &'p Project) -> Vec<&'p str> {
        self.current_edges(project)
            .iter()
            .map(|edge| edge.entity_id.as_str())
            .collect()
    }

    fn current_edges<'p>(&self, project: &'p Project) -> &'p [EntityRef] {
        self.current_node
            .as_ref()
            .and_then(|current| project.entity(current))
            .and_then(Entity::graph_node)
            .map_or(&[][..], GraphNode::edges)
    }

    /// The node reached by following the edge to `target`.
    pub fn next_node(
        &self,
        project: &Project,
        target: &str,
    ) -> Result<EntityRef, InvalidTransitionError> {
        self.current_edges(project)
            .iter()
            .find(|edge| edge.entity_id == target)
            .cloned()
            .ok_or_else(|| InvalidTransitionError {
                current: self.current_node_id().to_string(),
                target: target.to_string(),
            })
    }

    /// Build the transition tool for the current node.
    ///
    /// Returns `None` when the current node has no outgoing edges.
    pub(crate) fn transition_tool(
        &self,
        entity: &Entity,
        function: &FunctionDefinition,
        project: &Project,
    ) -> Option<StoryTool> {
        let edge_ids = self.current_edge_ids(project);
        if edge_ids.is_empty() {
            debug!(
                graph = entity.id(),
                node = self.current_node_id(),
                "No outgoing edges, omitting transition tool"
            );
            return None;
        }

        let to_description = function
            .properties
            .as_ref()
            .and_then(|properties| properties.get("to"))
            .map_or("The node to transition to.", String::as_str);
        let parameters = json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": to_description,
                    "enum": edge_ids,
                },
            },
            "required": ["to"],
            "additionalProperties": false,
        });

        let definition = ToolDefinition {
            name: function
                .name
                .clone()
                .unwrap_or_else(|| TRANSITION_TARGET.to_string()),
            description: Some(
                function
                    .description
                    .clone()
                    .unwrap_or_else(|| TRANSITION_DESCRIPTION.to_string()),
            ),
            parameters,
            strict: true,
        };
        Some(StoryTool::new(
            definition,
            ToolAction::Transition {
                graph: entity.entity_ref(),
            },
        ))
    }
}

/// Check that a transition function only describes parameters the tool has.
pub(crate) fn validate_transition_function(
    function: &FunctionDefinition,
) -> Result<(), ResolutionError> {
    let unknown = function
        .properties
        .iter()
        .flat_map(|properties| properties.keys())
        .find(|key| !TRANSITION_PARAMETERS.contains(&key.as_str()));
    match unknown {
        Some(property) => Err(ResolutionError::UnknownFunctionProperty {
            function: function
                .name
                .clone()
                .unwrap_or_else(|| TRANSITION_TARGET.to_string()),
            property: property.clone(),
        }),
        None => Ok(()),
    }
}
