//! The project: every entity type of one story, composed and cross-linked.
//!
//! Loading runs in two passes. Composition builds each entity type on its own; the
//! post-init pass then resolves references between entities (graph edges, graph nodes,
//! current nodes) once all of them exist.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use story_schema::{ProjectDefinition, ValidationErrors};

use crate::conditions::BoolExprEvaluator;
use crate::config::ProjectConfig;
use crate::entity::{Entity, EntityRef, EntityType};
use crate::error::{
    ConditionError, LookupError, ProjectError, ResolutionError, StateAccessError, TransitionError,
};
use crate::registry::{TraitBehavior, TraitRegistry};
use crate::tools::{FunctionResult, StoryTool};
use crate::traits::graph::{validate_transition_function, TRANSITION_TARGET};

const PROJECT_FILE_EXTENSIONS: [&str; 4] = ["yaml", "yml", "toml", "json"];

/// A loaded story project.
#[derive(Debug, Clone)]
pub struct Project {
    title: String,
    author: Option<String>,
    description: Option<String>,
    entity_type_map: IndexMap<String, EntityType>,
    config: ProjectConfig,
}

impl Project {
    /// Load `<dir>/llm-gamebook.{yaml,yml,toml,json}` with the built-in traits.
    pub fn from_path(dir: impl AsRef<Path>) -> Result<Self, ProjectError> {
        Self::from_path_with(dir, &TraitRegistry::default(), ProjectConfig::default())
    }

    /// Load the project file named by `config.project_file_stem` from `dir`.
    pub fn from_path_with(
        dir: impl AsRef<Path>,
        registry: &TraitRegistry,
        config: ProjectConfig,
    ) -> Result<Self, ProjectError> {
        let dir = dir.as_ref();
        let stem = &config.project_file_stem;
        let path = PROJECT_FILE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| ProjectError::FileNotFound(dir.join(format!("{stem}.yaml"))))?;

        debug!(path = %path.display(), "Loading project");
        let definition = ProjectDefinition::from_file(&path, registry)?;
        Self::from_definition(&definition, registry, config)
    }

    /// Load a project from plain data with the built-in traits.
    pub fn from_data(data: &Value) -> Result<Self, ProjectError> {
        Self::from_data_with(data, &TraitRegistry::default(), ProjectConfig::default())
    }

    pub fn from_data_with(
        data: &Value,
        registry: &TraitRegistry,
        config: ProjectConfig,
    ) -> Result<Self, ProjectError> {
        let definition = ProjectDefinition::from_value(data, registry)?;
        Self::from_definition(&definition, registry, config)
    }

    /// Compose every entity type, then resolve cross-entity references.
    pub fn from_definition(
        definition: &ProjectDefinition,
        registry: &TraitRegistry,
        config: ProjectConfig,
    ) -> Result<Self, ProjectError> {
        let mut errors = ValidationErrors::new();
        let mut entity_type_map = IndexMap::with_capacity(definition.entity_types.len());
        for (i, type_def) in definition.entity_types.iter().enumerate() {
            let path = format!("entity_types[{i}]");
            if entity_type_map.contains_key(&type_def.id) {
                errors.push(
                    format!("{path}.id"),
                    format!("Duplicate entity type id: {}", type_def.id),
                );
                continue;
            }
            match EntityType::from_definition(type_def, registry, &path) {
                Ok(entity_type) => {
                    entity_type_map.insert(type_def.id.clone(), entity_type);
                }
                Err(type_errors) => errors.extend(type_errors),
            }
        }
        if !errors.is_empty() {
            return Err(ProjectError::Composition(errors));
        }

        let mut project = Self {
            title: definition.title.clone(),
            author: definition.author.clone(),
            description: definition.description.clone(),
            entity_type_map,
            config,
        };
        project.post_init()?;

        info!(
            title = %project.title,
            entity_types = project.entity_type_map.len(),
            "Project loaded"
        );
        Ok(project)
    }

    fn post_init(&mut self) -> Result<(), ResolutionError> {
        if self.config.unique_entity_ids {
            self.check_unique_entity_ids()?;
        }

        let mut resolved_edges = Vec::new();
        for entity_type in self.entity_type_map.values() {
            for entity in entity_type.entities() {
                if let Some(node) = entity.graph_node() {
                    let edges = node.resolve_edges(entity, entity_type)?;
                    resolved_edges.push((entity.entity_ref(), edges));
                }
            }
        }
        for (entity_ref, edges) in resolved_edges {
            if let Some(node) = self.entity_mut(&entity_ref).and_then(Entity::graph_node_mut) {
                node.set_edges(edges);
            }
        }

        let mut resolved_graphs = Vec::new();
        for entity_type in self.entity_type_map.values() {
            for entity in entity_type.entities() {
                if let Some(graph) = entity.graph() {
                    let (nodes, current) = graph.resolve_nodes(entity, entity_type, self)?;
                    resolved_graphs.push((entity.entity_ref(), nodes, current));
                }
            }
        }
        for (entity_ref, nodes, current) in resolved_graphs {
            if let Some(graph) = self.entity_mut(&entity_ref).and_then(Entity::graph_mut) {
                graph.set_resolved(nodes, current);
            }
        }

        for entity_type in self.entity_type_map.values() {
            for entity in entity_type.entities().filter(|e| e.graph().is_some()) {
                entity_type
                    .functions()
                    .iter()
                    .chain(entity.functions())
                    .filter(|function| function.target == TRANSITION_TARGET)
                    .try_for_each(validate_transition_function)?;
            }
        }

        debug!("Resolved entity references");
        Ok(())
    }

    fn check_unique_entity_ids(&self) -> Result<(), ResolutionError> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for entity_type in self.entity_type_map.values() {
            for entity in entity_type.entities() {
                if let Some(first) = owners.insert(entity.id(), entity_type.id()) {
                    return Err(ResolutionError::DuplicateEntityId {
                        entity_id: entity.id().to_string(),
                        first: first.to_string(),
                        second: entity_type.id().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Entity types in definition order.
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entity_type_map.values()
    }

    pub fn get_entity_type(&self, entity_type_id: &str) -> Result<&EntityType, StateAccessError> {
        self.entity_type_map
            .get(entity_type_id)
            .ok_or_else(|| StateAccessError::EntityTypeNotFound(entity_type_id.to_string()))
    }

    /// Find an entity by id in any entity type. The first match wins.
    pub fn get_entity(&self, entity_id: &str) -> Result<&Entity, StateAccessError> {
        self.entity_type_map
            .values()
            .find_map(|entity_type| entity_type.get_entity(entity_id).ok())
            .ok_or_else(|| StateAccessError::EntityNotFound(entity_id.to_string()))
    }

    /// Find an entity that must have `behavior`.
    pub fn get_entity_with(
        &self,
        entity_id: &str,
        behavior: TraitBehavior,
    ) -> Result<&Entity, LookupError> {
        self.get_entity(entity_id)?.require(behavior)
    }

    pub fn entity(&self, entity_ref: &EntityRef) -> Option<&Entity> {
        self.entity_type_map
            .get(&entity_ref.entity_type_id)
            .and_then(|entity_type| entity_type.entity(entity_ref))
    }

    pub(crate) fn entity_mut(&mut self, entity_ref: &EntityRef) -> Option<&mut Entity> {
        self.entity_type_map
            .get_mut(&entity_ref.entity_type_id)
            .and_then(|entity_type| entity_type.get_entity_mut(&entity_ref.entity_id))
    }

    /// A condition evaluator bound to this project.
    pub fn evaluator(&self) -> BoolExprEvaluator<'_> {
        BoolExprEvaluator::new(self)
    }

    /// The mapping handed to prompt templates.
    pub fn template_context(&self) -> Result<Map<String, Value>, ConditionError> {
        let entity_types = self
            .entity_types()
            .map(|entity_type| entity_type.template_context(self).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()?;

        let mut context = Map::new();
        context.insert("title".to_string(), Value::from(self.title.as_str()));
        context.insert(
            "description".to_string(),
            self.description.as_deref().map_or(Value::Null, Value::from),
        );
        context.insert(
            "author".to_string(),
            self.author.as_deref().map_or(Value::Null, Value::from),
        );
        context.insert("entity_types".to_string(), Value::Array(entity_types));
        Ok(context)
    }

    /// Tools currently offered across the project.
    pub fn tools(&self) -> Vec<StoryTool> {
        self.entity_types()
            .flat_map(|entity_type| entity_type.tools(self))
            .collect()
    }

    /// Call the currently offered tool named `name`.
    pub fn call_tool(&mut self, name: &str, args: &Value) -> FunctionResult {
        match self.tools().into_iter().find(|tool| tool.name() == name) {
            Some(tool) => tool.call(self, args),
            None => {
                warn!(tool = name, "Unknown tool called");
                FunctionResult::error(format!("Unknown tool: {name}"))
            }
        }
    }

    /// Move the graph `graph_id` along an edge of its current node to `target`.
    pub fn transition(&mut self, graph_id: &str, target: &str) -> Result<(), TransitionError> {
        let graph_ref = self
            .get_entity_with(graph_id, TraitBehavior::Graph)?
            .entity_ref();
        self.transition_ref(&graph_ref, target)
    }

    /// Like [`Project::transition`], for a graph addressed by type and id.
    pub fn transition_ref(
        &mut self,
        graph_ref: &EntityRef,
        target: &str,
    ) -> Result<(), TransitionError> {
        let entity = self.entity(graph_ref).ok_or_else(|| {
            LookupError::from(StateAccessError::EntityNotFound(graph_ref.entity_id.clone()))
        })?;
        let graph = entity
            .graph()
            .ok_or_else(|| entity.unexpected_type(TraitBehavior::Graph))?;
        let from = graph.current_node_id().to_string();
        let next = graph.next_node(self, target)?;

        if let Some(graph) = self.entity_mut(graph_ref).and_then(Entity::graph_mut) {
            graph.set_current_node(next);
        }
        info!(graph = %graph_ref, from = %from, to = target, "Graph transition");
        Ok(())
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Project title=\"{}\">", self.title)
    }
}
