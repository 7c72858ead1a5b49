use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use story_schema::{EntityTypeDefinition, FunctionDefinition, ValidationErrors};

use super::{Entity, EntityRef};
use crate::error::{ConditionError, LookupError, StateAccessError};
use crate::project::Project;
use crate::registry::{TraitBehavior, TraitOptions, TraitRegistry};
use crate::tools::StoryTool;
use crate::traits::GraphTraitOptions;

/// A composed entity type: its traits, validated trait options and entities.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityType {
    id: String,
    name: String,
    instructions: Option<String>,
    /// Trait name to behavior, in the order the traits were listed.
    traits: IndexMap<String, TraitBehavior>,
    functions: Vec<FunctionDefinition>,
    entity_map: IndexMap<String, Entity>,
    /// Validated options, only for traits that declare an options schema.
    trait_options_map: IndexMap<String, TraitOptions>,
}

impl EntityType {
    /// Compose an entity type from its definition.
    ///
    /// Every trait is looked up in `registry` and its options validated; then each
    /// entity is built from the fields its traits claim. All problems are collected.
    pub fn from_definition(
        definition: &EntityTypeDefinition,
        registry: &TraitRegistry,
        path: &str,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut traits: IndexMap<String, TraitBehavior> = IndexMap::new();
        let mut trait_options_map = IndexMap::new();

        for (i, trait_def) in definition.traits.iter().enumerate() {
            let trait_path = format!("{path}.traits[{i}]");
            let entry = match registry.get(&trait_def.name) {
                Ok(entry) => *entry,
                Err(err) => {
                    errors.push(trait_path, err.to_string());
                    continue;
                }
            };

            if let Some((other, _)) = traits.iter().find(|(_, b)| **b == entry.behavior) {
                errors.push(
                    trait_path,
                    format!(
                        "Trait '{}' adds the same behavior as '{other}'",
                        trait_def.name
                    ),
                );
                continue;
            }

            match entry.options_schema {
                Some(schema) => match schema(&trait_def.options) {
                    Ok(options) => {
                        trait_options_map.insert(trait_def.name.clone(), options);
                    }
                    Err(message) => errors.push(format!("{trait_path}.options"), message),
                },
                None if !trait_def.options.is_empty() => errors.push(
                    format!("{trait_path}.options"),
                    format!("Trait '{}' does not accept options", trait_def.name),
                ),
                None => {}
            }
            traits.insert(trait_def.name.clone(), entry.behavior);
        }

        let mut entity_map = IndexMap::with_capacity(definition.entities.len());
        let mut seen_ids = HashSet::new();
        for (i, entity_def) in definition.entities.iter().enumerate() {
            let entity_path = format!("{path}.entities[{i}]");
            if !seen_ids.insert(entity_def.id.as_str()) {
                errors.push(
                    format!("{entity_path}.id"),
                    format!("Duplicate entity id: {}", entity_def.id),
                );
                continue;
            }
            if let Some(entity) =
                Entity::from_definition(entity_def, &definition.id, &traits, &entity_path, &mut errors)
            {
                entity_map.insert(entity.id().to_string(), entity);
            }
        }

        errors.into_result()?;
        debug!(
            entity_type = %definition.id,
            traits = traits.len(),
            entities = entity_map.len(),
            "Composed entity type"
        );

        Ok(Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            instructions: definition.instructions.clone(),
            traits,
            functions: definition.functions.clone(),
            entity_map,
            trait_options_map,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Applied trait names in listed order.
    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.traits.keys().map(String::as_str)
    }

    pub fn has_behavior(&self, behavior: TraitBehavior) -> bool {
        self.traits.values().any(|b| *b == behavior)
    }

    /// Functions shared by all entities of this type.
    pub fn functions(&self) -> &[FunctionDefinition] {
        &self.functions
    }

    /// Entities in definition order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entity_map.values()
    }

    pub fn get_entity(&self, entity_id: &str) -> Result<&Entity, StateAccessError> {
        self.entity_map
            .get(entity_id)
            .ok_or_else(|| StateAccessError::EntityNotFound(entity_id.to_string()))
    }

    /// Look up an entity that must have `behavior`.
    pub fn get_entity_with(
        &self,
        entity_id: &str,
        behavior: TraitBehavior,
    ) -> Result<&Entity, LookupError> {
        self.get_entity(entity_id)?.require(behavior)
    }

    pub(crate) fn get_entity_mut(&mut self, entity_id: &str) -> Option<&mut Entity> {
        self.entity_map.get_mut(entity_id)
    }

    pub(crate) fn entity(&self, entity_ref: &EntityRef) -> Option<&Entity> {
        (entity_ref.entity_type_id == self.id)
            .then(|| self.entity_map.get(&entity_ref.entity_id))
            .flatten()
    }

    /// Validated options of the trait named `trait_name`.
    pub fn get_trait_options(&self, trait_name: &str) -> Result<&TraitOptions, StateAccessError> {
        self.trait_options_map
            .get(trait_name)
            .ok_or_else(|| StateAccessError::TraitNotFound(trait_name.to_string()))
    }

    /// Options of whichever trait gives this type its graph behavior.
    pub fn graph_options(&self) -> Result<&GraphTraitOptions, StateAccessError> {
        let name = self
            .traits
            .iter()
            .find(|(_, behavior)| **behavior == TraitBehavior::Graph)
            .map_or(TraitBehavior::Graph.default_name(), |(name, _)| name.as_str());
        self.get_trait_options(name)?
            .as_graph()
            .ok_or_else(|| StateAccessError::TraitNotFound(name.to_string()))
    }

    /// The mapping handed to prompt templates.
    pub fn template_context(&self, project: &Project) -> Result<Map<String, Value>, ConditionError> {
        let entities = self
            .entities()
            .map(|entity| entity.template_context(project).map(Value::Object))
            .collect::<Result<Vec<_>, _>>()?;

        let mut context = Map::new();
        context.insert("id".to_string(), Value::from(self.id.as_str()));
        context.insert("name".to_string(), Value::from(self.name.as_str()));
        context.insert(
            "instructions".to_string(),
            self.instructions.as_deref().map_or(Value::Null, Value::from),
        );
        context.insert(
            "traits".to_string(),
            Value::Array(self.trait_names().map(Value::from).collect()),
        );
        context.insert("entities".to_string(), Value::Array(entities));
        Ok(context)
    }

    /// Tools offered by all entities of this type.
    pub fn tools(&self, project: &Project) -> Vec<StoryTool> {
        self.entities()
            .flat_map(|entity| entity.tools(project))
            .collect()
    }
}
