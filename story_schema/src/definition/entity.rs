//! Entity and entity type definitions.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use super::trait_def::{FunctionDefinition, TraitCatalog, TraitDefinition};
use super::validation::{
    field_path, index_path, kind_of, list, optional_string, reject_unknown_keys, required_string,
    ValidationErrors,
};
use crate::ids::{
    id_from_name, normalized_pascal_case, normalized_snake_case, validate_pascal_case,
    validate_snake_case,
};

const ENTITY_TYPE_KEYS: [&str; 6] = ["id", "name", "instructions", "traits", "entities", "functions"];

/// One authored entity.
///
/// Only `id` and `functions` are known here; every other field (`name`, `edge_ids`, ...)
/// stays in `extra` until the entity type's traits claim it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDefinition {
    /// Unique identifier (`snake_case`), derived from `name` when omitted.
    pub id: String,
    pub functions: Vec<FunctionDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            functions: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add a trait field (builder pattern).
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn with_function(mut self, function: FunctionDefinition) -> Self {
        self.functions.push(function);
        self
    }

    /// Read an entity definition, reporting problems under `path`.
    pub fn parse(data: &Value, path: &str, errors: &mut ValidationErrors) -> Option<Self> {
        if !data.is_object() {
            errors.push(path, format!("Expected a mapping for an entity, got {}", kind_of(data)));
            return None;
        }
        let mut data = data.clone();
        id_from_name(&mut data, normalized_snake_case);
        let Value::Object(mut map) = data else {
            return None;
        };

        let id = required_string(&map, "id", path, errors);
        if let Some(Err(err)) = id.as_deref().map(validate_snake_case) {
            errors.push(field_path(path, "id"), err.to_string());
        }

        let functions = parse_functions(&map, path, errors);

        map.remove("id");
        map.remove("functions");

        Some(Self {
            id: id.unwrap_or_default(),
            functions,
            extra: map,
        })
    }
}

/// An author-defined kind of entity and the traits it is composed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTypeDefinition {
    /// Unique identifier (`PascalCase`), derived from `name` when omitted.
    pub id: String,
    /// Human-readable name presented to the LLM.
    pub name: String,
    /// Instructions presented to the LLM for entities of this type.
    pub instructions: Option<String>,
    pub traits: Vec<TraitDefinition>,
    pub entities: Vec<EntityDefinition>,
    /// Functions shared by all entities of this type.
    pub functions: Vec<FunctionDefinition>,
}

impl EntityTypeDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instructions: None,
            traits: Vec::new(),
            entities: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_trait(mut self, trait_def: TraitDefinition) -> Self {
        self.traits.push(trait_def);
        self
    }

    pub fn with_entity(mut self, entity: EntityDefinition) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_function(mut self, function: FunctionDefinition) -> Self {
        self.functions.push(function);
        self
    }

    /// Whether a trait with this name is applied.
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.name == name)
    }

    /// Read an entity type definition, reporting problems under `path`.
    ///
    /// Trait names are checked against `traits`.
    pub fn parse(
        data: &Value,
        path: &str,
        traits: &dyn TraitCatalog,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        if !data.is_object() {
            errors.push(
                path,
                format!("Expected a mapping for an entity type, got {}", kind_of(data)),
            );
            return None;
        }
        let mut data = data.clone();
        id_from_name(&mut data, normalized_pascal_case);
        let Value::Object(map) = &data else {
            return None;
        };

        reject_unknown_keys(map, &ENTITY_TYPE_KEYS, path, errors);

        let id = required_string(map, "id", path, errors);
        if let Some(Err(err)) = id.as_deref().map(validate_pascal_case) {
            errors.push(field_path(path, "id"), err.to_string());
        }
        let name = required_string(map, "name", path, errors);
        let instructions = optional_string(map, "instructions", path, errors);

        let trait_defs = parse_traits(map, path, traits, errors);
        let functions = parse_functions(map, path, errors);

        let entities_path = field_path(path, "entities");
        let mut entities = Vec::new();
        let mut seen = HashSet::new();
        for (i, item) in list(map, "entities", path, true, errors)
            .into_iter()
            .flatten()
            .enumerate()
        {
            let item_path = index_path(&entities_path, i);
            if let Some(entity) = EntityDefinition::parse(item, &item_path, errors) {
                if !entity.id.is_empty() && !seen.insert(entity.id.clone()) {
                    errors.push(
                        field_path(&item_path, "id"),
                        format!("Duplicate entity id: {}", entity.id),
                    );
                }
                entities.push(entity);
            }
        }

        Some(Self {
            id: id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            instructions,
            traits: trait_defs,
            entities,
            functions,
        })
    }
}

fn parse_traits(
    map: &Map<String, Value>,
    path: &str,
    catalog: &dyn TraitCatalog,
    errors: &mut ValidationErrors,
) -> Vec<TraitDefinition> {
    let traits_path = field_path(path, "traits");
    let mut trait_defs: Vec<TraitDefinition> = Vec::new();

    for (i, item) in list(map, "traits", path, false, errors)
        .into_iter()
        .flatten()
        .enumerate()
    {
        let item_path = index_path(&traits_path, i);
        let trait_def = match TraitDefinition::from_value(item) {
            Ok(trait_def) => trait_def,
            Err(message) => {
                errors.push(item_path, message);
                continue;
            }
        };

        let name_path = field_path(&item_path, "name");
        if let Err(err) = validate_snake_case(&trait_def.name) {
            errors.push(name_path, err.to_string());
        } else if !catalog.contains_trait(&trait_def.name) {
            errors.push(name_path, format!("Unknown entity trait: '{}'", trait_def.name));
        } else if trait_defs.iter().any(|t| t.name == trait_def.name) {
            errors.push(name_path, format!("Duplicate trait: '{}'", trait_def.name));
        }
        trait_defs.push(trait_def);
    }

    trait_defs
}

fn parse_functions(
    map: &Map<String, Value>,
    path: &str,
    errors: &mut ValidationErrors,
) -> Vec<FunctionDefinition> {
    let functions_path = field_path(path, "functions");
    list(map, "functions", path, false, errors)
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, item)| match FunctionDefinition::from_value(item) {
            Ok(function) => Some(function),
            Err(message) => {
                errors.push(index_path(&functions_path, i), message);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CATALOG: [&str; 3] = ["described", "graph", "graph_node"];

    fn parse_type(data: Value) -> Result<EntityTypeDefinition, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let parsed = EntityTypeDefinition::parse(&data, "entity_types[0]", &CATALOG, &mut errors);
        errors.into_result()?;
        Ok(parsed.unwrap())
    }

    #[test]
    fn test_entity_id_from_name() {
        let mut errors = ValidationErrors::new();
        let entity =
            EntityDefinition::parse(&json!({ "name": "Living room" }), "e", &mut errors).unwrap();
        assert!(errors.is_empty());
        assert_eq!(entity.id, "living_room");
        assert_eq!(entity.extra.get("name"), Some(&json!("Living room")));
    }

    #[test]
    fn test_entity_keeps_extra_fields() {
        let mut errors = ValidationErrors::new();
        let entity = EntityDefinition::parse(
            &json!({
                "id": "node_a",
                "edge_ids": ["node_b"],
                "functions": [{ "target": "transition" }],
            }),
            "e",
            &mut errors,
        )
        .unwrap();
        assert!(errors.is_empty());
        assert_eq!(
            entity,
            EntityDefinition::new("node_a")
                .with_field("edge_ids", json!(["node_b"]))
                .with_function(FunctionDefinition::new("transition"))
        );
    }

    #[test]
    fn test_entity_id_must_be_snake_case() {
        let mut errors = ValidationErrors::new();
        EntityDefinition::parse(&json!({ "id": "NodeA" }), "e", &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().path, "e.id");
    }

    #[test]
    fn test_entity_type_from_name() {
        let def = parse_type(json!({
            "name": "Story arc",
            "traits": ["described", { "name": "graph", "node_type_id": "StoryArc" }],
            "entities": [],
        }))
        .unwrap();
        assert_eq!(def.id, "StoryArc");
        assert!(def.has_trait("graph"));
        assert_eq!(def.traits[1].options.get("node_type_id"), Some(&json!("StoryArc")));
    }

    #[test]
    fn test_entity_type_collects_all_errors() {
        let errors = parse_type(json!({
            "id": "bad_id",
            "traits": ["unknown", "described", "described", "Graph"],
            "entities": [{ "id": "a" }, { "id": "a" }],
            "colour": "red",
        }))
        .unwrap_err();

        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert!(messages.iter().any(|m| m.starts_with("entity_types[0].colour:")));
        assert!(messages.iter().any(|m| m.starts_with("entity_types[0].id:")));
        assert!(messages.iter().any(|m| m.starts_with("entity_types[0].name: Field required")));
        assert!(messages.iter().any(|m| m.contains("Unknown entity trait: 'unknown'")));
        assert!(messages.iter().any(|m| m.contains("Duplicate trait: 'described'")));
        assert!(messages.iter().any(|m| m.starts_with("entity_types[0].traits[3].name:")));
        assert!(messages.iter().any(|m| m.contains("Duplicate entity id: a")));
        assert_eq!(messages.len(), 7);
    }

    #[test]
    fn test_entity_type_requires_entities() {
        let errors = parse_type(json!({ "id": "Empty", "name": "Empty" })).unwrap_err();
        assert_eq!(errors.to_string(), "entity_types[0].entities: Field required");
    }

    #[test]
    fn test_entity_type_functions() {
        let def = parse_type(json!({
            "id": "TestGraph",
            "name": "Test Graph",
            "functions": [{ "target": "transition", "name": "move" }],
            "entities": [],
        }))
        .unwrap();
        assert_eq!(def.functions, vec![FunctionDefinition::new("transition").with_name("move")]);
    }
}
