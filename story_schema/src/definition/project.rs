//! Project definition and file loaders.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::entity::EntityTypeDefinition;
use super::trait_def::TraitCatalog;
use super::validation::{
    field_path, index_path, kind_of, list, optional_string, reject_unknown_keys, required_string,
    ValidationErrors,
};
use crate::error::SchemaError;

const PROJECT_KEYS: [&str; 4] = ["title", "author", "description", "entity_types"];

/// A gamebook project as written by its author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDefinition {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub entity_types: Vec<EntityTypeDefinition>,
}

impl ProjectDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            description: None,
            entity_types: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_entity_type(mut self, entity_type: EntityTypeDefinition) -> Self {
        self.entity_types.push(entity_type);
        self
    }

    /// Validate plain data into a definition.
    ///
    /// Every problem found is reported, not just the first one.
    pub fn from_value(data: &Value, traits: &dyn TraitCatalog) -> Result<Self, ValidationErrors> {
        let Value::Object(map) = data else {
            return Err(ValidationErrors::single(
                "",
                format!("Expected a mapping for the project, got {}", kind_of(data)),
            ));
        };

        let mut errors = ValidationErrors::new();
        reject_unknown_keys(map, &PROJECT_KEYS, "", &mut errors);

        let title = required_string(map, "title", "", &mut errors);
        let author = optional_string(map, "author", "", &mut errors);
        let description = optional_string(map, "description", "", &mut errors);

        let mut entity_types = Vec::new();
        let mut seen = HashSet::new();
        for (i, item) in list(map, "entity_types", "", true, &mut errors)
            .into_iter()
            .flatten()
            .enumerate()
        {
            let path = index_path("entity_types", i);
            if let Some(entity_type) = EntityTypeDefinition::parse(item, &path, traits, &mut errors)
            {
                if !entity_type.id.is_empty() && !seen.insert(entity_type.id.clone()) {
                    errors.push(
                        field_path(&path, "id"),
                        format!("Duplicate entity type id: {}", entity_type.id),
                    );
                }
                entity_types.push(entity_type);
            }
        }

        errors.into_result()?;
        Ok(Self {
            title: title.unwrap_or_default(),
            author,
            description,
            entity_types,
        })
    }

    pub fn from_yaml_str(text: &str, traits: &dyn TraitCatalog) -> Result<Self, SchemaError> {
        let data: Value = serde_yaml::from_str(text)?;
        Ok(Self::from_value(&data, traits)?)
    }

    pub fn from_toml_str(text: &str, traits: &dyn TraitCatalog) -> Result<Self, SchemaError> {
        let data: Value = toml::from_str(text)?;
        Ok(Self::from_value(&data, traits)?)
    }

    pub fn from_json_str(text: &str, traits: &dyn TraitCatalog) -> Result<Self, SchemaError> {
        let data: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&data, traits)?)
    }

    /// Load a definition file, choosing the format by extension
    /// (`.yaml`/`.yml`, `.toml` or `.json`).
    pub fn from_file(path: &Path, traits: &dyn TraitCatalog) -> Result<Self, SchemaError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let loader: fn(&str, &dyn TraitCatalog) -> Result<Self, SchemaError> =
            match extension.as_deref() {
                Some("yaml" | "yml") => Self::from_yaml_str,
                Some("toml") => Self::from_toml_str,
                Some("json") => Self::from_json_str,
                _ => return Err(SchemaError::UnsupportedFormat(path.to_path_buf())),
            };

        debug!(path = %path.display(), "Reading project definition");
        let text = fs::read_to_string(path)?;
        loader(&text, traits)
    }

    /// Look up an entity type definition by id.
    pub fn entity_type(&self, id: &str) -> Option<&EntityTypeDefinition> {
        self.entity_types.iter().find(|et| et.id == id)
    }
}

impl std::fmt::Display for ProjectDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<ProjectDefinition title=\"{}\">", self.title)
    }
}
