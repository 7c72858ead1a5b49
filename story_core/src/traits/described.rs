//! The `described` trait: LLM-facing name, description and visibility.

use serde_json::{Map, Value};

use story_schema::{BoolExprDefinition, ValidationErrors};

use super::take_required_string;
use crate::entity::{Entity, RawProperty};
use crate::error::ConditionError;
use crate::project::Project;

#[derive(Debug, Clone, PartialEq)]
pub struct Described {
    /// Human-readable name presented to the LLM.
    pub name: String,
    /// Detailed description presented to the LLM.
    pub description: String,
    /// Whether the entity should be presented to the LLM. Defaults to `true`.
    pub enabled: BoolExprDefinition,
}

impl Described {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled: BoolExprDefinition::default(),
        }
    }

    pub fn with_enabled(mut self, enabled: BoolExprDefinition) -> Self {
        self.enabled = enabled;
        self
    }

    pub(crate) fn take_fields(
        fields: &mut Map<String, Value>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let name = take_required_string(fields, "name", path, errors);
        let description = take_required_string(fields, "description", path, errors);
        let enabled = match fields.remove("enabled") {
            None => Some(BoolExprDefinition::default()),
            Some(value) => BoolExprDefinition::from_value(&value)
                .map_err(|message| errors.push(format!("{path}.enabled"), message))
                .ok(),
        };

        Some(Self {
            name: name?,
            description: description?,
            enabled: enabled?,
        })
    }

    pub(crate) fn property(&self, name: &str) -> Option<RawProperty<'_>> {
        match name {
            "name" => Some(RawProperty::Str(&self.name)),
            "description" => Some(RawProperty::Str(&self.description)),
            "enabled" => Some(RawProperty::Condition(&self.enabled)),
            _ => None,
        }
    }

    pub(crate) fn extend_template_context(
        &self,
        entity: &Entity,
        project: &Project,
        context: &mut Map<String, Value>,
    ) -> Result<(), ConditionError> {
        let enabled = project.evaluator().entity_enabled(entity, &self.enabled)?;
        context.insert("name".to_string(), Value::from(self.name.as_str()));
        context.insert("description".to_string(), Value::from(self.description.as_str()));
        context.insert("enabled".to_string(), Value::Bool(enabled));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn take(value: Value) -> (Option<Described>, ValidationErrors) {
        let mut errors = ValidationErrors::new();
        let Value::Object(mut fields) = value else {
            panic!("expected an object");
        };
        let described = Described::take_fields(&mut fields, "node", &mut errors);
        (described, errors)
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let (described, errors) = take(json!({ "name": "Node A", "description": "First node" }));
        assert!(errors.is_empty());
        assert_eq!(described, Some(Described::new("Node A", "First node")));
    }

    #[test]
    fn test_enabled_forms() {
        let (described, _) = take(json!({
            "name": "Node C",
            "description": "Third node",
            "enabled": { "value": "node_a.enabled" },
        }));
        let described = described.unwrap();
        assert_eq!(
            described.enabled,
            "node_a.enabled".parse::<BoolExprDefinition>().unwrap()
        );
        assert!(matches!(described.property("enabled"), Some(RawProperty::Condition(_))));
        assert!(matches!(described.property("name"), Some(RawProperty::Str("Node C"))));
        assert!(described.property("edge_ids").is_none());
    }

    #[test]
    fn test_missing_and_invalid_fields() {
        let (described, errors) = take(json!({ "description": 3, "enabled": "a..b" }));
        assert!(described.is_none());
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["node.name", "node.description", "node.enabled"]);
    }
}
