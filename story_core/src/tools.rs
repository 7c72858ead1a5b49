//! LLM-callable tools.
//!
//! A tool pairs a JSON-schema description of its parameters with the story action it
//! performs. Tools are prepared per request: they only exist while they can be called.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::entity::EntityRef;
use crate::project::Project;

/// What the LLM is shown about a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON schema for the tool arguments.
    pub parameters: Value,

    /// Whether arguments must match `parameters` exactly.
    #[serde(default)]
    pub strict: bool,
}

/// The story action behind a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    /// Move `graph` to the node named by the `to` argument.
    Transition { graph: EntityRef },
}

/// Outcome of a tool call, as reported back to the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FunctionResult {
    Success,
    Error { reason: Option<String> },
}

impl FunctionResult {
    pub fn success() -> Self {
        FunctionResult::Success
    }

    pub fn error(reason: impl Into<String>) -> Self {
        FunctionResult::Error {
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FunctionResult::Success)
    }
}

/// A prepared tool.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryTool {
    definition: ToolDefinition,
    action: ToolAction,
}

impl StoryTool {
    pub fn new(definition: ToolDefinition, action: ToolAction) -> Self {
        Self { definition, action }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn action(&self) -> &ToolAction {
        &self.action
    }

    /// Run the tool with LLM-supplied arguments.
    ///
    /// Failures, including malformed arguments, come back as an error result.
    pub fn call(&self, project: &mut Project, args: &Value) -> FunctionResult {
        let result = match &self.action {
            ToolAction::Transition { graph } => transition_target(args).and_then(|to| {
                project
                    .transition_ref(graph, to)
                    .map_err(|err| err.to_string())
            }),
        };

        match result {
            Ok(()) => FunctionResult::success(),
            Err(reason) => {
                warn!(tool = self.name(), %reason, "Tool call rejected");
                FunctionResult::error(reason)
            }
        }
    }
}

fn transition_target(args: &Value) -> Result<&str, String> {
    let Some(args) = args.as_object() else {
        return Err("Arguments must be an object".to_string());
    };
    if let Some(key) = args.keys().find(|key| key.as_str() != "to") {
        return Err(format!("Unexpected argument: {key}"));
    }
    match args.get("to") {
        Some(Value::String(to)) => Ok(to),
        Some(_) => Err("Argument 'to' must be a string".to_string()),
        None => Err("Missing required argument: to".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_result_serialization() {
        assert_eq!(
            serde_json::to_value(FunctionResult::success()).unwrap(),
            json!({ "result": "success" })
        );
        assert_eq!(
            serde_json::to_value(FunctionResult::error("nope")).unwrap(),
            json!({ "result": "error", "reason": "nope" })
        );
        assert_eq!(
            serde_json::to_value(FunctionResult::Error { reason: None }).unwrap(),
            json!({ "result": "error", "reason": null })
        );

        let parsed: FunctionResult = serde_json::from_str(r#"{"result":"success"}"#).unwrap();
        assert!(parsed.is_success());
    }

    #[test]
    fn test_transition_arguments() {
        assert_eq!(transition_target(&json!({ "to": "node_b" })), Ok("node_b"));
        assert_eq!(
            transition_target(&json!({})),
            Err("Missing required argument: to".to_string())
        );
        assert_eq!(
            transition_target(&json!({ "to": 3 })),
            Err("Argument 'to' must be a string".to_string())
        );
        assert_eq!(
            transition_target(&json!({ "to": "node_b", "why": "bored" })),
            Err("Unexpected argument: why".to_string())
        );
        assert!(transition_target(&json!("node_b")).is_err());
    }

    #[test]
    fn test_tool_definition_serialization() {
        let definition = ToolDefinition {
            name: "transition".to_string(),
            description: None,
            parameters: json!({ "type": "object" }),
            strict: true,
        };
        assert_eq!(
            serde_json::to_value(&definition).unwrap(),
            json!({ "name": "transition", "parameters": { "type": "object" }, "strict": true })
        );
    }
}
