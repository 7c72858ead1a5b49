mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use story_core::{
    EntityRef, FunctionResult, InvalidTransitionError, LookupError, Project, ToolAction,
    TransitionError,
};

fn current_node_id(project: &Project) -> String {
    project
        .get_entity("test_graph")
        .unwrap()
        .graph()
        .unwrap()
        .current_node_id()
        .to_string()
}

#[test]
fn test_transition_along_an_edge() {
    let mut project = common::simple_project();
    assert_eq!(current_node_id(&project), "node_a");

    project.transition("test_graph", "node_b").unwrap();

    let graph = project.get_entity("test_graph").unwrap().graph().unwrap();
    assert_eq!(graph.current_node(), Some(&EntityRef::new("TestNode", "node_b")));
    assert_eq!(graph.current_node_id(), "node_b");
    assert_eq!(graph.initial_node_id(), "node_a");
}

#[test]
fn test_invalid_transition() {
    let mut project = common::simple_project();

    let err = project.transition("test_graph", "node_z").unwrap_err();
    assert_eq!(
        err,
        TransitionError::Invalid(InvalidTransitionError {
            current: "node_a".to_string(),
            target: "node_z".to_string(),
        })
    );
    assert_eq!(err.to_string(), "node_z is not a valid transition for node node_a");
    assert_eq!(current_node_id(&project), "node_a");

    // node_c exists but is not an edge of node_a
    assert!(project.transition("test_graph", "node_c").is_err());
}

#[test]
fn test_no_way_back_without_an_edge() {
    let mut project = common::simple_project();
    project.transition("test_graph", "node_b").unwrap();
    assert!(project.transition("test_graph", "node_a").is_err());
}

#[test]
fn test_transition_on_a_non_graph() {
    let mut project = common::simple_project();
    assert!(matches!(
        project.transition("node_a", "node_b"),
        Err(TransitionError::Lookup(LookupError::UnexpectedType { .. }))
    ));
    assert!(matches!(
        project.transition("ghost", "node_b"),
        Err(TransitionError::Lookup(LookupError::NotFound(_)))
    ));
}

#[test]
fn test_transition_tool_definition() {
    let project = common::simple_project();
    let tools = project.tools();
    assert_eq!(tools.len(), 1);

    let tool = &tools[0];
    assert_eq!(tool.name(), "transition");
    assert_eq!(
        tool.action(),
        &ToolAction::Transition {
            graph: EntityRef::new("TestGraph", "test_graph")
        }
    );

    let definition = serde_json::to_value(tool.definition()).unwrap();
    assert_eq!(
        definition,
        json!({
            "name": "transition",
            "description": "Move along the test graph.",
            "parameters": {
                "type": "object",
                "properties": {
                    "to": {
                        "type": "string",
                        "description": "Target node.",
                        "enum": ["node_b"],
                    },
                },
                "required": ["to"],
                "additionalProperties": false,
            },
            "strict": true,
        })
    );
}

#[test]
fn test_node_without_edges_offers_no_tools() {
    let mut project = common::simple_project();
    project.transition("test_graph", "node_b").unwrap();
    assert!(project.tools().is_empty());
}

#[test]
fn test_tool_defaults_without_function_details() {
    let mut data = common::simple_project_data();
    data["entity_types"][0]["functions"] = json!([{ "target": "transition" }]);
    let project = Project::from_data(&data).unwrap();

    let tools = project.tools();
    let definition = tools[0].definition();
    assert_eq!(definition.name, "transition");
    assert_eq!(
        definition.description.as_deref(),
        Some("Transition to another graph node.")
    );
    assert_eq!(
        definition.parameters["properties"]["to"]["description"],
        "The node to transition to."
    );
}

#[test]
fn test_entity_functions_follow_type_functions() {
    let mut data = common::simple_project_data();
    data["entity_types"][0]["entities"][0]["functions"] =
        json!([{ "target": "transition", "name": "wander" }]);
    let project = Project::from_data(&data).unwrap();

    let names: Vec<_> = project.tools().iter().map(|t| t.name().to_string()).collect();
    assert_eq!(names, vec!["transition", "wander"]);
}

#[test]
fn test_graph_without_functions_offers_no_tools() {
    let mut data = common::simple_project_data();
    data["entity_types"][0]["functions"] = json!([]);
    let project = Project::from_data(&data).unwrap();
    assert!(project.tools().is_empty());
}

#[test]
fn test_call_tool() {
    let mut project = common::simple_project();

    let result = project.call_tool("transition", &json!({ "to": "node_b" }));
    assert_eq!(result, FunctionResult::Success);
    assert_eq!(current_node_id(&project), "node_b");

    // The tool is gone once node_b is reached.
    let result = project.call_tool("transition", &json!({ "to": "node_a" }));
    assert_eq!(result, FunctionResult::error("Unknown tool: transition"));
}

#[test]
fn test_call_tool_reports_errors() {
    let mut project = common::simple_project();
    let tool = project.tools().remove(0);

    let result = tool.call(&mut project, &json!({ "to": "node_z" }));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "result": "error",
            "reason": "node_z is not a valid transition for node node_a",
        })
    );

    let result = tool.call(&mut project, &json!({}));
    assert!(!result.is_success());
    assert_eq!(current_node_id(&project), "node_a");
}
