mod common;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use story_core::{FunctionResult, Project, ProjectConfig, ProjectError, TraitRegistry};

fn node_context(id: &str, name: &str, description: &str, enabled: bool, edges: Value) -> Value {
    json!({
        "id": id,
        "entity_type_id": "TestNode",
        "name": name,
        "description": description,
        "enabled": enabled,
        "edges": edges,
    })
}

#[test]
fn test_template_context() {
    let project = common::simple_project();
    let context = project.template_context().unwrap();

    let node_a = node_context("node_a", "Node A", "First node", true, json!(["node_b"]));
    let node_b = node_context("node_b", "Node B", "Second node", false, json!([]));
    let node_c = node_context("node_c", "Node C", "Third node", true, json!([]));
    let node_d = node_context("node_d", "Node D", "Fourth node", false, json!([]));

    assert_eq!(
        Value::Object(context),
        json!({
            "title": "Test Project",
            "description": "A project for tests",
            "author": "Test Author",
            "entity_types": [
                {
                    "id": "TestGraph",
                    "name": "Test Graph",
                    "instructions": null,
                    "traits": ["described", "graph"],
                    "entities": [
                        {
                            "id": "test_graph",
                            "entity_type_id": "TestGraph",
                            "name": "Test Graph",
                            "description": "A test graph",
                            "enabled": true,
                            "nodes": [node_a.clone(), node_b],
                            "current_node": node_a.clone(),
                        },
                    ],
                },
                {
                    "id": "TestNode",
                    "name": "Test Node",
                    "instructions": "Nodes of the test graph.",
                    "traits": ["described", "graph_node"],
                    "entities": [
                        node_a,
                        node_context("node_b", "Node B", "Second node", false, json!([])),
                        node_c,
                        node_d,
                    ],
                },
            ],
        })
    );
}

#[test]
fn test_template_context_follows_transitions() {
    let mut project = common::simple_project();
    project.transition("test_graph", "node_b").unwrap();

    let graph = project.get_entity("test_graph").unwrap();
    let context = graph.template_context(&project).unwrap();
    assert_eq!(context["current_node"]["id"], "node_b");
}

#[test]
fn test_load_broken_bulb() {
    let mut project = Project::from_path(common::fixture_dir("broken_bulb")).unwrap();

    assert_eq!(project.title(), "The Broken Bulb");
    assert_eq!(project.author(), Some("Gamebook Authors"));
    let type_ids: Vec<_> = project.entity_types().map(|t| t.id().to_string()).collect();
    assert_eq!(
        type_ids,
        vec!["Location", "LocationMap", "StoryArcNode", "StoryArc"]
    );
    assert!(project.get_entity("living_room").is_ok());

    let evaluator = project.evaluator();
    let leaflet = project.get_entity("leaflet_placed").unwrap();
    let enabled = &leaflet.described().unwrap().enabled;
    assert_eq!(evaluator.entity_enabled(leaflet, enabled), Ok(false));

    let names: Vec<_> = project.tools().iter().map(|t| t.name().to_string()).collect();
    assert_eq!(names, vec!["change_location", "progress_the_meeting_story"]);

    let result = project.call_tool("change_location", &json!({ "to": "living_room" }));
    assert_eq!(result, FunctionResult::Success);

    let leaflet = project.get_entity("leaflet_placed").unwrap();
    let enabled = &leaflet.described().unwrap().enabled;
    assert_eq!(project.evaluator().entity_enabled(leaflet, enabled), Ok(true));

    let result = project.call_tool("progress_the_meeting_story", &json!({ "to": "leaflet_found" }));
    assert_eq!(result, FunctionResult::Success);

    let names: Vec<_> = project.tools().iter().map(|t| t.name().to_string()).collect();
    assert_eq!(names, vec!["change_location"]);
    assert_eq!(
        project.tools()[0].definition().parameters["properties"]["to"]["enum"],
        json!(["bedroom"])
    );
}

#[test]
fn test_load_toml_project() {
    let project = Project::from_path(common::fixture_dir("toml_story")).unwrap();

    assert_eq!(project.title(), "Two Rooms");
    assert!(project.get_entity_type("House").is_ok());

    let study = project.get_entity("study").unwrap();
    let context = study.template_context(&project).unwrap();
    assert_eq!(context["enabled"], true);

    let tools = project.tools();
    assert_eq!(tools.len(), 1);
    assert_eq!(
        tools[0].definition().description.as_deref(),
        Some("Walk to another room.")
    );
}

#[test]
fn test_custom_project_file_stem() {
    let config = ProjectConfig::default().with_project_file_stem("story");
    let err = Project::from_path_with(
        common::fixture_dir("broken_bulb"),
        &TraitRegistry::default(),
        config,
    )
    .unwrap_err();
    assert!(matches!(err, ProjectError::FileNotFound(ref path) if path.ends_with("story.yaml")));
}

#[test]
fn test_invalid_project_reports_every_problem() {
    let err = Project::from_path(common::fixture_dir("invalid_story")).unwrap_err();

    let ProjectError::Schema(schema_error) = &err else {
        panic!("expected a schema error, got {err:?}");
    };
    let errors = schema_error.validation_errors().unwrap();
    let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "entity_types[0].traits[1].name",
            "entity_types[0].entities[1].id",
            "entity_types[1].id",
        ]
    );
    assert!(err
        .to_string()
        .starts_with("Multiple validation errors (3 issues):"));
}

#[test]
fn test_from_data_rejects_non_mappings() {
    let err = Project::from_data(&json!(["not", "a", "project"])).unwrap_err();
    assert!(err.to_string().contains("Expected a mapping for the project"));
}

#[test]
fn test_type_ids_derived_from_short_names() {
    let data = json!({
        "title": "Ids",
        "entity_types": [{ "name": "X Y", "traits": ["described"], "entities": [] }],
    });
    let project = Project::from_data(&data).unwrap();
    assert!(project.get_entity_type("Xy").is_ok());
}
