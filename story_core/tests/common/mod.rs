//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{json, Value};
use story_core::Project;

/// A `TestGraph` over four `TestNode` nodes.
///
/// `node_a` is enabled and leads to `node_b`; `node_b` is disabled and has no edges;
/// `node_c` and `node_d` mirror `node_a` and `node_b` through their `enabled` conditions.
pub fn simple_project_data() -> Value {
    json!({
        "title": "Test Project",
        "author": "Test Author",
        "description": "A project for tests",
        "entity_types": [
            {
                "id": "TestGraph",
                "name": "Test Graph",
                "traits": [
                    "described",
                    { "name": "graph", "options": { "node_type_id": "TestNode" } },
                ],
                "functions": [
                    {
                        "target": "transition",
                        "name": "transition",
                        "description": "Move along the test graph.",
                        "properties": { "to": "Target node." },
                    },
                ],
                "entities": [
                    {
                        "id": "test_graph",
                        "name": "Test Graph",
                        "description": "A test graph",
                        "node_ids": ["node_a", "node_b"],
                        "current_node_id": "node_a",
                    },
                ],
            },
            {
                "id": "TestNode",
                "name": "Test Node",
                "instructions": "Nodes of the test graph.",
                "traits": ["described", "graph_node"],
                "entities": [
                    {
                        "id": "node_a",
                        "name": "Node A",
                        "description": "First node",
                        "enabled": { "value": true },
                        "edge_ids": ["node_b"],
                    },
                    {
                        "id": "node_b",
                        "name": "Node B",
                        "description": "Second node",
                        "enabled": { "value": false },
                        "edge_ids": [],
                    },
                    {
                        "id": "node_c",
                        "name": "Node C",
                        "description": "Third node",
                        "enabled": "node_a.enabled",
                    },
                    {
                        "id": "node_d",
                        "name": "Node D",
                        "description": "Fourth node",
                        "enabled": "node_b.enabled",
                    },
                ],
            },
        ],
    })
}

pub fn simple_project() -> Project {
    Project::from_data(&simple_project_data()).expect("simple project loads")
}

/// Replace the `enabled` condition of `node_id` in the simple project data.
pub fn with_enabled(mut data: Value, node_id: &str, enabled: Value) -> Value {
    if let Some(entities) = data["entity_types"][1]["entities"].as_array_mut() {
        for entity in entities {
            if entity["id"] == node_id {
                entity["enabled"] = enabled.clone();
            }
        }
    }
    data
}

pub fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
