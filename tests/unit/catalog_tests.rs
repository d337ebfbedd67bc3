//! Unit tests for the static tool registry.

use clocktower::mcp::tools;

#[test]
fn catalog_lists_both_tools_in_declaration_order() {
    let names: Vec<String> = tools::catalog()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();

    assert_eq!(names, vec!["get_current_time", "get_timezone_info"]);
}

#[test]
fn catalog_is_stable_across_calls() {
    let first: Vec<String> = tools::catalog()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();
    let second: Vec<String> = tools::catalog()
        .iter()
        .map(|tool| tool.name.to_string())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn every_descriptor_has_description_and_object_schema() {
    for tool in tools::catalog() {
        assert!(
            tool.description.is_some(),
            "{} is missing a description",
            tool.name
        );
        assert_eq!(
            tool.input_schema.get("type").and_then(|v| v.as_str()),
            Some("object"),
            "{} schema must be an object schema",
            tool.name
        );
    }
}

#[test]
fn current_time_schema_declares_the_format_enum() {
    let catalog = tools::catalog();
    let tool = catalog
        .iter()
        .find(|tool| tool.name == "get_current_time")
        .expect("tool registered");

    let formats: Vec<&str> = tool
        .input_schema
        .get("properties")
        .and_then(|v| v.get("format"))
        .and_then(|v| v.get("enum"))
        .and_then(|v| v.as_array())
        .expect("format enum declared")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();

    assert_eq!(formats, vec!["iso", "unix", "unix_ms", "human"]);
}

#[test]
fn is_known_matches_the_catalog() {
    assert!(tools::is_known("get_current_time"));
    assert!(tools::is_known("get_timezone_info"));
    assert!(!tools::is_known("does_not_exist"));
    assert!(!tools::is_known(""));
}
