//! Tool registry and typed dispatch failures.

pub mod current_time;
pub mod timezone_info;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rmcp::model::Tool;

/// Full tool catalog in declaration order.
///
/// The catalog is static: the same descriptors, in the same order, on
/// every call.
#[must_use]
pub fn catalog() -> Vec<Tool> {
    vec![current_time::descriptor(), timezone_info::descriptor()]
}

/// Whether `name` refers to a registered tool.
#[must_use]
pub fn is_known(name: &str) -> bool {
    catalog().iter().any(|tool| tool.name == name)
}

/// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
pub(crate) fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
    match value {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::default()),
    }
}

/// Typed tool dispatch failure.
///
/// Translated into a protocol-level error frame at the handler boundary;
/// the two variants stay distinct all the way to the wire message.
#[derive(Debug)]
pub enum ToolError {
    /// Call named a tool that is not in the registry.
    UnknownTool(String),
    /// Tool input did not match the declared schema.
    InvalidArguments {
        /// Registered tool name.
        tool: &'static str,
        /// Deserialization failure detail.
        message: String,
    },
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTool(name) => write!(f, "unknown tool: {name}"),
            Self::InvalidArguments { tool, message } => {
                write!(f, "invalid arguments for {tool}: {message}")
            }
        }
    }
}

impl std::error::Error for ToolError {}

impl From<ToolError> for rmcp::ErrorData {
    fn from(err: ToolError) -> Self {
        rmcp::ErrorData::invalid_params(err.to_string(), None)
    }
}
