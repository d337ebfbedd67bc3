//! `get_current_time` tool: the current instant in a choice of formats.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{CallToolResult, Content, Tool};

use super::{schema, ToolError};
use crate::mcp::handler::ClockServer;

/// Wire name of this tool.
pub const NAME: &str = "get_current_time";

/// Supported output representations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// ISO 8601 / RFC 3339 in UTC with millisecond precision.
    #[default]
    Iso,
    /// Whole seconds since the Unix epoch.
    Unix,
    /// Milliseconds since the Unix epoch.
    UnixMs,
    /// Local date and time in prose, with the UTC offset.
    Human,
}

/// Input parameters per the declared schema.
#[derive(Debug, serde::Deserialize)]
struct CurrentTimeInput {
    /// Output representation; ISO 8601 when omitted.
    #[serde(default)]
    format: TimeFormat,
}

/// Tool descriptor advertised through `tools/list`.
#[must_use]
pub fn descriptor() -> Tool {
    Tool {
        name: NAME.into(),
        description: Some(
            "Get the current time. Defaults to ISO 8601 in UTC; other formats \
             are unix seconds, unix milliseconds, and a human-readable local \
             rendering."
                .into(),
        ),
        input_schema: schema(serde_json::json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "enum": ["iso", "unix", "unix_ms", "human"],
                    "default": "iso",
                    "description": "Output representation for the current time."
                }
            }
        })),
        output_schema: None,
        annotations: None,
        title: None,
        icons: None,
        meta: None,
    }
}

/// Handle the `get_current_time` tool call.
///
/// # Errors
///
/// Returns `rmcp::ErrorData` when the arguments do not match the declared
/// schema (an unknown `format` value, or a mistyped field).
pub async fn handle(
    context: ToolCallContext<'_, ClockServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let args: serde_json::Map<String, serde_json::Value> = context.arguments.unwrap_or_default();

    let input: CurrentTimeInput = serde_json::from_value(serde_json::Value::Object(args))
        .map_err(|err| {
            rmcp::ErrorData::from(ToolError::InvalidArguments {
                tool: NAME,
                message: err.to_string(),
            })
        })?;

    let rendered = render(input.format, Utc::now());
    Ok(CallToolResult::success(vec![Content::text(rendered)]))
}

/// Render `now` in the requested representation.
#[must_use]
pub fn render(format: TimeFormat, now: DateTime<Utc>) -> String {
    match format {
        TimeFormat::Iso => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        TimeFormat::Unix => now.timestamp().to_string(),
        TimeFormat::UnixMs => now.timestamp_millis().to_string(),
        TimeFormat::Human => now
            .with_timezone(&Local)
            .format("%A, %B %-d, %Y at %H:%M:%S %z")
            .to_string(),
    }
}
