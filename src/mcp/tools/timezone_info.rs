//! `get_timezone_info` tool: the server's timezone and clock readings.

use chrono::{DateTime, FixedOffset, Local, Utc};
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{CallToolResult, Content, Tool};
use tracing::warn;

use super::schema;
use crate::mcp::handler::ClockServer;

/// Wire name of this tool.
pub const NAME: &str = "get_timezone_info";

/// Tool descriptor advertised through `tools/list`.
#[must_use]
pub fn descriptor() -> Tool {
    Tool {
        name: NAME.into(),
        description: Some(
            "Get the server's timezone: IANA name, UTC offset, and the current \
             local and UTC times."
                .into(),
        ),
        input_schema: schema(serde_json::json!({
            "type": "object",
            "properties": {}
        })),
        output_schema: None,
        annotations: None,
        title: None,
        icons: None,
        meta: None,
    }
}

/// Handle the `get_timezone_info` tool call.
///
/// # Errors
///
/// Infallible in practice; the signature matches the router contract.
pub async fn handle(
    _context: ToolCallContext<'_, ClockServer>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let zone = iana_time_zone::get_timezone().unwrap_or_else(|err| {
        warn!(%err, "system timezone lookup failed, reporting UTC");
        "UTC".to_owned()
    });

    let rendered = render(&zone, Local::now().fixed_offset());
    Ok(CallToolResult::success(vec![Content::text(rendered)]))
}

/// Render the four-line timezone report for `now`.
#[must_use]
pub fn render(zone: &str, now: DateTime<FixedOffset>) -> String {
    let offset_seconds = now.offset().local_minus_utc();
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let magnitude = offset_seconds.unsigned_abs();
    let hours = magnitude / 3600;
    let minutes = (magnitude % 3600) / 60;

    format!(
        "Timezone: {zone}\n\
         UTC offset: {sign}{hours:02}:{minutes:02}\n\
         Local time: {local}\n\
         UTC time: {utc}",
        local = now.format("%Y-%m-%d %H:%M:%S"),
        utc = now.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S"),
    )
}
