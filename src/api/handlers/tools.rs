//! Tool discovery and invocation
//!
//! Lets an agent runtime that speaks HTTP call the same tools the CLI does.

use crate::{
    AppState,
    types::{AppError, ErrorResponse, Result, ToolDefinition},
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde_json::Value;

/// List registered tools with their JSON Schema parameters
#[utoipa::path(
    get,
    path = "/api/tools",
    responses(
        (status = 200, description = "Tool definitions, sorted by name", body = Vec<ToolDefinition>)
    ),
    tag = "tools"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    Json(state.tool_registry.get_tool_definitions())
}

/// Call a tool by name
///
/// The body is the tool's argument object; an empty body means no arguments.
/// Tool failures are reported inside the envelope with a 200 status.
#[utoipa::path(
    post,
    path = "/api/tools/{name}",
    request_body(content = Object, description = "Tool arguments", content_type = "application/json"),
    params(
        ("name" = String, Path, description = "Tool name")
    ),
    responses(
        (status = 200, description = "Result envelope with a `success` flag", body = Object),
        (status = 400, description = "Body is not JSON", body = ErrorResponse),
        (status = 404, description = "Tool not found", body = ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Request body is not valid JSON: {}", e)))?
    };

    tracing::info!(tool = %name, "Tool call via API");

    Ok(Json(state.tool_registry.execute(&name, args).await?))
}
