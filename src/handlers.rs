use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::web;

pub const SERVICE_NAME: &str = "Basic Local AI";
const DEFAULT_LIMIT: usize = 20;
const DEFAULT_OFFSET: usize = 0;

#[derive(Debug, Default, Deserialize)]
struct GenerateBody {
    prompt: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "model": state.config.model_name,
        "total_conversations": state.log.count(),
        "storage_file": state.log.path().display().to_string(),
        "backend_reachable": state.gateway.backend_reachable().await,
    }))
}

/// The body is parsed leniently: anything that is not `{"prompt": "..."}`
/// counts as no prompt at all.
pub async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: GenerateBody = serde_json::from_slice(&body).unwrap_or_else(|e| {
        if !body.is_empty() {
            debug!("Ignoring unparseable generate body: {}", e);
        }
        GenerateBody::default()
    });

    let generation = state.gateway.generate(request.prompt).await?;

    Ok(Json(json!({
        "status": "success",
        "generated_text": generation.generated_text,
        "model": generation.model,
        "conversation_id": generation.conversation_id,
    })))
}

pub async fn generate_info() -> Json<Value> {
    Json(json!({
        "status": "info",
        "message": "Use POST /generate with JSON body: {\"prompt\": \"your text here\"}",
        "endpoints": {
            "POST /generate": "Generate text from prompt",
            "GET /generate": "This help message",
            "GET /health": "Health check",
            "GET /conversations": "View conversation history",
            "GET /conversations/{id}": "View a single conversation",
            "GET /": "Web interface"
        }
    }))
}

fn query_usize(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let limit = query_usize(&params, "limit", DEFAULT_LIMIT);
    let offset = query_usize(&params, "offset", DEFAULT_OFFSET);
    let page = state.log.page(limit, offset);

    Json(json!({
        "status": "success",
        "total": page.total,
        "limit": limit,
        "offset": offset,
        "conversations": page.records,
    }))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let conversation = id
        .parse::<u32>()
        .ok()
        .and_then(|id| state.log.get(id))
        .ok_or(ApiError::NotFound(id))?;

    Ok(Json(json!({
        "status": "success",
        "conversation": conversation,
    })))
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let recent = state.log.recent(web::RECENT_ON_PAGE);

    let page = web::render_index(
        &state.config.model_name,
        state.log.count(),
        &recent,
        &state.config.default_prompt,
    )?;
    Ok(Html(page))
}
