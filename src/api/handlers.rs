use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::audit::{render_markdown, AuditEngine, IssueSink, PatternSet};
use crate::types::{AuditReport, AuditRequest, ConsoleEvent, LeakNotice, PagewatchError};
use crate::AppState;

/// Resource type the collector reports for top-level documents
const MAIN_FRAME: &str = "main_frame";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub policy_rules: usize,
    pub sensitive_patterns: usize,
    pub cached_tabs: usize,
    pub auth: String,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        policy_rules: state.policy.len(),
        sensitive_patterns: PatternSet::builtin().len(),
        cached_tabs: state.header_cache.len().await,
        auth: if state.config.api_key.is_some() {
            "api_key".to_string()
        } else {
            "open".to_string()
        },
    })
}

/// Build the report for one request. Each run gets its own sink.
async fn run_audit(state: &AppState, request: AuditRequest) -> Result<AuditReport, PagewatchError> {
    let context = request
        .context()
        .map_err(|e| PagewatchError::InvalidRequest(format!("Invalid page_url: {}", e)))?;

    let headers = match (&request.headers, request.tab_id) {
        (Some(headers), _) => headers.clone(),
        (None, Some(tab_id)) => state
            .header_cache
            .get(tab_id)
            .await
            .ok_or(PagewatchError::TabNotFound(tab_id))?,
        // Nothing collected: every required header is reported missing
        (None, None) => Default::default(),
    };

    let engine = AuditEngine::new(state.policy.clone(), Arc::new(IssueSink::new()));
    let artifacts = request.into_artifacts(context, headers);
    Ok(engine.run(&artifacts))
}

/// POST /audit
pub async fn request_audit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<AuditReport>, PagewatchError> {
    let report = run_audit(&state, request).await?;
    Ok(Json(report))
}

/// POST /audit/report
pub async fn request_audit_markdown(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuditRequest>,
) -> Result<([(header::HeaderName, &'static str); 1], String), PagewatchError> {
    let report = run_audit(&state, request).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_markdown(&report),
    ))
}

#[derive(Debug, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Headers observed by the collector for one response
#[derive(Debug, Deserialize)]
pub struct HeaderCapture {
    #[serde(default, alias = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
}

/// PUT /tabs/:tab_id/headers
pub async fn record_headers(
    State(state): State<Arc<AppState>>,
    Path(tab_id): Path<u64>,
    Json(capture): Json<HeaderCapture>,
) -> StatusCode {
    if let Some(resource_type) = capture.resource_type.as_deref() {
        if resource_type != MAIN_FRAME {
            debug!("Ignoring {} headers for tab {}", resource_type, tab_id);
            return StatusCode::ACCEPTED;
        }
    }

    state
        .header_cache
        .record(
            tab_id,
            capture.headers.into_iter().map(|h| (h.name, h.value)),
        )
        .await;

    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
pub struct TabHeadersResponse {
    pub tab_id: u64,
    pub headers: std::collections::HashMap<String, String>,
}

/// GET /tabs/:tab_id/headers
pub async fn get_headers(
    State(state): State<Arc<AppState>>,
    Path(tab_id): Path<u64>,
) -> Result<Json<TabHeadersResponse>, PagewatchError> {
    let headers = state
        .header_cache
        .get(tab_id)
        .await
        .ok_or(PagewatchError::TabNotFound(tab_id))?;

    Ok(Json(TabHeadersResponse { tab_id, headers }))
}

/// DELETE /tabs/:tab_id
pub async fn remove_tab(State(state): State<Arc<AppState>>, Path(tab_id): Path<u64>) -> StatusCode {
    if state.header_cache.remove(tab_id).await {
        info!("Tab {} closed, headers evicted", tab_id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Serialize)]
pub struct ConsoleResponse {
    pub leak: Option<LeakNotice>,
}

/// POST /console
pub async fn console_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<ConsoleEvent>,
) -> Json<ConsoleResponse> {
    let intercepted = state.console.intercept(&event);
    Json(ConsoleResponse {
        leak: intercepted.notice,
    })
}
