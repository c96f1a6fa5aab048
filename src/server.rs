use crate::{
    config::Config,
    errors::{into_response, AppError},
    mcp::{
        registry::{CallRequest, CallResponse, ToolRegistry},
        types::{Capabilities, ErrorObj},
    },
    security,
};
use anyhow::Context;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<ToolRegistry>,
}

pub async fn serve(cfg: Config, registry: ToolRegistry) -> anyhow::Result<()> {
    let shared = AppState { cfg: Arc::new(cfg), registry: Arc::new(registry) };

    let addr: std::net::SocketAddr = format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port)
        .parse()
        .context("parsing bind address")?;
    let app = build_router(shared);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    let base = shared.cfg.server.base_path.clone();
    let limit_bytes = shared.cfg.limits.max_request_kb * 1024;
    Router::new()
        .route("/healthz", get(health))
        .route(&format!("{base}/capabilities"), get(capabilities))
        .route(&format!("{base}/call"), post(call).layer(RequestBodyLimitLayer::new(limit_bytes)))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    match authorize(&state, &headers) {
        Ok(()) => (StatusCode::OK, Json(json!({"status":"ok"}))).into_response(),
        Err(e) => into_response(e).into_response(),
    }
}

async fn capabilities(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return into_response(e).into_response();
    }
    let caps = Capabilities { tools: state.registry.declarations() };
    (StatusCode::OK, Json(caps)).into_response()
}

async fn call(State(state): State<AppState>, headers: HeaderMap, Json(req): Json<CallRequest>) -> Response {
    let started = Instant::now();
    let audit = Audit {
        request_id: uuid::Uuid::new_v4().to_string(),
        origin: headers.get("Origin").and_then(|v| v.to_str().ok()).unwrap_or("").to_string(),
        token_present: security::extract_bearer(&headers).is_some(),
        tool: req.tool.clone(),
        started,
    };

    let checked = authorize(&state, &headers)
        .and_then(|()| security::content_length_ok(&headers, state.cfg.limits.max_request_kb));
    if let Err(e) = checked {
        audit.end("deny", e.code(), 0, None);
        return into_response(e).into_response();
    }

    match state.registry.call(&req.tool, req.params).await {
        Ok(text) => {
            // tool failures are ordinary results on the text channel
            let is_error = text.starts_with("Error:");
            let code = if is_error { "ToolError" } else { "OK" };
            let body = CallResponse { id: req.id, result: Some(text), error: None };
            let bytes_out = serde_json::to_vec(&body).map(|v| v.len()).unwrap_or(0) as u64;
            audit.end("allow", code, bytes_out, Some(is_error));
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            let decision = if matches!(e, AppError::UnknownTool(_)) { "deny" } else { "error" };
            let body = CallResponse {
                id: req.id,
                result: None,
                error: Some(ErrorObj { code: e.code().to_string(), message: e.to_string() }),
            };
            let bytes_out = serde_json::to_vec(&body).map(|v| v.len()).unwrap_or(0) as u64;
            audit.end(decision, e.code(), bytes_out, None);
            (e.status(), Json(body)).into_response()
        }
    }
}

struct Audit {
    request_id: String,
    origin: String,
    token_present: bool,
    tool: String,
    started: Instant,
}

impl Audit {
    fn end(&self, decision: &str, code: &str, bytes_out: u64, is_error: Option<bool>) {
        tracing::info!(
            request_id = %self.request_id,
            origin = %self.origin,
            token_present = self.token_present,
            tool = %self.tool,
            decision = decision,
            code = code,
            duration_ms = self.started.elapsed().as_millis() as u64,
            bytes_out = bytes_out,
            is_error = ?is_error,
            "audit"
        );
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    security::require_bearer(headers, &state.cfg.auth.bearer_token)?;
    security::check_origin(headers, &state.cfg.auth.allowed_origins)?;
    Ok(())
}
