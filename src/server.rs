//! Axum HTTP surface.
//!
//!   OPTIONS <any>   → 204 with CORS headers
//!   <any> /scores   → JSON `ScoresResponse`
//!   GET <other>     → usage hint
//!
//! Every JSON body is pretty-printed and carries CORS and caching headers.

use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::data::models::{ErrorBody, MessageBody};
use crate::pipeline::engine::ScoresEngine;

pub const SCORES_PATH: &str = "/scores";
const FAILURE_MESSAGE: &str = "Failed to fetch or parse source page.";

/// Shared state for the routes.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoresEngine>,
    pub allow_origin: String,
}

impl AppState {
    pub fn new(engine: ScoresEngine, allow_origin: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            allow_origin: allow_origin.into(),
        }
    }
}

/// Build the Axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(SCORES_PATH, any(scores))
        .fallback(other)
        .with_state(state)
}

/// Start the HTTP server; returns after Ctrl-C.
pub async fn serve(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = bind_addr, "scores relay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

async fn scores(method: Method, State(state): State<AppState>) -> Response {
    if method == Method::OPTIONS {
        return preflight(&state.allow_origin);
    }

    match state.engine.run(Utc::now()).await {
        Ok(body) => json_response(StatusCode::OK, &body, &state.allow_origin),
        Err(e) => {
            error!(error = %e, "Scores pipeline failed");
            let body = ErrorBody {
                ok: false,
                error: FAILURE_MESSAGE.to_string(),
                detail: e.to_string(),
            };
            json_response(StatusCode::INTERNAL_SERVER_ERROR, &body, &state.allow_origin)
        }
    }
}

async fn other(method: Method, State(state): State<AppState>) -> Response {
    if method == Method::OPTIONS {
        return preflight(&state.allow_origin);
    }

    let body = MessageBody {
        ok: true,
        message: "Use GET /scores".to_string(),
    };
    json_response(StatusCode::OK, &body, &state.allow_origin)
}

// --- Response helpers ---

fn preflight(allow_origin: &str) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    apply_cors(response.headers_mut(), allow_origin);
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: &T, allow_origin: &str) -> Response {
    let (status, payload) = match serde_json::to_string_pretty(body) {
        Ok(payload) => (status, payload),
        Err(e) => {
            error!(error = %e, "Response serialization failed");
            let fallback = format!(
                "{{\n  \"ok\": false,\n  \"error\": \"{FAILURE_MESSAGE}\",\n  \"detail\": \"serialization failed\"\n}}"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    };

    let mut response = (status, payload).into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=60"));
    apply_cors(headers, allow_origin);
    response
}

fn apply_cors(headers: &mut HeaderMap, allow_origin: &str) {
    let origin = HeaderValue::from_str(allow_origin).unwrap_or_else(|_| {
        warn!(allow_origin, "ALLOW_ORIGIN is not a valid header value, using *");
        HeaderValue::from_static("*")
    });
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
