//! HTTP surface: router, request context, and one thin handler per
//! endpoint. Handlers validate nothing themselves; they hand the raw
//! query parameters to the audit service and translate its result into
//! the wire envelope.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{self, AuthenticatedUser};
use crate::config::AppConfig;
use crate::domain::audit_service::{AuditService, RangeQuery};
use crate::error::ApiError;

/// Permission required by each financial endpoint. Checked against the
/// token's `permissions` claim; the `admin` role bypasses all of them.
const PERM_TRANSACTIONS: &str = "read:transactions";
const PERM_SUMMARY: &str = "read:summary";
const PERM_CASH_MOVEMENTS: &str = "read:cash_movements";
const PERM_CLOSURES: &str = "read:closures";
const PERM_ADJUSTMENTS: &str = "read:adjustments";

#[derive(Clone)]
pub struct AppState {
    pub audit: Arc<AuditService>,
    pub config: Arc<AppConfig>,
}

/// Per-request trace data, attached before authentication so even auth
/// failures carry a request id.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: String,
}

pub fn router(state: AppState) -> Router {
    let agent_routes = Router::new()
        .route("/transactions", get(get_transactions))
        .route("/daily-summary", get(get_daily_summary))
        .route("/cash-movements", get(get_cash_movements))
        .route("/closures", get(get_closures))
        .route("/manual-adjustments", get(get_manual_adjustments))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/info", get(api_info))
        .nest("/api/v1/agent", agent_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(request_context))
        .with_state(state)
}

/// Attach a request id and the client IP, and log the response status
/// with its latency once the inner stack is done.
async fn request_context(mut request: Request, next: Next) -> Response {
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| "0.0.0.0".to_string());

    let ctx = RequestContext {
        request_id: format!("req_{}", Uuid::new_v4().simple()),
        client_ip,
    };

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = ctx.request_id.clone();
    request.extensions_mut().insert(ctx);

    let started = Instant::now();
    let response = next.run(request).await;

    debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        request_id = %request_id,
        "response"
    );
    response
}

/// Raw range-endpoint parameters. Page and size stay strings so the
/// resolver, not the extractor, decides what counts as a valid number.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl From<RangeParams> for RangeQuery {
    fn from(params: RangeParams) -> Self {
        RangeQuery {
            from: params.from,
            to: params.to,
            page: params.page,
            size: params.size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub date: Option<String>,
}

pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<RangeParams>,
) -> Response {
    log_request("/api/v1/agent/transactions", &user, &ctx);
    if let Err(err) = user.authorize(PERM_TRANSACTIONS) {
        return respond_error(err, &ctx, &state);
    }
    match state.audit.transactions(&params.into()).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => respond_error(err, &ctx, &state),
    }
}

pub async fn get_daily_summary(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<SummaryParams>,
) -> Response {
    log_request("/api/v1/agent/daily-summary", &user, &ctx);
    if let Err(err) = user.authorize(PERM_SUMMARY) {
        return respond_error(err, &ctx, &state);
    }
    match state.audit.daily_summary(params.date.as_deref()).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => respond_error(err, &ctx, &state),
    }
}

pub async fn get_cash_movements(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<RangeParams>,
) -> Response {
    log_request("/api/v1/agent/cash-movements", &user, &ctx);
    if let Err(err) = user.authorize(PERM_CASH_MOVEMENTS) {
        return respond_error(err, &ctx, &state);
    }
    match state.audit.cash_movements(&params.into()).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => respond_error(err, &ctx, &state),
    }
}

pub async fn get_closures(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<RangeParams>,
) -> Response {
    log_request("/api/v1/agent/closures", &user, &ctx);
    if let Err(err) = user.authorize(PERM_CLOSURES) {
        return respond_error(err, &ctx, &state);
    }
    match state.audit.closures(&params.into()).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => respond_error(err, &ctx, &state),
    }
}

pub async fn get_manual_adjustments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<RangeParams>,
) -> Response {
    log_request("/api/v1/agent/manual-adjustments", &user, &ctx);
    if let Err(err) = user.authorize(PERM_ADJUSTMENTS) {
        return respond_error(err, &ctx, &state);
    }
    match state.audit.manual_adjustments(&params.into()).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => respond_error(err, &ctx, &state),
    }
}

async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "success": true,
        "status": "ok",
        "service": "ledger-audit-api",
        "version": state.config.api_version,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

async fn api_info(State(state): State<AppState>) -> Response {
    Json(json!({
        "success": true,
        "api": {
            "name": "ledger-audit-api",
            "version": state.config.api_version,
            "description": "Read-only audit API over the cash-desk ledger",
            "type": "READ ONLY",
        },
        "endpoints": {
            "transactions": "GET /api/v1/agent/transactions?from=YYYY-MM-DD&to=YYYY-MM-DD&page=1&size=50",
            "daily_summary": "GET /api/v1/agent/daily-summary?date=YYYY-MM-DD",
            "cash_movements": "GET /api/v1/agent/cash-movements?from=YYYY-MM-DD&to=YYYY-MM-DD&page=1&size=50",
            "closures": "GET /api/v1/agent/closures?from=YYYY-MM-DD&to=YYYY-MM-DD&page=1&size=50",
            "manual_adjustments": "GET /api/v1/agent/manual-adjustments?from=YYYY-MM-DD&to=YYYY-MM-DD&page=1&size=50",
        },
    }))
    .into_response()
}

async fn not_found(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
) -> Response {
    let request_id = ctx.map(|Extension(c)| c.request_id).unwrap_or_default();
    ApiError::NotFound.into_envelope(&request_id, state.config.environment.is_production())
}

fn log_request(path: &str, user: &AuthenticatedUser, ctx: &RequestContext) {
    info!(
        %path,
        user = %user.username,
        client_ip = %ctx.client_ip,
        request_id = %ctx.request_id,
        "api request"
    );
}

fn respond_error(err: ApiError, ctx: &RequestContext, state: &AppState) -> Response {
    match &err {
        ApiError::Store(_) => {
            error!(request_id = %ctx.request_id, error = %err, "store query failed");
        }
        ApiError::InsufficientPermissions => {
            warn!(
                client_ip = %ctx.client_ip,
                request_id = %ctx.request_id,
                "access denied"
            );
        }
        _ => {}
    }
    err.into_envelope(&ctx.request_id, state.config.environment.is_production())
}
