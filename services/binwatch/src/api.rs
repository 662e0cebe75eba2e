//! Single JSON endpoint dispatching on the `action` parameter

use std::any::Any;
use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::action::{Action, Params};
use crate::envelope::{ActionOutcome, Envelope};
use crate::error::{ApiError, StoreContext};
use crate::store::Store;
use crate::Settings;

/// Path of the action endpoint
pub const API_PATH: &str = "/api";

/// State shared by all requests. Nothing in here is mutated per request.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub store: Store,
    pub settings: Arc<Settings>,
}

/// How the request arrived, which decides the store session it gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// GET: pooled connection, no transaction
    Read,
    /// POST: everything runs in one transaction
    Write,
}

/// Build the axum router
pub fn build_router(state: ApiState) -> Router {
    with_middleware(
        Router::new()
            .route(API_PATH, get(get_action).post(post_action))
            .route("/health", get(health_handler))
            .with_state(state),
    )
}

fn with_middleware(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn get_action(State(state): State<ApiState>, Query(params): Query<Params>) -> Response {
    respond(&state, RequestMode::Read, params).await
}

async fn post_action(
    State(state): State<ApiState>,
    Query(query): Query<Params>,
    request: Request,
) -> Response {
    let mut params = match body_params(request).await {
        Ok(params) => params,
        Err(e) => return e.into_response(),
    };
    // `action` may also ride on the query string of a POST
    if let Some(action) = query.get("action") {
        params
            .entry("action".to_string())
            .or_insert_with(|| action.clone());
    }
    respond(&state, RequestMode::Write, params).await
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

/// Read a urlencoded or multipart body into flat parameters. A body without
/// a content type is treated as empty.
async fn body_params(request: Request) -> Result<Params, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase);

    match content_type {
        None => Ok(Params::new()),
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let mut multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed request body: {}", e)))?;
            let mut params = Params::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed request body: {}", e)))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Malformed request body: {}", e)))?;
                params.insert(name, value);
            }
            Ok(params)
        }
        Some(_) => {
            let Form(params) = Form::<Params>::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed request body: {}", e)))?;
            Ok(params)
        }
    }
}

/// Run one request to completion and render the envelope
pub async fn respond(state: &ApiState, mode: RequestMode, params: Params) -> Response {
    match dispatch(state, mode, &params).await {
        Ok(outcome) => (StatusCode::OK, Json(Envelope::from(outcome))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Parse, open the session the mode calls for, and execute.
///
/// Write sessions commit only when the action succeeds; any error rolls
/// back, and a panic drops the transaction which rolls back as well.
pub async fn dispatch(
    state: &ApiState,
    mode: RequestMode,
    params: &Params,
) -> Result<ActionOutcome, ApiError> {
    let action = Action::from_params(params)?;
    let name = action.name();

    if mode == RequestMode::Read && action.is_write() {
        return Err(ApiError::BadRequest(format!(
            "Invalid request method for {}. POST required.",
            name
        )));
    }

    match mode {
        RequestMode::Read => {
            let mut conn = state.store.acquire().await.map_err(ApiError::Connection)?;
            action.run(&mut conn, &state.settings).await
        }
        RequestMode::Write => {
            let mut tx = state.store.begin().await.map_err(ApiError::Connection)?;
            match action.run(&mut tx, &state.settings).await {
                Ok(outcome) => {
                    tx.commit().await.store_context("Error committing changes")?;
                    tracing::debug!("Transaction committed for action: {}", name);
                    Ok(outcome)
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        tracing::error!("Rollback failed for action {}: {}", name, rollback);
                    }
                    tracing::warn!("Transaction rolled back for action {}: {}", name, e);
                    Err(e)
                }
            }
        }
    }
}

fn panic_response(detail: Box<dyn Any + Send + 'static>) -> Response {
    let detail = detail
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| detail.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Request handler panicked: {}", detail);
    ApiError::Internal.into_response()
}
