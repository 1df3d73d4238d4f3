//! REST front of a [`DocumentStore`].
//!
//! - `GET /{kind}` lists documents as `[{"id": .., "fields": {..}}]`
//! - `POST /{kind}` stores the body object and answers `201 {"id": ..}`
//! - `PUT /{kind}/{id}` replaces the document's fields, `204`
//! - `DELETE /{kind}/{id}` removes the document, `204`

use crate::core::{EntityInstance, EntityKind, Fields, StoreError};
use crate::storage::DocumentStore;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

type SharedStore = Arc<dyn DocumentStore>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub id: String,
}

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    UnknownKind(String),
    Input(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            ApiError::Store(err @ StoreError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, err.to_string(), "not_found")
            }
            ApiError::Store(err @ StoreError::WriteRejected(_)) => {
                (StatusCode::CONFLICT, err.to_string(), "write_rejected")
            }
            ApiError::Store(err @ StoreError::StoreUnavailable(_)) => {
                error!(error = %err, "store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string(), "unavailable")
            }
            ApiError::UnknownKind(kind) => (
                StatusCode::NOT_FOUND,
                format!("Unknown collection '{}'", kind),
                "unknown_collection",
            ),
            ApiError::Input(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, "input_error"),
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_kind(raw: &str) -> ApiResult<EntityKind> {
    raw.parse()
        .map_err(|_| ApiError::UnknownKind(raw.to_string()))
}

fn into_fields(body: JsonValue) -> ApiResult<Fields> {
    match body {
        JsonValue::Object(fields) => Ok(fields),
        other => Err(ApiError::Input(format!(
            "document body must be a JSON object, got {}",
            other
        ))),
    }
}

async fn list(
    State(store): State<SharedStore>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Vec<EntityInstance>>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(store.list_all(kind).await?))
}

async fn create(
    State(store): State<SharedStore>,
    Path(kind): Path<String>,
    Json(body): Json<JsonValue>,
) -> ApiResult<(StatusCode, Json<InsertResponse>)> {
    let kind = parse_kind(&kind)?;
    let id = store.insert(kind, into_fields(body)?).await?;
    Ok((StatusCode::CREATED, Json(InsertResponse { id })))
}

async fn replace(
    State(store): State<SharedStore>,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    store.update(kind, &id, into_fields(body)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove(
    State(store): State<SharedStore>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    store.delete(kind, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/:kind", get(list).post(create))
        .route("/:kind/:id", put(replace).delete(remove))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Serves `store` on `addr` until Ctrl+C.
pub async fn serve(addr: SocketAddr, store: SharedStore) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "document server listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "unable to install Ctrl+C signal handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
