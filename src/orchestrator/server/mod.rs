// SPDX-License-Identifier: MIT

//! JSON-over-HTTP binding of the registry
//!
//! Public routes accept expressions and report their status; the
//! `/internal/task` route is the worker pull endpoint.

mod error;

pub use error::ApiError;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};

use super::registry::Registry;
use super::types::{
    CalculateRequest, CalculateResponse, ExpressionEnvelope, ExpressionList, TaskEnvelope,
    TaskReport,
};
use crate::calc::error::Result;
use crate::calc::graph::ExpressionId;

/// Build the application router around a shared registry
pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/v1/calculate", post(calculate))
        .route("/api/v1/expressions", get(list_expressions))
        .route("/api/v1/expressions/{id}", get(get_expression))
        .route("/internal/task", get(poll_task).post(report_task))
        .layer(
            TraceLayer::new_for_http()
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(registry: Registry, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn health_check(State(registry): State<Registry>) -> Json<Value> {
    let stats = registry.stats().await;
    Json(json!({ "status": "ok", "stats": stats }))
}

async fn calculate(
    State(registry): State<Registry>,
    payload: std::result::Result<Json<CalculateRequest>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<CalculateResponse>), ApiError> {
    let Json(request) = payload?;
    let id = registry.submit_text(&request.expression).await?;
    Ok((StatusCode::CREATED, Json(CalculateResponse { id })))
}

async fn list_expressions(State(registry): State<Registry>) -> Json<ExpressionList> {
    Json(ExpressionList {
        expressions: registry.list_expressions().await,
    })
}

async fn get_expression(
    State(registry): State<Registry>,
    id: std::result::Result<Path<ExpressionId>, PathRejection>,
) -> std::result::Result<Json<ExpressionEnvelope>, ApiError> {
    let Path(id) = id?;
    let expression = registry.get_expression(id).await?;
    Ok(Json(ExpressionEnvelope { expression }))
}

async fn poll_task(
    State(registry): State<Registry>,
) -> std::result::Result<Json<TaskEnvelope>, ApiError> {
    let task = registry
        .next_ready_task()
        .await
        .ok_or(ApiError::NoTaskAvailable)?;
    Ok(Json(TaskEnvelope { task }))
}

async fn report_task(
    State(registry): State<Registry>,
    payload: std::result::Result<Json<TaskReport>, JsonRejection>,
) -> std::result::Result<StatusCode, ApiError> {
    let Json(report) = payload?;
    let outcome = report.outcome().ok_or_else(|| {
        ApiError::InvalidBody("exactly one of `result` or `error` is required".to_string())
    })?;
    registry.complete_task(report.id, outcome).await?;
    Ok(StatusCode::OK)
}
