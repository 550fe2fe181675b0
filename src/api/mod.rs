//! HTTP shaping layer over the scheduler core. Routing and status codes
//! live here; all decisions are made by the core, which returns plain data.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::scheduler::Scheduler;
use crate::validate::{CreateJobRequest, ValidationResult};

#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Arc<Scheduler>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ValidationFailureResponse {
    error: &'static str,
    validation: ValidationResult,
}

#[derive(Deserialize)]
struct ResizePoolRequest {
    size: i64,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/jobs", post(create_job_handler))
        .route("/api/jobs", get(list_jobs_handler))
        .route("/api/jobs/{id}", get(get_job_handler))
        .route("/api/jobs/{id}", delete(delete_job_handler))
        .route("/api/jobs/{id}/cancel", post(cancel_job_handler))
        .route("/api/pool", get(pool_metrics_handler))
        .route("/api/pool", put(resize_pool_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: ApiState) {
    tracing::info!(addr = %addr, "Starting API server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind API server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::error!(error = %e, "API server failed");
    }
}

async fn create_job_handler(
    State(state): State<ApiState>,
    Json(request): Json<CreateJobRequest>,
) -> impl IntoResponse {
    match state.scheduler.create_job(request).await {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(validation) => (
            StatusCode::BAD_REQUEST,
            Json(ValidationFailureResponse {
                error: "validation failed",
                validation,
            }),
        )
            .into_response(),
    }
}

async fn list_jobs_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.scheduler.list_jobs().await)
}

async fn get_job_handler(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.scheduler.get_job(&id).await {
        Some(job) => Json(job).into_response(),
        None => not_found(id),
    }
}

async fn delete_job_handler(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.scheduler.delete_job(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => not_found(id),
    }
}

async fn cancel_job_handler(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.scheduler.cancel_job(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(_) => not_found(id),
    }
}

async fn pool_metrics_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.scheduler.metrics().await)
}

async fn resize_pool_handler(
    State(state): State<ApiState>,
    Json(request): Json<ResizePoolRequest>,
) -> impl IntoResponse {
    // The wire carries a signed size; anything non-positive is rejected
    // before it reaches the pool, which keeps its previous capacity.
    if request.size <= 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "pool size must be at least 1".to_string(),
            }),
        )
            .into_response();
    }

    match state.scheduler.resize_pool(request.size as usize).await {
        Ok(()) => Json(state.scheduler.metrics().await).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

fn not_found(id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Job not found: {id}"),
        }),
    )
        .into_response()
}
