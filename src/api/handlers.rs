//! HTTP request handlers for the Labor Cost Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::run_payroll;
use crate::config::{ConfigLoader, PeriodSnapshot};
use crate::error::{EngineError, EngineResult};
use crate::models::{PayrollComputation, PayrollPeriod};
use crate::store::PayrollPeriodStore;

use super::request::{ComputeRequest, OpenPeriodRequest};
use super::response::{
    ApiError, ApiErrorResponse, ComputationResponse, PeriodResponse, ReplayResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/periods", post(open_period_handler))
        .route("/periods/:id", get(get_period_handler))
        .route("/periods/:id/compute", post(compute_handler))
        .route("/periods/:id/finalize", post(finalize_handler))
        .route("/periods/:id/replay", post(replay_handler))
        .with_state(state)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], Json(body)).into_response()
}

fn engine_error_response(correlation_id: Uuid, err: EngineError) -> Response {
    warn!(correlation_id = %correlation_id, error = %err, "Request failed");
    let api_error: ApiErrorResponse = err.into();
    json_response(api_error.status, api_error.error)
}

fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's description of the bad field.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    json_response(StatusCode::BAD_REQUEST, error)
}

/// Handler for POST /periods.
async fn open_period_handler(
    State(state): State<AppState>,
    payload: Result<Json<OpenPeriodRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    info!(correlation_id = %correlation_id, period_id = %request.id, "Opening payroll period");

    let result = request.into_period().and_then(|period| {
        state.store().open(period.clone())?;
        Ok(period)
    });

    match result {
        Ok(period) => json_response(
            StatusCode::CREATED,
            PeriodResponse {
                period,
                rate_version: None,
                digest: None,
                finalized_at: None,
                computation: None,
            },
        ),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for GET /periods/:id.
async fn get_period_handler(State(state): State<AppState>, Path(period_id): Path<String>) -> Response {
    let correlation_id = Uuid::new_v4();
    match state.store().get(&period_id) {
        Ok(stored) => json_response(StatusCode::OK, PeriodResponse::from(stored)),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Computes a period against the currently effective configuration.
fn preview(
    config: &ConfigLoader,
    store: &PayrollPeriodStore,
    period_id: &str,
    request: ComputeRequest,
) -> EngineResult<(PayrollPeriod, PeriodSnapshot, PayrollComputation)> {
    let period = store.period(period_id)?;
    if period.is_finalized() {
        return Err(EngineError::PeriodFinalized {
            period_id: period.id,
        });
    }

    let snapshot = config.snapshot_for(&period)?;
    let computation = run_payroll(
        &period,
        &snapshot,
        request.attendance,
        &request.assignments,
        request.work_orders.as_deref(),
    )?;
    Ok((period, snapshot, computation))
}

/// Handler for POST /periods/:id/compute.
///
/// Returns the computed line items without persisting them.
async fn compute_handler(
    State(state): State<AppState>,
    Path(period_id): Path<String>,
    payload: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    info!(
        correlation_id = %correlation_id,
        period_id = %period_id,
        records = request.attendance.len(),
        "Processing compute request"
    );

    let start_time = Instant::now();
    let result = preview(state.config(), state.store(), &period_id, request).and_then(
        |(period, snapshot, computation)| {
            Ok(ComputationResponse {
                period,
                snapshot_digest: snapshot.digest()?,
                computation,
            })
        },
    );

    match result {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                period_id = %period_id,
                line_items = response.computation.line_items.len(),
                grand_total = %response.computation.grand_total(),
                duration_us = start_time.elapsed().as_micros(),
                "Computation completed successfully"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /periods/:id/finalize.
///
/// Computes the period and stores the result with its snapshot.
async fn finalize_handler(
    State(state): State<AppState>,
    Path(period_id): Path<String>,
    payload: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    info!(correlation_id = %correlation_id, period_id = %period_id, "Processing finalize request");

    let store = state.store();
    let result = preview(state.config(), store, &period_id, request).and_then(
        |(_, snapshot, computation)| {
            let snapshot_digest = snapshot.digest()?;
            let finalized = store.finalize(&period_id, snapshot, computation)?;
            Ok(ComputationResponse {
                period: store.period(&period_id)?,
                snapshot_digest,
                computation: finalized.computation,
            })
        },
    );

    match result {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                period_id = %period_id,
                digest = %response.computation.digest,
                "Period finalized"
            );
            json_response(StatusCode::OK, response)
        }
        Err(err) => engine_error_response(correlation_id, err),
    }
}

/// Handler for POST /periods/:id/replay.
///
/// Recomputes a finalized period with its pinned snapshot and reports
/// whether the result matches the stored one.
async fn replay_handler(
    State(state): State<AppState>,
    Path(period_id): Path<String>,
    payload: Result<Json<ComputeRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };
    info!(correlation_id = %correlation_id, period_id = %period_id, "Processing replay request");

    match state.store().verify_replay(
        &period_id,
        request.attendance,
        &request.assignments,
        request.work_orders.as_deref(),
    ) {
        Ok(outcome) => json_response(StatusCode::OK, ReplayResponse { outcome }),
        Err(err) => engine_error_response(correlation_id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/default").expect("Failed to load config");
        AppState::new(config)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn compute_body() -> serde_json::Value {
        serde_json::json!({
            "assignments": [{ "employee_id": "emp_001", "role_code": "mandor" }],
            "attendance": [{
                "employee_id": "emp_001",
                "date": "2026-01-13",
                "work_order_id": "SPK-001",
                "regular_hours": "8",
                "overtime_hours": "3"
            }]
        })
    }

    async fn open_january(state: &AppState) {
        let app = create_router(state.clone());
        let response = app
            .oneshot(post_json(
                "/periods",
                serde_json::json!({
                    "id": "2026-01",
                    "start_date": "2026-01-01",
                    "end_date": "2026-01-31"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_open_period_returns_201() {
        let state = create_test_state();
        open_january(&state).await;
        assert!(state.store().get("2026-01").is_ok());
    }

    #[tokio::test]
    async fn test_open_duplicate_period_returns_409() {
        let state = create_test_state();
        open_january(&state).await;

        let response = create_router(state)
            .oneshot(post_json(
                "/periods",
                serde_json::json!({
                    "id": "2026-01",
                    "start_date": "2026-01-01",
                    "end_date": "2026-01-31"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["code"], "PERIOD_ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let state = create_test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/periods")
            .header("Content-Type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();

        let response = create_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let state = create_test_state();
        let response = create_router(state)
            .oneshot(post_json(
                "/periods",
                serde_json::json!({ "id": "2026-01", "start_date": "2026-01-01" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_compute_does_not_persist() {
        let state = create_test_state();
        open_january(&state).await;

        let response = create_router(state.clone())
            .oneshot(post_json("/periods/2026-01/compute", compute_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["computation"]["rate_version"], "2026.1");
        assert_eq!(body["computation"]["line_items"][0]["grand_total"], "6700000.00");
        assert!(!state.store().period("2026-01").unwrap().is_finalized());
    }

    #[tokio::test]
    async fn test_compute_unknown_period_returns_404() {
        let state = create_test_state();
        let response = create_router(state)
            .oneshot(post_json("/periods/2030-01/compute", compute_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_finalize_twice_returns_409() {
        let state = create_test_state();
        open_january(&state).await;

        let first = create_router(state.clone())
            .oneshot(post_json("/periods/2026-01/finalize", compute_body()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = create_router(state)
            .oneshot(post_json("/periods/2026-01/finalize", compute_body()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = body_json(second).await;
        assert_eq!(body["code"], "PERIOD_FINALIZED");
        assert_eq!(body["details"]["period_id"], "2026-01");
    }
}
