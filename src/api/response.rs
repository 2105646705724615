//! Response types for the Labor Cost Engine API.
//!
//! This module defines the success bodies, the error response structures and
//! the mapping from [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{PayrollComputation, PayrollPeriod};
use crate::store::{ReplayOutcome, StoredPeriod};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Identity of the offending record, role, tier or period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, code, details) = match error {
            EngineError::ConfigNotFound { path } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                serde_json::json!({ "path": path }),
            ),
            EngineError::ConfigParseError { path, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                serde_json::json!({ "path": path }),
            ),
            EngineError::InvalidAttendance { record, violation } => (
                StatusCode::BAD_REQUEST,
                "INVALID_ATTENDANCE",
                serde_json::json!({ "record": record, "violation": violation }),
            ),
            EngineError::RoleNotFound {
                employee_id,
                role_code,
            } => (
                StatusCode::BAD_REQUEST,
                "ROLE_NOT_FOUND",
                serde_json::json!({ "employee_id": employee_id, "role_code": role_code }),
            ),
            EngineError::AssignmentNotFound { employee_id } => (
                StatusCode::BAD_REQUEST,
                "ASSIGNMENT_NOT_FOUND",
                serde_json::json!({ "employee_id": employee_id }),
            ),
            EngineError::ConflictingAssignment {
                employee_id,
                first,
                second,
            } => (
                StatusCode::BAD_REQUEST,
                "CONFLICTING_ASSIGNMENT",
                serde_json::json!({
                    "employee_id": employee_id,
                    "role_codes": [first, second]
                }),
            ),
            EngineError::InvalidRole { role_code, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVALID_ROLE",
                serde_json::json!({ "role_code": role_code }),
            ),
            EngineError::RateConfig {
                classification,
                tier,
                ..
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RATE_CONFIG_ERROR",
                serde_json::json!({ "classification": classification, "tier": tier }),
            ),
            EngineError::RateVersionNotFound { date } => (
                StatusCode::BAD_REQUEST,
                "RATE_VERSION_NOT_FOUND",
                serde_json::json!({ "date": date }),
            ),
            EngineError::PeriodFinalized { period_id } => (
                StatusCode::CONFLICT,
                "PERIOD_FINALIZED",
                serde_json::json!({ "period_id": period_id }),
            ),
            EngineError::PeriodNotFinalized { period_id } => (
                StatusCode::CONFLICT,
                "PERIOD_NOT_FINALIZED",
                serde_json::json!({ "period_id": period_id }),
            ),
            EngineError::PeriodNotFound { period_id } => (
                StatusCode::NOT_FOUND,
                "PERIOD_NOT_FOUND",
                serde_json::json!({ "period_id": period_id }),
            ),
            EngineError::PeriodAlreadyExists { period_id } => (
                StatusCode::CONFLICT,
                "PERIOD_ALREADY_EXISTS",
                serde_json::json!({ "period_id": period_id }),
            ),
            EngineError::InvalidPeriod { period_id, .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_PERIOD",
                serde_json::json!({ "period_id": period_id }),
            ),
            EngineError::CalculationError { .. } => {
                return ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::new("CALCULATION_ERROR", message),
                };
            }
        };

        ApiErrorResponse {
            status,
            error: ApiError::with_details(code, message, details),
        }
    }
}

/// Body returned for a stored period.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodResponse {
    /// The period.
    pub period: PayrollPeriod,
    /// Rate version pinned at finalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_version: Option<String>,
    /// Digest of the stored line items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// When the period was finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    /// Stored line items, once finalized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computation: Option<PayrollComputation>,
}

impl From<StoredPeriod> for PeriodResponse {
    fn from(stored: StoredPeriod) -> Self {
        match stored.finalized {
            Some(finalized) => Self {
                period: stored.period,
                rate_version: Some(finalized.computation.rate_version.clone()),
                digest: Some(finalized.computation.digest.clone()),
                finalized_at: Some(finalized.finalized_at),
                computation: Some(finalized.computation),
            },
            None => Self {
                period: stored.period,
                rate_version: None,
                digest: None,
                finalized_at: None,
                computation: None,
            },
        }
    }
}

/// Body returned by the compute and finalize endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ComputationResponse {
    /// The period status after the request.
    pub period: PayrollPeriod,
    /// Digest of the snapshot the computation used.
    pub snapshot_digest: String,
    /// The computed line items.
    pub computation: PayrollComputation,
}

/// Body returned by the replay endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayResponse {
    /// Digest comparison.
    #[serde(flatten)]
    pub outcome: ReplayOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AttendanceViolation, RecordKey};
    use chrono::NaiveDate;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_invalid_attendance_carries_record_identity() {
        let error = EngineError::InvalidAttendance {
            record: RecordKey {
                employee_id: "emp_001".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 1, 13).unwrap(),
                work_order_id: "SPK-001".to_string(),
            },
            violation: AttendanceViolation::Duplicate,
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "INVALID_ATTENDANCE");

        let details = response.error.details.unwrap();
        assert_eq!(details["record"]["employee_id"], "emp_001");
        assert_eq!(details["record"]["date"], "2026-01-13");
        assert_eq!(details["violation"]["kind"], "duplicate");
    }

    #[test]
    fn test_rate_config_carries_tier() {
        let error = EngineError::RateConfig {
            classification: "weekend".to_string(),
            tier: Some(2),
            message: "gap".to_string(),
        };
        let response: ApiErrorResponse = error.into();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let details = response.error.details.unwrap();
        assert_eq!(details["classification"], "weekend");
        assert_eq!(details["tier"], 2);
    }

    #[test]
    fn test_period_errors_to_status() {
        let finalized: ApiErrorResponse = EngineError::PeriodFinalized {
            period_id: "2026-01".to_string(),
        }
        .into();
        assert_eq!(finalized.status, StatusCode::CONFLICT);
        assert_eq!(finalized.error.code, "PERIOD_FINALIZED");

        let missing: ApiErrorResponse = EngineError::PeriodNotFound {
            period_id: "2030-01".to_string(),
        }
        .into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }
}
