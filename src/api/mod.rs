//! HTTP API module for the Labor Cost Engine.
//!
//! This module provides the REST endpoints for opening payroll periods,
//! previewing and finalizing their computation, and replaying finalized
//! periods against their pinned snapshot.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ComputeRequest, OpenPeriodRequest};
pub use response::{
    ApiError, ApiErrorResponse, ComputationResponse, PeriodResponse, ReplayResponse,
};
pub use state::AppState;
