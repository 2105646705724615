//! Storage for payroll periods and their finalized results.
//!
//! The store keeps periods in memory. Finalizing a period pins the snapshot
//! it was computed with alongside its line items; from then on the period
//! rejects every mutation.

mod period_store;

pub use period_store::{FinalizedPeriod, PayrollPeriodStore, ReplayOutcome, StoredPeriod};
