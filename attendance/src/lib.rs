//! Verification and attendance service.
//!
//! [`Service`] ties the decision engine to the ledger and the external
//! collaborators. Every public operation authenticates the caller first and
//! returns an [`Outcome`], which serializes as
//! `{"status": "success", ...}` or `{"status": "error", "kind": ..., "message": ...}`.
//! Nothing escapes as a panic or a raw error.

mod clock;
mod error;
mod outcome;
mod service;

pub use clock::{Clock, FixedClock, LocalClock};
pub use error::ServiceError;
pub use outcome::{
    AbsenceReport, AttendanceReport, ComparisonReport, Failure, IdentitySummary, Outcome,
    RecognizedStudent, Registered, Roster, SessionReport,
};
pub use service::{Collaborators, Service, ServiceConfig};
