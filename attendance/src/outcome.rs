use chrono::NaiveDate;
use rollcall_ledger::AttendanceEntry;
use rollcall_verify::Match;
use serde::Serialize;

use crate::ServiceError;

/// Result of a service operation, as returned across the process boundary.
///
/// Serializes with a `status` tag: `{"status":"success", ...payload}` or
/// `{"status":"error","kind":...,"message":...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    Error(Failure),
}

/// Error payload of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: String,
    pub message: String,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Error(f) => Some(f),
        }
    }
}

impl<T> From<Result<T, ServiceError>> for Outcome<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(v) => Self::Success(v),
            Err(e) => Self::Error(Failure {
                kind: e.kind().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registered {
    pub id: String,
    pub display_name: String,
    pub dim: usize,
}

/// Identity accepted during a capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedStudent {
    pub id: String,
    pub display_name: String,
    pub score: f64,
}

/// Result of one attendance capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub context_label: String,
    pub date: NaiveDate,

    /// Entries newly written by this capture.
    pub marked_count: usize,

    /// Identities accepted by this capture, in acceptance order.
    pub recognized_students: Vec<RecognizedStudent>,

    /// Accepted identities that already had an entry for the session.
    pub already_marked: Vec<String>,

    /// Probes that resolved to an identity accepted earlier in the capture.
    pub duplicates: Vec<Match>,

    pub unidentified: usize,

    /// Regions detected across all frames.
    pub probes: usize,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

impl AttendanceReport {
    pub(crate) fn new(context_label: &str, date: NaiveDate) -> Self {
        Self {
            context_label: context_label.to_string(),
            date,
            marked_count: 0,
            recognized_students: Vec::new(),
            already_marked: Vec::new(),
            duplicates: Vec::new(),
            unidentified: 0,
            probes: 0,
            notices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsenceReport {
    pub context_label: String,
    pub date: NaiveDate,
    pub absent_count: usize,
    pub absent: Vec<String>,
}

/// Result of a handwriting comparison. `similarity` is the aggregate score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub identity_id: String,
    pub similarity: f64,
    pub similarities: Vec<f64>,
    pub matched: bool,
    pub failed_pages: Vec<usize>,
    pub unreadable_pages: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub context_label: String,
    pub date: NaiveDate,
    pub present: usize,
    pub absent: usize,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentitySummary {
    pub id: String,
    pub display_name: String,
    pub dim: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub count: usize,
    pub identities: Vec<IdentitySummary>,
}
