use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use rollcall_vecmath::Embedding;
use serde::{Deserialize, Serialize};

/// A registered identity and its reference embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(rename = "id")]
    pub id: String,

    #[serde(rename = "name")]
    pub display_name: String,

    #[serde(rename = "emb")]
    pub embedding: Embedding,
}

/// Attendance status of one identity in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Present,
    Absent,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "Present"),
            Self::Absent => write!(f, "Absent"),
        }
    }
}

/// One persisted attendance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(rename = "id")]
    pub identity_id: String,

    #[serde(rename = "name")]
    pub display_name: String,

    pub date: NaiveDate,

    pub time: NaiveTime,

    #[serde(rename = "ctx")]
    pub context_label: String,

    pub status: Status,
}
