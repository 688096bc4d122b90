use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Calendar attributes derived from a point in time.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeParts {
    pub year: i32,
    pub semester: u8,
    pub trimester: u8,
    pub month: u8,
}

impl TimeParts {
    pub fn derive(date: &NaiveDateTime) -> Self {
        let month = date.month() as u8;
        Self {
            year: date.year(),
            semester: if month <= 6 { 1 } else { 2 },
            trimester: (month - 1) / 3 + 1,
            month,
        }
    }
}

/// One cleaned input row. Cleaning guarantees every field is present.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CleanRecord {
    pub user_id: i64,
    pub price: f64,
    pub timestamp: NaiveDateTime,
    pub parts: TimeParts,
}

impl CleanRecord {
    pub fn new(user_id: i64, price: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            user_id,
            price,
            timestamp,
            parts: TimeParts::derive(&timestamp),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct StatisticsSnapshot {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    pub record_count: u64,
}

// --- Star schema rows ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub user_key: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    pub id: i64,
    pub date: NaiveDateTime,
    pub parts: TimeParts,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub users: i64,
    pub time_buckets: i64,
    pub sales: i64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub rows: usize,
    pub users_created: usize,
    pub time_buckets_created: usize,
    pub facts_inserted: usize,
}

// --- Batch audit log ---

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Running,
    Success,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "RUNNING",
            BatchStatus::Success => "SUCCESS",
            BatchStatus::Failed => "FAILED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "RUNNING" => Some(BatchStatus::Running),
            "SUCCESS" => Some(BatchStatus::Success),
            "FAILED" => Some(BatchStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct LoadBatch {
    pub batch_id: i64,
    pub source: String,
    pub started_at: i64, // Unix timestamp
    pub finished_at: Option<i64>,
    pub status: BatchStatus,
    pub rows: i64,
    pub details: Option<String>,
}
