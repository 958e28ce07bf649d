use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One uploaded document's processing lifecycle record.
///
/// `status` and `approval_status` are kept as the raw stored strings: the
/// pipeline owns `status` and may write values this build does not know,
/// and the UI-state mapping is defined to tolerate that.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ingestion {
    pub ingestion_id: i64,
    pub org_id: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub approval_status: String,
    pub approval_mode: String,
    pub bill_payload_draft: Option<serde_json::Value>,
    pub error: Option<serde_json::Value>,
    pub file_id: Option<i64>,
}

impl Ingestion {
    pub fn draft_present(&self) -> bool {
        self.bill_payload_draft.is_some()
    }

    pub fn ui_state(&self) -> UiState {
        UiState::derive(&self.status, &self.approval_status, self.draft_present())
    }

    /// Last pipeline error rendered for display; structured errors are
    /// flattened to their JSON text.
    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Raw pipeline status values this build recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Queued,
    Extracting,
    Matched,
    Posting,
    Billed,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Queued => "queued",
            IngestionStatus::Extracting => "extracting",
            IngestionStatus::Matched => "matched",
            IngestionStatus::Posting => "posting",
            IngestionStatus::Billed => "billed",
            IngestionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Some(IngestionStatus::Queued),
            "extracting" => Some(IngestionStatus::Extracting),
            "matched" => Some(IngestionStatus::Matched),
            "posting" => Some(IngestionStatus::Posting),
            "billed" => Some(IngestionStatus::Billed),
            "failed" => Some(IngestionStatus::Failed),
            _ => None,
        }
    }
}

/// Reviewer approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Ready,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Ready => "ready",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

/// Single human-facing status derived from raw status + approval + draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiState {
    Queued,
    Extracting,
    Matched,
    Ready,
    Posting,
    Billed,
    Failed,
}

impl UiState {
    /// Fixed precedence: a `ready` approval with a draft present always
    /// wins over the raw pipeline status, so "awaiting human decision"
    /// stays visible even when the backend has moved on. Everything else
    /// maps case-insensitively from the raw status, defaulting to Queued.
    pub fn derive(status: &str, approval_status: &str, draft_present: bool) -> Self {
        if approval_status == ApprovalStatus::Ready.as_str() && draft_present {
            return UiState::Ready;
        }
        match IngestionStatus::parse(status) {
            Some(IngestionStatus::Queued) | None => UiState::Queued,
            Some(IngestionStatus::Extracting) => UiState::Extracting,
            Some(IngestionStatus::Matched) => UiState::Matched,
            Some(IngestionStatus::Posting) => UiState::Posting,
            Some(IngestionStatus::Billed) => UiState::Billed,
            Some(IngestionStatus::Failed) => UiState::Failed,
        }
    }
}

/// List-view filter. `Ready` uses the same predicate as the readiness
/// gate (approval ready AND draft present); any other named state filters
/// on the lowercased raw status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Ready,
    Status(String),
}

impl ListFilter {
    pub fn parse(state: Option<&str>) -> Self {
        match state {
            None | Some("") | Some("All") => ListFilter::All,
            Some(s) => {
                let lower = s.to_lowercase();
                if lower == "ready" {
                    ListFilter::Ready
                } else {
                    ListFilter::Status(lower)
                }
            }
        }
    }
}

/// Dashboard counters. Computed all-or-nothing: a failed sub-count aborts
/// the whole response instead of reporting partial numbers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub billed_30d: i64,
    pub billed_total: i64,
    pub ready_count: i64,
    pub failed_count: i64,
}
