use std::sync::Arc;
use tracing::info;

use crate::db::ReviewStore;
use crate::error::{ReviewError, Result};
use crate::models::{ApprovalStatus, LineCounts};

/// Gates the transition to "ready for approval": a draft must exist and no
/// line of the ingestion's invoice may still be `unmatched`. Lines flagged
/// `to_create` do not block readiness; the catalog item is created
/// downstream.
pub struct ReadinessEngine {
    store: Arc<dyn ReviewStore>,
}

impl ReadinessEngine {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Request the ready-for-approval transition. Fails with the offending
    /// unmatched count, or distinctly when the draft is absent; never
    /// partially applies.
    pub async fn request_ready(&self, ingestion_id: i64) -> Result<ApprovalStatus> {
        let ing = self
            .store
            .get_ingestion(ingestion_id)
            .await?
            .ok_or(ReviewError::NotFound("ingestion"))?;
        let invoice = self
            .store
            .get_invoice_by_ingestion(ingestion_id)
            .await?
            .ok_or(ReviewError::NotFound("invoice"))?;

        let lines = self.store.list_lines(invoice.invoice_id).await?;
        let counts = LineCounts::tally(&lines);
        if counts.unmatched > 0 {
            return Err(ReviewError::UnmatchedLinesRemain {
                unmatched: counts.unmatched,
            });
        }
        if !ing.draft_present() {
            return Err(ReviewError::DraftMissing);
        }

        self.store
            .update_approval(ingestion_id, ApprovalStatus::Ready)
            .await?;
        info!("ingestion {} marked ready for approval", ingestion_id);
        Ok(ApprovalStatus::Ready)
    }
}
