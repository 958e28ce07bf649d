use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::db::ReviewStore;
use crate::error::{ReviewError, Result};
use crate::models::{
    CatalogItem, DraftPayload, LineCounts, MatchCandidate, MatchState, MAX_DRAFT_LINES,
};

const CANDIDATES_DEFAULT: i64 = 5;
const CANDIDATES_MAX: i64 = 20;
const SEARCH_LIMIT_DEFAULT: i64 = 20;
const SEARCH_LIMIT_MAX: i64 = 50;

/// Per-line reconciliation state machine plus the catalog lookups that
/// feed it. Draft mutations are serialized per ingestion: the draft is a
/// single document, and two concurrent read-modify-writes on different
/// lines of the same ingestion would otherwise lose one update.
pub struct LineMatcher {
    store: Arc<dyn ReviewStore>,
    draft_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl LineMatcher {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self {
            store,
            draft_locks: DashMap::new(),
        }
    }

    fn draft_lock(&self, ingestion_id: i64) -> Arc<Mutex<()>> {
        self.draft_locks
            .entry(ingestion_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Assign a catalog item to a line: the line moves to `human_matched`
    /// and the draft entry at `line_no - 1` gets the item id, padding the
    /// draft's line array when it has drifted shorter than the relational
    /// lines. Safe to retry with the same arguments.
    pub async fn assign_item(
        &self,
        ingestion_id: i64,
        line_id: i64,
        item_id: &str,
    ) -> Result<LineCounts> {
        if item_id.trim().is_empty() {
            return Err(ReviewError::validation("item_id required"));
        }

        // 1) line -> invoice id and draft index
        let line = self
            .store
            .get_line(line_id)
            .await?
            .ok_or(ReviewError::NotFound("line"))?;

        // 2) the line's invoice must belong to the addressed ingestion
        let invoice = self
            .store
            .get_invoice(line.invoice_id)
            .await?
            .ok_or(ReviewError::NotFound("invoice"))?;
        if invoice.ingestion_id != ingestion_id {
            return Err(ReviewError::validation("ingestion/line mismatch"));
        }

        let idx = (line.line_no.max(1) - 1) as usize;
        if idx >= MAX_DRAFT_LINES {
            return Err(ReviewError::validation(format!(
                "line_no {} exceeds draft bound {}",
                line.line_no, MAX_DRAFT_LINES
            )));
        }

        // one in-flight draft mutation per ingestion
        let lock = self.draft_lock(ingestion_id);
        let _guard = lock.lock().await;

        // 3) relational line update
        self.store
            .update_line_match(line_id, MatchState::HumanMatched, Some(item_id))
            .await?;

        // 4) patch the draft at the corresponding index
        let ing = self
            .store
            .get_ingestion(ingestion_id)
            .await?
            .ok_or(ReviewError::NotFound("ingestion"))?;
        let mut draft = ing
            .bill_payload_draft
            .as_ref()
            .and_then(DraftPayload::from_value)
            .unwrap_or_default();
        draft.line_slot(idx)?.item_id = Some(item_id.to_string());
        self.store.update_draft(ingestion_id, &draft.to_value()?).await?;

        info!(
            "line {} assigned item {} on ingestion {}",
            line_id, item_id, ingestion_id
        );

        // 5) fresh counts for readiness gating
        let lines = self.store.list_lines(line.invoice_id).await?;
        Ok(LineCounts::tally(&lines))
    }

    /// Flag a line as needing a new catalog item downstream. Clears any
    /// assigned item; reapplying is a no-op state-wise.
    pub async fn mark_needs_create(&self, line_id: i64) -> Result<()> {
        self.store
            .get_line(line_id)
            .await?
            .ok_or(ReviewError::NotFound("line"))?;
        self.store
            .update_line_match(line_id, MatchState::ToCreate, None)
            .await?;
        info!("line {} marked to_create", line_id);
        Ok(())
    }

    /// Top suggestions for a line, rank ascending then similarity
    /// descending. Rank is the curation signal and wins ties.
    pub async fn list_candidates(
        &self,
        line_id: i64,
        top: Option<i64>,
    ) -> Result<Vec<MatchCandidate>> {
        let top = top.unwrap_or(CANDIDATES_DEFAULT).clamp(1, CANDIDATES_MAX) as usize;
        self.store
            .get_line(line_id)
            .await?
            .ok_or(ReviewError::NotFound("line"))?;

        let mut candidates = self.store.candidates_for_line(line_id).await?;
        candidates.sort_by(|a, b| {
            a.rank.cmp(&b.rank).then_with(|| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        candidates.truncate(top);
        Ok(candidates)
    }

    /// Catalog search scoped to the org owning the ingestion's invoice.
    pub async fn search_catalog_for_ingestion(
        &self,
        ingestion_id: i64,
        query: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<CatalogItem>> {
        let invoice = self
            .store
            .get_invoice_by_ingestion(ingestion_id)
            .await?
            .ok_or(ReviewError::NotFound("ingestion"))?;
        self.search_catalog(&invoice.org_id, query, limit, offset).await
    }

    /// Free-text catalog search; an empty query lists the whole catalog.
    pub async fn search_catalog(
        &self,
        org_id: &str,
        query: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<CatalogItem>> {
        let limit = limit.unwrap_or(SEARCH_LIMIT_DEFAULT).clamp(1, SEARCH_LIMIT_MAX);
        let offset = offset.unwrap_or(0).max(0);
        self.store
            .search_items(org_id, query.trim(), limit, offset)
            .await
    }
}
