use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::db::ReviewStore;
use crate::error::Result;
use crate::models::{DraftPayload, ListFilter, MetricsSummary, UiState};

const PAGE_SIZE_DEFAULT: i64 = 50;
const PAGE_SIZE_MAX: i64 = 200;

/// One row of the review queue. `vendor_guess`/`bill_number` prefer the
/// draft's values (resolved against the vendor master) over the extracted
/// invoice's stored ones.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionListItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub state: UiState,
    pub approval_mode: String,
    pub ingestion_status: String,
    pub approval_status: String,
    pub vendor_guess: Option<String>,
    pub total_guess: Option<BigDecimal>,
    pub bill_number: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestionListPage {
    pub items: Vec<IngestionListItem>,
    pub count: i64,
}

/// Read-only projections over the ingestion table: the filterable queue
/// and the dashboard counters.
pub struct IngestionBoard {
    store: Arc<dyn ReviewStore>,
}

impl IngestionBoard {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &ListFilter,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<IngestionListPage> {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(PAGE_SIZE_DEFAULT).clamp(1, PAGE_SIZE_MAX);
        let offset = (page - 1) * page_size;

        let (rows, count) = self.store.list_ingestions(filter, offset, page_size).await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.ingestion_id).collect();
        let invoices: HashMap<i64, _> = self
            .store
            .invoices_by_ingestions(&ids)
            .await?
            .into_iter()
            .map(|inv| (inv.ingestion_id, inv))
            .collect();

        // draft-level guesses, with vendor ids grouped per org for one
        // batched lookup per organization
        let drafts: Vec<Option<DraftPayload>> = rows
            .iter()
            .map(|r| r.bill_payload_draft.as_ref().and_then(DraftPayload::from_value))
            .collect();
        let mut by_org: HashMap<String, IndexSet<String>> = HashMap::new();
        for (row, draft) in rows.iter().zip(&drafts) {
            if let Some(vendor_id) = draft.as_ref().and_then(|d| d.vendor_id.clone()) {
                by_org.entry(row.org_id.clone()).or_default().insert(vendor_id);
            }
        }
        let vendor_map = self.resolve_vendor_names(by_org).await;

        let items = rows
            .into_iter()
            .zip(drafts)
            .map(|(row, draft)| {
                let invoice = invoices.get(&row.ingestion_id);
                let draft_vendor = draft.as_ref().and_then(|d| d.vendor_id.as_ref()).and_then(
                    |vendor_id| {
                        vendor_map
                            .get(&(row.org_id.clone(), vendor_id.clone()))
                            .cloned()
                    },
                );
                let draft_bill_no = draft.as_ref().and_then(|d| d.bill_number.clone());
                IngestionListItem {
                    id: row.ingestion_id,
                    created_at: row.created_at,
                    state: row.ui_state(),
                    approval_mode: row.approval_mode.clone(),
                    ingestion_status: row.status.clone(),
                    approval_status: row.approval_status.clone(),
                    vendor_guess: draft_vendor
                        .or_else(|| invoice.and_then(|inv| inv.vendor_name.clone())),
                    total_guess: invoice.and_then(|inv| inv.grand_total.clone()),
                    bill_number: draft_bill_no
                        .or_else(|| invoice.and_then(|inv| inv.bill_number.clone())),
                    error: row.error_text(),
                }
            })
            .collect();

        Ok(IngestionListPage { items, count })
    }

    /// Batched vendor-name resolution, one concurrent lookup per org.
    /// Failures degrade to missing names; the list itself never fails on
    /// decoration.
    async fn resolve_vendor_names(
        &self,
        by_org: HashMap<String, IndexSet<String>>,
    ) -> HashMap<(String, String), String> {
        let lookups = by_org.into_iter().map(|(org_id, ids)| async move {
            let ids: Vec<String> = ids.into_iter().collect();
            match self.store.vendor_names(&org_id, &ids).await {
                Ok(names) => (org_id, names),
                Err(e) => {
                    warn!("vendor name lookup degraded for org {}: {}", org_id, e);
                    (org_id, HashMap::new())
                }
            }
        });
        let mut map = HashMap::new();
        for (org_id, names) in futures::future::join_all(lookups).await {
            for (vendor_id, name) in names {
                map.insert((org_id.clone(), vendor_id), name);
            }
        }
        map
    }

    /// Dashboard counters over a 30-day billed window plus all-time,
    /// ready, and failed counts. The four sub-counts run concurrently and
    /// any failure aborts the whole response.
    pub async fn metrics(&self) -> Result<MetricsSummary> {
        let since = Utc::now() - Duration::days(30);
        let (billed_30d, billed_total, ready_count, failed_count) = futures::try_join!(
            self.store.count_billed_since(since),
            self.store.count_billed(),
            self.store.count_ready(),
            self.store.count_failed(),
        )?;
        Ok(MetricsSummary {
            billed_30d,
            billed_total,
            ready_count,
            failed_count,
        })
    }
}
