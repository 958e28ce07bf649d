use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::db::ReviewStore;
use crate::error::{ReviewError, Result};
use crate::models::{
    DraftPayload, EnrichedDraft, EnrichedDraftLine, Ingestion, Invoice, InvoiceLine, LineCounts,
    UiState,
};

/// Review-screen projection of one ingestion: relational match-state truth
/// merged with the draft's posting intent, both decorated with display
/// names.
#[derive(Debug, Serialize)]
pub struct IngestionDetail {
    pub ingestion: Ingestion,
    pub state: UiState,
    pub storage_key: Option<String>,
    pub invoice: Option<Invoice>,
    pub lines: Vec<InvoiceLine>,
    pub counts: LineCounts,
    pub draft: Option<EnrichedDraft>,
}

/// Outcome of a best-effort display-name lookup. `degraded` marks that
/// the underlying lookup failed and the map is empty, as opposed to the
/// ids genuinely having no catalog entry.
#[derive(Debug, Default)]
pub struct NameResolution {
    pub names: HashMap<String, String>,
    pub degraded: bool,
}

impl NameResolution {
    /// Resolved non-empty name for an id, if the lookup produced one.
    pub fn get(&self, id: &str) -> Option<&String> {
        self.names.get(id).filter(|n| !n.is_empty())
    }
}

/// Merges authoritative relational line data back into the draft document
/// view. Ids are primary truth; display names are best-effort decoration:
/// a failed lookup degrades to the stored denormalized name (lines) or
/// null (draft entries), never to an error.
pub struct DraftReconciler {
    store: Arc<dyn ReviewStore>,
}

impl DraftReconciler {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    pub async fn ingestion_detail(&self, ingestion_id: i64) -> Result<IngestionDetail> {
        let ing = self
            .store
            .get_ingestion(ingestion_id)
            .await?
            .ok_or(ReviewError::NotFound("ingestion"))?;

        let storage_key = match ing.file_id {
            Some(file_id) => match self.store.storage_key(file_id).await {
                Ok(key) => key,
                Err(e) => {
                    warn!("storage key lookup degraded for file {}: {}", file_id, e);
                    None
                }
            },
            None => None,
        };

        let invoice = self.store.get_invoice_by_ingestion(ingestion_id).await?;
        let mut lines = match &invoice {
            Some(inv) => self.store.list_lines(inv.invoice_id).await?,
            None => Vec::new(),
        };
        self.refresh_line_names(&ing.org_id, &mut lines).await;
        let counts = LineCounts::tally(&lines);

        let draft = match ing
            .bill_payload_draft
            .as_ref()
            .and_then(DraftPayload::from_value)
        {
            Some(d) => Some(self.enrich_draft(&ing.org_id, d).await),
            None => None,
        };

        let state = ing.ui_state();
        Ok(IngestionDetail {
            ingestion: ing,
            state,
            storage_key,
            invoice,
            lines,
            counts,
            draft,
        })
    }

    /// Refresh the denormalized item names on relational lines from the
    /// catalog. A lookup miss or failure keeps the stored name.
    async fn refresh_line_names(&self, org_id: &str, lines: &mut [InvoiceLine]) {
        let ids: Vec<String> = lines
            .iter()
            .filter_map(|l| l.item_id.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return;
        }
        let resolution = self.resolve_item_names(org_id, &ids).await;
        for line in lines.iter_mut() {
            if let Some(name) = line.item_id.as_ref().and_then(|id| resolution.get(id)) {
                line.item_name = Some(name.clone());
            }
        }
    }

    /// Decorate a draft with vendor and item display names. The two
    /// lookups are independent and run concurrently.
    pub async fn enrich_draft(&self, org_id: &str, draft: DraftPayload) -> EnrichedDraft {
        let vendor_fut = async {
            match &draft.vendor_id {
                Some(vendor_id) => match self.store.vendor_name(org_id, vendor_id).await {
                    Ok(name) => name,
                    Err(e) => {
                        warn!("vendor name lookup degraded for {}: {}", vendor_id, e);
                        None
                    }
                },
                None => None,
            }
        };

        let item_ids: Vec<String> = draft
            .line_items
            .iter()
            .filter_map(|li| li.item_id.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let items_fut = self.resolve_item_names(org_id, &item_ids);

        let (vendor_name, resolution) = futures::join!(vendor_fut, items_fut);

        let line_items = draft
            .line_items
            .into_iter()
            .map(|entry| {
                let item_name = entry
                    .item_id
                    .as_ref()
                    .and_then(|id| resolution.get(id))
                    .cloned();
                EnrichedDraftLine { entry, item_name }
            })
            .collect();

        EnrichedDraft {
            date: draft.date,
            due_date: draft.due_date,
            bill_number: draft.bill_number,
            discount_type: draft.discount_type,
            is_item_level_tax_calc: draft.is_item_level_tax_calc.unwrap_or(false),
            vendor_id: draft.vendor_id,
            vendor_name,
            line_items,
        }
    }

    /// Batched catalog-name lookup. Never fails: an upstream error comes
    /// back as an empty, explicitly degraded resolution.
    pub async fn resolve_item_names(&self, org_id: &str, ids: &[String]) -> NameResolution {
        if ids.is_empty() {
            return NameResolution::default();
        }
        match self.store.item_names(org_id, ids).await {
            Ok(names) => NameResolution {
                names,
                degraded: false,
            },
            Err(e) => {
                warn!("item name lookup degraded for {} ids: {}", ids.len(), e);
                NameResolution {
                    names: HashMap::new(),
                    degraded: true,
                }
            }
        }
    }
}
