//! In-memory `ReviewStore` used by the service unit tests. Implements the
//! same ordering/filter contracts as the Postgres store, plus failure
//! injection for the degradation and abort paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{ReviewError, Result};
use crate::models::{
    ApprovalStatus, CatalogItem, Ingestion, Invoice, InvoiceLine, ListFilter, MatchCandidate,
    MatchState, Vendor,
};

use super::store::ReviewStore;

#[derive(Default)]
struct Inner {
    ingestions: Vec<Ingestion>,
    invoices: Vec<Invoice>,
    lines: Vec<InvoiceLine>,
    candidates: Vec<MatchCandidate>,
    items: Vec<CatalogItem>,
    vendors: Vec<Vendor>,
    files: HashMap<i64, String>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
    pub fail_item_names: AtomicBool,
    pub fail_vendor_lookups: AtomicBool,
    pub fail_counts: AtomicBool,
    pub fail_storage_key: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ingestion(&self, ing: Ingestion) {
        self.inner.lock().unwrap().ingestions.push(ing);
    }

    pub fn add_invoice(&self, inv: Invoice) {
        self.inner.lock().unwrap().invoices.push(inv);
    }

    pub fn add_line(&self, line: InvoiceLine) {
        self.inner.lock().unwrap().lines.push(line);
    }

    pub fn add_candidate(&self, cand: MatchCandidate) {
        self.inner.lock().unwrap().candidates.push(cand);
    }

    pub fn add_item(&self, item: CatalogItem) {
        self.inner.lock().unwrap().items.push(item);
    }

    pub fn add_vendor(&self, vendor: Vendor) {
        self.inner.lock().unwrap().vendors.push(vendor);
    }

    pub fn add_file(&self, file_id: i64, storage_key: &str) {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(file_id, storage_key.to_string());
    }

    pub fn ingestion(&self, ingestion_id: i64) -> Ingestion {
        self.inner
            .lock()
            .unwrap()
            .ingestions
            .iter()
            .find(|i| i.ingestion_id == ingestion_id)
            .cloned()
            .expect("ingestion seeded")
    }

    pub fn line(&self, line_id: i64) -> InvoiceLine {
        self.inner
            .lock()
            .unwrap()
            .lines
            .iter()
            .find(|l| l.line_id == line_id)
            .cloned()
            .expect("line seeded")
    }

    fn injected(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::Relaxed) {
            return Err(ReviewError::Upstream("injected store failure".to_string()));
        }
        Ok(())
    }
}

fn matches_filter(ing: &Ingestion, filter: &ListFilter) -> bool {
    match filter {
        ListFilter::All => true,
        ListFilter::Ready => {
            ing.approval_status == ApprovalStatus::Ready.as_str() && ing.bill_payload_draft.is_some()
        }
        ListFilter::Status(s) => ing.status == *s,
    }
}

#[async_trait]
impl ReviewStore for MemStore {
    async fn get_ingestion(&self, ingestion_id: i64) -> Result<Option<Ingestion>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .ingestions
            .iter()
            .find(|i| i.ingestion_id == ingestion_id)
            .cloned())
    }

    async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .invoices
            .iter()
            .find(|i| i.invoice_id == invoice_id)
            .cloned())
    }

    async fn get_invoice_by_ingestion(&self, ingestion_id: i64) -> Result<Option<Invoice>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .invoices
            .iter()
            .find(|i| i.ingestion_id == ingestion_id)
            .cloned())
    }

    async fn get_line(&self, line_id: i64) -> Result<Option<InvoiceLine>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.lines.iter().find(|l| l.line_id == line_id).cloned())
    }

    async fn list_lines(&self, invoice_id: i64) -> Result<Vec<InvoiceLine>> {
        let inner = self.inner.lock().unwrap();
        let mut lines: Vec<InvoiceLine> = inner
            .lines
            .iter()
            .filter(|l| l.invoice_id == invoice_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.line_no);
        Ok(lines)
    }

    async fn update_line_match(
        &self,
        line_id: i64,
        state: MatchState,
        item_id: Option<&str>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(line) = inner.lines.iter_mut().find(|l| l.line_id == line_id) {
            line.match_state = state.as_str().to_string();
            line.item_id = item_id.map(|s| s.to_string());
        }
        Ok(())
    }

    async fn update_draft(&self, ingestion_id: i64, draft: &Value) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ing) = inner
            .ingestions
            .iter_mut()
            .find(|i| i.ingestion_id == ingestion_id)
        {
            ing.bill_payload_draft = Some(draft.clone());
        }
        Ok(())
    }

    async fn update_approval(&self, ingestion_id: i64, approval: ApprovalStatus) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(ing) = inner
            .ingestions
            .iter_mut()
            .find(|i| i.ingestion_id == ingestion_id)
        {
            ing.approval_status = approval.as_str().to_string();
        }
        Ok(())
    }

    async fn candidates_for_line(&self, line_id: i64) -> Result<Vec<MatchCandidate>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .candidates
            .iter()
            .filter(|c| c.line_id == line_id)
            .cloned()
            .collect())
    }

    async fn search_items(
        &self,
        org_id: &str,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogItem>> {
        let inner = self.inner.lock().unwrap();
        let needle = query.to_lowercase();
        let mut items: Vec<CatalogItem> = inner
            .items
            .iter()
            .filter(|it| it.org_id == org_id)
            .filter(|it| {
                if needle.is_empty() {
                    return true;
                }
                let name_hit = it
                    .name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle));
                let sku_hit = it
                    .sku
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle));
                name_hit || sku_hit
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| match (&a.name, &b.name) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn item_names(
        &self,
        org_id: &str,
        item_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        Self::injected(&self.fail_item_names)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .items
            .iter()
            .filter(|it| it.org_id == org_id && item_ids.contains(&it.item_id))
            .map(|it| (it.item_id.clone(), it.name.clone().unwrap_or_default()))
            .collect())
    }

    async fn vendor_name(&self, org_id: &str, vendor_id: &str) -> Result<Option<String>> {
        Self::injected(&self.fail_vendor_lookups)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .vendors
            .iter()
            .find(|v| v.org_id == org_id && v.vendor_id == vendor_id)
            .and_then(|v| v.name.clone()))
    }

    async fn vendor_names(
        &self,
        org_id: &str,
        vendor_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        Self::injected(&self.fail_vendor_lookups)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .vendors
            .iter()
            .filter(|v| v.org_id == org_id && vendor_ids.contains(&v.vendor_id))
            .map(|v| (v.vendor_id.clone(), v.name.clone().unwrap_or_default()))
            .collect())
    }

    async fn storage_key(&self, file_id: i64) -> Result<Option<String>> {
        Self::injected(&self.fail_storage_key)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.files.get(&file_id).cloned())
    }

    async fn list_ingestions(
        &self,
        filter: &ListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Ingestion>, i64)> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Ingestion> = inner
            .ingestions
            .iter()
            .filter(|i| matches_filter(i, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn invoices_by_ingestions(&self, ingestion_ids: &[i64]) -> Result<Vec<Invoice>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .invoices
            .iter()
            .filter(|i| ingestion_ids.contains(&i.ingestion_id))
            .cloned()
            .collect())
    }

    async fn count_billed_since(&self, since: DateTime<Utc>) -> Result<i64> {
        Self::injected(&self.fail_counts)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .ingestions
            .iter()
            .filter(|i| i.status == "billed" && i.created_at >= since)
            .count() as i64)
    }

    async fn count_billed(&self) -> Result<i64> {
        Self::injected(&self.fail_counts)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.ingestions.iter().filter(|i| i.status == "billed").count() as i64)
    }

    async fn count_ready(&self) -> Result<i64> {
        Self::injected(&self.fail_counts)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .ingestions
            .iter()
            .filter(|i| matches_filter(i, &ListFilter::Ready))
            .count() as i64)
    }

    async fn count_failed(&self) -> Result<i64> {
        Self::injected(&self.fail_counts)?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.ingestions.iter().filter(|i| i.status == "failed").count() as i64)
    }
}
