use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::db::queries;
use crate::error::Result;
use crate::models::{
    ApprovalStatus, CatalogItem, Ingestion, IngestionStatus, Invoice, InvoiceLine, ListFilter,
    MatchCandidate, MatchState,
};

/// Data-access boundary for the review engine. The relational store is an
/// external collaborator; services only see this trait, which keeps the
/// engines testable against an in-memory implementation.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn get_ingestion(&self, ingestion_id: i64) -> Result<Option<Ingestion>>;
    async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>>;
    async fn get_invoice_by_ingestion(&self, ingestion_id: i64) -> Result<Option<Invoice>>;
    async fn get_line(&self, line_id: i64) -> Result<Option<InvoiceLine>>;
    /// Lines of an invoice ordered by `line_no` ascending.
    async fn list_lines(&self, invoice_id: i64) -> Result<Vec<InvoiceLine>>;
    async fn update_line_match(
        &self,
        line_id: i64,
        state: MatchState,
        item_id: Option<&str>,
    ) -> Result<()>;
    async fn update_draft(&self, ingestion_id: i64, draft: &Value) -> Result<()>;
    async fn update_approval(&self, ingestion_id: i64, approval: ApprovalStatus) -> Result<()>;
    /// Stored candidates for a line, unordered; ranking is the service's job.
    async fn candidates_for_line(&self, line_id: i64) -> Result<Vec<MatchCandidate>>;
    async fn search_items(
        &self,
        org_id: &str,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogItem>>;
    async fn item_names(&self, org_id: &str, item_ids: &[String])
        -> Result<HashMap<String, String>>;
    async fn vendor_name(&self, org_id: &str, vendor_id: &str) -> Result<Option<String>>;
    async fn vendor_names(
        &self,
        org_id: &str,
        vendor_ids: &[String],
    ) -> Result<HashMap<String, String>>;
    async fn storage_key(&self, file_id: i64) -> Result<Option<String>>;
    /// One page plus the filter's total row count, newest first.
    async fn list_ingestions(
        &self,
        filter: &ListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Ingestion>, i64)>;
    async fn invoices_by_ingestions(&self, ingestion_ids: &[i64]) -> Result<Vec<Invoice>>;
    async fn count_billed_since(&self, since: DateTime<Utc>) -> Result<i64>;
    async fn count_billed(&self) -> Result<i64>;
    async fn count_ready(&self) -> Result<i64>;
    async fn count_failed(&self) -> Result<i64>;
}

/// Postgres-backed store, delegating to the query module.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn get_ingestion(&self, ingestion_id: i64) -> Result<Option<Ingestion>> {
        Ok(queries::get_ingestion(&self.pool, ingestion_id).await?)
    }

    async fn get_invoice(&self, invoice_id: i64) -> Result<Option<Invoice>> {
        Ok(queries::get_invoice(&self.pool, invoice_id).await?)
    }

    async fn get_invoice_by_ingestion(&self, ingestion_id: i64) -> Result<Option<Invoice>> {
        Ok(queries::get_invoice_by_ingestion(&self.pool, ingestion_id).await?)
    }

    async fn get_line(&self, line_id: i64) -> Result<Option<InvoiceLine>> {
        Ok(queries::get_line(&self.pool, line_id).await?)
    }

    async fn list_lines(&self, invoice_id: i64) -> Result<Vec<InvoiceLine>> {
        Ok(queries::list_lines(&self.pool, invoice_id).await?)
    }

    async fn update_line_match(
        &self,
        line_id: i64,
        state: MatchState,
        item_id: Option<&str>,
    ) -> Result<()> {
        Ok(queries::update_line_match(&self.pool, line_id, state, item_id).await?)
    }

    async fn update_draft(&self, ingestion_id: i64, draft: &Value) -> Result<()> {
        Ok(queries::update_draft(&self.pool, ingestion_id, draft).await?)
    }

    async fn update_approval(&self, ingestion_id: i64, approval: ApprovalStatus) -> Result<()> {
        Ok(queries::update_approval(&self.pool, ingestion_id, approval).await?)
    }

    async fn candidates_for_line(&self, line_id: i64) -> Result<Vec<MatchCandidate>> {
        Ok(queries::candidates_for_line(&self.pool, line_id).await?)
    }

    async fn search_items(
        &self,
        org_id: &str,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CatalogItem>> {
        Ok(queries::search_items(&self.pool, org_id, query, limit, offset).await?)
    }

    async fn item_names(
        &self,
        org_id: &str,
        item_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        Ok(queries::item_names(&self.pool, org_id, item_ids).await?)
    }

    async fn vendor_name(&self, org_id: &str, vendor_id: &str) -> Result<Option<String>> {
        Ok(queries::vendor_name(&self.pool, org_id, vendor_id).await?)
    }

    async fn vendor_names(
        &self,
        org_id: &str,
        vendor_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        Ok(queries::vendor_names(&self.pool, org_id, vendor_ids).await?)
    }

    async fn storage_key(&self, file_id: i64) -> Result<Option<String>> {
        Ok(queries::storage_key(&self.pool, file_id).await?)
    }

    async fn list_ingestions(
        &self,
        filter: &ListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Ingestion>, i64)> {
        Ok(queries::list_ingestions(&self.pool, filter, offset, limit).await?)
    }

    async fn invoices_by_ingestions(&self, ingestion_ids: &[i64]) -> Result<Vec<Invoice>> {
        Ok(queries::invoices_by_ingestions(&self.pool, ingestion_ids).await?)
    }

    async fn count_billed_since(&self, since: DateTime<Utc>) -> Result<i64> {
        Ok(queries::count_billed_since(&self.pool, since).await?)
    }

    async fn count_billed(&self) -> Result<i64> {
        Ok(queries::count_by_status(&self.pool, IngestionStatus::Billed.as_str()).await?)
    }

    async fn count_ready(&self) -> Result<i64> {
        Ok(queries::count_ready(&self.pool).await?)
    }

    async fn count_failed(&self) -> Result<i64> {
        Ok(queries::count_by_status(&self.pool, IngestionStatus::Failed.as_str()).await?)
    }
}
