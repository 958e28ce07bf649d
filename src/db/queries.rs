use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, QueryBuilder, Row};
use std::collections::HashMap;

use crate::models::{
    ApprovalStatus, CatalogItem, Ingestion, Invoice, InvoiceLine, ListFilter, MatchCandidate,
    MatchState,
};

const INGESTION_COLS: &str = "ingestion_id, org_id, created_at, status, approval_status, \
     approval_mode, bill_payload_draft, error, file_id";

pub async fn get_ingestion(
    pool: &PgPool,
    ingestion_id: i64,
) -> Result<Option<Ingestion>, sqlx::Error> {
    sqlx::query_as::<_, Ingestion>(
        r#"
        SELECT ingestion_id, org_id, created_at, status, approval_status,
               approval_mode, bill_payload_draft, error, file_id
        FROM ingestions
        WHERE ingestion_id = $1
        "#,
    )
    .bind(ingestion_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_invoice(pool: &PgPool, invoice_id: i64) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        r#"
        SELECT invoice_id, org_id, ingestion_id, vendor_name, vendor_gstin,
               bill_number, bill_date, grand_total, currency
        FROM invoices
        WHERE invoice_id = $1
        "#,
    )
    .bind(invoice_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_invoice_by_ingestion(
    pool: &PgPool,
    ingestion_id: i64,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        r#"
        SELECT invoice_id, org_id, ingestion_id, vendor_name, vendor_gstin,
               bill_number, bill_date, grand_total, currency
        FROM invoices
        WHERE ingestion_id = $1
        "#,
    )
    .bind(ingestion_id)
    .fetch_optional(pool)
    .await
}

/// Batch-fetch invoices for a page of ingestions.
pub async fn invoices_by_ingestions(
    pool: &PgPool,
    ingestion_ids: &[i64],
) -> Result<Vec<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        r#"
        SELECT invoice_id, org_id, ingestion_id, vendor_name, vendor_gstin,
               bill_number, bill_date, grand_total, currency
        FROM invoices
        WHERE ingestion_id = ANY($1)
        "#,
    )
    .bind(ingestion_ids)
    .fetch_all(pool)
    .await
}

pub async fn get_line(pool: &PgPool, line_id: i64) -> Result<Option<InvoiceLine>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceLine>(
        r#"
        SELECT line_id, invoice_id, line_no, description, quantity, rate,
               amount, item_name, match_state, item_id
        FROM invoice_lines
        WHERE line_id = $1
        "#,
    )
    .bind(line_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_lines(pool: &PgPool, invoice_id: i64) -> Result<Vec<InvoiceLine>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceLine>(
        r#"
        SELECT line_id, invoice_id, line_no, description, quantity, rate,
               amount, item_name, match_state, item_id
        FROM invoice_lines
        WHERE invoice_id = $1
        ORDER BY line_no ASC
        "#,
    )
    .bind(invoice_id)
    .fetch_all(pool)
    .await
}

pub async fn update_line_match(
    pool: &PgPool,
    line_id: i64,
    state: MatchState,
    item_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE invoice_lines
        SET match_state = $2, item_id = $3
        WHERE line_id = $1
        "#,
    )
    .bind(line_id)
    .bind(state.as_str())
    .bind(item_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_draft(
    pool: &PgPool,
    ingestion_id: i64,
    draft: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE ingestions
        SET bill_payload_draft = $2
        WHERE ingestion_id = $1
        "#,
    )
    .bind(ingestion_id)
    .bind(draft)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_approval(
    pool: &PgPool,
    ingestion_id: i64,
    approval: ApprovalStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE ingestions
        SET approval_status = $2
        WHERE ingestion_id = $1
        "#,
    )
    .bind(ingestion_id)
    .bind(approval.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// All stored candidates for a line; ranking order is applied by the
/// service so one code path defines it for every backend.
pub async fn candidates_for_line(
    pool: &PgPool,
    line_id: i64,
) -> Result<Vec<MatchCandidate>, sqlx::Error> {
    sqlx::query_as::<_, MatchCandidate>(
        r#"
        SELECT line_id, candidate_item_id, candidate_name, hsn_or_sac,
               similarity, reason, rank
        FROM invoice_line_match_candidates
        WHERE line_id = $1
        "#,
    )
    .bind(line_id)
    .fetch_all(pool)
    .await
}

/// Case-insensitive substring search over name OR sku; an empty query is
/// a plain paginated catalog listing.
pub async fn search_items(
    pool: &PgPool,
    org_id: &str,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT item_id, org_id, name, hsn_or_sac, sku FROM items_catalog WHERE org_id = ",
    );
    qb.push_bind(org_id);
    if !query.is_empty() {
        let pattern = format!("%{}%", query);
        qb.push(" AND (name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR sku ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    qb.push(" ORDER BY name ASC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    qb.build_query_as::<CatalogItem>().fetch_all(pool).await
}

/// Batched item-name lookup keyed by item id.
pub async fn item_names(
    pool: &PgPool,
    org_id: &str,
    item_ids: &[String],
) -> Result<HashMap<String, String>, sqlx::Error> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query(
        r#"
        SELECT item_id, name
        FROM items_catalog
        WHERE org_id = $1 AND item_id = ANY($2)
        "#,
    )
    .bind(org_id)
    .bind(item_ids)
    .fetch_all(pool)
    .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let id: String = row.try_get("item_id")?;
        let name: Option<String> = row.try_get("name")?;
        map.insert(id, name.unwrap_or_default());
    }
    Ok(map)
}

pub async fn vendor_name(
    pool: &PgPool,
    org_id: &str,
    vendor_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT name
        FROM vendors
        WHERE org_id = $1 AND vendor_id = $2
        "#,
    )
    .bind(org_id)
    .bind(vendor_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.flatten())
}

pub async fn vendor_names(
    pool: &PgPool,
    org_id: &str,
    vendor_ids: &[String],
) -> Result<HashMap<String, String>, sqlx::Error> {
    if vendor_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query(
        r#"
        SELECT vendor_id, name
        FROM vendors
        WHERE org_id = $1 AND vendor_id = ANY($2)
        "#,
    )
    .bind(org_id)
    .bind(vendor_ids)
    .fetch_all(pool)
    .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let id: String = row.try_get("vendor_id")?;
        let name: Option<String> = row.try_get("name")?;
        map.insert(id, name.unwrap_or_default());
    }
    Ok(map)
}

pub async fn storage_key(pool: &PgPool, file_id: i64) -> Result<Option<String>, sqlx::Error> {
    let row: Option<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT storage_key
        FROM files
        WHERE file_id = $1
        "#,
    )
    .bind(file_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.flatten())
}

fn push_filter(qb: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ListFilter) {
    match filter {
        ListFilter::All => {}
        ListFilter::Ready => {
            qb.push(" WHERE approval_status = ");
            qb.push_bind(ApprovalStatus::Ready.as_str());
            qb.push(" AND bill_payload_draft IS NOT NULL");
        }
        ListFilter::Status(s) => {
            qb.push(" WHERE status = ");
            qb.push_bind(s.clone());
        }
    }
}

/// One page of ingestions, newest first, plus the total row count for the
/// filter.
pub async fn list_ingestions(
    pool: &PgPool,
    filter: &ListFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Ingestion>, i64), sqlx::Error> {
    let mut count_qb = QueryBuilder::new("SELECT count(*) FROM ingestions");
    push_filter(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {} FROM ingestions", INGESTION_COLS));
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    let rows = qb.build_query_as::<Ingestion>().fetch_all(pool).await?;

    Ok((rows, total))
}

pub async fn count_billed_since(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT count(*)
        FROM ingestions
        WHERE status = 'billed' AND created_at >= $1
        "#,
    )
    .bind(since)
    .fetch_one(pool)
    .await
}

pub async fn count_by_status(pool: &PgPool, status: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT count(*)
        FROM ingestions
        WHERE status = $1
        "#,
    )
    .bind(status)
    .fetch_one(pool)
    .await
}

/// Same predicate as the readiness gate and the Ready list filter.
pub async fn count_ready(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT count(*)
        FROM ingestions
        WHERE approval_status = 'ready' AND bill_payload_draft IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await
}
