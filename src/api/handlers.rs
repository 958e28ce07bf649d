use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{CatalogItem, LineCounts, ListFilter, MatchCandidate, MetricsSummary};
use crate::service::{
    DraftReconciler, IngestionBoard, IngestionDetail, IngestionListPage, LineMatcher,
    PipelineClient, ReadinessEngine, StartAck,
};

/// Shared state: one instance of each engine.
#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<LineMatcher>,
    pub readiness: Arc<ReadinessEngine>,
    pub reconciler: Arc<DraftReconciler>,
    pub board: Arc<IngestionBoard>,
    pub pipeline: Arc<PipelineClient>,
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub state: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn list_ingestions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<IngestionListPage>> {
    let filter = ListFilter::parse(query.state.as_deref());
    let page = state.board.list(&filter, query.page, query.page_size).await?;
    Ok(Json(page))
}

pub async fn metrics(State(state): State<AppState>) -> Result<Json<MetricsSummary>> {
    Ok(Json(state.board.metrics().await?))
}

pub async fn ingestion_detail(
    State(state): State<AppState>,
    Path(ingestion_id): Path<i64>,
) -> Result<Json<IngestionDetail>> {
    Ok(Json(state.reconciler.ingestion_detail(ingestion_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Catalog row projected for pickers: id plus display fields only.
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub item_id: String,
    pub name: Option<String>,
    pub hsn_or_sac: Option<String>,
}

impl From<CatalogItem> for ItemSummary {
    fn from(item: CatalogItem) -> Self {
        Self {
            item_id: item.item_id,
            name: item.name,
            hsn_or_sac: item.hsn_or_sac,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub ok: bool,
    pub items: Vec<ItemSummary>,
    pub count: usize,
}

/// Catalog search scoped through the ingestion's invoice org.
pub async fn search_items(
    State(state): State<AppState>,
    Path(ingestion_id): Path<i64>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ItemsResponse>> {
    let items: Vec<ItemSummary> = state
        .matcher
        .search_catalog_for_ingestion(ingestion_id, &query.q, query.limit, query.offset)
        .await?
        .into_iter()
        .map(ItemSummary::from)
        .collect();
    let count = items.len();
    Ok(Json(ItemsResponse { ok: true, items, count }))
}

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    pub top: Option<i64>,
}

/// Candidate row flattened for suggestion display.
#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub item_id: String,
    pub name: Option<String>,
    pub hsn_or_sac: Option<String>,
    pub similarity: f64,
    pub reason: Option<String>,
    pub rank: i32,
}

impl From<MatchCandidate> for CandidateSummary {
    fn from(cand: MatchCandidate) -> Self {
        Self {
            item_id: cand.candidate_item_id,
            name: cand.candidate_name,
            hsn_or_sac: cand.hsn_or_sac,
            similarity: cand.similarity,
            reason: cand.reason,
            rank: cand.rank,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub ok: bool,
    pub items: Vec<CandidateSummary>,
    pub count: usize,
}

pub async fn line_candidates(
    State(state): State<AppState>,
    Path(line_id): Path<i64>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<CandidatesResponse>> {
    let items: Vec<CandidateSummary> = state
        .matcher
        .list_candidates(line_id, query.top)
        .await?
        .into_iter()
        .map(CandidateSummary::from)
        .collect();
    let count = items.len();
    Ok(Json(CandidatesResponse { ok: true, items, count }))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub item_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignResponse {
    pub ok: bool,
    pub counts: LineCounts,
}

pub async fn assign_item(
    State(state): State<AppState>,
    Path((ingestion_id, line_id)): Path<(i64, i64)>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<AssignResponse>> {
    let item_id = request.item_id.unwrap_or_default();
    let counts = state
        .matcher
        .assign_item(ingestion_id, line_id, &item_id)
        .await?;
    Ok(Json(AssignResponse { ok: true, counts }))
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub async fn mark_needs_create(
    State(state): State<AppState>,
    Path((_ingestion_id, line_id)): Path<(i64, i64)>,
) -> Result<Json<OkResponse>> {
    state.matcher.mark_needs_create(line_id).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ok: bool,
    pub approval_status: &'static str,
}

pub async fn request_ready(
    State(state): State<AppState>,
    Path(ingestion_id): Path<i64>,
) -> Result<Json<ReadyResponse>> {
    let approval = state.readiness.request_ready(ingestion_id).await?;
    Ok(Json(ReadyResponse {
        ok: true,
        approval_status: approval.as_str(),
    }))
}

pub async fn start_ingestion(
    State(state): State<AppState>,
    Path(ingestion_id): Path<i64>,
) -> Result<Json<StartAck>> {
    Ok(Json(state.pipeline.start_ingestion(ingestion_id).await?))
}
