pub mod catalog;
pub mod draft;
pub mod ingestion;
pub mod invoice;

pub use catalog::{CatalogItem, MatchCandidate, Vendor};
pub use draft::{DraftLineItem, DraftPayload, EnrichedDraft, EnrichedDraftLine, MAX_DRAFT_LINES};
pub use ingestion::{
    ApprovalStatus, Ingestion, IngestionStatus, ListFilter, MetricsSummary, UiState,
};
pub use invoice::{Invoice, InvoiceLine, LineCounts, MatchState};
