use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reusable item definition scoped to an organization. Supplied by the
/// external catalog collaborator; read-only here.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: String,
    pub org_id: String,
    pub name: Option<String>,
    pub hsn_or_sac: Option<String>,
    pub sku: Option<String>,
}

/// Vendor master record, used only for display-name resolution.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: String,
    pub org_id: String,
    pub name: Option<String>,
}

/// Precomputed suggestion linking a line to a catalog item. `rank` is the
/// authoritative curation signal; `similarity` is a secondary heuristic.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub line_id: i64,
    pub candidate_item_id: String,
    pub candidate_name: Option<String>,
    pub hsn_or_sac: Option<String>,
    pub similarity: f64,
    pub reason: Option<String>,
    pub rank: i32,
}
