pub mod line_match;
pub mod listing;
pub mod pipeline;
pub mod readiness;
pub mod reconciler;

pub use line_match::LineMatcher;
pub use listing::{IngestionBoard, IngestionListItem, IngestionListPage};
pub use pipeline::{PipelineClient, StartAck};
pub use readiness::ReadinessEngine;
pub use reconciler::{DraftReconciler, IngestionDetail, NameResolution};
