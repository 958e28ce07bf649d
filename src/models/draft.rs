use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ReviewError, Result};

/// Hard bound on draft line-array padding. Relational line numbers can
/// drift ahead of the draft's array, but a line_no past this bound is
/// treated as corrupt input rather than silently allocated.
pub const MAX_DRAFT_LINES: usize = 200;

/// The semi-structured bill document awaiting reviewer edits, as written
/// by the extraction pipeline and ultimately submitted for posting.
///
/// Fields the engine never touches are carried through `extra` so a
/// read-modify-write of the line-item array does not strip what the
/// pipeline wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bill_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_item_level_tax_calc: Option<bool>,
    #[serde(default)]
    pub line_items: Vec<DraftLineItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the draft's ordered line-item array. Position in the
/// array corresponds to `line_no - 1` of the relational line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftLineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hsn_or_sac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DraftPayload {
    /// Parse a stored draft column. Anything that is not a JSON object is
    /// treated as absent, matching how readers tolerate pipeline quirks.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ReviewError::Upstream(e.to_string()))
    }

    /// Mutable access to the line entry at `index`, extending the array
    /// with empty placeholder entries when the draft is shorter than the
    /// relational line set. Refuses indexes past [`MAX_DRAFT_LINES`].
    pub fn line_slot(&mut self, index: usize) -> Result<&mut DraftLineItem> {
        if index >= MAX_DRAFT_LINES {
            return Err(ReviewError::validation(format!(
                "line index {} exceeds draft bound {}",
                index, MAX_DRAFT_LINES
            )));
        }
        while self.line_items.len() <= index {
            self.line_items.push(DraftLineItem::default());
        }
        Ok(&mut self.line_items[index])
    }
}

/// Draft decorated with display names for approval screens. Ids stay
/// authoritative; names are best-effort and may be null after a degraded
/// lookup.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedDraft {
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub bill_number: Option<String>,
    pub discount_type: Option<String>,
    pub is_item_level_tax_calc: bool,
    pub vendor_id: Option<String>,
    pub vendor_name: Option<String>,
    pub line_items: Vec<EnrichedDraftLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichedDraftLine {
    #[serde(flatten)]
    pub entry: DraftLineItem,
    pub item_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_slot_pads_with_placeholders_and_keeps_existing() {
        let mut draft = DraftPayload::default();
        draft.line_items.push(DraftLineItem {
            item_id: Some("it_1".to_string()),
            ..Default::default()
        });

        // line_no = 3 on a 1-entry draft
        let slot = draft.line_slot(2).unwrap();
        slot.item_id = Some("it_3".to_string());

        assert_eq!(draft.line_items.len(), 3);
        assert_eq!(draft.line_items[0].item_id.as_deref(), Some("it_1"));
        assert_eq!(draft.line_items[1], DraftLineItem::default());
        assert_eq!(draft.line_items[2].item_id.as_deref(), Some("it_3"));
    }

    #[test]
    fn line_slot_refuses_unbounded_drift() {
        let mut draft = DraftPayload::default();
        let err = draft.line_slot(MAX_DRAFT_LINES).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        assert!(draft.line_items.is_empty());
    }

    #[test]
    fn unknown_fields_survive_read_modify_write() {
        let raw = json!({
            "vendor_id": "v_9",
            "gst_treatment": "registered",
            "line_items": [
                { "item_id": "it_1", "custom_field": 7 }
            ]
        });
        let mut draft = DraftPayload::from_value(&raw).unwrap();
        draft.line_slot(0).unwrap().item_id = Some("it_2".to_string());
        let out = draft.to_value().unwrap();

        assert_eq!(out["gst_treatment"], json!("registered"));
        assert_eq!(out["line_items"][0]["custom_field"], json!(7));
        assert_eq!(out["line_items"][0]["item_id"], json!("it_2"));
    }

    #[test]
    fn non_object_draft_parses_as_absent() {
        assert!(DraftPayload::from_value(&json!("oops")).is_none());
        assert!(DraftPayload::from_value(&json!(null)).is_none());
        assert!(DraftPayload::from_value(&json!({})).is_some());
    }
}
