use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Structured extraction result, 1:1 with an ingestion once parsed.
/// Populated by the external pipeline; read-only here apart from cascade
/// delete with its ingestion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: i64,
    pub org_id: String,
    pub ingestion_id: i64,
    pub vendor_name: Option<String>,
    pub vendor_gstin: Option<String>,
    pub bill_number: Option<String>,
    pub bill_date: Option<NaiveDate>,
    pub grand_total: Option<BigDecimal>,
    pub currency: Option<String>,
}

/// One extracted line item. `line_no` is 1-based and dense within an
/// invoice; it doubles as the join key into the draft payload's line-item
/// array (index = line_no - 1).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub line_id: i64,
    pub invoice_id: i64,
    pub line_no: i32,
    pub description: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub rate: Option<BigDecimal>,
    pub amount: Option<BigDecimal>,
    /// Denormalized catalog name cache; refreshed best-effort on reads.
    pub item_name: Option<String>,
    pub match_state: String,
    pub item_id: Option<String>,
}

impl InvoiceLine {
    /// Parsed match state. Rows can carry strings written by older pipeline
    /// versions; anything unrecognized is `None` and counts as neither
    /// unmatched nor to_create.
    pub fn state(&self) -> Option<MatchState> {
        MatchState::parse(&self.match_state)
    }
}

/// Per-line catalog reconciliation lifecycle.
///
/// `unmatched` -> `auto_matched` is driven by the external pipeline,
/// `human_matched` / `to_create` by reviewer actions here, and
/// `to_create` -> `created` by the pipeline once the catalog item exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Unmatched,
    ToCreate,
    AutoMatched,
    HumanMatched,
    Created,
}

impl MatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchState::Unmatched => "unmatched",
            MatchState::ToCreate => "to_create",
            MatchState::AutoMatched => "auto_matched",
            MatchState::HumanMatched => "human_matched",
            MatchState::Created => "created",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unmatched" => Some(MatchState::Unmatched),
            "to_create" => Some(MatchState::ToCreate),
            "auto_matched" => Some(MatchState::AutoMatched),
            "human_matched" => Some(MatchState::HumanMatched),
            "created" => Some(MatchState::Created),
            _ => None,
        }
    }
}

/// Counters gating the readiness decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub unmatched: usize,
    pub to_create: usize,
}

impl LineCounts {
    pub fn tally(lines: &[InvoiceLine]) -> Self {
        let mut counts = LineCounts::default();
        for line in lines {
            match line.state() {
                Some(MatchState::Unmatched) => counts.unmatched += 1,
                Some(MatchState::ToCreate) => counts.to_create += 1,
                _ => {}
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(no: i32, state: &str) -> InvoiceLine {
        InvoiceLine {
            line_id: i64::from(no),
            invoice_id: 1,
            line_no: no,
            description: None,
            quantity: None,
            rate: None,
            amount: None,
            item_name: None,
            match_state: state.to_string(),
            item_id: None,
        }
    }

    #[test]
    fn tally_counts_only_known_gating_states() {
        let lines = vec![
            line(1, "unmatched"),
            line(2, "to_create"),
            line(3, "unmatched"),
            line(4, "human_matched"),
            line(5, "bogus_state"),
        ];
        let counts = LineCounts::tally(&lines);
        assert_eq!(counts.unmatched, 2);
        assert_eq!(counts.to_create, 1);
    }

    #[test]
    fn match_state_round_trips() {
        for s in ["unmatched", "to_create", "auto_matched", "human_matched", "created"] {
            assert_eq!(MatchState::parse(s).map(|m| m.as_str()), Some(s));
        }
        assert_eq!(MatchState::parse("Unmatched"), None);
    }
}
