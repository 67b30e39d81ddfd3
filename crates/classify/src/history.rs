use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use triagem_core::HistoricalTransaction;

use crate::normalize::normalize_description;

/// How many of the most recent transactions feed the index by default.
pub const DEFAULT_HISTORY_WINDOW: usize = 500;

/// The classification last seen for a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub tags: Vec<String>,
    pub card_type: Option<String>,
    pub payer_role: Option<String>,
    pub person_id: Option<String>,
}

impl From<&HistoricalTransaction> for HistoryEntry {
    fn from(tx: &HistoricalTransaction) -> Self {
        HistoryEntry {
            category_id: tx.category_id.clone(),
            subcategory_id: tx.subcategory_id.clone(),
            tags: tx.tags.clone(),
            card_type: tx.card_type.clone(),
            payer_role: tx.payer_role.clone(),
            person_id: tx.person_id.clone(),
        }
    }
}

/// Most-recent-first lookup from normalised description to the last
/// classification seen for it. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryIndex {
    entries: HashMap<String, HistoryEntry>,
}

impl HistoryIndex {
    /// Builds the index from a snapshot of persisted transactions.
    ///
    /// The snapshot is ordered newest first by `date` (undated records sort
    /// last, ties keep input order) and truncated to `window` records. Only
    /// the newest record per normalised description is kept.
    pub fn build(records: &[HistoricalTransaction], window: usize) -> Self {
        let mut recent: Vec<&HistoricalTransaction> = records.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(window);

        let mut entries = HashMap::new();
        for tx in recent {
            let key = normalize_description(&tx.description);
            if key.is_empty() {
                continue;
            }
            entries.entry(key).or_insert_with(|| HistoryEntry::from(tx));
        }
        Self { entries }
    }

    /// Looks up a raw description; normalisation is applied here.
    pub fn lookup(&self, description: &str) -> Option<&HistoryEntry> {
        self.entries.get(&normalize_description(description))
    }

    pub fn get(&self, key: &str) -> Option<&HistoryEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn build_history_index(records: &[HistoricalTransaction], window: usize) -> HistoryIndex {
    HistoryIndex::build(records, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hist(date: Option<(i32, u32, u32)>, desc: &str, category: &str) -> HistoricalTransaction {
        HistoricalTransaction::new(
            date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            desc,
            category,
        )
    }

    #[test]
    fn keys_are_normalized() {
        let index = HistoryIndex::build(&[hist(None, "Padaria Centro", "food")], 500);
        assert!(index.get("padaria centro").is_some());
        assert_eq!(
            index.lookup("PADARIA  CENTRO").and_then(|e| e.category_id.as_deref()),
            Some("food")
        );
    }

    #[test]
    fn newest_entry_wins_regardless_of_input_order() {
        let records = vec![
            hist(Some((2026, 1, 10)), "Uber Trip", "old"),
            hist(Some((2026, 3, 5)), "UBER TRIP", "new"),
            hist(Some((2026, 2, 1)), "uber trip", "middle"),
        ];
        let index = HistoryIndex::build(&records, 500);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("uber trip").unwrap().category_id.as_deref(), Some("new"));
    }

    #[test]
    fn equal_dates_keep_first_in_input() {
        let records = vec![
            hist(Some((2026, 1, 10)), "Feira", "first"),
            hist(Some((2026, 1, 10)), "feira", "second"),
        ];
        let index = HistoryIndex::build(&records, 500);
        assert_eq!(index.lookup("feira").unwrap().category_id.as_deref(), Some("first"));
    }

    #[test]
    fn window_keeps_only_most_recent_records() {
        let records = vec![
            hist(Some((2025, 12, 1)), "Old Shop", "x"),
            hist(Some((2026, 2, 1)), "Recent A", "a"),
            hist(None, "Undated", "u"),
            hist(Some((2026, 3, 1)), "Recent B", "b"),
        ];
        let index = HistoryIndex::build(&records, 2);
        assert_eq!(index.len(), 2);
        assert!(index.lookup("recent a").is_some());
        assert!(index.lookup("recent b").is_some());
        assert!(index.lookup("old shop").is_none());
        assert!(index.lookup("undated").is_none());
    }

    #[test]
    fn blank_descriptions_are_skipped() {
        let index = HistoryIndex::build(&[hist(None, "   ", "x")], 500);
        assert!(index.is_empty());
    }

    #[test]
    fn entry_carries_full_snapshot() {
        let mut tx = hist(None, "Farmácia", "health");
        tx.subcategory_id = Some("pharmacy".to_string());
        tx.tags = vec!["recurring".to_string()];
        tx.card_type = Some("credit".to_string());
        tx.payer_role = Some("holder".to_string());
        tx.person_id = Some("p1".to_string());
        let index = build_history_index(&[tx], DEFAULT_HISTORY_WINDOW);
        let entry = index.lookup("farmacia").unwrap();
        assert_eq!(entry.subcategory_id.as_deref(), Some("pharmacy"));
        assert_eq!(entry.tags, vec!["recurring"]);
        assert_eq!(entry.card_type.as_deref(), Some("credit"));
        assert_eq!(entry.payer_role.as_deref(), Some("holder"));
        assert_eq!(entry.person_id.as_deref(), Some("p1"));
    }
}
