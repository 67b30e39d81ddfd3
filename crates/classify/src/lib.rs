pub mod confidence;
pub mod diagnostics;
pub mod engine;
pub mod history;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod ruleset;

pub use confidence::{classify_draft, classify_many};
pub use diagnostics::{check_rules, IssueKind, RuleIssue};
pub use engine::{
    apply_many_with_options, apply_rules_to_draft, apply_rules_to_many, apply_rules_with_options,
    EngineOptions, RuleApplication, TagPolicy,
};
pub use history::{build_history_index, HistoryEntry, HistoryIndex, DEFAULT_HISTORY_WINDOW};
pub use matcher::{criteria_matches, rule_matches};
pub use normalize::normalize_description;
pub use pipeline::{BatchSummary, ClassifiedBatch, Pipeline, RuleHit};
pub use ruleset::{parse_rules_json, parse_rules_toml, read_rules, RuleLoadError, RuleSet};

/// Entry points for callers that hold untyped rule payloads.
pub mod classify {
    use crate::*;
    use serde_json::Value;
    use tracing::warn;
    use triagem_core::{DraftTransaction, HistoricalTransaction, Subcategory};

    /// Applies a raw rules payload to one draft. A payload that is not an
    /// array hands the draft back untouched, earlier `appliedRuleIds`
    /// included, with an empty applied list.
    pub fn apply_rules_json(
        draft: &DraftTransaction,
        rules: &Value,
        subcategories: &[Subcategory],
    ) -> RuleApplication {
        if !rules.is_array() {
            warn!("rules payload is not an array; draft left unchanged");
            return RuleApplication::unchanged(draft);
        }
        apply_rules_to_draft(draft, &RuleSet::from_json_value(rules), subcategories)
    }

    pub fn apply_rules_json_to_many(
        drafts: &[DraftTransaction],
        rules: &Value,
        subcategories: &[Subcategory],
    ) -> Vec<RuleApplication> {
        if !rules.is_array() {
            warn!("rules payload is not an array; drafts left unchanged");
            return drafts.iter().map(RuleApplication::unchanged).collect();
        }
        apply_rules_to_many(drafts, &RuleSet::from_json_value(rules), subcategories)
    }

    pub fn create_pipeline(
        rules: &Value,
        subcategories: Vec<Subcategory>,
        recent: &[HistoricalTransaction],
        window: usize,
    ) -> Pipeline {
        Pipeline::new(
            RuleSet::from_json_value(rules),
            subcategories,
            HistoryIndex::build(recent, window),
        )
    }

}
