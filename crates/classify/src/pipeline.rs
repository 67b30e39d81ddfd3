use serde::Serialize;
use tracing::info;

use triagem_core::{Confidence, DraftTransaction, Subcategory};

use crate::confidence::classify_draft;
use crate::engine::{apply_rules_with_options, EngineOptions};
use crate::history::HistoryIndex;
use crate::ruleset::RuleSet;

/// How many drafts a rule fired on in one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleHit {
    pub rule_id: String,
    pub hits: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub alta: usize,
    pub media: usize,
    pub baixa: usize,
    /// Every active rule, in evaluation order, including those with no hits.
    pub rule_hits: Vec<RuleHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedBatch {
    pub drafts: Vec<DraftTransaction>,
    pub summary: BatchSummary,
}

/// Rule engine followed by the confidence classifier, over read-only inputs.
///
/// Each draft is classified independently, so `classify` may be called from
/// several threads on a shared pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    rules: RuleSet,
    subcategories: Vec<Subcategory>,
    history: HistoryIndex,
    options: EngineOptions,
}

impl Pipeline {
    pub fn new(rules: RuleSet, subcategories: Vec<Subcategory>, history: HistoryIndex) -> Self {
        Self {
            rules,
            subcategories,
            history,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn classify(&self, draft: &DraftTransaction) -> DraftTransaction {
        let applied = apply_rules_with_options(draft, &self.rules, &self.subcategories, self.options);
        classify_draft(applied.draft, &self.history)
    }

    pub fn run(&self, drafts: &[DraftTransaction]) -> ClassifiedBatch {
        let classified: Vec<DraftTransaction> = drafts.iter().map(|d| self.classify(d)).collect();
        let summary = self.summarize(&classified);
        info!(
            total = summary.total,
            alta = summary.alta,
            media = summary.media,
            baixa = summary.baixa,
            "classified batch"
        );
        ClassifiedBatch {
            drafts: classified,
            summary,
        }
    }

    fn summarize(&self, drafts: &[DraftTransaction]) -> BatchSummary {
        let mut summary = BatchSummary {
            total: drafts.len(),
            rule_hits: self
                .rules
                .rules()
                .iter()
                .map(|r| RuleHit {
                    rule_id: r.id.clone(),
                    hits: 0,
                })
                .collect(),
            ..Default::default()
        };

        for draft in drafts {
            match draft.confidence {
                Some(Confidence::Alta) | Some(Confidence::ConfirmedAlta) => summary.alta += 1,
                Some(Confidence::Media) => summary.media += 1,
                Some(Confidence::Baixa) | None => summary.baixa += 1,
            }
            for id in &draft.applied_rule_ids {
                if let Some(hit) = summary.rule_hits.iter_mut().find(|h| &h.rule_id == id) {
                    hit.hits += 1;
                }
            }
        }
        summary
    }
}
