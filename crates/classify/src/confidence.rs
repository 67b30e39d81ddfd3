use tracing::debug;

use triagem_core::{blank, Confidence, DraftTransaction};

use crate::history::HistoryIndex;

/// Assigns a confidence tier to a draft that has been through the rule
/// engine, backfilling empty fields from history when no rule fired.
///
/// - any applied rule: `alta`, no backfill
/// - history hit with a category: `media`, empty fields filled from history
/// - otherwise: `baixa`
pub fn classify_draft(mut draft: DraftTransaction, history: &HistoryIndex) -> DraftTransaction {
    if !draft.applied_rule_ids.is_empty() {
        draft.confidence = Some(Confidence::Alta);
        return draft;
    }

    let Some(entry) = history
        .lookup(&draft.description)
        .filter(|e| !blank(&e.category_id))
    else {
        draft.confidence = Some(Confidence::Baixa);
        return draft;
    };

    debug!(draft_id = %draft.id, "history match");
    fill(&mut draft.category_id, &entry.category_id);
    fill(&mut draft.subcategory_id, &entry.subcategory_id);
    fill(&mut draft.card_type, &entry.card_type);
    fill(&mut draft.payer_role, &entry.payer_role);
    fill(&mut draft.person_id, &entry.person_id);
    if draft.tags.is_empty() {
        draft.tags = entry.tags.clone();
    }
    draft.confidence = Some(Confidence::Media);
    draft
}

pub fn classify_many(drafts: Vec<DraftTransaction>, history: &HistoryIndex) -> Vec<DraftTransaction> {
    drafts
        .into_iter()
        .map(|d| classify_draft(d, history))
        .collect()
}

fn fill(field: &mut Option<String>, from: &Option<String>) {
    if blank(field) && !blank(from) {
        field.clone_from(from);
    }
}
