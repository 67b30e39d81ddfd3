use triagem_core::{DraftTransaction, Rule, RuleMatch};

/// Evaluates one rule against a draft. A rule without a predicate never matches.
pub fn rule_matches(tx: &DraftTransaction, rule: &Rule) -> bool {
    rule.criteria
        .as_ref()
        .is_some_and(|criteria| criteria_matches(tx, criteria))
}

/// Evaluates a predicate stage by stage, stopping at the first failure:
/// any-terms, all-terms, none-terms, account, card, amount bounds.
/// A predicate with no constrained stage matches everything.
pub fn criteria_matches(tx: &DraftTransaction, m: &RuleMatch) -> bool {
    let text = tx.description.to_lowercase();

    let legacy = m
        .description_includes
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    if !m.any_includes.is_empty() || legacy.is_some() {
        let any_hit = m.any_includes.iter().any(|t| text.contains(t))
            || legacy.as_deref().is_some_and(|t| text.contains(t));
        if !any_hit {
            return false;
        }
    }

    if !m.all_includes.iter().all(|t| text.contains(t)) {
        return false;
    }

    if m.none_includes.iter().any(|t| text.contains(t)) {
        return false;
    }

    if let Some(account) = id_filter(&m.account_id) {
        if tx.account_id.as_deref() != Some(account) {
            return false;
        }
    }

    if let Some(card) = id_filter(&m.card_id) {
        if tx.card_id.as_deref() != Some(card) {
            return false;
        }
    }

    if m.min_amount_brl.is_some() || m.max_amount_brl.is_some() {
        let amount = tx.absolute_amount();
        if m.min_amount_brl.is_some_and(|min| amount < min) {
            return false;
        }
        if m.max_amount_brl.is_some_and(|max| amount > max) {
            return false;
        }
    }

    true
}

fn id_filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
