use serde::{Deserialize, Serialize};
use tracing::debug;

use triagem_core::{blank, find_subcategory, DraftTransaction, Rule, Subcategory};

use crate::matcher::rule_matches;
use crate::ruleset::RuleSet;

/// How a matching rule's `tags` action combines with the draft's tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPolicy {
    /// Append missing tags, never remove any. `overwrite` is ignored.
    #[default]
    Merge,
    /// Like `Merge`, except an `overwrite` rule with tags replaces the list.
    RespectOverwrite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub tag_policy: TagPolicy,
}

/// A draft after rule application, plus the ids of the rules that fired in
/// the order they were applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleApplication {
    pub draft: DraftTransaction,
    pub applied_rule_ids: Vec<String>,
}

impl RuleApplication {
    /// The draft as given, with nothing applied.
    pub fn unchanged(draft: &DraftTransaction) -> Self {
        RuleApplication {
            draft: draft.clone(),
            applied_rule_ids: Vec::new(),
        }
    }
}

pub fn apply_rules_to_draft(
    draft: &DraftTransaction,
    rules: &RuleSet,
    subcategories: &[Subcategory],
) -> RuleApplication {
    apply_rules_with_options(draft, rules, subcategories, EngineOptions::default())
}

/// Runs every active rule against a copy of `draft`. The caller's draft is
/// never touched. Later rules see fields set by earlier ones.
pub fn apply_rules_with_options(
    draft: &DraftTransaction,
    rules: &RuleSet,
    subcategories: &[Subcategory],
    options: EngineOptions,
) -> RuleApplication {
    let mut updated = draft.clone();
    let mut applied_rule_ids = Vec::new();

    for rule in rules.rules() {
        if !rule_matches(&updated, rule) {
            continue;
        }
        debug!(rule_id = %rule.id, draft_id = %updated.id, "rule matched");
        applied_rule_ids.push(rule.id.clone());
        apply_actions(&mut updated, rule, subcategories, options);
    }

    updated.applied_rule_ids = applied_rule_ids.clone();
    RuleApplication {
        draft: updated,
        applied_rule_ids,
    }
}

/// Applies rules to each draft independently; results keep input order.
pub fn apply_rules_to_many(
    drafts: &[DraftTransaction],
    rules: &RuleSet,
    subcategories: &[Subcategory],
) -> Vec<RuleApplication> {
    apply_many_with_options(drafts, rules, subcategories, EngineOptions::default())
}

pub fn apply_many_with_options(
    drafts: &[DraftTransaction],
    rules: &RuleSet,
    subcategories: &[Subcategory],
    options: EngineOptions,
) -> Vec<RuleApplication> {
    drafts
        .iter()
        .map(|d| apply_rules_with_options(d, rules, subcategories, options))
        .collect()
}

fn apply_actions(
    draft: &mut DraftTransaction,
    rule: &Rule,
    subcategories: &[Subcategory],
    options: EngineOptions,
) {
    let actions = &rule.actions;
    let overwrite = rule.overwrite();

    // Category the subcategory action must agree with.
    let target_category = match action_value(&actions.category_id) {
        Some(category) if overwrite || blank(&draft.category_id) => Some(category.to_string()),
        _ => draft.category_id.clone(),
    };

    assign(&mut draft.category_id, &actions.category_id, overwrite);

    if let Some(sub_id) = action_value(&actions.subcategory_id) {
        let target = target_category.as_deref().unwrap_or_default();
        match find_subcategory(subcategories, sub_id) {
            Some(sub) if sub.belongs_to(target) => {
                assign(&mut draft.subcategory_id, &actions.subcategory_id, overwrite);
            }
            _ => {
                debug!(
                    rule_id = %rule.id,
                    subcategory_id = sub_id,
                    category_id = target,
                    "subcategory action dropped: not in effective category"
                );
            }
        }
    }

    assign(&mut draft.person_id, &actions.person_id, overwrite);
    assign(&mut draft.account_id, &actions.account_id, overwrite);
    assign(&mut draft.kind, &actions.kind, overwrite);

    let replace = overwrite && options.tag_policy == TagPolicy::RespectOverwrite;
    merge_tags(&mut draft.tags, &actions.tags, replace);
}

fn action_value(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Sets `field` from the action when the field is empty or `overwrite` holds.
fn assign(field: &mut Option<String>, value: &Option<String>, overwrite: bool) {
    if let Some(v) = action_value(value) {
        if overwrite || blank(field) {
            *field = Some(v.to_string());
        }
    }
}

fn merge_tags(tags: &mut Vec<String>, incoming: &[String], replace: bool) {
    let incoming: Vec<&str> = incoming
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if replace && !incoming.is_empty() {
        tags.clear();
    }
    for tag in incoming {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
}
