use serde::Serialize;
use std::fmt;

use triagem_core::{find_subcategory, Rule, Subcategory};

/// Authoring problems the engine tolerates at classification time but a
/// rule editor should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// No `match` block; the rule never fires.
    Inert,
    Disabled,
    /// Empty predicate; the rule fires on every transaction.
    MatchesEverything,
    UnknownSubcategory { subcategory_id: String },
    SubcategoryOutsideCategory {
        subcategory_id: String,
        category_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleIssue {
    pub rule_id: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Inert => write!(f, "rule '{}' has no match criteria and never fires", self.rule_id),
            IssueKind::Disabled => write!(f, "rule '{}' is disabled", self.rule_id),
            IssueKind::MatchesEverything => {
                write!(f, "rule '{}' has empty criteria and matches every transaction", self.rule_id)
            }
            IssueKind::UnknownSubcategory { subcategory_id } => write!(
                f,
                "rule '{}' assigns unknown subcategory '{subcategory_id}'",
                self.rule_id
            ),
            IssueKind::SubcategoryOutsideCategory {
                subcategory_id,
                category_id,
            } => write!(
                f,
                "rule '{}' assigns subcategory '{subcategory_id}' which is not in category '{category_id}'",
                self.rule_id
            ),
        }
    }
}

/// Reports authoring problems in input order. Checking never changes how the
/// rules classify.
pub fn check_rules(rules: &[Rule], subcategories: &[Subcategory]) -> Vec<RuleIssue> {
    let mut issues = Vec::new();
    for rule in rules {
        let mut push = |kind| {
            issues.push(RuleIssue {
                rule_id: rule.id.clone(),
                kind,
            })
        };

        if !rule.is_enabled() {
            push(IssueKind::Disabled);
        }
        match &rule.criteria {
            None => push(IssueKind::Inert),
            Some(m) if m.is_unconstrained() => push(IssueKind::MatchesEverything),
            Some(_) => {}
        }

        let Some(sub_id) = rule.actions.subcategory_id.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        match find_subcategory(subcategories, sub_id) {
            None => push(IssueKind::UnknownSubcategory {
                subcategory_id: sub_id.to_string(),
            }),
            Some(sub) => {
                if let Some(category) = rule.actions.category_id.as_deref().filter(|c| !c.is_empty()) {
                    if sub.category_id != category {
                        push(IssueKind::SubcategoryOutsideCategory {
                            subcategory_id: sub_id.to_string(),
                            category_id: category.to_string(),
                        });
                    }
                }
            }
        }
    }
    issues
}
