use serde::{Deserialize, Deserializer, Serialize};

use crate::money::Money;

/// A list of match terms, normalised once when the rule is loaded.
///
/// Accepts either a JSON/TOML sequence or a comma-separated string. Terms are
/// trimmed, lowercased, and empty entries dropped, so matching can compare
/// against a lowercased description without re-normalising per draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Terms(Vec<String>);

impl Terms {
    pub fn parse(csv: &str) -> Self {
        Self::from_iter(csv.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn push(&mut self, term: &str) {
        if let Some(t) = normalize_term(term) {
            if !self.0.contains(&t) {
                self.0.push(t);
            }
        }
    }
}

impl<'a> FromIterator<&'a str> for Terms {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut terms = Terms::default();
        for t in iter {
            terms.push(t);
        }
        terms
    }
}

fn normalize_term(term: &str) -> Option<String> {
    let t = term.trim();
    (!t.is_empty()).then(|| t.to_lowercase())
}

impl<'de> Deserialize<'de> for Terms {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Csv(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::List(items)) => items.iter().map(String::as_str).collect(),
            Some(Raw::Csv(s)) => Terms::parse(&s),
            None => Terms::default(),
        })
    }
}

/// The predicate half of a rule. See `Rule::criteria`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleMatch {
    pub any_includes: Terms,
    pub all_includes: Terms,
    pub none_includes: Terms,
    /// Legacy single-term field. Folded into `any_includes` by `Rule::normalized`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_includes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(rename = "minAmountBRL", skip_serializing_if = "Option::is_none")]
    pub min_amount_brl: Option<Money>,
    #[serde(rename = "maxAmountBRL", skip_serializing_if = "Option::is_none")]
    pub max_amount_brl: Option<Money>,
}

impl RuleMatch {
    /// True when no stage of the predicate is constrained, i.e. the rule
    /// matches every transaction.
    pub fn is_unconstrained(&self) -> bool {
        self.any_includes.is_empty()
            && self.all_includes.is_empty()
            && self.none_includes.is_empty()
            && blank(&self.description_includes)
            && blank(&self.account_id)
            && blank(&self.card_id)
            && self.min_amount_brl.is_none()
            && self.max_amount_brl.is_none()
    }

    fn fold_legacy(mut self) -> Self {
        if let Some(term) = self.description_includes.take() {
            self.any_includes.push(&term);
        }
        self.account_id = non_blank(self.account_id);
        self.card_id = non_blank(self.card_id);
        self
    }
}

/// Field assignments a matching rule performs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleActions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub overwrite: bool,
}

/// A user-authored classification rule.
///
/// `priority` and `enabled` stay optional so a round-trip through the engine
/// keeps the record exactly as the user wrote it; use `priority()` and
/// `is_enabled()` for the effective values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub enabled: Option<bool>,
    /// A rule without a predicate is inert.
    #[serde(default, rename = "match")]
    pub criteria: Option<RuleMatch>,
    #[serde(default)]
    pub actions: RuleActions,
    #[serde(default)]
    pub options: RuleOptions,
}

impl Rule {
    pub fn new(id: &str, criteria: RuleMatch, actions: RuleActions) -> Self {
        Rule {
            id: id.to_string(),
            name: None,
            priority: None,
            enabled: None,
            criteria: Some(criteria),
            actions,
            options: RuleOptions::default(),
        }
    }

    pub fn priority(&self) -> i64 {
        self.priority.unwrap_or(0)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    pub fn overwrite(&self) -> bool {
        self.options.overwrite
    }

    /// Folds the legacy `descriptionIncludes` term into `anyIncludes` and
    /// drops blank id filters.
    pub fn normalized(mut self) -> Self {
        self.criteria = self.criteria.map(RuleMatch::fold_legacy);
        self
    }
}

/// `None` and `Some("")` are both "unset" for classification fields.
pub fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
