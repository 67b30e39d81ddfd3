use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use triagem_core::Rule;

#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse rules TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// TOML rule files hold an array of `[[rules]]` tables.
#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// Parses a JSON array of rules, failing on the first malformed entry.
pub fn parse_rules_json(content: &str) -> Result<Vec<Rule>, RuleLoadError> {
    Ok(serde_json::from_str(content)?)
}

pub fn parse_rules_toml(content: &str) -> Result<Vec<Rule>, RuleLoadError> {
    let file: RulesFile = toml::from_str(content)?;
    Ok(file.rules)
}

/// Reads a rule file, choosing the format by extension (`.toml`, else JSON).
pub fn read_rules(path: &Path) -> Result<Vec<Rule>, RuleLoadError> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => parse_rules_toml(&content),
        _ => parse_rules_json(&content),
    }
}

/// The active rules in evaluation order.
///
/// Built once per batch: disabled rules are dropped, match terms are
/// normalised, and the rest are sorted ascending by priority. The sort is
/// stable, so rules with equal priority keep their authoring order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut active: Vec<Rule> = rules
            .into_iter()
            .filter(Rule::is_enabled)
            .map(Rule::normalized)
            .collect();
        active.sort_by_key(Rule::priority);
        Self { rules: active }
    }

    /// Lenient loader for untrusted payloads. Anything other than an array
    /// yields an empty set; entries that do not deserialize are skipped.
    pub fn from_json_value(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            warn!("rules payload is not an array; no rules will be applied");
            return Self::default();
        };
        let rules = items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match Rule::deserialize(item) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(index = idx, error = %e, "skipping malformed rule");
                    None
                }
            })
            .collect();
        Self::new(rules)
    }

    pub fn from_json_str(content: &str) -> Result<Self, RuleLoadError> {
        parse_rules_json(content).map(Self::new)
    }

    pub fn from_toml(content: &str) -> Result<Self, RuleLoadError> {
        parse_rules_toml(content).map(Self::new)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(set: &RuleSet) -> Vec<&str> {
        set.rules().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn sorts_ascending_by_priority_and_keeps_ties_stable() {
        let set = RuleSet::from_json_str(
            r#"[
                {"id":"c","priority":3,"match":{}},
                {"id":"a1","priority":1,"match":{}},
                {"id":"none","match":{}},
                {"id":"a2","priority":1,"match":{}},
                {"id":"b","priority":2,"match":{}}
            ]"#,
        )
        .unwrap();
        assert_eq!(ids(&set), vec!["none", "a1", "a2", "b", "c"]);
    }

    #[test]
    fn drops_disabled_rules_only_when_explicitly_false() {
        let set = RuleSet::from_json_str(
            r#"[{"id":"on","enabled":true},{"id":"off","enabled":false},{"id":"default"}]"#,
        )
        .unwrap();
        assert_eq!(ids(&set), vec!["on", "default"]);
    }

    #[test]
    fn normalizes_legacy_terms_on_load() {
        let set = RuleSet::from_json_str(
            r#"[{"id":"r1","match":{"descriptionIncludes":"Padaria","anyIncludes":"Mercado, Feira"}}]"#,
        )
        .unwrap();
        let m = set.rules()[0].criteria.as_ref().unwrap();
        assert_eq!(m.any_includes.iter().collect::<Vec<_>>(), vec!["mercado", "feira", "padaria"]);
    }

    #[test]
    fn non_array_payload_is_an_empty_set() {
        assert!(RuleSet::from_json_value(&json!({"id": "r1"})).is_empty());
        assert!(RuleSet::from_json_value(&json!("rules")).is_empty());
        assert!(RuleSet::from_json_value(&Value::Null).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let set = RuleSet::from_json_value(&json!([
            {"id": "good", "match": {"anyIncludes": ["uber"]}},
            {"priority": "high"},
            42,
            {"id": "also-good"}
        ]));
        assert_eq!(ids(&set), vec!["good", "also-good"]);
    }

    #[test]
    fn strict_json_loader_reports_errors() {
        assert!(matches!(
            RuleSet::from_json_str("{not json"),
            Err(RuleLoadError::Json(_))
        ));
    }

    #[test]
    fn loads_toml_rule_tables() {
        let set = RuleSet::from_toml(
            r#"
            [[rules]]
            id = "uber"
            priority = 2
            [rules.match]
            anyIncludes = ["uber", "99app"]
            [rules.actions]
            categoryId = "transport"
            tags = ["ride"]
            [rules.options]
            overwrite = true

            [[rules]]
            id = "padaria"
            priority = 1
            [rules.match]
            anyIncludes = "padaria, panificadora"
            maxAmountBRL = 80.0
            "#,
        )
        .unwrap();
        assert_eq!(ids(&set), vec!["padaria", "uber"]);
        let uber = &set.rules()[1];
        assert!(uber.overwrite());
        assert_eq!(uber.actions.category_id.as_deref(), Some("transport"));
    }

    #[test]
    fn read_rules_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("rules.toml");
        std::fs::write(&toml_path, "[[rules]]\nid = \"t\"\n").unwrap();
        let json_path = dir.path().join("rules.json");
        std::fs::write(&json_path, r#"[{"id":"j"}]"#).unwrap();

        assert_eq!(read_rules(&toml_path).unwrap()[0].id, "t");
        assert_eq!(read_rules(&json_path).unwrap()[0].id, "j");
        assert!(matches!(
            read_rules(&dir.path().join("missing.json")),
            Err(RuleLoadError::Io(_))
        ));
    }
}
