use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use triagem_classify::{
    check_rules, parse_rules_toml, read_rules, EngineOptions, HistoryIndex, Pipeline, RuleIssue,
    RuleSet,
};
use triagem_core::{DraftTransaction, HistoricalTransaction, Rule, Subcategory};

pub struct ClassifyInput {
    pub rules: PathBuf,
    pub drafts: PathBuf,
    pub subcategories: Option<PathBuf>,
    pub history: Option<PathBuf>,
    pub window: usize,
    pub options: EngineOptions,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_optional_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    match path {
        Some(p) => read_json(p),
        None => Ok(Vec::new()),
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// TOML rule files are authored by hand and parsed strictly. JSON payloads
/// come from the record store and get the lenient loader.
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    if is_toml(path) {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let rules = parse_rules_toml(&content)
            .with_context(|| format!("Invalid rules file {}", path.display()))?;
        return Ok(RuleSet::new(rules));
    }
    let payload: Value = read_json(path)?;
    Ok(RuleSet::from_json_value(&payload))
}

pub fn load_history(path: Option<&Path>, window: usize) -> Result<HistoryIndex> {
    let records: Vec<HistoricalTransaction> = read_optional_json(path)?;
    let index = HistoryIndex::build(&records, window);
    info!(records = records.len(), keys = index.len(), window, "history index built");
    Ok(index)
}

pub fn classify(input: &ClassifyInput) -> Result<Value> {
    let rules = load_rule_set(&input.rules)?;
    let subcategories: Vec<Subcategory> = read_optional_json(input.subcategories.as_deref())?;
    let history = load_history(input.history.as_deref(), input.window)?;
    let drafts: Vec<DraftTransaction> = read_json(&input.drafts)?;
    info!(rules = rules.len(), drafts = drafts.len(), "classifying drafts");

    let pipeline = Pipeline::new(rules, subcategories, history).with_options(input.options);
    to_value(&pipeline.run(&drafts))
}

pub fn history(path: &Path, window: usize) -> Result<Value> {
    to_value(&load_history(Some(path), window)?)
}

pub fn check(rules_path: &Path, subcategories: Option<&Path>) -> Result<Vec<RuleIssue>> {
    let rules: Vec<Rule> = read_rules(rules_path)
        .with_context(|| format!("Invalid rules file {}", rules_path.display()))?;
    let subcategories: Vec<Subcategory> = read_optional_json(subcategories)?;
    let issues = check_rules(&rules, &subcategories);
    for issue in &issues {
        warn!("{issue}");
    }
    Ok(issues)
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

pub fn write_output(value: &Value, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
