use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;

/// Trust level of an automatic classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// A rule fired.
    Alta,
    /// No rule fired, filled from history.
    Media,
    /// Nothing to go on.
    Baixa,
    /// An `Alta` classification a reviewer has signed off on.
    ConfirmedAlta,
}

impl Confidence {
    /// Review promotion. Only `Alta` changes.
    pub fn confirm(self) -> Self {
        match self {
            Confidence::Alta => Confidence::ConfirmedAlta,
            other => other,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Alta => write!(f, "alta"),
            Confidence::Media => write!(f, "media"),
            Confidence::Baixa => write!(f, "baixa"),
            Confidence::ConfirmedAlta => write!(f, "confirmed_alta"),
        }
    }
}

impl FromStr for Confidence {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alta" => Ok(Confidence::Alta),
            "media" => Ok(Confidence::Media),
            "baixa" => Ok(Confidence::Baixa),
            "confirmed_alta" => Ok(Confidence::ConfirmedAlta),
            other => Err(CoreError::UnknownConfidence(other.to_string())),
        }
    }
}

/// An unconfirmed transaction awaiting classification and review.
///
/// Fields the engine does not know about (dates, invoice month, raw parser
/// columns) are carried through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTransaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Money>,
    #[serde(default, rename = "valueBRL", skip_serializing_if = "Option::is_none")]
    pub value_brl: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_role: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub applied_rule_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DraftTransaction {
    pub fn new(id: &str, description: &str, value: Money) -> Self {
        DraftTransaction {
            id: id.to_string(),
            description: description.to_string(),
            value: Some(value),
            ..Default::default()
        }
    }

    /// Absolute BRL amount used for amount-bound matching: `valueBRL` when
    /// present, else `value`, else zero.
    pub fn absolute_amount(&self) -> Money {
        self.value_brl.or(self.value).unwrap_or_default().abs()
    }

    /// Promotes `alta` to `confirmed_alta` after human review.
    pub fn confirm(mut self) -> Self {
        self.confidence = self.confidence.map(Confidence::confirm);
        self
    }
}

/// A persisted transaction, as read from the recent-history snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTransaction {
    #[serde(default)]
    pub id: String,
    /// Accepts a plain date or a datetime; anything unparseable is undated.
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub payer_role: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
}

impl HistoricalTransaction {
    pub fn new(date: Option<NaiveDate>, description: &str, category_id: &str) -> Self {
        HistoricalTransaction {
            date,
            description: description.to_string(),
            category_id: Some(category_id.to_string()),
            ..Default::default()
        }
    }
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(str::trim).and_then(parse_date))
}

/// Parses `2026-09-30`, RFC 3339 timestamps, or a naive `2026-09-30 12:00:00`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_amount_prefers_brl_value() {
        let mut tx = DraftTransaction::new("t1", "x", Money::from_cents(-1_000));
        assert_eq!(tx.absolute_amount(), Money::from_cents(1_000));
        tx.value_brl = Some(Money::from_cents(-5_250));
        assert_eq!(tx.absolute_amount(), Money::from_cents(5_250));
        tx.value = None;
        tx.value_brl = None;
        assert_eq!(tx.absolute_amount(), Money::zero());
    }

    #[test]
    fn history_dates_accept_datetimes() {
        let records: Vec<HistoricalTransaction> = serde_json::from_str(
            r#"[
                {"date":"2026-09-30","description":"a"},
                {"date":"2026-09-30T12:00:00Z","description":"b"},
                {"date":"2026-09-30T09:15:00-03:00","description":"c"},
                {"date":"2026-09-30 08:00:00","description":"d"},
                {"date":"30/09/2026","description":"e"},
                {"date":null,"description":"f"},
                {"description":"g"}
            ]"#,
        )
        .unwrap();
        let sept_30 = NaiveDate::from_ymd_opt(2026, 9, 30);
        let dates: Vec<_> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![sept_30, sept_30, sept_30, sept_30, None, None, None]);
    }

    #[test]
    fn confirm_only_promotes_alta() {
        assert_eq!(Confidence::Alta.confirm(), Confidence::ConfirmedAlta);
        assert_eq!(Confidence::Media.confirm(), Confidence::Media);
        assert_eq!(Confidence::Baixa.confirm(), Confidence::Baixa);

        let tx = DraftTransaction {
            confidence: Some(Confidence::Alta),
            ..Default::default()
        };
        assert_eq!(tx.confirm().confidence, Some(Confidence::ConfirmedAlta));
    }

    #[test]
    fn confidence_wire_names() {
        assert_eq!(serde_json::to_string(&Confidence::ConfirmedAlta).unwrap(), "\"confirmed_alta\"");
        assert_eq!("media".parse::<Confidence>().unwrap(), Confidence::Media);
        assert!("high".parse::<Confidence>().is_err());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let json = r#"{"id":"t1","description":"Padaria","value":-12.5,"invoiceMonth":"2026-10","date":"2026-10-01"}"#;
        let tx: DraftTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.extra.get("invoiceMonth"), Some(&Value::from("2026-10")));
        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back["invoiceMonth"], "2026-10");
        assert_eq!(back["date"], "2026-10-01");
        assert_eq!(back["appliedRuleIds"], serde_json::json!([]));
    }
}
