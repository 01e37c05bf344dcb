//! Core data models shared by the crawl and parse pipelines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inbound job message.
///
/// ```json
/// {"payload": {"rozetka_product": ["https://...", "https://..."]}}
/// ```
///
/// Fields other than `payload` are carried through untouched into every
/// expanded unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<BTreeMap<String, PayloadValue>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobMessage {
    pub fn with_payload(type_key: &str, value: PayloadValue) -> Self {
        let mut payload = BTreeMap::new();
        payload.insert(type_key.to_string(), value);
        Self {
            payload: Some(payload),
            extra: serde_json::Map::new(),
        }
    }

    /// A copy of this message with the payload replaced by a single entry.
    pub fn reshell(&self, type_key: &str, value: PayloadValue) -> Self {
        let mut shell = Self::with_payload(type_key, value);
        shell.extra = self.extra.clone();
        shell
    }
}

/// A payload entry: one value or a list of values.
///
/// Anything else (numbers, objects, lists with non-string members) lands in
/// [`PayloadValue::Invalid`] so one bad entry does not reject the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    One(String),
    Many(Vec<String>),
    Invalid(serde_json::Value),
}

impl PayloadValue {
    pub fn is_valid(&self) -> bool {
        !matches!(self, PayloadValue::Invalid(_))
    }

    /// The values as a list; invalid entries carry none.
    pub fn into_list(self) -> Vec<String> {
        match self {
            PayloadValue::One(v) => vec![v],
            PayloadValue::Many(vs) => vs,
            PayloadValue::Invalid(_) => Vec::new(),
        }
    }

    pub fn to_list(&self) -> Vec<String> {
        self.clone().into_list()
    }
}

/// One fetched artifact produced by the fetch stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseItem {
    pub url: String,
    pub text: String,
    #[serde(rename = "status", alias = "status_code")]
    pub status_code: u16,
    pub object_key: String,
}

impl ResponseItem {
    pub fn new(
        url: impl Into<String>,
        text: impl Into<String>,
        status_code: u16,
        object_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            status_code,
            object_key: object_key.into(),
        }
    }
}

/// Crawl or parse outcome written to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roundtrip_keeps_extra_fields() {
        let raw = r#"{"payload": {"siteA": ["u1", "u2"]}, "trace_id": "t-1"}"#;
        let msg: JobMessage = serde_json::from_str(raw).unwrap();
        let payload = msg.payload.as_ref().unwrap();
        assert_eq!(
            payload["siteA"],
            PayloadValue::Many(vec!["u1".to_string(), "u2".to_string()])
        );
        assert_eq!(msg.extra["trace_id"], "t-1");
    }

    #[test]
    fn test_single_value_payload() {
        let msg: JobMessage = serde_json::from_str(r#"{"payload": {"siteA": "u1"}}"#).unwrap();
        let value = msg.payload.unwrap().remove("siteA").unwrap();
        assert_eq!(value.into_list(), vec!["u1".to_string()]);
    }

    #[test]
    fn test_non_string_values_are_kept_as_invalid() {
        let msg: JobMessage = serde_json::from_str(
            r#"{"payload": {"siteA": ["u1"], "siteB": 42, "siteC": null, "siteD": ["u2", {"x": 1}]}}"#,
        )
        .unwrap();
        let payload = msg.payload.unwrap();
        assert!(payload["siteA"].is_valid());
        assert_eq!(payload["siteB"], PayloadValue::Invalid(serde_json::json!(42)));
        assert!(!payload["siteC"].is_valid());
        assert!(!payload["siteD"].is_valid());
        assert!(payload["siteD"].to_list().is_empty());
    }

    #[test]
    fn test_missing_payload() {
        let msg: JobMessage = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert!(msg.payload.is_none());
    }

    #[test]
    fn test_response_item_wire_format() {
        let item = ResponseItem::new("https://a", "<html/>", 200, "k1");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["status"], 200);
        assert!(json.get("status_code").is_none());

        let back: ResponseItem = serde_json::from_str(
            r#"{"url":"https://a","text":"x","status_code":404,"object_key":"k1"}"#,
        )
        .unwrap();
        assert_eq!(back.status_code, 404);
    }

    #[test]
    fn test_outcome_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Outcome::Success).unwrap(), "success");
        assert_eq!(Outcome::Failure.to_string(), "failure");
    }
}
