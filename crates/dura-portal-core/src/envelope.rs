//! Wire model of `GET /api/ai-insights`.
//!
//! The backend owns this shape and it drifts: `page_insights` values arrive as a
//! plain string, a list, an `{items: [...]}` object or a single `{type, text}`
//! object. Every variant is captured here as a tagged union so the normalizer can
//! match exhaustively instead of probing JSON at render time.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PortalResult;

/// Top-level response carried by the insights endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub next_generation_at: Option<String>,
    #[serde(default)]
    pub insights: Option<Insights>,
}

/// Structured payload present when `status = ok`.
///
/// Briefing fields only feed the dashboard, so a drifted value there degrades to
/// "absent" instead of costing every card page its `page_insights`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<BriefingAction>,
    #[serde(default, deserialize_with = "lenient_page_insights")]
    pub page_insights: HashMap<String, PageInsightEntry>,
}

/// One entry of the dashboard actions row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingAction {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Every accepted shape of a `page_insights` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageInsightEntry {
    Text(String),
    List(Vec<EntryElement>),
    Items {
        items: Vec<EntryElement>,
    },
    Single {
        #[serde(rename = "type", default)]
        kind: Option<Value>,
        text: Value,
    },
    Other(Value),
}

/// Element of a list-shaped entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryElement {
    Text(String),
    Item {
        #[serde(rename = "type", default)]
        kind: Option<Value>,
        text: Value,
    },
    Other(Value),
}

/// Interpretation of an envelope's `status` field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeState<'a> {
    Ready(&'a Insights),
    Pending { next_generation_at: Option<&'a str> },
    /// `status = ok` without an `insights` payload.
    Malformed,
    Unrecognized(Option<&'a str>),
}

impl InsightEnvelope {
    /// Decode a response body. Accepts the backend's `{"data": {...}}` wrapper as
    /// well as a bare envelope.
    pub fn from_body(body: &str) -> PortalResult<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> PortalResult<Self> {
        if let Some(inner) = value.get_mut("data").filter(|d| d.is_object()) {
            let inner = inner.take();
            return Ok(serde_json::from_value(inner)?);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn state(&self) -> EnvelopeState<'_> {
        match self.status.as_deref().map(str::trim) {
            Some("ok") => match &self.insights {
                Some(insights) => EnvelopeState::Ready(insights),
                None => EnvelopeState::Malformed,
            },
            Some("pending") => EnvelopeState::Pending {
                next_generation_at: self.next_generation_at.as_deref(),
            },
            other => EnvelopeState::Unrecognized(other),
        }
    }
}

impl Insights {
    pub fn page_entry(&self, key: &str) -> Option<&PageInsightEntry> {
        self.page_insights.get(key)
    }
}

impl From<Value> for PageInsightEntry {
    fn from(value: Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or(PageInsightEntry::Other(value))
    }
}

/// Non-string values read as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// `actions` that is not a list yields no actions. Elements are either a bare
/// string or an object with a string `text`; anything else is dropped.
fn lenient_actions<'de, D>(deserializer: D) -> Result<Vec<BriefingAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(elements) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    let actions = elements
        .into_iter()
        .filter_map(|element| match element {
            Value::String(text) => Some(BriefingAction { text, kind: None }),
            Value::Object(mut fields) => {
                let Some(Value::String(text)) = fields.remove("text") else {
                    return None;
                };
                let kind = match fields.remove("type") {
                    Some(Value::String(kind)) => Some(kind),
                    _ => None,
                };
                Some(BriefingAction { text, kind })
            }
            _ => None,
        })
        .collect();
    Ok(actions)
}

/// `page_insights` that is not an object yields no entries instead of failing the
/// whole envelope.
fn lenient_page_insights<'de, D>(deserializer: D) -> Result<HashMap<String, PageInsightEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let map = match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, entry)| (key, PageInsightEntry::from(entry)))
            .collect(),
        _ => HashMap::new(),
    };
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_data_wrapper() {
        let body = r#"{"data":{"status":"pending","next_generation_at":"2024-01-01T10:00:00Z"}}"#;
        let env = InsightEnvelope::from_body(body).unwrap();
        assert_eq!(
            env.state(),
            EnvelopeState::Pending {
                next_generation_at: Some("2024-01-01T10:00:00Z")
            }
        );
    }

    #[test]
    fn bare_envelope_is_accepted() {
        let env = InsightEnvelope::from_value(json!({
            "status": "ok",
            "generated_at": "2024-01-01T08:30:00Z",
            "insights": {"title": "Daily Briefing"}
        }))
        .unwrap();
        match env.state() {
            EnvelopeState::Ready(insights) => {
                assert_eq!(insights.title.as_deref(), Some("Daily Briefing"));
                assert!(insights.actions.is_empty());
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn ok_without_insights_is_malformed() {
        let env = InsightEnvelope::from_value(json!({"status": "ok"})).unwrap();
        assert_eq!(env.state(), EnvelopeState::Malformed);
    }

    #[test]
    fn unknown_and_missing_status_are_unrecognized() {
        let env = InsightEnvelope::from_value(json!({"status": "generating"})).unwrap();
        assert_eq!(env.state(), EnvelopeState::Unrecognized(Some("generating")));
        let env = InsightEnvelope::from_value(json!({})).unwrap();
        assert_eq!(env.state(), EnvelopeState::Unrecognized(None));
    }

    #[test]
    fn page_insight_shapes_are_tagged() {
        let env = InsightEnvelope::from_value(json!({
            "status": "ok",
            "insights": {"page_insights": {
                "orders": "Check 3 delayed shipments",
                "voorraad": ["a", {"type": "warning", "text": "b"}],
                "verzendingen": {"items": ["c"]},
                "rapportages": {"type": "success", "text": "d"},
                "warehouse": 42
            }}
        }))
        .unwrap();
        let insights = env.insights.unwrap();
        assert!(matches!(insights.page_entry("orders"), Some(PageInsightEntry::Text(_))));
        assert!(matches!(insights.page_entry("voorraad"), Some(PageInsightEntry::List(l)) if l.len() == 2));
        assert!(matches!(insights.page_entry("verzendingen"), Some(PageInsightEntry::Items { .. })));
        assert!(matches!(insights.page_entry("rapportages"), Some(PageInsightEntry::Single { .. })));
        assert!(matches!(insights.page_entry("warehouse"), Some(PageInsightEntry::Other(_))));
    }

    #[test]
    fn non_object_page_insights_degrades_to_empty() {
        let env = InsightEnvelope::from_value(json!({
            "status": "ok",
            "insights": {"page_insights": "not a map"}
        }))
        .unwrap();
        assert!(env.insights.unwrap().page_insights.is_empty());
    }

    #[test]
    fn null_actions_keep_page_insights() {
        let env = InsightEnvelope::from_value(json!({
            "status": "ok",
            "insights": {
                "title": null,
                "summary": 7,
                "actions": null,
                "page_insights": {"orders": "Check 3 delayed shipments"}
            }
        }))
        .unwrap();
        let insights = env.insights.unwrap();
        assert!(insights.actions.is_empty());
        assert_eq!(insights.title, None);
        assert_eq!(insights.summary, None);
        assert_eq!(
            insights.page_entry("orders"),
            Some(&PageInsightEntry::Text("Check 3 delayed shipments".to_string()))
        );
    }

    #[test]
    fn unreadable_actions_are_dropped() {
        let env = InsightEnvelope::from_value(json!({
            "status": "ok",
            "insights": {"actions": [
                {"text": null, "type": "warning"},
                {"text": "Review", "type": 3},
                "Ship",
                42,
                {"text": "Restock", "type": "warning"}
            ]}
        }))
        .unwrap();
        let actions = env.insights.unwrap().actions;
        assert_eq!(
            actions,
            vec![
                BriefingAction { text: "Review".to_string(), kind: None },
                BriefingAction { text: "Ship".to_string(), kind: None },
                BriefingAction { text: "Restock".to_string(), kind: Some("warning".to_string()) },
            ]
        );
    }

    #[test]
    fn non_list_actions_degrade_to_empty() {
        let env = InsightEnvelope::from_value(json!({
            "status": "ok",
            "insights": {"actions": {"text": "not a list"}}
        }))
        .unwrap();
        assert!(env.insights.unwrap().actions.is_empty());
    }
}
