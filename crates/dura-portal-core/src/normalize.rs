//! Response normalizer: turns any accepted `page_insights` entry into the canonical,
//! ordered list of typed insight items the renderers consume.
//!
//! Total by construction. Shapes it does not understand become "nothing to show".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{EntryElement, PageInsightEntry};
use crate::page::PageId;

/// Visual category of an insight item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    #[default]
    Info,
    Warning,
    Success,
}

impl InsightKind {
    /// Parse a backend `type` string; anything absent or unknown is `Info`.
    pub fn parse(raw: Option<&str>) -> InsightKind {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("warning") => InsightKind::Warning,
            Some("success") => InsightKind::Success,
            _ => InsightKind::Info,
        }
    }

    fn from_value(raw: Option<&Value>) -> InsightKind {
        InsightKind::parse(raw.and_then(Value::as_str))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InsightKind::Info => "info",
            InsightKind::Warning => "warning",
            InsightKind::Success => "success",
        }
    }
}

/// Normalized `{type, text}` insight, recomputed on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalInsightItem {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub text: String,
}

impl CanonicalInsightItem {
    /// Builds an item, or `None` when the text is empty after trimming.
    fn new(kind: InsightKind, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            text: text.to_string(),
        })
    }

    fn from_parts(kind: Option<&Value>, text: &Value) -> Option<Self> {
        Self::new(InsightKind::from_value(kind), text.as_str()?)
    }
}

/// Normalize one page's entry. Backend order is preserved; nothing is sorted or
/// deduplicated. An empty result means the caller must leave the display as is.
pub fn normalize(entry: Option<&PageInsightEntry>, page: PageId) -> Vec<CanonicalInsightItem> {
    let items = match entry {
        None => Vec::new(),
        Some(PageInsightEntry::Text(text)) => CanonicalInsightItem::new(InsightKind::Info, text)
            .into_iter()
            .collect(),
        Some(PageInsightEntry::List(elements)) | Some(PageInsightEntry::Items { items: elements }) => {
            normalize_list(elements)
        }
        Some(PageInsightEntry::Single { kind, text }) => {
            CanonicalInsightItem::from_parts(kind.as_ref(), text)
                .into_iter()
                .collect()
        }
        Some(PageInsightEntry::Other(value)) => {
            tracing::debug!(
                target: "dura::normalize",
                page = %page,
                shape = shape_name(value),
                "unrecognized page insight shape; nothing to show"
            );
            Vec::new()
        }
    };
    tracing::trace!(target: "dura::normalize", page = %page, count = items.len(), "normalized page insights");
    items
}

fn normalize_list(elements: &[EntryElement]) -> Vec<CanonicalInsightItem> {
    elements
        .iter()
        .filter_map(|element| match element {
            EntryElement::Text(text) => CanonicalInsightItem::new(InsightKind::Info, text),
            EntryElement::Item { kind, text } => CanonicalInsightItem::from_parts(kind.as_ref(), text),
            EntryElement::Other(_) => None,
        })
        .collect()
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
