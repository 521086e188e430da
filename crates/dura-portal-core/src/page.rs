//! Page classification: maps the navigation path of the current page to one of the
//! portal's fixed page identifiers.

use serde::{Deserialize, Serialize};

/// Portal page categories. The snake_case name doubles as the `page_insights` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageId {
    Dashboard,
    Orders,
    Voorraad,
    Verzendingen,
    Rapportages,
    Warehouse,
    Other,
}

/// Substring matches tried in order once the path is known not to be the dashboard.
const PRIORITY: &[(&str, PageId)] = &[
    ("orders", PageId::Orders),
    ("voorraad", PageId::Voorraad),
    ("verzendingen", PageId::Verzendingen),
    ("rapportages", PageId::Rapportages),
    ("warehouse", PageId::Warehouse),
];

impl PageId {
    /// Classify a navigation path. Total: every input maps to some page.
    pub fn classify(path: &str) -> PageId {
        if path.is_empty() || path.ends_with('/') || path.ends_with("index.html") {
            return PageId::Dashboard;
        }
        PRIORITY
            .iter()
            .find(|(needle, _)| path.contains(needle))
            .map(|(_, page)| *page)
            .unwrap_or(PageId::Other)
    }

    /// Key under `insights.page_insights` that carries this page's content.
    pub fn key(self) -> &'static str {
        match self {
            PageId::Dashboard => "dashboard",
            PageId::Orders => "orders",
            PageId::Voorraad => "voorraad",
            PageId::Verzendingen => "verzendingen",
            PageId::Rapportages => "rapportages",
            PageId::Warehouse => "warehouse",
            PageId::Other => "other",
        }
    }

    pub fn is_dashboard(self) -> bool {
        self == PageId::Dashboard
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        let table = [
            ("/", PageId::Dashboard),
            ("", PageId::Dashboard),
            ("/dura/", PageId::Dashboard),
            ("/dura/index.html", PageId::Dashboard),
            ("/dura/orders.html", PageId::Orders),
            ("/dura/voorraad.html", PageId::Voorraad),
            ("/dura/verzendingen.html", PageId::Verzendingen),
            ("/dura/rapportages.html", PageId::Rapportages),
            ("/dura/warehouse.html", PageId::Warehouse),
            ("/dura/instellingen.html", PageId::Other),
            ("/dura/orders/", PageId::Dashboard),
        ];
        for (path, expected) in table {
            assert_eq!(PageId::classify(path), expected, "path {path:?}");
        }
    }

    #[test]
    fn earlier_identifier_wins_on_overlap() {
        assert_eq!(PageId::classify("/dura/warehouse-orders.html"), PageId::Orders);
        assert_eq!(PageId::classify("/voorraad/rapportages.html"), PageId::Voorraad);
    }

    #[test]
    fn keys_match_serde_names() {
        for page in [PageId::Orders, PageId::Warehouse, PageId::Dashboard] {
            let json = serde_json::to_string(&page).unwrap();
            assert_eq!(json, format!("\"{}\"", page.key()));
        }
    }
}
