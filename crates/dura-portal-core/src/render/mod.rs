//! Insight rendering.
//!
//! One `InsightRenderer` interface, two implementations picked once per page load:
//! the dashboard fills a pre-existing briefing block, every other page gets a
//! floating insight card that is created once and then refreshed in place.

mod briefing;
mod card;
pub mod palette;
mod time;

pub use briefing::{BriefingRenderer, ACTIONS_SELECTOR, TEXT_SELECTOR, TIME_SELECTOR, TITLE_SELECTOR};
pub use card::{CardRenderer, CARD_ID, ITEMS_ID, ITEM_CLASS, TIME_ID};
pub use time::TimeDisplay;

use crate::dom::UiTree;
use crate::envelope::{InsightEnvelope, Insights};
use crate::page::PageId;

/// What a render call did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderReport {
    Updated,
    /// Nothing to show; the previous content was left in place.
    Retained,
    /// The anchor this renderer writes into is not on the page.
    NoAnchor,
}

pub trait InsightRenderer: Send + Sync {
    fn page(&self) -> PageId;

    /// One-time setup of the render target. Safe to call repeatedly.
    fn scaffold(&self, tree: &mut dyn UiTree);

    /// Applies an `ok` envelope.
    fn render(&self, tree: &mut dyn UiTree, envelope: &InsightEnvelope, insights: &Insights) -> RenderReport;

    /// Shows the "not ready yet" message in this renderer's own region only.
    fn render_pending(&self, tree: &mut dyn UiTree, next_generation_at: Option<&str>) -> RenderReport;
}

/// Picks the renderer for a page: briefing on the dashboard, card everywhere else.
pub fn renderer_for(page: PageId, time: TimeDisplay) -> Box<dyn InsightRenderer> {
    if page.is_dashboard() {
        Box::new(BriefingRenderer::new(time))
    } else {
        Box::new(CardRenderer::new(page, time))
    }
}

pub(crate) fn pending_message(next_generation_at: Option<&str>, time: &TimeDisplay) -> String {
    let at = time.format(next_generation_at);
    if at.is_empty() {
        "AI-inzichten worden gegenereerd. Probeer het later opnieuw.".to_string()
    } else {
        format!("AI-inzichten worden gegenereerd. Volgende update om {at}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_message_mentions_next_time() {
        let t = TimeDisplay::utc();
        assert!(pending_message(Some("2024-01-01T10:00:00Z"), &t).contains("10:00"));
        assert!(!pending_message(None, &t).contains(':'));
    }

    #[test]
    fn selection_by_page() {
        assert_eq!(renderer_for(PageId::Dashboard, TimeDisplay::utc()).page(), PageId::Dashboard);
        assert_eq!(renderer_for(PageId::Orders, TimeDisplay::utc()).page(), PageId::Orders);
        assert_eq!(renderer_for(PageId::Other, TimeDisplay::utc()).page(), PageId::Other);
    }
}
