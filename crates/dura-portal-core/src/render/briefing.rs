use super::palette::action_class;
use super::{pending_message, InsightRenderer, RenderReport, TimeDisplay};
use crate::dom::UiTree;
use crate::envelope::{InsightEnvelope, Insights};
use crate::page::PageId;

pub const TITLE_SELECTOR: &str = ".ai-briefing-title";
pub const TEXT_SELECTOR: &str = ".ai-briefing-text";
pub const TIME_SELECTOR: &str = ".ai-briefing-time";
pub const ACTIONS_SELECTOR: &str = ".ai-briefing-actions";

const DEFAULT_TITLE: &str = "AI Briefing";

/// Fills the dashboard's existing briefing markup. Never creates or removes the
/// anchors themselves.
#[derive(Debug, Clone, Default)]
pub struct BriefingRenderer {
    time: TimeDisplay,
}

impl BriefingRenderer {
    pub fn new(time: TimeDisplay) -> Self {
        Self { time }
    }
}

impl InsightRenderer for BriefingRenderer {
    fn page(&self) -> PageId {
        PageId::Dashboard
    }

    /// The dashboard ships its own markup.
    fn scaffold(&self, _tree: &mut dyn UiTree) {}

    fn render(&self, tree: &mut dyn UiTree, envelope: &InsightEnvelope, insights: &Insights) -> RenderReport {
        let title = tree.query_selector(TITLE_SELECTOR);
        let text = tree.query_selector(TEXT_SELECTOR);
        let time = tree.query_selector(TIME_SELECTOR);
        let actions = tree.query_selector(ACTIONS_SELECTOR);
        if title.is_none() && text.is_none() && time.is_none() && actions.is_none() {
            return RenderReport::NoAnchor;
        }

        if let Some(node) = title {
            let value = insights
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TITLE);
            tree.set_text_content(node, value);
        }
        if let Some(node) = text {
            tree.set_inner_html(node, insights.summary.as_deref().unwrap_or_default());
        }
        if let Some(node) = time {
            let at = self.time.format(envelope.generated_at.as_deref());
            let label = if at.is_empty() {
                String::new()
            } else {
                format!("Gegenereerd om {at}")
            };
            tree.set_text_content(node, &label);
        }
        if let Some(row) = actions {
            tree.clear_children(row);
            for action in insights.actions.iter().filter(|a| !a.text.trim().is_empty()) {
                let chip = tree.create_element("span");
                let class = format!("ai-action {}", action_class(action.kind.as_deref()));
                tree.set_attribute(chip, "class", &class);
                tree.set_text_content(chip, action.text.trim());
                tree.append_child(row, chip);
            }
        }
        RenderReport::Updated
    }

    fn render_pending(&self, tree: &mut dyn UiTree, next_generation_at: Option<&str>) -> RenderReport {
        let Some(node) = tree.query_selector(TEXT_SELECTOR) else {
            return RenderReport::NoAnchor;
        };
        let message = pending_message(next_generation_at, &self.time);
        tree.set_text_content(node, &message);
        RenderReport::Updated
    }
}
