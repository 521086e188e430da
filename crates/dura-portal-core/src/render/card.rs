use super::palette::{swatch, Swatch};
use super::{pending_message, InsightRenderer, RenderReport, TimeDisplay};
use crate::dom::{NodeId, UiTree};
use crate::envelope::{InsightEnvelope, Insights};
use crate::normalize::{normalize, CanonicalInsightItem, InsightKind};
use crate::page::PageId;

pub const CARD_ID: &str = "ai-insight-block";
pub const TIME_ID: &str = "ai-insight-time";
pub const ITEMS_ID: &str = "ai-insight-items";
pub const ITEM_CLASS: &str = "ai-insight-item";

const PLACEHOLDER: &str = "AI-inzicht wordt geladen...";

const CARD_STYLE: &str = "display:flex;align-items:center;gap:14px;\
background:linear-gradient(135deg,#eff6ff 0%,#f0f4ff 100%);\
border:1px solid rgba(37,99,235,0.1);border-radius:14px;padding:16px 20px;\
margin-bottom:20px;transition:opacity 0.3s;";
const ICON_STYLE: &str = "width:36px;height:36px;background:#2563eb;border-radius:10px;\
display:flex;align-items:center;justify-content:center;flex-shrink:0;";
const BODY_STYLE: &str = "flex:1;min-width:0;";
const HEADER_STYLE: &str = "display:flex;align-items:center;gap:8px;margin-bottom:2px;";
const LABEL_STYLE: &str = "font-size:11px;font-weight:600;color:#2563eb;text-transform:uppercase;letter-spacing:0.5px;";
const TIME_STYLE: &str = "font-size:11px;color:#6b7084;";
const ITEMS_STYLE: &str = "display:flex;flex-direction:column;gap:6px;";

/// Floating insight card for every page except the dashboard.
#[derive(Debug, Clone)]
pub struct CardRenderer {
    page: PageId,
    time: TimeDisplay,
}

impl CardRenderer {
    pub fn new(page: PageId, time: TimeDisplay) -> Self {
        Self { page, time }
    }

    /// Returns the card, creating it on first use. `None` when the page has no
    /// `main` container to host it.
    fn ensure_card(&self, tree: &mut dyn UiTree) -> Option<NodeId> {
        if let Some(existing) = tree.element_by_id(CARD_ID) {
            return Some(existing);
        }
        let host = tree.query_selector("main").or_else(|| tree.query_selector(".main"))?;

        let card = element(tree, "div", CARD_STYLE);
        tree.set_attribute(card, "id", CARD_ID);

        let icon = element(tree, "div", ICON_STYLE);
        let glyph = element(tree, "span", "font-size:18px;");
        tree.set_text_content(glyph, "\u{1f916}");
        tree.append_child(icon, glyph);
        tree.append_child(card, icon);

        let body = element(tree, "div", BODY_STYLE);
        let header = element(tree, "div", HEADER_STYLE);
        let label = element(tree, "span", LABEL_STYLE);
        tree.set_text_content(label, "AI Insight");
        let time = element(tree, "span", TIME_STYLE);
        tree.set_attribute(time, "id", TIME_ID);
        tree.append_child(header, label);
        tree.append_child(header, time);
        tree.append_child(body, header);

        let items = element(tree, "div", ITEMS_STYLE);
        tree.set_attribute(items, "id", ITEMS_ID);
        let placeholder = row(tree, &swatch(InsightKind::Info), "info", PLACEHOLDER);
        tree.append_child(items, placeholder);
        tree.append_child(body, items);
        tree.append_child(card, body);

        let page_header = tree
            .element_children(host)
            .into_iter()
            .find(|&n| tree.has_class(n, "header"));
        match page_header {
            Some(h) => {
                let after = tree.next_sibling(h);
                tree.insert_before(host, card, after);
            }
            None => tree.prepend(host, card),
        }
        tracing::debug!(target: "dura::render", page = %self.page, "insight card injected");
        Some(card)
    }

    fn fill_items(&self, tree: &mut dyn UiTree, region: NodeId, items: &[CanonicalInsightItem]) {
        tree.clear_children(region);
        for item in items {
            let node = row(tree, &swatch(item.kind), item.kind.as_str(), &item.text);
            tree.append_child(region, node);
        }
    }
}

impl InsightRenderer for CardRenderer {
    fn page(&self) -> PageId {
        self.page
    }

    fn scaffold(&self, tree: &mut dyn UiTree) {
        if self.ensure_card(tree).is_none() {
            tracing::debug!(target: "dura::render", page = %self.page, "no main container; card not injected");
        }
    }

    fn render(&self, tree: &mut dyn UiTree, envelope: &InsightEnvelope, insights: &Insights) -> RenderReport {
        if self.ensure_card(tree).is_none() {
            return RenderReport::NoAnchor;
        }
        if let Some(time) = tree.element_by_id(TIME_ID) {
            let at = self.time.format(envelope.generated_at.as_deref());
            tree.set_text_content(time, &at);
        }
        let items = normalize(insights.page_entry(self.page.key()), self.page);
        if items.is_empty() {
            return RenderReport::Retained;
        }
        let Some(region) = tree.element_by_id(ITEMS_ID) else {
            return RenderReport::NoAnchor;
        };
        self.fill_items(tree, region, &items);
        RenderReport::Updated
    }

    fn render_pending(&self, tree: &mut dyn UiTree, next_generation_at: Option<&str>) -> RenderReport {
        if self.ensure_card(tree).is_none() {
            return RenderReport::NoAnchor;
        }
        let Some(region) = tree.element_by_id(ITEMS_ID) else {
            return RenderReport::NoAnchor;
        };
        let message = pending_message(next_generation_at, &self.time);
        tree.clear_children(region);
        let node = row(tree, &swatch(InsightKind::Info), "info", &message);
        tree.append_child(region, node);
        RenderReport::Updated
    }
}

fn element(tree: &mut dyn UiTree, tag: &str, style: &str) -> NodeId {
    let node = tree.create_element(tag);
    tree.set_attribute(node, "style", style);
    node
}

fn row(tree: &mut dyn UiTree, colors: &Swatch, kind: &str, text: &str) -> NodeId {
    let style = format!(
        "font-size:14px;color:#0f1117;line-height:1.5;margin:0;padding:6px 10px;\
         border-left:3px solid {};background:{};border-radius:6px;",
        colors.accent, colors.background
    );
    let node = element(tree, "p", &style);
    tree.set_attribute(node, "class", ITEM_CLASS);
    tree.set_attribute(node, "data-type", kind);
    tree.set_text_content(node, text);
    node
}
