//! Mobile hamburger menu toggle for the portal navigation.

use crate::dom::{NodeId, UiTree};

const OPEN_CLASS: &str = "mobile-open";
const ACTIVE_CLASS: &str = "active";

/// Input events the toggle reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent<'a> {
    HamburgerClick,
    /// Click anywhere on the page; `target` is the clicked node.
    DocumentClick { target: NodeId },
    KeyDown { key: &'a str },
    /// Click that landed inside the nav links list.
    LinksClick { target: NodeId },
}

#[derive(Debug, Clone, Copy)]
pub struct NavToggle {
    hamburger: NodeId,
    links: NodeId,
}

impl NavToggle {
    /// `None` when the page has no hamburger or no links list.
    pub fn attach(tree: &dyn UiTree) -> Option<Self> {
        let hamburger = tree.query_selector(".hamburger")?;
        let links = tree.query_selector(".nav-links")?;
        Some(Self { hamburger, links })
    }

    pub fn is_open(&self, tree: &dyn UiTree) -> bool {
        tree.has_class(self.links, OPEN_CLASS)
    }

    /// Applies one event; returns whether the menu is open afterwards.
    pub fn handle(&self, tree: &mut dyn UiTree, event: NavEvent<'_>) -> bool {
        match event {
            NavEvent::HamburgerClick => {
                let open = tree.toggle_class(self.links, OPEN_CLASS, None);
                self.sync_button(tree, open);
            }
            NavEvent::DocumentClick { target } => {
                // Clicks on the hamburger itself are handled by HamburgerClick.
                let inside = tree.closest(target, ".nav-left").is_some() || tree.closest(target, ".hamburger").is_some();
                if self.is_open(tree) && !inside {
                    self.close(tree);
                }
            }
            NavEvent::KeyDown { key } => {
                if key == "Escape" && self.is_open(tree) {
                    self.close(tree);
                }
            }
            NavEvent::LinksClick { target } => {
                if tree.tag_name(target).as_deref() == Some("a") {
                    self.close(tree);
                }
            }
        }
        self.is_open(tree)
    }

    fn close(&self, tree: &mut dyn UiTree) {
        tree.remove_class(self.links, OPEN_CLASS);
        self.sync_button(tree, false);
    }

    fn sync_button(&self, tree: &mut dyn UiTree, open: bool) {
        tree.toggle_class(self.hamburger, ACTIVE_CLASS, Some(open));
        tree.set_attribute(self.hamburger, "aria-expanded", if open { "true" } else { "false" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    const PAGE: &str = r#"<html><body>
        <nav><div class="nav-left"><ul class="nav-links"><li><a id="link" href="orders.html">Orders</a></li><li id="item">x</li></ul></div>
        <button class="hamburger" aria-expanded="false"><span id="bar"></span></button></nav>
        <main><p id="content">c</p></main></body></html>"#;

    fn setup() -> (MemoryDocument, NavToggle) {
        let doc = MemoryDocument::parse_document(PAGE);
        let toggle = NavToggle::attach(&doc).unwrap();
        (doc, toggle)
    }

    #[test]
    fn hamburger_toggles_menu() {
        let (mut doc, toggle) = setup();
        assert!(toggle.handle(&mut doc, NavEvent::HamburgerClick));
        let button = doc.query_selector(".hamburger").unwrap();
        assert!(doc.has_class(button, "active"));
        assert_eq!(doc.attribute(button, "aria-expanded").as_deref(), Some("true"));

        assert!(!toggle.handle(&mut doc, NavEvent::HamburgerClick));
        assert!(!doc.has_class(button, "active"));
        assert_eq!(doc.attribute(button, "aria-expanded").as_deref(), Some("false"));
    }

    #[test]
    fn outside_click_closes_inside_click_keeps() {
        let (mut doc, toggle) = setup();
        toggle.handle(&mut doc, NavEvent::HamburgerClick);
        let item = doc.element_by_id("item").unwrap();
        let bar = doc.element_by_id("bar").unwrap();
        assert!(toggle.handle(&mut doc, NavEvent::DocumentClick { target: item }));
        assert!(toggle.handle(&mut doc, NavEvent::DocumentClick { target: bar }));
        let content = doc.element_by_id("content").unwrap();
        assert!(!toggle.handle(&mut doc, NavEvent::DocumentClick { target: content }));
    }

    #[test]
    fn escape_closes() {
        let (mut doc, toggle) = setup();
        toggle.handle(&mut doc, NavEvent::HamburgerClick);
        assert!(toggle.handle(&mut doc, NavEvent::KeyDown { key: "Enter" }));
        assert!(!toggle.handle(&mut doc, NavEvent::KeyDown { key: "Escape" }));
    }

    #[test]
    fn link_click_closes() {
        let (mut doc, toggle) = setup();
        toggle.handle(&mut doc, NavEvent::HamburgerClick);
        let item = doc.element_by_id("item").unwrap();
        assert!(toggle.handle(&mut doc, NavEvent::LinksClick { target: item }));
        let link = doc.element_by_id("link").unwrap();
        assert!(!toggle.handle(&mut doc, NavEvent::LinksClick { target: link }));
    }

    #[test]
    fn pages_without_hamburger_get_no_toggle() {
        let doc = MemoryDocument::parse_document("<html><body><ul class=\"nav-links\"></ul></body></html>");
        assert!(NavToggle::attach(&doc).is_none());
    }
}
