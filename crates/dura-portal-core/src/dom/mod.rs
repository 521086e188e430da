//! UI tree binding.
//!
//! `UiTree` is the narrow set of primitives the insight pipeline needs from a
//! page: lookup, creation, insertion and content replacement. Everything richer
//! (selectors, `closest`, class lists) is provided on top of those primitives so a
//! binding only implements the basics. Lookups return `None` for missing anchors;
//! no operation fails.

mod html;
mod memory;

pub use memory::MemoryDocument;

/// Handle to a node owned by a `UiTree`. A handle to a released node never
/// resolves again, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

/// Simple selector: optional tag, optional `#id`, any number of `.class` parts.
///
/// Supports `main`, `.main`, `#ai-insight-block`, `div.ai-action.warning`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    pub fn parse(raw: &str) -> Selector {
        let mut selector = Selector::default();
        let raw = raw.trim();
        let mut rest = raw;
        let tag_end = rest.find(['.', '#']).unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let part = &body[..end];
            if !part.is_empty() {
                match marker {
                    '#' => selector.id = Some(part.to_string()),
                    _ => selector.classes.push(part.to_string()),
                }
            }
            rest = &body[end..];
        }
        selector
    }

    /// A selector with no parts matches nothing.
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty()
    }
}

/// Operations a page binding offers to the insight pipeline.
pub trait UiTree {
    /// Document root; every attached node descends from it.
    fn root(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child nodes in document order, text nodes included.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lowercase tag name, `None` for text and document nodes.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Creates a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Inserts `child` under `parent` before `reference`, or last when `reference`
    /// is `None` or not a child of `parent`. A child already attached elsewhere is
    /// moved.
    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>);

    /// Removes every child of `node` and releases the removed subtrees; their
    /// handles stop resolving.
    fn clear_children(&mut self, node: NodeId);

    /// Concatenated text of the subtree.
    fn text_content(&self, node: NodeId) -> String;

    /// Replaces the children of `node` with the parsed markup.
    fn set_inner_html(&mut self, node: NodeId, html: &str);

    fn is_element(&self, node: NodeId) -> bool {
        self.tag_name(node).is_some()
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            let text = self.create_text(text);
            self.insert_before(node, text, None);
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    fn prepend(&mut self, parent: NodeId, child: NodeId) {
        let first = self.children(parent).into_iter().next();
        self.insert_before(parent, child, first);
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&n| n == node)?;
        siblings.get(pos + 1).copied()
    }

    fn first_element_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).into_iter().find(|&n| self.is_element(n))
    }

    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .into_iter()
            .filter(|&n| self.is_element(n))
            .collect()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let mut classes = self.attribute(node, "class").unwrap_or_default();
        if !classes.trim().is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self.set_attribute(node, "class", classes.trim());
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(current) = self.attribute(node, "class") else {
            return;
        };
        let kept: Vec<&str> = current.split_whitespace().filter(|c| *c != class).collect();
        self.set_attribute(node, "class", &kept.join(" "));
    }

    /// `classList.toggle` semantics: returns whether the class is present afterwards.
    fn toggle_class(&mut self, node: NodeId, class: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or(!self.has_class(node, class));
        if on {
            self.add_class(node, class);
        } else {
            self.remove_class(node, class);
        }
        on
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        if selector.is_empty() {
            return false;
        }
        let Some(tag) = self.tag_name(node) else {
            return false;
        };
        if selector.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        if let Some(id) = &selector.id {
            if self.attribute(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        selector.classes.iter().all(|c| self.has_class(node, c))
    }

    /// Descendants of `scope` matching `selector`, in document order.
    fn query_selector_all_in(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    fn query_selector_in(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(scope).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.matches(node, selector) {
                return Some(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        None
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_in(self.root(), &Selector::parse(selector))
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_selector_all_in(self.root(), &Selector::parse(selector))
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let selector = Selector {
            id: Some(id.to_string()),
            ..Selector::default()
        };
        self.query_selector_in(self.root(), &selector)
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector);
        let mut current = Some(node);
        while let Some(n) = current {
            if self.matches(n, &selector) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }
}
