//! Arena-backed `UiTree` used by the host daemon and by tests.
//!
//! Slots are generational: `clear_children` releases the removed subtrees onto a
//! free list and bumps each slot's generation. Handles to released nodes never
//! resolve again.

use super::{html, NodeId, UiTree};

#[derive(Debug, Clone)]
pub(super) enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(super) struct NodeData {
    pub(super) kind: NodeKind,
    parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// In-memory page.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

const ROOT: NodeId = NodeId {
    index: 0,
    generation: 0,
};

impl MemoryDocument {
    /// Empty document holding only its root.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                data: Some(NodeData {
                    kind: NodeKind::Document,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
        }
    }

    /// Builds a document from a full HTML page.
    pub fn parse_document(markup: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root();
        html::import_document(&mut doc, root, markup);
        doc
    }

    /// Serializes the attached tree back to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            html::write_node(self, child, &mut out);
        }
        out
    }

    /// Serializes the subtree rooted at `node`, `node` included.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        html::write_node(self, node, &mut out);
        out
    }

    /// Nodes currently held by the arena, attached or not, root included.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(super) fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.data = Some(data);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Frees `node` and everything below it. The caller has already unlinked it.
    fn release(&mut self, node: NodeId) {
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            let Some(slot) = self.slots.get_mut(id.index).filter(|s| s.generation == id.generation) else {
                continue;
            };
            if let Some(data) = slot.data.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                pending.extend(data.children);
            }
        }
    }

    pub(super) fn create_element_with_attrs(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(data) = self.node_mut(parent) {
            data.children.retain(|&c| c != node);
        }
        if let Some(data) = self.node_mut(node) {
            data.parent = None;
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == candidate {
                return true;
            }
            current = self.node(n).and_then(|d| d.parent);
        }
        false
    }

    fn attrs_mut(&mut self, node: NodeId) -> Option<&mut Vec<(String, String)>> {
        match self.node_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element { attrs, .. }) => Some(attrs),
            _ => None,
        }
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for child in &data.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

impl UiTree for MemoryDocument {
    fn root(&self) -> NodeId {
        ROOT
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match self.node(node).map(|n| &n.kind) {
            Some(NodeKind::Element { attrs, .. }) => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(attrs) = self.attrs_mut(node) else {
            return;
        };
        match attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(attrs) = self.attrs_mut(node) {
            attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with_attrs(tag, Vec::new())
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.node(child).is_none() || child == self.root() {
            return;
        }
        match self.node(parent).map(|n| &n.kind) {
            None | Some(NodeKind::Text(_)) => return,
            Some(_) => {}
        }
        // Refuse to create a cycle.
        if self.is_ancestor_or_self(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(data) = self.node_mut(parent) {
            let pos = reference
                .and_then(|r| data.children.iter().position(|&c| c == r))
                .unwrap_or(data.children.len());
            data.children.insert(pos, child);
        }
        if let Some(data) = self.node_mut(child) {
            data.parent = Some(parent);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let Some(data) = self.node_mut(node) else {
            return;
        };
        let children = std::mem::take(&mut data.children);
        for child in children {
            self.release(child);
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) {
        if !matches!(self.node(node).map(|n| &n.kind), Some(NodeKind::Element { .. })) {
            return;
        }
        self.clear_children(node);
        html::import_fragment(self, node, markup);
    }
}
