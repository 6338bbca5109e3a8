//! Arena-backed in-memory DOM.
//!
//! Enough of the DOM to drive the scanner off-browser. Nodes are never freed;
//! detaching a node only unlinks it from its parent.

use crate::types::{Selector, BADGE_FAST_PATH_CLASS, HIGHLIGHT_CLASS};

use super::Dom;

/// Index of a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Empty document with an `<html>` document element.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        dom.root = dom.create_element("html");
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    /// Append `child` to `parent`, moving it if it is already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Create an element and append it.
    pub fn element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    /// Create a text node and append it.
    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    /// Unlink a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn comment_text(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Comment(text) => Some(text),
            _ => None,
        }
    }

    /// Element descendants of `root` in document order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.tag(node).is_some() {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    fn classes(&self, node: NodeId) -> Vec<String> {
        self.attribute(&node, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn set_classes(&mut self, node: NodeId, classes: &[String]) {
        if classes.is_empty() {
            self.remove_attribute(&node, "class");
        } else {
            self.set_attribute(&node, "class", &classes.join(" "));
        }
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn document_element(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn is_element(&self, node: &NodeId) -> bool {
        self.tag(*node).is_some()
    }

    fn has_tag(&self, node: &NodeId, tag: &str) -> bool {
        self.tag(*node).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.parent(*node).filter(|p| self.is_element(p))
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![*node];
        while let Some(id) = stack.pop() {
            match &self.data(id).kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element { .. } => {
                    stack.extend(self.children(id).iter().rev().copied());
                }
                NodeKind::Comment(_) => {}
            }
        }
        out
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.data(*node).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
            attrs.retain(|(k, _)| k != name);
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.classes(*node).iter().any(|c| c == class)
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if !self.is_element(node) {
            return;
        }
        let mut classes = self.classes(*node);
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_classes(*node, &classes);
        }
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        let mut classes = self.classes(*node);
        let before = classes.len();
        classes.retain(|c| c != class);
        if classes.len() != before {
            self.set_classes(*node, &classes);
        }
    }

    fn matches(&self, node: &NodeId, selector: Selector) -> bool {
        match selector {
            Selector::Group => {
                self.has_tag(node, "div") && self.attribute(node, "role").as_deref() == Some("group")
            }
            Selector::BadgeFastPath => {
                self.has_tag(node, "span") && self.has_class(node, BADGE_FAST_PATH_CLASS)
            }
            Selector::Span => self.has_tag(node, "span"),
            Selector::Highlighted => self.has_class(node, HIGHLIGHT_CLASS),
        }
    }

    fn query_all(&self, root: &NodeId, selector: Selector) -> Vec<NodeId> {
        self.descendants(*root)
            .into_iter()
            .filter(|n| self.matches(n, selector))
            .collect()
    }

    fn query_document(&self, selector: Selector) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.matches(&self.root, selector) {
            out.push(self.root);
        }
        out.extend(self.query_all(&self.root, selector));
        out
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        let mut current = *node;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn create_placeholder(&mut self) -> NodeId {
        self.create_comment(crate::types::PLACEHOLDER_TEXT)
    }

    fn replace_with(&mut self, old: &NodeId, new: &NodeId) -> bool {
        let Some(parent) = self.parent(*old) else {
            return false;
        };
        if old == new {
            return true;
        }
        self.detach(*new);
        let Some(index) = self.index_in_parent(*old) else {
            return false;
        };
        self.nodes[parent.0].children[index] = *new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        true
    }
}

/// Product grid builders shared by the unit tests.
#[cfg(test)]
pub(crate) mod fixture {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Badge {
        None,
        /// Fast-path class span
        Class,
        /// Plain span with the badge text
        Text,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Card {
        pub card: NodeId,
        pub group: NodeId,
        pub badge: Option<NodeId>,
    }

    /// `div.card > div.inner > div[role=group] > (div.title, span?)`
    pub fn append_card(dom: &mut MemoryDom, parent: NodeId, badge: Badge) -> Card {
        let card = dom.element(parent, "div");
        dom.add_class(&card, "card");
        let inner = dom.element(card, "div");
        let group = dom.element(inner, "div");
        dom.set_attribute(&group, "role", "group");
        let title = dom.element(group, "div");
        dom.text(title, "Product");
        let badge = match badge {
            Badge::None => None,
            Badge::Class => {
                let span = dom.element(group, "span");
                dom.add_class(&span, BADGE_FAST_PATH_CLASS);
                dom.text(span, "Yerel");
                Some(span)
            }
            Badge::Text => {
                let wrap = dom.element(group, "div");
                let span = dom.element(wrap, "span");
                dom.text(span, "  Yerel\n");
                Some(span)
            }
        };
        Card { card, group, badge }
    }

    /// Grid of `total` cards, the first `local` of which carry a text badge.
    pub fn grid(dom: &mut MemoryDom, total: usize, local: usize) -> (NodeId, Vec<Card>) {
        let body = dom.element(dom.root(), "body");
        let list = dom.element(body, "div");
        let cards = (0..total)
            .map(|i| {
                let badge = if i < local { Badge::Text } else { Badge::None };
                append_card(dom, list, badge)
            })
            .collect();
        (list, cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_all_excludes_root_and_keeps_order() {
        let mut dom = MemoryDom::new();
        let a = dom.element(dom.root(), "span");
        let b = dom.element(a, "span");
        let c = dom.element(dom.root(), "span");
        assert_eq!(dom.query_all(&a, Selector::Span), vec![b]);
        assert_eq!(dom.query_all(&dom.root(), Selector::Span), vec![a, b, c]);
    }

    #[test]
    fn test_replace_with_keeps_position() {
        let mut dom = MemoryDom::new();
        let first = dom.element(dom.root(), "div");
        let middle = dom.element(dom.root(), "div");
        let last = dom.element(dom.root(), "div");
        let placeholder = dom.create_placeholder();

        assert!(dom.replace_with(&middle, &placeholder));
        assert!(!dom.is_connected(&middle));
        assert_eq!(dom.children(dom.root()), &[first, placeholder, last]);

        assert!(dom.replace_with(&placeholder, &middle));
        assert_eq!(dom.children(dom.root()), &[first, middle, last]);
        assert!(!dom.replace_with(&placeholder, &middle));
    }

    #[test]
    fn test_class_list_round_trip() {
        let mut dom = MemoryDom::new();
        let el = dom.element(dom.root(), "div");
        dom.add_class(&el, "a");
        dom.add_class(&el, "b");
        dom.add_class(&el, "a");
        assert_eq!(dom.attribute(&el, "class").as_deref(), Some("a b"));
        dom.remove_class(&el, "a");
        dom.remove_class(&el, "b");
        assert_eq!(dom.attribute(&el, "class"), None);
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut dom = MemoryDom::new();
        let span = dom.element(dom.root(), "span");
        dom.text(span, " Ye");
        let inner = dom.element(span, "b");
        dom.text(inner, "rel ");
        assert_eq!(dom.text_content(&span), " Yerel ");
    }
}
