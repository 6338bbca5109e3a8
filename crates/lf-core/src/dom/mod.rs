//! DOM access
//!
//! The engine never touches a browser API directly. Hosts implement [`Dom`]
//! over whatever tree they have: web-sys in the extension, [`MemoryDom`] in
//! tests and in the CLI audit.

pub mod memory;

pub use memory::{MemoryDom, NodeId};

use std::fmt;

use crate::types::{CardFlags, Selector};

/// Tree operations the scanner needs.
///
/// Queries take `&self`; anything that changes the tree takes `&mut self`.
/// All queries are over elements only and return results in document order.
pub trait Dom {
    /// Handle to any node (elements and the placeholder comments).
    type Node: Clone + PartialEq + fmt::Debug;

    /// `document.documentElement`
    fn document_element(&self) -> Option<Self::Node>;

    fn is_element(&self, node: &Self::Node) -> bool;

    /// Case-insensitive tag check. False for non-elements.
    fn has_tag(&self, node: &Self::Node, tag: &str) -> bool;

    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    fn text_content(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&mut self, node: &Self::Node, class: &str);
    fn remove_class(&mut self, node: &Self::Node, class: &str);

    /// `element.matches(selector)`
    fn matches(&self, node: &Self::Node, selector: Selector) -> bool;

    /// `root.querySelectorAll(selector)`: descendants only, never `root` itself.
    fn query_all(&self, root: &Self::Node, selector: Selector) -> Vec<Self::Node>;

    /// `root.querySelector(selector)`
    fn query_first(&self, root: &Self::Node, selector: Selector) -> Option<Self::Node> {
        self.query_all(root, selector).into_iter().next()
    }

    /// `document.querySelectorAll(selector)`, which includes the document element.
    fn query_document(&self, selector: Selector) -> Vec<Self::Node>;

    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Detached comment node used to mark a removed card's position.
    fn create_placeholder(&mut self) -> Self::Node;

    /// `old.replaceWith(new)`. Returns false if `old` has no parent.
    fn replace_with(&mut self, old: &Self::Node, new: &Self::Node) -> bool;

    /// Flush pending style so a following class change animates.
    fn force_reflow(&self, _node: &Self::Node) {}

    // =============================================================================
    // Flag helpers
    // =============================================================================

    fn has_flag(&self, node: &Self::Node, flag: CardFlags) -> bool {
        flag.attribute()
            .map(|attr| self.attribute(node, attr).as_deref() == Some("1"))
            .unwrap_or(false)
    }

    fn set_flags(&mut self, node: &Self::Node, flags: CardFlags) {
        for flag in flags.iter() {
            if let Some(attr) = flag.attribute() {
                self.set_attribute(node, attr, "1");
            }
        }
    }

    fn clear_flags(&mut self, node: &Self::Node, flags: CardFlags) {
        for flag in flags.iter() {
            if let Some(attr) = flag.attribute() {
                self.remove_attribute(node, attr);
            }
        }
    }
}

/// Where a scan starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanRoot<N> {
    /// The whole document, scanned from the document element.
    Document,
    Node(N),
}

impl<N: Clone> ScanRoot<N> {
    /// Resolve to the element the scan actually walks.
    pub fn resolve<D: Dom<Node = N>>(&self, dom: &D) -> Option<N> {
        match self {
            Self::Document => dom.document_element(),
            Self::Node(node) if dom.is_element(node) => Some(node.clone()),
            Self::Node(_) => None,
        }
    }
}
