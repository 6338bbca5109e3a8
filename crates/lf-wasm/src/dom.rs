//! [`Dom`] over the live page through web-sys.

use lf_core::types::{Selector, PLACEHOLDER_TEXT};
use lf_core::Dom;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node, NodeList};

pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

fn as_element(node: &Node) -> Option<&Element> {
    node.dyn_ref::<Element>()
}

fn collect(list: NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

impl Dom for WebDom {
    type Node = Node;

    fn document_element(&self) -> Option<Node> {
        self.document.document_element().map(Into::into)
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn has_tag(&self, node: &Node, tag: &str) -> bool {
        as_element(node).is_some_and(|el| el.tag_name().eq_ignore_ascii_case(tag))
    }

    fn parent_element(&self, node: &Node) -> Option<Node> {
        node.parent_element().map(Into::into)
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        as_element(node)?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn remove_attribute(&mut self, node: &Node, name: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.remove_attribute(name);
        }
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        as_element(node).is_some_and(|el| el.class_list().contains(class))
    }

    fn add_class(&mut self, node: &Node, class: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, node: &Node, class: &str) {
        if let Some(el) = as_element(node) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn matches(&self, node: &Node, selector: Selector) -> bool {
        as_element(node).is_some_and(|el| el.matches(selector.css()).unwrap_or(false))
    }

    fn query_all(&self, root: &Node, selector: Selector) -> Vec<Node> {
        as_element(root)
            .and_then(|el| el.query_selector_all(selector.css()).ok())
            .map(collect)
            .unwrap_or_default()
    }

    fn query_first(&self, root: &Node, selector: Selector) -> Option<Node> {
        as_element(root)?
            .query_selector(selector.css())
            .ok()
            .flatten()
            .map(Into::into)
    }

    fn query_document(&self, selector: Selector) -> Vec<Node> {
        self.document
            .query_selector_all(selector.css())
            .map(collect)
            .unwrap_or_default()
    }

    fn is_connected(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn create_placeholder(&mut self) -> Node {
        self.document.create_comment(PLACEHOLDER_TEXT).into()
    }

    fn replace_with(&mut self, old: &Node, new: &Node) -> bool {
        match old.parent_node() {
            Some(parent) => parent.replace_child(new, old).is_ok(),
            None => false,
        }
    }

    fn force_reflow(&self, node: &Node) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            let _ = el.offset_height();
        }
    }
}

/// Map a mutation or API root to the element a scan starts from: documents
/// become their document element, fragments their first element child.
pub fn normalize_root(node: &Node) -> Option<Node> {
    match node.node_type() {
        Node::DOCUMENT_NODE => node
            .dyn_ref::<Document>()?
            .document_element()
            .map(Into::into),
        Node::DOCUMENT_FRAGMENT_NODE => node
            .dyn_ref::<web_sys::DocumentFragment>()?
            .first_element_child()
            .map(Into::into),
        Node::ELEMENT_NODE => Some(node.clone()),
        _ => None,
    }
}

/// Run `init` once the document has been parsed.
pub fn on_ready(document: &Document, init: impl FnOnce() + 'static) -> Result<(), JsValue> {
    if document.ready_state() != "loading" {
        init();
        return Ok(());
    }
    let options = web_sys::AddEventListenerOptions::new();
    options.set_once(true);
    let callback = Closure::once_into_js(init);
    document.add_event_listener_with_callback_and_add_event_listener_options(
        "DOMContentLoaded",
        callback.unchecked_ref(),
        &options,
    )
}
