//! Badge detection and card resolution.

use crate::dom::Dom;
use crate::types::{Selector, CARD_DEPTH_ABOVE_GROUP, LOCAL_BADGE_TEXT};

/// Whitespace and line terminators stripped by ECMAScript `String.prototype.trim`.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// A `span` whose trimmed text is exactly the badge literal.
pub fn is_local_text<D: Dom>(dom: &D, node: &D::Node) -> bool {
    dom.has_tag(node, "span")
        && dom.text_content(node).trim_matches(is_js_whitespace) == LOCAL_BADGE_TEXT
}

/// Fast-path class match or full text match.
pub fn is_badge<D: Dom>(dom: &D, node: &D::Node) -> bool {
    dom.is_element(node) && (dom.matches(node, Selector::BadgeFastPath) || is_local_text(dom, node))
}

/// Whether a group container holds a badge anywhere below it.
pub fn group_has_badge<D: Dom>(dom: &D, group: &D::Node) -> bool {
    if dom.query_first(group, Selector::BadgeFastPath).is_some() {
        return true;
    }
    dom.query_all(group, Selector::Span)
        .iter()
        .any(|span| is_local_text(dom, span))
}

/// `element.closest(selector)`, including the element itself.
pub fn closest<D: Dom>(dom: &D, node: &D::Node, selector: Selector) -> Option<D::Node> {
    let mut current = Some(node.clone()).filter(|n| dom.is_element(n));
    while let Some(node) = current {
        if dom.matches(&node, selector) {
            return Some(node);
        }
        current = dom.parent_element(&node);
    }
    None
}

/// Maps a badge to the card element that should be hidden.
pub trait CardResolver<D: Dom> {
    fn resolve_card(&self, dom: &D, badge: &D::Node) -> Option<D::Node>;
}

/// Closest group container, then a fixed number of parents up.
///
/// Falls back to the group itself when the walk runs out of parents.
#[derive(Debug, Clone, Copy)]
pub struct GroupAncestorResolver {
    pub depth: usize,
}

impl Default for GroupAncestorResolver {
    fn default() -> Self {
        Self {
            depth: CARD_DEPTH_ABOVE_GROUP,
        }
    }
}

impl<D: Dom> CardResolver<D> for GroupAncestorResolver {
    fn resolve_card(&self, dom: &D, badge: &D::Node) -> Option<D::Node> {
        let group = closest(dom, badge, Selector::Group)?;
        let mut card = group.clone();
        for _ in 0..self.depth {
            match dom.parent_element(&card) {
                Some(parent) => card = parent,
                None => return Some(group),
            }
        }
        Some(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::fixture::{append_card, Badge};
    use crate::dom::MemoryDom;

    #[test]
    fn test_local_text_exact_after_trim() {
        let mut dom = MemoryDom::new();
        let cases = [
            (" Yerel ", true),
            ("Yerel", true),
            ("\n\tYerel\n", true),
            ("yerel", false),
            ("Yerel ürün", false),
            ("", false),
        ];
        for (text, expected) in cases {
            let span = dom.element(dom.root(), "span");
            dom.text(span, text);
            assert_eq!(is_local_text(&dom, &span), expected, "{text:?}");
        }
    }

    #[test]
    fn test_trim_follows_page_whitespace_rules() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let mut span_with = |text: &str| {
            let span = dom.element(root, "span");
            dom.text(span, text);
            span
        };
        let bom = span_with("\u{FEFF}Yerel\u{00A0}");
        let ideographic = span_with("\u{3000}Yerel\r\n");
        let next_line = span_with("\u{0085}Yerel");
        let inner = span_with("Ye rel");

        assert!(is_local_text(&dom, &bom));
        assert!(is_local_text(&dom, &ideographic));
        assert!(!is_local_text(&dom, &next_line));
        assert!(!is_local_text(&dom, &inner));
    }

    #[test]
    fn test_local_text_requires_span() {
        let mut dom = MemoryDom::new();
        let div = dom.element(dom.root(), "div");
        dom.text(div, "Yerel");
        assert!(!is_local_text(&dom, &div));
        assert!(!is_badge(&dom, &div));
    }

    #[test]
    fn test_resolves_card_two_above_group() {
        let mut dom = MemoryDom::new();
        let list = dom.element(dom.root(), "div");
        let text = append_card(&mut dom, list, Badge::Text);
        let class = append_card(&mut dom, list, Badge::Class);
        let resolver = GroupAncestorResolver::default();

        for c in [text, class] {
            let badge = c.badge.unwrap();
            assert!(is_badge(&dom, &badge));
            assert_eq!(resolver.resolve_card(&dom, &badge), Some(c.card));
            assert!(group_has_badge(&dom, &c.group));
        }
    }

    #[test]
    fn test_resolver_falls_back_to_group() {
        let mut dom = MemoryDom::new();
        let group = dom.create_element("div");
        dom.set_attribute(&group, "role", "group");
        let span = dom.element(group, "span");
        dom.text(span, "Yerel");
        let resolver = GroupAncestorResolver::default();
        assert_eq!(resolver.resolve_card(&dom, &span), Some(group));
    }

    #[test]
    fn test_badge_outside_group_has_no_card() {
        let mut dom = MemoryDom::new();
        let span = dom.element(dom.root(), "span");
        dom.text(span, "Yerel");
        assert!(is_badge(&dom, &span));
        assert_eq!(GroupAncestorResolver::default().resolve_card(&dom, &span), None);
    }

    #[test]
    fn test_group_without_badge() {
        let mut dom = MemoryDom::new();
        let list = dom.element(dom.root(), "div");
        let plain = append_card(&mut dom, list, Badge::None);
        assert!(!group_has_badge(&dom, &plain.group));
    }
}
