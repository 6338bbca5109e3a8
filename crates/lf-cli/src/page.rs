//! Load a saved HTML page into the in-memory DOM.

use lf_core::{Dom, MemoryDom};
use scraper::{Html, Node};

/// Parse `html` and copy its element tree under the document element.
pub fn load(html: &str) -> MemoryDom {
    let document = Html::parse_document(html);
    let source_root = document.root_element();
    let mut dom = MemoryDom::new();
    let root = dom.root();
    for (name, value) in source_root.value().attrs() {
        dom.set_attribute(&root, name, value);
    }

    let mut stack = vec![(*source_root, root)];
    while let Some((source, parent)) = stack.pop() {
        for child in source.children() {
            match child.value() {
                Node::Element(element) => {
                    let id = dom.element(parent, element.name());
                    for (name, value) in element.attrs() {
                        dom.set_attribute(&id, name, value);
                    }
                    stack.push((child, id));
                }
                Node::Text(text) => {
                    dom.text(parent, text);
                }
                Node::Comment(comment) => {
                    let id = dom.create_comment(comment);
                    dom.append_child(parent, id);
                }
                _ => {}
            }
        }
    }
    dom
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::Selector;

    #[test]
    fn test_load_keeps_structure() {
        let dom = load(
            r#"<html lang="tr"><body>
                <div class="card"><div><div role="group"><span class="a C9HMW0KN">Yerel</span></div></div></div>
                <!-- note -->
            </body></html>"#,
        );
        let root = dom.root();
        assert_eq!(dom.attribute(&root, "lang").as_deref(), Some("tr"));

        let groups = dom.query_all(&root, Selector::Group);
        assert_eq!(groups.len(), 1);
        let badge = dom.query_first(&root, Selector::BadgeFastPath).unwrap();
        assert_eq!(dom.text_content(&badge), "Yerel");
        assert!(dom.has_class(&badge, "a"));
        assert_eq!(dom.parent_element(&badge), Some(groups[0]));
    }
}
