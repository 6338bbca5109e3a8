//! Browser tests for the web-sys DOM adapter.
//!
//! Run with `wasm-pack test --headless --chrome crates/lf-wasm`.

#![cfg(target_arch = "wasm32")]

use lf_core::types::{CardFlags, Selector, PLACEHOLDER_TEXT, REMOVING_CLASS};
use lf_core::{Deferral, Dom, Job, ManualScheduler, ScanRoot, Scanner, Scheduler, Settings};
use lf_wasm::dom::{normalize_root, WebDom};
use lf_wasm::scheduler::BrowserScheduler;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, Node};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

const CARD_HTML: &str = r#"
    <div class="card"><div class="inner"><div role="group">
        <div>Product</div><div><span> Yerel </span></div>
    </div></div></div>
    <div class="card"><div class="inner"><div role="group">
        <div>Product</div><span>Yurtdışı</span>
    </div></div></div>
"#;

fn mount(html: &str) -> Element {
    let doc = document();
    let host = doc.create_element("div").unwrap();
    host.set_inner_html(html);
    doc.body().unwrap().append_child(&host).unwrap();
    host
}

#[wasm_bindgen_test]
fn test_queries_and_flags() {
    let host = mount(CARD_HTML);
    let mut dom = WebDom::new(document());
    let root: Node = host.clone().into();

    let groups = dom.query_all(&root, Selector::Group);
    assert_eq!(groups.len(), 2);
    assert_eq!(dom.query_all(&root, Selector::Span).len(), 2);
    assert!(dom.query_first(&root, Selector::BadgeFastPath).is_none());

    dom.set_flags(&groups[0], CardFlags::CHECKED);
    assert!(dom.has_flag(&groups[0], CardFlags::CHECKED));
    let el: &Element = groups[0].dyn_ref().unwrap();
    assert_eq!(el.get_attribute("data-temu-local-checked").as_deref(), Some("1"));
    dom.clear_flags(&groups[0], CardFlags::CHECKED);
    assert!(!dom.has_flag(&groups[0], CardFlags::CHECKED));

    host.remove();
}

#[wasm_bindgen_test]
fn test_placeholder_swap() {
    let host = mount(CARD_HTML);
    let mut dom = WebDom::new(document());
    let card: Node = host.first_element_child().unwrap().into();

    let placeholder = dom.create_placeholder();
    assert!(dom.replace_with(&card, &placeholder));
    assert!(!dom.is_connected(&card));
    assert_eq!(placeholder.text_content().as_deref(), Some(PLACEHOLDER_TEXT));
    assert!(dom.replace_with(&placeholder, &card));
    assert!(dom.is_connected(&card));
    assert!(!dom.replace_with(&placeholder, &card));

    host.remove();
}

#[wasm_bindgen_test]
fn test_scanner_on_live_dom() {
    let host = mount(CARD_HTML);
    let card: Node = host.first_element_child().unwrap().into();
    let other: Node = host.last_element_child().unwrap().into();

    let mut scanner = Scanner::new(WebDom::new(document()), ManualScheduler::new(), Settings::default());
    let report = scanner.scan(&ScanRoot::Node(host.clone().into()), false);
    assert_eq!(report.badges_matched, 1);
    assert!(scanner.dom().has_class(&card, REMOVING_CLASS));

    scanner.settle();
    assert!(!card.is_connected());
    assert!(other.is_connected());

    scanner.restore_all();
    scanner.settle();
    assert!(card.is_connected());

    host.remove();
}

#[wasm_bindgen_test]
fn test_normalize_root() {
    let doc = document();
    assert_eq!(normalize_root(&doc.clone().into()), doc.document_element().map(Into::into));

    let fragment = doc.create_document_fragment();
    let child = doc.create_element("span").unwrap();
    fragment.append_child(&doc.create_text_node("x")).unwrap();
    fragment.append_child(&child).unwrap();
    assert_eq!(normalize_root(&fragment.into()), Some(child.into()));

    assert_eq!(normalize_root(&doc.create_text_node("x").into()), None);
}

#[wasm_bindgen_test]
fn test_cancelled_task_releases_callback() {
    let mut scheduler = BrowserScheduler::new(web_sys::window().unwrap());
    let first = scheduler.schedule(Deferral::Delay(60_000), Job::FlushScans);
    let second = scheduler.schedule(
        Deferral::Idle {
            timeout_ms: 60_000,
            fallback_ms: 60_000,
        },
        Job::Render,
    );
    assert_eq!(scheduler.armed_count(), 2);

    scheduler.cancel(first);
    assert_eq!(scheduler.armed_count(), 1);
    scheduler.cancel(first);
    assert_eq!(scheduler.armed_count(), 1);
    scheduler.cancel(second);
    assert_eq!(scheduler.armed_count(), 0);
}
