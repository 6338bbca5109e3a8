//! Content script wiring: settings load, menu, mutation observer, and
//! storage change subscription around one [`Scanner`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lf_core::{Scanner, Settings};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlInputElement, MutationObserver, MutationObserverInit, MutationRecord};

use crate::dom::{normalize_root, on_ready, WebDom};
use crate::menu::{install_drag, WebMenu};
use crate::scheduler::BrowserScheduler;
use crate::storage::{self, ChromeStorage};

pub type ContentScanner = Scanner<WebDom, BrowserScheduler>;

thread_local! {
    static CONTENT: RefCell<Option<Rc<RefCell<ContentScanner>>>> = const { RefCell::new(None) };
}

/// Run `f` against the scanner unless it is gone or already borrowed.
fn with_scanner(scanner: &Weak<RefCell<ContentScanner>>, f: impl FnOnce(&mut ContentScanner)) {
    let Some(scanner) = scanner.upgrade() else {
        return;
    };
    match scanner.try_borrow_mut() {
        Ok(mut scanner) => f(&mut scanner),
        Err(_) => debug!("Scanner busy, dropping event"),
    };
}

/// Inspect the running scanner, if any. Returns whether one was found.
pub fn with_running(f: impl FnOnce(&ContentScanner)) -> bool {
    CONTENT.with(|slot| match slot.borrow().as_ref().map(|s| s.try_borrow()) {
        Some(Ok(scanner)) => {
            f(&scanner);
            true
        }
        _ => false,
    })
}

pub fn start(document: Document) -> Result<(), JsValue> {
    on_ready(&document.clone(), move || init(document))
}

fn init(document: Document) {
    if !storage::is_context_valid() {
        debug!("Extension context invalid, not starting");
        return;
    }
    if let Err(e) = storage::load_settings(move |settings| boot(document, settings)) {
        warn!("Failed to load settings: {e}");
    }
}

fn boot(document: Document, settings: Settings) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let scheduler = BrowserScheduler::new(window);
    let dispatch = scheduler.dispatch_slot();
    let scanner = Rc::new(RefCell::new(
        Scanner::new(WebDom::new(document.clone()), scheduler, settings).with_store(Box::new(ChromeStorage)),
    ));
    let weak = Rc::downgrade(&scanner);

    {
        let weak = weak.clone();
        *dispatch.borrow_mut() = Some(Rc::new(move |job| with_scanner(&weak, |s| s.run_job(job))));
    }

    match WebMenu::create(&document) {
        Ok(Some(menu)) => {
            if let Err(e) = wire_menu(&menu, &weak) {
                warn!("Failed to wire menu controls: {e:?}");
            }
            if let Err(e) = install_drag(&document, menu.root()) {
                warn!("Failed to make menu draggable: {e:?}");
            }
            scanner.borrow_mut().attach_view(Box::new(menu));
        }
        Ok(None) => debug!("Menu already present"),
        Err(e) => warn!("Failed to create menu: {e:?}"),
    }

    scanner.borrow_mut().start();

    if let Err(e) = observe(&document, &weak) {
        warn!("Failed to observe mutations: {e:?}");
    }

    {
        let weak = weak.clone();
        if let Err(e) = storage::on_changed(move |change| with_scanner(&weak, |s| s.apply_change(&change))) {
            warn!("Failed to subscribe to storage changes: {e}");
        }
    }

    CONTENT.with(|slot| *slot.borrow_mut() = Some(scanner));
}

fn on_change(
    input: &HtmlInputElement,
    scanner: &Weak<RefCell<ContentScanner>>,
    apply: fn(&mut ContentScanner, bool),
) -> Result<(), JsValue> {
    let handler = {
        let input = input.clone();
        let scanner = scanner.clone();
        Closure::<dyn FnMut()>::new(move || {
            let checked = input.checked();
            with_scanner(&scanner, |s| apply(s, checked));
        })
    };
    input.add_event_listener_with_callback("change", handler.as_ref().unchecked_ref())?;
    handler.forget();
    Ok(())
}

fn wire_menu(menu: &WebMenu, scanner: &Weak<RefCell<ContentScanner>>) -> Result<(), JsValue> {
    on_change(menu.filter_input(), scanner, |s, on| s.toggle_filter_from_menu(on))?;
    on_change(menu.highlight_input(), scanner, |s, on| s.toggle_highlight_from_menu(on))
}

fn observe(document: &Document, scanner: &Weak<RefCell<ContentScanner>>) -> Result<(), JsValue> {
    let Some(target) = document.document_element() else {
        return Ok(());
    };

    let callback = {
        let scanner = scanner.clone();
        Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let mut added = Vec::new();
                for record in records.iter() {
                    let record: MutationRecord = record.unchecked_into();
                    let nodes = record.added_nodes();
                    added.extend((0..nodes.length()).filter_map(|i| nodes.item(i)).filter_map(|n| normalize_root(&n)));
                }
                if !added.is_empty() {
                    with_scanner(&scanner, |s| s.on_nodes_added(added));
                }
            },
        )
    };

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(&target, &options)?;
    // The observer and its callback live for the page lifetime
    callback.forget();
    Ok(())
}
