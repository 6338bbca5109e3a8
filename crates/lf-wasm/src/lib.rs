//! WebAssembly bindings for Local Filter
//!
//! One module serves both extension pages: the content script calls
//! [`start_content`] and the popup calls [`start_popup`].

pub mod content;
pub mod dom;
pub mod menu;
pub mod popup;
pub mod scheduler;
pub mod storage;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

fn document() -> Result<web_sys::Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))
}

#[wasm_bindgen]
pub fn start_content() -> Result<(), JsValue> {
    content::start(document()?)
}

#[wasm_bindgen]
pub fn start_popup() -> Result<(), JsValue> {
    popup::start(document()?)
}

#[wasm_bindgen]
pub fn is_context_valid() -> bool {
    storage::is_context_valid()
}

/// Snapshot of the content scanner for debugging from the console.
#[wasm_bindgen]
pub fn content_status() -> JsValue {
    let result = js_sys::Object::new();
    let running = content::with_running(|scanner| {
        let settings = scanner.settings();
        let counters = scanner.counters();
        let _ = js_sys::Reflect::set(&result, &"filterEnabled".into(), &JsValue::from(settings.filter_enabled));
        let _ = js_sys::Reflect::set(&result, &"highlightEnabled".into(), &JsValue::from(settings.highlight_enabled));
        let _ = js_sys::Reflect::set(&result, &"autoDisabled".into(), &JsValue::from(scanner.is_auto_disabled()));
        let _ = js_sys::Reflect::set(&result, &"hidden".into(), &JsValue::from(counters.hidden as u32));
        let _ = js_sys::Reflect::set(&result, &"removed".into(), &JsValue::from(scanner.tracker().removed_len() as u32));
        let _ = js_sys::Reflect::set(&result, &"armedTasks".into(), &JsValue::from(scanner.scheduler().armed_count() as u32));
    });
    let _ = js_sys::Reflect::set(&result, &"running".into(), &JsValue::from(running));
    result.into()
}
