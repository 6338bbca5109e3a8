//! `chrome.storage.local` access.
//!
//! Every call goes through `Reflect` so a page whose extension context was
//! invalidated (extension reloaded under it) sees a [`StoreError`] instead of
//! a thrown exception.

use js_sys::{Function, Reflect};
use lf_core::{Settings, SettingsChange, SettingsStore, StoreError};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

fn get(target: &JsValue, key: &str) -> Result<JsValue, StoreError> {
    let value = Reflect::get(target, &JsValue::from_str(key))
        .map_err(|_| StoreError::Unavailable(format!("cannot read '{key}'")))?;
    if value.is_undefined() || value.is_null() {
        return Err(StoreError::Unavailable(format!("'{key}' is missing")));
    }
    Ok(value)
}

fn chrome() -> Result<JsValue, StoreError> {
    get(&js_sys::global(), "chrome").map_err(|_| StoreError::ContextInvalidated)
}

fn method(target: &JsValue, name: &str) -> Result<Function, StoreError> {
    get(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| StoreError::Unavailable(format!("'{name}' is not a function")))
}

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            Reflect::get(err, &"message".into())
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

/// `chrome.runtime.id` is present.
pub fn is_context_valid() -> bool {
    chrome()
        .and_then(|c| get(&c, "runtime"))
        .and_then(|r| get(&r, "id"))
        .map(|id| id.is_truthy())
        .unwrap_or(false)
}

fn local_area() -> Result<JsValue, StoreError> {
    let storage = get(&chrome()?, "storage")?;
    get(&storage, "local")
}

/// Read all settings, filling in defaults for missing keys.
pub fn load_settings(on_loaded: impl FnOnce(Settings) + 'static) -> Result<(), StoreError> {
    let area = local_area()?;
    let get_fn = method(&area, "get")?;
    let defaults = serde_wasm_bindgen::to_value(&Settings::default())
        .map_err(|e| StoreError::Rejected(e.to_string()))?;

    let callback = Closure::once_into_js(move |result: JsValue| {
        let raw: Value = serde_wasm_bindgen::from_value(result).unwrap_or(Value::Null);
        on_loaded(Settings::from_stored(&raw));
    });

    get_fn
        .call2(&area, &defaults, &callback)
        .map(|_| ())
        .map_err(|e| StoreError::Unavailable(describe(&e)))
}

/// Subscribe to changes of our keys in the local area.
pub fn on_changed(handler: impl Fn(SettingsChange) + 'static) -> Result<(), StoreError> {
    let on_changed = get(&get(&chrome()?, "storage")?, "onChanged")?;
    let add_listener = method(&on_changed, "addListener")?;

    let listener = Closure::<dyn Fn(JsValue, String)>::new(move |changes: JsValue, area: String| {
        let Ok(diff) = serde_wasm_bindgen::from_value::<Value>(changes) else {
            return;
        };
        if let Some(change) = SettingsChange::from_storage_diff(&diff, &area) {
            handler(change);
        }
    });

    add_listener
        .call1(&on_changed, listener.as_ref())
        .map_err(|e| StoreError::Unavailable(describe(&e)))?;
    // Lives for the page lifetime
    listener.forget();
    Ok(())
}

/// Write side backed by `chrome.storage.local.set`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl SettingsStore for ChromeStorage {
    fn persist(&mut self, change: &SettingsChange) -> Result<(), StoreError> {
        if !is_context_valid() {
            return Err(StoreError::ContextInvalidated);
        }
        let area = local_area()?;
        let set_fn = method(&area, "set")?;
        let value = serde_wasm_bindgen::to_value(change).map_err(|e| StoreError::Rejected(e.to_string()))?;
        set_fn
            .call1(&area, &value)
            .map(|_| ())
            .map_err(|e| StoreError::Rejected(describe(&e)))
    }
}
