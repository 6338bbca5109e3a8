//! Extension popup: three checkboxes bound straight to storage.

use lf_core::{SettingKey, Settings, SettingsChange, SettingsStore};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlInputElement};

use crate::dom::on_ready;
use crate::storage::{self, ChromeStorage};

fn control_id(key: SettingKey) -> &'static str {
    match key {
        SettingKey::FilterEnabled => "filterToggle",
        SettingKey::HighlightEnabled => "highlightToggle",
        SettingKey::MenuEnabled => "menuToggle",
    }
}

fn controls(document: &Document) -> Vec<(SettingKey, HtmlInputElement)> {
    SettingKey::ALL
        .into_iter()
        .filter_map(|key| {
            let input = document
                .get_element_by_id(control_id(key))?
                .dyn_into::<HtmlInputElement>()
                .ok()?;
            Some((key, input))
        })
        .collect()
}

pub fn start(document: Document) -> Result<(), JsValue> {
    on_ready(&document.clone(), move || {
        if let Err(e) = bind(&document) {
            warn!("Failed to bind popup controls: {e:?}");
        }
    })
}

fn render(controls: &[(SettingKey, HtmlInputElement)], settings: &Settings) {
    for (key, input) in controls {
        input.set_checked(settings.get(*key));
    }
}

fn bind(document: &Document) -> Result<(), JsValue> {
    let controls = controls(document);

    let to_render = controls.clone();
    if let Err(e) = storage::load_settings(move |settings| render(&to_render, &settings)) {
        warn!("Failed to load settings: {e}");
    }

    for (key, input) in controls {
        let handler = {
            let input = input.clone();
            Closure::<dyn FnMut()>::new(move || {
                let change = SettingsChange::single(key, input.checked());
                if let Err(e) = ChromeStorage.persist(&change) {
                    warn!("Failed to save {}: {e}", key.storage_key());
                }
            })
        };
        input.add_event_listener_with_callback("change", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }
    Ok(())
}
