//! Floating on-page menu.

use std::cell::RefCell;
use std::rc::Rc;

use lf_core::menu::{FILTER_LABEL, HIGHLIGHT_LABEL};
use lf_core::{MenuDrag, MenuStatus, MenuView, Point, PointerTarget};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, PointerEvent};

pub const MENU_ID: &str = "temu-local-menu";
const MENU_CLASS: &str = "temu-local-menu";
const ROW_CLASS: &str = "temu-local-menu-row";
const LABEL_CLASS: &str = "temu-local-menu-label";
const STATUS_CLASS: &str = "temu-local-menu-status";
const WARNING_CLASS: &str = "temu-local-menu-warning";
const SWITCH_CLASS: &str = "temu-local-menu-switch";
const SLIDER_CLASS: &str = "temu-local-menu-slider";
const DRAGGING_CLASS: &str = "temu-local-menu-dragging";

/// Handles to the menu's live elements.
#[derive(Clone)]
pub struct WebMenu {
    root: HtmlElement,
    filter_input: HtmlInputElement,
    filter_status: HtmlElement,
    filter_warning: HtmlElement,
    highlight_input: HtmlInputElement,
    highlight_status: HtmlElement,
}

fn create_div(document: &Document, class: &str) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = document.create_element("div")?.unchecked_into();
    el.set_class_name(class);
    Ok(el)
}

/// `label.switch > input[type=checkbox] + span.slider`
fn create_switch(document: &Document) -> Result<(Element, HtmlInputElement), JsValue> {
    let switch = document.create_element("label")?;
    switch.set_class_name(SWITCH_CLASS);
    let input: HtmlInputElement = document.create_element("input")?.unchecked_into();
    input.set_type("checkbox");
    let slider = document.create_element("span")?;
    slider.set_class_name(SLIDER_CLASS);
    switch.append_child(&input)?;
    switch.append_child(&slider)?;
    Ok((switch, input))
}

impl WebMenu {
    /// Build the menu and attach it to the document element.
    ///
    /// Returns `None` when the page already has one.
    pub fn create(document: &Document) -> Result<Option<Self>, JsValue> {
        if document.get_element_by_id(MENU_ID).is_some() {
            return Ok(None);
        }
        let Some(document_element) = document.document_element() else {
            return Ok(None);
        };

        let root = create_div(document, MENU_CLASS)?;
        root.set_id(MENU_ID);

        let filter_row = create_div(document, ROW_CLASS)?;
        let filter_label = create_div(document, LABEL_CLASS)?;
        filter_label.set_text_content(Some(FILTER_LABEL));
        let filter_status = create_div(document, STATUS_CLASS)?;
        let filter_warning = create_div(document, WARNING_CLASS)?;
        let (filter_switch, filter_input) = create_switch(document)?;
        filter_row.append_child(&filter_label)?;
        filter_row.append_child(&filter_switch)?;
        filter_row.append_child(&filter_status)?;
        filter_row.append_child(&filter_warning)?;

        let highlight_row = create_div(document, ROW_CLASS)?;
        let highlight_label = create_div(document, LABEL_CLASS)?;
        highlight_label.set_text_content(Some(HIGHLIGHT_LABEL));
        let highlight_status = create_div(document, STATUS_CLASS)?;
        let (highlight_switch, highlight_input) = create_switch(document)?;
        highlight_row.append_child(&highlight_label)?;
        highlight_row.append_child(&highlight_switch)?;
        highlight_row.append_child(&highlight_status)?;

        root.append_child(&filter_row)?;
        root.append_child(&highlight_row)?;
        document_element.append_child(&root)?;

        Ok(Some(Self {
            root,
            filter_input,
            filter_status,
            filter_warning,
            highlight_input,
            highlight_status,
        }))
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub fn filter_input(&self) -> &HtmlInputElement {
        &self.filter_input
    }

    pub fn highlight_input(&self) -> &HtmlInputElement {
        &self.highlight_input
    }
}

impl MenuView for WebMenu {
    fn render(&mut self, status: &MenuStatus) {
        self.filter_input.set_checked(status.filter_checked);
        self.filter_status.set_text_content(Some(&status.filter_status));
        self.filter_status.set_title(&status.filter_title);
        self.filter_warning.set_text_content(Some(&status.filter_warning));
        self.highlight_input.set_checked(status.highlight_checked);
        self.highlight_status.set_text_content(Some(&status.highlight_status));
    }

    fn set_visible(&mut self, visible: bool) {
        let display = if visible { "grid" } else { "none" };
        let _ = self.root.style().set_property("display", display);
    }
}

fn pointer_target(event: &PointerEvent) -> PointerTarget {
    let Some(el) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
        return PointerTarget::Panel;
    };
    let tag = el.tag_name();
    if tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("label") || el.class_list().contains(SLIDER_CLASS) {
        PointerTarget::Control
    } else {
        PointerTarget::Panel
    }
}

fn place(panel: &HtmlElement, origin: Point) {
    let style = panel.style();
    let _ = style.set_property("left", &format!("{}px", origin.x));
    let _ = style.set_property("top", &format!("{}px", origin.y));
}

/// Make the panel draggable: pointer-down on the panel, move and up on the
/// document.
pub fn install_drag(document: &Document, panel: &HtmlElement) -> Result<(), JsValue> {
    let drag = Rc::new(RefCell::new(MenuDrag::new()));

    let on_down = {
        let drag = drag.clone();
        let panel = panel.clone();
        Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let rect = panel.get_bounding_client_rect();
            let pointer = Point::new(f64::from(event.client_x()), f64::from(event.client_y()));
            let origin = Point::new(rect.left(), rect.top());
            let Some(pinned) = drag.borrow_mut().pointer_down(pointer_target(&event), pointer, origin) else {
                return;
            };
            let style = panel.style();
            let _ = style.set_property("right", "auto");
            let _ = style.set_property("bottom", "auto");
            place(&panel, pinned);
            let _ = panel.class_list().add_1(DRAGGING_CLASS);
            event.prevent_default();
        })
    };

    let on_move = {
        let drag = drag.clone();
        let panel = panel.clone();
        Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let pointer = Point::new(f64::from(event.client_x()), f64::from(event.client_y()));
            if let Some(origin) = drag.borrow().pointer_move(pointer) {
                place(&panel, origin);
            }
        })
    };

    let on_up = {
        let panel = panel.clone();
        Closure::<dyn FnMut(PointerEvent)>::new(move |_event: PointerEvent| {
            if drag.borrow_mut().pointer_up() {
                let _ = panel.class_list().remove_1(DRAGGING_CLASS);
            }
        })
    };

    panel.add_event_listener_with_callback("pointerdown", on_down.as_ref().unchecked_ref())?;
    document.add_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref())?;
    document.add_event_listener_with_callback("pointerup", on_up.as_ref().unchecked_ref())?;
    on_down.forget();
    on_move.forget();
    on_up.forget();
    Ok(())
}
