use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, PointerEvent};

use inkboard_engine::{CanvasSize, PointerDevice, PointerInput, Viewport};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_style(element: &HtmlElement, property: &str, value: &str) {
    let _ = element.style().set_property(property, value);
}

pub fn set_shown(element: &HtmlElement, shown: bool) {
    set_style(element, "display", if shown { "block" } else { "none" });
}

/// Page metrics with the drawing layer taken out of the flow, so the canvas
/// never measures itself. `None` until the card container exists.
pub fn measure_viewport(document: &Document, wrapper: &HtmlElement) -> Option<Viewport> {
    let card = document.query_selector(".card").ok()??;
    let root: Element = document.document_element()?;
    set_shown(wrapper, false);
    let viewport = Viewport {
        client_width: root.client_width() as f64,
        client_height: root.client_height() as f64,
        content_width: card.scroll_width() as f64,
        content_height: root.scroll_height() as f64,
    };
    set_shown(wrapper, true);
    Some(viewport)
}

pub fn set_css_size(canvas: &HtmlCanvasElement, size: CanvasSize) {
    if let Ok(element) = canvas.clone().dyn_into::<HtmlElement>() {
        set_style(&element, "width", &format!("{}px", size.width));
        set_style(&element, "height", &format!("{}px", size.height));
    }
}

/// Pointer position relative to the canvas, in CSS pixels.
pub fn pointer_input(canvas: &HtmlCanvasElement, event: &PointerEvent) -> PointerInput {
    let rect = canvas.get_bounding_client_rect();
    PointerInput {
        x: event.client_x() as f64 - rect.left(),
        y: event.client_y() as f64 - rect.top(),
        is_primary: event.is_primary(),
        device: PointerDevice::from_pointer_type(&event.pointer_type()),
        pressure: event.pressure() as f64,
    }
}
