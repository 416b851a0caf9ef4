//! Small DOM helpers shared by the modules.

use plume_editor_core::{PlatformError, Rect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

/// Convert a JS exception into a [`PlatformError`].
pub fn js_error(e: JsValue) -> PlatformError {
    PlatformError(
        e.as_string()
            .unwrap_or_else(|| format!("{:?}", e)),
    )
}

/// Create an element of type `T` with the given class attribute.
pub fn create<T: JsCast>(document: &Document, tag: &str, class: &str) -> Result<T, PlatformError> {
    let element = document.create_element(tag).map_err(js_error)?;
    element.set_class_name(class);
    element
        .dyn_into::<T>()
        .map_err(|_| PlatformError::from(format!("<{tag}> has unexpected type")))
}

pub fn set_style(element: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = element.style().set_property(property, value) {
        tracing::warn!(property, "failed to set style: {:?}", e);
    }
}

pub fn set_px(element: &HtmlElement, property: &str, value: f64) {
    set_style(element, property, &format!("{value}px"));
}

pub fn toggle_class(element: &Element, class: &str, on: bool) {
    if let Err(e) = element.class_list().toggle_with_force(class, on) {
        tracing::warn!(class, "failed to toggle class: {:?}", e);
    }
}

pub fn set_attr(element: &Element, name: &str, value: &str) {
    if let Err(e) = element.set_attribute(name, value) {
        tracing::warn!(name, "failed to set attribute: {:?}", e);
    }
}

pub fn append(parent: &Node, child: &Node) -> Result<(), PlatformError> {
    parent.append_child(child).map(|_| ()).map_err(js_error)
}

/// Make `container` a positioning context for absolutely placed overlays.
pub fn ensure_positioned(container: &HtmlElement) {
    let style = container.style();
    let position = style.get_property_value("position").unwrap_or_default();
    if position.is_empty() || position == "static" {
        set_style(container, "position", "relative");
    }
}

/// Viewport-relative bounding rect.
pub fn client_rect(element: &Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// Whether `target` is `root` or inside it.
pub fn contains(root: &Node, target: Option<&Node>) -> bool {
    root.contains(target)
}

/// The event target as a DOM node, if it is one.
pub fn event_node(event: &web_sys::Event) -> Option<Node> {
    event.target()?.dyn_into::<Node>().ok()
}
