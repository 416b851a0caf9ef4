//! Caret-from-point resolution for drops.
//!
//! `caretRangeFromPoint` (WebKit/Blink) is tried first, then the standard
//! `caretPositionFromPoint` (Gecko). Either may be missing; both are looked
//! up dynamically.

use js_sys::Reflect;
use plume_editor_core::ingest::CaretPosition;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

// === Custom bindings ===
//
// Bound by hand so a missing method is detected with `Reflect::has` instead
// of throwing on call.

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = web_sys::Document)]
    type CaretDocument;

    #[wasm_bindgen(method, js_name = caretRangeFromPoint)]
    fn caret_range_from_point(this: &CaretDocument, x: f64, y: f64) -> Option<web_sys::Range>;

    #[wasm_bindgen(method, js_name = caretPositionFromPoint)]
    fn caret_position_from_point(this: &CaretDocument, x: f64, y: f64) -> Option<DomCaretPosition>;

    /// The `CaretPosition` interface returned by `caretPositionFromPoint`.
    type DomCaretPosition;

    #[wasm_bindgen(method, getter, js_name = offsetNode)]
    fn offset_node(this: &DomCaretPosition) -> Option<web_sys::Node>;

    #[wasm_bindgen(method, getter)]
    fn offset(this: &DomCaretPosition) -> u32;
}

fn has_method(document: &web_sys::Document, name: &str) -> bool {
    Reflect::has(document, &JsValue::from_str(name)).unwrap_or(false)
}

/// Resolve viewport coordinates to a DOM caret, or `None` when neither API
/// exists or nothing is under the point.
pub fn caret_from_point(
    document: &web_sys::Document,
    x: f64,
    y: f64,
) -> Option<CaretPosition<web_sys::Node>> {
    let caret_doc: &CaretDocument = document.unchecked_ref();

    if has_method(document, "caretRangeFromPoint") {
        let range = caret_doc.caret_range_from_point(x, y)?;
        let node = range.start_container().ok()?;
        let offset = range.start_offset().ok()?;
        return Some(CaretPosition {
            node,
            offset: offset as usize,
        });
    }

    if has_method(document, "caretPositionFromPoint") {
        let position = caret_doc.caret_position_from_point(x, y)?;
        return Some(CaretPosition {
            node: position.offset_node()?,
            offset: position.offset() as usize,
        });
    }

    tracing::trace!("no caret-from-point API available");
    None
}
