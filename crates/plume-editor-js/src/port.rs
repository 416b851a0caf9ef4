//! Document Port over a JavaScript adapter object.

use plume_editor_core::{
    Attributes, Bounds, ChangeFeed, ContentHandler, DocumentPort, Embed, Selection,
    SelectionHandler, Source, Subscription,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::Node;

#[wasm_bindgen(typescript_custom_section)]
const TS_DOCUMENT_PORT: &'static str = r#"
export type ChangeSource = "user" | "api" | "silent";

/**
 * Bridge to the host rich-text engine.
 *
 * Offsets are UTF-16 code units, the same indices JavaScript strings use:
 * an astral character such as an emoji spans two offsets. Every embed
 * occupies exactly one offset, and `getText` must return U+FFFC (the object
 * replacement character) in its place so text and offsets stay aligned.
 *
 * Mention embeds are inserted with type `"mention"` and a value holding the
 * entity fields (`id`, `label`, `value?`, `avatarUrl?`, `meta?`) plus
 * `text`, the string the chip should display. Image embeds carry a data URI.
 */
export interface DocumentPortAdapter {
    getSelection(focus: boolean): { index: number; length: number } | null;
    setSelection(index: number, length: number, source: ChangeSource): void;
    getText(index: number, length: number): string;
    getLength(): number;
    getBounds(index: number): { left: number; top: number; bottom: number; right: number } | null;
    resolveNode(node: Node): number | null;
    getLeafNode(index: number): Node | null;
    containsNode(node: Node): boolean;
    insertText(index: number, text: string, source: ChangeSource): void;
    insertFormattedText(index: number, text: string, attributes: Record<string, string | false>, source: ChangeSource): void;
    deleteText(index: number, length: number, source: ChangeSource): void;
    insertEmbed(index: number, type: string, value: unknown, source: ChangeSource): void;
    formatText(index: number, length: number, attributes: Record<string, string | false>, source: ChangeSource): void;
    onSelectionChange(handler: (range: { index: number; length: number } | null, source: ChangeSource) => void): () => void;
    onContentChange(handler: (source: ChangeSource) => void): () => void;
}
"#;

#[wasm_bindgen]
extern "C" {
    /// The host engine, seen through the adapter interface above.
    #[wasm_bindgen(typescript_type = "DocumentPortAdapter")]
    #[derive(Clone, Debug)]
    pub type DocumentPortAdapter;

    #[wasm_bindgen(method, js_name = getSelection)]
    fn get_selection(this: &DocumentPortAdapter, focus: bool) -> JsValue;

    #[wasm_bindgen(method, js_name = setSelection)]
    fn set_selection(this: &DocumentPortAdapter, index: u32, length: u32, source: &str);

    #[wasm_bindgen(method, js_name = getText)]
    fn get_text(this: &DocumentPortAdapter, index: u32, length: u32) -> String;

    #[wasm_bindgen(method, js_name = getLength)]
    fn get_length(this: &DocumentPortAdapter) -> f64;

    #[wasm_bindgen(method, js_name = getBounds)]
    fn get_bounds(this: &DocumentPortAdapter, index: u32) -> JsValue;

    #[wasm_bindgen(method, js_name = resolveNode)]
    fn resolve_node(this: &DocumentPortAdapter, node: &Node) -> Option<f64>;

    #[wasm_bindgen(method, js_name = getLeafNode)]
    fn get_leaf_node(this: &DocumentPortAdapter, index: u32) -> Option<Node>;

    #[wasm_bindgen(method, js_name = containsNode)]
    fn contains_node(this: &DocumentPortAdapter, node: &Node) -> bool;

    #[wasm_bindgen(method, js_name = insertText)]
    fn insert_text(this: &DocumentPortAdapter, index: u32, text: &str, source: &str);

    #[wasm_bindgen(method, js_name = insertFormattedText)]
    fn insert_formatted_text(
        this: &DocumentPortAdapter,
        index: u32,
        text: &str,
        attributes: JsValue,
        source: &str,
    );

    #[wasm_bindgen(method, js_name = deleteText)]
    fn delete_text(this: &DocumentPortAdapter, index: u32, length: u32, source: &str);

    #[wasm_bindgen(method, js_name = insertEmbed)]
    fn insert_embed(this: &DocumentPortAdapter, index: u32, kind: &str, value: JsValue, source: &str);

    #[wasm_bindgen(method, js_name = formatText)]
    fn format_text(this: &DocumentPortAdapter, index: u32, length: u32, attributes: JsValue, source: &str);

    #[wasm_bindgen(method, js_name = onSelectionChange)]
    fn on_selection_change(
        this: &DocumentPortAdapter,
        handler: &Closure<dyn FnMut(JsValue, JsValue)>,
    ) -> js_sys::Function;

    #[wasm_bindgen(method, js_name = onContentChange)]
    fn on_content_change(
        this: &DocumentPortAdapter,
        handler: &Closure<dyn FnMut(JsValue)>,
    ) -> js_sys::Function;
}

/// Attribute maps and mention entities must reach JS as plain objects.
fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    match value.serialize(&serializer) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("failed to convert value for the document engine: {}", e);
            JsValue::UNDEFINED
        }
    }
}

fn parse_source(value: &JsValue) -> Source {
    value
        .as_string()
        .map(|s| Source::parse(&s))
        .unwrap_or(Source::Api)
}

fn parse_selection(value: JsValue) -> Option<Selection> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    match serde_wasm_bindgen::from_value(value) {
        Ok(selection) => Some(selection),
        Err(e) => {
            tracing::warn!("malformed selection from the document engine: {}", e);
            None
        }
    }
}

fn offset(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// [`DocumentPort`] and [`ChangeFeed`] over a [`DocumentPortAdapter`].
#[derive(Clone, Debug)]
pub struct JsDocumentPort {
    adapter: DocumentPortAdapter,
}

impl JsDocumentPort {
    pub fn new(adapter: DocumentPortAdapter) -> Self {
        Self { adapter }
    }
}

impl DocumentPort for JsDocumentPort {
    type Node = Node;

    fn selection(&self, focus: bool) -> Option<Selection> {
        parse_selection(self.adapter.get_selection(focus))
    }

    fn set_selection(&self, index: usize, length: usize, source: Source) {
        self.adapter
            .set_selection(offset(index), offset(length), source.as_str());
    }

    fn text(&self, index: usize, length: usize) -> String {
        self.adapter.get_text(offset(index), offset(length))
    }

    fn len(&self) -> usize {
        self.adapter.get_length().max(0.0) as usize
    }

    // JS strings index by UTF-16 code unit.
    fn offset_width(&self, text: &str) -> usize {
        text.encode_utf16().count()
    }

    fn bounds(&self, index: usize) -> Option<Bounds> {
        let value = self.adapter.get_bounds(offset(index));
        if value.is_null() || value.is_undefined() {
            return None;
        }
        serde_wasm_bindgen::from_value(value).ok()
    }

    fn resolve_node(&self, node: &Node) -> Option<usize> {
        self.adapter
            .resolve_node(node)
            .filter(|offset| *offset >= 0.0)
            .map(|offset| offset as usize)
    }

    fn leaf_node(&self, index: usize) -> Option<Node> {
        self.adapter.get_leaf_node(offset(index))
    }

    fn contains_node(&self, node: &Node) -> bool {
        self.adapter.contains_node(node)
    }

    fn insert_text(&self, index: usize, text: &str, source: Source) {
        self.adapter.insert_text(offset(index), text, source.as_str());
    }

    fn insert_formatted_text(
        &self,
        index: usize,
        text: &str,
        attributes: &Attributes,
        source: Source,
    ) {
        self.adapter
            .insert_formatted_text(offset(index), text, to_js(attributes), source.as_str());
    }

    fn delete_text(&self, index: usize, length: usize, source: Source) {
        self.adapter
            .delete_text(offset(index), offset(length), source.as_str());
    }

    fn insert_embed(&self, index: usize, embed: &Embed, source: Source) {
        let value = match embed {
            Embed::Image(uri) => JsValue::from_str(uri),
            Embed::Mention(entity) => to_js(&entity.embed_value()),
        };
        self.adapter
            .insert_embed(offset(index), embed.type_name(), value, source.as_str());
    }

    fn format_range(&self, index: usize, length: usize, attributes: &Attributes, source: Source) {
        self.adapter.format_text(
            offset(index),
            offset(length),
            to_js(attributes),
            source.as_str(),
        );
    }
}

impl ChangeFeed for JsDocumentPort {
    fn on_selection_change(&self, mut handler: SelectionHandler) -> Subscription {
        let closure = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |range, source| {
            handler(parse_selection(range), parse_source(&source));
        });
        let unsubscribe = self.adapter.on_selection_change(&closure);
        Subscription::new(move || {
            if let Err(e) = unsubscribe.call0(&JsValue::NULL) {
                tracing::warn!("selection unsubscribe failed: {:?}", e);
            }
            drop(closure);
        })
    }

    fn on_content_change(&self, mut handler: ContentHandler) -> Subscription {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |source| {
            handler(parse_source(&source));
        });
        let unsubscribe = self.adapter.on_content_change(&closure);
        Subscription::new(move || {
            if let Err(e) = unsubscribe.call0(&JsValue::NULL) {
                tracing::warn!("content unsubscribe failed: {:?}", e);
            }
            drop(closure);
        })
    }
}
