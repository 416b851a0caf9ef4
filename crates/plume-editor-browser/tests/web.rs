//! WASM browser tests for plume-editor-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use gloo_timers::future::TimeoutFuture;
use plume_editor_browser::{
    AnimationFrames, CharCounterModule, ChangeFeed, ContentHandler, CounterOptions, DocumentPort,
    EMBED_PLACEHOLDER, Embed, FrameScheduler, ImageDropModule, ImageOverlayOptions, ImageResizeModule,
    MemoryDocument, MentionModule, MentionOptions, Reactor, Selection, SelectionHandler, Source,
    Subscription, dispatch_weak, read_data_uri,
};
use web_sys::{
    Blob, BlobPropertyBag, ClipboardEvent, ClipboardEventInit, DataTransfer, DragEvent,
    DragEventInit, File, FilePropertyBag, HtmlElement, KeyboardEvent, KeyboardEventInit,
    MouseEvent, MouseEventInit, Node,
};

fn mount(tag: &str) -> HtmlElement {
    let document = gloo_utils::document();
    let element = document
        .create_element(tag)
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    document.body().unwrap().append_child(&element).unwrap();
    element
}

/// Let spawned futures and zero-delay timers run.
async fn settle() {
    TimeoutFuture::new(30).await;
}

fn key(target: &HtmlElement, name: &str) -> KeyboardEvent {
    let init = KeyboardEventInit::new();
    init.set_key(name);
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    target.dispatch_event(&event).unwrap();
    event
}

fn mouse(target: &web_sys::EventTarget, kind: &str, x: i32, y: i32) -> MouseEvent {
    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_button(0);
    init.set_client_x(x);
    init.set_client_y(y);
    let event = MouseEvent::new_with_mouse_event_init_dict(kind, &init).unwrap();
    target.dispatch_event(&event).unwrap();
    event
}

fn png_file() -> File {
    let bytes = js_sys::Uint8Array::from(&[0x89u8, b'P', b'N', b'G'][..]);
    let parts = js_sys::Array::of1(&bytes);
    let bag = FilePropertyBag::new();
    bag.set_type("image/png");
    File::new_with_u8_array_sequence_and_options(&parts, "pixel.png", &bag).unwrap()
}

fn paste(target: &HtmlElement, transfer: &DataTransfer) -> ClipboardEvent {
    let init = ClipboardEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_clipboard_data(Some(transfer));
    let event = ClipboardEvent::new_with_event_init_dict("paste", &init).unwrap();
    target.dispatch_event(&event).unwrap();
    event
}

/// A 100x50 image registered as the embed at offset 0.
fn image_fixture() -> (HtmlElement, HtmlElement, Rc<DomPort>) {
    let root = mount("div");
    let image = gloo_utils::document()
        .create_element("img")
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    image.style().set_property("display", "block").unwrap();
    image.style().set_property("width", "100px").unwrap();
    image.style().set_property("height", "50px").unwrap();
    root.append_child(&image).unwrap();

    let doc = MemoryDocument::new();
    doc.insert_embed(0, &Embed::Image("data:image/png;base64,AA==".into()), Source::Api);
    let port = Rc::new(DomPort::new(doc));
    port.register(&image, 0);
    (root, image, port)
}

/// A port over [`MemoryDocument`] whose embeds map to real DOM nodes.
struct DomPort {
    doc: MemoryDocument,
    nodes: RefCell<Vec<(Node, usize)>>,
}

impl DomPort {
    fn new(doc: MemoryDocument) -> Self {
        Self {
            doc,
            nodes: RefCell::new(Vec::new()),
        }
    }

    fn register(&self, node: &Node, index: usize) {
        self.nodes.borrow_mut().push((node.clone(), index));
    }
}

impl DocumentPort for DomPort {
    type Node = Node;

    fn selection(&self, focus: bool) -> Option<Selection> {
        self.doc.selection(focus)
    }
    fn set_selection(&self, index: usize, length: usize, source: Source) {
        self.doc.set_selection(index, length, source)
    }
    fn text(&self, index: usize, length: usize) -> String {
        self.doc.text(index, length)
    }
    fn len(&self) -> usize {
        self.doc.len()
    }
    fn bounds(&self, index: usize) -> Option<plume_editor_browser::Bounds> {
        self.doc.bounds(index)
    }
    fn resolve_node(&self, node: &Node) -> Option<usize> {
        let nodes = self.nodes.borrow();
        nodes.iter().find(|(n, _)| n == node).map(|(_, i)| *i)
    }
    fn leaf_node(&self, index: usize) -> Option<Node> {
        let nodes = self.nodes.borrow();
        nodes.iter().find(|(_, i)| *i == index).map(|(n, _)| n.clone())
    }
    fn contains_node(&self, node: &Node) -> bool {
        node.is_connected() && self.resolve_node(node).is_some()
    }
    fn insert_text(&self, index: usize, text: &str, source: Source) {
        self.doc.insert_text(index, text, source)
    }
    fn insert_formatted_text(
        &self,
        index: usize,
        text: &str,
        attributes: &plume_editor_browser::Attributes,
        source: Source,
    ) {
        self.doc.insert_formatted_text(index, text, attributes, source)
    }
    fn delete_text(&self, index: usize, length: usize, source: Source) {
        self.doc.delete_text(index, length, source)
    }
    fn insert_embed(&self, index: usize, embed: &Embed, source: Source) {
        self.doc.insert_embed(index, embed, source)
    }
    fn format_range(
        &self,
        index: usize,
        length: usize,
        attributes: &plume_editor_browser::Attributes,
        source: Source,
    ) {
        self.doc.format_range(index, length, attributes, source)
    }
}

impl ChangeFeed for DomPort {
    fn on_selection_change(&self, handler: SelectionHandler) -> Subscription {
        self.doc.on_selection_change(handler)
    }
    fn on_content_change(&self, handler: ContentHandler) -> Subscription {
        self.doc.on_content_change(handler)
    }
}

// === Reactor ===

#[wasm_bindgen_test]
fn test_reactor_queues_reentrant_dispatch() {
    let reactor = Reactor::new(Vec::<u32>::new());
    let weak = Rc::downgrade(&reactor);
    reactor.dispatch(move |log| {
        log.push(1);
        dispatch_weak(&weak, |log| log.push(3));
        log.push(2);
    });
    assert_eq!(reactor.try_run(|log| log.clone()), Some(vec![1, 2, 3]));
}

#[wasm_bindgen_test]
async fn test_dropped_frames_never_fire() {
    let fired = Rc::new(RefCell::new(Vec::new()));
    let log = fired.clone();
    let mut frames = AnimationFrames::new(move |id| log.borrow_mut().push(id));
    frames.request();
    frames.request();
    assert_eq!(frames.pending(), 2);
    drop(frames);

    TimeoutFuture::new(100).await;
    assert!(fired.borrow().is_empty());
}

// === Decoding ===

#[wasm_bindgen_test]
async fn test_read_data_uri_from_blob() {
    let bytes = js_sys::Uint8Array::from(&[0x89u8, b'P', b'N', b'G'][..]);
    let parts = js_sys::Array::of1(&bytes);
    let bag = BlobPropertyBag::new();
    bag.set_type("image/png");
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &bag).unwrap();

    let uri = read_data_uri(&blob, "image/png").await.unwrap();
    assert_eq!(uri, "data:image/png;base64,iVBORw==");
}

#[wasm_bindgen_test]
async fn test_read_data_uri_rejects_empty_blob() {
    let blob = Blob::new().unwrap();
    assert!(read_data_uri(&blob, "image/png").await.is_err());
}

// === Mention module ===

#[wasm_bindgen_test]
fn test_mention_list_mount_and_teardown() {
    let container = mount("div");
    let root = mount("div");
    container.append_child(&root).unwrap();
    let port = Rc::new(MemoryDocument::from_str("hello "));

    let mut module =
        MentionModule::with_default_source(port, root, container.clone(), MentionOptions::default())
            .unwrap();

    let list = container.query_selector(".ql-mention-list").unwrap().unwrap();
    assert!(list.class_list().contains("is-hidden"));
    assert_eq!(list.get_attribute("role").as_deref(), Some("listbox"));
    assert_eq!(container.style().get_property_value("position").unwrap(), "relative");
    assert!(!module.is_open());

    module.destroy();
    assert!(container.query_selector(".ql-mention-list").unwrap().is_none());
    module.destroy();
}

#[wasm_bindgen_test]
fn test_mention_keys_pass_through_when_closed() {
    let root = mount("div");
    let port = Rc::new(MemoryDocument::from_str("hello"));
    let _module =
        MentionModule::with_default_source(port, root.clone(), root.clone(), MentionOptions::default())
            .unwrap();

    let init = KeyboardEventInit::new();
    init.set_key("ArrowDown");
    init.set_cancelable(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    root.dispatch_event(&event).unwrap();

    assert!(!event.default_prevented());
}

#[wasm_bindgen_test]
async fn test_mention_keys_are_intercepted_while_open() {
    let root = mount("div");
    let port = Rc::new(MemoryDocument::from_str("hi "));
    let module = MentionModule::with_default_source(
        port.clone(),
        root.clone(),
        root.clone(),
        MentionOptions::default(),
    )
    .unwrap();

    port.set_selection(3, 0, Source::Silent);
    port.type_text("@al");
    settle().await;
    assert!(module.is_open());

    let down = key(&root, "ArrowDown");
    assert!(down.default_prevented());

    let enter = key(&root, "Enter");
    assert!(enter.default_prevented());
    settle().await;

    assert!(!module.is_open());
    assert!(matches!(port.embed_at(3), Some(Embed::Mention(_))));
    assert_eq!(port.content_string(), format!("hi {EMBED_PLACEHOLDER} "));
    assert_eq!(port.selection(false), Some(Selection::caret(5)));
}

// === Image ingestion ===

#[wasm_bindgen_test]
async fn test_text_paste_is_left_to_the_engine() {
    let root = mount("div");
    let port = Rc::new(DomPort::new(MemoryDocument::from_str("hello")));
    let _module = ImageDropModule::new(port.clone(), root.clone(), None);

    let transfer = DataTransfer::new().unwrap();
    transfer.set_data("text/plain", "pasted").unwrap();
    let event = paste(&root, &transfer);
    settle().await;

    assert!(!event.default_prevented());
    assert_eq!(port.doc.embed_count(), 0);
    assert_eq!(port.doc.content_string(), "hello");
}

#[wasm_bindgen_test]
async fn test_image_paste_inserts_at_caret() {
    let root = mount("div");
    let port = Rc::new(DomPort::new(MemoryDocument::from_str("hello")));
    port.set_selection(2, 0, Source::Silent);
    let _module = ImageDropModule::new(port.clone(), root.clone(), None);

    let transfer = DataTransfer::new().unwrap();
    transfer.items().add_with_file(&png_file()).unwrap();
    let event = paste(&root, &transfer);
    assert!(event.default_prevented());
    settle().await;

    assert_eq!(
        port.doc.embed_at(2),
        Some(Embed::Image("data:image/png;base64,iVBORw==".into()))
    );
    assert_eq!(port.selection(false), Some(Selection::caret(3)));
}

#[wasm_bindgen_test]
async fn test_drop_without_file_is_still_suppressed() {
    let root = mount("div");
    let port = Rc::new(DomPort::new(MemoryDocument::from_str("hello")));
    let _module = ImageDropModule::new(port.clone(), root.clone(), None);

    let transfer = DataTransfer::new().unwrap();
    transfer.set_data("text/plain", "dragged").unwrap();
    let init = DragEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_data_transfer(Some(&transfer));
    let event = DragEvent::new_with_event_init_dict("drop", &init).unwrap();
    root.dispatch_event(&event).unwrap();
    settle().await;

    assert!(event.default_prevented());
    assert_eq!(port.doc.embed_count(), 0);
}

#[wasm_bindgen_test]
async fn test_destroyed_drop_module_ignores_late_decode() {
    let root = mount("div");
    let port = Rc::new(DomPort::new(MemoryDocument::from_str("hello")));
    let mut module = ImageDropModule::new(port.clone(), root.clone(), None);

    let transfer = DataTransfer::new().unwrap();
    transfer.items().add_with_file(&png_file()).unwrap();
    paste(&root, &transfer);
    module.destroy();
    settle().await;

    assert_eq!(port.doc.embed_count(), 0);
}

// === Image module ===

#[wasm_bindgen_test]
fn test_image_overlay_activates_and_lays_out() {
    let (root, image, port) = image_fixture();

    let mut module =
        ImageResizeModule::new(port, root.clone(), root.clone(), ImageOverlayOptions::default())
            .unwrap();

    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_button(0);
    let press = MouseEvent::new_with_mouse_event_init_dict("mousedown", &init).unwrap();
    image.dispatch_event(&press).unwrap();

    assert!(module.is_active());
    assert!(press.default_prevented());
    assert!(root.class_list().contains("ql-image-selected"));

    let overlay = root
        .query_selector(".ql-image-resize-overlay")
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap();
    assert!(!overlay.class_list().contains("is-hidden"));
    assert_eq!(overlay.style().get_property_value("width").unwrap(), "112px");
    assert_eq!(overlay.style().get_property_value("height").unwrap(), "62px");
    assert_eq!(root.query_selector_all(".ql-image-resize-handle").unwrap().length(), 8);

    module.destroy();
    assert!(root.query_selector(".ql-image-resize-overlay").unwrap().is_none());
    assert!(!root.class_list().contains("ql-image-selected"));
}

#[wasm_bindgen_test]
async fn test_toolbar_presses_keep_overlay_active() {
    let (root, image, port) = image_fixture();
    let module =
        ImageResizeModule::new(port, root.clone(), root.clone(), ImageOverlayOptions::default())
            .unwrap();
    mouse(&image, "mousedown", 0, 0);
    settle().await;
    assert!(module.is_active());

    let toolbar = root.query_selector(".ql-image-toolbar").unwrap().unwrap();
    let press = mouse(&toolbar, "mousedown", 0, 0);
    mouse(&toolbar, "click", 0, 0);
    assert!(module.is_active());

    let caption = root
        .query_selector("[data-caption-input]")
        .unwrap()
        .unwrap();
    mouse(&caption, "click", 0, 0);
    assert!(module.is_active());
    assert!(!press.default_prevented());

    let body = gloo_utils::document().body().unwrap();
    mouse(&body, "click", 0, 0);
    assert!(!module.is_active());
}

#[wasm_bindgen_test]
async fn test_drag_ends_on_mouseup_outside_surface() {
    let (root, image, port) = image_fixture();
    let module = ImageResizeModule::new(
        port.clone(),
        root.clone(),
        root.clone(),
        ImageOverlayOptions::default(),
    )
    .unwrap();
    mouse(&image, "mousedown", 0, 0);
    settle().await;

    let document = gloo_utils::document();
    let handle = root
        .query_selector("[data-direction='se']")
        .unwrap()
        .unwrap();
    mouse(&handle, "mousedown", 0, 0);
    mouse(&document, "mousemove", 40, 20);
    assert_eq!(image.get_attribute("width").as_deref(), Some("140"));
    assert_eq!(image.get_attribute("height").as_deref(), Some("70"));
    assert_eq!(port.doc.attributes_at(0).unwrap().value("width"), Some("140"));

    let body = document.body().unwrap();
    mouse(&body, "mouseup", 40, 20);
    mouse(&document, "mousemove", 90, 90);
    assert_eq!(image.get_attribute("width").as_deref(), Some("140"));
    assert!(module.is_active());
}

#[wasm_bindgen_test]
async fn test_destroy_mid_drag_is_safe() {
    let (root, image, port) = image_fixture();
    let mut module =
        ImageResizeModule::new(port, root.clone(), root.clone(), ImageOverlayOptions::default())
            .unwrap();
    mouse(&image, "mousedown", 0, 0);
    settle().await;

    let handle = root
        .query_selector("[data-direction='e']")
        .unwrap()
        .unwrap();
    mouse(&handle, "mousedown", 0, 0);
    module.destroy();

    let document = gloo_utils::document();
    mouse(&document, "mousemove", 60, 0);
    mouse(&document, "mouseup", 60, 0);
    settle().await;

    assert_eq!(image.get_attribute("width"), None);
    assert!(root.query_selector(".ql-image-resize-overlay").unwrap().is_none());
}

// === Counter ===

#[wasm_bindgen_test]
fn test_counter_renders_and_tracks_changes() {
    let parent = mount("div");
    let port = Rc::new(MemoryDocument::from_str("ab c"));
    let mut module = CharCounterModule::new(
        port.clone(),
        &parent,
        None,
        CounterOptions { limit: Some(4) },
    )
    .unwrap();

    let element = parent.query_selector(".ql-char-counter").unwrap().unwrap();
    assert_eq!(element.text_content().as_deref(), Some("3 / 4 chars"));

    port.insert_text(4, "de", Source::User);
    assert_eq!(element.text_content().as_deref(), Some("5 / 4 chars"));
    assert!(element.class_list().contains("ql-char-counter-exceed"));

    module.destroy();
    assert!(parent.query_selector(".ql-char-counter").unwrap().is_none());
}

#[wasm_bindgen_test]
fn test_counter_keeps_host_container() {
    let parent = mount("div");
    let container = mount("span");
    let port = Rc::new(MemoryDocument::from_str("abc"));
    let mut module =
        CharCounterModule::new(port, &parent, Some(container.clone()), CounterOptions::default())
            .unwrap();

    assert_eq!(container.text_content().as_deref(), Some("3 chars"));
    module.destroy();
    assert!(container.is_connected());
}
