//! Drag-and-drop and paste handlers feeding [`ImageIngest`].

use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions};
use js_sys::Uint8Array;
use plume_editor_core::ingest::{
    CaretPosition, DROP_EFFECT, DecodeTicket, ImageIngest, InsertObserver, encode_data_uri,
    pick_paste_item, resolve_drop_offset,
};
use plume_editor_core::{DecodeError, DocumentPort};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, ClipboardEvent, DragEvent, File, HtmlElement, Node};

use crate::caret::caret_from_point;
use crate::reactor::{Reactor, dispatch_weak};

/// Read a blob and encode it as a `data:` URI of type `mime`.
pub async fn read_data_uri(blob: &Blob, mime: &str) -> Result<String, DecodeError> {
    let buffer = JsFuture::from(blob.array_buffer())
        .await
        .map_err(|e| DecodeError::Read(format!("{:?}", e)))?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    encode_data_uri(mime, &bytes)
}

struct DropHost<P> {
    this: Weak<Reactor<DropHost<P>>>,
    ingest: ImageIngest,
    port: Rc<P>,
    observer: Option<Box<dyn InsertObserver>>,
}

impl<P> DropHost<P>
where
    P: DocumentPort<Node = Node> + 'static,
{
    fn drop_file(&mut self, file: File, caret: Option<CaretPosition<Node>>) {
        let at = resolve_drop_offset(&*self.port, caret.as_ref());
        let mime = file.type_();
        if let Some(ticket) = self.ingest.accept_drop(Some(&mime), at) {
            self.decode(file, ticket);
        }
    }

    fn paste_file(&mut self, file: File) {
        let mime = file.type_();
        if let Some(ticket) = self.ingest.accept_paste(&mime) {
            self.decode(file, ticket);
        }
    }

    fn decode(&self, file: File, ticket: DecodeTicket) {
        let this = self.this.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let decoded = read_data_uri(&file, &ticket.mime).await;
            dispatch_weak(&this, move |host| host.finish(ticket, decoded));
        });
    }

    fn finish(&mut self, ticket: DecodeTicket, decoded: Result<String, DecodeError>) {
        let observer = self
            .observer
            .as_mut()
            .map(|observer| observer.as_mut() as &mut dyn InsertObserver);
        self.ingest.finish(&ticket, decoded, &*self.port, observer);
    }

    fn destroy(&mut self) {
        self.ingest.destroy();
        self.observer = None;
    }
}

/// Image drop/paste module bound to an editing surface.
pub struct ImageDropModule<P>
where
    P: DocumentPort<Node = Node> + 'static,
{
    host: Rc<Reactor<DropHost<P>>>,
    listeners: Vec<EventListener>,
}

impl<P> ImageDropModule<P>
where
    P: DocumentPort<Node = Node> + 'static,
{
    /// `observer` is told about every inserted image, typically
    /// [`crate::ImageResizeModule::notifier`].
    pub fn new(port: Rc<P>, root: HtmlElement, observer: Option<Box<dyn InsertObserver>>) -> Self {
        let host = Reactor::new_cyclic(|this: &Weak<Reactor<DropHost<P>>>| DropHost {
            this: this.clone(),
            ingest: ImageIngest::new(),
            port,
            observer,
        });
        let weak = Rc::downgrade(&host);

        let dragover = EventListener::new_with_options(
            &root,
            "dragover",
            EventListenerOptions::enable_prevent_default(),
            |event| {
                event.prevent_default();
                event.stop_propagation();
                if let Some(transfer) = event.dyn_ref::<DragEvent>().and_then(|e| e.data_transfer()) {
                    transfer.set_drop_effect(DROP_EFFECT);
                }
            },
        );

        let on_drop = EventListener::new_with_options(
            &root,
            "drop",
            EventListenerOptions::enable_prevent_default(),
            {
                let weak = weak.clone();
                move |event| {
                    // Never let the browser navigate to the dropped item.
                    event.prevent_default();
                    event.stop_propagation();
                    let Some(drag) = event.dyn_ref::<DragEvent>() else {
                        return;
                    };
                    let file = drag
                        .data_transfer()
                        .and_then(|transfer| transfer.files())
                        .and_then(|files| files.get(0));
                    let Some(file) = file else {
                        return;
                    };
                    let caret = caret_from_point(
                        &gloo_utils::document(),
                        drag.client_x() as f64,
                        drag.client_y() as f64,
                    );
                    dispatch_weak(&weak, move |host| host.drop_file(file, caret));
                }
            },
        );

        let paste = EventListener::new_with_options(
            &root,
            "paste",
            EventListenerOptions::enable_prevent_default(),
            {
                let weak = weak.clone();
                move |event| {
                    let Some(items) = event
                        .dyn_ref::<ClipboardEvent>()
                        .and_then(|e| e.clipboard_data())
                        .map(|data| data.items())
                    else {
                        return;
                    };
                    let types: Vec<String> = (0..items.length())
                        .map(|i| items.get(i).map(|item| item.type_()).unwrap_or_default())
                        .collect();
                    let Some(index) = pick_paste_item(types.iter().map(String::as_str)) else {
                        return;
                    };
                    let file = items
                        .get(index as u32)
                        .and_then(|item| item.get_as_file().ok().flatten());
                    if let Some(file) = file {
                        event.prevent_default();
                        dispatch_weak(&weak, move |host| host.paste_file(file));
                    }
                }
            },
        );

        tracing::debug!("image drop module mounted");
        Self {
            host,
            listeners: vec![dragover, on_drop, paste],
        }
    }

    /// Detach listeners; decodes still in flight are discarded on arrival.
    /// Idempotent.
    pub fn destroy(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        self.listeners.clear();
        self.host.dispatch(|host| host.destroy());
        tracing::debug!("image drop module destroyed");
    }
}

impl<P> Drop for ImageDropModule<P>
where
    P: DocumentPort<Node = Node> + 'static,
{
    fn drop(&mut self) {
        self.destroy();
    }
}
