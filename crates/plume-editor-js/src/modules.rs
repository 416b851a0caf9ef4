//! Exported module classes.

use std::rc::Rc;

use plume_editor_browser::{
    CharCounterModule, ImageDropModule, ImageResizeModule, InsertObserver, MentionModule,
    OverlayNotifier,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::port::{DocumentPortAdapter, JsDocumentPort};
use crate::source::HostSource;
use crate::types::{JsCounterOptions, JsImageOverlayOptions, JsMentionOptions, parse_options};

fn platform_error(e: plume_editor_browser::PlatformError) -> JsError {
    JsError::new(&format!("Failed to mount module: {}", e))
}

/// Positioning container for overlays: the surface's parent, else the
/// surface itself.
fn default_container(root: &HtmlElement) -> HtmlElement {
    root.parent_element()
        .and_then(|parent| parent.dyn_into::<HtmlElement>().ok())
        .unwrap_or_else(|| root.clone())
}

/// `@mention` autocomplete.
#[wasm_bindgen]
pub struct JsMentionModule {
    inner: MentionModule<JsDocumentPort, HostSource>,
}

#[wasm_bindgen]
impl JsMentionModule {
    /// Mount on `root`. `source` is `(query) => MentionEntity[] | Promise<…>`;
    /// the built-in directory is used when omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(
        port: DocumentPortAdapter,
        root: HtmlElement,
        container: Option<HtmlElement>,
        options: JsValue,
        source: Option<js_sys::Function>,
    ) -> Result<JsMentionModule, JsError> {
        let options: JsMentionOptions = parse_options(options, "mention")?;
        let container = container.unwrap_or_else(|| default_container(&root));
        let inner = MentionModule::new(
            Rc::new(JsDocumentPort::new(port)),
            root,
            container,
            HostSource::from_function(source),
            options.into(),
        )
        .map_err(platform_error)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}

/// Image resize/caption overlay.
#[wasm_bindgen]
pub struct JsImageResize {
    inner: ImageResizeModule<JsDocumentPort>,
}

#[wasm_bindgen]
impl JsImageResize {
    #[wasm_bindgen(constructor)]
    pub fn new(
        port: DocumentPortAdapter,
        root: HtmlElement,
        container: Option<HtmlElement>,
        options: JsValue,
    ) -> Result<JsImageResize, JsError> {
        let options: JsImageOverlayOptions = parse_options(options, "image overlay")?;
        let container = container.unwrap_or_else(|| default_container(&root));
        let inner = ImageResizeModule::new(
            Rc::new(JsDocumentPort::new(port)),
            root,
            container,
            options.into(),
        )
        .map_err(platform_error)?;
        Ok(Self { inner })
    }

    /// Handle for `JsImageDrop` so inserted images keep the overlay in sync.
    pub fn notifier(&self) -> JsOverlayNotifier {
        JsOverlayNotifier {
            inner: self.inner.notifier(),
        }
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}

/// Opaque link from the drop module to the overlay module.
#[wasm_bindgen]
pub struct JsOverlayNotifier {
    inner: OverlayNotifier<JsDocumentPort>,
}

/// Drag-and-drop and paste image ingestion.
#[wasm_bindgen]
pub struct JsImageDrop {
    inner: ImageDropModule<JsDocumentPort>,
}

#[wasm_bindgen]
impl JsImageDrop {
    #[wasm_bindgen(constructor)]
    pub fn new(
        port: DocumentPortAdapter,
        root: HtmlElement,
        overlay: Option<JsOverlayNotifier>,
    ) -> JsImageDrop {
        let observer = overlay.map(|notifier| Box::new(notifier.inner) as Box<dyn InsertObserver>);
        Self {
            inner: ImageDropModule::new(Rc::new(JsDocumentPort::new(port)), root, observer),
        }
    }

    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}

/// Character counter.
#[wasm_bindgen]
pub struct JsCharCounter {
    inner: CharCounterModule<JsDocumentPort>,
}

#[wasm_bindgen]
impl JsCharCounter {
    /// Render into `container`, or into a new element appended to `parent`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        port: DocumentPortAdapter,
        parent: HtmlElement,
        container: Option<HtmlElement>,
        options: JsValue,
    ) -> Result<JsCharCounter, JsError> {
        let options: JsCounterOptions = parse_options(options, "counter")?;
        let inner = CharCounterModule::new(
            Rc::new(JsDocumentPort::new(port)),
            &parent,
            container,
            options.into(),
        )
        .map_err(platform_error)?;
        Ok(Self { inner })
    }

    /// Recount now; `undefined` while a recount is already running.
    pub fn count(&self) -> Option<usize> {
        self.inner.count().map(|count| count.count)
    }

    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}
