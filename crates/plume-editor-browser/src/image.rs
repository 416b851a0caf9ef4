//! DOM host for the image overlay: selection box, resize handles, toolbar
//! and caption input.

use std::rc::{Rc, Weak};

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Timeout;
use plume_editor_core::image::{
    Alignment, CaptionChange, ClickTarget, HandleDirection, ImageOverlayController,
    ImageOverlayOptions, LayoutInputs, OverlayChange, PointerTarget,
};
use plume_editor_core::{
    ChangeFeed, DocumentPort, FrameId, InsertObserver, PlatformError, Point, Selection, Size,
    Subscription,
};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, HtmlInputElement, MouseEvent, Node};

use crate::dom;
use crate::frames::AnimationFrames;
use crate::reactor::{Reactor, dispatch_weak};

pub const OVERLAY_CLASS: &str = "ql-image-resize-overlay";
pub const TOOLBAR_CLASS: &str = "ql-image-toolbar";
pub const SELECTED_CLASS: &str = "ql-image-selected";
const HIDDEN_CLASS: &str = "is-hidden";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ToolbarAction {
    Align(Alignment),
    Remove,
}

impl ToolbarAction {
    const ALL: [ToolbarAction; 4] = [
        ToolbarAction::Align(Alignment::Left),
        ToolbarAction::Align(Alignment::Center),
        ToolbarAction::Align(Alignment::Right),
        ToolbarAction::Remove,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ToolbarAction::Align(alignment) => alignment.as_str(),
            ToolbarAction::Remove => "remove",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ToolbarAction::Align(Alignment::Left) => "Left",
            ToolbarAction::Align(Alignment::Center) => "Center",
            ToolbarAction::Align(Alignment::Right) => "Right",
            ToolbarAction::Remove => "Remove",
        }
    }
}

/// Overlay and toolbar elements. Listeners on these nodes are owned by the
/// module, not here.
struct OverlayUi {
    overlay: HtmlElement,
    handles: Vec<(HandleDirection, HtmlElement)>,
    toolbar: HtmlElement,
    buttons: Vec<(ToolbarAction, HtmlElement)>,
    caption: HtmlInputElement,
}

impl OverlayUi {
    fn new(document: &Document) -> Result<Self, PlatformError> {
        let overlay: HtmlElement =
            dom::create(document, "div", &format!("{OVERLAY_CLASS} {HIDDEN_CLASS}"))?;
        let mut handles = Vec::with_capacity(HandleDirection::ALL.len());
        for direction in HandleDirection::ALL {
            let handle: HtmlElement = dom::create(
                document,
                "div",
                &format!("ql-image-resize-handle ql-image-resize-handle--{}", direction.as_str()),
            )?;
            dom::set_attr(&handle, "data-direction", direction.as_str());
            dom::append(&overlay, &handle)?;
            handles.push((direction, handle));
        }

        let toolbar: HtmlElement =
            dom::create(document, "div", &format!("{TOOLBAR_CLASS} {HIDDEN_CLASS}"))?;
        let actions: HtmlElement = dom::create(document, "div", "ql-image-toolbar-actions")?;
        let mut buttons = Vec::with_capacity(ToolbarAction::ALL.len());
        for action in ToolbarAction::ALL {
            let button: HtmlElement = dom::create(document, "button", "ql-image-toolbar-button")?;
            dom::set_attr(&button, "type", "button");
            dom::set_attr(&button, "data-action", action.as_str());
            button.set_text_content(Some(action.label()));
            dom::append(&actions, &button)?;
            buttons.push((action, button));
        }

        let caption_wrap: HtmlElement = dom::create(document, "div", "ql-image-caption")?;
        let caption: HtmlInputElement = dom::create(document, "input", "ql-image-caption-input")?;
        caption.set_type("text");
        caption.set_placeholder("Add caption");
        dom::set_attr(&caption, "data-caption-input", "");
        dom::append(&caption_wrap, &caption)?;

        dom::append(&toolbar, &actions)?;
        dom::append(&toolbar, &caption_wrap)?;

        Ok(Self {
            overlay,
            handles,
            toolbar,
            buttons,
            caption,
        })
    }

    fn set_visible(&self, visible: bool) {
        dom::toggle_class(&self.overlay, HIDDEN_CLASS, !visible);
        dom::toggle_class(&self.toolbar, HIDDEN_CLASS, !visible);
    }

    fn remove(&self) {
        self.overlay.remove();
        self.toolbar.remove();
    }
}

struct ImageHost<P> {
    this: Weak<Reactor<ImageHost<P>>>,
    controller: ImageOverlayController<Node>,
    port: Rc<P>,
    frames: AnimationFrames,
    root: HtmlElement,
    container: HtmlElement,
    ui: OverlayUi,
    image_load: Option<EventListener>,
    drag: Vec<EventListener>,
    guard_timer: Option<Timeout>,
}

impl<P> ImageHost<P>
where
    P: DocumentPort<Node = Node> + 'static,
{
    fn apply(&mut self, change: OverlayChange) {
        match change {
            OverlayChange::Unchanged => {}
            OverlayChange::Activated { guard, .. } => self.show(guard),
            OverlayChange::Deactivated => self.hide(),
        }
    }

    fn show(&mut self, guard: plume_editor_core::Token) {
        let Some(activation) = self.controller.active() else {
            return;
        };
        self.ui.caption.set_value(&activation.caption);
        self.image_load = activation.node.dyn_ref::<HtmlImageElement>().map(|image| {
            let this = self.this.clone();
            EventListener::new(image, "load", move |_| {
                dispatch_weak(&this, |host| host.controller.on_viewport_change(&mut host.frames))
            })
        });

        // The engine's own selection update for this press lands before the
        // next tick; the guard keeps it from deactivating the image.
        let this = self.this.clone();
        self.guard_timer = Some(Timeout::new(0, move || {
            dispatch_weak(&this, move |host| {
                host.controller.expire_guard(guard);
            })
        }));

        self.ui.set_visible(true);
        dom::toggle_class(&self.root, SELECTED_CLASS, true);
        self.layout();
    }

    fn hide(&mut self) {
        self.ui.set_visible(false);
        dom::toggle_class(&self.root, SELECTED_CLASS, false);
        self.image_load = None;
        self.drag.clear();
        self.guard_timer = None;
    }

    fn active_element(&self) -> Option<Element> {
        self.controller
            .active()
            .and_then(|activation| activation.node.dyn_ref::<Element>().cloned())
    }

    fn layout(&self) {
        let Some(image) = self.active_element() else {
            return;
        };
        let inputs = LayoutInputs {
            container: dom::client_rect(&self.container),
            image: dom::client_rect(&image),
            scroll_top: self.root.scroll_top() as f64,
            scroll_left: self.root.scroll_left() as f64,
            container_width: self.container.client_width() as f64,
            toolbar_width: self.ui.toolbar.offset_width() as f64,
        };
        let Some(layout) = self.controller.layout(&inputs) else {
            tracing::trace!("skipping layout of unmeasured image");
            return;
        };

        let overlay = &self.ui.overlay;
        dom::set_px(overlay, "left", layout.overlay.x);
        dom::set_px(overlay, "top", layout.overlay.y);
        dom::set_px(overlay, "width", layout.overlay.width);
        dom::set_px(overlay, "height", layout.overlay.height);
        dom::set_px(&self.ui.toolbar, "left", layout.toolbar.x);
        dom::set_px(&self.ui.toolbar, "top", layout.toolbar.y);
    }

    // === Events ===

    fn pointer_down(&mut self, target: PointerTarget<Node>) {
        let change = self
            .controller
            .pointer_down(target, &*self.port, &mut self.frames);
        self.apply(change);
    }

    fn on_selection_change(&mut self, selection: Option<Selection>) {
        let change = self.controller.on_selection_change(selection, &*self.port);
        self.apply(change);
    }

    fn on_content_change(&mut self) {
        let change = self
            .controller
            .on_content_change(&*self.port, &mut self.frames);
        self.apply(change);
    }

    fn on_frame(&mut self, id: FrameId) {
        if self.controller.on_frame(id) {
            self.layout();
        }
    }

    fn on_document_click(&mut self, target: Option<Node>) {
        let target = target.as_ref();
        let inside_image = self
            .controller
            .active()
            .is_some_and(|activation| dom::contains(&activation.node, target));
        let click = if inside_image {
            ClickTarget::ActiveImage
        } else if dom::contains(&self.ui.overlay, target) {
            ClickTarget::Overlay
        } else if dom::contains(&self.ui.toolbar, target) {
            ClickTarget::Toolbar
        } else {
            ClickTarget::Outside
        };
        let change = self.controller.on_document_click(click);
        self.apply(change);
    }

    fn begin_drag(&mut self, direction: HandleDirection, pointer: Point) {
        let Some(image) = self.active_element() else {
            return;
        };
        let rect = dom::client_rect(&image);
        if !self
            .controller
            .begin_resize(direction, pointer, rect.width, rect.height)
        {
            return;
        }

        // Document-level so the drag survives the pointer leaving the handle.
        let document = gloo_utils::document();
        let this = self.this.clone();
        let mousemove = EventListener::new(&document, "mousemove", move |event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                let pointer = Point::new(event.client_x() as f64, event.client_y() as f64);
                dispatch_weak(&this, move |host| host.drag_to(pointer));
            }
        });
        let this = self.this.clone();
        let mouseup = EventListener::new(&document, "mouseup", move |_| {
            dispatch_weak(&this, |host| host.end_drag());
        });
        self.drag = vec![mousemove, mouseup];
    }

    fn drag_to(&mut self, pointer: Point) {
        let editor_width = self.root.client_width() as f64;
        let Some(Size { width, height }) =
            self.controller
                .drag_to(pointer, editor_width, &*self.port)
        else {
            return;
        };
        if let Some(image) = self.active_element() {
            dom::set_attr(&image, "width", &width.to_string());
            dom::set_attr(&image, "height", &height.to_string());
        }
        self.layout();
    }

    fn end_drag(&mut self) {
        self.drag.clear();
        if self.controller.end_resize() {
            tracing::trace!("resize finished");
        }
    }

    fn toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::Align(alignment) => {
                let image = self.active_element();
                let applied = self
                    .controller
                    .align(alignment, &*self.port, &mut self.frames);
                if let (Some(alignment), Some(image)) = (applied, image) {
                    present_alignment(&image, alignment);
                }
            }
            ToolbarAction::Remove => {
                let change = self.controller.remove(&*self.port);
                self.apply(change);
            }
        }
    }

    fn caption_input(&mut self, value: String) {
        let image = self.active_element();
        let change = self.controller.set_caption(&value, &*self.port);
        let Some(image) = image else {
            return;
        };
        match change {
            Some(CaptionChange::Set(alt)) => dom::set_attr(&image, "alt", &alt),
            Some(CaptionChange::Cleared) => {
                if let Err(e) = image.remove_attribute("alt") {
                    tracing::warn!("failed to clear alt: {:?}", e);
                }
            }
            None => {}
        }
    }

    fn destroy(&mut self) {
        self.controller.destroy(&mut self.frames);
        self.hide();
        self.ui.remove();
    }
}

/// Mirror an alignment onto the image element.
fn present_alignment(image: &Element, alignment: Alignment) {
    let Some(image) = image.dyn_ref::<HtmlElement>() else {
        return;
    };
    let (left, right) = alignment.margins();
    dom::set_style(image, "float", "none");
    dom::set_style(image, "display", "block");
    dom::set_style(image, "margin-left", left);
    dom::set_style(image, "margin-right", right);
    dom::set_attr(image, "data-align", alignment.as_str());
}

/// Handle given to the ingestion module so freshly inserted images keep the
/// active overlay's offset in sync.
pub struct OverlayNotifier<P> {
    host: Weak<Reactor<ImageHost<P>>>,
}

impl<P> Clone for OverlayNotifier<P> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
        }
    }
}

impl<P> InsertObserver for OverlayNotifier<P>
where
    P: DocumentPort<Node = Node> + 'static,
{
    fn image_inserted(&mut self, index: usize) {
        // The offset is re-resolved from the node rather than shifted: the
        // insert's own content notification may already have moved it.
        tracing::trace!(index, "image inserted near overlay");
        dispatch_weak(&self.host, |host| host.on_content_change());
    }
}

/// The image resize/caption module bound to an editing surface.
pub struct ImageResizeModule<P>
where
    P: DocumentPort<Node = Node> + ChangeFeed + 'static,
{
    host: Rc<Reactor<ImageHost<P>>>,
    listeners: Vec<EventListener>,
    subscriptions: Vec<Subscription>,
}

impl<P> ImageResizeModule<P>
where
    P: DocumentPort<Node = Node> + ChangeFeed + 'static,
{
    pub fn new(
        port: Rc<P>,
        root: HtmlElement,
        container: HtmlElement,
        options: ImageOverlayOptions,
    ) -> Result<Self, PlatformError> {
        let document = gloo_utils::document();
        let ui = OverlayUi::new(&document)?;
        dom::ensure_positioned(&container);
        dom::append(&container, &ui.overlay)?;
        dom::append(&container, &ui.toolbar)?;

        let overlay = ui.overlay.clone();
        let toolbar = ui.toolbar.clone();
        let handles = ui.handles.clone();
        let buttons = ui.buttons.clone();
        let caption = ui.caption.clone();

        let host = Reactor::new_cyclic(|this: &Weak<Reactor<ImageHost<P>>>| {
            let frames_target = this.clone();
            ImageHost {
                this: this.clone(),
                controller: ImageOverlayController::new(options),
                port: port.clone(),
                frames: AnimationFrames::new(move |id| {
                    dispatch_weak(&frames_target, move |host| host.on_frame(id))
                }),
                root: root.clone(),
                container: container.clone(),
                ui,
                image_load: None,
                drag: Vec::new(),
                guard_timer: None,
            }
        });
        let weak = Rc::downgrade(&host);

        let subscriptions = vec![
            port.on_selection_change(Box::new({
                let weak = weak.clone();
                move |selection, _source| {
                    dispatch_weak(&weak, move |host| host.on_selection_change(selection))
                }
            })),
            port.on_content_change(Box::new({
                let weak = weak.clone();
                move |_source| dispatch_weak(&weak, |host| host.on_content_change())
            })),
        ];

        let mut listeners = Vec::new();

        let capture = EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: false,
        };
        listeners.push(EventListener::new_with_options(&root, "mousedown", capture, {
            let weak = weak.clone();
            let overlay = overlay.clone();
            let toolbar = toolbar.clone();
            move |event| {
                let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                if mouse.button() != 0 {
                    return;
                }
                let node = dom::event_node(event);
                if dom::contains(&overlay, node.as_ref()) || dom::contains(&toolbar, node.as_ref()) {
                    return;
                }
                let target = match event.target().and_then(|t| t.dyn_into::<HtmlImageElement>().ok()) {
                    Some(image) => {
                        // Keep the engine from placing a caret inside the image.
                        event.prevent_default();
                        event.stop_propagation();
                        PointerTarget::Image {
                            caption: image.alt(),
                            node: image.unchecked_into::<Node>(),
                        }
                    }
                    None => PointerTarget::Other,
                };
                dispatch_weak(&weak, move |host| host.pointer_down(target));
            }
        }));

        listeners.push(EventListener::new(&document, "click", {
            let weak = weak.clone();
            move |event| {
                let target = dom::event_node(event);
                dispatch_weak(&weak, move |host| host.on_document_click(target));
            }
        }));

        listeners.push(EventListener::new(&gloo_utils::window(), "resize", {
            let weak = weak.clone();
            move |_| dispatch_weak(&weak, |host| host.controller.on_viewport_change(&mut host.frames))
        }));

        listeners.push(EventListener::new(&root, "scroll", {
            let weak = weak.clone();
            move |_| dispatch_weak(&weak, |host| host.controller.on_viewport_change(&mut host.frames))
        }));

        for (direction, handle) in handles {
            let weak = weak.clone();
            listeners.push(EventListener::new_with_options(
                &handle,
                "mousedown",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    event.prevent_default();
                    event.stop_propagation();
                    let pointer = Point::new(mouse.client_x() as f64, mouse.client_y() as f64);
                    dispatch_weak(&weak, move |host| host.begin_drag(direction, pointer));
                },
            ));
        }

        // Presses inside the toolbar must not reach the editing surface.
        listeners.push(EventListener::new(&toolbar, "mousedown", |event| {
            event.stop_propagation();
        }));

        for (action, button) in buttons {
            let weak = weak.clone();
            listeners.push(EventListener::new(&button, "click", move |_| {
                dispatch_weak(&weak, move |host| host.toolbar_action(action));
            }));
        }

        listeners.push(EventListener::new(&caption, "input", {
            let weak = weak.clone();
            let caption = caption.clone();
            move |_| {
                let value = caption.value();
                dispatch_weak(&weak, move |host| host.caption_input(value));
            }
        }));
        listeners.push(EventListener::new(&caption, "focus", {
            let weak = weak.clone();
            move |_| dispatch_weak(&weak, |host| host.controller.set_caption_focused(true))
        }));
        listeners.push(EventListener::new(&caption, "blur", {
            let weak = weak.clone();
            move |_| dispatch_weak(&weak, |host| host.controller.set_caption_focused(false))
        }));

        tracing::debug!("image resize module mounted");
        Ok(Self {
            host,
            listeners,
            subscriptions,
        })
    }

    /// Observer to pass to [`crate::ImageDropModule::new`].
    pub fn notifier(&self) -> OverlayNotifier<P> {
        OverlayNotifier {
            host: Rc::downgrade(&self.host),
        }
    }

    pub fn is_active(&self) -> bool {
        self.host
            .try_run(|host| host.controller.is_active())
            .unwrap_or(false)
    }

    /// Detach every listener, abandon any drag and remove the overlay.
    /// Idempotent.
    pub fn destroy(&mut self) {
        if self.listeners.is_empty() && self.subscriptions.is_empty() {
            return;
        }
        self.listeners.clear();
        self.subscriptions.clear();
        self.host.dispatch(|host| host.destroy());
        tracing::debug!("image resize module destroyed");
    }
}

impl<P> Drop for ImageResizeModule<P>
where
    P: DocumentPort<Node = Node> + ChangeFeed + 'static,
{
    fn drop(&mut self) {
        self.destroy();
    }
}
