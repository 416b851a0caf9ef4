//! Image overlay state machine: activation, guard, resize, alignment,
//! caption and removal.
//!
//! The controller tracks at most one active image by node handle and
//! document offset. It writes document attributes through the port; the host
//! mirrors the returned values into the live DOM and shows/hides the overlay
//! according to the returned [`OverlayChange`].

use serde::{Deserialize, Serialize};

use crate::frame::{FrameId, FrameScheduler, FrameSlot};
use crate::image::geometry::{Alignment, LayoutInputs, OverlayLayout, overlay_layout};
use crate::image::resize::{HandleDirection, ResizeDrag};
use crate::port::DocumentPort;
use crate::token::{Generation, Token};
use crate::types::{Attributes, Point, Selection, Size, Source};

/// Tuning options for the image overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageOverlayOptions {
    /// Smallest width or height a drag can produce, in CSS pixels.
    pub min_size: f64,
}

impl Default for ImageOverlayOptions {
    fn default() -> Self {
        Self { min_size: 48.0 }
    }
}

/// What a pointer-down landed on inside the editing surface.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerTarget<N> {
    /// An image element, with its current `alt` text.
    Image { node: N, caption: String },
    /// Text or any other non-image content.
    Other,
}

/// Where a document-level click landed, relative to the overlay UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    ActiveImage,
    Overlay,
    Toolbar,
    Outside,
}

/// How the host should update the overlay UI after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayChange {
    Unchanged,
    /// An image became active: show the UI, fill the caption input, arm the
    /// guard expiry for the next tick.
    Activated { index: usize, guard: Token },
    /// The active image was released: hide the UI.
    Deactivated,
}

/// Result of a caption edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptionChange {
    Set(String),
    Cleared,
}

/// The active image.
#[derive(Clone, Debug, PartialEq)]
pub struct Activation<N> {
    pub node: N,
    pub index: usize,
    pub caption: String,
    guard: Option<Token>,
    drag: Option<ResizeDrag>,
}

impl<N> Activation<N> {
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    pub fn drag(&self) -> Option<&ResizeDrag> {
        self.drag.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq)]
enum OverlayState<N> {
    Idle,
    Active(Activation<N>),
    Destroyed,
}

/// Image overlay controller, generic over the port's node handle.
#[derive(Debug)]
pub struct ImageOverlayController<N> {
    options: ImageOverlayOptions,
    state: OverlayState<N>,
    guards: Generation,
    frame: FrameSlot,
    caption_focused: bool,
}

impl<N: Clone + PartialEq + std::fmt::Debug> ImageOverlayController<N> {
    pub fn new(options: ImageOverlayOptions) -> Self {
        Self {
            options,
            state: OverlayState::Idle,
            guards: Generation::new(),
            frame: FrameSlot::new(),
            caption_focused: false,
        }
    }

    pub fn options(&self) -> &ImageOverlayOptions {
        &self.options
    }

    pub fn active(&self) -> Option<&Activation<N>> {
        match &self.state {
            OverlayState::Active(activation) => Some(activation),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn is_resizing(&self) -> bool {
        self.active().is_some_and(|a| a.drag.is_some())
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, OverlayState::Destroyed)
    }

    fn active_mut(&mut self) -> Option<&mut Activation<N>> {
        match &mut self.state {
            OverlayState::Active(activation) => Some(activation),
            _ => None,
        }
    }

    fn deactivate(&mut self) -> OverlayChange {
        if let OverlayState::Active(activation) = &self.state {
            tracing::debug!(index = activation.index, "image deactivated");
            self.state = OverlayState::Idle;
            self.caption_focused = false;
            self.guards.advance();
            OverlayChange::Deactivated
        } else {
            OverlayChange::Unchanged
        }
    }

    // === Activation ===

    /// A primary-button press inside the editing surface.
    ///
    /// Pressing an image activates it and arms the selection guard; anything
    /// else deactivates. Ignored while a resize drag is in progress.
    pub fn pointer_down<P, F>(&mut self, target: PointerTarget<N>, port: &P, frames: &mut F) -> OverlayChange
    where
        P: DocumentPort<Node = N> + ?Sized,
        F: FrameScheduler + ?Sized,
    {
        if self.is_destroyed() || self.is_resizing() {
            return OverlayChange::Unchanged;
        }
        let PointerTarget::Image { node, caption } = target else {
            return self.deactivate();
        };
        let Some(index) = port.resolve_node(&node) else {
            tracing::trace!("pressed image does not resolve to an offset");
            return self.deactivate();
        };

        let guard = self.guards.advance();
        tracing::debug!(index, guard = guard.get(), "image activated");
        self.state = OverlayState::Active(Activation {
            node,
            index,
            caption,
            guard: Some(guard),
            drag: None,
        });
        self.caption_focused = false;
        self.frame.schedule(frames);
        OverlayChange::Activated { index, guard }
    }

    /// Next-tick expiry of the activation guard. Stale tokens are ignored.
    pub fn expire_guard(&mut self, token: Token) -> bool {
        match self.active_mut() {
            Some(activation) if activation.guard == Some(token) => {
                activation.guard = None;
                true
            }
            _ => false,
        }
    }

    pub fn set_caption_focused(&mut self, focused: bool) {
        self.caption_focused = focused && self.is_active();
    }

    // === Document notifications ===

    /// A selection change from the document engine.
    pub fn on_selection_change<P>(&mut self, selection: Option<Selection>, port: &P) -> OverlayChange
    where
        P: DocumentPort<Node = N> + ?Sized,
    {
        let Some(activation) = self.active() else {
            return OverlayChange::Unchanged;
        };
        if activation.is_guarded() || self.caption_focused {
            return OverlayChange::Unchanged;
        }

        let on_image = match selection {
            Some(caret) if caret.is_caret() => {
                port.leaf_node(caret.index).as_ref() == Some(&activation.node)
            }
            _ => false,
        };
        if on_image {
            OverlayChange::Unchanged
        } else {
            self.deactivate()
        }
    }

    /// A content change: drop the image if it left the document, otherwise
    /// re-resolve its offset and schedule a reposition.
    pub fn on_content_change<P, F>(&mut self, port: &P, frames: &mut F) -> OverlayChange
    where
        P: DocumentPort<Node = N> + ?Sized,
        F: FrameScheduler + ?Sized,
    {
        let Some(activation) = self.active() else {
            return OverlayChange::Unchanged;
        };
        if !port.contains_node(&activation.node) {
            return self.deactivate();
        }
        let Some(index) = port.resolve_node(&activation.node) else {
            return self.deactivate();
        };

        if let Some(activation) = self.active_mut() {
            if activation.index != index {
                tracing::trace!(from = activation.index, to = index, "active image moved");
                activation.index = index;
            }
        }
        self.frame.schedule(frames);
        OverlayChange::Unchanged
    }

    /// Scroll, viewport resize, or the active image finished loading.
    pub fn on_viewport_change<F: FrameScheduler + ?Sized>(&mut self, frames: &mut F) {
        if self.is_active() {
            self.frame.schedule(frames);
        }
    }

    /// Returns true if the host should lay out the overlay now.
    pub fn on_frame(&mut self, id: FrameId) -> bool {
        self.frame.fire(id) && self.is_active()
    }

    /// A click anywhere in the page.
    pub fn on_document_click(&mut self, target: ClickTarget) -> OverlayChange {
        if !self.is_active() {
            return OverlayChange::Unchanged;
        }
        match target {
            ClickTarget::ActiveImage | ClickTarget::Overlay | ClickTarget::Toolbar => {
                OverlayChange::Unchanged
            }
            ClickTarget::Outside => self.deactivate(),
        }
    }

    /// An image was inserted at `index` by another module.
    ///
    /// Never activates the new image; only keeps the active offset aligned.
    pub fn note_inserted(&mut self, index: usize) {
        if let Some(activation) = self.active_mut() {
            if index <= activation.index {
                activation.index += 1;
            }
        }
    }

    // === Resize ===

    /// Start a drag from a handle. `size` is the image's rendered size.
    pub fn begin_resize(&mut self, direction: HandleDirection, pointer: Point, width: f64, height: f64) -> bool {
        let Some(activation) = self.active_mut() else {
            return false;
        };
        tracing::trace!(direction = direction.as_str(), width, height, "resize started");
        activation.drag = Some(ResizeDrag::new(direction, pointer, width, height));
        true
    }

    /// Pointer moved during a drag. Writes the new size to the document
    /// immediately and returns it for the DOM.
    pub fn drag_to<P>(&mut self, pointer: Point, editor_width: f64, port: &P) -> Option<Size>
    where
        P: DocumentPort<Node = N> + ?Sized,
    {
        let min_size = self.options.min_size;
        let activation = self.active()?;
        let size = activation.drag?.size_at(pointer, editor_width, min_size);

        let attributes = Attributes::new()
            .with("width", size.width.to_string())
            .with("height", size.height.to_string());
        port.format_range(activation.index, 1, &attributes, Source::User);
        tracing::trace!(width = size.width, height = size.height, "image resized");
        Some(size)
    }

    /// Pointer released. Returns whether a drag was in progress.
    pub fn end_resize(&mut self) -> bool {
        self.active_mut()
            .and_then(|activation| activation.drag.take())
            .is_some()
    }

    // === Toolbar ===

    /// Persist an alignment on the active image.
    pub fn align<P, F>(&mut self, alignment: Alignment, port: &P, frames: &mut F) -> Option<Alignment>
    where
        P: DocumentPort<Node = N> + ?Sized,
        F: FrameScheduler + ?Sized,
    {
        let index = self.active()?.index;
        port.format_range(
            index,
            1,
            &Attributes::new().with("align", alignment.as_str()),
            Source::User,
        );
        self.frame.schedule(frames);
        Some(alignment)
    }

    /// Delete the active image and deactivate.
    pub fn remove<P>(&mut self, port: &P) -> OverlayChange
    where
        P: DocumentPort<Node = N> + ?Sized,
    {
        let Some(index) = self.active().map(|a| a.index) else {
            return OverlayChange::Unchanged;
        };
        let change = self.deactivate();
        port.delete_text(index, 1, Source::User);
        change
    }

    /// Caption input changed. An empty (trimmed) caption clears `alt`.
    pub fn set_caption<P>(&mut self, raw: &str, port: &P) -> Option<CaptionChange>
    where
        P: DocumentPort<Node = N> + ?Sized,
    {
        let activation = self.active_mut()?;
        let value = raw.trim();
        activation.caption = value.to_string();
        let index = activation.index;

        let (attributes, change) = if value.is_empty() {
            (Attributes::new().without("alt"), CaptionChange::Cleared)
        } else {
            (
                Attributes::new().with("alt", value),
                CaptionChange::Set(value.to_string()),
            )
        };
        port.format_range(index, 1, &attributes, Source::User);
        Some(change)
    }

    // === Geometry ===

    /// Layout for the active image, `None` when idle or degenerate.
    pub fn layout(&self, inputs: &LayoutInputs) -> Option<OverlayLayout> {
        self.active()?;
        overlay_layout(inputs)
    }

    /// Tear down. Abandons any drag and cancels the pending frame.
    pub fn destroy<F: FrameScheduler + ?Sized>(&mut self, frames: &mut F) {
        self.frame.cancel(frames);
        self.state = OverlayState::Destroyed;
        self.caption_focused = false;
        self.guards.advance();
    }
}

impl<N: Clone + PartialEq + std::fmt::Debug> Default for ImageOverlayController<N> {
    fn default() -> Self {
        Self::new(ImageOverlayOptions::default())
    }
}
