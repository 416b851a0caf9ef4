//! Image resize/caption overlay.

mod controller;
mod geometry;
mod resize;

pub use controller::{
    Activation, CaptionChange, ClickTarget, ImageOverlayController, ImageOverlayOptions,
    OverlayChange, PointerTarget,
};
pub use geometry::{Alignment, HANDLE_OFFSET, LayoutInputs, OverlayLayout, TOOLBAR_OFFSET, overlay_layout};
pub use resize::{HandleDirection, ResizeDrag};
