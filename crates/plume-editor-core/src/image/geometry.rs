//! Overlay and toolbar placement, and alignment presentation.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Rect};

/// Gap between the image edge and the selection overlay.
pub const HANDLE_OFFSET: f64 = 6.0;
/// Gap between the image bottom and the toolbar.
pub const TOOLBAR_OFFSET: f64 = 8.0;

/// Horizontal placement of a block image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            _ => None,
        }
    }

    /// `(margin-left, margin-right)` for a `display: block` image.
    pub fn margins(&self) -> (&'static str, &'static str) {
        match self {
            Alignment::Left => ("0", "auto"),
            Alignment::Center => ("auto", "auto"),
            Alignment::Right => ("auto", "0"),
        }
    }
}

/// Measurements the host takes before laying out the overlay.
///
/// Rects are viewport-relative (`getBoundingClientRect`); scroll offsets
/// belong to the editing surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutInputs {
    pub container: Rect,
    pub image: Rect,
    pub scroll_top: f64,
    pub scroll_left: f64,
    /// Inner width of the container.
    pub container_width: f64,
    /// Rendered toolbar width, 0 if not measured.
    pub toolbar_width: f64,
}

/// Container-relative placement of the overlay box and the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OverlayLayout {
    pub overlay: Rect,
    pub toolbar: Point,
}

/// Place the overlay around the image and the toolbar centered below it.
///
/// Returns `None` for a zero-sized image so the caller skips this tick.
pub fn overlay_layout(inputs: &LayoutInputs) -> Option<OverlayLayout> {
    if inputs.image.is_degenerate() {
        return None;
    }

    let top = inputs.image.y - inputs.container.y + inputs.scroll_top;
    let left = inputs.image.x - inputs.container.x + inputs.scroll_left;
    let width = inputs.image.width;
    let height = inputs.image.height;

    let overlay = Rect::new(
        left - HANDLE_OFFSET,
        top - HANDLE_OFFSET,
        width + HANDLE_OFFSET * 2.0,
        height + HANDLE_OFFSET * 2.0,
    );

    let centered = left + width / 2.0 - inputs.toolbar_width / 2.0;
    let max_left = HANDLE_OFFSET.max(inputs.container_width - inputs.toolbar_width - HANDLE_OFFSET);
    let toolbar = Point::new(
        centered.max(HANDLE_OFFSET).min(max_left),
        top + height + TOOLBAR_OFFSET,
    );

    Some(OverlayLayout { overlay, toolbar })
}
