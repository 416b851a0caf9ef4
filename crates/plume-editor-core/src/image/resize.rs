//! Handle-driven resize math.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Size};

/// Compass direction of a resize handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleDirection {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

impl HandleDirection {
    /// Handles in DOM order: corners and edge midpoints clockwise from top-left.
    pub const ALL: [HandleDirection; 8] = [
        HandleDirection::Nw,
        HandleDirection::N,
        HandleDirection::Ne,
        HandleDirection::E,
        HandleDirection::Se,
        HandleDirection::S,
        HandleDirection::Sw,
        HandleDirection::W,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandleDirection::Nw => "nw",
            HandleDirection::N => "n",
            HandleDirection::Ne => "ne",
            HandleDirection::E => "e",
            HandleDirection::Se => "se",
            HandleDirection::S => "s",
            HandleDirection::Sw => "sw",
            HandleDirection::W => "w",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    pub fn north(&self) -> bool {
        matches!(self, HandleDirection::Nw | HandleDirection::N | HandleDirection::Ne)
    }

    pub fn south(&self) -> bool {
        matches!(self, HandleDirection::Sw | HandleDirection::S | HandleDirection::Se)
    }

    pub fn east(&self) -> bool {
        matches!(self, HandleDirection::Ne | HandleDirection::E | HandleDirection::Se)
    }

    pub fn west(&self) -> bool {
        matches!(self, HandleDirection::Nw | HandleDirection::W | HandleDirection::Sw)
    }
}

/// An in-progress handle drag, anchored at the pointer-down position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeDrag {
    pub direction: HandleDirection,
    pub origin: Point,
    pub start_width: f64,
    pub start_height: f64,
}

impl ResizeDrag {
    pub fn new(direction: HandleDirection, origin: Point, start_width: f64, start_height: f64) -> Self {
        Self {
            direction,
            origin,
            start_width,
            start_height,
        }
    }

    /// Size for the pointer at `pointer`.
    ///
    /// Deltas apply directly per axis (no aspect lock). Both sides are
    /// floored at `min_size`; width is capped at `max_width` when positive.
    pub fn size_at(&self, pointer: Point, max_width: f64, min_size: f64) -> Size {
        let dx = pointer.x - self.origin.x;
        let dy = pointer.y - self.origin.y;

        let mut width = self.start_width;
        let mut height = self.start_height;
        if self.direction.east() {
            width = self.start_width + dx;
        }
        if self.direction.west() {
            width = self.start_width - dx;
        }
        if self.direction.south() {
            height = self.start_height + dy;
        }
        if self.direction.north() {
            height = self.start_height - dy;
        }

        width = width.max(min_size);
        height = height.max(min_size);
        if max_width > 0.0 {
            width = width.min(max_width);
        }

        Size::new(width.round() as u32, height.round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f64 = 48.0;

    fn drag(direction: HandleDirection) -> ResizeDrag {
        ResizeDrag::new(direction, Point::new(0.0, 0.0), 120.0, 80.0)
    }

    #[test]
    fn test_corner_adds_on_both_axes() {
        let size = drag(HandleDirection::Se).size_at(Point::new(40.0, 20.0), 0.0, MIN);
        assert_eq!(size, Size::new(160, 100));
    }

    #[test]
    fn test_edges_affect_one_axis() {
        let p = Point::new(40.0, 20.0);
        assert_eq!(drag(HandleDirection::E).size_at(p, 0.0, MIN), Size::new(160, 80));
        assert_eq!(drag(HandleDirection::S).size_at(p, 0.0, MIN), Size::new(120, 100));
        assert_eq!(drag(HandleDirection::W).size_at(p, 0.0, MIN), Size::new(80, 80));
        assert_eq!(drag(HandleDirection::N).size_at(p, 0.0, MIN), Size::new(120, 60));
        assert_eq!(drag(HandleDirection::Nw).size_at(p, 0.0, MIN), Size::new(80, 60));
    }

    #[test]
    fn test_never_below_minimum() {
        for direction in HandleDirection::ALL {
            for delta in [-1000.0, -119.0, 1000.0] {
                let size = drag(direction).size_at(Point::new(delta, delta), 0.0, MIN);
                assert!(size.width >= 48 && size.height >= 48, "{direction:?} {delta}");
            }
        }
    }

    #[test]
    fn test_width_capped_to_editor() {
        let size = drag(HandleDirection::E).size_at(Point::new(500.0, 0.0), 300.0, MIN);
        assert_eq!(size.width, 300);
    }

    #[test]
    fn test_rounds_fractional_sizes() {
        let drag = ResizeDrag::new(HandleDirection::Se, Point::new(0.5, 0.5), 100.4, 60.6);
        assert_eq!(drag.size_at(Point::new(0.5, 0.5), 0.0, MIN), Size::new(100, 61));
    }

    #[test]
    fn test_direction_names() {
        let names: Vec<_> = HandleDirection::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, ["nw", "n", "ne", "e", "se", "s", "sw", "w"]);
        assert_eq!(HandleDirection::parse("se"), Some(HandleDirection::Se));
        assert_eq!(HandleDirection::parse("x"), None);
    }
}
