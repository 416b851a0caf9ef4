//! Document Port abstraction.
//!
//! These traits define the interface between the editor modules and the
//! rich-text engine that actually owns the document. Modules only read and
//! write through this port; they never walk the rendered tree to infer
//! offsets themselves.

use std::fmt;

use crate::types::{Attributes, Bounds, Embed, Selection, Source};

/// Read/write access to the live document.
///
/// Every method takes `&self`: the document is a single shared resource and
/// implementations use interior mutability (or delegate to a host object).
/// Writes are synchronous and may emit change notifications before returning.
pub trait DocumentPort {
    /// Handle to a rendered node (DOM node in the browser).
    type Node: Clone + PartialEq + fmt::Debug;

    // === Selection ===

    /// Current selection. `focus` asks the engine to focus itself first.
    fn selection(&self, focus: bool) -> Option<Selection>;

    fn set_selection(&self, index: usize, length: usize, source: Source);

    // === Reads ===

    /// Text of `[index, index + length)`. Each embed appears as
    /// [`crate::EMBED_PLACEHOLDER`], one offset wide.
    fn text(&self, index: usize, length: usize) -> String;

    /// Document length in offsets.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel bounds of the offset, relative to the editor container.
    fn bounds(&self, index: usize) -> Option<Bounds>;

    /// Map a rendered node to its document offset.
    fn resolve_node(&self, node: &Self::Node) -> Option<usize>;

    /// The embedded node whose leaf holds a caret at `index`, `None` for text.
    fn leaf_node(&self, index: usize) -> Option<Self::Node>;

    /// Whether the node is still attached to the document.
    fn contains_node(&self, node: &Self::Node) -> bool;

    // === Writes ===

    fn insert_text(&self, index: usize, text: &str, source: Source);

    fn insert_formatted_text(
        &self,
        index: usize,
        text: &str,
        attributes: &Attributes,
        source: Source,
    );

    fn delete_text(&self, index: usize, length: usize, source: Source);

    fn insert_embed(&self, index: usize, embed: &Embed, source: Source);

    fn format_range(&self, index: usize, length: usize, attributes: &Attributes, source: Source);

    // === Provided ===

    /// Number of offsets `text` spans in this document.
    ///
    /// Offsets count chars by default. Engines that index by UTF-16 code
    /// units override this so astral characters count twice.
    fn offset_width(&self, text: &str) -> usize {
        text.chars().count()
    }

    /// The single character at `index`, if any.
    fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.len() {
            return None;
        }
        self.text(index, 1).chars().next()
    }
}

/// Handler for selection-change notifications.
pub type SelectionHandler = Box<dyn FnMut(Option<Selection>, Source)>;

/// Handler for content-change notifications.
pub type ContentHandler = Box<dyn FnMut(Source)>;

/// Change notification stream of a document.
///
/// Notifications are delivered synchronously in emission order.
pub trait ChangeFeed {
    fn on_selection_change(&self, handler: SelectionHandler) -> Subscription;

    fn on_content_change(&self, handler: ContentHandler) -> Subscription;
}

/// Guard for a registered handler. The handler is removed on drop.
#[must_use = "dropping a Subscription removes the handler"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(remove: impl FnOnce() + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// A subscription with nothing to remove.
    pub fn noop() -> Self {
        Self { remove: None }
    }

    /// Remove the handler now. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}
