//! In-memory Document Port implementation.
//!
//! `MemoryDocument` stores the document as a flat list of units (one char or
//! one embed each) with per-unit formatting attributes. It implements both
//! [`DocumentPort`] and [`ChangeFeed`], records every write for inspection,
//! and lays text out on a fixed monospace grid so `bounds()` is deterministic.
//! Native hosts and the test suites drive the modules through it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::port::{ChangeFeed, ContentHandler, DocumentPort, SelectionHandler, Subscription};
use crate::types::{Attributes, Bounds, EMBED_PLACEHOLDER, Embed, Selection, Source};

/// Opaque node handle for embeds stored in a [`MemoryDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// A write applied to a [`MemoryDocument`], in application order.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentWrite {
    InsertText {
        index: usize,
        text: String,
        source: Source,
    },
    DeleteText {
        index: usize,
        length: usize,
        source: Source,
    },
    InsertEmbed {
        index: usize,
        embed: Embed,
        source: Source,
    },
    Format {
        index: usize,
        length: usize,
        attributes: Attributes,
        source: Source,
    },
    SetSelection {
        index: usize,
        length: usize,
        source: Source,
    },
}

#[derive(Clone, Debug)]
enum UnitKind {
    Char(char),
    Embed { node: NodeId, embed: Embed },
}

#[derive(Clone, Debug)]
struct Unit {
    kind: UnitKind,
    attributes: Attributes,
}

impl Unit {
    fn as_char(&self) -> char {
        match self.kind {
            UnitKind::Char(c) => c,
            UnitKind::Embed { .. } => EMBED_PLACEHOLDER,
        }
    }

    fn node(&self) -> Option<NodeId> {
        match self.kind {
            UnitKind::Embed { node, .. } => Some(node),
            UnitKind::Char(_) => None,
        }
    }
}

#[derive(Debug)]
struct DocState {
    units: Vec<Unit>,
    selection: Option<Selection>,
    next_node: u64,
    writes: Vec<DocumentWrite>,
}

#[derive(Default)]
struct Feed {
    next_id: u64,
    selection: Vec<(u64, SelectionHandler)>,
    content: Vec<(u64, ContentHandler)>,
    // Ids removed while their handler list was checked out for emission.
    removed: HashSet<u64>,
}

impl Feed {
    fn remove(&mut self, id: u64) {
        let before = self.selection.len() + self.content.len();
        self.selection.retain(|(i, _)| *i != id);
        self.content.retain(|(i, _)| *i != id);
        if self.selection.len() + self.content.len() == before {
            self.removed.insert(id);
        }
    }
}

/// In-memory document with a change feed.
pub struct MemoryDocument {
    state: RefCell<DocState>,
    feed: Rc<RefCell<Feed>>,
    char_width: f64,
    line_height: f64,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::from_str("")
    }

    /// Create a document holding `text`, with no selection.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        let units = text
            .chars()
            .map(|c| Unit {
                kind: UnitKind::Char(c),
                attributes: Attributes::new(),
            })
            .collect();

        Self {
            state: RefCell::new(DocState {
                units,
                selection: None,
                next_node: 0,
                writes: Vec::new(),
            }),
            feed: Rc::new(RefCell::new(Feed::default())),
            char_width: 8.0,
            line_height: 20.0,
        }
    }

    /// Full content with embeds as placeholders.
    pub fn content_string(&self) -> String {
        self.state.borrow().units.iter().map(Unit::as_char).collect()
    }

    /// Embed stored at `index`, if any.
    pub fn embed_at(&self, index: usize) -> Option<Embed> {
        match &self.state.borrow().units.get(index)?.kind {
            UnitKind::Embed { embed, .. } => Some(embed.clone()),
            UnitKind::Char(_) => None,
        }
    }

    /// Node handle of the embed at `index`, if any.
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.state.borrow().units.get(index)?.node()
    }

    /// Formatting attributes of the unit at `index`.
    pub fn attributes_at(&self, index: usize) -> Option<Attributes> {
        Some(self.state.borrow().units.get(index)?.attributes.clone())
    }

    /// Number of embeds in the document.
    pub fn embed_count(&self) -> usize {
        self.state
            .borrow()
            .units
            .iter()
            .filter(|u| u.node().is_some())
            .count()
    }

    /// Drain the write log.
    pub fn take_writes(&self) -> Vec<DocumentWrite> {
        std::mem::take(&mut self.state.borrow_mut().writes)
    }

    /// Type `text` at the caret as the user would: one user-sourced insert
    /// followed by a user-sourced caret move.
    pub fn type_text(&self, text: &str) {
        let at = self
            .selection(false)
            .map(|s| s.index)
            .unwrap_or_else(|| self.len());
        self.insert_text(at, text, Source::User);
        self.set_selection(at + text.chars().count(), 0, Source::User);
    }

    fn record(&self, write: DocumentWrite) {
        self.state.borrow_mut().writes.push(write);
    }

    fn shift_selection_for_insert(&self, index: usize, count: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(sel) = state.selection.as_mut() {
            if sel.index >= index {
                sel.index += count;
            }
        }
    }

    fn shift_selection_for_delete(&self, index: usize, length: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(sel) = state.selection.as_mut() {
            let end = index + length;
            if sel.index >= end {
                sel.index -= length;
            } else if sel.index > index {
                sel.index = index;
                sel.length = 0;
            }
        }
    }

    fn emit_content(&self, source: Source) {
        let mut handlers = std::mem::take(&mut self.feed.borrow_mut().content);
        for (_, handler) in handlers.iter_mut() {
            handler(source);
        }
        let mut feed = self.feed.borrow_mut();
        let removed = std::mem::take(&mut feed.removed);
        handlers.retain(|(id, _)| !removed.contains(id));
        handlers.append(&mut feed.content);
        feed.content = handlers;
        feed.removed = removed;
    }

    fn emit_selection(&self, selection: Option<Selection>, source: Source) {
        let mut handlers = std::mem::take(&mut self.feed.borrow_mut().selection);
        for (_, handler) in handlers.iter_mut() {
            handler(selection, source);
        }
        let mut feed = self.feed.borrow_mut();
        let removed = std::mem::take(&mut feed.removed);
        handlers.retain(|(id, _)| !removed.contains(id));
        handlers.append(&mut feed.selection);
        feed.selection = handlers;
        feed.removed = removed;
    }

    fn subscribe(&self, register: impl FnOnce(&mut Feed, u64)) -> Subscription {
        let id = {
            let mut feed = self.feed.borrow_mut();
            feed.next_id += 1;
            let id = feed.next_id;
            register(&mut feed, id);
            id
        };
        let feed = Rc::downgrade(&self.feed);
        Subscription::new(move || {
            if let Some(feed) = feed.upgrade() {
                feed.borrow_mut().remove(id);
            }
        })
    }

    /// Clear the selection (blur), emitting a selection change.
    pub fn blur(&self, source: Source) {
        self.state.borrow_mut().selection = None;
        self.emit_selection(None, source);
    }
}

impl DocumentPort for MemoryDocument {
    type Node = NodeId;

    fn selection(&self, _focus: bool) -> Option<Selection> {
        self.state.borrow().selection
    }

    fn set_selection(&self, index: usize, length: usize, source: Source) {
        let selection = {
            let mut state = self.state.borrow_mut();
            let len = state.units.len();
            let index = index.min(len);
            let length = length.min(len - index);
            let selection = Selection::new(index, length);
            state.selection = Some(selection);
            state.writes.push(DocumentWrite::SetSelection {
                index,
                length,
                source,
            });
            selection
        };
        self.emit_selection(Some(selection), source);
    }

    fn text(&self, index: usize, length: usize) -> String {
        let state = self.state.borrow();
        state
            .units
            .iter()
            .skip(index)
            .take(length)
            .map(Unit::as_char)
            .collect()
    }

    fn len(&self) -> usize {
        self.state.borrow().units.len()
    }

    fn bounds(&self, index: usize) -> Option<Bounds> {
        let state = self.state.borrow();
        if index > state.units.len() {
            return None;
        }
        let mut line = 0usize;
        let mut column = 0usize;
        for unit in &state.units[..index] {
            if unit.as_char() == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        let left = column as f64 * self.char_width;
        let top = line as f64 * self.line_height;
        Some(Bounds {
            left,
            top,
            bottom: top + self.line_height,
            right: left,
        })
    }

    fn resolve_node(&self, node: &NodeId) -> Option<usize> {
        self.state
            .borrow()
            .units
            .iter()
            .position(|u| u.node() == Some(*node))
    }

    fn leaf_node(&self, index: usize) -> Option<NodeId> {
        self.node_at(index)
    }

    fn contains_node(&self, node: &NodeId) -> bool {
        self.resolve_node(node).is_some()
    }

    fn insert_text(&self, index: usize, text: &str, source: Source) {
        self.insert_formatted_text(index, text, &Attributes::new(), source);
    }

    fn insert_formatted_text(
        &self,
        index: usize,
        text: &str,
        attributes: &Attributes,
        source: Source,
    ) {
        let count = {
            let mut state = self.state.borrow_mut();
            let index = index.min(state.units.len());
            let units: Vec<Unit> = text
                .chars()
                .map(|c| Unit {
                    kind: UnitKind::Char(c),
                    attributes: attributes.clone(),
                })
                .collect();
            let count = units.len();
            state.units.splice(index..index, units);
            count
        };
        self.record(DocumentWrite::InsertText {
            index,
            text: text.to_string(),
            source,
        });
        self.shift_selection_for_insert(index, count);
        self.emit_content(source);
    }

    fn delete_text(&self, index: usize, length: usize, source: Source) {
        {
            let mut state = self.state.borrow_mut();
            let len = state.units.len();
            let start = index.min(len);
            let end = (index + length).min(len);
            state.units.drain(start..end);
        }
        self.record(DocumentWrite::DeleteText {
            index,
            length,
            source,
        });
        self.shift_selection_for_delete(index, length);
        self.emit_content(source);
    }

    fn insert_embed(&self, index: usize, embed: &Embed, source: Source) {
        {
            let mut state = self.state.borrow_mut();
            state.next_node += 1;
            let node = NodeId(state.next_node);
            let index = index.min(state.units.len());
            state.units.insert(
                index,
                Unit {
                    kind: UnitKind::Embed {
                        node,
                        embed: embed.clone(),
                    },
                    attributes: Attributes::new(),
                },
            );
        }
        self.record(DocumentWrite::InsertEmbed {
            index,
            embed: embed.clone(),
            source,
        });
        self.shift_selection_for_insert(index, 1);
        self.emit_content(source);
    }

    fn format_range(&self, index: usize, length: usize, attributes: &Attributes, source: Source) {
        {
            let mut state = self.state.borrow_mut();
            for unit in state.units.iter_mut().skip(index).take(length) {
                unit.attributes.apply(attributes);
            }
        }
        self.record(DocumentWrite::Format {
            index,
            length,
            attributes: attributes.clone(),
            source,
        });
        self.emit_content(source);
    }
}

impl ChangeFeed for MemoryDocument {
    fn on_selection_change(&self, handler: SelectionHandler) -> Subscription {
        self.subscribe(move |feed, id| feed.selection.push((id, handler)))
    }

    fn on_content_change(&self, handler: ContentHandler) -> Subscription {
        self.subscribe(move |feed, id| feed.content.push((id, handler)))
    }
}
