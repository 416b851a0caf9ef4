//! The mention suggestion state machine.
//!
//! `MentionEngine` owns the session state only; it never touches the DOM and
//! never awaits anything. Lookups are handed to the host as [`FetchTicket`]s
//! and their results come back through [`MentionEngine::apply_results`],
//! where the generation check drops anything superseded.

use crate::error::SourceError;
use crate::frame::{FrameId, FrameScheduler, FrameSlot};
use crate::mention::detect::{TRIGGER, TriggerMatch, detect_trigger};
use crate::mention::{MentionEntity, MentionOptions};
use crate::port::DocumentPort;
use crate::token::{Generation, Token};
use crate::types::{Embed, Point, Selection, Source};

/// Gap between the trigger's line and the top of the list.
pub const LIST_GAP: f64 = 6.0;
/// Minimum distance kept between the list and the container edges.
pub const LIST_PADDING: f64 = 8.0;
/// List width assumed before the list has been measured.
pub const DEFAULT_LIST_WIDTH: f64 = 240.0;

/// An open mention session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionSession {
    /// Offset of the literal `@`.
    pub trigger_index: usize,
    /// Text between the `@` and the caret.
    pub query: String,
    /// Latest accepted results, capped to `max_items`.
    pub candidates: Vec<MentionEntity>,
    /// Highlighted candidate. Always 0 when `candidates` is empty.
    pub highlighted: usize,
}

impl MentionSession {
    fn from_match(m: TriggerMatch) -> Self {
        Self {
            trigger_index: m.trigger_index,
            query: m.query,
            candidates: Vec::new(),
            highlighted: 0,
        }
    }

    pub fn highlighted_candidate(&self) -> Option<&MentionEntity> {
        self.candidates.get(self.highlighted)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentionState {
    Idle,
    Open(MentionSession),
    Destroyed,
}

/// A lookup the host must run against the mention source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: Token,
    pub query: String,
}

/// Result of offering a key press to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyResult {
    /// Consumed; the host must prevent the default key handling.
    Handled,
    /// Not ours; let the document engine handle it.
    PassThrough,
}

/// Measurements the host supplies to position the list.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ListMetrics {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub container_width: f64,
    /// Rendered list width, `None` or 0 if not measured yet.
    pub list_width: Option<f64>,
}

/// What the list should currently show.
#[derive(Clone, Debug, PartialEq)]
pub struct MentionListView<'a> {
    pub open: bool,
    pub candidates: &'a [MentionEntity],
    pub highlighted: Option<usize>,
    /// Placeholder text, present when open with no candidates.
    pub empty_message: Option<&'a str>,
    /// Bumped whenever `candidates` changes, so hosts can skip rebuilding.
    pub revision: u64,
}

/// Mention suggestion engine.
#[derive(Debug)]
pub struct MentionEngine {
    options: MentionOptions,
    state: MentionState,
    generation: Generation,
    frame: FrameSlot,
    revision: u64,
}

impl MentionEngine {
    pub fn new(options: MentionOptions) -> Self {
        Self {
            options,
            state: MentionState::Idle,
            generation: Generation::new(),
            frame: FrameSlot::new(),
            revision: 0,
        }
    }

    pub fn options(&self) -> &MentionOptions {
        &self.options
    }

    pub fn state(&self) -> &MentionState {
        &self.state
    }

    pub fn session(&self) -> Option<&MentionSession> {
        match &self.state {
            MentionState::Open(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MentionState::Open(_))
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, MentionState::Destroyed)
    }

    // === Document notifications ===

    /// React to a content change. User edits schedule a re-detection on the
    /// next frame; a pending frame is replaced, never run twice.
    ///
    /// While open, any edit re-validates the session: if the trigger offset
    /// no longer holds an `@` the session closes at once, otherwise the
    /// token is re-derived on the next frame whatever the source.
    pub fn on_content_change<P, F>(&mut self, source: Source, port: &P, frames: &mut F)
    where
        P: DocumentPort + ?Sized,
        F: FrameScheduler + ?Sized,
    {
        if self.is_destroyed() {
            return;
        }
        if let Some(session) = self.session() {
            if port.char_at(session.trigger_index) != Some(TRIGGER) {
                tracing::debug!(
                    trigger_index = session.trigger_index,
                    "mention trigger moved by an edit"
                );
                self.close();
            }
        }
        if !source.is_user() && !self.is_open() {
            return;
        }
        let id = self.frame.schedule(frames);
        tracing::trace!(frame = id.0, "mention re-detection scheduled");
    }

    /// Run the coalesced re-detection if `id` is the latest scheduled frame.
    pub fn on_frame<P: DocumentPort + ?Sized>(&mut self, id: FrameId, port: &P) -> Option<FetchTicket> {
        if self.is_destroyed() || !self.frame.fire(id) {
            return None;
        }
        self.update_query(port)
    }

    /// React to a selection change.
    ///
    /// A lost or range selection closes the session. While open, every caret
    /// move re-derives the token so the query always spans from the `@` to
    /// the caret; a caret at or before the `@` closes it. While idle, user
    /// carets re-run detection.
    pub fn on_selection_change<P: DocumentPort + ?Sized>(
        &mut self,
        selection: Option<Selection>,
        source: Source,
        port: &P,
    ) -> Option<FetchTicket> {
        if self.is_destroyed() {
            return None;
        }
        let Some(caret) = selection.filter(Selection::is_caret) else {
            self.close();
            return None;
        };

        match &self.state {
            MentionState::Open(_) => self.detect_at(caret.index, port),
            MentionState::Idle if source.is_user() => self.detect_at(caret.index, port),
            _ => None,
        }
    }

    /// Re-run trigger detection at the caret and, on success, issue a fetch.
    pub fn update_query<P: DocumentPort + ?Sized>(&mut self, port: &P) -> Option<FetchTicket> {
        if self.is_destroyed() {
            return None;
        }
        let Some(caret) = port.selection(true).filter(Selection::is_caret) else {
            self.close();
            return None;
        };
        self.detect_at(caret.index, port)
    }

    /// Detect the token ending at `caret` and sync the session to it.
    ///
    /// A fetch is issued when a session opens or its query changes. A match
    /// on a different `@` replaces the session.
    fn detect_at<P: DocumentPort + ?Sized>(&mut self, caret: usize, port: &P) -> Option<FetchTicket> {
        let Some(found) = detect_trigger(port, caret, &self.options) else {
            self.close();
            return None;
        };

        let query = found.query.clone();
        let same_trigger = self
            .session()
            .is_some_and(|session| session.trigger_index == found.trigger_index);
        if same_trigger {
            if let MentionState::Open(session) = &mut self.state {
                if session.query == found.query {
                    return None;
                }
                session.query = found.query;
            }
        } else {
            self.close();
            tracing::debug!(
                trigger_index = found.trigger_index,
                query = %found.query,
                "mention session opened"
            );
            self.state = MentionState::Open(MentionSession::from_match(found));
            self.revision += 1;
        }

        let token = self.generation.advance();
        tracing::trace!(generation = token.get(), query = %query, "mention fetch issued");
        Some(FetchTicket { token, query })
    }

    // === Async completion ===

    /// Apply the outcome of a fetch. Returns whether it was applied.
    ///
    /// Results whose token is no longer current are dropped. A source error
    /// counts as an empty result; the session stays open.
    pub fn apply_results(
        &mut self,
        token: Token,
        results: Result<Vec<MentionEntity>, SourceError>,
    ) -> bool {
        if !self.generation.is_current(token) {
            tracing::trace!(generation = token.get(), "discarding stale mention results");
            return false;
        }
        let max_items = self.options.max_items;
        let MentionState::Open(session) = &mut self.state else {
            return false;
        };

        let mut candidates = results.unwrap_or_else(|err| {
            tracing::warn!(query = %session.query, "mention source failed: {err}");
            Vec::new()
        });
        candidates.truncate(max_items);

        session.candidates = candidates;
        session.highlighted = 0;
        self.revision += 1;
        true
    }

    // === User input ===

    /// Offer a key press (by DOM `key` name). Only consumes keys while open.
    pub fn handle_key<P: DocumentPort + ?Sized>(&mut self, key: &str, port: &P) -> KeyResult {
        if !self.is_open() {
            return KeyResult::PassThrough;
        }
        match key {
            "ArrowDown" => {
                self.move_highlight(1);
                KeyResult::Handled
            }
            "ArrowUp" => {
                self.move_highlight(-1);
                KeyResult::Handled
            }
            "Enter" | "Tab" => {
                self.commit_highlighted(port);
                KeyResult::Handled
            }
            "Escape" => {
                self.close();
                KeyResult::Handled
            }
            _ => KeyResult::PassThrough,
        }
    }

    /// Move the highlight circularly. No-op on an empty list.
    pub fn move_highlight(&mut self, step: isize) -> bool {
        let MentionState::Open(session) = &mut self.state else {
            return false;
        };
        let len = session.candidates.len() as isize;
        if len == 0 {
            return false;
        }
        session.highlighted = (session.highlighted as isize + step).rem_euclid(len) as usize;
        true
    }

    /// Commit the highlighted candidate, if any.
    pub fn commit_highlighted<P: DocumentPort + ?Sized>(&mut self, port: &P) -> bool {
        let candidate = self
            .session()
            .and_then(MentionSession::highlighted_candidate)
            .cloned();
        match candidate {
            Some(entity) => self.commit(entity, port),
            None => false,
        }
    }

    /// Commit the candidate at `index` (pointer selection).
    pub fn select<P: DocumentPort + ?Sized>(&mut self, index: usize, port: &P) -> bool {
        let candidate = self
            .session()
            .and_then(|s| s.candidates.get(index))
            .cloned();
        match candidate {
            Some(entity) => self.commit(entity, port),
            None => false,
        }
    }

    /// Replace `@query` with the mention embed plus one trailing space and
    /// put the caret after the space. The session is closed either way.
    ///
    /// The token is re-derived from the live caret first, so the deleted
    /// range is always exactly `@` plus the current query.
    fn commit<P: DocumentPort + ?Sized>(&mut self, entity: MentionEntity, port: &P) -> bool {
        let Some(trigger_index) = self.session().map(|s| s.trigger_index) else {
            return false;
        };
        let token = port
            .selection(true)
            .filter(Selection::is_caret)
            .and_then(|caret| detect_trigger(port, caret.index, &self.options))
            .filter(|found| found.trigger_index == trigger_index);
        let Some(token) = token else {
            self.close();
            return false;
        };

        let delete_len = token.end - trigger_index;
        tracing::debug!(
            trigger_index,
            delete_len,
            id = %entity.id,
            "committing mention"
        );

        // Close first so the notifications these writes emit see no session.
        self.close();
        port.delete_text(trigger_index, delete_len, Source::User);
        port.insert_embed(trigger_index, &Embed::Mention(entity), Source::User);
        port.insert_text(trigger_index + 1, " ", Source::User);
        port.set_selection(trigger_index + 2, 0, Source::User);
        true
    }

    /// A pointer interaction outside both the list and the editing surface.
    pub fn on_outside_pointer(&mut self) -> bool {
        if self.is_open() {
            self.close();
            true
        } else {
            false
        }
    }

    /// Destroy the session. Idempotent; in-flight results become stale.
    pub fn close(&mut self) {
        if let MentionState::Open(session) = &self.state {
            tracing::debug!(trigger_index = session.trigger_index, "mention session closed");
            self.state = MentionState::Idle;
            self.generation.advance();
            self.revision += 1;
        }
    }

    /// Tear down: cancel the pending frame and refuse all further events.
    pub fn destroy<F: FrameScheduler + ?Sized>(&mut self, frames: &mut F) {
        self.frame.cancel(frames);
        self.state = MentionState::Destroyed;
        self.generation.advance();
        self.revision += 1;
    }

    // === Presentation ===

    pub fn view(&self) -> MentionListView<'_> {
        match &self.state {
            MentionState::Open(session) => MentionListView {
                open: true,
                candidates: &session.candidates,
                highlighted: (!session.candidates.is_empty()).then_some(session.highlighted),
                empty_message: session
                    .candidates
                    .is_empty()
                    .then_some(self.options.empty_message.as_str()),
                revision: self.revision,
            },
            _ => MentionListView {
                open: false,
                candidates: &[],
                highlighted: None,
                empty_message: None,
                revision: self.revision,
            },
        }
    }

    /// Where the list's top-left corner goes, relative to the container.
    ///
    /// Anchored below the trigger and clamped horizontally inside the
    /// container. `None` when closed or when the trigger has no bounds.
    pub fn list_position<P: DocumentPort + ?Sized>(
        &self,
        port: &P,
        metrics: &ListMetrics,
    ) -> Option<Point> {
        let session = self.session()?;
        let bounds = port.bounds(session.trigger_index)?;

        let list_width = metrics
            .list_width
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_LIST_WIDTH);
        let top = bounds.bottom + metrics.scroll_top + LIST_GAP;
        let left = (bounds.left + metrics.scroll_left)
            .max(LIST_PADDING)
            .min(metrics.container_width - list_width - LIST_PADDING);

        Some(Point::new(left, top))
    }
}

impl Default for MentionEngine {
    fn default() -> Self {
        Self::new(MentionOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentWrite, MemoryDocument};
    use crate::frame::ManualFrames;
    use crate::mention::StaticMentionSource;
    use crate::types::EMBED_PLACEHOLDER;

    fn people(labels: &[&str]) -> Vec<MentionEntity> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| MentionEntity::new(format!("p{i}"), *label))
            .collect()
    }

    /// Type into the document and run the coalesced frame, as the host would.
    fn type_and_detect(
        engine: &mut MentionEngine,
        doc: &MemoryDocument,
        frames: &mut ManualFrames,
        text: &str,
    ) -> Option<FetchTicket> {
        doc.type_text(text);
        engine.on_content_change(Source::User, doc, frames);
        let mut ticket = None;
        for id in frames.take_queued() {
            ticket = engine.on_frame(id, doc);
        }
        ticket
    }

    fn open_engine(text: &str, results: &[&str]) -> (MentionEngine, MemoryDocument) {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();
        let ticket = type_and_detect(&mut engine, &doc, &mut frames, text).unwrap();
        assert!(engine.apply_results(ticket.token, Ok(people(results))));
        doc.take_writes();
        (engine, doc)
    }

    #[test]
    fn test_typing_trigger_opens_session() {
        let doc = MemoryDocument::from_str("hi ");
        doc.set_selection(3, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();

        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@al").unwrap();
        assert_eq!(ticket.query, "al");

        let session = engine.session().unwrap();
        assert_eq!(session.trigger_index, 3);
        assert_eq!(session.query, "al");
    }

    #[test]
    fn test_space_closes_session() {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();

        assert!(type_and_detect(&mut engine, &doc, &mut frames, "@al").is_some());
        assert!(type_and_detect(&mut engine, &doc, &mut frames, " ").is_none());
        assert!(!engine.is_open());
    }

    #[test]
    fn test_non_user_changes_are_ignored() {
        let doc = MemoryDocument::from_str("@al");
        doc.set_selection(3, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();

        engine.on_content_change(Source::Api, &doc, &mut frames);
        assert!(frames.queued().is_empty());
        assert!(
            engine
                .on_selection_change(Some(Selection::caret(3)), Source::Api, &doc)
                .is_none()
        );
        assert!(!engine.is_open());

        assert!(
            engine
                .on_selection_change(Some(Selection::caret(3)), Source::User, &doc)
                .is_some()
        );
    }

    #[test]
    fn test_keystrokes_coalesce_into_one_frame() {
        let doc = MemoryDocument::from_str("@a");
        doc.set_selection(2, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();

        engine.on_content_change(Source::User, &doc, &mut frames);
        engine.on_content_change(Source::User, &doc, &mut frames);
        let queued = frames.take_queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(frames.cancelled().len(), 1);

        let stale = frames.cancelled()[0];
        assert!(engine.on_frame(stale, &doc).is_none());
        assert!(engine.on_frame(queued[0], &doc).is_some());
        assert!(engine.on_frame(queued[0], &doc).is_none());
    }

    #[test]
    fn test_stale_fetch_never_renders() {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();

        let first = type_and_detect(&mut engine, &doc, &mut frames, "@a").unwrap();
        let second = type_and_detect(&mut engine, &doc, &mut frames, "l").unwrap();
        assert_eq!(first.query, "a");
        assert_eq!(second.query, "al");

        assert!(engine.apply_results(second.token, Ok(people(&["Alice"]))));
        assert!(!engine.apply_results(first.token, Ok(people(&["Ada", "Anna"]))));

        let view = engine.view();
        assert_eq!(view.candidates, people(&["Alice"]).as_slice());
    }

    #[test]
    fn test_results_capped_to_max_items() {
        let (engine, _doc) = open_engine("@", &["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        assert_eq!(engine.session().unwrap().candidates.len(), 8);
    }

    #[test]
    fn test_source_error_shows_empty_state_and_keeps_session() {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();

        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@x").unwrap();
        assert!(engine.apply_results(ticket.token, Err(SourceError::Rejected("offline".into()))));

        let view = engine.view();
        assert!(view.open);
        assert!(view.candidates.is_empty());
        assert_eq!(view.highlighted, None);
        assert_eq!(view.empty_message, Some("No matches"));
    }

    #[test]
    fn test_arrow_keys_cycle_highlight() {
        let (mut engine, doc) = open_engine("@", &["a", "b", "c"]);

        assert_eq!(engine.handle_key("ArrowDown", &doc), KeyResult::Handled);
        assert_eq!(engine.session().unwrap().highlighted, 1);
        engine.handle_key("ArrowDown", &doc);
        engine.handle_key("ArrowDown", &doc);
        assert_eq!(engine.session().unwrap().highlighted, 0);
        engine.handle_key("ArrowUp", &doc);
        assert_eq!(engine.session().unwrap().highlighted, 2);

        assert_eq!(engine.handle_key("x", &doc), KeyResult::PassThrough);
    }

    #[test]
    fn test_arrow_keys_on_empty_list_are_noops() {
        let (mut engine, doc) = open_engine("@", &[]);
        assert_eq!(engine.handle_key("ArrowDown", &doc), KeyResult::Handled);
        assert_eq!(engine.session().unwrap().highlighted, 0);
        assert!(!engine.move_highlight(1));
    }

    #[test]
    fn test_keys_pass_through_when_closed() {
        let doc = MemoryDocument::new();
        let mut engine = MentionEngine::default();
        assert_eq!(engine.handle_key("Enter", &doc), KeyResult::PassThrough);
        assert_eq!(engine.handle_key("ArrowDown", &doc), KeyResult::PassThrough);
    }

    #[test]
    fn test_commit_replaces_token_with_embed_and_space() {
        let doc = MemoryDocument::from_str("hi ");
        doc.set_selection(3, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();
        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@al").unwrap();
        engine.apply_results(ticket.token, Ok(people(&["Alice", "Alan"])));
        engine.move_highlight(1);
        doc.take_writes();

        assert_eq!(engine.handle_key("Enter", &doc), KeyResult::Handled);

        let writes = doc.take_writes();
        assert_eq!(
            writes[0],
            DocumentWrite::DeleteText {
                index: 3,
                length: 3,
                source: Source::User
            }
        );
        assert!(matches!(
            &writes[1],
            DocumentWrite::InsertEmbed { index: 3, embed: Embed::Mention(e), source: Source::User }
                if e.label == "Alan"
        ));
        assert_eq!(
            writes[2],
            DocumentWrite::InsertText {
                index: 4,
                text: " ".into(),
                source: Source::User
            }
        );
        assert_eq!(
            writes[3],
            DocumentWrite::SetSelection {
                index: 5,
                length: 0,
                source: Source::User
            }
        );

        assert_eq!(doc.content_string(), format!("hi {EMBED_PLACEHOLDER} "));
        assert_eq!(doc.embed_count(), 1);
        assert_eq!(doc.selection(false), Some(Selection::caret(5)));
        assert!(!engine.is_open());
    }

    #[test]
    fn test_tab_commits_and_pointer_selects_by_index() {
        let (mut engine, doc) = open_engine("@", &["a", "b"]);
        assert!(engine.select(1, &doc));
        assert!(matches!(
            doc.embed_at(0),
            Some(Embed::Mention(e)) if e.label == "b"
        ));

        let (mut engine, doc) = open_engine("@", &["a", "b"]);
        assert_eq!(engine.handle_key("Tab", &doc), KeyResult::Handled);
        assert!(matches!(
            doc.embed_at(0),
            Some(Embed::Mention(e)) if e.label == "a"
        ));
    }

    #[test]
    fn test_escape_closes_and_discards_in_flight() {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();
        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@b").unwrap();

        assert_eq!(engine.handle_key("Escape", &doc), KeyResult::Handled);
        assert!(!engine.is_open());
        assert!(!engine.apply_results(ticket.token, Ok(people(&["Ben"]))));
        assert!(doc.take_writes().iter().all(|w| !matches!(w, DocumentWrite::DeleteText { .. })));
    }

    #[test]
    fn test_caret_on_trigger_closes() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        assert!(
            engine
                .on_selection_change(Some(Selection::caret(0)), Source::User, &doc)
                .is_none()
        );
        assert!(!engine.is_open());

        let doc = MemoryDocument::from_str("hi ");
        doc.set_selection(3, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();
        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@al").unwrap();
        engine.apply_results(ticket.token, Ok(people(&["Alice"])));

        doc.set_selection(3, 0, Source::User);
        engine.on_selection_change(Some(Selection::caret(3)), Source::User, &doc);
        assert!(!engine.is_open());
        doc.take_writes();
        assert!(!engine.select(0, &doc));
        assert!(doc.take_writes().is_empty());
        assert_eq!(doc.content_string(), "hi @al");
    }

    #[test]
    fn test_caret_inside_token_rederives_query() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        doc.set_selection(2, 0, Source::User);

        let ticket = engine
            .on_selection_change(Some(Selection::caret(2)), Source::User, &doc)
            .unwrap();
        assert_eq!(ticket.query, "a");
        assert_eq!(engine.session().unwrap().query, "a");
        assert!(engine.apply_results(ticket.token, Ok(people(&["Ann"]))));
        doc.take_writes();

        assert!(engine.select(0, &doc));
        assert_eq!(
            doc.take_writes()[0],
            DocumentWrite::DeleteText {
                index: 0,
                length: 2,
                source: Source::User
            }
        );
        assert_eq!(doc.content_string(), format!("{EMBED_PLACEHOLDER} l"));
    }

    #[test]
    fn test_same_query_does_not_refetch() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        assert!(
            engine
                .on_selection_change(Some(Selection::caret(3)), Source::User, &doc)
                .is_none()
        );
        assert!(engine.is_open());
        assert_eq!(engine.session().unwrap().candidates.len(), 1);
    }

    #[test]
    fn test_commit_rechecks_live_caret() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        // Caret moved onto the trigger without a notification reaching us.
        doc.set_selection(0, 0, Source::Silent);
        doc.take_writes();

        assert_eq!(engine.handle_key("Enter", &doc), KeyResult::Handled);
        assert!(!engine.is_open());
        assert!(doc.take_writes().is_empty());
        assert_eq!(doc.content_string(), "@al");
    }

    #[test]
    fn test_edit_displacing_trigger_closes() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        let mut frames = ManualFrames::new();

        doc.insert_text(0, "x", Source::Api);
        engine.on_content_change(Source::Api, &doc, &mut frames);
        assert!(!engine.is_open());
    }

    #[test]
    fn test_api_edit_rederives_open_token() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        let mut frames = ManualFrames::new();

        doc.insert_text(3, "i", Source::Api);
        engine.on_content_change(Source::Api, &doc, &mut frames);
        assert!(engine.is_open());

        let queued = frames.take_queued();
        assert_eq!(queued.len(), 1);
        let ticket = engine.on_frame(queued[0], &doc).unwrap();
        assert_eq!(ticket.query, "ali");
        assert_eq!(engine.session().unwrap().trigger_index, 0);
    }

    #[test]
    fn test_range_or_blur_closes() {
        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        engine.on_selection_change(Some(Selection::new(0, 2)), Source::User, &doc);
        assert!(!engine.is_open());

        let (mut engine, doc) = open_engine("@al", &["Alice"]);
        engine.on_selection_change(None, Source::User, &doc);
        assert!(!engine.is_open());
    }

    #[test]
    fn test_outside_pointer_closes() {
        let (mut engine, _doc) = open_engine("@al", &["Alice"]);
        assert!(engine.on_outside_pointer());
        assert!(!engine.on_outside_pointer());
    }

    #[test]
    fn test_destroy_with_fetch_in_flight() {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();
        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@a").unwrap();
        engine.on_content_change(Source::User, &doc, &mut frames);
        doc.take_writes();

        engine.destroy(&mut frames);

        assert!(frames.queued().is_empty());
        assert!(!engine.apply_results(ticket.token, Ok(people(&["Ann"]))));
        engine.on_content_change(Source::User, &doc, &mut frames);
        assert!(frames.queued().is_empty());
        assert!(engine.update_query(&doc).is_none());
        assert_eq!(engine.handle_key("Enter", &doc), KeyResult::PassThrough);
        assert!(doc.take_writes().is_empty());
        assert!(!engine.view().open);
    }

    #[test]
    fn test_list_position_is_clamped() {
        let (engine, doc) = open_engine("@al", &["Alice"]);
        let metrics = ListMetrics {
            scroll_top: 10.0,
            scroll_left: 0.0,
            container_width: 400.0,
            list_width: None,
        };
        let point = engine.list_position(&doc, &metrics).unwrap();
        assert_eq!(point, Point::new(LIST_PADDING, 20.0 + 10.0 + LIST_GAP));

        let far = MemoryDocument::from_str(&format!("{}@al", " ".repeat(60)));
        far.set_selection(63, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        engine.update_query(&far).unwrap();
        let point = engine
            .list_position(
                &far,
                &ListMetrics {
                    list_width: Some(200.0),
                    ..metrics
                },
            )
            .unwrap();
        assert_eq!(point.x, 400.0 - 200.0 - LIST_PADDING);
    }

    #[tokio::test]
    async fn test_static_source_end_to_end() {
        let doc = MemoryDocument::new();
        doc.set_selection(0, 0, Source::Silent);
        let mut engine = MentionEngine::default();
        let mut frames = ManualFrames::new();
        let source = StaticMentionSource::default();

        let ticket = type_and_detect(&mut engine, &doc, &mut frames, "@chen").unwrap();
        use crate::mention::MentionSource;
        let results = source.search(&ticket.query).await;
        assert!(engine.apply_results(ticket.token, results));
        assert!(engine.commit_highlighted(&doc));

        assert!(matches!(doc.embed_at(0), Some(Embed::Mention(e)) if e.id == "u3"));
        assert_eq!(doc.text(1, 1), " ");
    }
}
