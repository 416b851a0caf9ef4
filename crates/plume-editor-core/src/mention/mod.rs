//! `@mention` suggestions: token detection, the session state machine, and
//! pluggable candidate sources.

mod detect;
mod engine;
mod entity;

pub use detect::{TRIGGER, TriggerMatch, detect_trigger};
pub use engine::{
    DEFAULT_LIST_WIDTH, FetchTicket, KeyResult, LIST_GAP, LIST_PADDING, ListMetrics,
    MentionEngine, MentionListView, MentionSession, MentionState,
};
pub use entity::{
    MentionEmbedValue, MentionEntity, MentionOptions, MentionSource, StaticMentionSource,
    default_mentions,
};
