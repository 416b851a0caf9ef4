//! plume-editor-core: framework-agnostic logic for the plume editor modules.
//!
//! This crate provides:
//! - `DocumentPort` / `ChangeFeed` traits over the host's rich-text engine
//! - `MemoryDocument` - in-memory port implementation for native hosts and tests
//! - `MentionEngine` - `@mention` detection, fetch sequencing and commit
//! - `ImageOverlayController` - image activation, resize, alignment and caption
//! - `ImageIngest` - drag/paste image ingestion
//! - `CharCount` - the character counter
//!
//! Nothing here touches the DOM or awaits. Async work leaves as tickets and
//! comes back through explicit completion calls guarded by generation tokens.

pub mod counter;
pub mod document;
pub mod error;
pub mod frame;
pub mod image;
pub mod ingest;
pub mod mention;
pub mod port;
pub mod token;
pub mod types;

pub use counter::{COUNTER_CLASS, CharCount, CounterOptions, EXCEED_CLASS};
pub use document::{DocumentWrite, MemoryDocument, NodeId};
pub use error::{DecodeError, PlatformError, SourceError};
pub use frame::{FrameId, FrameScheduler, FrameSlot, ManualFrames};
pub use image::{
    Alignment, CaptionChange, ClickTarget, HandleDirection, ImageOverlayController,
    ImageOverlayOptions, LayoutInputs, OverlayChange, OverlayLayout, PointerTarget,
};
pub use ingest::{
    CaretPosition, DROP_EFFECT, DecodeTicket, ImageIngest, InsertObserver, encode_data_uri,
    is_image_mime, pick_paste_item, resolve_drop_offset,
};
pub use mention::{
    FetchTicket, KeyResult, ListMetrics, MentionEmbedValue, MentionEngine, MentionEntity,
    MentionListView, MentionOptions, MentionSource, StaticMentionSource,
};
pub use port::{ChangeFeed, ContentHandler, DocumentPort, SelectionHandler, Subscription};
pub use smol_str::SmolStr;
pub use token::{Generation, Token};
pub use types::{
    AttrValue, Attributes, Bounds, EMBED_PLACEHOLDER, Embed, Point, Rect, Selection, Size, Source,
};
