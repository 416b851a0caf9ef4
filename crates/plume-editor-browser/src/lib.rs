//! Browser DOM layer for the plume editor modules.
//!
//! This crate mounts the core state machines onto a live editing surface,
//! generic over any `DocumentPort` whose nodes are DOM nodes. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `reactor`: serialised, non-reentrant module reactions
//! - `frames`: `requestAnimationFrame` scheduler
//! - `mention`: suggestion list, key interception, source futures
//! - `image`: resize overlay, toolbar, caption input
//! - `ingest`: drop and paste handlers, file decoding
//! - `counter`: character counter display
//!
//! # Re-exports
//!
//! This crate re-exports `plume-editor-core` for convenience, so consumers
//! only need to depend on `plume-editor-browser`.

// Re-export core crate
pub use plume_editor_core;
pub use plume_editor_core::*;

pub mod caret;
pub mod counter;
pub mod dom;
pub mod frames;
pub mod image;
pub mod ingest;
pub mod mention;
pub mod reactor;

pub use caret::caret_from_point;
pub use counter::CharCounterModule;
pub use frames::AnimationFrames;
pub use image::{ImageResizeModule, OverlayNotifier};
pub use ingest::{ImageDropModule, read_data_uri};
pub use mention::MentionModule;
pub use reactor::{Reactor, dispatch_weak};
