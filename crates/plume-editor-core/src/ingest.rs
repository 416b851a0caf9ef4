//! Drag-and-drop and paste image ingestion.
//!
//! The host extracts the file and its MIME type from the DOM event, asks
//! [`ImageIngest`] whether to take it, decodes the bytes asynchronously and
//! hands the outcome back to [`ImageIngest::finish`], which performs the one
//! document insertion.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::DecodeError;
use crate::image::ImageOverlayController;
use crate::port::DocumentPort;
use crate::token::{Generation, Token};
use crate::types::{Embed, Source};

/// `dropEffect` advertised on drag-over.
pub const DROP_EFFECT: &str = "copy";

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Encode file bytes as a `data:` URI (standard base64 alphabet, padded).
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> Result<String, DecodeError> {
    if !is_image_mime(mime) {
        return Err(DecodeError::NotAnImage {
            mime: mime.to_string(),
        });
    }
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Index of the first clipboard item whose type is an image.
pub fn pick_paste_item<'a>(types: impl IntoIterator<Item = &'a str>) -> Option<usize> {
    types.into_iter().position(is_image_mime)
}

/// A caret resolved from drop coordinates: a rendered node plus an offset
/// within it.
#[derive(Clone, Debug, PartialEq)]
pub struct CaretPosition<N> {
    pub node: N,
    pub offset: usize,
}

/// Map a caret-from-point result to a document offset.
pub fn resolve_drop_offset<P: DocumentPort + ?Sized>(
    port: &P,
    caret: Option<&CaretPosition<P::Node>>,
) -> Option<usize> {
    let caret = caret?;
    Some(port.resolve_node(&caret.node)? + caret.offset)
}

/// Told about each image the pipeline inserts.
pub trait InsertObserver {
    fn image_inserted(&mut self, index: usize);
}

impl<N: Clone + PartialEq + std::fmt::Debug> InsertObserver for ImageOverlayController<N> {
    fn image_inserted(&mut self, index: usize) {
        self.note_inserted(index);
    }
}

/// A decode the host must run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeTicket {
    pub token: Token,
    pub mime: String,
    /// Offset resolved at drop time; `None` means selection or end.
    pub at: Option<usize>,
}

/// Ingestion pipeline state. Only tracks whether completions may still land.
#[derive(Debug, Default)]
pub struct ImageIngest {
    epoch: Generation,
    destroyed: bool,
}

impl ImageIngest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// A drop carrying a first file of type `mime` (or no file). Non-images
    /// are ignored without error.
    pub fn accept_drop(&mut self, mime: Option<&str>, at: Option<usize>) -> Option<DecodeTicket> {
        let mime = mime?;
        if self.destroyed || !is_image_mime(mime) {
            tracing::trace!(mime, "ignoring non-image drop");
            return None;
        }
        tracing::debug!(mime, ?at, "image dropped");
        Some(self.ticket(mime, at))
    }

    /// A pasted file of type `mime`. Inserted at the selection on completion.
    pub fn accept_paste(&mut self, mime: &str) -> Option<DecodeTicket> {
        if self.destroyed || !is_image_mime(mime) {
            return None;
        }
        tracing::debug!(mime, "image pasted");
        Some(self.ticket(mime, None))
    }

    fn ticket(&self, mime: &str, at: Option<usize>) -> DecodeTicket {
        DecodeTicket {
            token: self.epoch.current(),
            mime: mime.to_string(),
            at,
        }
    }

    /// Apply a finished decode: insert the image, put the caret after it and
    /// tell the observer. Returns the insertion offset.
    ///
    /// Completions after `destroy()` and failed decodes change nothing.
    pub fn finish<P: DocumentPort + ?Sized>(
        &mut self,
        ticket: &DecodeTicket,
        decoded: Result<String, DecodeError>,
        port: &P,
        observer: Option<&mut dyn InsertObserver>,
    ) -> Option<usize> {
        if self.destroyed || !self.epoch.is_current(ticket.token) {
            tracing::trace!("discarding decode finished after teardown");
            return None;
        }
        let uri = match decoded {
            Ok(uri) => uri,
            Err(err) => {
                tracing::warn!(mime = %ticket.mime, "image decode failed: {err}");
                return None;
            }
        };

        let len = port.len();
        let at = ticket
            .at
            .or_else(|| port.selection(true).map(|s| s.index))
            .unwrap_or(len)
            .min(len);

        port.insert_embed(at, &Embed::Image(uri), Source::User);
        port.set_selection(at + 1, 0, Source::User);
        tracing::debug!(index = at, "image inserted");

        if let Some(observer) = observer {
            observer.image_inserted(at);
        }
        Some(at)
    }

    /// Invalidate every outstanding ticket.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.epoch.advance();
    }
}
