//! Core value types shared by every module: selections, change sources,
//! geometry, embeds and formatting attributes.
//!
//! All positions are document offsets (see [`crate::DocumentPort`]), never DOM
//! coordinates. Pixel types only describe where overlay UI is drawn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::mention::MentionEntity;

/// Placeholder character an embed occupies in [`crate::DocumentPort::text`].
pub const EMBED_PLACEHOLDER: char = '\u{FFFC}';

/// Who caused a document or selection change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Direct user interaction, or a module acting on the user's behalf.
    #[default]
    User,
    /// Programmatic change made through the engine's API.
    Api,
    /// Programmatic change that should not be observed as an edit.
    Silent,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::User => "user",
            Source::Api => "api",
            Source::Silent => "silent",
        }
    }

    /// Parse the engine's source tag. Unknown tags are treated as `Api`.
    pub fn parse(s: &str) -> Self {
        match s {
            "user" => Source::User,
            "silent" => Source::Silent,
            _ => Source::Api,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Source::User)
    }
}

/// A document selection: a caret when `length == 0`, a range otherwise.
///
/// "No focus" is expressed as `Option<Selection>::None` at the call sites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// A collapsed selection at `index`.
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }

    pub fn is_caret(&self) -> bool {
        self.length == 0
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

/// Pixel bounds of a document offset, relative to the editor container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when either dimension is zero or negative (e.g. an image mid-load).
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A point in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Integer pixel size, as written to image `width`/`height` attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An atomic, length-1 document unit carrying non-text content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Embed {
    /// Image source, usually a `data:` URI.
    Image(String),
    /// A committed mention chip; the entity is copied by value.
    Mention(MentionEntity),
}

impl Embed {
    /// Name of the embed type as registered with the document engine.
    pub fn type_name(&self) -> &'static str {
        match self {
            Embed::Image(_) => "image",
            Embed::Mention(_) => "mention",
        }
    }
}

/// Value of a single formatting attribute.
///
/// Serializes as the string value, or as `false` when clearing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    Set(SmolStr),
    /// Removes the attribute.
    Clear,
}

impl Serialize for AttrValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Set(v) => serializer.serialize_str(v),
            AttrValue::Clear => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(SmolStr),
            Bool(bool),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(v) => Ok(AttrValue::Set(v)),
            Raw::Bool(false) => Ok(AttrValue::Clear),
            Raw::Bool(true) => Err(serde::de::Error::custom(
                "expected a string value or `false`",
            )),
        }
    }
}

/// Formatting attributes applied to a document range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<SmolStr, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style set.
    pub fn with(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style clear.
    pub fn without(mut self, key: impl Into<SmolStr>) -> Self {
        self.0.insert(key.into(), AttrValue::Clear);
        self
    }

    pub fn set(&mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        self.0.insert(key.into(), AttrValue::Set(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// The string value of `key`, if set (not cleared).
    pub fn value(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(AttrValue::Set(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &AttrValue)> {
        self.0.iter()
    }

    /// Merge `other` into `self`: set values overwrite, clears remove.
    pub fn apply(&mut self, other: &Attributes) {
        for (key, value) in other.iter() {
            match value {
                AttrValue::Set(v) => {
                    self.0.insert(key.clone(), AttrValue::Set(v.clone()));
                }
                AttrValue::Clear => {
                    self.0.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trip() {
        assert_eq!(Source::parse("user"), Source::User);
        assert_eq!(Source::parse("silent"), Source::Silent);
        assert_eq!(Source::parse("api"), Source::Api);
        assert_eq!(Source::parse("weird"), Source::Api);
        assert!(Source::User.is_user());
        assert!(!Source::Silent.is_user());
    }

    #[test]
    fn test_selection_caret() {
        let sel = Selection::caret(4);
        assert!(sel.is_caret());
        assert_eq!(sel.end(), 4);

        let range = Selection::new(4, 3);
        assert!(!range.is_caret());
        assert_eq!(range.end(), 7);
    }

    #[test]
    fn test_rect_degenerate() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, 10.0, 0.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 10.0, 10.0).is_degenerate());
    }

    #[test]
    fn test_attributes_apply_clears() {
        let mut attrs = Attributes::new().with("alt", "a cat").with("width", "120");
        attrs.apply(&Attributes::new().without("alt").with("width", "160"));

        assert_eq!(attrs.value("alt"), None);
        assert_eq!(attrs.value("width"), Some("160"));
    }

    #[test]
    fn test_embed_type_names() {
        assert_eq!(Embed::Image("data:image/png;base64,AA==".into()).type_name(), "image");
    }
}
