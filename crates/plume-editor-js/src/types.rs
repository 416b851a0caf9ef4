//! Option bags and entities exposed to JavaScript via wasm-bindgen.

use std::collections::BTreeMap;

use plume_editor_core::{CounterOptions, ImageOverlayOptions, MentionEntity, MentionOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// Mention module options. Omitted fields take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsMentionOptions {
    #[tsify(optional)]
    pub min_chars: Option<usize>,
    #[tsify(optional)]
    pub max_chars: Option<usize>,
    #[tsify(optional)]
    pub max_items: Option<usize>,
    #[tsify(optional)]
    pub empty_message: Option<String>,
}

impl From<JsMentionOptions> for MentionOptions {
    fn from(js: JsMentionOptions) -> Self {
        let defaults = MentionOptions::default();
        Self {
            min_chars: js.min_chars.unwrap_or(defaults.min_chars),
            max_chars: js.max_chars.unwrap_or(defaults.max_chars),
            max_items: js.max_items.unwrap_or(defaults.max_items),
            empty_message: js.empty_message.unwrap_or(defaults.empty_message),
        }
    }
}

/// Image overlay options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsImageOverlayOptions {
    /// Smallest width or height a resize can produce, in CSS pixels.
    #[tsify(optional)]
    pub min_size: Option<f64>,
}

impl From<JsImageOverlayOptions> for ImageOverlayOptions {
    fn from(js: JsImageOverlayOptions) -> Self {
        let defaults = ImageOverlayOptions::default();
        Self {
            min_size: js.min_size.unwrap_or(defaults.min_size),
        }
    }
}

/// Character counter options.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsCounterOptions {
    #[tsify(optional)]
    pub limit: Option<usize>,
}

impl From<JsCounterOptions> for CounterOptions {
    fn from(js: JsCounterOptions) -> Self {
        Self { limit: js.limit }
    }
}

/// A mention candidate as returned by a JS source function.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsMentionEntity {
    pub id: String,
    pub label: String,
    #[tsify(optional)]
    pub value: Option<String>,
    #[tsify(optional)]
    pub avatar_url: Option<String>,
    #[tsify(optional)]
    pub meta: Option<BTreeMap<String, String>>,
}

impl From<JsMentionEntity> for MentionEntity {
    fn from(js: JsMentionEntity) -> Self {
        Self {
            id: js.id,
            label: js.label,
            value: js.value,
            avatar_url: js.avatar_url,
            meta: js.meta,
        }
    }
}

/// Deserialize an options bag; `undefined`/`null` yields the defaults.
pub(crate) fn parse_options<T: DeserializeOwned + Default>(
    value: JsValue,
    what: &str,
) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("Invalid {} options: {}", what, e)))
}
