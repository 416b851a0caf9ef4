//! Mention sources backed by JavaScript functions.

use n0_future::boxed::BoxFuture;
use plume_editor_core::{MentionEntity, MentionSource, SourceError, StaticMentionSource};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::types::JsMentionEntity;

/// Adapts a JS `(query) => MentionEntity[] | Promise<MentionEntity[]>`.
#[derive(Clone, Debug)]
pub struct JsMentionSource {
    function: js_sys::Function,
}

impl JsMentionSource {
    pub fn new(function: js_sys::Function) -> Self {
        Self { function }
    }
}

fn describe(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

impl MentionSource for JsMentionSource {
    fn search(&self, query: &str) -> BoxFuture<Result<Vec<MentionEntity>, SourceError>> {
        let called = self.function.call1(&JsValue::NULL, &JsValue::from_str(query));
        Box::pin(async move {
            let returned = called.map_err(|e| SourceError::Rejected(describe(&e)))?;
            let resolved = JsFuture::from(js_sys::Promise::resolve(&returned))
                .await
                .map_err(|e| SourceError::Rejected(describe(&e)))?;
            let entities: Vec<JsMentionEntity> = serde_wasm_bindgen::from_value(resolved)
                .map_err(|e| SourceError::Malformed(e.to_string()))?;
            Ok(entities.into_iter().map(MentionEntity::from).collect())
        })
    }
}

/// The source a JS module was constructed with.
pub enum HostSource {
    Js(JsMentionSource),
    Default(StaticMentionSource),
}

impl HostSource {
    pub fn from_function(function: Option<js_sys::Function>) -> Self {
        match function {
            Some(function) => HostSource::Js(JsMentionSource::new(function)),
            None => HostSource::Default(StaticMentionSource::default()),
        }
    }
}

impl MentionSource for HostSource {
    fn search(&self, query: &str) -> BoxFuture<Result<Vec<MentionEntity>, SourceError>> {
        match self {
            HostSource::Js(source) => source.search(query),
            HostSource::Default(source) => source.search(query),
        }
    }
}
