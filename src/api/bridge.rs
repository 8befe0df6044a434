//! JavaScript-backed collaborators
//!
//! Template lookup and font readiness are answered synchronously by callbacks.
//! Saves are collected in an outbox and handed to JavaScript only after the
//! engine call that produced them has returned, so a persist callback may call
//! straight back into the engine.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::engine::{FontLoader, FontReadiness, PersistSink, SaveRequest, TemplateRegistry};
use crate::error::PersistError;
use crate::models::{FontSpec, SlideIndex, TemplateGeometry};

use super::helpers::{js_error_message, log_warn};

/// `templateFor(slideIndex) -> TemplateGeometry | null`
pub struct JsTemplateRegistry {
    callback: Function,
}

impl JsTemplateRegistry {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl TemplateRegistry for JsTemplateRegistry {
    fn template_for(&self, slide_index: SlideIndex) -> Option<TemplateGeometry> {
        let value = match self
            .callback
            .call1(&JsValue::NULL, &JsValue::from(slide_index.get() as u32))
        {
            Ok(value) => value,
            Err(e) => {
                log_warn(&format!("templateFor({}) threw: {}", slide_index, js_error_message(&e)));
                return None;
            }
        };
        if value.is_null() || value.is_undefined() {
            return None;
        }
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| log_warn(&format!("template for slide {} rejected: {}", slide_index, e)))
            .ok()
    }
}

/// `ensureFonts(fonts) -> boolean`, true once every font is usable
pub struct JsFontLoader {
    callback: Function,
}

impl JsFontLoader {
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl FontLoader for JsFontLoader {
    fn ensure_loaded(&mut self, fonts: &[FontSpec]) -> FontReadiness {
        let arg = match serde_wasm_bindgen::to_value(fonts) {
            Ok(arg) => arg,
            Err(e) => {
                log_warn(&format!("font list serialization failed: {}", e));
                return FontReadiness::Pending;
            }
        };
        match self.callback.call1(&JsValue::NULL, &arg) {
            Ok(ready) if ready.as_bool() == Some(true) => FontReadiness::Ready,
            Ok(_) => FontReadiness::Pending,
            Err(e) => {
                log_warn(&format!("ensureFonts threw: {}", js_error_message(&e)));
                FontReadiness::Pending
            }
        }
    }
}

/// Saves waiting to be handed to JavaScript
pub type Outbox = Rc<RefCell<Vec<SaveRequest>>>;

/// Persist sink that only records; see [`flush_outbox`]
pub struct OutboxPersistSink {
    outbox: Outbox,
}

impl OutboxPersistSink {
    pub fn new(outbox: Outbox) -> Self {
        Self { outbox }
    }
}

impl PersistSink for OutboxPersistSink {
    fn begin_save(&mut self, request: &SaveRequest) -> Result<(), PersistError> {
        self.outbox.borrow_mut().push(request.clone());
        Ok(())
    }
}

/// Call `persist(saveId, payloadJson)` for every recorded save
///
/// Returns the saves whose callback threw, with the reason.
pub fn flush_outbox(outbox: &Outbox, callback: &Function) -> Vec<(u64, PersistError)> {
    let pending: Vec<SaveRequest> = outbox.borrow_mut().drain(..).collect();
    let mut failed = Vec::new();
    for request in pending {
        let outcome = request.to_json().and_then(|json| {
            callback
                .call2(
                    &JsValue::NULL,
                    &JsValue::from_f64(request.save_id as f64),
                    &JsValue::from_str(&json),
                )
                .map(|_| ())
                .map_err(|e| PersistError::Rejected(js_error_message(&e)))
        });
        if let Err(e) = outcome {
            failed.push((request.save_id, e));
        }
    }
    failed
}
