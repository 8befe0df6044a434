//! Persistence Coordinator
//!
//! Debounces "save this slide's layout and input" requests per purpose and
//! key, always saving the latest snapshot at fire time, with at most one save
//! in flight per key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::error::PersistError;
use crate::models::{InputSnapshot, LayoutSnapshot, ProjectId, SlideIndex, SlideKey};

use super::host::PersistSink;
use super::store::SlideStore;
use super::timers::DebounceTimers;

/// Which call site scheduled a save; each has its own debounce window
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SavePurpose {
    /// Edits that did not reflow (formatting, punctuation, alignment)
    StyleOnly,
    Layout,
}

/// Snapshot pair carried with a scheduled save
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SavePayload {
    pub layout_snapshot: Option<LayoutSnapshot>,
    pub input_snapshot: Option<InputSnapshot>,
    /// Store load generation the snapshots were taken under
    pub generation: u64,
}

/// One save handed to the storage collaborator
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub save_id: u64,
    pub project_id: ProjectId,
    pub slide_index: SlideIndex,
    pub layout_snapshot: Option<LayoutSnapshot>,
    pub input_snapshot: Option<InputSnapshot>,
}

impl SaveRequest {
    pub fn key(&self) -> SlideKey {
        SlideKey::new(self.project_id.clone(), self.slide_index)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Transient save indicator shown by the UI
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Error,
}

type TimerKey = (SavePurpose, SlideKey);

#[derive(Debug)]
pub struct PersistenceCoordinator {
    timers: DebounceTimers<TimerKey>,
    payloads: HashMap<TimerKey, SavePayload>,
    /// save id -> key, for saves handed to the sink
    in_flight: HashMap<u64, SlideKey>,
    /// Saves waiting for the key's in-flight save to finish (newest only)
    parked: HashMap<SlideKey, SavePayload>,
    status: SaveStatus,
    error_at_ms: Option<f64>,
    next_save_id: u64,
    style_window_ms: f64,
    layout_window_ms: f64,
    error_reset_ms: f64,
}

impl PersistenceCoordinator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timers: DebounceTimers::new(),
            payloads: HashMap::new(),
            in_flight: HashMap::new(),
            parked: HashMap::new(),
            status: SaveStatus::Idle,
            error_at_ms: None,
            next_save_id: 1,
            style_window_ms: config.style_save_debounce_ms,
            layout_window_ms: config.layout_save_debounce_ms,
            error_reset_ms: config.save_error_reset_ms,
        }
    }

    fn window(&self, purpose: SavePurpose) -> f64 {
        match purpose {
            SavePurpose::StyleOnly => self.style_window_ms,
            SavePurpose::Layout => self.layout_window_ms,
        }
    }

    /// Schedule a save for `key`, replacing any pending one of the same purpose
    pub fn schedule(&mut self, purpose: SavePurpose, key: SlideKey, payload: SavePayload, now_ms: f64) {
        let timer_key = (purpose, key);
        self.timers.arm(timer_key.clone(), now_ms, self.window(purpose));
        self.payloads.insert(timer_key, payload);
    }

    pub fn is_pending(&self, purpose: SavePurpose, key: &SlideKey) -> bool {
        self.timers.is_armed(&(purpose, key.clone()))
    }

    /// Issue every save whose debounce window has elapsed
    pub fn fire_due(&mut self, now_ms: f64, store: &SlideStore, sink: &mut dyn PersistSink) -> usize {
        let due = self.timers.take_due(now_ms);
        let count = due.len();
        for timer_key in due {
            let carried = self.payloads.remove(&timer_key).unwrap_or_default();
            let (_, key) = timer_key;
            let payload = Self::latest(&key, carried, store);
            if self.in_flight.values().any(|k| *k == key) {
                log::debug!("save for {} parked behind in-flight save", key);
                self.parked.insert(key, payload);
            } else {
                let request = self.build_request(&key, payload);
                self.issue(request, now_ms, sink);
            }
        }
        count
    }

    /// Record the outcome of a save; returns false for an unknown save id
    pub fn complete_save(
        &mut self,
        save_id: u64,
        result: Result<(), PersistError>,
        now_ms: f64,
        store: &SlideStore,
        sink: &mut dyn PersistSink,
    ) -> bool {
        let Some(key) = self.in_flight.remove(&save_id) else {
            log::warn!("completion for unknown save {}", save_id);
            return false;
        };

        match result {
            Ok(()) => log::info!("saved {} (save {})", key, save_id),
            Err(e) => self.fail(&key, &e, now_ms),
        }

        if let Some(parked) = self.parked.remove(&key) {
            let request = self.build_request(&key, Self::latest(&key, parked, store));
            self.issue(request, now_ms, sink);
        } else if self.in_flight.is_empty() && self.status == SaveStatus::Saving {
            self.status = SaveStatus::Idle;
        }
        true
    }

    /// Reset a transient error once it has been visible long enough
    pub fn expire(&mut self, now_ms: f64) {
        if let Some(at) = self.error_at_ms {
            if now_ms - at >= self.error_reset_ms {
                self.error_at_ms = None;
                self.status = if self.in_flight.is_empty() {
                    SaveStatus::Idle
                } else {
                    SaveStatus::Saving
                };
            }
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        let error_reset = self.error_at_ms.map(|at| at + self.error_reset_ms);
        match (self.timers.next_deadline(), error_reset) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drop every pending, parked and in-flight save
    pub fn clear(&mut self) {
        self.timers.clear();
        self.payloads.clear();
        self.in_flight.clear();
        self.parked.clear();
        self.status = SaveStatus::Idle;
        self.error_at_ms = None;
    }

    /// Latest snapshots for `key`: from the store while the load the payload
    /// was taken under is still current, otherwise the carried payload
    ///
    /// Leaving a project and coming back re-hydrates the store from older
    /// rows, so a reloaded store never overrides what was carried.
    fn latest(key: &SlideKey, carried: SavePayload, store: &SlideStore) -> SavePayload {
        match store.slide_at_generation(key, carried.generation) {
            Some(slide) => SavePayload {
                layout_snapshot: slide.layout_snapshot.clone(),
                input_snapshot: slide.input_snapshot.clone(),
                generation: carried.generation,
            },
            None => carried,
        }
    }

    fn build_request(&mut self, key: &SlideKey, payload: SavePayload) -> SaveRequest {
        let save_id = self.next_save_id;
        self.next_save_id += 1;
        SaveRequest {
            save_id,
            project_id: key.project_id.clone(),
            slide_index: key.slide_index,
            layout_snapshot: payload.layout_snapshot,
            input_snapshot: payload.input_snapshot,
        }
    }

    fn issue(&mut self, request: SaveRequest, now_ms: f64, sink: &mut dyn PersistSink) {
        let key = request.key();
        match sink.begin_save(&request) {
            Ok(()) => {
                log::debug!("save {} started for {}", request.save_id, key);
                self.in_flight.insert(request.save_id, key);
                if self.status != SaveStatus::Error {
                    self.status = SaveStatus::Saving;
                }
            }
            Err(e) => self.fail(&key, &e, now_ms),
        }
    }

    fn fail(&mut self, key: &SlideKey, error: &PersistError, now_ms: f64) {
        log::error!("save failed for {}: {}", key, error);
        self.status = SaveStatus::Error;
        self.error_at_ms = Some(now_ms);
    }
}
