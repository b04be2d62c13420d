//! Long-term gesture history and analytics, persisted as one JSON document.
//!
//! Unlike [`SessionAggregator`](crate::session::SessionAggregator) this
//! outlives a session reset and is only wiped by the explicit `clear_*`
//! calls.

use std::{
    collections::{HashMap, VecDeque},
    fs,
    io::ErrorKind,
    path::Path,
};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    session::SessionId,
    types::{DetectedGesture, GestureKind},
};

pub const HISTORY_CAPACITY: usize = 100;

/// Field names follow the camelCase document layout shared with browser
/// exports, so those files import unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredGesture {
    #[serde(rename = "type")]
    pub gesture: GestureKind,
    pub confidence: f32,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_gestures: u64,
    pub gestures_by_type: HashMap<GestureKind, u64>,
    pub average_confidence: f32,
    pub session_count: u64,
    #[serde(rename = "totalRuntime")]
    pub total_runtime_ms: u64,
}

impl Analytics {
    fn record(&mut self, kind: GestureKind, confidence: f32) {
        self.total_gestures += 1;
        *self.gestures_by_type.entry(kind).or_insert(0) += 1;
        let n = self.total_gestures as f32;
        self.average_confidence = (self.average_confidence * (n - 1.0) + confidence) / n;
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryExport {
    #[serde(default)]
    history: Option<Vec<StoredGesture>>,
    #[serde(default)]
    analytics: Option<Analytics>,
    #[serde(default)]
    exported_at: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    history: VecDeque<StoredGesture>,
    analytics: Analytics,
}

#[derive(Clone, Debug)]
pub struct HistoryStore {
    history: VecDeque<StoredGesture>,
    analytics: Analytics,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::new(),
            analytics: Analytics::default(),
            capacity: capacity.max(1),
        }
    }

    /// Reads a store from disk. A missing file yields an empty store.
    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        let mut store = Self::new(capacity);
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(store),
            Err(err) => return Err(err.into()),
        };

        let document: StoreDocument = serde_json::from_str(&raw)?;
        store.history = document.history;
        store.analytics = document.analytics;
        store.trim();
        log::info!(
            "loaded {} stored gestures from {}",
            store.history.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let document = StoreDocument {
            history: self.history.clone(),
            analytics: self.analytics.clone(),
        };
        fs::write(path, serde_json::to_string(&document)?)?;
        Ok(())
    }

    pub fn record(&mut self, gesture: &DetectedGesture, session: &SessionId) {
        self.history.push_back(StoredGesture {
            gesture: gesture.gesture_type,
            confidence: gesture.confidence,
            timestamp_ms: gesture.timestamp,
            session_id: Some(session.clone()),
        });
        self.trim();
        self.analytics
            .record(gesture.gesture_type, gesture.confidence);
    }

    pub fn begin_session(&mut self) {
        self.analytics.session_count += 1;
    }

    pub fn add_runtime(&mut self, millis: u64) {
        self.analytics.total_runtime_ms = self.analytics.total_runtime_ms.saturating_add(millis);
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StoredGesture> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn by_session<'a>(
        &'a self,
        session: &'a SessionId,
    ) -> impl Iterator<Item = &'a StoredGesture> + 'a {
        self.history
            .iter()
            .filter(move |g| g.session_id.as_ref() == Some(session))
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn clear_analytics(&mut self) {
        self.analytics = Analytics::default();
    }

    pub fn clear_all(&mut self) {
        self.clear_history();
        self.clear_analytics();
    }

    pub fn export_json(&self) -> Result<String> {
        let export = HistoryExport {
            history: Some(self.history.iter().cloned().collect()),
            analytics: Some(self.analytics.clone()),
            exported_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Replaces whichever of history and analytics the document carries.
    /// Nothing changes when the document fails to parse.
    pub fn import_json(&mut self, raw: &str) -> Result<()> {
        let import: HistoryExport = serde_json::from_str(raw)?;
        if let Some(history) = import.history {
            self.history = history.into();
            self.trim();
        }
        if let Some(analytics) = import.analytics {
            self.analytics = analytics;
        }
        Ok(())
    }

    fn trim(&mut self) {
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }
}
