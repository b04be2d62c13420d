use std::{
    collections::{HashMap, VecDeque},
    fmt,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{DetectedGesture, GestureKind};

pub const RECENT_CAPACITY: usize = 10;
pub const METRICS_WINDOW: usize = 30;

/// Opaque identifier tying persisted gestures to one tracking session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("session_{millis}_{}", &suffix[..10]))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_gestures: u64,
    pub gestures_by_type: HashMap<GestureKind, u64>,
    pub average_confidence: f32,
}

impl SessionStats {
    /// Folds one more gesture into the running totals without revisiting
    /// earlier ones.
    pub fn record(&mut self, kind: GestureKind, confidence: f32) {
        self.total_gestures += 1;
        *self.gestures_by_type.entry(kind).or_insert(0) += 1;
        let n = self.total_gestures as f32;
        self.average_confidence = (self.average_confidence * (n - 1.0) + confidence) / n;
    }

    pub fn count(&self, kind: GestureKind) -> u64 {
        self.gestures_by_type.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub average_fps: f32,
    pub average_processing_time_ms: f32,
    pub frames_processed: u64,
    pub gestures_detected: u64,
}

/// Live view of a session: the last few transitions for display plus
/// running statistics.
#[derive(Clone, Debug)]
pub struct SessionAggregator {
    recent: VecDeque<DetectedGesture>,
    recent_capacity: usize,
    stats: SessionStats,
    frames_processed: u64,
    fps_samples: VecDeque<f32>,
    processing_samples: VecDeque<f32>,
    metrics_window: usize,
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new(RECENT_CAPACITY, METRICS_WINDOW)
    }
}

impl SessionAggregator {
    pub fn new(recent_capacity: usize, metrics_window: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(recent_capacity),
            recent_capacity: recent_capacity.max(1),
            stats: SessionStats::default(),
            frames_processed: 0,
            fps_samples: VecDeque::new(),
            processing_samples: VecDeque::new(),
            metrics_window: metrics_window.max(1),
        }
    }

    pub fn record(&mut self, gesture: &DetectedGesture) {
        self.recent.push_front(gesture.clone());
        self.recent.truncate(self.recent_capacity);
        self.stats.record(gesture.gesture_type, gesture.confidence);
    }

    pub fn record_frame(&mut self, fps: Option<f32>, processing_time_ms: f32) {
        self.frames_processed += 1;
        if let Some(fps) = fps {
            push_sample(&mut self.fps_samples, fps, self.metrics_window);
        }
        push_sample(
            &mut self.processing_samples,
            processing_time_ms,
            self.metrics_window,
        );
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &DetectedGesture> {
        self.recent.iter()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics {
            average_fps: mean(&self.fps_samples),
            average_processing_time_ms: mean(&self.processing_samples),
            frames_processed: self.frames_processed,
            gestures_detected: self.stats.total_gestures,
        }
    }

    pub fn reset(&mut self) {
        self.recent.clear();
        self.stats = SessionStats::default();
        self.frames_processed = 0;
        self.fps_samples.clear();
        self.processing_samples.clear();
    }
}

fn push_sample(samples: &mut VecDeque<f32>, value: f32, window: usize) {
    samples.push_back(value);
    while samples.len() > window {
        samples.pop_front();
    }
}

fn mean(samples: &VecDeque<f32>) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}
