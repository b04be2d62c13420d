use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    gesture::classify_gesture,
    types::{Classification, DetectedGesture, GestureKind, HandFrame, Handedness, StabilizerEvent},
};

/// Number of recent classifications kept per hand track.
pub const STABILITY_WINDOW: usize = 10;
/// Votes a category needs inside the window before it can lock.
pub const STABILITY_THRESHOLD: usize = 5;
/// Consecutive frames without any hand before every track is cleared.
pub const NO_HAND_THRESHOLD: u32 = 8;
pub const CONFIDENCE_BOOST: f32 = 0.1;
pub const MAX_STABLE_CONFIDENCE: f32 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    pub window_size: usize,
    pub vote_threshold: usize,
    pub no_hand_threshold: u32,
    pub confidence_boost: f32,
    pub max_confidence: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window_size: STABILITY_WINDOW,
            vote_threshold: STABILITY_THRESHOLD,
            no_hand_threshold: NO_HAND_THRESHOLD,
            confidence_boost: CONFIDENCE_BOOST,
            max_confidence: MAX_STABLE_CONFIDENCE,
        }
    }
}

impl StabilizerConfig {
    /// Clamps values into a usable range: a non-empty window, a vote threshold
    /// the window can actually reach, and confidences inside [0, 1].
    pub fn sanitized(self) -> Self {
        let window_size = self.window_size.max(1);
        Self {
            window_size,
            vote_threshold: self.vote_threshold.clamp(1, window_size),
            no_hand_threshold: self.no_hand_threshold.max(1),
            confidence_boost: self.confidence_boost.clamp(0.0, 1.0),
            max_confidence: self.max_confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    NoSignal,
    Buffering,
    Locked(GestureKind),
}

#[derive(Clone, Debug, Default)]
pub struct HandTrack {
    buffer: VecDeque<GestureKind>,
    locked: Option<GestureKind>,
    current: Option<DetectedGesture>,
    missing_frames: u32,
}

impl HandTrack {
    pub fn state(&self) -> TrackState {
        match self.locked {
            Some(kind) => TrackState::Locked(kind),
            None if self.buffer.is_empty() => TrackState::NoSignal,
            None => TrackState::Buffering,
        }
    }

    pub fn locked(&self) -> Option<GestureKind> {
        self.locked
    }

    /// Latest stable output, refreshed every frame the majority holds.
    /// Withdrawn once this hand has been missing for the hand-loss
    /// threshold, even if the other hand is still in view.
    pub fn current(&self) -> Option<&DetectedGesture> {
        self.current.as_ref()
    }

    /// Consecutive frames this hand was absent from.
    pub fn missing_frames(&self) -> u32 {
        self.missing_frames
    }

    pub fn buffer(&self) -> impl Iterator<Item = GestureKind> + '_ {
        self.buffer.iter().copied()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Most frequent category in the window. On a tie the category that
    /// first appeared in the window wins.
    pub fn majority(&self) -> Option<(GestureKind, usize)> {
        let mut counts: Vec<(GestureKind, usize)> = Vec::with_capacity(GestureKind::ALL.len());
        for &kind in &self.buffer {
            match counts.iter_mut().find(|(seen, _)| *seen == kind) {
                Some((_, count)) => *count += 1,
                None => counts.push((kind, 1)),
            }
        }

        let mut best: Option<(GestureKind, usize)> = None;
        for (kind, count) in counts {
            if best.is_none_or(|(_, max)| count > max) {
                best = Some((kind, count));
            }
        }
        best
    }

    fn push(&mut self, kind: GestureKind, capacity: usize) {
        self.buffer.push_back(kind);
        while self.buffer.len() > capacity {
            self.buffer.pop_front();
        }
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.locked = None;
        self.current = None;
        self.missing_frames = 0;
    }

    fn mark_missing(&mut self, hand: Handedness, threshold: u32) {
        self.missing_frames = self.missing_frames.saturating_add(1);
        if self.missing_frames >= threshold && self.current.take().is_some() {
            log::debug!("{hand} hand out of view for {} frames", self.missing_frames);
        }
    }
}

/// Smoothing state for one landmark source. Tracks are keyed by handedness,
/// so a left/right swap in the model's output order does not mix them up.
#[derive(Clone, Debug, Default)]
pub struct StabilizationState {
    config: StabilizerConfig,
    tracks: [HandTrack; 2],
    no_hand_frames: u32,
}

impl StabilizationState {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config: config.sanitized(),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Applies new thresholds. Buffers longer than the new window are trimmed
    /// from the oldest end; locks are kept.
    pub fn configure(&mut self, config: StabilizerConfig) {
        self.config = config.sanitized();
        let capacity = self.config.window_size;
        for track in &mut self.tracks {
            while track.buffer.len() > capacity {
                track.buffer.pop_front();
            }
        }
    }

    pub fn track(&self, hand: Handedness) -> &HandTrack {
        &self.tracks[hand.slot()]
    }

    pub fn no_hand_frames(&self) -> u32 {
        self.no_hand_frames
    }

    pub fn current(&self) -> Vec<DetectedGesture> {
        self.tracks
            .iter()
            .filter_map(|track| track.current.clone())
            .collect()
    }

    pub fn reset(&mut self) {
        for track in &mut self.tracks {
            track.clear();
        }
        self.no_hand_frames = 0;
    }

    /// Runs one frame through the classifier and the per-hand vote, returning
    /// the transitions it caused.
    pub fn process_frame(&mut self, hands: &[HandFrame], timestamp: i64) -> Vec<StabilizerEvent> {
        if hands.is_empty() {
            return self.record_empty_frame();
        }

        self.no_hand_frames = 0;
        let mut events = Vec::new();
        let mut seen = [false; 2];
        for hand in hands {
            let slot = hand.handedness.slot();
            if seen[slot] {
                log::warn!(
                    "ignoring second {} hand detected in the same frame",
                    hand.handedness
                );
                continue;
            }
            seen[slot] = true;
            self.tracks[slot].missing_frames = 0;

            let classification = classify_gesture(&hand.landmarks);
            if let Some(gesture) = self.observe(hand.handedness, classification, timestamp) {
                events.push(StabilizerEvent::Locked(gesture));
            }
        }

        // The lock survives a one-handed gap; only the displayed output goes.
        let threshold = self.config.no_hand_threshold;
        for hand in Handedness::ALL {
            if !seen[hand.slot()] {
                self.tracks[hand.slot()].mark_missing(hand, threshold);
            }
        }
        events
    }

    /// Feeds one raw classification into a hand track. Returns the stabilized
    /// gesture when the track locks onto a new category.
    pub fn observe(
        &mut self,
        hand: Handedness,
        classification: Classification,
        timestamp: i64,
    ) -> Option<DetectedGesture> {
        if classification.kind.is_unknown() {
            return None;
        }

        let config = self.config;
        let track = &mut self.tracks[hand.slot()];
        track.push(classification.kind, config.window_size);

        let (kind, votes) = track.majority()?;
        if votes < config.vote_threshold {
            return None;
        }

        let agreement = votes as f32 / config.window_size as f32;
        let confidence = (classification.confidence + agreement * config.confidence_boost)
            .min(config.max_confidence);
        let gesture = DetectedGesture {
            gesture_type: kind,
            confidence,
            hand,
            timestamp,
        };
        track.current = Some(gesture.clone());

        if track.locked == Some(kind) {
            return None;
        }

        log::debug!(
            "{hand} hand locked onto {kind} ({votes}/{} votes, {:.2})",
            track.buffer.len(),
            confidence
        );
        track.locked = Some(kind);
        Some(gesture)
    }

    fn record_empty_frame(&mut self) -> Vec<StabilizerEvent> {
        self.no_hand_frames = self.no_hand_frames.saturating_add(1);
        if self.no_hand_frames < self.config.no_hand_threshold {
            let threshold = self.config.no_hand_threshold;
            for hand in Handedness::ALL {
                self.tracks[hand.slot()].mark_missing(hand, threshold);
            }
            return Vec::new();
        }

        let mut events = Vec::new();
        for hand in Handedness::ALL {
            let track = &mut self.tracks[hand.slot()];
            if track.locked.is_some() {
                log::debug!(
                    "{hand} hand cleared after {} empty frames",
                    self.no_hand_frames
                );
                events.push(StabilizerEvent::Cleared { hand });
            }
            track.clear();
        }
        events
    }
}
