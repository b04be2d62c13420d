use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

pub const NUM_LANDMARKS: usize = 21;

/// Normalized landmark position. `x`/`y` are relative to the frame, `z` is
/// relative depth and may be zero when the model does not provide it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }

    pub(crate) const ALL: [Handedness; 2] = [Handedness::Left, Handedness::Right];
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Handedness {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("left") {
            Ok(Handedness::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(Handedness::Right)
        } else {
            Err(TrackerError::InvalidFrame(format!(
                "unknown handedness label {s:?}"
            )))
        }
    }
}

/// One detected hand as delivered by the landmark model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    pub landmarks: Vec<LandmarkPoint>,
    pub handedness: Handedness,
    #[serde(default)]
    pub handedness_confidence: f32,
}

impl HandFrame {
    pub fn new(landmarks: Vec<LandmarkPoint>, handedness: Handedness, confidence: f32) -> Self {
        Self {
            landmarks,
            handedness,
            handedness_confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= NUM_LANDMARKS
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    #[default]
    Unknown,
    OpenPalm,
    Fist,
    Pinch,
    Pointing,
    ThumbsUp,
    ThumbsDown,
    Peace,
    OkSign,
}

impl GestureKind {
    pub const ALL: [GestureKind; 9] = [
        GestureKind::Unknown,
        GestureKind::OpenPalm,
        GestureKind::Fist,
        GestureKind::Pinch,
        GestureKind::Pointing,
        GestureKind::ThumbsUp,
        GestureKind::ThumbsDown,
        GestureKind::Peace,
        GestureKind::OkSign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Unknown => "unknown",
            GestureKind::OpenPalm => "open_palm",
            GestureKind::Fist => "fist",
            GestureKind::Pinch => "pinch",
            GestureKind::Pointing => "pointing",
            GestureKind::ThumbsUp => "thumbs_up",
            GestureKind::ThumbsDown => "thumbs_down",
            GestureKind::Peace => "peace",
            GestureKind::OkSign => "ok_sign",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GestureKind::Unknown => "Unknown",
            GestureKind::OpenPalm => "Open Palm",
            GestureKind::Fist => "Fist",
            GestureKind::Pinch => "Pinch",
            GestureKind::Pointing => "Pointing",
            GestureKind::ThumbsUp => "Thumbs Up",
            GestureKind::ThumbsDown => "Thumbs Down",
            GestureKind::Peace => "Peace",
            GestureKind::OkSign => "OK Sign",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GestureKind::Unknown => "⋯ ",
            GestureKind::OpenPalm => "🖐 ",
            GestureKind::Fist => "✊ ",
            GestureKind::Pinch => "🤏 ",
            GestureKind::Pointing => "☝️ ",
            GestureKind::ThumbsUp => "👍 ",
            GestureKind::ThumbsDown => "👎 ",
            GestureKind::Peace => "✌️ ",
            GestureKind::OkSign => "👌 ",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, GestureKind::Unknown)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TrackerError::InvalidFrame(format!("unknown gesture type {s:?}")))
    }
}

/// Raw per-frame classifier output for a single hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub kind: GestureKind,
    pub confidence: f32,
}

impl Classification {
    pub fn new(kind: GestureKind, confidence: f32) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn unknown() -> Self {
        Self::new(GestureKind::Unknown, 0.0)
    }
}

/// Stabilized gesture, produced when a hand track locks onto a category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedGesture {
    pub gesture_type: GestureKind,
    pub confidence: f32,
    pub hand: Handedness,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl DetectedGesture {
    pub fn display_text(&self) -> String {
        format!(
            "{}{} ({:.0}%, {})",
            self.gesture_type.emoji(),
            self.gesture_type.display_name(),
            self.confidence * 100.0,
            self.hand
        )
    }
}

/// Input to one pass of the tracker: every hand seen in a single frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    #[serde(default)]
    pub hands: Vec<HandFrame>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StabilizerEvent {
    Locked(DetectedGesture),
    Cleared { hand: Handedness },
}

/// Per-frame output handed to renderers and listeners.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub frame_number: u64,
    pub timestamp: i64,
    /// Input hands, untouched.
    pub hands: Vec<HandFrame>,
    /// Transitions committed during this frame.
    pub events: Vec<StabilizerEvent>,
    /// Current stable gesture of every locked hand track.
    pub current: Vec<DetectedGesture>,
    pub fps: Option<f32>,
    pub processing_time_ms: f32,
}

impl FrameAnalysis {
    pub fn locked_gestures(&self) -> impl Iterator<Item = &DetectedGesture> {
        self.events.iter().filter_map(|event| match event {
            StabilizerEvent::Locked(gesture) => Some(gesture),
            StabilizerEvent::Cleared { .. } => None,
        })
    }
}
