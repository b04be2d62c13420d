//! Hand gesture classification and temporal stabilization over per-frame
//! hand landmarks.
//!
//! Landmarks come from an external hand-pose model (21 points per hand).
//! [`gesture::classify_gesture`] turns one hand into a gesture category,
//! [`stabilizer::StabilizationState`] smooths the per-frame stream into
//! stable lock/clear transitions, and [`session`]/[`history`] aggregate the
//! transitions for display and export. [`pipeline`] wires it all onto a
//! worker thread with at most one frame in flight.

pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod input;
pub mod landmarks;
pub mod pipeline;
pub mod session;
pub mod stabilizer;
pub mod types;

pub use config::{DeliveryMode, TrackerConfig};
pub use error::{Result, TrackerError};
pub use gesture::{FingerStates, classify_gesture};
pub use history::HistoryStore;
pub use pipeline::{
    GestureTracker, TrackerControl, frame_channel, start_source, start_tracker,
};
pub use session::{SessionAggregator, SessionId, SessionStats};
pub use stabilizer::{StabilizationState, StabilizerConfig};
pub use types::{
    Classification, DetectedGesture, FrameAnalysis, GestureKind, HandFrame, Handedness,
    LandmarkFrame, LandmarkPoint, StabilizerEvent,
};
