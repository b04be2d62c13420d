pub mod tracker;
pub mod worker;

pub use tracker::GestureTracker;
pub use worker::{SourceStream, TrackerControl, frame_channel, start_source, start_tracker};
