use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    history::HISTORY_CAPACITY,
    session::{METRICS_WINDOW, RECENT_CAPACITY},
    stabilizer::StabilizerConfig,
};

/// How the worker treats frames that queue up while a pass is running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Live sources: only the newest queued frame is processed.
    #[default]
    Latest,
    /// Recordings: every frame is processed in order.
    Sequential,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub stabilizer: StabilizerConfig,
    pub recent_capacity: usize,
    pub history_capacity: usize,
    pub metrics_window: usize,
    pub delivery: DeliveryMode,
    pub history_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            stabilizer: StabilizerConfig::default(),
            recent_capacity: RECENT_CAPACITY,
            history_capacity: HISTORY_CAPACITY,
            metrics_window: METRICS_WINDOW,
            delivery: DeliveryMode::default(),
            history_path: None,
        }
    }
}
