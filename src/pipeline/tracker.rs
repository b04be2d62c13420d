use std::time::Instant;

use crate::{
    config::TrackerConfig,
    history::HistoryStore,
    session::{SessionAggregator, SessionId},
    stabilizer::{StabilizationState, StabilizerConfig},
    types::{FrameAnalysis, LandmarkFrame, StabilizerEvent},
};

/// Everything one landmark source owns: smoothing state, live session view
/// and, optionally, the persisted history. Never share one across sources.
#[derive(Debug)]
pub struct GestureTracker {
    stabilizer: StabilizationState,
    aggregator: SessionAggregator,
    store: Option<HistoryStore>,
    session: SessionId,
    frame_number: u64,
    last_frame_at: Option<Instant>,
    started_at: Instant,
}

impl GestureTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_session(config, SessionId::new())
    }

    pub fn with_session(config: &TrackerConfig, session: SessionId) -> Self {
        log::info!("starting gesture session {session}");
        Self {
            stabilizer: StabilizationState::new(config.stabilizer),
            aggregator: SessionAggregator::new(config.recent_capacity, config.metrics_window),
            store: None,
            session,
            frame_number: 0,
            last_frame_at: None,
            started_at: Instant::now(),
        }
    }

    /// Attaches a persisted store; every lock from now on is appended to it.
    pub fn with_store(mut self, mut store: HistoryStore) -> Self {
        store.begin_session();
        self.store = Some(store);
        self
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn stabilizer(&self) -> &StabilizationState {
        &self.stabilizer
    }

    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    pub fn store(&self) -> Option<&HistoryStore> {
        self.store.as_ref()
    }

    pub fn configure_thresholds(&mut self, config: StabilizerConfig) {
        self.stabilizer.configure(config);
        log::info!("stabilizer thresholds updated: {:?}", self.stabilizer.config());
    }

    pub fn process_frame(&mut self, frame: LandmarkFrame) -> FrameAnalysis {
        let started = Instant::now();
        let events = self.stabilizer.process_frame(&frame.hands, frame.timestamp_ms);

        for event in &events {
            if let StabilizerEvent::Locked(gesture) = event {
                self.aggregator.record(gesture);
                if let Some(store) = self.store.as_mut() {
                    store.record(gesture, &self.session);
                }
            }
        }

        let fps = self.last_frame_at.and_then(|last| {
            let elapsed = started.duration_since(last).as_secs_f32();
            (elapsed > 0.0).then(|| 1.0 / elapsed)
        });
        self.last_frame_at = Some(started);

        let processing_time_ms = started.elapsed().as_secs_f32() * 1000.0;
        self.aggregator.record_frame(fps, processing_time_ms);
        self.frame_number += 1;

        FrameAnalysis {
            frame_number: self.frame_number,
            timestamp: frame.timestamp_ms,
            hands: frame.hands,
            events,
            current: self.stabilizer.current(),
            fps,
            processing_time_ms,
        }
    }

    /// Clears smoothing state and the live session view. The persisted
    /// history is kept.
    pub fn reset(&mut self) {
        self.stabilizer.reset();
        self.aggregator.reset();
        self.frame_number = 0;
        self.last_frame_at = None;
        log::info!("session {} reset", self.session);
    }

    pub fn clear_all_data(&mut self) {
        self.reset();
        if let Some(store) = self.store.as_mut() {
            store.clear_all();
        }
    }

    /// Books the session's wall-clock runtime and hands the store back.
    pub fn finish(mut self) -> Option<HistoryStore> {
        let runtime = self.started_at.elapsed().as_millis();
        let mut store = self.store.take()?;
        store.add_runtime(u64::try_from(runtime).unwrap_or(u64::MAX));
        Some(store)
    }
}
