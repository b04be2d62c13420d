use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use crossbeam_channel::{Receiver, Sender, bounded, never, select, unbounded};

use super::tracker::GestureTracker;
use crate::{
    config::DeliveryMode,
    error::{Result, TrackerError},
    input::LandmarkSource,
    stabilizer::StabilizerConfig,
    types::{FrameAnalysis, LandmarkFrame},
};

#[derive(Clone, Debug)]
pub enum TrackerControl {
    Reset,
    ClearAllData,
    Configure(StabilizerConfig),
}

/// Frame channel matching a delivery mode. `Sequential` gets a one-slot
/// channel so the source waits for the tracker. `Latest` never blocks the
/// source; the tracker drains the queue and keeps only the newest frame.
pub fn frame_channel(delivery: DeliveryMode) -> (Sender<LandmarkFrame>, Receiver<LandmarkFrame>) {
    match delivery {
        DeliveryMode::Sequential => bounded(1),
        DeliveryMode::Latest => unbounded(),
    }
}

/// Runs the tracker on its own thread. Frames are processed one at a time;
/// control messages are applied between passes. When the frame channel
/// closes the tracker is handed back with its state intact, so a paused
/// source can resume where it left off.
pub fn start_tracker(
    tracker: GestureTracker,
    delivery: DeliveryMode,
    frame_rx: Receiver<LandmarkFrame>,
    control_rx: Receiver<TrackerControl>,
    analysis_tx: Sender<FrameAnalysis>,
) -> thread::JoinHandle<GestureTracker> {
    thread::spawn(move || run_tracker_loop(tracker, delivery, frame_rx, control_rx, analysis_tx))
}

fn run_tracker_loop(
    mut tracker: GestureTracker,
    delivery: DeliveryMode,
    frame_rx: Receiver<LandmarkFrame>,
    control_rx: Receiver<TrackerControl>,
    analysis_tx: Sender<FrameAnalysis>,
) -> GestureTracker {
    log::info!(
        "gesture tracker running ({delivery:?} delivery, session {})",
        tracker.session()
    );

    let idle = never();
    let mut controls_open = true;
    loop {
        select! {
            recv(if controls_open { &control_rx } else { &idle }) -> msg => match msg {
                Ok(control) => apply_control(&mut tracker, control),
                Err(_) => controls_open = false,
            },
            recv(frame_rx) -> msg => {
                let Ok(mut frame) = msg else {
                    break;
                };
                if delivery == DeliveryMode::Latest {
                    frame = latest_frame(frame, &frame_rx);
                }
                // Controls that raced the frame take effect before it.
                while let Ok(control) = control_rx.try_recv() {
                    apply_control(&mut tracker, control);
                }

                let analysis = tracker.process_frame(frame);
                if analysis_tx.send(analysis).is_err() {
                    log::warn!("frame analysis receiver dropped, stopping tracker");
                    break;
                }
            }
        }
    }

    log::info!("gesture tracker stopped");
    tracker
}

fn apply_control(tracker: &mut GestureTracker, control: TrackerControl) {
    match control {
        TrackerControl::Reset => tracker.reset(),
        TrackerControl::ClearAllData => tracker.clear_all_data(),
        TrackerControl::Configure(config) => tracker.configure_thresholds(config),
    }
}

fn latest_frame(mut frame: LandmarkFrame, frame_rx: &Receiver<LandmarkFrame>) -> LandmarkFrame {
    // Drop stale frames if the tracker fell behind to avoid backlog.
    let mut dropped = 0usize;
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
        dropped += 1;
    }
    if dropped > 0 {
        log::debug!("dropped {dropped} stale frames");
    }
    frame
}

/// Handle to a thread pumping a [`LandmarkSource`] into the tracker.
#[derive(Debug)]
pub struct SourceStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<Result<u64>>>,
}

impl SourceStream {
    /// Stops delivery and returns the number of frames forwarded.
    pub fn stop(mut self) -> Result<u64> {
        self.stop.store(true, Ordering::SeqCst);
        self.join_inner()
    }

    /// Waits for the source to run dry.
    pub fn join(mut self) -> Result<u64> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<u64> {
        match self.handle.take().map(thread::JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(_)) => {
                log::error!("landmark source thread panicked");
                Err(TrackerError::SourcePanicked)
            }
            None => Ok(0),
        }
    }
}

impl Drop for SourceStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Pulls frames from `source` until it runs dry, is stopped, or the tracker
/// goes away. Pair it with [`frame_channel`]: with [`DeliveryMode::Latest`]
/// every frame is queued and stale ones are discarded on the tracker side,
/// so the frame the tracker picks up next is always the newest.
pub fn start_source<S: LandmarkSource>(
    mut source: S,
    frame_tx: Sender<LandmarkFrame>,
) -> SourceStream {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || -> Result<u64> {
        let mut forwarded = 0u64;
        while !stop_flag.load(Ordering::SeqCst) {
            let Some(frame) = source.next_frame()? else {
                break;
            };
            if frame_tx.send(frame).is_err() {
                break;
            }
            forwarded += 1;
        }
        log::info!("landmark source finished after {forwarded} frames");
        Ok(forwarded)
    });

    SourceStream {
        stop,
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::{bounded, unbounded};

    use super::*;
    use crate::{
        config::TrackerConfig,
        gesture::fixtures,
        types::{GestureKind, HandFrame, Handedness},
    };

    struct VecSource(std::vec::IntoIter<LandmarkFrame>);

    struct BrokenSource;

    impl LandmarkSource for BrokenSource {
        fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
            panic!("landmark model crashed");
        }
    }

    impl LandmarkSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
            Ok(self.0.next())
        }
    }

    fn peace_frames(count: i64) -> Vec<LandmarkFrame> {
        (0..count)
            .map(|i| LandmarkFrame {
                timestamp_ms: i,
                hands: vec![HandFrame::new(fixtures::peace(), Handedness::Left, 0.9)],
            })
            .collect()
    }

    #[test]
    fn test_sequential_replay_processes_every_frame() {
        let (frame_tx, frame_rx) = bounded(1);
        let (_control_tx, control_rx) = unbounded();
        let (analysis_tx, analysis_rx) = unbounded();

        let tracker = GestureTracker::new(&TrackerConfig::default());
        let worker = start_tracker(
            tracker,
            DeliveryMode::Sequential,
            frame_rx,
            control_rx,
            analysis_tx,
        );
        let source = start_source(VecSource(peace_frames(9).into_iter()), frame_tx);

        assert_eq!(source.join().unwrap(), 9);
        let tracker = worker.join().unwrap();

        let analyses: Vec<FrameAnalysis> = analysis_rx.try_iter().collect();
        assert_eq!(analyses.len(), 9);
        let locks: Vec<_> = analyses.iter().flat_map(|a| a.locked_gestures()).collect();
        assert_eq!(locks.len(), 1);
        assert_eq!(locks[0].gesture_type, GestureKind::Peace);
        assert_eq!(locks[0].timestamp, 4);

        // State survives the end of delivery.
        assert_eq!(
            tracker.stabilizer().track(Handedness::Left).locked(),
            Some(GestureKind::Peace)
        );
    }

    #[test]
    fn test_reset_control_applies_before_next_frame() {
        let (frame_tx, frame_rx) = unbounded();
        let (control_tx, control_rx) = unbounded();
        let (analysis_tx, analysis_rx) = unbounded();

        for frame in peace_frames(5) {
            frame_tx.send(frame).unwrap();
        }
        let worker = start_tracker(
            GestureTracker::new(&TrackerConfig::default()),
            DeliveryMode::Sequential,
            frame_rx,
            control_rx,
            analysis_tx,
        );
        for _ in 0..5 {
            analysis_rx.recv().unwrap();
        }

        control_tx.send(TrackerControl::Reset).unwrap();
        for frame in peace_frames(1) {
            frame_tx.send(frame).unwrap();
        }
        drop(frame_tx);

        let analysis = analysis_rx.recv().unwrap();
        assert_eq!(analysis.frame_number, 1);
        assert!(analysis.current.is_empty());

        let tracker = worker.join().unwrap();
        assert_eq!(
            tracker.stabilizer().track(Handedness::Left).buffer_len(),
            1
        );
    }

    #[test]
    fn test_latest_delivery_skips_stale_frames() {
        let (frame_tx, frame_rx) = unbounded();
        let (_control_tx, control_rx) = unbounded();
        let (analysis_tx, analysis_rx) = unbounded();

        for frame in peace_frames(6) {
            frame_tx.send(frame).unwrap();
        }
        drop(frame_tx);

        let worker = start_tracker(
            GestureTracker::new(&TrackerConfig::default()),
            DeliveryMode::Latest,
            frame_rx,
            control_rx,
            analysis_tx,
        );
        worker.join().unwrap();

        let analyses: Vec<FrameAnalysis> = analysis_rx.try_iter().collect();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].timestamp, 5);
    }

    #[test]
    fn test_latest_source_keeps_newest_frame_for_busy_tracker() {
        let (frame_tx, frame_rx) = frame_channel(DeliveryMode::Latest);

        // Nobody is reading yet, as when the tracker is stuck in a long pass.
        let source = start_source(VecSource(peace_frames(5).into_iter()), frame_tx);
        assert_eq!(source.join().unwrap(), 5);

        let first = frame_rx.recv().unwrap();
        assert_eq!(latest_frame(first, &frame_rx).timestamp_ms, 4);
        assert!(frame_rx.try_recv().is_err());
    }

    #[test]
    fn test_latest_delivery_end_to_end_processes_newest() {
        let (frame_tx, frame_rx) = frame_channel(DeliveryMode::Latest);
        let (_control_tx, control_rx) = unbounded();
        let (analysis_tx, analysis_rx) = unbounded();

        let source = start_source(VecSource(peace_frames(5).into_iter()), frame_tx);
        source.join().unwrap();

        let worker = start_tracker(
            GestureTracker::new(&TrackerConfig::default()),
            DeliveryMode::Latest,
            frame_rx,
            control_rx,
            analysis_tx,
        );
        worker.join().unwrap();

        let timestamps: Vec<i64> = analysis_rx.try_iter().map(|a| a.timestamp).collect();
        assert_eq!(timestamps, vec![4]);
    }

    #[test]
    fn test_sequential_channel_holds_one_frame() {
        let (frame_tx, _frame_rx) = frame_channel(DeliveryMode::Sequential);
        assert_eq!(frame_tx.capacity(), Some(1));
    }

    #[test]
    fn test_source_panic_is_reported() {
        let (frame_tx, _frame_rx) = frame_channel(DeliveryMode::Sequential);
        let source = start_source(BrokenSource, frame_tx);
        assert!(matches!(source.join(), Err(TrackerError::SourcePanicked)));
    }
}
