use std::future::Future;
use std::time::{Duration, Instant};

use fatigue_engine::{FatigueMonitor, RingBuffer};
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::notifier::{AlarmEvent, AlarmNotifier};
use crate::source::FrameSource;
use crate::state::{format_runtime, MonitorStatus, SnapshotStore};

const FPS_WINDOW: usize = 30;

/// Frame rate over the last few frame timestamps.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    stamps: RingBuffer<f64>,
}

impl FpsMeter {
    pub fn new(window: usize) -> Self {
        Self {
            stamps: RingBuffer::new(window.max(2)),
        }
    }

    pub fn tick(&mut self, timestamp: f64) {
        self.stamps.push(timestamp);
    }

    pub fn fps(&self) -> f64 {
        let (Some(&oldest), Some(&newest)) = (self.stamps.oldest(), self.stamps.newest()) else {
            return 0.0;
        };
        let span = newest - oldest;
        if span > 0.0 {
            (self.stamps.len() - 1) as f64 / span
        } else {
            0.0
        }
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(FPS_WINDOW)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    /// Input frames, malformed lines included.
    pub frames: u64,
    pub processed: u64,
    pub skipped: u64,
    pub degenerate: u64,
    pub malformed: u64,
    pub alarms: u64,
    pub elapsed: Duration,
}

impl SessionSummary {
    /// Frames handled per wall-clock second.
    pub fn throughput_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Runs frames from `reader` until end of input.
pub async fn run_session<R>(
    config: &Config,
    reader: R,
    store: &SnapshotStore,
    notifier: &AlarmNotifier,
) -> Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
{
    run_session_until(config, reader, store, notifier, std::future::pending()).await
}

/// Like [`run_session`] but also stops when `shutdown` resolves.
pub async fn run_session_until<R, S>(
    config: &Config,
    reader: R,
    store: &SnapshotStore,
    notifier: &AlarmNotifier,
    shutdown: S,
) -> Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut monitor = FatigueMonitor::new(config.detection_config());
    let mut source = FrameSource::new(reader);
    let mut fps = FpsMeter::default();
    let mut summary = SessionSummary::default();
    let mut first_timestamp: Option<f64> = None;
    let started = Instant::now();
    let status_every = config.status_log_every.max(1);
    tokio::pin!(shutdown);

    info!(
        cooldown_secs = config.alarm_cooldown_secs,
        alarm_enabled = config.alarm_enabled,
        measured_duration = config.measure_frame_interval,
        "fatigue session started"
    );

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown requested, stopping session");
                break;
            }
            next = source.next_frame() => next,
        };

        let outcome = match next {
            Ok(Some(frame)) => {
                first_timestamp.get_or_insert(frame.timestamp);
                fps.tick(frame.timestamp);
                monitor.process_frame(frame.landmarks().as_ref(), frame.timestamp)
            }
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                summary.malformed += 1;
                warn!(error = %e, "skipping malformed frame");
                monitor.process_frame(None, source.fallback_timestamp())
            }
            Err(e) => return Err(e),
        };
        summary.frames += 1;

        let snapshot = monitor.snapshot();
        if outcome.alarm {
            summary.alarms += 1;
            if let Err(e) = notifier.notify(AlarmEvent::from_snapshot(&snapshot)) {
                warn!(error = %e, "alarm not queued");
            }
        }

        if summary.frames % status_every == 0 {
            info!(
                frames = summary.frames,
                fps = %format!("{:.1}", fps.fps()),
                level = %snapshot.fatigue_level,
                score = snapshot.fatigue_score,
                blinks = snapshot.total_blinks,
                yawns = snapshot.yawn_count,
                trend = %snapshot.trend,
                "status"
            );
        }

        let runtime = first_timestamp.map_or(0.0, |first| snapshot.timestamp - first);
        store.publish(MonitorStatus {
            detection: snapshot,
            runtime: format_runtime(runtime),
            fps: fps.fps(),
            alarm_enabled: monitor.alarm_gate().is_enabled(),
            alarms_raised: summary.alarms,
        });
    }

    summary.processed = monitor.frames_processed();
    summary.skipped = monitor.skipped_frames();
    summary.degenerate = monitor.degenerate_frames();
    summary.elapsed = started.elapsed();

    info!(
        frames = summary.frames,
        processed = summary.processed,
        skipped = summary.skipped,
        degenerate = summary.degenerate,
        malformed = summary.malformed,
        alarms = summary.alarms,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        avg_fps = %format!("{:.1}", summary.throughput_fps()),
        "fatigue session finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_meter() {
        let mut meter = FpsMeter::new(5);
        assert_eq!(meter.fps(), 0.0);
        meter.tick(1.0);
        assert_eq!(meter.fps(), 0.0);
        for i in 1..=10 {
            meter.tick(1.0 + i as f64 * 0.05);
        }
        // 窗口内 5 个时间戳间隔 0.05s
        assert!((meter.fps() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_summary_throughput() {
        let summary = SessionSummary {
            frames: 300,
            elapsed: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(summary.throughput_fps(), 150.0);
        assert_eq!(SessionSummary::default().throughput_fps(), 0.0);
    }
}
