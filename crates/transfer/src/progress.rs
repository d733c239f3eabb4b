use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Which way the payload flows, seen from the local peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Send => f.write_str("send"),
            Direction::Receive => f.write_str("receive"),
        }
    }
}

/// Snapshot of an ongoing transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub file_name: String,
    pub direction: Direction,
    pub bytes_done: u64,
    pub total: u64,
    pub bytes_per_second: f64,
}

impl TransferProgress {
    /// Completion in percent. An empty file counts as complete.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.bytes_done as f64 * 100.0 / self.total as f64
    }
}

/// Rate-limits progress callbacks to one per interval.
///
/// The first update is always reported; [`finish`](Self::finish) reports
/// unconditionally so the final byte count is never lost.
pub struct ProgressReporter {
    file_name: String,
    direction: Direction,
    total: u64,
    interval: Duration,
    last_report: Option<Instant>,
    speed: SpeedCalculator,
}

impl ProgressReporter {
    pub fn new(
        file_name: impl Into<String>,
        direction: Direction,
        total: u64,
        interval: Duration,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            direction,
            total,
            interval,
            last_report: None,
            speed: SpeedCalculator::new(SPEED_WINDOW),
        }
    }

    /// Records that `bytes_done` bytes have moved so far.
    pub fn update<F: FnMut(TransferProgress)>(&mut self, bytes_done: u64, on_progress: &mut F) {
        self.speed.record(bytes_done);
        let due = self
            .last_report
            .is_none_or(|at| at.elapsed() >= self.interval);
        if due {
            self.report(bytes_done, on_progress);
        }
    }

    /// Emits the closing report regardless of the interval.
    pub fn finish<F: FnMut(TransferProgress)>(&mut self, bytes_done: u64, on_progress: &mut F) {
        self.speed.record(bytes_done);
        self.report(bytes_done, on_progress);
    }

    fn report<F: FnMut(TransferProgress)>(&mut self, bytes_done: u64, on_progress: &mut F) {
        self.last_report = Some(Instant::now());
        on_progress(TransferProgress {
            file_name: self.file_name.clone(),
            direction: self.direction,
            bytes_done,
            total: self.total,
            bytes_per_second: self.speed.bytes_per_second(),
        });
    }
}

/// Byte counts older than this no longer affect the reported speed.
const SPEED_WINDOW: Duration = Duration::from_secs(5);

/// Average rate over the recent past, fed with running byte totals.
pub struct SpeedCalculator {
    window: Duration,
    points: VecDeque<(Instant, u64)>,
}

impl SpeedCalculator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            points: VecDeque::new(),
        }
    }

    /// Notes that `bytes_done` bytes have moved in total as of now.
    pub fn record(&mut self, bytes_done: u64) {
        self.record_at(Instant::now(), bytes_done);
    }

    fn record_at(&mut self, at: Instant, bytes_done: u64) {
        self.points.push_back((at, bytes_done));
        // Keep one point at or before the window edge as the baseline.
        while self.points.len() > 2
            && self
                .points
                .get(1)
                .is_some_and(|&(t, _)| at.duration_since(t) >= self.window)
        {
            self.points.pop_front();
        }
    }

    /// Bytes per second across the window, `0.0` until two points exist.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(&(t0, b0)), Some(&(t1, b1))) = (self.points.front(), self.points.back()) else {
            return 0.0;
        };
        let elapsed = t1.duration_since(t0).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        b1.saturating_sub(b0) as f64 / elapsed
    }
}
