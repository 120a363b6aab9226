//! Export progress reporting.
//!
//! The encode loop reports raw progress on named bars. The reporter turns
//! the active bar's value into a percentage of the expected total
//! (`fps * duration`) and forwards it to a display callback.

use std::sync::mpsc::Sender;

/// Bar advanced once per frame written to the encoder.
pub const FRAME_BAR: &str = "frame_index";

/// Receives raw progress updates from the encode loop.
pub trait ProgressSink {
    fn on_progress(&mut self, bar: &str, value: f64);
}

/// Callback receiving percentages in `[0, 100]`.
pub type PercentCallback = Box<dyn FnMut(f64) + Send>;

/// A callback forwarding every percentage over a channel. Send failures
/// (receiver gone) are ignored so reporting never stalls the encoder.
pub fn channel_callback(tx: Sender<f64>) -> PercentCallback {
    Box::new(move |percent| {
        let _ = tx.send(percent);
    })
}

/// `round(100 * value / total, 2)`, or 0 when the total is not positive.
pub fn percent_of(value: f64, total_units: f64) -> f64 {
    if total_units <= 0.0 || !total_units.is_finite() {
        return 0.0;
    }
    (100.0 * value / total_units * 100.0).round() / 100.0
}

/// Converts raw bar values into a non-decreasing percentage.
pub struct ProgressReporter {
    total_units: f64,
    active_bar: Option<String>,
    last_percent: Option<f64>,
    callback: Option<PercentCallback>,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("total_units", &self.total_units)
            .field("active_bar", &self.active_bar)
            .field("last_percent", &self.last_percent)
            .finish()
    }
}

impl ProgressReporter {
    /// `total_units` is the effective fps multiplied by the source duration.
    pub fn new(total_units: f64, callback: Option<PercentCallback>) -> Self {
        Self {
            total_units,
            active_bar: None,
            last_percent: None,
            callback,
        }
    }

    /// Last percentage pushed to the callback.
    pub fn percent(&self) -> f64 {
        self.last_percent.unwrap_or(0.0)
    }

    pub fn active_bar(&self) -> Option<&str> {
        self.active_bar.as_deref()
    }

    /// Report completion regardless of how many units were counted.
    pub fn complete(&mut self) {
        self.push(100.0);
    }

    fn push(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0).max(self.percent());
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        if let Some(cb) = self.callback.as_mut() {
            cb(percent);
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&mut self, bar: &str, value: f64) {
        if self.active_bar.as_deref() != Some(bar) {
            tracing::debug!(bar, "Progress bar became active");
            self.active_bar = Some(bar.to_string());
        }
        self.push(percent_of(value, self.total_units));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    fn recording_reporter(total: f64) -> (ProgressReporter, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::new(
            total,
            Some(Box::new(move |p| sink.lock().unwrap().push(p))),
        );
        (reporter, seen)
    }

    #[test]
    fn test_percent_rounds_to_two_decimals() {
        assert_eq!(percent_of(1.0, 300.0), 0.33);
        assert_eq!(percent_of(2.0, 3.0), 66.67);
        assert_eq!(percent_of(150.0, 300.0), 50.0);
        assert_eq!(percent_of(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_reporter_scales_active_bar() {
        let (mut reporter, seen) = recording_reporter(300.0);
        reporter.on_progress(FRAME_BAR, 30.0);
        reporter.on_progress(FRAME_BAR, 300.0);
        assert_eq!(*seen.lock().unwrap(), vec![10.0, 100.0]);
        assert_eq!(reporter.active_bar(), Some(FRAME_BAR));
    }

    #[test]
    fn test_reporter_skips_repeats_and_never_decreases() {
        let (mut reporter, seen) = recording_reporter(100.0);
        reporter.on_progress("t", 10.0);
        reporter.on_progress("t", 10.0);
        reporter.on_progress("chunk", 2.0);
        reporter.on_progress("t", 20.0);
        assert_eq!(*seen.lock().unwrap(), vec![10.0, 20.0]);
        assert_eq!(reporter.active_bar(), Some("t"));
    }

    #[test]
    fn test_reporter_clamps_overshoot() {
        let (mut reporter, seen) = recording_reporter(10.0);
        reporter.on_progress(FRAME_BAR, 11.0);
        reporter.complete();
        assert_eq!(*seen.lock().unwrap(), vec![100.0]);
    }

    #[test]
    fn test_channel_callback_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        let mut reporter = ProgressReporter::new(4.0, Some(channel_callback(tx)));
        reporter.on_progress(FRAME_BAR, 1.0);
        assert_eq!(rx.recv().unwrap(), 25.0);
        drop(rx);
        reporter.on_progress(FRAME_BAR, 2.0);
        assert_eq!(reporter.percent(), 50.0);
    }

    proptest! {
        #[test]
        fn prop_percent_is_monotonic(fps in 1u32..120, duration in 0.1f64..600.0, steps in 1usize..200) {
            let total = fps as f64 * duration;
            let mut previous = 0.0;
            for i in 0..=steps {
                let value = total * i as f64 / steps as f64;
                let percent = percent_of(value, total);
                prop_assert!(percent >= previous);
                prop_assert!((0.0..=100.0).contains(&percent));
                previous = percent;
            }
        }
    }
}
