//! In-process stand-in for the device driver.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::driver::{Driver, EventCallback, SampleCallback, RET_SUCCESS};
use crate::payload::{ChannelData, DiscreteEvent, SampleEvent};

/// Driver with one callback slot per stream kind, like the real one.
///
/// `emit_*` invokes whatever callback is installed on the calling thread, so
/// any thread can play the role of a driver thread.
pub struct SimDriver {
    sample: Mutex<Option<SampleCallback>>,
    event: Mutex<Option<EventCallback>>,
    install_status: AtomicI32,
    sample_registrations: AtomicUsize,
    event_registrations: AtomicUsize,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    pub fn new() -> Self {
        SimDriver {
            sample: Mutex::new(None),
            event: Mutex::new(None),
            install_status: AtomicI32::new(RET_SUCCESS),
            sample_registrations: AtomicUsize::new(0),
            event_registrations: AtomicUsize::new(0),
        }
    }

    /// Makes subsequent callback installations fail with `status`.
    /// Uninstalling always succeeds.
    pub fn refuse_with(&self, status: i32) {
        self.install_status.store(status, Ordering::Relaxed);
    }

    pub fn accept(&self) {
        self.install_status.store(RET_SUCCESS, Ordering::Relaxed);
    }

    /// Returns the callback's status, or `None` if no callback is installed.
    pub fn emit_sample(&self, sample: SampleEvent) -> Option<i32> {
        let callback = *self.sample.lock();
        callback.map(|callback| callback(sample))
    }

    pub fn emit_event(&self, event: DiscreteEvent) -> Option<i32> {
        let callback = *self.event.lock();
        callback.map(|callback| callback(event))
    }

    pub fn has_sample_callback(&self) -> bool {
        self.sample.lock().is_some()
    }

    pub fn has_event_callback(&self) -> bool {
        self.event.lock().is_some()
    }

    /// Successful sample callback installations so far.
    pub fn sample_registrations(&self) -> usize {
        self.sample_registrations.load(Ordering::Relaxed)
    }

    pub fn event_registrations(&self) -> usize {
        self.event_registrations.load(Ordering::Relaxed)
    }

    fn check_install(&self, installing: bool) -> i32 {
        if installing {
            self.install_status.load(Ordering::Relaxed)
        } else {
            RET_SUCCESS
        }
    }
}

impl Driver for SimDriver {
    fn set_sample_callback(&self, callback: Option<SampleCallback>) -> i32 {
        let status = self.check_install(callback.is_some());
        if status != RET_SUCCESS {
            return status;
        }
        if callback.is_some() {
            self.sample_registrations.fetch_add(1, Ordering::Relaxed);
        }
        *self.sample.lock() = callback;
        RET_SUCCESS
    }

    fn set_event_callback(&self, callback: Option<EventCallback>) -> i32 {
        let status = self.check_install(callback.is_some());
        if status != RET_SUCCESS {
            return status;
        }
        if callback.is_some() {
            self.event_registrations.fetch_add(1, Ordering::Relaxed);
        }
        *self.event.lock() = callback;
        RET_SUCCESS
    }
}

/// Deterministic sample whose fields are derived from `seq`.
pub fn synthetic_sample(seq: u64) -> SampleEvent {
    let t = seq as f64;
    let channel = |offset: f64| ChannelData {
        gaze_x: (t * 0.01 + offset).sin() * 512.0 + 512.0,
        gaze_y: (t * 0.013 + offset).cos() * 384.0 + 384.0,
        diameter: 3.5 + offset,
        position_x: offset * 30.0,
        position_y: 0.0,
        position_z: 600.0,
    };
    SampleEvent {
        timestamp: seq as i64 * 2_000,
        left: channel(0.0),
        right: channel(1.0),
        plane_number: 1,
    }
}

/// Deterministic event whose fields are derived from `seq`.
pub fn synthetic_event(seq: u64) -> DiscreteEvent {
    let start = seq as i64 * 100_000;
    DiscreteEvent {
        event_type: b'F',
        channel: if seq % 2 == 0 { b'l' } else { b'r' },
        start_time: start,
        end_time: start + 80_000,
        duration: 80_000,
        position_x: (seq % 1024) as f64,
        position_y: (seq % 768) as f64,
    }
}

/// Paces a loop at a fixed rate. Each deadline is one period after the
/// previous one, so oversleeping is caught up instead of accumulating.
#[derive(Debug)]
pub struct Pacer {
    period: Duration,
    next: Instant,
}

impl Pacer {
    /// `rate` ticks per second, starting now. A rate of zero is treated as one.
    pub fn new(rate: u32) -> Self {
        Self::starting_at(Instant::now(), rate)
    }

    pub fn starting_at(start: Instant, rate: u32) -> Self {
        Pacer {
            period: Duration::from_secs(1) / rate.max(1),
            next: start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Moves to the next tick and returns its deadline.
    pub fn advance(&mut self) -> Instant {
        self.next += self.period;
        self.next
    }

    /// Sleeps until the next tick, or returns at once when behind.
    pub fn wait(&mut self) {
        let deadline = self.advance();
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    extern "system" fn echo_plane(sample: SampleEvent) -> i32 {
        sample.plane_number
    }

    extern "system" fn echo_channel(event: DiscreteEvent) -> i32 {
        event.channel as i32
    }

    #[fixture]
    fn driver() -> SimDriver {
        SimDriver::new()
    }

    #[rstest]
    fn test_emit_without_callback(driver: SimDriver) {
        assert_eq!(driver.emit_sample(synthetic_sample(0)), None);
        assert_eq!(driver.emit_event(synthetic_event(0)), None);
    }

    #[rstest]
    fn test_emit_invokes_installed_callback(driver: SimDriver) {
        assert_eq!(driver.set_sample_callback(Some(echo_plane)), RET_SUCCESS);
        assert_eq!(driver.set_event_callback(Some(echo_channel)), RET_SUCCESS);

        assert_eq!(driver.emit_sample(synthetic_sample(3)), Some(1));
        assert_eq!(driver.emit_event(synthetic_event(3)), Some(b'r' as i32));
        assert_eq!(driver.sample_registrations(), 1);
        assert_eq!(driver.event_registrations(), 1);

        assert_eq!(driver.set_sample_callback(None), RET_SUCCESS);
        assert!(!driver.has_sample_callback());
        assert!(driver.has_event_callback());
    }

    #[rstest]
    fn test_refused_install_keeps_slot(driver: SimDriver) {
        driver.refuse_with(0);
        assert_eq!(driver.set_sample_callback(Some(echo_plane)), 0);
        assert!(!driver.has_sample_callback());
        assert_eq!(driver.sample_registrations(), 0);

        driver.accept();
        assert_eq!(driver.set_sample_callback(Some(echo_plane)), RET_SUCCESS);
        assert!(driver.has_sample_callback());
    }

    #[rstest]
    fn test_synthetic_payloads_are_deterministic() {
        assert_eq!(synthetic_sample(17), synthetic_sample(17));
        assert_ne!(synthetic_sample(17), synthetic_sample(18));
        assert_eq!(synthetic_event(5).duration, 80_000);
    }

    #[rstest]
    #[case(1, Duration::from_secs(1))]
    #[case(500, Duration::from_millis(2))]
    #[case(0, Duration::from_secs(1))]
    fn test_pacer_period(#[case] rate: u32, #[case] expected: Duration) {
        assert_eq!(Pacer::new(rate).period(), expected);
    }

    #[rstest]
    fn test_pacer_deadlines_advance_by_period() {
        let start = Instant::now();
        let mut pacer = Pacer::starting_at(start, 1_000);
        let mut last = start;
        for tick in 1..=10_000u32 {
            let deadline = pacer.advance();
            assert_eq!(deadline - last, Duration::from_millis(1));
            last = deadline;
            if tick % 2_500 == 0 {
                assert_eq!(deadline - start, Duration::from_millis(tick.into()));
            }
        }
    }
}
