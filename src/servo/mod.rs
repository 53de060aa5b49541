//! The clock servo: a PI controller turning offset measurements into
//! frequency and phase corrections

use arrayvec::ArrayVec;

#[allow(unused_imports)]
use crate::float_polyfill::FloatPolyfill;
use crate::{
    config::ServoConfig,
    time::{Duration, Interval},
};

/// Upper bound for the offset history ring
const MAX_SERVO_SAMPLES: usize = 32;

/// One synchronization measurement produced by a slave port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measurement {
    /// Offset of the local clock to the master, positive when we are ahead
    pub offset: Duration,
    /// Local receive time of the sync that produced this measurement
    pub event_time: crate::time::Time,
}

/// The correction the servo wants applied to the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServoOutput {
    /// A one shot step of the clock, emitted only for offsets beyond the
    /// phase adjustment threshold
    pub phase_correction: Option<Duration>,
    /// The frequency adjustment in parts per billion
    pub frequency_adjustment_ppb: f64,
    /// Whether the servo considers itself locked to the master
    pub locked: bool,
    /// True exactly when `locked` changed with this measurement
    pub lock_changed: bool,
    /// How trustworthy this output is, in `[0, 1]`
    pub confidence: f64,
}

/// PI controller with outlier rejection and lock detection
///
/// One servo exists per domain; it is fed by whichever port currently has the
/// slave role.
#[derive(Debug)]
pub struct Servo {
    config: ServoConfig,
    offsets: ArrayVec<f64, MAX_SERVO_SAMPLES>,
    integral: f64,
    frequency_adjustment_ppb: f64,
    locked: bool,
    consecutive_lock_samples: usize,
    // Welford running statistics over all accepted samples
    sample_count: u64,
    mean_offset: f64,
    m2_offset: f64,
    outliers_rejected: u32,
}

impl Servo {
    pub fn new(config: ServoConfig) -> Self {
        Self {
            config,
            offsets: ArrayVec::new(),
            integral: 0.0,
            frequency_adjustment_ppb: 0.0,
            locked: false,
            consecutive_lock_samples: 0,
            sample_count: 0,
            mean_offset: 0.0,
            m2_offset: 0.0,
            outliers_rejected: 0,
        }
    }

    /// Feed one offset measurement into the controller.
    ///
    /// `sync_interval` is the pacing of the sync messages the measurement
    /// came from; the lock threshold scales with it. Returns `None` when the
    /// measurement was rejected as an outlier.
    pub fn sample(&mut self, measurement: Measurement, sync_interval: Interval) -> Option<ServoOutput> {
        let offset_ns = measurement.offset.nanos_lossy();

        if self.is_outlier(offset_ns) {
            self.outliers_rejected += 1;
            log::debug!("offset {offset_ns} ns rejected as outlier");
            return None;
        }

        self.record_offset(offset_ns);

        // Anti-windup clamp keeps the integral term alone from saturating
        // the output
        let max_integral = self.config.max_frequency_adjustment_ppb / self.config.ki;
        self.integral = (self.integral + offset_ns).clamp(-max_integral, max_integral);

        let unclamped = self.config.kp * offset_ns + self.config.ki * self.integral;
        let frequency_adjustment = unclamped.clamp(
            -self.config.max_frequency_adjustment_ppb,
            self.config.max_frequency_adjustment_ppb,
        );

        let phase_correction =
            if measurement.offset.abs() > self.config.max_phase_adjustment {
                // Beyond this point slewing would take too long; step the
                // clock and start the integrator over
                log::info!("large offset {offset_ns} ns, stepping the clock");
                self.integral = 0.0;
                Some(measurement.offset)
            } else {
                None
            };

        let previous_adjustment = self.frequency_adjustment_ppb;
        self.frequency_adjustment_ppb = frequency_adjustment;

        let lock_changed = self.update_lock(
            offset_ns,
            frequency_adjustment - previous_adjustment,
            sync_interval,
        );

        Some(ServoOutput {
            phase_correction,
            frequency_adjustment_ppb: frequency_adjustment,
            locked: self.locked,
            lock_changed,
            confidence: self.confidence(),
        })
    }

    /// Forget all controller state, used when the slave port or the selected
    /// master changes
    pub fn reset(&mut self) {
        log::debug!("servo reset");
        self.offsets.clear();
        self.integral = 0.0;
        self.frequency_adjustment_ppb = 0.0;
        self.locked = false;
        self.consecutive_lock_samples = 0;
        self.sample_count = 0;
        self.mean_offset = 0.0;
        self.m2_offset = 0.0;
    }

    /// Whether the servo is locked to its master
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// The most recent frequency adjustment in parts per billion
    pub fn frequency_adjustment_ppb(&self) -> f64 {
        self.frequency_adjustment_ppb
    }

    /// Running mean of the accepted offsets in nanoseconds
    pub fn mean_offset_ns(&self) -> f64 {
        self.mean_offset
    }

    /// Running standard deviation of the accepted offsets in nanoseconds
    pub fn offset_std_dev_ns(&self) -> f64 {
        if self.sample_count < 2 {
            return 0.0;
        }
        (self.m2_offset / self.sample_count as f64).sqrt()
    }

    /// Amount of measurements discarded as outliers
    pub fn outliers_rejected(&self) -> u32 {
        self.outliers_rejected
    }

    /// Amount of measurements accepted
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// An offset is an outlier when it is too far from the running median.
    /// The first few samples are always accepted.
    fn is_outlier(&self, offset_ns: f64) -> bool {
        if self.offsets.len() < 3 {
            return false;
        }

        let median = self.median_offset();
        (offset_ns - median).abs() > self.config.outlier_threshold.nanos_lossy()
    }

    fn median_offset(&self) -> f64 {
        let mut sorted: ArrayVec<f64, MAX_SERVO_SAMPLES> = self.offsets.clone();
        sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    fn record_offset(&mut self, offset_ns: f64) {
        let limit = self.config.max_samples.min(MAX_SERVO_SAMPLES);
        while self.offsets.len() >= limit {
            self.offsets.remove(0);
        }
        self.offsets.push(offset_ns);

        self.sample_count += 1;
        let delta = offset_ns - self.mean_offset;
        self.mean_offset += delta / self.sample_count as f64;
        let delta2 = offset_ns - self.mean_offset;
        self.m2_offset += delta * delta2;
    }

    /// Returns whether the lock state flipped
    fn update_lock(&mut self, offset_ns: f64, adjustment_delta: f64, sync_interval: Interval) -> bool {
        // The offset bound scales with the sync pacing: 5 ppb at 125 ms
        // pacing allows 625 ns of offset
        let offset_bound = self.config.lock_threshold_ppb * sync_interval.nanos() / 1e6;
        let stable =
            offset_ns.abs() < offset_bound && adjustment_delta.abs() < self.config.lock_threshold_ppb;

        let was_locked = self.locked;

        if stable {
            self.consecutive_lock_samples += 1;
            if self.consecutive_lock_samples >= self.config.lock_samples {
                self.locked = true;
            }
        } else {
            self.consecutive_lock_samples = 0;
            self.locked = false;
        }

        if self.locked != was_locked {
            if self.locked {
                log::info!("clock servo achieved lock");
            } else {
                log::info!("clock servo lost lock");
            }
            true
        } else {
            false
        }
    }

    /// Stability, lock state and fill level of the history combine into one
    /// confidence figure
    fn confidence(&self) -> f64 {
        if self.sample_count < 2 {
            return 0.0;
        }

        let stability = 1.0 / (1.0 + self.offset_std_dev_ns() / 1_000.0);
        let lock_factor = if self.locked { 1.0 } else { 0.5 };
        let count_factor =
            (self.offsets.len() as f64 / self.config.max_samples as f64).min(1.0);

        stability * lock_factor * count_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    fn measurement(offset: Duration) -> Measurement {
        Measurement {
            offset,
            event_time: Time::default(),
        }
    }

    #[test]
    fn offset_feeds_proportional_and_integral_terms() {
        let mut servo = Servo::new(ServoConfig::default());

        let output = servo
            .sample(
                measurement(Duration::from_nanos(1000)),
                Interval::EIGHT_PER_SECOND,
            )
            .unwrap();

        // kp * 1000 + ki * 1000
        assert_eq!(output.frequency_adjustment_ppb, 1000.0);
        assert!(output.phase_correction.is_none());

        let output = servo
            .sample(
                measurement(Duration::from_nanos(1000)),
                Interval::EIGHT_PER_SECOND,
            )
            .unwrap();

        // kp * 1000 + ki * 2000
        assert_eq!(output.frequency_adjustment_ppb, 1300.0);
    }

    #[test]
    fn output_is_clamped() {
        let mut servo = Servo::new(ServoConfig {
            max_phase_adjustment: Duration::from_secs(1),
            outlier_threshold: Duration::from_secs(1),
            ..Default::default()
        });

        let output = servo
            .sample(
                measurement(Duration::from_micros(500)),
                Interval::EIGHT_PER_SECOND,
            )
            .unwrap();

        assert_eq!(output.frequency_adjustment_ppb, 100_000.0);

        // Even with a saturated integral the output stays bounded
        for _ in 0..10 {
            let output = servo
                .sample(
                    measurement(Duration::from_micros(500)),
                    Interval::EIGHT_PER_SECOND,
                )
                .unwrap();
            assert!(output.frequency_adjustment_ppb.abs() <= 100_000.0);
        }
    }

    #[test]
    fn large_offset_steps_the_clock() {
        let mut servo = Servo::new(ServoConfig::default());

        let offset = Duration::from_millis(2);
        let output = servo
            .sample(measurement(offset), Interval::EIGHT_PER_SECOND)
            .unwrap();

        assert_eq!(output.phase_correction, Some(offset));
        // The integral restarts after a step
        assert_eq!(servo.integral, 0.0);
    }

    #[test]
    fn lock_acquired_after_consecutive_stable_samples() {
        let mut servo = Servo::new(ServoConfig::default());

        // Tiny offsets at 125 ms sync pacing sit well within the 625 ns
        // lock bound, and the adjustment settles quickly
        let mut lock_transitions = 0;
        let mut locked_at = None;

        for i in 0..12 {
            let output = servo
                .sample(
                    measurement(Duration::from_nanos(1)),
                    Interval::EIGHT_PER_SECOND,
                )
                .unwrap();
            if output.lock_changed {
                lock_transitions += 1;
                locked_at = Some(i);
            }
        }

        assert!(servo.locked());
        assert_eq!(lock_transitions, 1);
        // Default lock_samples is 8, reached on the eighth sample
        assert_eq!(locked_at, Some(7));
    }

    #[test]
    fn unstable_offset_drops_lock() {
        let mut servo = Servo::new(ServoConfig::default());

        for _ in 0..8 {
            servo
                .sample(
                    measurement(Duration::from_nanos(1)),
                    Interval::EIGHT_PER_SECOND,
                )
                .unwrap();
        }
        assert!(servo.locked());

        let output = servo
            .sample(
                measurement(Duration::from_micros(700)),
                Interval::EIGHT_PER_SECOND,
            )
            .unwrap();

        assert!(!output.locked);
        assert!(output.lock_changed);
    }

    #[test]
    fn outliers_are_rejected_without_touching_state() {
        let mut servo = Servo::new(ServoConfig::default());

        for _ in 0..4 {
            servo
                .sample(
                    measurement(Duration::from_nanos(100)),
                    Interval::EIGHT_PER_SECOND,
                )
                .unwrap();
        }

        let integral_before = servo.integral;

        // Two milliseconds away from the median of 100 ns
        let rejected = servo.sample(
            measurement(Duration::from_millis(2)),
            Interval::EIGHT_PER_SECOND,
        );

        assert!(rejected.is_none());
        assert_eq!(servo.outliers_rejected(), 1);
        assert_eq!(servo.integral, integral_before);
    }

    #[test]
    fn confidence_grows_with_stable_history() {
        let mut servo = Servo::new(ServoConfig::default());

        let mut last_confidence = 0.0;
        for _ in 0..16 {
            let output = servo
                .sample(
                    measurement(Duration::from_nanos(10)),
                    Interval::EIGHT_PER_SECOND,
                )
                .unwrap();
            last_confidence = output.confidence;
        }

        assert!(last_confidence > 0.9);
        assert!(last_confidence <= 1.0);
    }
}
