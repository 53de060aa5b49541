use crate::time::Duration;

/// Tuning of the clock servo
///
/// The defaults are the conventional gPTP servo parameters and are a sensible
/// starting point for most hardware.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoConfig {
    /// Proportional gain of the PI controller
    pub kp: f64,
    /// Integral gain of the PI controller
    pub ki: f64,
    /// Hard bound on the frequency adjustment, in parts per billion
    pub max_frequency_adjustment_ppb: f64,
    /// Offsets above this threshold are corrected by stepping the clock
    /// instead of slewing it
    pub max_phase_adjustment: Duration,
    /// Offsets this far from the running median are discarded as outliers
    pub outlier_threshold: Duration,
    /// Size of the offset history used for filtering and statistics
    pub max_samples: usize,
    /// Offset and adjustment stability bound for lock detection, in parts
    /// per billion
    pub lock_threshold_ppb: f64,
    /// Consecutive stable measurements before the servo reports lock
    pub lock_samples: usize,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            kp: 0.7,
            ki: 0.3,
            max_frequency_adjustment_ppb: 100_000.0,
            max_phase_adjustment: Duration::from_millis(1),
            outlier_threshold: Duration::from_millis(1),
            max_samples: 16,
            lock_threshold_ppb: 5.0,
            lock_samples: 8,
        }
    }
}
