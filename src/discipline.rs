//! Applies servo output to the hardware clock

use crate::{clock::Clock, servo::ServoOutput, time::Duration};

/// The adapter between the servo and the hardware clock
///
/// Frequency adjustments are continuous and happen on every servo output;
/// phase steps are rare and disruptive. When the hardware clamps or rejects
/// an adjustment the adapter records a warning and carries on: the servo is
/// deliberately not told, so that its integral state stays consistent with
/// what it asked for.
#[derive(Debug)]
pub struct ClockDiscipline<C> {
    clock: C,
    applied_frequency_ppb: f64,
    phase_steps_applied: u32,
    adjustment_warnings: u32,
}

impl<C: Clock> ClockDiscipline<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            applied_frequency_ppb: 0.0,
            phase_steps_applied: 0,
            adjustment_warnings: 0,
        }
    }

    /// Apply one servo output to the hardware
    pub fn apply(&mut self, output: &ServoOutput) {
        // The slave is ahead of the master by the measured offset, so the
        // clock has to move back by it
        if let Some(offset) = output.phase_correction {
            match self.clock.adjust_phase(-offset) {
                Ok(()) => {
                    self.phase_steps_applied += 1;
                    log::info!("stepped clock by {}", -offset);
                }
                Err(error) => {
                    self.adjustment_warnings += 1;
                    log::warn!("clock rejected phase step: {:?}", error);
                }
            }
        }

        match self.clock.adjust_frequency(-output.frequency_adjustment_ppb) {
            Ok(applied) => {
                if applied != -output.frequency_adjustment_ppb {
                    self.adjustment_warnings += 1;
                    log::warn!(
                        "clock clamped frequency adjustment from {} to {} ppb",
                        -output.frequency_adjustment_ppb,
                        applied
                    );
                }
                self.applied_frequency_ppb = applied;
            }
            Err(error) => {
                self.adjustment_warnings += 1;
                log::warn!("clock rejected frequency adjustment: {:?}", error);
            }
        }
    }

    /// The current time of the underlying clock
    pub fn now(&self) -> crate::time::Time {
        self.clock.now()
    }

    /// The frequency adjustment the hardware actually runs at
    pub fn applied_frequency_ppb(&self) -> f64 {
        self.applied_frequency_ppb
    }

    /// Amount of phase steps applied since startup
    pub fn phase_steps_applied(&self) -> u32 {
        self.phase_steps_applied
    }

    /// Amount of clamped or rejected adjustments
    pub fn adjustment_warnings(&self) -> u32 {
        self.adjustment_warnings
    }

    /// Read access to the underlying clock
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    #[derive(Debug, Default)]
    struct TestClock {
        frequency_ppb: f64,
        steps: std::vec::Vec<Duration>,
        clamp_at_ppb: Option<f64>,
    }

    impl Clock for TestClock {
        type Error = core::convert::Infallible;

        fn now(&self) -> Time {
            Time::default()
        }

        fn adjust_frequency(&mut self, ppb: f64) -> Result<f64, Self::Error> {
            let applied = match self.clamp_at_ppb {
                Some(limit) => ppb.clamp(-limit, limit),
                None => ppb,
            };
            self.frequency_ppb = applied;
            Ok(applied)
        }

        fn adjust_phase(&mut self, offset: Duration) -> Result<(), Self::Error> {
            self.steps.push(offset);
            Ok(())
        }
    }

    fn output(phase: Option<Duration>, ppb: f64) -> ServoOutput {
        ServoOutput {
            phase_correction: phase,
            frequency_adjustment_ppb: ppb,
            locked: false,
            lock_changed: false,
            confidence: 0.5,
        }
    }

    #[test]
    fn frequency_is_negated_towards_the_master() {
        let mut discipline = ClockDiscipline::new(TestClock::default());

        // We run 100 ppb fast, so the clock must slow down
        discipline.apply(&output(None, 100.0));
        assert_eq!(discipline.clock().frequency_ppb, -100.0);
        assert_eq!(discipline.applied_frequency_ppb(), -100.0);
        assert_eq!(discipline.adjustment_warnings(), 0);
    }

    #[test]
    fn phase_step_moves_clock_back_by_the_offset() {
        let mut discipline = ClockDiscipline::new(TestClock::default());

        discipline.apply(&output(Some(Duration::from_millis(2)), 0.0));
        assert_eq!(
            discipline.clock().steps,
            [-Duration::from_millis(2)]
        );
        assert_eq!(discipline.phase_steps_applied(), 1);
    }

    #[test]
    fn clamped_adjustment_warns_and_records_reality() {
        let mut discipline = ClockDiscipline::new(TestClock {
            clamp_at_ppb: Some(50.0),
            ..Default::default()
        });

        discipline.apply(&output(None, 100.0));
        assert_eq!(discipline.applied_frequency_ppb(), -50.0);
        assert_eq!(discipline.adjustment_warnings(), 1);
    }
}
