use arrayvec::ArrayVec;

use crate::time::Duration;

const WINDOW_SIZE: usize = 8;

/// Median filter over the most recent link delay values
///
/// A median tolerates the occasional wild measurement far better than an
/// average, which matters because a single queued frame in a switch shows up
/// as a large delay spike.
#[derive(Debug, Default)]
pub(crate) struct MedianFilter {
    window: ArrayVec<Duration, WINDOW_SIZE>,
}

impl MedianFilter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn absorb(&mut self, value: Duration) {
        if self.window.is_full() {
            self.window.remove(0);
        }
        self.window.push(value);
    }

    pub(crate) fn median(&self) -> Option<Duration> {
        if self.window.is_empty() {
            return None;
        }

        let mut sorted: ArrayVec<Duration, WINDOW_SIZE> = self.window.clone();
        sorted.sort_unstable();

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2)
        } else {
            Some(sorted[mid])
        }
    }

    pub(crate) fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_window() {
        let mut filter = MedianFilter::new();
        for value in [30, 10, 20] {
            filter.absorb(Duration::from_nanos(value));
        }
        assert_eq!(filter.median(), Some(Duration::from_nanos(20)));
    }

    #[test]
    fn median_of_even_window() {
        let mut filter = MedianFilter::new();
        for value in [10, 20, 30, 40] {
            filter.absorb(Duration::from_nanos(value));
        }
        assert_eq!(filter.median(), Some(Duration::from_nanos(25)));
    }

    #[test]
    fn spike_does_not_move_the_median_much() {
        let mut filter = MedianFilter::new();
        for _ in 0..7 {
            filter.absorb(Duration::from_nanos(100));
        }
        filter.absorb(Duration::from_micros(50));

        assert_eq!(filter.median(), Some(Duration::from_nanos(100)));
    }

    #[test]
    fn window_slides() {
        let mut filter = MedianFilter::new();
        for _ in 0..8 {
            filter.absorb(Duration::from_nanos(100));
        }
        for _ in 0..8 {
            filter.absorb(Duration::from_nanos(200));
        }
        assert_eq!(filter.median(), Some(Duration::from_nanos(200)));
    }
}
