//! The standard peer to peer delay measurement, *IEEE 802.1AS-2021 section
//! 16.4.3.2*

use arrayvec::ArrayVec;

use super::filter::MedianFilter;
#[allow(unused_imports)]
use crate::float_polyfill::FloatPolyfill;
use crate::{
    config::PathDelayProfile,
    time::{Duration, Time},
};

/// Entries in the rate ratio window: one more than the window length so the
/// oldest and newest exchange bracket the configured number of intervals
const MAX_RATE_SAMPLES: usize = 16;

/// Consecutive rate ratio rejections before the link is declared unusable
const MAX_RATE_REJECTIONS: u8 = 3;

/// Consecutive response timeouts before the link is declared unusable
const MAX_LOST_RESPONSES: u8 = 3;

/// The measurement state machine of one port
///
/// Initiator side of the three message exchange: we send Pdelay_Req (t1),
/// the peer timestamps its arrival (t2) and its response transmission (t3),
/// and we timestamp the response arrival (t4).
#[derive(Debug)]
pub(crate) enum LinkDelayState {
    /// The port is not measuring at all
    NotEnabled,
    /// The port just came up and still has to send its first request
    InitialSend,
    /// The last exchange failed, restart with the next timer
    Reset,
    /// Waiting for the request interval timer
    Send,
    /// A request is in flight
    WaitResp {
        id: u16,
        t1: Option<Time>,
        deadline: Duration,
    },
    /// The response arrived, its follow up has not
    WaitRespFollowUp {
        id: u16,
        t1: Option<Time>,
        t2: Time,
        t4: Time,
        deadline: Duration,
    },
}

/// Counters the standard calculator exposes through observability
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PdelayStatistics {
    pub(crate) exchanges_completed: u32,
    pub(crate) response_timeouts: u32,
    pub(crate) rate_ratio_rejections: u32,
    pub(crate) invalid_exchanges: u32,
    pub(crate) negative_delay_clamps: u32,
    pub(crate) mismatched_responses: u32,
}

#[derive(Debug)]
pub(crate) struct StandardP2P {
    profile: PathDelayProfile,
    pub(crate) state: LinkDelayState,
    filter: MedianFilter,
    neighbor_rate_ratio: f64,
    /// (t3, t4) pairs of recent exchanges for equation 16-1
    rate_window: ArrayVec<(Time, Time), MAX_RATE_SAMPLES>,
    as_capable: bool,
    valid_exchanges: u8,
    consecutive_rejections: u8,
    consecutive_timeouts: u8,
    pub(crate) stats: PdelayStatistics,
}

impl StandardP2P {
    pub(crate) fn new(profile: PathDelayProfile) -> Self {
        Self {
            profile,
            state: LinkDelayState::NotEnabled,
            filter: MedianFilter::new(),
            neighbor_rate_ratio: 1.0,
            rate_window: ArrayVec::new(),
            as_capable: false,
            valid_exchanges: 0,
            consecutive_rejections: 0,
            consecutive_timeouts: 0,
            stats: PdelayStatistics::default(),
        }
    }

    pub(crate) fn enable(&mut self) {
        if matches!(self.state, LinkDelayState::NotEnabled) {
            self.state = LinkDelayState::InitialSend;
        }
    }

    pub(crate) fn disable(&mut self) {
        self.state = LinkDelayState::NotEnabled;
        self.as_capable = false;
        self.valid_exchanges = 0;
        self.consecutive_rejections = 0;
        self.consecutive_timeouts = 0;
        self.rate_window.clear();
        self.filter.reset();
    }

    /// Whether the interval timer should trigger a new request right now
    pub(crate) fn ready_to_send(&self) -> bool {
        matches!(
            self.state,
            LinkDelayState::InitialSend | LinkDelayState::Reset | LinkDelayState::Send
        )
    }

    /// Record that a request with this sequence id left the port
    pub(crate) fn request_sent(&mut self, id: u16, deadline: Duration) {
        self.state = LinkDelayState::WaitResp {
            id,
            t1: None,
            deadline,
        };
    }

    /// The transmit timestamp of the request became available
    pub(crate) fn request_timestamp(&mut self, timestamp_id: u16, timestamp: Time) {
        match &mut self.state {
            LinkDelayState::WaitResp { id, t1, .. }
            | LinkDelayState::WaitRespFollowUp { id, t1, .. }
                if *id == timestamp_id =>
            {
                *t1 = Some(timestamp);
            }
            _ => {
                log::debug!("late pdelay request timestamp ignored");
            }
        }
    }

    /// A Pdelay_Resp arrived; `t2` already includes the correction field
    pub(crate) fn response_received(&mut self, id: u16, t2: Time, t4: Time) {
        match self.state {
            LinkDelayState::WaitResp {
                id: expected,
                t1,
                deadline,
            } if expected == id => {
                self.state = LinkDelayState::WaitRespFollowUp {
                    id,
                    t1,
                    t2,
                    t4,
                    deadline,
                };
            }
            _ => {
                self.stats.mismatched_responses += 1;
                log::debug!("unexpected pdelay response with sequence id {id}");
            }
        }
    }

    /// A Pdelay_Resp_Follow_Up arrived; `t3` already includes the correction
    /// field. This completes the exchange.
    pub(crate) fn response_follow_up_received(&mut self, id: u16, t3: Time) {
        match self.state {
            LinkDelayState::WaitRespFollowUp {
                id: expected,
                t1: Some(t1),
                t2,
                t4,
                ..
            } if expected == id => {
                self.state = LinkDelayState::Send;
                self.complete_exchange(t1, t2, t3, t4);
            }
            LinkDelayState::WaitRespFollowUp { id: expected, t1: None, .. } if expected == id => {
                // Without the transmit timestamp of our request the exchange
                // cannot be evaluated
                self.stats.invalid_exchanges += 1;
                self.valid_exchanges = 0;
                self.state = LinkDelayState::Reset;
                log::warn!("pdelay exchange without request transmit timestamp");
            }
            _ => {
                self.stats.mismatched_responses += 1;
                log::debug!("unexpected pdelay response follow up with sequence id {id}");
            }
        }
    }

    /// Expire the in flight exchange when its deadline passed. Returns
    /// whether a timeout fired.
    pub(crate) fn tick(&mut self, now: Duration) -> bool {
        let deadline = match self.state {
            LinkDelayState::WaitResp { deadline, .. }
            | LinkDelayState::WaitRespFollowUp { deadline, .. } => deadline,
            _ => return false,
        };

        if now < deadline {
            return false;
        }

        self.stats.response_timeouts += 1;
        self.consecutive_timeouts += 1;
        if self.consecutive_timeouts >= MAX_LOST_RESPONSES {
            if self.as_capable {
                log::warn!("peer stopped answering pdelay requests, link not usable");
            }
            self.as_capable = false;
            self.valid_exchanges = 0;
        }

        self.state = LinkDelayState::Reset;
        true
    }

    pub(crate) fn as_capable(&self) -> bool {
        self.as_capable
    }

    /// The filtered mean link delay handed to the servo
    pub(crate) fn mean_link_delay(&self) -> Option<Duration> {
        self.filter.median()
    }

    pub(crate) fn neighbor_rate_ratio(&self) -> f64 {
        self.neighbor_rate_ratio
    }

    fn complete_exchange(&mut self, t1: Time, t2: Time, t3: Time, t4: Time) {
        self.consecutive_timeouts = 0;

        if t4 <= t1 || t3 < t2 {
            self.stats.invalid_exchanges += 1;
            self.valid_exchanges = 0;
            log::warn!("pdelay exchange with inconsistent timestamps");
            return;
        }

        self.update_rate_ratio(t3, t4);

        // Equation 16-2
        let turnaround = (t4 - t1).nanos_lossy() * self.neighbor_rate_ratio;
        let residence = (t3 - t2).nanos_lossy();
        let mean_ns = (turnaround - residence) / 2.0;

        if mean_ns > self.profile.max_link_delay.nanos_lossy() {
            self.stats.invalid_exchanges += 1;
            self.valid_exchanges = 0;
            log::warn!("measured link delay {mean_ns} ns exceeds the profile limit");
            return;
        }

        let mean = if mean_ns < 0.0 {
            self.stats.negative_delay_clamps += 1;
            log::debug!("negative link delay {mean_ns} ns clamped to zero");
            Duration::ZERO
        } else {
            Duration::from_fixed_nanos(fixed::types::I96F32::from_num(mean_ns))
        };

        self.filter.absorb(mean);
        self.stats.exchanges_completed += 1;

        if self.consecutive_rejections == 0 {
            self.valid_exchanges = self.valid_exchanges.saturating_add(1);
            if !self.as_capable && self.valid_exchanges >= self.profile.capable_exchanges {
                log::info!("link became capable of gPTP");
                self.as_capable = true;
            }
        }
    }

    /// Equation 16-1 over the sliding window of (t3, t4) pairs
    fn update_rate_ratio(&mut self, t3: Time, t4: Time) {
        let max_len = (self.profile.rate_ratio_window + 1).min(MAX_RATE_SAMPLES);
        while self.rate_window.len() >= max_len {
            self.rate_window.remove(0);
        }
        self.rate_window.push((t3, t4));

        if self.rate_window.len() < 2 {
            return;
        }

        let (t3_first, t4_first) = self.rate_window[0];
        let (t3_last, t4_last) = self.rate_window[self.rate_window.len() - 1];

        let denominator = (t4_last - t4_first).nanos_lossy();
        if denominator <= 0.0 {
            self.reject_rate_sample();
            return;
        }

        let ratio = (t3_last - t3_first).nanos_lossy() / denominator;
        let tolerance = self.profile.rate_ratio_tolerance_ppm * 1e-6;

        if (ratio - 1.0).abs() > tolerance {
            self.reject_rate_sample();
            return;
        }

        self.consecutive_rejections = 0;
        self.neighbor_rate_ratio = ratio;
    }

    fn reject_rate_sample(&mut self) {
        // The previous ratio stays in effect
        self.stats.rate_ratio_rejections += 1;
        self.consecutive_rejections = self.consecutive_rejections.saturating_add(1);

        if self.consecutive_rejections >= MAX_RATE_REJECTIONS {
            if self.as_capable {
                log::warn!("neighbor rate ratio out of range, link not usable");
            }
            self.as_capable = false;
            self.valid_exchanges = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> StandardP2P {
        let mut engine = StandardP2P::new(PathDelayProfile::industrial());
        engine.enable();
        engine
    }

    /// Run one complete exchange through the state machine
    fn exchange(engine: &mut StandardP2P, id: u16, t1: Time, t2: Time, t3: Time, t4: Time) {
        assert!(engine.ready_to_send());
        engine.request_sent(id, Duration::from_secs(1_000_000));
        engine.request_timestamp(id, t1);
        engine.response_received(id, t2, t4);
        engine.response_follow_up_received(id, t3);
    }

    #[test]
    fn textbook_exchange_measures_50_micros() {
        let mut engine = engine();

        exchange(
            &mut engine,
            0,
            Time::from_secs_nanos(100, 0),
            Time::from_secs_nanos(100, 50_000),
            Time::from_secs_nanos(100, 51_000),
            Time::from_secs_nanos(100, 101_000),
        );

        // ((t4 - t1) - (t3 - t2)) / 2 at rate ratio 1.0
        assert_eq!(engine.mean_link_delay(), Some(Duration::from_nanos(50_000)));
        assert_eq!(engine.stats.exchanges_completed, 1);
    }

    #[test]
    fn capable_after_two_valid_exchanges() {
        let mut engine = engine();

        for (i, base) in [100u64, 101].iter().enumerate() {
            exchange(
                &mut engine,
                i as u16,
                Time::from_secs_nanos(*base, 0),
                Time::from_secs_nanos(*base, 1_000),
                Time::from_secs_nanos(*base, 2_000),
                Time::from_secs_nanos(*base, 3_000),
            );
            let expected = i == 1;
            assert_eq!(engine.as_capable(), expected);
        }
    }

    #[test]
    fn out_of_range_rate_ratio_clears_capability() {
        let mut engine = engine();

        // Two clean exchanges make the link capable
        for (i, base) in [100u64, 101].iter().enumerate() {
            exchange(
                &mut engine,
                i as u16,
                Time::from_secs_nanos(*base, 0),
                Time::from_secs_nanos(*base, 1_000),
                Time::from_secs_nanos(*base, 2_000),
                Time::from_secs_nanos(*base, 3_000),
            );
        }
        assert!(engine.as_capable());
        let ratio_before = engine.neighbor_rate_ratio();

        // The peer's clock now runs 500 ppm fast: each second of ours spans
        // 1.0005 seconds of theirs, far outside the 200 ppm bound
        for i in 0..3u64 {
            let ours = Time::from_secs_nanos(102 + i, 0);
            let theirs = Time::from_secs_nanos(102 + i, (500_000 * (i + 2)) as u32);
            exchange(
                &mut engine,
                (2 + i) as u16,
                ours,
                theirs,
                theirs + Duration::from_nanos(1_000),
                ours + Duration::from_nanos(3_000),
            );

            // The poisoned samples never replace the last good ratio
            assert_eq!(engine.neighbor_rate_ratio(), ratio_before);
        }

        assert_eq!(engine.stats.rate_ratio_rejections, 3);
        assert!(!engine.as_capable());
    }

    #[test]
    fn negative_delay_clamps_to_zero() {
        let mut engine = engine();

        // The peer claims to have held the frame longer than the whole
        // round trip took
        exchange(
            &mut engine,
            0,
            Time::from_secs_nanos(100, 0),
            Time::from_secs_nanos(100, 1_000),
            Time::from_secs_nanos(100, 9_000),
            Time::from_secs_nanos(100, 3_000),
        );

        assert_eq!(engine.mean_link_delay(), Some(Duration::ZERO));
        assert_eq!(engine.stats.negative_delay_clamps, 1);
    }

    #[test]
    fn inconsistent_timestamps_are_rejected() {
        let mut engine = engine();

        // t4 before t1
        exchange(
            &mut engine,
            0,
            Time::from_secs_nanos(100, 5_000),
            Time::from_secs_nanos(100, 1_000),
            Time::from_secs_nanos(100, 2_000),
            Time::from_secs_nanos(100, 3_000),
        );

        assert_eq!(engine.stats.invalid_exchanges, 1);
        assert_eq!(engine.mean_link_delay(), None);
    }

    #[test]
    fn delay_above_profile_limit_is_rejected() {
        let mut engine = StandardP2P::new(PathDelayProfile::automotive());
        engine.enable();

        // 5 ms one way delay on an automotive profile limited to 500 us
        exchange(
            &mut engine,
            0,
            Time::from_secs_nanos(100, 0),
            Time::from_secs_nanos(100, 5_000_000),
            Time::from_secs_nanos(100, 5_001_000),
            Time::from_secs_nanos(100, 10_001_000),
        );

        assert_eq!(engine.stats.invalid_exchanges, 1);
        assert_eq!(engine.mean_link_delay(), None);
    }

    #[test]
    fn response_timeouts_clear_capability() {
        let mut engine = engine();

        for (i, base) in [100u64, 101].iter().enumerate() {
            exchange(
                &mut engine,
                i as u16,
                Time::from_secs_nanos(*base, 0),
                Time::from_secs_nanos(*base, 1_000),
                Time::from_secs_nanos(*base, 2_000),
                Time::from_secs_nanos(*base, 3_000),
            );
        }
        assert!(engine.as_capable());

        for i in 0..3u16 {
            assert!(engine.ready_to_send());
            engine.request_sent(10 + i, Duration::from_secs(1));
            // The deadline passes without any response
            assert!(engine.tick(Duration::from_secs(2)));
        }

        assert_eq!(engine.stats.response_timeouts, 3);
        assert!(!engine.as_capable());
    }

    #[test]
    fn mismatched_sequence_ids_are_counted() {
        let mut engine = engine();

        engine.request_sent(5, Duration::from_secs(1));
        engine.response_received(
            9,
            Time::from_secs_nanos(100, 1_000),
            Time::from_secs_nanos(100, 3_000),
        );

        assert_eq!(engine.stats.mismatched_responses, 1);
        assert!(matches!(engine.state, LinkDelayState::WaitResp { id: 5, .. }));
    }
}
