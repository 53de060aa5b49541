//! Abstraction of a single network port of a gPTP instance
//!
//! A [`Port`] owns the four state machines of *IEEE 802.1AS-2021*: PortSync
//! (does this port take part in time distribution), MDSync (master side sync
//! transmission), SiteSyncSync (slave side sync reception) and LinkDelay
//! (the peer delay measurement, living in [`crate::pdelay`]).

use arrayvec::ArrayVec;
use rand::Rng;

pub use actions::{PortAction, PortActionIterator, TimestampContext};
pub(crate) use actions::TimestampContextInner;
pub(crate) use sequence_id::sequence_difference;

use crate::{
    config::PortConfig,
    datastructures::{
        common::PortIdentity,
        datasets::{CurrentDS, DefaultDS, ParentDS},
        messages::{Message, MessageBody, MessageType, MAX_DATA_LEN},
    },
    pdelay::PathDelayCalculator,
    port::{
        md_sync::MdSync,
        port_sync::PortSync,
        sequence_id::SequencePools,
        site_sync::{SiteSyncSync, SyncCompletion},
    },
    servo::Measurement,
    time::{Duration, Time},
};

// Needs to be here because of use rules
macro_rules! actions {
    [] => {
        crate::port::PortActionIterator::empty()
    };
    [$action:expr] => {
        {
            let mut list = ::arrayvec::ArrayVec::new();
            list.push($action);
            crate::port::PortActionIterator::from(list)
        }
    };
}

mod actions;
mod md_sync;
mod port_sync;
mod sequence_id;
mod site_sync;

/// Room for the few messages one tick can emit at most
const PORT_BUFFER_LEN: usize = 3 * MAX_DATA_LEN;

/// The role a port plays in its domain, *IEEE 802.1AS-2021 section 10.2.5*
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortRole {
    /// The port is administratively or physically down
    Disabled,
    /// The port is starting up
    Initializing,
    /// The port waits for the best master election
    Listening,
    /// The port is about to become master
    PreMaster,
    /// The port distributes time into its network
    Master,
    /// The port neither distributes nor consumes time
    Passive,
    /// The port follows a master but the servo has not converged yet
    Uncalibrated,
    /// The port synchronizes the local clock to its master
    Slave,
    /// The port encountered a fault
    Faulty,
}

impl core::fmt::Display for PortRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            PortRole::Disabled => "Disabled",
            PortRole::Initializing => "Initializing",
            PortRole::Listening => "Listening",
            PortRole::PreMaster => "PreMaster",
            PortRole::Master => "Master",
            PortRole::Passive => "Passive",
            PortRole::Uncalibrated => "Uncalibrated",
            PortRole::Slave => "Slave",
            PortRole::Faulty => "Faulty",
        };
        write!(f, "{name}")
    }
}

/// Read only view of the data sets of the domain a port belongs to
#[derive(Clone, Copy)]
pub(crate) struct DomainView<'a> {
    pub(crate) default_ds: &'a DefaultDS,
    pub(crate) parent_ds: &'a ParentDS,
    pub(crate) current_ds: &'a CurrentDS,
}

/// Drop and error counters of one port
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortStatistics {
    /// Sync sequence ids that skipped ahead
    pub sequence_gaps: u32,
    /// Follow ups without a pending sync
    pub unmatched_follow_ups: u32,
    /// Two step syncs whose follow up never arrived
    pub expired_pending_syncs: u32,
    /// Syncs whose transmit timestamp never arrived
    pub follow_up_tx_timeouts: u32,
    /// Times the slave sync source went quiet
    pub sync_receipt_timeouts: u32,
    /// Signaling messages accepted but not interpreted
    pub ignored_signaling: u32,
    /// Messages dropped for a wrong source or state
    pub dropped_messages: u32,
    /// Completed peer delay exchanges
    pub pdelay_exchanges_completed: u32,
    /// Peer delay responses that never came
    pub pdelay_response_timeouts: u32,
    /// Neighbor rate ratio samples out of range
    pub pdelay_rate_ratio_rejections: u32,
    /// Peer delay exchanges with inconsistent timestamps
    pub pdelay_invalid_exchanges: u32,
    /// Negative link delays clamped to zero
    pub pdelay_negative_delay_clamps: u32,
    /// Peer delay responses with an unexpected sequence id
    pub pdelay_mismatched_responses: u32,
}

#[derive(Debug, Default)]
struct PortTimers {
    announce_due: Option<Duration>,
    sync_due: Option<Duration>,
    pdelay_due: Option<Duration>,
}

/// One network port of a [`GptpInstance`](`crate::GptpInstance`)
#[derive(Debug)]
pub struct Port<R> {
    config: PortConfig,
    identity: PortIdentity,
    enabled: bool,
    link_up: bool,
    role: PortRole,
    sequence_pools: SequencePools,
    port_sync: PortSync,
    md_sync: MdSync,
    site_sync: SiteSyncSync,
    path_delay: PathDelayCalculator,
    timers: PortTimers,
    rng: R,
    packet_buffer: [u8; PORT_BUFFER_LEN],
    pending_measurement: Option<Measurement>,
    /// While set, an announce from another port of our own instance keeps
    /// this port passive
    multiport_hold_until: Option<Duration>,
    sync_receipt_timeouts: u32,
    ignored_signaling: u32,
    dropped_messages: u32,
}

enum QueuedSend {
    Event {
        context: TimestampContextInner,
        start: usize,
        len: usize,
    },
    General {
        start: usize,
        len: usize,
    },
}

impl<R: Rng> Port<R> {
    pub(crate) fn new(config: PortConfig, identity: PortIdentity, rng: R) -> Self {
        Self {
            path_delay: PathDelayCalculator::new(config.delay_mechanism),
            config,
            identity,
            enabled: true,
            link_up: false,
            role: PortRole::Initializing,
            sequence_pools: SequencePools::new(),
            port_sync: PortSync::new(),
            md_sync: MdSync::new(),
            site_sync: SiteSyncSync::new(),
            timers: PortTimers::default(),
            rng,
            packet_buffer: [0; PORT_BUFFER_LEN],
            pending_measurement: None,
            multiport_hold_until: None,
            sync_receipt_timeouts: 0,
            ignored_signaling: 0,
            dropped_messages: 0,
        }
    }

    pub(crate) fn identity(&self) -> PortIdentity {
        self.identity
    }

    pub(crate) fn number(&self) -> u16 {
        self.identity.port_number
    }

    pub(crate) fn config(&self) -> &PortConfig {
        &self.config
    }

    /// The role the port currently plays
    pub fn role(&self) -> PortRole {
        self.role
    }

    /// Whether the link is usable for gPTP
    pub fn is_as_capable(&self) -> bool {
        self.path_delay.as_capable()
    }

    /// The filtered one way delay of the attached link
    pub fn mean_link_delay(&self) -> Option<Duration> {
        self.path_delay.mean_link_delay()
    }

    /// The rate of the neighbor's clock relative to ours
    pub fn neighbor_rate_ratio(&self) -> f64 {
        self.path_delay.neighbor_rate_ratio()
    }

    pub(crate) fn is_usable(&self) -> bool {
        self.enabled && self.link_up
    }

    /// Current drop and error counters
    pub fn statistics(&self) -> PortStatistics {
        let pdelay = match &self.path_delay {
            PathDelayCalculator::StandardP2P(p2p) => p2p.stats,
            _ => Default::default(),
        };

        PortStatistics {
            sequence_gaps: self.site_sync.sequence_gaps,
            unmatched_follow_ups: self.site_sync.unmatched_follow_ups,
            expired_pending_syncs: self.site_sync.expired_pending_syncs,
            follow_up_tx_timeouts: self.md_sync.follow_up_tx_timeouts,
            sync_receipt_timeouts: self.sync_receipt_timeouts,
            ignored_signaling: self.ignored_signaling,
            dropped_messages: self.dropped_messages,
            pdelay_exchanges_completed: pdelay.exchanges_completed,
            pdelay_response_timeouts: pdelay.response_timeouts,
            pdelay_rate_ratio_rejections: pdelay.rate_ratio_rejections,
            pdelay_invalid_exchanges: pdelay.invalid_exchanges,
            pdelay_negative_delay_clamps: pdelay.negative_delay_clamps,
            pdelay_mismatched_responses: pdelay.mismatched_responses,
        }
    }

    /// A measurement produced by the last message or tick, to be fed into
    /// the servo of the domain
    pub(crate) fn take_measurement(&mut self) -> Option<Measurement> {
        self.pending_measurement.take()
    }

    pub(crate) fn handle_enable(&mut self, now: Duration) {
        if !self.enabled {
            self.enabled = true;
            if self.link_up {
                self.come_up(now);
            }
        }
    }

    pub(crate) fn handle_disable(&mut self) {
        if self.enabled {
            self.enabled = false;
            self.go_down();
        }
    }

    pub(crate) fn handle_link_up(&mut self, now: Duration) {
        if !self.link_up {
            self.link_up = true;
            if self.enabled {
                self.come_up(now);
            }
        }
    }

    pub(crate) fn handle_link_down(&mut self) {
        if self.link_up {
            self.link_up = false;
            if self.enabled {
                self.go_down();
            }
        }
    }

    fn come_up(&mut self, now: Duration) {
        log::info!("port {} up, listening", self.number());
        self.set_role(PortRole::Listening, now, Duration::ZERO);

        if let Some(p2p) = self.path_delay.as_standard_mut() {
            p2p.enable();
        }
        if self.path_delay.sends_requests() {
            self.timers.pdelay_due = Some(now);
        }
    }

    fn go_down(&mut self) {
        log::info!("port {} down", self.number());
        self.role = PortRole::Disabled;
        self.port_sync.handle_role_change(PortRole::Disabled);
        self.md_sync.deactivate();
        self.site_sync.deactivate();
        if let Some(p2p) = self.path_delay.as_standard_mut() {
            p2p.disable();
        }
        self.timers = PortTimers::default();
        self.pending_measurement = None;
    }

    /// Apply a role decided by the best master clock algorithm.
    ///
    /// `stagger` delays the first transmissions of a fresh master so that
    /// several ports becoming master in the same tick do not burst.
    pub(crate) fn set_role(&mut self, role: PortRole, now: Duration, stagger: Duration) {
        if let Some(until) = self.multiport_hold_until {
            if now < until {
                return;
            }
            self.multiport_hold_until = None;
        }

        // A BMCA slave decision first passes through Uncalibrated until a
        // measurement made it to the servo
        let role = match role {
            PortRole::Slave if self.role != PortRole::Slave => PortRole::Uncalibrated,
            other => other,
        };

        if !self.is_usable() {
            self.role = PortRole::Disabled;
            return;
        }

        if role == self.role {
            return;
        }

        log::info!("port {}: {} -> {}", self.number(), self.role, role);
        self.role = role;
        self.port_sync.handle_role_change(role);

        match role {
            PortRole::Master => {
                self.md_sync.activate();
                self.site_sync.deactivate();
                self.timers.announce_due = Some(now + stagger);
                self.timers.sync_due = Some(now + stagger);
            }
            PortRole::Uncalibrated | PortRole::Slave => {
                self.md_sync.deactivate();
                // Drop pending syncs of a previous master before following
                // the new one
                self.site_sync.deactivate();
                self.site_sync.activate();
                self.timers.announce_due = None;
                self.timers.sync_due = None;
            }
            _ => {
                self.md_sync.deactivate();
                self.site_sync.deactivate();
                self.timers.announce_due = None;
                self.timers.sync_due = None;
            }
        }
    }

    /// Force the port passive because another port of this same instance is
    /// visible on the attached network
    pub(crate) fn hold_passive(&mut self, until: Duration, now: Duration) {
        self.set_role(PortRole::Passive, now, Duration::ZERO);
        self.multiport_hold_until = Some(until);
    }

    /// Accept an externally measured (delay, rate ratio) pair on a port
    /// configured for native CSN measurement
    pub(crate) fn supply_csn_measurement(&mut self, delay: Duration, rate_ratio: f64) {
        match &mut self.path_delay {
            PathDelayCalculator::NativeCsn(csn) => csn.supply(delay, rate_ratio),
            _ => log::warn!(
                "port {} does not use native CSN delay measurement",
                self.number()
            ),
        }
    }

    /// Accept a residence time on a port configured for intrinsic CSN
    /// measurement
    pub(crate) fn supply_csn_residence_time(&mut self, residence_time: Duration) {
        match &mut self.path_delay {
            PathDelayCalculator::IntrinsicCsn(csn) => csn.set_residence_time(residence_time),
            _ => log::warn!(
                "port {} does not use intrinsic CSN delay measurement",
                self.number()
            ),
        }
    }

    /// Process one received message addressed to this port.
    ///
    /// Announce messages are handled by the best master clock algorithm
    /// before this point and never show up here.
    pub(crate) fn handle_message(
        &mut self,
        message: &Message,
        rx_timestamp: Time,
        now: Duration,
        domain: DomainView,
    ) -> PortActionIterator<'_> {
        if !self.is_usable() {
            self.dropped_messages += 1;
            return actions![];
        }

        match &message.body {
            MessageBody::Sync(sync) => {
                self.handle_sync(message, sync, rx_timestamp, now, domain);
                actions![]
            }
            MessageBody::FollowUp(follow_up) => {
                self.handle_follow_up(message, follow_up, now, domain);
                actions![]
            }
            MessageBody::PDelayReq(_) => self.handle_pdelay_req(message, rx_timestamp, domain),
            MessageBody::PDelayResp(resp) => {
                let header = message.header();
                if resp.requesting_port_identity != self.identity {
                    self.dropped_messages += 1;
                    return actions![];
                }

                let t2 = Time::from(resp.request_receive_timestamp)
                    + Duration::from(header.correction_field);
                if let Some(p2p) = self.path_delay.as_standard_mut() {
                    p2p.response_received(header.sequence_id, t2, rx_timestamp);
                }
                actions![]
            }
            MessageBody::PDelayRespFollowUp(follow_up) => {
                let header = message.header();
                if follow_up.requesting_port_identity != self.identity {
                    self.dropped_messages += 1;
                    return actions![];
                }

                let t3 = Time::from(follow_up.response_origin_timestamp)
                    + Duration::from(header.correction_field);
                if let Some(p2p) = self.path_delay.as_standard_mut() {
                    p2p.response_follow_up_received(header.sequence_id, t3);
                }
                actions![]
            }
            MessageBody::Signaling(_) => {
                // Parsed and preserved, but no TLV is interpreted
                self.ignored_signaling += 1;
                actions![]
            }
            MessageBody::Announce(_) => actions![],
        }
    }

    /// The transmit timestamp of an earlier [`PortAction::SendEvent`] became
    /// available
    pub(crate) fn handle_send_timestamp(
        &mut self,
        context: TimestampContext,
        timestamp: Time,
        domain: DomainView,
    ) -> PortActionIterator<'_> {
        match context.inner {
            TimestampContextInner::Sync { id } => {
                match self.md_sync.sync_timestamp(id, timestamp) {
                    Some(id) => self.send_follow_up(id, timestamp, domain),
                    None => actions![],
                }
            }
            TimestampContextInner::PDelayReq { id } => {
                if let Some(p2p) = self.path_delay.as_standard_mut() {
                    p2p.request_timestamp(id, timestamp);
                }
                actions![]
            }
            TimestampContextInner::PDelayResp {
                id,
                requestor_identity,
            } => self.send_pdelay_resp_follow_up(id, requestor_identity, timestamp, domain),
        }
    }

    /// Advance all timers and sweep all timeouts of this port
    pub(crate) fn handle_tick(&mut self, now: Duration, domain: DomainView) -> PortActionIterator<'_> {
        if !self.is_usable() {
            return actions![];
        }

        self.md_sync.sweep(now);
        self.site_sync.sweep(now);
        if self.port_sync.sweep(self.role, now, self.config.sync_timeout_duration()) {
            self.sync_receipt_timeouts += 1;
        }
        if let Some(p2p) = self.path_delay.as_standard_mut() {
            p2p.tick(now);
        }

        let mut queued: ArrayVec<QueuedSend, { actions::MAX_ACTIONS }> = ArrayVec::new();
        let mut used = 0;

        if self.timer_fired(self.timers.announce_due, now) && self.role == PortRole::Master {
            self.timers.announce_due = Some(now + self.config.announce_interval.as_duration());
            self.queue_announce(domain, &mut queued, &mut used);
        }

        if self.timer_fired(self.timers.sync_due, now) && self.role == PortRole::Master {
            self.timers.sync_due = Some(now + self.config.sync_interval.as_duration());
            if self.md_sync.ready_to_send() && self.port_sync.is_transmit() {
                self.queue_sync(domain, now, &mut queued, &mut used);
            }
        }

        if self.timer_fired(self.timers.pdelay_due, now) {
            self.timers.pdelay_due = Some(now + self.jittered_pdelay_interval());
            let ready = self
                .path_delay
                .as_standard_mut()
                .map_or(false, |p2p| p2p.ready_to_send());
            if ready {
                self.queue_pdelay_req(domain, now, &mut queued, &mut used);
            }
        }

        self.actions_from_queue(queued)
    }

    fn timer_fired(&self, due: Option<Duration>, now: Duration) -> bool {
        matches!(due, Some(deadline) if now >= deadline)
    }

    /// Spread requests a little so that neighbors do not phase lock
    fn jittered_pdelay_interval(&mut self) -> Duration {
        let base = self.config.pdelay_interval.as_duration();
        let jitter = self.rng.sample::<f64, _>(rand::distributions::Open01) * 0.2 + 0.9;
        Duration::from_fixed_nanos(fixed::types::I96F32::from_num(
            base.nanos_lossy() * jitter,
        ))
    }

    fn handle_sync(
        &mut self,
        message: &Message,
        sync: &crate::datastructures::messages::SyncMessage,
        rx_timestamp: Time,
        now: Duration,
        domain: DomainView,
    ) {
        if !matches!(self.role, PortRole::Slave | PortRole::Uncalibrated) {
            self.dropped_messages += 1;
            return;
        }

        // Only the selected master is a valid sync source
        if message.header().source_port_identity != domain.parent_ds.parent_port_identity {
            self.dropped_messages += 1;
            return;
        }

        self.port_sync.valid_sync_received(now);

        let completion = self.site_sync.handle_sync(
            message.header(),
            sync,
            rx_timestamp,
            now,
            self.config.follow_up_timeout,
        );
        if let Some(completion) = completion {
            self.absorb_completion(completion);
        }
    }

    fn handle_follow_up(
        &mut self,
        message: &Message,
        follow_up: &crate::datastructures::messages::FollowUpMessage,
        _now: Duration,
        domain: DomainView,
    ) {
        if !matches!(self.role, PortRole::Slave | PortRole::Uncalibrated) {
            self.dropped_messages += 1;
            return;
        }

        if message.header().source_port_identity != domain.parent_ds.parent_port_identity {
            self.dropped_messages += 1;
            return;
        }

        if let Some(completion) = self.site_sync.handle_follow_up(message.header(), follow_up) {
            self.absorb_completion(completion);
        }
    }

    fn absorb_completion(&mut self, completion: SyncCompletion) {
        // Without a link delay there is no usable offset yet
        let Some(mean_link_delay) = self.path_delay.mean_link_delay() else {
            log::debug!("sync complete but no link delay measured yet");
            return;
        };

        let offset = completion.recv_time - completion.send_time - mean_link_delay;
        self.pending_measurement = Some(Measurement {
            offset,
            event_time: completion.recv_time,
        });

        if self.role == PortRole::Uncalibrated {
            log::info!("port {}: Uncalibrated -> Slave", self.number());
            self.role = PortRole::Slave;
        }
    }

    fn handle_pdelay_req(
        &mut self,
        message: &Message,
        rx_timestamp: Time,
        domain: DomainView,
    ) -> PortActionIterator<'_> {
        let request_header = *message.header();

        let response = Message::pdelay_resp(
            domain.default_ds,
            self.identity,
            &request_header,
            rx_timestamp,
        );

        let len = match response.serialize(&mut self.packet_buffer) {
            Ok(len) => len,
            Err(error) => {
                log::error!("could not serialize pdelay response: {error:?}");
                return actions![];
            }
        };

        actions![PortAction::SendEvent {
            context: TimestampContext {
                inner: TimestampContextInner::PDelayResp {
                    id: request_header.sequence_id,
                    requestor_identity: request_header.source_port_identity,
                },
            },
            data: &self.packet_buffer[..len],
        }]
    }

    fn send_follow_up(
        &mut self,
        id: u16,
        timestamp: Time,
        domain: DomainView,
    ) -> PortActionIterator<'_> {
        let message = Message::follow_up(
            domain.default_ds,
            self.identity,
            id,
            self.config.sync_interval,
            timestamp,
        );

        let len = match message.serialize(&mut self.packet_buffer) {
            Ok(len) => len,
            Err(error) => {
                log::error!("could not serialize follow up: {error:?}");
                return actions![];
            }
        };

        actions![PortAction::SendGeneral {
            data: &self.packet_buffer[..len],
        }]
    }

    fn send_pdelay_resp_follow_up(
        &mut self,
        id: u16,
        requestor_identity: PortIdentity,
        timestamp: Time,
        domain: DomainView,
    ) -> PortActionIterator<'_> {
        let message = Message::pdelay_resp_follow_up(
            domain.default_ds,
            self.identity,
            requestor_identity,
            id,
            timestamp,
        );

        let len = match message.serialize(&mut self.packet_buffer) {
            Ok(len) => len,
            Err(error) => {
                log::error!("could not serialize pdelay response follow up: {error:?}");
                return actions![];
            }
        };

        actions![PortAction::SendGeneral {
            data: &self.packet_buffer[..len],
        }]
    }

    fn queue_announce(
        &mut self,
        domain: DomainView,
        queued: &mut ArrayVec<QueuedSend, { actions::MAX_ACTIONS }>,
        used: &mut usize,
    ) {
        let message = Message::announce(
            domain.default_ds,
            domain.parent_ds,
            domain.current_ds,
            self.identity,
            self.sequence_pools.generate(MessageType::Announce),
            self.config.announce_interval,
        );

        match message.serialize(&mut self.packet_buffer[*used..]) {
            Ok(len) => {
                queued.push(QueuedSend::General { start: *used, len });
                *used += len;
            }
            Err(error) => log::error!("could not serialize announce: {error:?}"),
        }
    }

    fn queue_sync(
        &mut self,
        domain: DomainView,
        now: Duration,
        queued: &mut ArrayVec<QueuedSend, { actions::MAX_ACTIONS }>,
        used: &mut usize,
    ) {
        let id = self.sequence_pools.generate(MessageType::Sync);
        let message = Message::sync(domain.default_ds, self.identity, id, self.config.sync_interval);

        match message.serialize(&mut self.packet_buffer[*used..]) {
            Ok(len) => {
                self.md_sync.sync_sent(id, now + self.config.follow_up_timeout);
                queued.push(QueuedSend::Event {
                    context: TimestampContextInner::Sync { id },
                    start: *used,
                    len,
                });
                *used += len;
            }
            Err(error) => log::error!("could not serialize sync: {error:?}"),
        }
    }

    fn queue_pdelay_req(
        &mut self,
        domain: DomainView,
        now: Duration,
        queued: &mut ArrayVec<QueuedSend, { actions::MAX_ACTIONS }>,
        used: &mut usize,
    ) {
        let id = self.sequence_pools.generate(MessageType::PDelayReq);
        let message = Message::pdelay_req(
            domain.default_ds,
            self.identity,
            id,
            self.config.pdelay_interval,
        );

        match message.serialize(&mut self.packet_buffer[*used..]) {
            Ok(len) => {
                let deadline = now + self.config.pdelay_resp_timeout;
                if let Some(p2p) = self.path_delay.as_standard_mut() {
                    p2p.request_sent(id, deadline);
                }
                queued.push(QueuedSend::Event {
                    context: TimestampContextInner::PDelayReq { id },
                    start: *used,
                    len,
                });
                *used += len;
            }
            Err(error) => log::error!("could not serialize pdelay request: {error:?}"),
        }
    }

    fn actions_from_queue(
        &self,
        queued: ArrayVec<QueuedSend, { actions::MAX_ACTIONS }>,
    ) -> PortActionIterator<'_> {
        let mut list = ArrayVec::new();
        for send in queued {
            match send {
                QueuedSend::Event {
                    context,
                    start,
                    len,
                } => list.push(PortAction::SendEvent {
                    context: TimestampContext { inner: context },
                    data: &self.packet_buffer[start..start + len],
                }),
                QueuedSend::General { start, len } => list.push(PortAction::SendGeneral {
                    data: &self.packet_buffer[start..start + len],
                }),
            }
        }

        PortActionIterator::from(list)
    }
}
