//! The central object of this crate: owns the ports and the per domain
//! state, routes frames, and drives all periodic work

use arrayvec::ArrayVec;
use rand::Rng;

use crate::{
    bmc::bmca::{Bmca, BmcaOutcome, GrandmasterSelection},
    clock::Clock,
    config::{InstanceConfig, PortConfig, ServoConfig},
    datastructures::{
        common::PortIdentity,
        datasets::{CurrentDS, DefaultDS, ParentDS},
        messages::{Message, MessageBody},
    },
    discipline::ClockDiscipline,
    observability::{DomainStatus, InstanceStatus, PortStatus, ServoStatus},
    port::{DomainView, Port, PortAction, PortActionIterator, PortRole, TimestampContext},
    servo::Servo,
    time::{Duration, Time},
    transport::Transport,
    Event, MAX_DOMAINS, MAX_PORTS,
};

/// Frame level drop counters of the whole instance
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceStatistics {
    /// Frames the codec rejected
    pub malformed_frames: u32,
    /// Frames for a port we do not have
    pub unknown_ports: u32,
    /// Frames whose domain does not match the receiving port
    pub wrong_domain_frames: u32,
    /// Announce messages carrying our own clock identity
    pub announces_from_self: u32,
    /// Sends the transport reported as failed
    pub transport_errors: u32,
}

/// Per domain state: the data sets, the election and the servo
#[derive(Debug)]
struct DomainState {
    default_ds: DefaultDS,
    current_ds: CurrentDS,
    parent_ds: ParentDS,
    bmca: Bmca,
    servo: Servo,
    /// Before this instant the node does not claim the grandmaster role, so
    /// that masters already on the network are heard first
    listen_until: Option<Duration>,
}

/// A gPTP time-aware system
///
/// The instance owns its [`Port`]s and one election plus servo per domain.
/// It performs no I/O and never blocks: frames, transmit timestamps, and
/// time all arrive through the `handle_*` methods, and outbound messages
/// leave through the [`Transport`] passed into them.
///
/// `handle_tick` drives every timer in the system and should be called with
/// a granularity of at most a quarter of the smallest configured interval;
/// one millisecond is adequate for the defaults.
#[derive(Debug)]
pub struct GptpInstance<C, R> {
    config: InstanceConfig,
    servo_config: ServoConfig,
    ports: ArrayVec<Port<R>, MAX_PORTS>,
    /// Domain of each port, by port index
    port_domains: ArrayVec<usize, MAX_PORTS>,
    domains: ArrayVec<DomainState, MAX_DOMAINS>,
    discipline: ClockDiscipline<C>,
    last_roles: ArrayVec<PortRole, MAX_PORTS>,
    events: ArrayVec<Event, { 2 * MAX_PORTS }>,
    stats: InstanceStatistics,
}

impl<C: Clock, R: Rng> GptpInstance<C, R> {
    /// Create an instance around a hardware clock.
    ///
    /// Ports are added afterwards with [`add_port`](`Self::add_port`).
    pub fn new(config: InstanceConfig, servo_config: ServoConfig, clock: C) -> Self {
        Self {
            config,
            servo_config,
            ports: ArrayVec::new(),
            port_domains: ArrayVec::new(),
            domains: ArrayVec::new(),
            discipline: ClockDiscipline::new(clock),
            last_roles: ArrayVec::new(),
            events: ArrayVec::new(),
            stats: InstanceStatistics::default(),
        }
    }

    /// Add a port. Port numbers are handed out in order, starting at one.
    ///
    /// Returns the number of the new port, which is also what the transport
    /// uses to address it.
    pub fn add_port(&mut self, port_config: PortConfig, rng: R) -> u16 {
        let port_number = self.ports.len() as u16 + 1;
        let identity = PortIdentity {
            clock_identity: self.config.clock_identity,
            port_number,
        };

        let domain_index = self.domain_index_or_create(port_config.domain_number);
        self.domains[domain_index].bmca.register_port(
            port_number,
            identity,
            port_config.announce_receipt_timeout,
        );

        self.ports.push(Port::new(port_config, identity, rng));
        self.port_domains.push(domain_index);
        self.last_roles.push(PortRole::Initializing);

        port_number
    }

    /// Tell the instance the physical link of a port came up
    pub fn handle_link_up(&mut self, port_number: u16, now: Duration) {
        let Some(index) = self.port_index(port_number) else {
            return;
        };

        self.ports[index].handle_link_up(now);

        let domain_index = self.port_domains[index];
        let domain = &mut self.domains[domain_index];
        if domain.listen_until.is_none() {
            let timeout = self.ports[index].config().announce_timeout_duration();
            domain.listen_until = Some(now + timeout);
        }

        self.emit_role_events();
    }

    /// Tell the instance the physical link of a port went down
    pub fn handle_link_down(&mut self, port_number: u16, now: Duration) {
        if let Some(index) = self.port_index(port_number) {
            self.ports[index].handle_link_down();
            let domain_index = self.port_domains[index];
            self.domains[domain_index].bmca.clear_port(port_number);
            self.recompute_domain(domain_index, now);
            self.emit_role_events();
        }
    }

    /// Administratively enable a port
    pub fn handle_enable(&mut self, port_number: u16, now: Duration) {
        if let Some(index) = self.port_index(port_number) {
            self.ports[index].handle_enable(now);
            self.emit_role_events();
        }
    }

    /// Administratively disable a port without destroying its state
    pub fn handle_disable(&mut self, port_number: u16, now: Duration) {
        if let Some(index) = self.port_index(port_number) {
            self.ports[index].handle_disable();
            let domain_index = self.port_domains[index];
            self.domains[domain_index].bmca.clear_port(port_number);
            self.recompute_domain(domain_index, now);
            self.emit_role_events();
        }
    }

    /// Process one received gPTP frame.
    ///
    /// `rx_timestamp` is the hardware receive timestamp of the frame, `now`
    /// the monotonic time of delivery.
    pub fn handle_frame<T: Transport>(
        &mut self,
        port_number: u16,
        data: &[u8],
        rx_timestamp: Time,
        now: Duration,
        transport: &mut T,
    ) {
        let message = match Message::deserialize(data) {
            Ok(message) => message,
            Err(error) => {
                log::warn!("could not parse frame on port {port_number}: {error:?}");
                self.stats.malformed_frames += 1;
                return;
            }
        };

        let Some(index) = self.port_index(port_number) else {
            self.stats.unknown_ports += 1;
            return;
        };

        if message.header().domain_number != self.ports[index].config().domain_number {
            self.stats.wrong_domain_frames += 1;
            return;
        }

        let domain_index = self.port_domains[index];

        match &message.body {
            MessageBody::Announce(announce) => {
                self.handle_announce(index, domain_index, announce, now);
            }
            _ => {
                let domain = &self.domains[domain_index];
                let view = DomainView {
                    default_ds: &domain.default_ds,
                    parent_ds: &domain.parent_ds,
                    current_ds: &domain.current_ds,
                };

                let actions = self.ports[index].handle_message(&message, rx_timestamp, now, view);
                forward_actions(port_number, actions, transport, &mut self.stats);

                self.absorb_port_measurement(index, domain_index);
            }
        }

        self.emit_role_events();
    }

    /// A transmit timestamp requested through [`PortAction::SendEvent`]
    /// became available
    pub fn handle_send_timestamp<T: Transport>(
        &mut self,
        port_number: u16,
        context: TimestampContext,
        timestamp: Time,
        transport: &mut T,
    ) {
        let Some(index) = self.port_index(port_number) else {
            return;
        };

        let domain_index = self.port_domains[index];
        let domain = &self.domains[domain_index];
        let view = DomainView {
            default_ds: &domain.default_ds,
            parent_ds: &domain.parent_ds,
            current_ds: &domain.current_ds,
        };

        let actions = self.ports[index].handle_send_timestamp(context, timestamp, view);
        forward_actions(port_number, actions, transport, &mut self.stats);
    }

    /// Drive all periodic work: port interval timers, announce timeouts,
    /// pending message expiry, and the transmissions they produce
    pub fn handle_tick<T: Transport>(&mut self, now: Duration, transport: &mut T) {
        for index in 0..self.ports.len() {
            let domain_index = self.port_domains[index];
            let domain = &self.domains[domain_index];
            let view = DomainView {
                default_ds: &domain.default_ds,
                parent_ds: &domain.parent_ds,
                current_ds: &domain.current_ds,
            };

            let port_number = self.ports[index].number();
            let actions = self.ports[index].handle_tick(now, view);
            forward_actions(port_number, actions, transport, &mut self.stats);

            self.absorb_port_measurement(index, domain_index);
        }

        for domain_index in 0..self.domains.len() {
            self.domains[domain_index].bmca.sweep_timeouts(now);
            self.recompute_domain(domain_index, now);
        }

        self.emit_role_events();
    }

    /// Hand an externally measured (delay, rate ratio) pair to a port
    /// configured for native CSN delay measurement
    pub fn supply_csn_measurement(&mut self, port_number: u16, delay: Duration, rate_ratio: f64) {
        if let Some(index) = self.port_index(port_number) {
            self.ports[index].supply_csn_measurement(delay, rate_ratio);
        }
    }

    /// Hand a residence time to a port configured for intrinsic CSN delay
    /// measurement
    pub fn supply_csn_residence_time(&mut self, port_number: u16, residence_time: Duration) {
        if let Some(index) = self.port_index(port_number) {
            self.ports[index].supply_csn_residence_time(residence_time);
        }
    }

    /// The next notification about a role or lock change, if any
    pub fn poll_event(&mut self) -> Option<Event> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    /// Frame level drop counters
    pub fn statistics(&self) -> InstanceStatistics {
        self.stats
    }

    /// Read access to the hardware clock being disciplined
    pub fn clock(&self) -> &C {
        self.discipline.clock()
    }

    /// A snapshot of the whole instance for reporting
    pub fn status(&self) -> InstanceStatus {
        let mut ports = ArrayVec::new();
        for port in &self.ports {
            ports.push(PortStatus {
                port_number: port.number(),
                role: port.role(),
                as_capable: port.is_as_capable(),
                mean_link_delay_ns: port
                    .mean_link_delay()
                    .map(|delay| delay.nanos_rounded() as i64),
                neighbor_rate_ratio: port.neighbor_rate_ratio(),
                statistics: port.statistics(),
            });
        }

        let mut domains = ArrayVec::new();
        for domain in &self.domains {
            domains.push(DomainStatus {
                domain_number: domain.default_ds.domain_number,
                grandmaster_identity: domain.parent_ds.grandmaster_identity,
                local_is_grandmaster: domain.parent_ds.grandmaster_identity
                    == self.config.clock_identity,
                steps_removed: domain.current_ds.steps_removed,
                offset_from_master_ns: domain.current_ds.offset_from_master.nanos_rounded() as i64,
                servo: ServoStatus {
                    locked: domain.servo.locked(),
                    frequency_adjustment_ppb: domain.servo.frequency_adjustment_ppb(),
                    applied_frequency_ppb: self.discipline.applied_frequency_ppb(),
                    mean_offset_ns: domain.servo.mean_offset_ns(),
                    offset_std_dev_ns: domain.servo.offset_std_dev_ns(),
                    sample_count: domain.servo.sample_count(),
                    outliers_rejected: domain.servo.outliers_rejected(),
                },
            });
        }

        InstanceStatus {
            statistics: self.stats,
            ports,
            domains,
        }
    }

    fn handle_announce(
        &mut self,
        index: usize,
        domain_index: usize,
        announce: &crate::datastructures::messages::AnnounceMessage,
        now: Duration,
    ) {
        let source = announce.header.source_port_identity;

        if source.clock_identity == self.config.clock_identity {
            // Hearing ourselves indicates a loop, or two of our own ports on
            // the same network; the higher numbered port backs off
            self.stats.announces_from_self += 1;

            let port = &mut self.ports[index];
            if source.port_number < port.number() {
                let until = now + port.config().announce_interval.as_duration();
                port.hold_passive(until, now);
            }
            return;
        }

        let port_number = self.ports[index].number();
        let changed = self.domains[domain_index]
            .bmca
            .register_announce_message(port_number, announce, now);

        if changed {
            self.recompute_domain(domain_index, now);
        }
    }

    /// Run the election of one domain and apply its outcome to the ports
    fn recompute_domain(&mut self, domain_index: usize, now: Duration) {
        let outcome = self.domains[domain_index].bmca.recompute(now);

        if matches!(outcome.grandmaster, GrandmasterSelection::Local) {
            // Stay quiet until the startup listen window passed, someone may
            // already be master here
            if let Some(until) = self.domains[domain_index].listen_until {
                if now < until {
                    return;
                }
            }
        }

        self.apply_outcome(domain_index, outcome, now);
    }

    fn apply_outcome(&mut self, domain_index: usize, outcome: BmcaOutcome, now: Duration) {
        let domain = &mut self.domains[domain_index];

        let old_parent = domain.parent_ds.parent_port_identity;
        match outcome.grandmaster {
            GrandmasterSelection::Local => {
                domain.parent_ds = ParentDS::new(&domain.default_ds);
                domain.current_ds.steps_removed = 0;
                domain.current_ds.offset_from_master = Duration::ZERO;
            }
            GrandmasterSelection::Remote {
                vector,
                time_source,
            } => {
                domain.parent_ds.parent_port_identity = vector.sender_identity;
                domain.parent_ds.grandmaster_identity = vector.gm_identity;
                domain.parent_ds.grandmaster_clock_quality = vector.gm_clock_quality;
                domain.parent_ds.grandmaster_priority_1 = vector.gm_priority_1;
                domain.parent_ds.grandmaster_priority_2 = vector.gm_priority_2;
                domain.parent_ds.time_source = time_source;
                domain.current_ds.steps_removed = vector.steps_removed + 1;
            }
        }

        if domain.parent_ds.parent_port_identity != old_parent {
            // A different time source makes the accumulated controller
            // state meaningless
            domain.servo.reset();
        }

        let masters = outcome
            .roles
            .iter()
            .filter(|(_, role)| *role == PortRole::Master)
            .count();

        let mut master_index = 0usize;
        for (port_number, role) in outcome.roles {
            let Some(index) = self.port_index(port_number) else {
                continue;
            };

            // Fresh masters start transmitting spread out over a fraction of
            // the sync interval instead of all at once
            let stagger = if role == PortRole::Master {
                let interval = self.ports[index].config().sync_interval.as_duration();
                let stagger = interval * master_index as i32 / masters.max(1) as i32;
                master_index += 1;
                stagger
            } else {
                Duration::ZERO
            };

            self.ports[index].set_role(role, now, stagger);
        }
    }

    fn absorb_port_measurement(&mut self, index: usize, domain_index: usize) {
        let Some(measurement) = self.ports[index].take_measurement() else {
            return;
        };

        if !matches!(
            self.ports[index].role(),
            PortRole::Slave | PortRole::Uncalibrated
        ) {
            return;
        }

        let sync_interval = self.ports[index].config().sync_interval;
        let domain = &mut self.domains[domain_index];

        if let Some(output) = domain.servo.sample(measurement, sync_interval) {
            if output.lock_changed {
                let domain_number = domain.default_ds.domain_number;
                let event = if output.locked {
                    Event::ClockLocked {
                        domain: domain_number,
                    }
                } else {
                    Event::ClockUnlocked {
                        domain: domain_number,
                    }
                };
                push_event(&mut self.events, event);
            }

            domain.current_ds.offset_from_master = measurement.offset;
            self.discipline.apply(&output);
        }
    }

    fn emit_role_events(&mut self) {
        for index in 0..self.ports.len() {
            let role = self.ports[index].role();
            if role == self.last_roles[index] {
                continue;
            }
            self.last_roles[index] = role;

            let port_id = self.ports[index].identity();
            let event = match role {
                PortRole::Initializing => Event::PortBecameInitializing { port_id },
                PortRole::Faulty => Event::PortBecameFaulty { port_id },
                PortRole::Disabled => Event::PortBecameDisabled { port_id },
                PortRole::Listening => Event::PortBecameListening { port_id },
                PortRole::PreMaster => Event::PortBecamePreMaster { port_id },
                PortRole::Master => Event::PortBecameMaster { port_id },
                PortRole::Passive => Event::PortBecamePassive { port_id },
                PortRole::Uncalibrated => Event::PortBecameUncalibrated { port_id },
                PortRole::Slave => Event::PortBecameSlave {
                    port_id,
                    master_port_id: self.domains[self.port_domains[index]]
                        .parent_ds
                        .parent_port_identity,
                },
            };
            push_event(&mut self.events, event);
        }
    }

    fn port_index(&self, port_number: u16) -> Option<usize> {
        (port_number >= 1 && (port_number as usize) <= self.ports.len())
            .then(|| port_number as usize - 1)
    }

    fn domain_index_or_create(&mut self, domain_number: u8) -> usize {
        if let Some(index) = self
            .domains
            .iter()
            .position(|domain| domain.default_ds.domain_number == domain_number)
        {
            return index;
        }

        let default_ds = DefaultDS::new(self.config, domain_number);
        self.domains.push(DomainState {
            parent_ds: ParentDS::new(&default_ds),
            current_ds: CurrentDS::default(),
            bmca: Bmca::new(default_ds, self.config.grandmaster_capable),
            servo: Servo::new(self.servo_config),
            listen_until: None,
            default_ds,
        });

        self.domains.len() - 1
    }
}

fn push_event(events: &mut ArrayVec<Event, { 2 * MAX_PORTS }>, event: Event) {
    // Old unread notifications make room for new ones
    if events.is_full() {
        events.remove(0);
    }
    events.push(event);
}

fn forward_actions<T: Transport>(
    port_number: u16,
    actions: PortActionIterator<'_>,
    transport: &mut T,
    stats: &mut InstanceStatistics,
) {
    for action in actions {
        let result = match action {
            PortAction::SendEvent { context, data } => {
                transport.send_event(port_number, data, context)
            }
            PortAction::SendGeneral { data } => transport.send_general(port_number, data),
        };

        if let Err(error) = result {
            log::warn!("transport failed to send on port {port_number}: {error:?}");
            stats.transport_errors += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        config::ClockIdentity,
        datastructures::messages::MAX_DATA_LEN,
        port::TimestampContextInner,
        time::Interval,
    };

    const LOCAL_IDENTITY: ClockIdentity = ClockIdentity([0, 2, 3, 4, 5, 6, 7, 8]);
    const MASTER_IDENTITY: ClockIdentity = ClockIdentity([0, 1, 2, 3, 4, 5, 6, 7]);

    #[derive(Debug, Default)]
    struct TestClock {
        frequency_ppb: f64,
        steps: Vec<Duration>,
    }

    impl Clock for TestClock {
        type Error = core::convert::Infallible;

        fn now(&self) -> Time {
            Time::default()
        }

        fn adjust_frequency(&mut self, ppb: f64) -> Result<f64, Self::Error> {
            self.frequency_ppb = ppb;
            Ok(ppb)
        }

        fn adjust_phase(&mut self, offset: Duration) -> Result<(), Self::Error> {
            self.steps.push(offset);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct TestTransport {
        event_sends: Vec<(u16, Vec<u8>, TimestampContext)>,
        general_sends: Vec<(u16, Vec<u8>)>,
    }

    impl Transport for TestTransport {
        type Error = core::convert::Infallible;

        fn send_event(
            &mut self,
            port: u16,
            data: &[u8],
            context: TimestampContext,
        ) -> Result<(), Self::Error> {
            self.event_sends.push((port, data.to_vec(), context));
            Ok(())
        }

        fn send_general(&mut self, port: u16, data: &[u8]) -> Result<(), Self::Error> {
            self.general_sends.push((port, data.to_vec()));
            Ok(())
        }
    }

    fn instance_with_ports(ports: usize) -> GptpInstance<TestClock, StdRng> {
        let config = InstanceConfig {
            clock_identity: LOCAL_IDENTITY,
            priority_1: 248,
            priority_2: 248,
            clock_quality: Default::default(),
            grandmaster_capable: true,
        };

        let mut instance = GptpInstance::new(config, ServoConfig::default(), TestClock::default());
        for seed in 0..ports as u64 {
            instance.add_port(PortConfig::default(), StdRng::seed_from_u64(seed));
        }

        instance
    }

    fn master_default_ds() -> DefaultDS {
        DefaultDS::new(
            InstanceConfig {
                clock_identity: MASTER_IDENTITY,
                priority_1: 100,
                priority_2: 248,
                clock_quality: crate::config::ClockQuality {
                    clock_class: 6,
                    ..Default::default()
                },
                grandmaster_capable: true,
            },
            0,
        )
    }

    fn master_port_identity() -> PortIdentity {
        PortIdentity {
            clock_identity: MASTER_IDENTITY,
            port_number: 1,
        }
    }

    fn serialize(message: &Message) -> Vec<u8> {
        let mut buffer = [0; MAX_DATA_LEN];
        let len = message.serialize(&mut buffer).unwrap();
        buffer[..len].to_vec()
    }

    fn announce_bytes(sequence_id: u16) -> Vec<u8> {
        let default_ds = master_default_ds();
        let parent_ds = ParentDS::new(&default_ds);
        let current_ds = CurrentDS::default();

        serialize(&Message::announce(
            &default_ds,
            &parent_ds,
            &current_ds,
            master_port_identity(),
            sequence_id,
            Interval::ONE_SECOND,
        ))
    }

    /// Qualify the remote master on port 1 with two announces
    fn follow_remote_master(
        instance: &mut GptpInstance<TestClock, StdRng>,
        transport: &mut TestTransport,
    ) {
        for (seq, seconds) in [(0u16, 0i64), (1, 1)] {
            instance.handle_frame(
                1,
                &announce_bytes(seq),
                Time::from_secs(100),
                Duration::from_secs(seconds),
                transport,
            );
        }
    }

    /// Run the peer delay exchange on port 1 so a mean link delay exists.
    /// The timestamps produce a delay of exactly 200 us.
    fn measure_link_delay(
        instance: &mut GptpInstance<TestClock, StdRng>,
        transport: &mut TestTransport,
        now: Duration,
    ) {
        instance.handle_tick(now, transport);

        let (port, request, context) = transport.event_sends.pop().expect("pdelay request sent");
        assert_eq!(port, 1);
        let request = Message::deserialize(&request).unwrap();
        let request_header = *request.header();
        assert!(matches!(
            context.inner,
            TimestampContextInner::PDelayReq { .. }
        ));

        // t1 = 100.000000000
        instance.handle_send_timestamp(1, context, Time::from_secs(100), transport);

        // t2 = 100.000210000
        let default_ds = master_default_ds();
        let response = Message::pdelay_resp(
            &default_ds,
            master_port_identity(),
            &request_header,
            Time::from_secs_nanos(100, 210_000),
        );
        instance.handle_frame(
            1,
            &serialize(&response),
            Time::from_secs_nanos(100, 401_000),
            now,
            transport,
        );

        // t3 = 100.000211000, t4 = 100.000401000
        let follow_up = Message::pdelay_resp_follow_up(
            &default_ds,
            master_port_identity(),
            request_header.source_port_identity,
            request_header.sequence_id,
            Time::from_secs_nanos(100, 211_000),
        );
        instance.handle_frame(
            1,
            &serialize(&follow_up),
            Time::from_secs_nanos(100, 401_000),
            now,
            transport,
        );
    }

    fn drain_events(instance: &mut GptpInstance<TestClock, StdRng>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = instance.poll_event() {
            events.push(event);
        }
        events
    }

    #[test]
    fn lone_node_becomes_grandmaster_after_listening() {
        let mut instance = instance_with_ports(1);
        let mut transport = TestTransport::default();

        instance.handle_link_up(1, Duration::ZERO);
        assert_eq!(instance.status().ports[0].role, PortRole::Listening);

        // Within the listen window nothing claims the grandmaster role
        instance.handle_tick(Duration::from_secs(1), &mut transport);
        assert_eq!(instance.status().ports[0].role, PortRole::Listening);

        instance.handle_tick(Duration::from_millis(3100), &mut transport);
        let status = instance.status();
        assert_eq!(status.ports[0].role, PortRole::Master);
        assert!(status.domains[0].local_is_grandmaster);

        let events = drain_events(&mut instance);
        assert!(events.iter().any(|event| matches!(
            event,
            Event::PortBecameMaster { .. }
        )));

        // The next tick transmits announce and sync
        transport.general_sends.clear();
        transport.event_sends.clear();
        instance.handle_tick(Duration::from_millis(3200), &mut transport);

        assert_eq!(transport.general_sends[0].1.len(), 64);

        // The sync's follow up carries the precise transmit timestamp
        let (_, sync_bytes, context) = transport.event_sends.remove(0);
        assert_eq!(sync_bytes.len(), 44);
        let sync_sequence_id = Message::deserialize(&sync_bytes).unwrap().header().sequence_id;

        instance.handle_send_timestamp(1, context, Time::from_secs(50), &mut transport);

        let follow_up = transport.general_sends.last().unwrap();
        let follow_up_message = Message::deserialize(&follow_up.1).unwrap();
        assert_eq!(follow_up_message.header().sequence_id, sync_sequence_id);
        match follow_up_message.body {
            MessageBody::FollowUp(body) => {
                assert_eq!(Time::from(body.precise_origin_timestamp), Time::from_secs(50));
            }
            _ => panic!("expected a follow up"),
        }
    }

    #[test]
    fn better_master_takes_over() {
        let mut instance = instance_with_ports(2);
        let mut transport = TestTransport::default();

        instance.handle_link_up(1, Duration::ZERO);
        instance.handle_link_up(2, Duration::ZERO);

        follow_remote_master(&mut instance, &mut transport);

        let status = instance.status();
        // The slave port converges through Uncalibrated first
        assert_eq!(status.ports[0].role, PortRole::Uncalibrated);
        assert_eq!(status.ports[1].role, PortRole::Master);
        assert!(!status.domains[0].local_is_grandmaster);
        assert_eq!(status.domains[0].grandmaster_identity, MASTER_IDENTITY);
        assert_eq!(status.domains[0].steps_removed, 1);
    }

    #[test]
    fn sync_follow_up_disciplines_the_clock() {
        let mut instance = instance_with_ports(1);
        let mut transport = TestTransport::default();

        instance.handle_link_up(1, Duration::ZERO);
        follow_remote_master(&mut instance, &mut transport);
        measure_link_delay(&mut instance, &mut transport, Duration::from_millis(1100));

        // ((t4 - t1) - (t3 - t2)) / 2 = (401 us - 1 us) / 2
        assert_eq!(instance.status().ports[0].mean_link_delay_ns, Some(200_000));

        let default_ds = master_default_ds();

        // A two step sync arrives at t2 = 1000.0015, sent at t1 = 1000.0
        let sync = Message::sync(
            &default_ds,
            master_port_identity(),
            0,
            Interval::EIGHT_PER_SECOND,
        );
        instance.handle_frame(
            1,
            &serialize(&sync),
            Time::from_secs_nanos(1000, 1_500_000),
            Duration::from_millis(1200),
            &mut transport,
        );

        let follow_up = Message::follow_up(
            &default_ds,
            master_port_identity(),
            0,
            Interval::EIGHT_PER_SECOND,
            Time::from_secs(1000),
        );
        instance.handle_frame(
            1,
            &serialize(&follow_up),
            Time::from_secs_nanos(1000, 1_500_000),
            Duration::from_millis(1201),
            &mut transport,
        );

        let status = instance.status();
        assert_eq!(status.ports[0].role, PortRole::Slave);

        // offset = (t2 - t1) - mean link delay = 1.5 ms - 200 us
        assert_eq!(status.domains[0].offset_from_master_ns, 1_300_000);

        // Beyond the phase threshold the clock is stepped back by the
        // offset, and the frequency output saturates at the configured bound
        assert_eq!(
            instance.clock().steps,
            [-Duration::from_nanos(1_300_000)]
        );
        assert_eq!(instance.clock().frequency_ppb, -100_000.0);

        let events = drain_events(&mut instance);
        assert!(events.iter().any(|event| matches!(
            event,
            Event::PortBecameSlave { .. }
        )));
    }

    #[test]
    fn announce_timeout_reverts_to_local_grandmaster() {
        let mut instance = instance_with_ports(1);
        let mut transport = TestTransport::default();

        instance.handle_link_up(1, Duration::ZERO);
        follow_remote_master(&mut instance, &mut transport);
        assert_eq!(instance.status().ports[0].role, PortRole::Uncalibrated);

        // Three announce intervals pass without any announce
        instance.handle_tick(Duration::from_millis(4200), &mut transport);

        let status = instance.status();
        assert_eq!(status.ports[0].role, PortRole::Master);
        assert!(status.domains[0].local_is_grandmaster);
    }

    #[test]
    fn masters_start_staggered() {
        let mut instance = instance_with_ports(2);
        let mut transport = TestTransport::default();

        instance.handle_link_up(1, Duration::ZERO);
        instance.handle_link_up(2, Duration::ZERO);

        // Both ports become master after the listen window
        instance.handle_tick(Duration::from_millis(3100), &mut transport);
        transport.event_sends.clear();

        // Walk time forward in small ticks and note when each port first
        // transmits its sync
        let mut first_sync: [Option<i64>; 2] = [None, None];
        for ms in 3101..3300 {
            instance.handle_tick(Duration::from_millis(ms), &mut transport);
            for (port, data, _) in transport.event_sends.drain(..) {
                if data.len() == 44 && first_sync[port as usize - 1].is_none() {
                    first_sync[port as usize - 1] = Some(ms);
                }
            }
        }

        let first = first_sync[0].expect("port 1 sent a sync");
        let second = first_sync[1].expect("port 2 sent a sync");

        // The second master starts half a sync interval later
        assert!(second >= first + 50);
    }

    #[test]
    fn frames_for_unknown_ports_or_domains_are_counted() {
        let mut instance = instance_with_ports(1);
        let mut transport = TestTransport::default();
        instance.handle_link_up(1, Duration::ZERO);

        // Garbage
        instance.handle_frame(
            1,
            &[0u8; 10],
            Time::default(),
            Duration::ZERO,
            &mut transport,
        );
        assert_eq!(instance.statistics().malformed_frames, 1);

        // Unknown port
        instance.handle_frame(
            9,
            &announce_bytes(0),
            Time::default(),
            Duration::ZERO,
            &mut transport,
        );
        assert_eq!(instance.statistics().unknown_ports, 1);

        // Wrong domain
        let default_ds = DefaultDS::new(
            InstanceConfig {
                clock_identity: MASTER_IDENTITY,
                priority_1: 100,
                priority_2: 248,
                clock_quality: Default::default(),
                grandmaster_capable: true,
            },
            5,
        );
        let parent_ds = ParentDS::new(&default_ds);
        let announce = Message::announce(
            &default_ds,
            &parent_ds,
            &CurrentDS::default(),
            master_port_identity(),
            0,
            Interval::ONE_SECOND,
        );
        instance.handle_frame(
            1,
            &serialize(&announce),
            Time::default(),
            Duration::ZERO,
            &mut transport,
        );
        assert_eq!(instance.statistics().wrong_domain_frames, 1);
    }

    #[test]
    fn announce_from_self_is_ignored() {
        let mut instance = instance_with_ports(2);
        let mut transport = TestTransport::default();
        instance.handle_link_up(1, Duration::ZERO);
        instance.handle_link_up(2, Duration::ZERO);

        let default_ds = DefaultDS::new(
            InstanceConfig {
                clock_identity: LOCAL_IDENTITY,
                priority_1: 248,
                priority_2: 248,
                clock_quality: Default::default(),
                grandmaster_capable: true,
            },
            0,
        );
        let parent_ds = ParentDS::new(&default_ds);
        let announce = Message::announce(
            &default_ds,
            &parent_ds,
            &CurrentDS::default(),
            PortIdentity {
                clock_identity: LOCAL_IDENTITY,
                port_number: 1,
            },
            0,
            Interval::ONE_SECOND,
        );

        // Port 2 hears port 1 of this same instance
        instance.handle_frame(
            2,
            &serialize(&announce),
            Time::default(),
            Duration::from_secs(1),
            &mut transport,
        );

        assert_eq!(instance.statistics().announces_from_self, 1);
        // The higher numbered port backs off
        assert_eq!(instance.status().ports[1].role, PortRole::Passive);
    }

    #[test]
    fn at_most_one_slave_per_domain() {
        let mut instance = instance_with_ports(2);
        let mut transport = TestTransport::default();
        instance.handle_link_up(1, Duration::ZERO);
        instance.handle_link_up(2, Duration::ZERO);

        // Equally good masters that differ only in their identity
        for port in [1u16, 2] {
            let identity = ClockIdentity([0, 1, 2, 3, 4, 5, 6, port as u8]);
            let default_ds = DefaultDS::new(
                InstanceConfig {
                    clock_identity: identity,
                    priority_1: 100,
                    priority_2: 248,
                    clock_quality: Default::default(),
                    grandmaster_capable: true,
                },
                0,
            );
            let parent_ds = ParentDS::new(&default_ds);
            for (seq, seconds) in [(0u16, 0i64), (1, 1)] {
                let announce = Message::announce(
                    &default_ds,
                    &parent_ds,
                    &CurrentDS::default(),
                    PortIdentity {
                        clock_identity: identity,
                        port_number: 1,
                    },
                    seq,
                    Interval::ONE_SECOND,
                );
                instance.handle_frame(
                    port,
                    &serialize(&announce),
                    Time::from_secs(100),
                    Duration::from_secs(seconds),
                    &mut transport,
                );
            }
        }

        let status = instance.status();
        let slaves = status
            .ports
            .iter()
            .filter(|port| {
                matches!(port.role, PortRole::Slave | PortRole::Uncalibrated)
            })
            .count();
        assert_eq!(slaves, 1);

        // The lower identity wins, seen on port 1
        assert_eq!(status.ports[0].role, PortRole::Uncalibrated);
        assert_eq!(status.ports[1].role, PortRole::Passive);
        assert_eq!(
            status.domains[0].grandmaster_identity,
            ClockIdentity([0, 1, 2, 3, 4, 5, 6, 1])
        );
    }
}
