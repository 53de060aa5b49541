//! The per domain coordinator of the best master clock algorithm

use arrayvec::ArrayVec;

use super::{
    dataset_comparison::PriorityVector,
    foreign_master::ForeignMasterList,
};
use crate::{
    datastructures::{
        common::{PortIdentity, TimeSource},
        datasets::DefaultDS,
        messages::AnnounceMessage,
    },
    port::PortRole,
    time::Duration,
    MAX_PORTS,
};

/// The master a domain has settled on
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum GrandmasterSelection {
    /// Our own clock is the time reference of the domain
    Local,
    /// A remote clock is the time reference of the domain
    Remote {
        vector: PriorityVector,
        time_source: TimeSource,
    },
}

/// The decisions of one BMCA run
#[derive(Debug)]
pub(crate) struct BmcaOutcome {
    pub(crate) roles: ArrayVec<(u16, PortRole), MAX_PORTS>,
    pub(crate) grandmaster: GrandmasterSelection,
}

/// Object implementing the best master clock algorithm for a single domain
///
/// Usage:
///
/// - The instance creates one of these per domain and registers the ports of
///   the domain with [`Bmca::register_port`]
/// - Announce messages received on those ports go into
///   [`Bmca::register_announce_message`]
/// - [`Bmca::recompute`] runs the state decision algorithm and returns a role
///   per port together with the selected grandmaster
/// - [`Bmca::sweep_timeouts`] ages out foreign masters; when it reports a
///   removal the instance recomputes immediately
#[derive(Debug)]
pub(crate) struct Bmca {
    own_data: DefaultDS,
    grandmaster_capable: bool,
    ports: ArrayVec<PortRecords, MAX_PORTS>,
}

#[derive(Debug)]
struct PortRecords {
    port_number: u16,
    identity: PortIdentity,
    foreign_masters: ForeignMasterList,
}

impl Bmca {
    pub(crate) fn new(own_data: DefaultDS, grandmaster_capable: bool) -> Self {
        Self {
            own_data,
            grandmaster_capable,
            ports: ArrayVec::new(),
        }
    }

    pub(crate) fn register_port(
        &mut self,
        port_number: u16,
        identity: PortIdentity,
        announce_receipt_timeout: u8,
    ) {
        self.ports.push(PortRecords {
            port_number,
            identity,
            foreign_masters: ForeignMasterList::new(identity, announce_receipt_timeout),
        });
    }

    /// Register a received announce message. Returns whether the message
    /// changed the set of candidates.
    pub(crate) fn register_announce_message(
        &mut self,
        port_number: u16,
        message: &AnnounceMessage,
        now: Duration,
    ) -> bool {
        match self.port_mut(port_number) {
            Some(port) => port.foreign_masters.register_announce_message(message, now),
            None => false,
        }
    }

    /// Drop timed out foreign masters on all ports. Returns whether any
    /// record was removed.
    pub(crate) fn sweep_timeouts(&mut self, now: Duration) -> bool {
        let mut any = false;
        for port in &mut self.ports {
            any |= port.foreign_masters.purge_timed_out(now);
        }
        any
    }

    /// Forget everything learned on a port, used when the port goes down
    pub(crate) fn clear_port(&mut self, port_number: u16) {
        if let Some(port) = self.port_mut(port_number) {
            port.foreign_masters.clear();
        }
    }

    /// Run the state decision algorithm over all ports of the domain
    pub(crate) fn recompute(&mut self, now: Duration) -> BmcaOutcome {
        let local = PriorityVector::from_own_data(&self.own_data);

        // The best qualified candidate per port, Erbest
        let mut port_bests: ArrayVec<(u16, PriorityVector, TimeSource), MAX_PORTS> =
            ArrayVec::new();
        for port in &mut self.ports {
            if let Some(best) = port.foreign_masters.best_qualified(now) {
                port_bests.push((port.port_number, best.vector(), best.time_source()));
            }
        }

        // The best candidate across the domain, Ebest
        let domain_best = port_bests
            .iter()
            .max_by(|(_, a, _), (_, b, _)| a.compare(b).as_ordering())
            .copied();

        let remote_is_better = match &domain_best {
            Some((_, best, _)) => best.compare(&local).is_better(),
            None => false,
        };

        if !remote_is_better {
            return self.recompute_local_best();
        }

        let (_, best_vector, best_time_source) = domain_best.unwrap();

        // Every port whose Erbest equals Ebest is a slave candidate; the
        // record with the smallest sender identity wins so that exactly one
        // port ends up in the slave role
        let slave_port = port_bests
            .iter()
            .filter(|(_, v, _)| v.compare(&best_vector).as_ordering().is_eq())
            .min_by_key(|(port_number, v, _)| (v.sender_identity, *port_number))
            .map(|(port_number, _, _)| *port_number)
            .expect("domain best comes from some port");

        let mut roles = ArrayVec::new();
        for port in &self.ports {
            let role = if port.port_number == slave_port {
                PortRole::Slave
            } else {
                match port_bests
                    .iter()
                    .find(|(number, _, _)| *number == port.port_number)
                {
                    // A port that hears a candidate better than our own
                    // clock must not transmit as master into that network
                    Some((_, vector, _)) if vector.compare(&local).is_better() => {
                        PortRole::Passive
                    }
                    _ => PortRole::Master,
                }
            };
            roles.push((port.port_number, role));
        }

        BmcaOutcome {
            roles,
            grandmaster: GrandmasterSelection::Remote {
                vector: best_vector,
                time_source: best_time_source,
            },
        }
    }

    fn recompute_local_best(&self) -> BmcaOutcome {
        let mut roles = ArrayVec::new();
        for port in &self.ports {
            // A node that is not allowed to act as grandmaster keeps
            // listening until a real master shows up
            let role = if self.grandmaster_capable {
                PortRole::Master
            } else {
                PortRole::Listening
            };
            roles.push((port.port_number, role));
        }

        BmcaOutcome {
            roles,
            grandmaster: GrandmasterSelection::Local,
        }
    }

    fn port_mut(&mut self, port_number: u16) -> Option<&mut PortRecords> {
        self.ports
            .iter_mut()
            .find(|port| port.port_number == port_number)
    }
}
