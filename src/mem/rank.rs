//! Rank device model.
//!
//! A rank consumes command and data packets delivered over the buses and
//! models the device side of the protocol: read bursts come back as DATA
//! packets after the read latency plus the burst time, write bursts land in
//! a small backing store, and REFRESH clears the pre-wake flag the
//! controller raises ahead of a due refresh.
//!
//! Ranks never call back into the controller. Their per-cycle [`Rank::update`]
//! yields any read data that is due this cycle, and the controller feeds it
//! to its own return path.

use std::collections::{HashMap, VecDeque};

use log::trace;

use super::bus::{BusPacket, CommandKind};
use crate::common::SimError;
use crate::config::DeviceConfig;

/// Device-side model of one rank.
#[derive(Debug)]
pub struct Rank {
    id: usize,
    /// Raised by the controller when a refresh is due (or imminent while
    /// powered down); cleared when the REFRESH command arrives.
    pub refresh_waiting: bool,
    powered_down: bool,

    read_return: VecDeque<(u64, BusPacket)>,
    store: HashMap<u64, u64>,

    read_latency: u64,
}

impl Rank {
    /// Creates a rank.
    ///
    /// # Arguments
    ///
    /// * `id` - Rank index within the channel.
    /// * `device` - Device timing; read data returns `RL + BL/2` cycles
    ///   after the column command arrives.
    pub fn new(id: usize, device: &DeviceConfig) -> Self {
        Self {
            id,
            refresh_waiting: false,
            powered_down: false,
            read_return: VecDeque::new(),
            store: HashMap::new(),
            read_latency: device.rl() + device.burst_cycles(),
        }
    }

    /// Advances the rank one cycle.
    ///
    /// # Returns
    ///
    /// A DATA packet when a read burst completes this cycle.
    pub fn update(&mut self) -> Option<BusPacket> {
        for entry in self.read_return.iter_mut() {
            if entry.0 > 0 {
                entry.0 -= 1;
            }
        }
        if let Some((cycles_left, _)) = self.read_return.front() {
            if *cycles_left == 0 {
                return self.read_return.pop_front().map(|(_, packet)| packet);
            }
        }
        None
    }

    /// Consumes a packet delivered from a bus.
    pub fn receive_from_bus(&mut self, packet: BusPacket) -> Result<(), SimError> {
        if packet.rank != self.id {
            return Err(SimError::UnexpectedPacket {
                kind: packet.kind.name(),
                target: "rank",
            });
        }
        trace!("rank {}: received {}", self.id, packet);

        match packet.kind {
            CommandKind::Read | CommandKind::ReadP => {
                let data = self.store.get(&packet.address).copied().unwrap_or(0);
                let response = BusPacket::new(
                    CommandKind::Data,
                    packet.address,
                    packet.column,
                    packet.row,
                    packet.rank,
                    packet.bank,
                    data,
                    packet.is_fake,
                    packet.security_domain,
                );
                self.read_return.push_back((self.read_latency, response));
                Ok(())
            }
            CommandKind::Data => {
                self.store.insert(packet.address, packet.data);
                Ok(())
            }
            CommandKind::Refresh => {
                self.refresh_waiting = false;
                Ok(())
            }
            CommandKind::Activate
            | CommandKind::Precharge
            | CommandKind::Write
            | CommandKind::WriteP => Ok(()),
        }
    }

    /// Enters power-down mode.
    pub fn power_down(&mut self) {
        self.powered_down = true;
    }

    /// Leaves power-down mode.
    pub fn power_up(&mut self) {
        self.powered_down = false;
    }

    /// Whether the rank is powered down.
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Reads back a stored payload; test and diagnostic hook.
    pub fn stored(&self, address: u64) -> Option<u64> {
        self.store.get(&address).copied()
    }
}
