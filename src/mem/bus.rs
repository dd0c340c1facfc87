//! Bus packets and channels.
//!
//! Commands and data travel between the controller and the ranks as
//! [`BusPacket`]s over two independent single-slot channels. A channel holds
//! at most one packet with a delivery countdown; attempting to place a
//! second packet is a collision, which callers treat as fatal.

use std::fmt;

/// Kind of packet on the command or data bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Open a row in a bank.
    Activate,
    /// Column read leaving the row open.
    Read,
    /// Column read with auto-precharge.
    ReadP,
    /// Column write leaving the row open.
    Write,
    /// Column write with auto-precharge.
    WriteP,
    /// Close the open row of a bank.
    Precharge,
    /// Refresh every bank of a rank.
    Refresh,
    /// A data burst on the data bus.
    Data,
}

impl CommandKind {
    /// Returns the display name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Activate => "ACTIVATE",
            CommandKind::Read => "READ",
            CommandKind::ReadP => "READ_P",
            CommandKind::Write => "WRITE",
            CommandKind::WriteP => "WRITE_P",
            CommandKind::Precharge => "PRECHARGE",
            CommandKind::Refresh => "REFRESH",
            CommandKind::Data => "DATA",
        }
    }

    /// Whether this is a write column command.
    pub fn is_write(&self) -> bool {
        matches!(self, CommandKind::Write | CommandKind::WriteP)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One packet on a bus.
#[derive(Clone, Debug)]
pub struct BusPacket {
    /// Packet kind.
    pub kind: CommandKind,
    /// Physical address the packet refers to.
    pub address: u64,
    /// Target row.
    pub row: u64,
    /// Target column.
    pub column: u64,
    /// Target rank.
    pub rank: usize,
    /// Target bank.
    pub bank: usize,
    /// Payload for data packets and write commands.
    pub data: u64,
    /// Marks defence padding traffic.
    pub is_fake: bool,
    /// Security domain of the originating transaction.
    pub security_domain: u64,
}

impl BusPacket {
    /// Creates a packet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: CommandKind,
        address: u64,
        column: u64,
        row: u64,
        rank: usize,
        bank: usize,
        data: u64,
        is_fake: bool,
        security_domain: u64,
    ) -> Self {
        Self {
            kind,
            address,
            row,
            column,
            rank,
            bank,
            data,
            is_fake,
            security_domain,
        }
    }
}

impl fmt::Display for BusPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} addr={:#x} r={} b={} row={:#x} col={:#x}{}",
            self.kind,
            self.address,
            self.rank,
            self.bank,
            self.row,
            self.column,
            if self.is_fake { " fake" } else { "" }
        )
    }
}

/// A single-slot bus with a delivery countdown.
#[derive(Debug, Default)]
pub struct BusChannel {
    slot: Option<BusPacket>,
    cycles_left: u64,
}

impl BusChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a packet is currently in flight.
    pub fn occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Places a packet on the channel for `cycles` cycles.
    ///
    /// The caller must have checked [`BusChannel::occupied`]; issuing onto
    /// an occupied channel is a bus collision and the packet already in
    /// flight would be lost.
    pub fn issue(&mut self, packet: BusPacket, cycles: u64) {
        debug_assert!(self.slot.is_none());
        self.slot = Some(packet);
        self.cycles_left = cycles;
    }

    /// Advances the channel one cycle.
    ///
    /// # Returns
    ///
    /// The packet, once its countdown expires and it reaches the far end.
    pub fn tick(&mut self) -> Option<BusPacket> {
        if self.slot.is_some() {
            self.cycles_left -= 1;
            if self.cycles_left == 0 {
                return self.slot.take();
            }
        }
        None
    }
}
