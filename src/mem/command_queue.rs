//! Bounded command queue.
//!
//! Decomposed commands wait here in per-rank-per-bank FIFOs until the bank
//! timing tables allow them to issue. Each cycle the controller asks for at
//! most one command via [`CommandQueue::pop`]; refresh preparation takes
//! priority over normal traffic, and normal traffic is serviced round-robin
//! across (rank, bank) pairs to keep a busy bank from starving the rest.
//!
//! The queue reads bank states through an immutable borrow and returns its
//! decision by value; all state mutation stays with the controller.

use std::collections::VecDeque;

use log::trace;

use super::bank::{BankState, BankStatus};
use super::bus::{BusPacket, CommandKind};
use crate::common::SimError;

/// Per-rank-per-bank bounded command FIFOs.
#[derive(Debug)]
pub struct CommandQueue {
    queues: Vec<Vec<VecDeque<BusPacket>>>,
    depth: usize,
    num_ranks: usize,
    num_banks: usize,

    /// Rank currently awaiting a refresh, if any.
    refresh_rank: usize,
    refresh_waiting: bool,

    next_rank: usize,
    next_bank: usize,

    cycle: u64,

    /// Instruction-side defence domain, assigned by `init_cq_defence`.
    pub i_defence_domain: Option<u64>,
    /// Data-side defence domain, assigned by `init_cq_defence`.
    pub d_defence_domain: Option<u64>,
}

impl CommandQueue {
    /// Creates an empty queue set.
    ///
    /// # Arguments
    ///
    /// * `num_ranks` - Ranks in the channel.
    /// * `num_banks` - Banks per rank.
    /// * `depth` - Capacity of each per-bank FIFO.
    pub fn new(num_ranks: usize, num_banks: usize, depth: usize) -> Self {
        Self {
            queues: (0..num_ranks)
                .map(|_| (0..num_banks).map(|_| VecDeque::new()).collect())
                .collect(),
            depth,
            num_ranks,
            num_banks,
            refresh_rank: 0,
            refresh_waiting: false,
            next_rank: 0,
            next_bank: 0,
            cycle: 0,
            i_defence_domain: None,
            d_defence_domain: None,
        }
    }

    /// Whether `count` more commands fit in the (rank, bank) FIFO.
    pub fn has_room_for(&self, count: usize, rank: usize, bank: usize) -> bool {
        self.queues[rank][bank].len() + count <= self.depth
    }

    /// Whether every FIFO of `rank` is empty.
    pub fn is_empty(&self, rank: usize) -> bool {
        self.queues[rank].iter().all(|q| q.is_empty())
    }

    /// Appends a command to its (rank, bank) FIFO.
    pub fn enqueue(&mut self, packet: BusPacket) -> Result<(), SimError> {
        let (rank, bank) = (packet.rank, packet.bank);
        let queue = &mut self.queues[rank][bank];
        if queue.len() >= self.depth {
            return Err(SimError::CommandQueueOverflow { rank, bank });
        }
        queue.push_back(packet);
        Ok(())
    }

    /// Latches a refresh request for `rank`.
    ///
    /// Until the REFRESH issues, no new ACTIVATE is sent to that rank and
    /// open rows are precharged ahead of normal traffic.
    pub fn need_refresh(&mut self, rank: usize) {
        self.refresh_rank = rank;
        self.refresh_waiting = true;
    }

    /// Assigns the defence domains used by the admission-side policies.
    pub fn set_defence_domains(&mut self, i_domain: u64, d_domain: u64) {
        self.i_defence_domain = Some(i_domain);
        self.d_defence_domain = Some(d_domain);
    }

    /// Advances the queue's cycle counter.
    pub fn step(&mut self) {
        self.cycle += 1;
    }

    /// Selects at most one issuable command this cycle.
    ///
    /// Refresh preparation runs first: an open bank in the waiting rank is
    /// precharged as soon as its timing allows, and the REFRESH itself
    /// issues once every bank of the rank sits idle past `next_activate`.
    /// Otherwise the FIFO heads are scanned round-robin and the first head
    /// that satisfies the bank timing tables is returned.
    ///
    /// # Arguments
    ///
    /// * `banks` - Bank state table indexed `[rank][bank]`.
    pub fn pop(&mut self, banks: &[Vec<BankState>]) -> Option<BusPacket> {
        if self.refresh_waiting {
            if let Some(packet) = self.try_refresh(banks) {
                trace!("cq: issuing {}", packet);
                return Some(packet);
            }
        }

        for _ in 0..self.num_ranks * self.num_banks {
            let (rank, bank) = (self.next_rank, self.next_bank);
            self.advance_cursor();

            let head = match self.queues[rank][bank].front() {
                Some(head) => head,
                None => continue,
            };

            // A rank waiting on refresh must drain, not open new rows.
            if self.refresh_waiting
                && rank == self.refresh_rank
                && head.kind == CommandKind::Activate
            {
                continue;
            }

            if self.is_issuable(head, banks) {
                let packet = self.queues[rank][bank].pop_front();
                if let Some(ref p) = packet {
                    trace!("cq: issuing {}", p);
                }
                return packet;
            }
        }
        None
    }

    /// Attempts refresh preparation for the waiting rank.
    fn try_refresh(&mut self, banks: &[Vec<BankState>]) -> Option<BusPacket> {
        let rank = self.refresh_rank;
        let mut blocked = false;

        for (bank, state) in banks[rank].iter().enumerate() {
            match state.current_state {
                BankStatus::RowActive => {
                    // Close the row first, if timing permits.
                    if self.cycle >= state.next_precharge {
                        let row = state.open_row.unwrap_or(0);
                        return Some(BusPacket::new(
                            CommandKind::Precharge,
                            0,
                            0,
                            row,
                            rank,
                            bank,
                            0,
                            false,
                            0,
                        ));
                    }
                    blocked = true;
                }
                BankStatus::Idle => {
                    if self.cycle < state.next_activate {
                        blocked = true;
                    }
                }
                _ => blocked = true,
            }
        }

        if blocked {
            return None;
        }

        self.refresh_waiting = false;
        Some(BusPacket::new(
            CommandKind::Refresh,
            0,
            0,
            0,
            rank,
            0,
            0,
            false,
            0,
        ))
    }

    /// Whether `packet` may issue against the bank timing tables this cycle.
    fn is_issuable(&self, packet: &BusPacket, banks: &[Vec<BankState>]) -> bool {
        let state = &banks[packet.rank][packet.bank];
        match packet.kind {
            CommandKind::Activate => {
                state.current_state == BankStatus::Idle && self.cycle >= state.next_activate
            }
            CommandKind::Read | CommandKind::ReadP => {
                state.current_state == BankStatus::RowActive
                    && self.cycle >= state.next_read
                    && state.open_row == Some(packet.row)
            }
            CommandKind::Write | CommandKind::WriteP => {
                state.current_state == BankStatus::RowActive
                    && self.cycle >= state.next_write
                    && state.open_row == Some(packet.row)
            }
            CommandKind::Precharge => {
                state.current_state == BankStatus::RowActive
                    && self.cycle >= state.next_precharge
            }
            CommandKind::Refresh => banks[packet.rank].iter().all(|b| {
                b.current_state == BankStatus::Idle && self.cycle >= b.next_activate
            }),
            CommandKind::Data => false,
        }
    }

    fn advance_cursor(&mut self) {
        self.next_bank += 1;
        if self.next_bank == self.num_banks {
            self.next_bank = 0;
            self.next_rank = (self.next_rank + 1) % self.num_ranks;
        }
    }
}
