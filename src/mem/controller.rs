//! Memory controller core.
//!
//! The controller is driven by a single global tick: `update` runs once per
//! DRAM clock cycle and executes, in order, the bank countdown machine, bus
//! packet progression, the write-data FIFO, refresh orchestration, command
//! issue with its bank-state effects, the active scheduler policy, power
//! accounting, and the read return path.
//!
//! The controller exclusively owns the bank state table, every queue, the
//! command queue, and the rank models; nothing here shares state across
//! threads or calls back into the controller from below.

use log::{debug, trace};

use super::bank::{BankState, BankStatus};
use super::bus::{BusChannel, BusPacket, CommandKind};
use super::command_queue::CommandQueue;
use super::rank::Rank;
use super::transaction::{Transaction, TransactionKind};
use crate::common::{AddressMapper, SimError};
use crate::config::{Config, Protection};
use crate::defence::{DefenceDag, DefenceEngine};
use crate::stats::{ControllerStats, DefenceTotals};

use std::collections::VecDeque;

/// Client completion callbacks.
///
/// Registered once on the controller; `read_complete` fires exactly once
/// per real (non-fake) read, `write_complete` when a write burst has been
/// delivered to its rank.
pub trait TransactionCallback {
    /// A real read completed.
    fn read_complete(&mut self, system_id: u64, address: u64, cycle: u64);

    /// Write data reached the rank.
    fn write_complete(&mut self, system_id: u64, address: u64, cycle: u64);
}

/// Cycle-accurate DRAM memory controller with protection policies.
pub struct MemoryController {
    config: Config,
    system_id: u64,

    cycle: u64,
    current_domain: u64,

    bank_states: Vec<Vec<BankState>>,
    command_queue: CommandQueue,
    ranks: Vec<Rank>,
    mapper: AddressMapper,

    cmd_bus: BusChannel,
    data_bus: BusChannel,

    write_data_to_send: VecDeque<BusPacket>,
    write_data_countdown: VecDeque<u64>,

    transaction_queue: Vec<Transaction>,
    defence_queue: Vec<Transaction>,
    pending_read_transactions: Vec<Transaction>,
    return_transaction: VecDeque<Transaction>,

    refresh_countdown: Vec<u64>,
    refresh_rank: usize,
    power_down: Vec<bool>,

    defence: DefenceEngine,
    stats: ControllerStats,
    callbacks: Option<Box<dyn TransactionCallback>>,
}

impl MemoryController {
    /// Creates a controller from configuration.
    ///
    /// Per-rank refresh countdowns are staggered so the ranks refresh
    /// spread across the interval instead of back to back. Ranks must be
    /// attached with [`MemoryController::attach_ranks`] before the first
    /// `update`.
    pub fn new(config: &Config, system_id: u64) -> Self {
        let num_ranks = config.device.num_ranks as usize;
        let num_banks = config.device.num_banks as usize;
        let refresh_cycles = config.device.refresh_cycles();

        let refresh_countdown = (0..num_ranks as u64)
            .map(|i| (refresh_cycles / num_ranks as u64) * (i + 1))
            .collect();

        Self {
            config: config.clone(),
            system_id,
            cycle: 0,
            current_domain: 0,
            bank_states: vec![vec![BankState::new(); num_banks]; num_ranks],
            command_queue: CommandQueue::new(num_ranks, num_banks, config.system.cmd_queue_depth),
            ranks: Vec::new(),
            mapper: AddressMapper::new(
                1,
                config.device.num_ranks,
                config.device.num_banks,
                config.device.num_rows,
                config.device.num_cols,
                config.device.transaction_bytes(),
            ),
            cmd_bus: BusChannel::new(),
            data_bus: BusChannel::new(),
            write_data_to_send: VecDeque::new(),
            write_data_countdown: VecDeque::new(),
            transaction_queue: Vec::with_capacity(config.system.trans_queue_depth),
            defence_queue: Vec::with_capacity(config.system.defence_queue_depth),
            pending_read_transactions: Vec::new(),
            return_transaction: VecDeque::new(),
            refresh_countdown,
            refresh_rank: 0,
            power_down: vec![false; num_ranks],
            defence: DefenceEngine::new(&config.defence),
            stats: ControllerStats::new(num_ranks, num_banks),
            callbacks: None,
        }
    }

    /// Hands the controller its rank models.
    pub fn attach_ranks(&mut self, ranks: Vec<Rank>) {
        self.ranks = ranks;
    }

    /// Registers the client completion callbacks.
    pub fn register_callbacks(&mut self, callbacks: Box<dyn TransactionCallback>) {
        self.callbacks = Some(callbacks);
    }

    /// Installs the defence DAG document.
    pub fn set_dag(&mut self, dag: DefenceDag) {
        self.defence.set_dag(dag);
    }

    /// Starts the defence DAG for the given domain at the current cycle.
    pub fn init_defence(&mut self, domain_id: u64) -> Result<(), SimError> {
        self.defence.init(domain_id, self.cycle)
    }

    /// Assigns the command queue's defence domains.
    pub fn init_cq_defence(&mut self, i_domain: u64, d_domain: u64) {
        self.command_queue.set_defence_domains(i_domain, d_domain);
    }

    /// Whether the transaction queue can take one more entry.
    pub fn will_accept_transaction(&self) -> bool {
        self.transaction_queue.len() < self.config.system.trans_queue_depth
    }

    /// Whether the defence queue can take one more entry.
    pub fn will_accept_defence_transaction(&self) -> bool {
        self.defence_queue.len() < self.config.system.defence_queue_depth
    }

    /// Admits a client transaction.
    ///
    /// Defence-domain traffic routes to the defence queue while a DAG is
    /// active; everything else lands in the transaction queue. Rejected
    /// transactions leave the controller untouched.
    ///
    /// # Returns
    ///
    /// `false` when the target queue is full.
    pub fn add_transaction(&mut self, mut transaction: Transaction) -> bool {
        debug!(
            "new transaction addr={:#x} domain={} write={} cycle={}",
            transaction.address,
            transaction.security_domain,
            transaction.kind == TransactionKind::DataWrite,
            self.cycle
        );

        if self.defence.active() && transaction.security_domain == self.defence.domain() {
            if !self.will_accept_defence_transaction() {
                return false;
            }
            transaction.time_added = self.cycle;
            self.defence_queue.push(transaction);
            return true;
        }

        if !self.will_accept_transaction() {
            return false;
        }
        transaction.time_added = self.cycle;
        self.transaction_queue.push(transaction);
        true
    }

    /// Accepts a DATA packet returning from a rank.
    ///
    /// Anything other than DATA on the return path is a protocol violation.
    pub fn receive_from_bus(&mut self, packet: BusPacket) -> Result<(), SimError> {
        if packet.kind != CommandKind::Data {
            return Err(SimError::UnexpectedPacket {
                kind: packet.kind.name(),
                target: "controller",
            });
        }
        trace!("mc: receiving from data bus {}", packet);

        let idx = self.stats.seq(packet.rank, packet.bank);
        self.stats.total_reads_per_bank[idx] += 1;
        self.return_transaction
            .push_back(Transaction::return_data(packet.address, packet.data));
        Ok(())
    }

    /// Advances the controller by one DRAM clock cycle.
    pub fn update(&mut self) -> Result<(), SimError> {
        let now = self.cycle;

        // Read data the ranks finished this cycle enters the return path.
        let mut returned = Vec::new();
        for rank in self.ranks.iter_mut() {
            if let Some(packet) = rank.update() {
                returned.push(packet);
            }
        }
        for packet in returned {
            self.receive_from_bus(packet)?;
        }

        // Implicit bank state transitions.
        let t_rp = self.config.device.t_rp;
        for rank_states in self.bank_states.iter_mut() {
            for bank in rank_states.iter_mut() {
                bank.tick(t_rp);
            }
        }

        // Outgoing command packet countdown.
        if let Some(packet) = self.cmd_bus.tick() {
            self.ranks[packet.rank].receive_from_bus(packet)?;
        }

        // Outgoing data packet countdown.
        if let Some(packet) = self.data_bus.tick() {
            if let Some(callbacks) = self.callbacks.as_mut() {
                callbacks.write_complete(self.system_id, packet.address, now);
            }
            self.ranks[packet.rank].receive_from_bus(packet)?;
        }

        self.progress_write_data()?;
        self.orchestrate_refresh();

        if let Some(packet) = self.command_queue.pop(&self.bank_states) {
            if !packet.is_fake && packet.kind.is_write() {
                self.write_data_to_send.push_back(BusPacket::new(
                    CommandKind::Data,
                    packet.address,
                    packet.column,
                    packet.row,
                    packet.rank,
                    packet.bank,
                    packet.data,
                    packet.is_fake,
                    packet.security_domain,
                ));
                self.write_data_countdown.push_back(self.config.device.wl);
            }

            self.apply_command(&packet)?;

            trace!("mc: issuing on command bus {}", packet);
            if self.cmd_bus.occupied() {
                return Err(SimError::CommandBusCollision);
            }
            self.cmd_bus.issue(packet, self.config.device.t_cmd);
        }

        match self.config.system.protection {
            Protection::Regular | Protection::FixedServiceChannel | Protection::FixedRate => {
                self.schedule_regular()?
            }
            Protection::FixedServiceRank | Protection::FixedServiceBank => {
                self.schedule_fixed_service()?
            }
            Protection::Dag => self.schedule_dag()?,
        }

        self.accumulate_power();
        self.drain_return()?;

        for countdown in self.refresh_countdown.iter_mut() {
            *countdown = countdown.saturating_sub(1);
        }

        self.command_queue.step();
        self.cycle += 1;
        Ok(())
    }

    /// Write bursts wait WL cycles after their column command, then claim
    /// the data bus.
    fn progress_write_data(&mut self) -> Result<(), SimError> {
        if self.write_data_countdown.is_empty() {
            return Ok(());
        }
        for countdown in self.write_data_countdown.iter_mut() {
            *countdown -= 1;
        }
        if self.write_data_countdown[0] == 0 {
            if self.data_bus.occupied() {
                return Err(SimError::DataBusCollision);
            }
            self.write_data_countdown.pop_front();
            if let Some(packet) = self.write_data_to_send.pop_front() {
                trace!("mc: issuing on data bus {}", packet);
                self.stats.total_transactions += 1;
                let idx = self.stats.seq(packet.rank, packet.bank);
                self.stats.total_writes_per_bank[idx] += 1;

                self.data_bus
                    .issue(packet, self.config.device.burst_cycles());
            }
        }
        Ok(())
    }

    /// Round-robin refresh trigger and power-down pre-wake.
    fn orchestrate_refresh(&mut self) {
        let rank = self.refresh_rank;
        if self.refresh_countdown[rank] == 0 {
            self.command_queue.need_refresh(rank);
            self.ranks[rank].refresh_waiting = true;
            self.refresh_countdown[rank] = self.config.device.refresh_cycles();
            self.refresh_rank = (self.refresh_rank + 1) % self.ranks.len();
        } else if self.power_down[rank] && self.refresh_countdown[rank] <= self.config.device.t_xp
        {
            // Powered-down rank wakes early enough to honour the refresh.
            self.ranks[rank].refresh_waiting = true;
        }
    }

    /// Applies a popped command's effects to the bank state tables.
    ///
    /// Driven by `update` for every command it issues; public so timing
    /// behaviour can be exercised in isolation.
    pub fn apply_command(&mut self, packet: &BusPacket) -> Result<(), SimError> {
        let now = self.cycle;
        let dev = self.config.device.clone();
        let (rank, bank) = (packet.rank, packet.bank);
        let num_devices = dev.num_devices;

        match packet.kind {
            CommandKind::Read | CommandKind::ReadP => {
                self.stats.burst_energy[rank] +=
                    (dev.idd4r - dev.idd3n) * dev.burst_cycles() * num_devices;

                if packet.kind == CommandKind::ReadP {
                    let state = &mut self.bank_states[rank][bank];
                    state.next_activate =
                        state.next_activate.max(now + dev.read_autopre_delay());
                    state.last_command = Some(CommandKind::ReadP);
                    state.state_change_countdown = dev.read_to_pre_delay();
                } else {
                    let state = &mut self.bank_states[rank][bank];
                    state.next_precharge =
                        state.next_precharge.max(now + dev.read_to_pre_delay());
                    state.last_command = Some(CommandKind::Read);
                }

                for (r, rank_states) in self.bank_states.iter_mut().enumerate() {
                    for state in rank_states.iter_mut() {
                        if r != rank {
                            if state.current_state == BankStatus::RowActive {
                                state.next_read = state
                                    .next_read
                                    .max(now + dev.burst_cycles() + dev.t_rtrs);
                                state.next_write =
                                    state.next_write.max(now + dev.read_to_write_delay());
                            }
                        } else {
                            state.next_read = state
                                .next_read
                                .max(now + dev.t_ccd.max(dev.burst_cycles()));
                            state.next_write =
                                state.next_write.max(now + dev.read_to_write_delay());
                        }
                    }
                }

                if packet.kind == CommandKind::ReadP {
                    // Block further column commands until the implicit
                    // precharge has run its course.
                    let state = &mut self.bank_states[rank][bank];
                    state.next_read = state.next_activate;
                    state.next_write = state.next_activate;
                }
            }

            CommandKind::Write | CommandKind::WriteP => {
                self.stats.burst_energy[rank] +=
                    (dev.idd4w - dev.idd3n) * dev.burst_cycles() * num_devices;

                if packet.kind == CommandKind::WriteP {
                    let state = &mut self.bank_states[rank][bank];
                    state.next_activate =
                        state.next_activate.max(now + dev.write_autopre_delay());
                    state.last_command = Some(CommandKind::WriteP);
                    state.state_change_countdown = dev.write_to_pre_delay();
                } else {
                    let state = &mut self.bank_states[rank][bank];
                    state.next_precharge =
                        state.next_precharge.max(now + dev.write_to_pre_delay());
                    state.last_command = Some(CommandKind::Write);
                }

                for (r, rank_states) in self.bank_states.iter_mut().enumerate() {
                    for state in rank_states.iter_mut() {
                        if r != rank {
                            if state.current_state == BankStatus::RowActive {
                                state.next_write = state
                                    .next_write
                                    .max(now + dev.burst_cycles() + dev.t_rtrs);
                                state.next_read =
                                    state.next_read.max(now + dev.write_to_read_delay_r());
                            }
                        } else {
                            state.next_write = state
                                .next_write
                                .max(now + dev.burst_cycles().max(dev.t_ccd));
                            state.next_read =
                                state.next_read.max(now + dev.write_to_read_delay_b());
                        }
                    }
                }

                if packet.kind == CommandKind::WriteP {
                    let state = &mut self.bank_states[rank][bank];
                    state.next_read = state.next_activate;
                    state.next_write = state.next_activate;
                }
            }

            CommandKind::Activate => {
                self.stats.actpre_energy[rank] += ((dev.idd0 * dev.t_rc)
                    - ((dev.idd3n * dev.t_ras) + (dev.idd2n * (dev.t_rc - dev.t_ras))))
                    * num_devices;

                let state = &mut self.bank_states[rank][bank];
                state.current_state = BankStatus::RowActive;
                state.last_command = Some(CommandKind::Activate);
                state.open_row = Some(packet.row);
                state.next_activate = state.next_activate.max(now + dev.t_rc);
                state.next_precharge = state.next_precharge.max(now + dev.t_ras);
                state.next_read = state.next_read.max(now + dev.act_to_column());
                state.next_write = state.next_write.max(now + dev.act_to_column());

                for (b, state) in self.bank_states[rank].iter_mut().enumerate() {
                    if b != bank {
                        state.next_activate = state.next_activate.max(now + dev.t_rrd);
                    }
                }
            }

            CommandKind::Precharge => {
                let state = &mut self.bank_states[rank][bank];
                state.current_state = BankStatus::Precharging;
                state.last_command = Some(CommandKind::Precharge);
                state.state_change_countdown = dev.t_rp;
                state.next_activate = state.next_activate.max(now + dev.t_rp);
            }

            CommandKind::Refresh => {
                self.stats.refresh_energy[rank] +=
                    (dev.idd5 - dev.idd3n) * dev.t_rfc * num_devices;

                for state in self.bank_states[rank].iter_mut() {
                    state.next_activate = state.next_activate.max(now + dev.t_rfc);
                    state.current_state = BankStatus::Refreshing;
                    state.last_command = Some(CommandKind::Refresh);
                    state.state_change_countdown = dev.t_rfc;
                }
            }

            CommandKind::Data => return Err(SimError::UnknownCommand(packet.kind.name())),
        }
        Ok(())
    }

    /// Regular policy: first transaction with command queue room issues.
    fn schedule_regular(&mut self) -> Result<(), SimError> {
        for i in 0..self.transaction_queue.len() {
            let address = self.transaction_queue[i].address;
            let coords = self.mapper.map(address);

            let (mut rank, mut bank) = (coords.rank as usize, coords.bank as usize);
            if self.config.system.single_bank_mode {
                rank = 0;
                bank = 0;
            }

            if self.command_queue.has_room_for(2, rank, bank) {
                let transaction = self.transaction_queue.remove(i);
                debug!(
                    "mapping {:#x} -> rank {} bank {} row {:#x} col {:#x} domain {}",
                    address, rank, bank, coords.row, coords.column, transaction.security_domain
                );
                self.decompose(transaction, rank, bank, coords.row, coords.column)?;
                // One transaction per cycle.
                break;
            }
        }
        Ok(())
    }

    /// Fixed-service policies: the serviced domain rotates on a fixed turn
    /// schedule and each turn admits only matching transactions, pinned to
    /// their domain's rank (or bank).
    fn schedule_fixed_service(&mut self) -> Result<(), SimError> {
        let protection = self.config.system.protection;
        let period = match protection {
            Protection::FixedServiceRank => 7,
            Protection::FixedServiceBank => 15,
            _ => return Ok(()),
        };
        if self.cycle % period != 0 {
            return Ok(());
        }

        let num_domains = self.config.system.num_domains;
        self.current_domain = (self.current_domain + 1) % num_domains;

        for i in 0..self.transaction_queue.len() {
            let transaction = &self.transaction_queue[i];
            if transaction.security_domain % num_domains != self.current_domain {
                continue;
            }

            let address = transaction.address;
            let domain_slot = (transaction.security_domain % num_domains) as usize;
            let coords = self.mapper.map(address);

            let (rank, bank) = match protection {
                Protection::FixedServiceRank => {
                    (domain_slot % self.bank_states.len(), coords.bank as usize)
                }
                _ => (0, domain_slot % self.bank_states[0].len()),
            };

            if self.command_queue.has_room_for(2, rank, bank) {
                let transaction = self.transaction_queue.remove(i);
                self.decompose(transaction, rank, bank, coords.row, coords.column)?;
                break;
            }
        }
        Ok(())
    }

    /// DAG policy: execute the slot scheduled for this cycle, then consume
    /// the transaction queue exactly as the regular policy does.
    fn schedule_dag(&mut self) -> Result<(), SimError> {
        let now = self.cycle;
        if let Some(node) = self.defence.scheduled_node(now) {
            if let Some((_bank_id, write_requested)) = self.defence.node_info(node) {
                let phase = self.defence.current_phase().unwrap_or(0);

                let read = take_first(&mut self.defence_queue, TransactionKind::DataRead);
                let write = if write_requested {
                    take_first(&mut self.defence_queue, TransactionKind::DataWrite)
                } else {
                    None
                };

                let read_transaction = match read {
                    Some(mut transaction) => {
                        transaction.phase_id = Some(phase);
                        transaction.node_id = Some(node);
                        transaction
                    }
                    None => {
                        debug!("defence: no queued read for node {}, synthesizing", node);
                        self.defence.count_fake_read();
                        Transaction::fake(
                            TransactionKind::DataRead,
                            self.defence.domain(),
                            phase,
                            node,
                            now,
                        )
                    }
                };
                self.transaction_queue.push(read_transaction);

                if write_requested {
                    let write_transaction = match write {
                        Some(mut transaction) => {
                            transaction.phase_id = Some(phase);
                            transaction.node_id = Some(node);
                            transaction
                        }
                        None => {
                            debug!("defence: no queued write for node {}, synthesizing", node);
                            self.defence.count_fake_write();
                            Transaction::fake(
                                TransactionKind::DataWrite,
                                self.defence.domain(),
                                phase,
                                node,
                                now,
                            )
                        }
                    };
                    self.transaction_queue.push(write_transaction);
                }
            }
        }

        self.schedule_regular()
    }

    /// Breaks a transaction into ACTIVATE plus its column command.
    fn decompose(
        &mut self,
        transaction: Transaction,
        rank: usize,
        bank: usize,
        row: u64,
        column: u64,
    ) -> Result<(), SimError> {
        let activate = BusPacket::new(
            CommandKind::Activate,
            transaction.address,
            column,
            row,
            rank,
            bank,
            0,
            transaction.is_fake,
            transaction.security_domain,
        );
        let column_command = BusPacket::new(
            transaction.command_kind(),
            transaction.address,
            column,
            row,
            rank,
            bank,
            transaction.data,
            transaction.is_fake,
            transaction.security_domain,
        );

        self.command_queue.enqueue(activate)?;
        self.command_queue.enqueue(column_command)?;

        // Reads are held until their data comes back; writes are done once
        // decomposed, their payload travels in the command stream.
        if transaction.kind == TransactionKind::DataRead {
            self.pending_read_transactions.push(transaction);
        }
        Ok(())
    }

    /// Per-rank energy integration and low-power transitions.
    fn accumulate_power(&mut self) {
        let now = self.cycle;
        let dev = &self.config.device;
        let num_banks = dev.num_banks as usize;

        for rank in 0..self.bank_states.len() {
            if self.config.system.use_low_power {
                if self.command_queue.is_empty(rank) && !self.ranks[rank].refresh_waiting {
                    let all_idle = self.bank_states[rank]
                        .iter()
                        .all(|b| b.current_state == BankStatus::Idle);
                    if all_idle {
                        self.power_down[rank] = true;
                        self.ranks[rank].power_down();
                        for bank in 0..num_banks {
                            let state = &mut self.bank_states[rank][bank];
                            state.current_state = BankStatus::PowerDown;
                            state.next_power_up = now + dev.t_cke;
                        }
                    }
                } else if self.power_down[rank] && now >= self.bank_states[rank][0].next_power_up
                {
                    self.power_down[rank] = false;
                    self.ranks[rank].power_up();
                    for bank in 0..num_banks {
                        let state = &mut self.bank_states[rank][bank];
                        state.current_state = BankStatus::Idle;
                        state.next_activate = state.next_activate.max(now + dev.t_xp);
                    }
                }
            }

            let bank_open = self.bank_states[rank].iter().any(|b| {
                matches!(
                    b.current_state,
                    BankStatus::Refreshing | BankStatus::RowActive
                )
            });

            self.stats.background_energy[rank] += if bank_open {
                dev.idd3n * dev.num_devices
            } else if self.power_down[rank] {
                dev.idd2p * dev.num_devices
            } else {
                dev.idd2n * dev.num_devices
            };
        }
    }

    /// Drains at most one completed read per cycle back to the client.
    fn drain_return(&mut self) -> Result<(), SimError> {
        let now = self.cycle;
        let front = match self.return_transaction.front() {
            Some(front) => front.clone(),
            None => return Ok(()),
        };

        self.stats.total_transactions += 1;

        let index = self
            .pending_read_transactions
            .iter()
            .position(|p| p.address == front.address)
            .ok_or(SimError::UnmatchedReadReturn(front.address))?;
        let pending = self.pending_read_transactions.remove(index);

        if !pending.is_fake {
            let coords = self.mapper.map(front.address);
            self.stats.insert_histogram(
                now - pending.time_added,
                coords.rank as usize,
                coords.bank as usize,
                self.config.system.histogram_bin_size,
            );
            if let Some(callbacks) = self.callbacks.as_mut() {
                callbacks.read_complete(self.system_id, pending.address, now);
            }
        }

        if self.config.system.protection == Protection::Dag
            && self.defence.active()
            && pending.security_domain == self.defence.domain()
        {
            if let Some(node) = pending.node_id {
                self.defence.read_returned(node, now)?;
            }
        }

        self.return_transaction.pop_front();
        Ok(())
    }

    /// Prints the epoch report and rolls the counters.
    pub fn print_stats(&mut self, final_stats: bool) {
        let totals = DefenceTotals {
            nodes: self.defence.total_nodes,
            fake_reads: self.defence.total_fake_reads,
            fake_writes: self.defence.total_fake_writes,
        };
        let config = self.config.clone();
        self.stats.print(final_stats, self.cycle, &config, totals);
    }

    /// Zeroes the epoch counters without printing.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Current cycle.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Read-only view of one bank's state; test and diagnostic hook.
    pub fn bank_state(&self, rank: usize, bank: usize) -> &BankState {
        &self.bank_states[rank][bank]
    }

    /// Read-only view of a rank model.
    pub fn rank(&self, rank: usize) -> &Rank {
        &self.ranks[rank]
    }

    /// Read-only view of the defence engine.
    pub fn defence(&self) -> &DefenceEngine {
        &self.defence
    }

    /// Transactions awaiting decomposition.
    pub fn transaction_queue_len(&self) -> usize {
        self.transaction_queue.len()
    }

    /// Defence transactions awaiting a scheduled slot.
    pub fn defence_queue_len(&self) -> usize {
        self.defence_queue.len()
    }

    /// Reads issued but not yet returned.
    pub fn pending_reads(&self) -> usize {
        self.pending_read_transactions.len()
    }

    /// Epoch statistics.
    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }
}

/// Removes and returns the first queued transaction of `kind`.
fn take_first(queue: &mut Vec<Transaction>, kind: TransactionKind) -> Option<Transaction> {
    let index = queue.iter().position(|t| t.kind == kind)?;
    Some(queue.remove(index))
}
