//! Simulation statistics collection and reporting.
//!
//! Tracks transaction counts, per-bank read/write activity, a binned read
//! latency histogram, and per-rank energy accumulators, and renders the
//! end-of-epoch report. Energy integrates IDD currents cycle-by-cycle and
//! is converted to average power at print time.

use std::collections::BTreeMap;

use crate::config::Config;

/// Per-phase defence totals carried into the report.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefenceTotals {
    /// Defence nodes executed.
    pub nodes: u64,
    /// Fake read requests synthesized.
    pub fake_reads: u64,
    /// Fake write requests synthesized.
    pub fake_writes: u64,
}

/// Controller statistics for the running epoch.
pub struct ControllerStats {
    num_ranks: usize,
    num_banks: usize,

    /// Completed bus transactions (reads returned plus write bursts sent).
    pub total_transactions: u64,

    /// Accesses accumulated across finished epochs, per (rank, bank).
    pub grand_total_bank_accesses: Vec<u64>,
    /// Reads this epoch, per (rank, bank).
    pub total_reads_per_bank: Vec<u64>,
    /// Writes this epoch, per (rank, bank).
    pub total_writes_per_bank: Vec<u64>,
    /// Reads this epoch, per rank.
    pub total_reads_per_rank: Vec<u64>,
    /// Writes this epoch, per rank.
    pub total_writes_per_rank: Vec<u64>,

    /// Summed read latency this epoch, per (rank, bank).
    pub total_epoch_latency: Vec<u64>,
    /// Read latency histogram, binned.
    pub latencies: BTreeMap<u64, u64>,

    /// Background energy per rank, in IDD-cycle units.
    pub background_energy: Vec<u64>,
    /// Burst energy per rank.
    pub burst_energy: Vec<u64>,
    /// Activate/precharge energy per rank.
    pub actpre_energy: Vec<u64>,
    /// Refresh energy per rank.
    pub refresh_energy: Vec<u64>,
}

impl ControllerStats {
    /// Creates zeroed statistics for the given geometry.
    pub fn new(num_ranks: usize, num_banks: usize) -> Self {
        let per_bank = num_ranks * num_banks;
        Self {
            num_ranks,
            num_banks,
            total_transactions: 0,
            grand_total_bank_accesses: vec![0; per_bank],
            total_reads_per_bank: vec![0; per_bank],
            total_writes_per_bank: vec![0; per_bank],
            total_reads_per_rank: vec![0; num_ranks],
            total_writes_per_rank: vec![0; num_ranks],
            total_epoch_latency: vec![0; per_bank],
            latencies: BTreeMap::new(),
            background_energy: vec![0; num_ranks],
            burst_energy: vec![0; num_ranks],
            actpre_energy: vec![0; num_ranks],
            refresh_energy: vec![0; num_ranks],
        }
    }

    /// Flat (rank, bank) index.
    pub fn seq(&self, rank: usize, bank: usize) -> usize {
        rank * self.num_banks + bank
    }

    /// Records a completed read latency into the epoch totals and the
    /// binned histogram.
    pub fn insert_histogram(&mut self, latency: u64, rank: usize, bank: usize, bin_size: u64) {
        let idx = self.seq(rank, bank);
        self.total_epoch_latency[idx] += latency;
        *self
            .latencies
            .entry((latency / bin_size) * bin_size)
            .or_insert(0) += 1;
    }

    /// Rolls the epoch: folds bank accesses into the grand totals and
    /// zeroes every epoch counter.
    pub fn reset(&mut self) {
        for rank in 0..self.num_ranks {
            for bank in 0..self.num_banks {
                let idx = self.seq(rank, bank);
                self.grand_total_bank_accesses[idx] +=
                    self.total_reads_per_bank[idx] + self.total_writes_per_bank[idx];
                self.total_reads_per_bank[idx] = 0;
                self.total_writes_per_bank[idx] = 0;
                self.total_epoch_latency[idx] = 0;
            }
            self.burst_energy[rank] = 0;
            self.actpre_energy[rank] = 0;
            self.refresh_energy[rank] = 0;
            self.background_energy[rank] = 0;
            self.total_reads_per_rank[rank] = 0;
            self.total_writes_per_rank[rank] = 0;
        }
    }

    /// Prints the epoch report.
    ///
    /// # Arguments
    ///
    /// * `final_stats` - Marks the end-of-simulation report.
    /// * `cycle` - Current cycle, used for partial-epoch scaling.
    /// * `config` - Source of epoch length, clock period, and voltage.
    /// * `defence` - Defence totals appended to the report.
    pub fn print(&mut self, final_stats: bool, cycle: u64, config: &Config, defence: DefenceTotals) {
        let epoch = config.system.epoch_length;
        let cycles_elapsed = if cycle % epoch == 0 { epoch } else { cycle % epoch };
        let bytes_per_transaction = config.device.transaction_bytes();
        let total_bytes = self.total_transactions * bytes_per_transaction;
        let seconds_this_epoch = cycles_elapsed as f64 * config.device.tck * 1e-9;

        let mut total_bandwidth = 0.0;
        for rank in 0..self.num_ranks {
            for bank in 0..self.num_banks {
                let idx = self.seq(rank, bank);
                let accesses = self.total_reads_per_bank[idx] + self.total_writes_per_bank[idx];
                total_bandwidth += (accesses as f64 * bytes_per_transaction as f64
                    / (1024.0 * 1024.0 * 1024.0))
                    / seconds_this_epoch;
                self.total_reads_per_rank[rank] += self.total_reads_per_bank[idx];
                self.total_writes_per_rank[rank] += self.total_writes_per_bank[idx];
            }
        }

        println!("==========================================================");
        println!(
            "DRAM CONTROLLER STATISTICS {}",
            if final_stats { "(final)" } else { "(epoch)" }
        );
        println!("==========================================================");
        println!("total_return_transactions {}", self.total_transactions);
        println!("total_bytes               {}", total_bytes);
        println!("aggregate_bandwidth       {:.3} GB/s", total_bandwidth);
        println!("----------------------------------------------------------");
        println!("PER-RANK");
        for rank in 0..self.num_ranks {
            let energy = self.background_energy[rank]
                + self.burst_energy[rank]
                + self.actpre_energy[rank]
                + self.refresh_energy[rank];
            let average_power =
                energy as f64 * config.device.vdd / cycles_elapsed as f64;
            println!(
                "  rank {} reads: {:<8} writes: {:<8} avg_power: {:.3} mW",
                rank,
                self.total_reads_per_rank[rank],
                self.total_writes_per_rank[rank],
                average_power
            );
        }
        if !self.latencies.is_empty() {
            println!("----------------------------------------------------------");
            println!("READ LATENCY HISTOGRAM");
            for (bin, count) in &self.latencies {
                println!("  {:<6} {}", bin, count);
            }
        }
        println!("----------------------------------------------------------");
        println!("DEFENCE");
        println!("  nodes_executed          {}", defence.nodes);
        println!("  fake_read_requests      {}", defence.fake_reads);
        println!("  fake_write_requests     {}", defence.fake_writes);
        println!("==========================================================");

        self.reset();
    }
}
