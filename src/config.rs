//! Simulator configuration.
//!
//! Loads and parses TOML configuration covering the DRAM device (geometry,
//! JEDEC timing, current draw), the controller (queue depths, protection
//! policy, domains) and the defence engine (slack, clock divider). Compound
//! JEDEC delays are derived from the base parameters through accessor
//! methods rather than being configured directly.

use serde::Deserialize;

const DEFAULT_NUM_RANKS: u64 = 1;
const DEFAULT_NUM_BANKS: u64 = 8;
const DEFAULT_NUM_ROWS: u64 = 32768;
const DEFAULT_NUM_COLS: u64 = 1024;
const DEFAULT_NUM_DEVICES: u64 = 8;
const DEFAULT_DATA_BUS_BITS: u64 = 64;

const DEFAULT_TRANS_QUEUE_DEPTH: usize = 32;
const DEFAULT_DEFENCE_QUEUE_DEPTH: usize = 32;
const DEFAULT_CMD_QUEUE_DEPTH: usize = 32;
const DEFAULT_EPOCH_LENGTH: u64 = 100_000;
const DEFAULT_HISTOGRAM_BIN: u64 = 10;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// DRAM device geometry, timing, and electrical parameters.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Controller queue depths, policy, and accounting knobs.
    #[serde(default)]
    pub system: SystemConfig,
    /// Defence engine parameters.
    #[serde(default)]
    pub defence: DefenceConfig,
}

impl Default for Config {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            system: SystemConfig::default(),
            defence: DefenceConfig::default(),
        }
    }
}

/// Active protection policy for the lifetime of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    /// Plain first-fit scheduling, no isolation.
    Regular,
    /// Channel-partitioned fixed service; scheduler side identical to Regular.
    FixedServiceChannel,
    /// Rank-partitioned fixed service on a 7-cycle turn schedule.
    FixedServiceRank,
    /// Bank-partitioned fixed service on a 15-cycle turn schedule.
    FixedServiceBank,
    /// Fixed-rate issue; scheduler side identical to Regular.
    FixedRate,
    /// DAG-scheduled defence traffic with fake-request padding.
    Dag,
}

/// DRAM device configuration.
///
/// Timing parameters are in DRAM clock cycles unless noted; `tck` and
/// `refresh_period` are in nanoseconds. Defaults model a DDR3-1333 x8 part.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_num_ranks")]
    pub num_ranks: u64,

    #[serde(default = "default_num_banks")]
    pub num_banks: u64,

    #[serde(default = "default_num_rows")]
    pub num_rows: u64,

    #[serde(default = "default_num_cols")]
    pub num_cols: u64,

    /// Devices ganged per rank; energy adders scale by this.
    #[serde(default = "default_num_devices")]
    pub num_devices: u64,

    /// Width of the shared data bus in bits.
    #[serde(default = "default_data_bus_bits")]
    pub data_bus_bits: u64,

    /// Burst length in beats.
    #[serde(default = "default_bl")]
    pub bl: u64,

    /// Clock period in nanoseconds.
    #[serde(default = "default_tck")]
    pub tck: f64,

    /// Command bus occupancy per command.
    #[serde(default = "default_t_cmd")]
    pub t_cmd: u64,

    /// CAS latency (column command to first data beat).
    #[serde(default = "default_t_cas")]
    pub t_cas: u64,

    /// Additive (posted-CAS) latency.
    #[serde(default = "default_al")]
    pub al: u64,

    /// Write latency (CWL + AL).
    #[serde(default = "default_wl")]
    pub wl: u64,

    /// Activate-to-activate, same bank.
    #[serde(default = "default_t_rc")]
    pub t_rc: u64,

    /// Precharge period.
    #[serde(default = "default_t_rp")]
    pub t_rp: u64,

    /// Activate-to-precharge.
    #[serde(default = "default_t_ras")]
    pub t_ras: u64,

    /// Activate-to-column command.
    #[serde(default = "default_t_rcd")]
    pub t_rcd: u64,

    /// Activate-to-activate, different banks of one rank.
    #[serde(default = "default_t_rrd")]
    pub t_rrd: u64,

    /// Column-command-to-column-command.
    #[serde(default = "default_t_ccd")]
    pub t_ccd: u64,

    /// Read-to-precharge.
    #[serde(default = "default_t_rtp")]
    pub t_rtp: u64,

    /// Write-to-read turnaround, same rank.
    #[serde(default = "default_t_wtr")]
    pub t_wtr: u64,

    /// Write recovery.
    #[serde(default = "default_t_wr")]
    pub t_wr: u64,

    /// Refresh cycle time.
    #[serde(default = "default_t_rfc")]
    pub t_rfc: u64,

    /// Rank-to-rank switching penalty.
    #[serde(default = "default_t_rtrs")]
    pub t_rtrs: u64,

    /// Power-down entry time.
    #[serde(default = "default_t_cke")]
    pub t_cke: u64,

    /// Power-down exit time.
    #[serde(default = "default_t_xp")]
    pub t_xp: u64,

    /// Average periodic refresh interval in nanoseconds.
    #[serde(default = "default_refresh_period")]
    pub refresh_period: f64,

    #[serde(default = "default_idd0")]
    pub idd0: u64,
    #[serde(default = "default_idd1")]
    pub idd1: u64,
    #[serde(default = "default_idd2p")]
    pub idd2p: u64,
    #[serde(default = "default_idd2q")]
    pub idd2q: u64,
    #[serde(default = "default_idd2n")]
    pub idd2n: u64,
    #[serde(default = "default_idd3pf")]
    pub idd3pf: u64,
    #[serde(default = "default_idd3ps")]
    pub idd3ps: u64,
    #[serde(default = "default_idd3n")]
    pub idd3n: u64,
    #[serde(default = "default_idd4w")]
    pub idd4w: u64,
    #[serde(default = "default_idd4r")]
    pub idd4r: u64,
    #[serde(default = "default_idd5")]
    pub idd5: u64,
    #[serde(default = "default_idd6")]
    pub idd6: u64,
    #[serde(default = "default_idd6l")]
    pub idd6l: u64,
    #[serde(default = "default_idd7")]
    pub idd7: u64,

    /// Supply voltage in volts.
    #[serde(default = "default_vdd")]
    pub vdd: f64,
}

impl DeviceConfig {
    /// Read latency: CAS latency plus additive latency.
    pub fn rl(&self) -> u64 {
        self.t_cas + self.al
    }

    /// Data bus occupancy of one burst.
    pub fn burst_cycles(&self) -> u64 {
        self.bl / 2
    }

    /// Bytes moved by one full burst.
    pub fn transaction_bytes(&self) -> u64 {
        (self.data_bus_bits / 8) * self.bl
    }

    /// Refresh interval in clock cycles.
    pub fn refresh_cycles(&self) -> u64 {
        (self.refresh_period / self.tck) as u64
    }

    /// Earliest precharge after a READ.
    pub fn read_to_pre_delay(&self) -> u64 {
        self.al + self.burst_cycles() + self.t_rtp.max(self.t_ccd) - self.t_ccd
    }

    /// Earliest precharge after a WRITE.
    pub fn write_to_pre_delay(&self) -> u64 {
        self.wl + self.burst_cycles() + self.t_wr
    }

    /// Bus turnaround from a READ to a WRITE.
    pub fn read_to_write_delay(&self) -> u64 {
        (self.rl() + self.burst_cycles() + self.t_rtrs).saturating_sub(self.wl)
    }

    /// Turnaround from a WRITE to a READ in the same rank.
    pub fn write_to_read_delay_b(&self) -> u64 {
        self.wl + self.burst_cycles() + self.t_wtr
    }

    /// Turnaround from a WRITE to a READ in a different rank.
    pub fn write_to_read_delay_r(&self) -> u64 {
        (self.wl + self.burst_cycles() + self.t_rtrs).saturating_sub(self.rl())
    }

    /// Implicit-activate window of READ with auto-precharge.
    pub fn read_autopre_delay(&self) -> u64 {
        self.al + self.t_rtp + self.t_rp
    }

    /// Implicit-activate window of WRITE with auto-precharge.
    pub fn write_autopre_delay(&self) -> u64 {
        self.wl + self.burst_cycles() + self.t_wr + self.t_rp
    }

    /// Column command spacing after an ACTIVATE, accounting for posted CAS.
    pub fn act_to_column(&self) -> u64 {
        self.t_rcd.saturating_sub(self.al)
    }
}

impl Default for DeviceConfig {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            num_ranks: default_num_ranks(),
            num_banks: default_num_banks(),
            num_rows: default_num_rows(),
            num_cols: default_num_cols(),
            num_devices: default_num_devices(),
            data_bus_bits: default_data_bus_bits(),
            bl: default_bl(),
            tck: default_tck(),
            t_cmd: default_t_cmd(),
            t_cas: default_t_cas(),
            al: default_al(),
            wl: default_wl(),
            t_rc: default_t_rc(),
            t_rp: default_t_rp(),
            t_ras: default_t_ras(),
            t_rcd: default_t_rcd(),
            t_rrd: default_t_rrd(),
            t_ccd: default_t_ccd(),
            t_rtp: default_t_rtp(),
            t_wtr: default_t_wtr(),
            t_wr: default_t_wr(),
            t_rfc: default_t_rfc(),
            t_rtrs: default_t_rtrs(),
            t_cke: default_t_cke(),
            t_xp: default_t_xp(),
            refresh_period: default_refresh_period(),
            idd0: default_idd0(),
            idd1: default_idd1(),
            idd2p: default_idd2p(),
            idd2q: default_idd2q(),
            idd2n: default_idd2n(),
            idd3pf: default_idd3pf(),
            idd3ps: default_idd3ps(),
            idd3n: default_idd3n(),
            idd4w: default_idd4w(),
            idd4r: default_idd4r(),
            idd5: default_idd5(),
            idd6: default_idd6(),
            idd6l: default_idd6l(),
            idd7: default_idd7(),
            vdd: default_vdd(),
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Transaction queue depth.
    #[serde(default = "default_trans_queue_depth")]
    pub trans_queue_depth: usize,

    /// Defence queue depth.
    #[serde(default = "default_defence_queue_depth")]
    pub defence_queue_depth: usize,

    /// Per-bank command queue depth.
    #[serde(default = "default_cmd_queue_depth")]
    pub cmd_queue_depth: usize,

    /// Number of security domains.
    ///
    /// For the rank- and bank-partitioned policies this must not exceed the
    /// corresponding resource count.
    #[serde(default = "default_num_domains")]
    pub num_domains: u64,

    /// Statistics epoch length in cycles.
    #[serde(default = "default_epoch_length")]
    pub epoch_length: u64,

    /// Latency histogram bin width in cycles.
    #[serde(default = "default_histogram_bin_size")]
    pub histogram_bin_size: u64,

    /// Active protection policy.
    #[serde(default = "default_protection")]
    pub protection: Protection,

    /// Enables rank power-down when idle.
    #[serde(default)]
    pub use_low_power: bool,

    /// Collapses every mapped transaction onto rank 0, bank 0.
    #[serde(default = "default_single_bank_mode")]
    pub single_bank_mode: bool,

    /// Issue period for the fixed-rate policy.
    #[serde(default = "default_fixed_service_rate")]
    pub fixed_service_rate: u64,
}

impl Default for SystemConfig {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            trans_queue_depth: default_trans_queue_depth(),
            defence_queue_depth: default_defence_queue_depth(),
            cmd_queue_depth: default_cmd_queue_depth(),
            num_domains: default_num_domains(),
            epoch_length: default_epoch_length(),
            histogram_bin_size: default_histogram_bin_size(),
            protection: default_protection(),
            use_low_power: false,
            single_bank_mode: default_single_bank_mode(),
            fixed_service_rate: default_fixed_service_rate(),
        }
    }
}

/// Defence engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DefenceConfig {
    /// Slack factor applied to DAG edge latencies; must stay below 1.01.
    #[serde(default = "default_slack")]
    pub slack: f64,

    /// Divider from DAG latency units to DRAM cycles.
    #[serde(default = "default_def_clk_div")]
    pub def_clk_div: u64,
}

impl Default for DefenceConfig {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            slack: default_slack(),
            def_clk_div: default_def_clk_div(),
        }
    }
}

fn default_num_ranks() -> u64 {
    DEFAULT_NUM_RANKS
}

fn default_num_banks() -> u64 {
    DEFAULT_NUM_BANKS
}

fn default_num_rows() -> u64 {
    DEFAULT_NUM_ROWS
}

fn default_num_cols() -> u64 {
    DEFAULT_NUM_COLS
}

fn default_num_devices() -> u64 {
    DEFAULT_NUM_DEVICES
}

fn default_data_bus_bits() -> u64 {
    DEFAULT_DATA_BUS_BITS
}

fn default_bl() -> u64 {
    8
}

fn default_tck() -> f64 {
    1.5
}

fn default_t_cmd() -> u64 {
    1
}

fn default_t_cas() -> u64 {
    10
}

fn default_al() -> u64 {
    0
}

fn default_wl() -> u64 {
    7
}

fn default_t_rc() -> u64 {
    34
}

fn default_t_rp() -> u64 {
    10
}

fn default_t_ras() -> u64 {
    24
}

fn default_t_rcd() -> u64 {
    10
}

fn default_t_rrd() -> u64 {
    4
}

fn default_t_ccd() -> u64 {
    4
}

fn default_t_rtp() -> u64 {
    5
}

fn default_t_wtr() -> u64 {
    5
}

fn default_t_wr() -> u64 {
    10
}

fn default_t_rfc() -> u64 {
    107
}

fn default_t_rtrs() -> u64 {
    1
}

fn default_t_cke() -> u64 {
    4
}

fn default_t_xp() -> u64 {
    5
}

fn default_refresh_period() -> f64 {
    7800.0
}

fn default_idd0() -> u64 {
    110
}

fn default_idd1() -> u64 {
    130
}

fn default_idd2p() -> u64 {
    12
}

fn default_idd2q() -> u64 {
    70
}

fn default_idd2n() -> u64 {
    70
}

fn default_idd3pf() -> u64 {
    60
}

fn default_idd3ps() -> u64 {
    60
}

fn default_idd3n() -> u64 {
    90
}

fn default_idd4w() -> u64 {
    255
}

fn default_idd4r() -> u64 {
    230
}

fn default_idd5() -> u64 {
    305
}

fn default_idd6() -> u64 {
    9
}

fn default_idd6l() -> u64 {
    12
}

fn default_idd7() -> u64 {
    415
}

fn default_vdd() -> f64 {
    1.5
}

fn default_trans_queue_depth() -> usize {
    DEFAULT_TRANS_QUEUE_DEPTH
}

fn default_defence_queue_depth() -> usize {
    DEFAULT_DEFENCE_QUEUE_DEPTH
}

fn default_cmd_queue_depth() -> usize {
    DEFAULT_CMD_QUEUE_DEPTH
}

fn default_num_domains() -> u64 {
    2
}

fn default_epoch_length() -> u64 {
    DEFAULT_EPOCH_LENGTH
}

fn default_histogram_bin_size() -> u64 {
    DEFAULT_HISTOGRAM_BIN
}

fn default_protection() -> Protection {
    Protection::Regular
}

fn default_single_bank_mode() -> bool {
    true
}

fn default_fixed_service_rate() -> u64 {
    7
}

fn default_slack() -> f64 {
    1.0
}

fn default_def_clk_div() -> u64 {
    1
}
