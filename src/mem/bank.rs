//! Per-bank timing and state record.
//!
//! One [`BankState`] exists per (rank, bank). The controller mutates it
//! when commands issue; the command queue reads it to decide issuability.
//! The `next_*` fields are earliest-issue cycles and only ever move
//! forward. Implicit transitions (the auto-precharge after READ_P/WRITE_P,
//! the return to Idle after PRECHARGE/REFRESH) fire from a countdown
//! decremented at the top of every cycle.

use super::bus::CommandKind;

/// Operational state of a bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankStatus {
    /// No row open, ready for an activate.
    Idle,
    /// A row is open and column commands may issue.
    RowActive,
    /// A refresh is in progress.
    Refreshing,
    /// The open row is being closed.
    Precharging,
    /// The rank is powered down.
    PowerDown,
}

/// Timing and state record for one bank.
#[derive(Clone, Debug)]
pub struct BankState {
    /// Current operational state.
    pub current_state: BankStatus,
    /// Open row address while `RowActive`.
    pub open_row: Option<u64>,
    /// The command that last transitioned this bank.
    pub last_command: Option<CommandKind>,
    /// Cycles until the implicit transition fires; zero when none pending.
    pub state_change_countdown: u64,
    /// Earliest cycle an ACTIVATE may issue.
    pub next_activate: u64,
    /// Earliest cycle a PRECHARGE may issue.
    pub next_precharge: u64,
    /// Earliest cycle a READ may issue.
    pub next_read: u64,
    /// Earliest cycle a WRITE may issue.
    pub next_write: u64,
    /// Earliest cycle the rank may power up again.
    pub next_power_up: u64,
}

impl Default for BankState {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            current_state: BankStatus::Idle,
            open_row: None,
            last_command: None,
            state_change_countdown: 0,
            next_activate: 0,
            next_precharge: 0,
            next_read: 0,
            next_write: 0,
            next_power_up: 0,
        }
    }
}

impl BankState {
    /// Creates an idle bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the implicit-transition countdown by one cycle.
    ///
    /// Auto-precharging column commands fall into `Precharging` for `t_rp`
    /// further cycles; completed precharges and refreshes return the bank
    /// to `Idle`.
    pub fn tick(&mut self, t_rp: u64) {
        if self.state_change_countdown == 0 {
            return;
        }
        self.state_change_countdown -= 1;
        if self.state_change_countdown > 0 {
            return;
        }

        match self.last_command {
            Some(CommandKind::ReadP) | Some(CommandKind::WriteP) => {
                self.current_state = BankStatus::Precharging;
                self.last_command = Some(CommandKind::Precharge);
                self.state_change_countdown = t_rp;
            }
            Some(CommandKind::Refresh) | Some(CommandKind::Precharge) => {
                self.current_state = BankStatus::Idle;
                self.open_row = None;
            }
            _ => {}
        }
    }
}
