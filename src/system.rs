//! Memory system façade.
//!
//! Wires a [`MemoryController`] to its rank models from one configuration,
//! and exposes the client-facing surface: transaction admission, the
//! per-cycle tick, defence setup, and statistics. This is the structure an
//! enclosing simulator holds.

use log::info;

use crate::common::SimError;
use crate::config::Config;
use crate::defence::DefenceDag;
use crate::mem::{MemoryController, Rank, Transaction, TransactionCallback};

/// One memory channel: controller plus its ranks, behind a small API.
pub struct MemorySystem {
    /// The controller core.
    pub controller: MemoryController,
    system_id: u64,
}

impl MemorySystem {
    /// Builds a system from configuration.
    ///
    /// Constructs the controller and one rank model per configured rank,
    /// and attaches them.
    ///
    /// # Arguments
    ///
    /// * `config` - Full simulator configuration.
    /// * `system_id` - Identifier passed through to client callbacks.
    pub fn new(config: &Config, system_id: u64) -> Self {
        info!(
            "memory system {}: {} rank(s) x {} bank(s), protection {:?}",
            system_id, config.device.num_ranks, config.device.num_banks, config.system.protection
        );

        let mut controller = MemoryController::new(config, system_id);
        let ranks = (0..config.device.num_ranks as usize)
            .map(|id| Rank::new(id, &config.device))
            .collect();
        controller.attach_ranks(ranks);

        Self {
            controller,
            system_id,
        }
    }

    /// Identifier passed through to client callbacks.
    pub fn system_id(&self) -> u64 {
        self.system_id
    }

    /// Admits a read or write request.
    ///
    /// # Returns
    ///
    /// `false` when the controller's target queue is full.
    pub fn add_transaction(&mut self, is_write: bool, address: u64, security_domain: u64) -> bool {
        let transaction = if is_write {
            Transaction::write(address, 0, security_domain)
        } else {
            Transaction::read(address, security_domain)
        };
        self.controller.add_transaction(transaction)
    }

    /// Whether another regular transaction would be accepted.
    pub fn will_accept_transaction(&self) -> bool {
        self.controller.will_accept_transaction()
    }

    /// Registers client completion callbacks.
    pub fn register_callbacks(&mut self, callbacks: Box<dyn TransactionCallback>) {
        self.controller.register_callbacks(callbacks);
    }

    /// Parses and installs a defence DAG document.
    pub fn load_dag(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let dag = DefenceDag::from_json(json)?;
        info!("loaded defence dag with {} phase(s)", dag.len());
        self.controller.set_dag(dag);
        Ok(())
    }

    /// Starts the defence for the given domain.
    pub fn init_defence(&mut self, domain_id: u64) -> Result<(), SimError> {
        self.controller.init_defence(domain_id)
    }

    /// Advances the system one DRAM clock cycle.
    pub fn update(&mut self) -> Result<(), SimError> {
        self.controller.update()
    }

    /// Prints the statistics report.
    pub fn print_stats(&mut self, final_stats: bool) {
        self.controller.print_stats(final_stats);
    }
}
