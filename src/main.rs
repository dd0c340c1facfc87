//! DRAM Controller Simulator CLI.
//!
//! The main executable for the simulator. It handles command-line argument
//! parsing, system initialization, and the main simulation loop.
//!
//! # Usage
//!
//! The simulator loads a TOML configuration (defaults model a DDR3-1333 x8
//! part), optionally a JSON defence DAG, and drives the controller with a
//! synthetic mixed read/write workload for the requested number of cycles
//! before printing the statistics report.

use clap::Parser;
use std::{fs, process};

extern crate dramguard;

use dramguard::config::{Config, Protection};
use dramguard::system::MemorySystem;

/// Command-line arguments for the DRAM controller simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-Accurate DRAM Controller Simulator")]
struct Args {
    #[arg(short, long)]
    config: Option<String>,

    /// Defence DAG document (JSON); required for the dag policy.
    #[arg(long)]
    dag: Option<String>,

    /// Security domain the defence protects.
    #[arg(long, default_value_t = 1)]
    defence_domain: u64,

    /// Cycles to simulate.
    #[arg(short = 'n', long, default_value_t = 100_000)]
    cycles: u64,

    /// Odds (one in N per cycle) of injecting a request.
    #[arg(long, default_value_t = 4)]
    inject_every: u64,
}

/// Deterministic xorshift generator for the synthetic workload.
struct Workload {
    state: u64,
}

impl Workload {
    fn new(seed: u64) -> Self {
        Self { state: seed | 1 }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Main entry point for the DRAM controller simulator.
///
/// # Behavior
///
/// 1. **Configuration**: parses command-line arguments and loads the TOML
///    configuration file, if one was given.
/// 2. **Initialization**: constructs the `MemorySystem` (controller plus
///    rank models) and, for the dag policy, loads and starts the defence.
/// 3. **Simulation loop**: injects a synthetic workload and ticks the
///    system cycle-by-cycle until the requested cycle count is reached.
/// 4. **Teardown**: prints the final statistics report.
fn main() {
    env_logger::init();
    let args = Args::parse();

    let config: Config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path).expect("Failed to read config");
            toml::from_str(&content).expect("Failed to parse config")
        }
        None => Config::default(),
    };

    let mut system = MemorySystem::new(&config, 0);

    if let Some(path) = &args.dag {
        let content = fs::read_to_string(path).expect("Failed to read dag");
        system.load_dag(&content).expect("Failed to parse dag");
        system
            .init_defence(args.defence_domain)
            .expect("Failed to start defence");
    } else if config.system.protection == Protection::Dag {
        eprintln!("the dag policy requires --dag");
        process::exit(1);
    }

    println!("Global Configuration");
    println!("--------------------");
    println!("Ranks:              {}", config.device.num_ranks);
    println!("Banks:              {}", config.device.num_banks);
    println!("Protection:         {:?}", config.system.protection);
    println!("Domains:            {}", config.system.num_domains);
    println!("Cycles:             {}", args.cycles);

    let mut workload = Workload::new(0x2545_F491_4F6C_DD1D);
    let num_domains = config.system.num_domains;

    for _ in 0..args.cycles {
        if workload.next() % args.inject_every == 0 && system.will_accept_transaction() {
            let raw = workload.next();
            let address = (raw >> 8) & 0x3FFF_FFC0;
            let is_write = raw & 1 == 1;
            let domain = (raw >> 1) % num_domains;
            system.add_transaction(is_write, address, domain);
        }

        if let Err(err) = system.update() {
            eprintln!("simulation aborted: {}", err);
            process::exit(1);
        }
    }

    system.print_stats(true);
}
