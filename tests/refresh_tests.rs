//! Integration tests for refresh orchestration.

use dramguard::config::Config;
use dramguard::mem::BankStatus;
use dramguard::system::MemorySystem;

/// Four ranks with a 2000-cycle refresh interval.
fn four_rank_config() -> Config {
    let mut config = Config::default();
    config.device.num_ranks = 4;
    config.device.num_banks = 2;
    // 2000 cycles at the default 1.5 ns clock.
    config.device.refresh_period = 3000.0;
    config
}

/// Collects the cycles at which each rank enters `Refreshing`.
fn refresh_cycles(system: &mut MemorySystem, ranks: usize, cycles: u64) -> Vec<Vec<u64>> {
    let mut seen = vec![Vec::new(); ranks];
    let mut refreshing = vec![false; ranks];
    for _ in 0..cycles {
        system.update().expect("update should not fault");
        for (rank, entries) in seen.iter_mut().enumerate() {
            let state = system.controller.bank_state(rank, 0).current_state;
            if state == BankStatus::Refreshing && !refreshing[rank] {
                entries.push(system.controller.cycle() - 1);
            }
            refreshing[rank] = state == BankStatus::Refreshing;
        }
    }
    seen
}

/// Tests that refresh countdowns are staggered across the ranks.
#[test]
fn test_refresh_staggering() {
    let config = four_rank_config();
    let mut system = MemorySystem::new(&config, 0);

    let seen = refresh_cycles(&mut system, 4, 2100);
    assert_eq!(seen[0].first(), Some(&500));
    assert_eq!(seen[1].first(), Some(&1000));
    assert_eq!(seen[2].first(), Some(&1500));
    assert_eq!(seen[3].first(), Some(&2000));
}

/// Tests that each rank refreshes once per interval in steady state.
#[test]
fn test_refresh_period() {
    let config = four_rank_config();
    let mut system = MemorySystem::new(&config, 0);

    let seen = refresh_cycles(&mut system, 4, 6700);
    assert_eq!(seen[0], vec![500, 2500, 4500, 6500]);
    assert_eq!(seen[1], vec![1000, 3000, 5000]);
}

/// Tests that the rank's pre-wake flag clears once the refresh arrives.
#[test]
fn test_refresh_flag_clears() {
    let config = four_rank_config();
    let mut system = MemorySystem::new(&config, 0);

    // The cycle the countdown expires raises the flag.
    for _ in 0..=500 {
        system.update().expect("update should not fault");
    }
    assert!(system.controller.rank(0).refresh_waiting);

    // The REFRESH command reaches the rank a bus delay later.
    for _ in 0..=config.device.t_cmd {
        system.update().expect("update should not fault");
    }
    assert!(!system.controller.rank(0).refresh_waiting);
}
