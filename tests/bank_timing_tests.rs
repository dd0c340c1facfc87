//! Integration tests for bank timing and command effects.

use dramguard::config::Config;
use dramguard::mem::{BankStatus, BusPacket, CommandKind, MemoryController, Rank};

/// Two ranks of eight banks, no traffic collapse.
fn timing_config() -> Config {
    let mut config = Config::default();
    config.device.num_ranks = 2;
    config.system.single_bank_mode = false;
    config
}

/// Controller with attached ranks so idle cycles can elapse.
fn controller(config: &Config) -> MemoryController {
    let mut mc = MemoryController::new(config, 0);
    let ranks = (0..config.device.num_ranks as usize)
        .map(|id| Rank::new(id, &config.device))
        .collect();
    mc.attach_ranks(ranks);
    mc
}

fn command(kind: CommandKind, rank: usize, bank: usize, row: u64) -> BusPacket {
    BusPacket::new(kind, 0, 0, row, rank, bank, 0, false, 0)
}

/// Runs `cycles` empty cycles.
fn idle(mc: &mut MemoryController, cycles: u64) {
    for _ in 0..cycles {
        mc.update().expect("idle cycle should not fault");
    }
}

/// Tests the ACTIVATE effects on the target and sibling banks.
#[test]
fn test_activate_effects() {
    let config = timing_config();
    let mut mc = controller(&config);

    mc.apply_command(&command(CommandKind::Activate, 0, 0, 5))
        .expect("activate should apply");

    let bank = mc.bank_state(0, 0);
    assert_eq!(bank.current_state, BankStatus::RowActive);
    assert_eq!(bank.open_row, Some(5));
    assert_eq!(bank.last_command, Some(CommandKind::Activate));
    assert_eq!(bank.next_activate, config.device.t_rc);
    assert_eq!(bank.next_precharge, config.device.t_ras);
    assert_eq!(bank.next_read, config.device.act_to_column());
    assert_eq!(bank.next_write, config.device.act_to_column());

    // Sibling banks only take the tRRD spacing.
    assert_eq!(mc.bank_state(0, 1).next_activate, config.device.t_rrd);
    assert_eq!(mc.bank_state(0, 1).current_state, BankStatus::Idle);

    // The other rank is untouched.
    assert_eq!(mc.bank_state(1, 0).next_activate, 0);
}

/// Tests the READ effects across banks and ranks.
#[test]
fn test_read_effects() {
    let config = timing_config();
    let mut mc = controller(&config);
    let dev = &config.device;

    mc.apply_command(&command(CommandKind::Activate, 0, 0, 5))
        .expect("activate should apply");
    mc.apply_command(&command(CommandKind::Activate, 1, 1, 7))
        .expect("activate should apply");
    idle(&mut mc, 20);

    mc.apply_command(&command(CommandKind::Read, 0, 0, 5))
        .expect("read should apply");

    let bank = mc.bank_state(0, 0);
    assert_eq!(bank.last_command, Some(CommandKind::Read));
    assert_eq!(bank.next_precharge, 20 + dev.read_to_pre_delay());
    assert_eq!(bank.next_read, 20 + dev.t_ccd.max(dev.burst_cycles()));
    assert_eq!(bank.next_write, 20 + dev.read_to_write_delay());

    // Row-active bank in the other rank takes the tRTRS turnaround.
    let remote = mc.bank_state(1, 1);
    assert_eq!(remote.next_read, 20 + dev.burst_cycles() + dev.t_rtrs);
    assert_eq!(remote.next_write, 20 + dev.read_to_write_delay());

    // Idle banks in the other rank are untouched.
    assert_eq!(mc.bank_state(1, 0).next_read, 0);
}

/// Tests that READ_P blocks column commands until the implicit precharge.
#[test]
fn test_read_autopre_clamps_columns() {
    let config = timing_config();
    let mut mc = controller(&config);
    let dev = &config.device;

    mc.apply_command(&command(CommandKind::Activate, 0, 0, 5))
        .expect("activate should apply");
    idle(&mut mc, 20);
    mc.apply_command(&command(CommandKind::ReadP, 0, 0, 5))
        .expect("read should apply");

    let bank = mc.bank_state(0, 0);
    let expected_activate = dev.t_rc.max(20 + dev.read_autopre_delay());
    assert_eq!(bank.last_command, Some(CommandKind::ReadP));
    assert_eq!(bank.next_activate, expected_activate);
    assert_eq!(bank.next_read, expected_activate);
    assert_eq!(bank.next_write, expected_activate);
    assert_eq!(bank.state_change_countdown, dev.read_to_pre_delay());
}

/// Tests the WRITE effects across banks and ranks.
#[test]
fn test_write_effects() {
    let config = timing_config();
    let mut mc = controller(&config);
    let dev = &config.device;

    mc.apply_command(&command(CommandKind::Activate, 0, 0, 5))
        .expect("activate should apply");
    mc.apply_command(&command(CommandKind::Activate, 1, 1, 7))
        .expect("activate should apply");
    idle(&mut mc, 20);

    mc.apply_command(&command(CommandKind::Write, 0, 0, 5))
        .expect("write should apply");

    let bank = mc.bank_state(0, 0);
    assert_eq!(bank.last_command, Some(CommandKind::Write));
    assert_eq!(bank.next_precharge, 20 + dev.write_to_pre_delay());
    assert_eq!(bank.next_write, 20 + dev.burst_cycles().max(dev.t_ccd));
    assert_eq!(bank.next_read, 20 + dev.write_to_read_delay_b());

    let remote = mc.bank_state(1, 1);
    assert_eq!(remote.next_write, 20 + dev.burst_cycles() + dev.t_rtrs);
    assert_eq!(remote.next_read, 20 + dev.write_to_read_delay_r());
}

/// Tests the implicit transitions after an auto-precharging read.
#[test]
fn test_implicit_precharge_chain() {
    let config = timing_config();
    let mut mc = controller(&config);
    let dev = config.device.clone();

    mc.apply_command(&command(CommandKind::Activate, 0, 0, 5))
        .expect("activate should apply");
    idle(&mut mc, 20);
    mc.apply_command(&command(CommandKind::ReadP, 0, 0, 5))
        .expect("read should apply");

    // The read burst keeps the bank row-active until the countdown fires.
    idle(&mut mc, dev.read_to_pre_delay() - 1);
    assert_eq!(mc.bank_state(0, 0).current_state, BankStatus::RowActive);

    idle(&mut mc, 1);
    assert_eq!(mc.bank_state(0, 0).current_state, BankStatus::Precharging);
    assert_eq!(mc.bank_state(0, 0).last_command, Some(CommandKind::Precharge));

    idle(&mut mc, dev.t_rp);
    assert_eq!(mc.bank_state(0, 0).current_state, BankStatus::Idle);
}

/// Tests the REFRESH sweep over a rank.
#[test]
fn test_refresh_effects() {
    let config = timing_config();
    let mut mc = controller(&config);
    let dev = &config.device;

    mc.apply_command(&command(CommandKind::Refresh, 0, 0, 0))
        .expect("refresh should apply");

    for bank in 0..dev.num_banks as usize {
        let state = mc.bank_state(0, bank);
        assert_eq!(state.current_state, BankStatus::Refreshing);
        assert_eq!(state.last_command, Some(CommandKind::Refresh));
        assert_eq!(state.next_activate, dev.t_rfc);
        assert_eq!(state.state_change_countdown, dev.t_rfc);
    }
    assert_eq!(mc.bank_state(1, 0).current_state, BankStatus::Idle);
}

/// Tests the per-command energy adders.
#[test]
fn test_energy_accounting() {
    let config = timing_config();
    let mut mc = controller(&config);
    let dev = &config.device;

    mc.apply_command(&command(CommandKind::Activate, 0, 0, 5))
        .expect("activate should apply");
    let actpre = ((dev.idd0 * dev.t_rc)
        - ((dev.idd3n * dev.t_ras) + (dev.idd2n * (dev.t_rc - dev.t_ras))))
        * dev.num_devices;
    assert_eq!(mc.stats().actpre_energy[0], actpre);

    mc.apply_command(&command(CommandKind::Read, 0, 0, 5))
        .expect("read should apply");
    let burst = (dev.idd4r - dev.idd3n) * dev.burst_cycles() * dev.num_devices;
    assert_eq!(mc.stats().burst_energy[0], burst);

    mc.apply_command(&command(CommandKind::Refresh, 1, 0, 0))
        .expect("refresh should apply");
    let refresh = (dev.idd5 - dev.idd3n) * dev.t_rfc * dev.num_devices;
    assert_eq!(mc.stats().refresh_energy[1], refresh);
}

/// Tests that a DATA packet is not a command.
#[test]
fn test_data_is_not_a_command() {
    let config = timing_config();
    let mut mc = controller(&config);

    let err = mc
        .apply_command(&command(CommandKind::Data, 0, 0, 0))
        .expect_err("data must be rejected");
    assert_eq!(format!("{}", err), "popped a command of unhandled type DATA");
}

/// Tests that earliest-issue cycles never move backwards under load.
#[test]
fn test_next_cycles_monotone() {
    let config = Config::default();
    let mut mc = controller(&config);

    for i in 0..6u64 {
        let transaction = if i % 2 == 0 {
            dramguard::mem::Transaction::read(0x1000 + i * 0x40, 0)
        } else {
            dramguard::mem::Transaction::write(0x1000 + i * 0x40, i, 0)
        };
        assert!(mc.add_transaction(transaction));
    }

    let mut prev = (0u64, 0u64, 0u64, 0u64);
    for _ in 0..400 {
        mc.update().expect("update should not fault");
        let bank = mc.bank_state(0, 0);
        let now = (
            bank.next_activate,
            bank.next_precharge,
            bank.next_read,
            bank.next_write,
        );
        assert!(now.0 >= prev.0);
        assert!(now.1 >= prev.1);
        assert!(now.2 >= prev.2);
        assert!(now.3 >= prev.3);
        prev = now;
    }
}

/// Tests tRC spacing between activates observed end to end.
#[test]
fn test_activate_spacing() {
    let config = Config::default();
    let mut mc = controller(&config);

    assert!(mc.add_transaction(dramguard::mem::Transaction::read(0x1000, 0)));
    assert!(mc.add_transaction(dramguard::mem::Transaction::read(0x8000, 0)));

    let mut activates = Vec::new();
    let mut last = None;
    for _ in 0..200 {
        mc.update().expect("update should not fault");
        let command = mc.bank_state(0, 0).last_command;
        if command == Some(CommandKind::Activate) && last != Some(CommandKind::Activate) {
            activates.push(mc.cycle() - 1);
        }
        last = command;
    }

    assert_eq!(activates.len(), 2);
    assert!(activates[1] - activates[0] >= config.device.t_rc);
}
