//! Integration tests for configuration loading.

use dramguard::config::{Config, Protection};

/// Tests that an empty document yields the defaults.
#[test]
fn test_empty_toml_defaults() {
    let config: Config = toml::from_str("").expect("empty config should parse");

    assert_eq!(config.device.num_ranks, 1);
    assert_eq!(config.device.num_banks, 8);
    assert_eq!(config.device.bl, 8);
    assert_eq!(config.system.trans_queue_depth, 32);
    assert_eq!(config.system.protection, Protection::Regular);
    assert!(config.system.single_bank_mode);
}

/// Tests parsing of overridden fields.
#[test]
fn test_toml_overrides() {
    let text = r#"
        [device]
        num_ranks = 4
        t_rcd = 12

        [system]
        protection = "dag"
        trans_queue_depth = 8
        use_low_power = true

        [defence]
        slack = 0.9
        def_clk_div = 2
    "#;
    let config: Config = toml::from_str(text).expect("config should parse");

    assert_eq!(config.device.num_ranks, 4);
    assert_eq!(config.device.t_rcd, 12);
    assert_eq!(config.system.protection, Protection::Dag);
    assert_eq!(config.system.trans_queue_depth, 8);
    assert!(config.system.use_low_power);
    assert_eq!(config.defence.slack, 0.9);
    assert_eq!(config.defence.def_clk_div, 2);
}

/// Tests every protection policy name.
#[test]
fn test_protection_names() {
    for (name, expected) in [
        ("regular", Protection::Regular),
        ("fixed_service_channel", Protection::FixedServiceChannel),
        ("fixed_service_rank", Protection::FixedServiceRank),
        ("fixed_service_bank", Protection::FixedServiceBank),
        ("fixed_rate", Protection::FixedRate),
        ("dag", Protection::Dag),
    ] {
        let text = format!("[system]\nprotection = \"{}\"\n", name);
        let config: Config = toml::from_str(&text).expect("config should parse");
        assert_eq!(config.system.protection, expected);
    }
}

/// Tests the derived JEDEC delays against the default device.
#[test]
fn test_derived_delays() {
    let device = Config::default().device;

    assert_eq!(device.rl(), 10);
    assert_eq!(device.burst_cycles(), 4);
    assert_eq!(device.transaction_bytes(), 64);
    assert_eq!(device.refresh_cycles(), 5200);

    assert_eq!(device.read_to_pre_delay(), 5);
    assert_eq!(device.write_to_pre_delay(), 21);
    assert_eq!(device.read_to_write_delay(), 8);
    assert_eq!(device.write_to_read_delay_b(), 16);
    assert_eq!(device.write_to_read_delay_r(), 2);
    assert_eq!(device.read_autopre_delay(), 15);
    assert_eq!(device.write_autopre_delay(), 31);
    assert_eq!(device.act_to_column(), 10);
}
