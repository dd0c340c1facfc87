//! Integration tests for the command queue.

use dramguard::common::SimError;
use dramguard::mem::{BankState, BankStatus, BusPacket, CommandKind, CommandQueue};

fn banks(num_ranks: usize, num_banks: usize) -> Vec<Vec<BankState>> {
    vec![vec![BankState::new(); num_banks]; num_ranks]
}

fn command(kind: CommandKind, rank: usize, bank: usize, row: u64) -> BusPacket {
    BusPacket::new(kind, 0, 0, row, rank, bank, 0, false, 0)
}

/// Tests capacity bookkeeping and the overflow error.
#[test]
fn test_room_and_overflow() {
    let mut cq = CommandQueue::new(1, 1, 2);

    assert!(cq.has_room_for(2, 0, 0));
    cq.enqueue(command(CommandKind::Activate, 0, 0, 1))
        .expect("first enqueue fits");
    cq.enqueue(command(CommandKind::ReadP, 0, 0, 1))
        .expect("second enqueue fits");
    assert!(!cq.has_room_for(1, 0, 0));

    let err = cq
        .enqueue(command(CommandKind::Activate, 0, 0, 2))
        .expect_err("queue is full");
    assert_eq!(err, SimError::CommandQueueOverflow { rank: 0, bank: 0 });
}

/// Tests a bank's FIFO issues its ACTIVATE before the column command.
#[test]
fn test_pop_activate_then_column() {
    let mut cq = CommandQueue::new(1, 1, 8);
    let mut table = banks(1, 1);

    cq.enqueue(command(CommandKind::Activate, 0, 0, 5)).unwrap();
    cq.enqueue(command(CommandKind::ReadP, 0, 0, 5)).unwrap();

    let first = cq.pop(&table).expect("activate should issue");
    assert_eq!(first.kind, CommandKind::Activate);

    // The column command waits until the bank has the row open.
    assert!(cq.pop(&table).is_none());

    table[0][0].current_state = BankStatus::RowActive;
    table[0][0].open_row = Some(5);
    let second = cq.pop(&table).expect("read should issue");
    assert_eq!(second.kind, CommandKind::ReadP);
}

/// Tests a column command to the wrong row never issues.
#[test]
fn test_pop_requires_row_match() {
    let mut cq = CommandQueue::new(1, 1, 8);
    let mut table = banks(1, 1);

    cq.enqueue(command(CommandKind::ReadP, 0, 0, 5)).unwrap();
    table[0][0].current_state = BankStatus::RowActive;
    table[0][0].open_row = Some(6);

    assert!(cq.pop(&table).is_none());
}

/// Tests `next_activate` gates the issue cycle.
#[test]
fn test_pop_respects_next_activate() {
    let mut cq = CommandQueue::new(1, 1, 8);
    let mut table = banks(1, 1);
    table[0][0].next_activate = 3;

    cq.enqueue(command(CommandKind::Activate, 0, 0, 1)).unwrap();

    for _ in 0..3 {
        assert!(cq.pop(&table).is_none());
        cq.step();
    }
    assert!(cq.pop(&table).is_some());
}

/// Tests a waiting refresh issues ahead of queued work.
#[test]
fn test_refresh_takes_priority() {
    let mut cq = CommandQueue::new(1, 2, 8);
    let table = banks(1, 2);

    cq.enqueue(command(CommandKind::Activate, 0, 0, 1)).unwrap();
    cq.need_refresh(0);

    let first = cq.pop(&table).expect("refresh should issue");
    assert_eq!(first.kind, CommandKind::Refresh);
    assert_eq!(first.rank, 0);

    // With the refresh out the door, normal traffic resumes.
    let second = cq.pop(&table).expect("activate should issue");
    assert_eq!(second.kind, CommandKind::Activate);
}

/// Tests refresh preparation precharges an open bank first.
#[test]
fn test_refresh_precharges_open_bank() {
    let mut cq = CommandQueue::new(1, 2, 8);
    let mut table = banks(1, 2);
    table[0][1].current_state = BankStatus::RowActive;
    table[0][1].open_row = Some(9);

    cq.need_refresh(0);

    let first = cq.pop(&table).expect("precharge should issue");
    assert_eq!(first.kind, CommandKind::Precharge);
    assert_eq!(first.bank, 1);
    assert_eq!(first.row, 9);

    // Until the precharge completes the refresh stays blocked.
    table[0][1].current_state = BankStatus::Precharging;
    assert!(cq.pop(&table).is_none());

    table[0][1].current_state = BankStatus::Idle;
    table[0][1].open_row = None;
    let second = cq.pop(&table).expect("refresh should issue");
    assert_eq!(second.kind, CommandKind::Refresh);
}

/// Tests a refresh-bound rank stops accepting new row activations.
#[test]
fn test_refresh_blocks_activates() {
    let mut cq = CommandQueue::new(1, 2, 8);
    let mut table = banks(1, 2);
    table[0][1].current_state = BankStatus::RowActive;
    table[0][1].open_row = Some(9);
    table[0][1].next_precharge = 10;

    cq.enqueue(command(CommandKind::Activate, 0, 0, 1)).unwrap();
    cq.need_refresh(0);

    // Precharge is still too early and the ACTIVATE must not sneak in.
    assert!(cq.pop(&table).is_none());
}

/// Tests the defence domain assignment used by the admission policies.
#[test]
fn test_defence_domains() {
    let mut cq = CommandQueue::new(1, 1, 8);
    assert_eq!(cq.i_defence_domain, None);
    assert_eq!(cq.d_defence_domain, None);

    cq.set_defence_domains(3, 7);
    assert_eq!(cq.i_defence_domain, Some(3));
    assert_eq!(cq.d_defence_domain, Some(7));
}

/// Tests per-rank emptiness.
#[test]
fn test_is_empty() {
    let mut cq = CommandQueue::new(2, 2, 8);

    assert!(cq.is_empty(0));
    cq.enqueue(command(CommandKind::Activate, 1, 1, 1)).unwrap();
    assert!(cq.is_empty(0));
    assert!(!cq.is_empty(1));
}
