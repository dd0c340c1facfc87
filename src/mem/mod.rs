//! Memory controller core.
//!
//! Implements the request scheduling and bank-timing engine: bus packets
//! and the two single-owner channels, per-bank timing state, the bounded
//! command queue, the rank device model, and the controller that ties them
//! together under a per-cycle `update`.

pub mod bank;
pub mod bus;
pub mod command_queue;
pub mod controller;
pub mod rank;
pub mod transaction;

pub use bank::{BankState, BankStatus};
pub use bus::{BusChannel, BusPacket, CommandKind};
pub use command_queue::CommandQueue;
pub use controller::{MemoryController, TransactionCallback};
pub use rank::Rank;
pub use transaction::{Transaction, TransactionKind};
