//! Simulation error definitions.
//!
//! This module defines the error type covering the fatal conditions the
//! controller can encounter. All of them indicate either a protocol
//! violation inside the simulator (bus collisions, unmatched returns) or a
//! malformed defence DAG document; none are recoverable mid-simulation.

use std::fmt;

/// Fatal simulation errors.
///
/// Returned by `MemoryController::update` and the packet-delivery paths.
/// Once one of these is observed the simulation state is no longer
/// trustworthy and the run should be aborted.
#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    /// A command was issued while the command bus still held a packet.
    CommandBusCollision,

    /// Write data was issued while the data bus still held a packet.
    DataBusCollision,

    /// Read data returned from a rank with no matching pending transaction.
    ///
    /// The associated value is the returning physical address.
    UnmatchedReadReturn(u64),

    /// A packet of an unexpected kind was delivered.
    ///
    /// `kind` is the packet kind, `target` names the receiver (controller
    /// return path or a rank).
    UnexpectedPacket {
        kind: &'static str,
        target: &'static str,
    },

    /// The command queue produced a packet the controller cannot apply.
    UnknownCommand(&'static str),

    /// An `enqueue` was attempted on a full per-bank command queue.
    CommandQueueOverflow { rank: usize, bank: usize },

    /// A defence DAG edge does not connect the nodes its position implies.
    ///
    /// Edge lists are serialized column-major over (source, dest); an edge
    /// whose endpoints disagree with its index would silently mis-schedule,
    /// so it is rejected outright.
    DagEdgeMismatch {
        phase: usize,
        edge: usize,
        expected: usize,
        found: usize,
    },

    /// A defence DAG phase is missing an edge the schedule computation needs.
    DagMissingEdge { phase: usize, edge: usize },

    /// The configured slack factor is outside the accepted range (< 1.01).
    SlackOutOfRange(f64),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::CommandBusCollision => write!(f, "command bus collision"),
            SimError::DataBusCollision => write!(f, "data bus collision"),
            SimError::UnmatchedReadReturn(addr) => {
                write!(f, "no pending transaction matches returning read {:#x}", addr)
            }
            SimError::UnexpectedPacket { kind, target } => {
                write!(f, "{} received an unexpected {} packet", target, kind)
            }
            SimError::UnknownCommand(kind) => {
                write!(f, "popped a command of unhandled type {}", kind)
            }
            SimError::CommandQueueOverflow { rank, bank } => {
                write!(f, "command queue overflow at rank {} bank {}", rank, bank)
            }
            SimError::DagEdgeMismatch {
                phase,
                edge,
                expected,
                found,
            } => write!(
                f,
                "dag phase {} edge {} connects node {} where {} was required",
                phase, edge, found, expected
            ),
            SimError::DagMissingEdge { phase, edge } => {
                write!(f, "dag phase {} has no edge at index {}", phase, edge)
            }
            SimError::SlackOutOfRange(slack) => {
                write!(f, "slack {} is outside the accepted range", slack)
            }
        }
    }
}

impl std::error::Error for SimError {}
