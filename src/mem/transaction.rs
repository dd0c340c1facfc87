//! Client-visible memory transactions.

use super::bus::CommandKind;

/// Kind of a client transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    /// A read request.
    DataRead,
    /// A write request carrying its payload.
    DataWrite,
    /// Completed read data travelling back to the client.
    ReturnData,
}

/// A memory transaction owned by the controller from admission until it is
/// either decomposed into commands (writes) or matched with returning data
/// (reads).
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Physical address.
    pub address: u64,
    /// Payload for writes and return data.
    pub data: u64,
    /// Security domain of the requesting tenant.
    pub security_domain: u64,
    /// Defence phase this transaction was dispatched under, if any.
    pub phase_id: Option<usize>,
    /// Defence node this transaction was dispatched under, if any.
    pub node_id: Option<usize>,
    /// Marks synthesized defence padding.
    pub is_fake: bool,
    /// Cycle the transaction entered the controller.
    pub time_added: u64,
}

impl Transaction {
    /// Creates a read request.
    pub fn read(address: u64, security_domain: u64) -> Self {
        Self {
            kind: TransactionKind::DataRead,
            address,
            data: 0,
            security_domain,
            phase_id: None,
            node_id: None,
            is_fake: false,
            time_added: 0,
        }
    }

    /// Creates a write request.
    pub fn write(address: u64, data: u64, security_domain: u64) -> Self {
        Self {
            kind: TransactionKind::DataWrite,
            address,
            data,
            security_domain,
            phase_id: None,
            node_id: None,
            is_fake: false,
            time_added: 0,
        }
    }

    /// Creates return data for a completed read.
    pub fn return_data(address: u64, data: u64) -> Self {
        Self {
            kind: TransactionKind::ReturnData,
            address,
            data,
            security_domain: 0,
            phase_id: None,
            node_id: None,
            is_fake: false,
            time_added: 0,
        }
    }

    /// Creates a synthesized defence request against address zero.
    pub fn fake(
        kind: TransactionKind,
        security_domain: u64,
        phase_id: usize,
        node_id: usize,
        now: u64,
    ) -> Self {
        Self {
            kind,
            address: 0,
            data: 0,
            security_domain,
            phase_id: Some(phase_id),
            node_id: Some(node_id),
            is_fake: true,
            time_added: now,
        }
    }

    /// The column command this transaction decomposes to.
    ///
    /// The controller runs a close-page policy, so reads and writes issue
    /// with auto-precharge.
    pub fn command_kind(&self) -> CommandKind {
        match self.kind {
            TransactionKind::DataWrite => CommandKind::WriteP,
            _ => CommandKind::ReadP,
        }
    }
}
