//! Physical address decomposition.
//!
//! Maps a flat physical address onto DRAM coordinates (channel, rank, bank,
//! row, column) by peeling fixed-width bit fields, and composes coordinates
//! back into an address for tests and diagnostics. Field widths are derived
//! from the configured geometry; the low `log2(transaction size)` bits are
//! the byte offset within one burst and carry no coordinate information.

/// DRAM coordinates of a physical address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DramAddress {
    /// Channel number.
    pub channel: u64,
    /// Rank number within the channel.
    pub rank: u64,
    /// Bank number within the rank.
    pub bank: u64,
    /// Row number within the bank.
    pub row: u64,
    /// Column number within the row.
    pub column: u64,
}

/// Bit-field address mapper.
///
/// Decomposition order, from the least significant bit upward after the
/// byte offset: channel, column, bank, rank, row. Keeping the column bits
/// low preserves row locality for sequential addresses.
#[derive(Clone, Copy, Debug)]
pub struct AddressMapper {
    byte_offset_bits: u32,
    channel_bits: u32,
    rank_bits: u32,
    bank_bits: u32,
    row_bits: u32,
    column_bits: u32,
}

/// Number of address bits needed to index `count` items.
fn bits_for(count: u64) -> u32 {
    if count <= 1 {
        0
    } else {
        64 - (count - 1).leading_zeros()
    }
}

impl AddressMapper {
    /// Creates a mapper for the given geometry.
    ///
    /// # Arguments
    ///
    /// * `num_channels` - Channels in the system.
    /// * `num_ranks` - Ranks per channel.
    /// * `num_banks` - Banks per rank.
    /// * `num_rows` - Rows per bank.
    /// * `num_columns` - Columns per row.
    /// * `transaction_bytes` - Bytes moved by one full burst; its log2 is
    ///   the byte-offset width stripped before decomposition.
    pub fn new(
        num_channels: u64,
        num_ranks: u64,
        num_banks: u64,
        num_rows: u64,
        num_columns: u64,
        transaction_bytes: u64,
    ) -> Self {
        Self {
            byte_offset_bits: bits_for(transaction_bytes),
            channel_bits: bits_for(num_channels),
            rank_bits: bits_for(num_ranks),
            bank_bits: bits_for(num_banks),
            row_bits: bits_for(num_rows),
            column_bits: bits_for(num_columns),
        }
    }

    /// Decomposes a physical address into DRAM coordinates.
    pub fn map(&self, address: u64) -> DramAddress {
        let mut addr = address >> self.byte_offset_bits;

        let channel = take(&mut addr, self.channel_bits);
        let column = take(&mut addr, self.column_bits);
        let bank = take(&mut addr, self.bank_bits);
        let rank = take(&mut addr, self.rank_bits);
        let row = take(&mut addr, self.row_bits);

        DramAddress {
            channel,
            rank,
            bank,
            row,
            column,
        }
    }

    /// Composes DRAM coordinates back into a physical address.
    ///
    /// Inverse of [`AddressMapper::map`]; the byte offset is zero.
    pub fn compose(&self, coords: &DramAddress) -> u64 {
        let mut addr = coords.row;
        addr = (addr << self.rank_bits) | coords.rank;
        addr = (addr << self.bank_bits) | coords.bank;
        addr = (addr << self.column_bits) | coords.column;
        addr = (addr << self.channel_bits) | coords.channel;
        addr << self.byte_offset_bits
    }
}

/// Extracts the low `bits` bits of `addr` and shifts them out.
fn take(addr: &mut u64, bits: u32) -> u64 {
    if bits == 0 {
        return 0;
    }
    let field = *addr & ((1 << bits) - 1);
    *addr >>= bits;
    field
}
