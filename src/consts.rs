//! Capacity limits and table geometry for the name pool.

// -----------------------------------------------------------------------------
// Names
// -----------------------------------------------------------------------------

/// Maximum number of UTF-8 bytes in a stored name, excluding any numeric
/// suffix split off by [`Name::new`].
///
/// [`Name::new`]: crate::name::Name::new
pub const MAX_NAME_BYTES: usize = 1023;

// -----------------------------------------------------------------------------
// Name Pool - Shards
// -----------------------------------------------------------------------------

/// Bit width of the shard index derived from a name hash.
pub(crate) const SHARD_BITS: u32 = 5;

/// Number of independent hash-table shards per dimension (comparison and
/// display each get their own set).
pub const SHARD_COUNT: usize = 1 << SHARD_BITS;

/// Initial number of slots in a freshly created shard (power of two).
pub(crate) const INITIAL_SLOTS_PER_SHARD: usize = 1 << 8;

/// A shard doubles its slot array once `used * LOAD_FACTOR_DIVISOR >=
/// LOAD_FACTOR_QUOTIENT * capacity`, i.e. at 90% occupancy.
pub(crate) const LOAD_FACTOR_QUOTIENT: u32 = 9;
pub(crate) const LOAD_FACTOR_DIVISOR: u32 = 10;

// -----------------------------------------------------------------------------
// Name Pool - Entry Storage
// -----------------------------------------------------------------------------

/// Bit width of the block index inside an [`EntryId`].
///
/// [`EntryId`]: crate::name::EntryId
pub(crate) const BLOCK_BITS: u32 = 13;

/// Bit width of the block-local offset inside an [`EntryId`].
///
/// [`EntryId`]: crate::name::EntryId
pub(crate) const OFFSET_BITS: u32 = 16;

/// Maximum number of entry blocks the arena can ever allocate.
///
/// Exceeding this is a hard capacity ceiling and aborts the process.
pub const MAX_BLOCKS: usize = 1 << BLOCK_BITS;

/// Number of addressable entry offsets per block.
pub(crate) const BLOCK_OFFSETS: usize = 1 << OFFSET_BITS;

/// Allocation granularity inside a block. Entry offsets are expressed in
/// strides, so a 16-bit offset addresses `BLOCK_OFFSETS * ENTRY_STRIDE`
/// bytes.
pub(crate) const ENTRY_STRIDE: usize = 4;

/// Size in bytes of one entry block.
pub const BLOCK_SIZE_BYTES: usize = ENTRY_STRIDE * BLOCK_OFFSETS;
