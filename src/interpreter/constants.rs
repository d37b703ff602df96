// Constants for the SYN-C runtime

/// Number of addressable words; valid addresses are `1..MEMORY_SIZE`
pub const MEMORY_SIZE: u32 = 1 << 24;

/// The null pointer; address 0 is never a valid word slot
pub const NULL_ADDRESS: u32 = 0;

/// First address of the read-only string segment
pub const STATIC_SEGMENT_START: u32 = 1;

/// Binary digits consumed by `READ` for one word
pub const READ_WORD_BITS: u32 = 32;

/// Elementary operations allowed before an agent's first output line
pub const FIRST_TURN_OPERATION_BUDGET: u64 = 500_000;

/// Elementary operations allowed before each later output line
pub const TURN_OPERATION_BUDGET: u64 = 30_000;

/// Characters of `PRINTERR` output kept per turn
pub const DEBUG_OUTPUT_LIMIT: usize = 600;
