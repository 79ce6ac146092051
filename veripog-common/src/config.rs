//! Compile-time constants

/// Whether to do bounds checking when accessing array elements.
pub const ENABLE_BOUNDS_CHECKING: bool = cfg!(debug_assertions);
/// Check the `requires!()` assertions at runtime (cheap).
pub const CHECK_PRECONDITIONS: bool = true;
/// Check the `invariant!()` assertions at runtime (cheap).
pub const CHECK_INVARIANTS: bool = true;

/// Initial capacity of small growable sequences.
pub const MIN_SIZE: usize = 10;
/// Growth factor of [`Vector`](crate::memory::Vector), as a ratio (1.45).
pub const GROW_NUMERATOR: usize = 29;
/// See [`GROW_NUMERATOR`](constant.GROW_NUMERATOR.html).
pub const GROW_DENOMINATOR: usize = 20;

/// Largest gap between consecutive clause ids that is padded with holes
/// instead of opening a new block.
pub const MAX_GAP: u32 = 10;
/// How many 32-bit words fit in a single clause chunk (4 MiB).
pub const CHUNK_WORDS: usize = 1 << 20;
/// Assumed virtual memory budget for clause chunks (128 GiB).
const VM_LIMIT: usize = 1 << 37;
/// Maximum number of clause chunks.
pub const CHUNK_MAX: usize = VM_LIMIT / (CHUNK_WORDS * std::mem::size_of::<u32>());

/// How many input clauses one worker deletes per work unit.
pub const CLAUSE_DELETION_BLOCK: u32 = 250;
/// Lower bound on the deletion progress-report interval.
pub const REPORT_MIN_INTERVAL: usize = 1_000;
/// Upper bound on the deletion progress-report interval.
pub const REPORT_MAX_INTERVAL: usize = 100_000;
/// Target number of progress reports over a full deletion pass.
pub const REPORT_MAX_COUNT: usize = 10;
