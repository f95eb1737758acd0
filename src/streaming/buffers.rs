//! Buffer and batch size constants for streaming loads.
//!
//! These constants control memory usage vs throughput and responsiveness
//! tradeoffs. The defaults suit files of a few hundred thousand to tens of
//! millions of points.

/// Default chunk size requested from a byte source (256 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Default number of decoded records between suspension points.
/// Large enough that callback and yield overhead is negligible, small
/// enough that a host frame loop keeps running during a load.
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

/// Initial capacity of the partial-line buffer (1 KB).
/// Sufficient for any plausible ASCII point record.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Upper bound on the up-front point allocation taken from a declared
/// count, so a bogus header cannot trigger a huge allocation.
pub const MAX_PREALLOCATED_POINTS: usize = 4 * 1024 * 1024;

/// Output buffer size for point writers (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;
