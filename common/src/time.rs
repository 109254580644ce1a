// Time types used across the project
//
// Consensus code only ever reads time from block headers. Nothing in this
// crate looks at the system clock.

// Seconds since the unix epoch, as found in block headers
pub type TimestampSeconds = u64;

// Sentinel used for "never happened yet"
pub const TIMESTAMP_ZERO: TimestampSeconds = 0;

