//! Contract types shared by every extension
//!
//! - [`Timestamp`]: microsecond instants, with `Timestamp::MAX` as the open sentinel
//! - [`ValidityInterval`]: the `[row_start, row_end)` pair of a row version

pub mod interval;
pub mod timestamp;

pub use interval::ValidityInterval;
pub use timestamp::Timestamp;
