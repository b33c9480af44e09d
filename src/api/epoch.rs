//! Millisecond Unix-epoch conversions used by the API's timestamp fields.

// self
use crate::_prelude::*;

/// Converts an instant to milliseconds since the Unix epoch, truncating sub-millisecond precision
/// toward negative infinity.
pub fn to_ms_epoch(instant: OffsetDateTime) -> i64 {
	instant.unix_timestamp() * 1_000 + i64::from(instant.millisecond())
}

/// Converts milliseconds since the Unix epoch to a UTC instant.
pub fn from_ms_epoch(ms: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
}
