//! Process exit codes

/// Any user-facing failure: missing credentials, authentication failure,
/// unknown device, invalid IP address, I/O problems
pub const FAILURE: i32 = 1;
