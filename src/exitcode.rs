//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// Any failure: configuration, authentication, service or usage
pub const FAILURE: i32 = 1;
