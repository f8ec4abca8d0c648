//! Exit codes for the `turnstile` binary. Part of the public contract.

pub const SUCCESS: i32 = 0; // Accepted or bypassed
pub const REJECTED: i32 = 1; // Missing or invalid token
pub const CONFIG_ERROR: i32 = 2; // Configuration or I/O failure before verification
