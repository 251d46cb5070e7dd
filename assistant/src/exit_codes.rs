//! Stable exit codes for the `ai` binary.

/// Session ended normally (operator stopped or answered `exit`).
pub const OK: i32 = 0;
/// Configuration, transport or protocol failure.
pub const FAILURE: i32 = 1;
