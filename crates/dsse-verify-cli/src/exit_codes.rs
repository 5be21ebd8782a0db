//! Process exit codes. Part of the CLI contract.

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 1; // Unreadable file, bad JSON, unusable key material
pub const INTERNAL_ERROR: i32 = 2;
pub const UNANCHORED: i32 = 3; // Signature valid, no transparency-log anchoring
pub const VERIFICATION_FAILED: i32 = 4;
pub const NETWORK_ERROR: i32 = 5;
