// src/constants.rs

/// Daily budget for neutral sites, in seconds (1 hour)
pub const NEUTRAL_LIMIT_SECS: u64 = 60 * 60;

/// Daily budget for distracting sites, in seconds (30 minutes)
pub const DISTRACTING_LIMIT_SECS: u64 = 30 * 60;

/// Productive sites have no time cap; 0 disables the time-based check
pub const PRODUCTIVE_LIMIT_SECS: u64 = 0;

/// Visits this short or shorter are not logged
pub const MIN_LOGGED_SECS: u64 = 5;

/// User id recorded when the extension has no signed-in user
pub const ANONYMOUS_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Chrome limits native messaging to 1MB (1024 * 1024 bytes)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Maximum habit title length
pub const MAX_HABIT_TITLE_LEN: usize = 100;

/// Maximum hostname length (RFC 1035)
pub const MAX_SITE_URL_LEN: usize = 253;

/// Upper bound on a single logged visit (24 hours)
pub const MAX_TIME_SPENT_SECS: i64 = 24 * 60 * 60;
