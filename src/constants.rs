/// Maximum minute difference between a session start and its nearest weekly
/// block for the session to count as on schedule.
pub const DEFAULT_TOLERANCE_WINDOW_MINUTES: i64 = 75;

/// Score at or above which a homework/lesson attempt counts as a pass.
pub const PASSING_SCORE: f64 = 70.0;

/// Diagnostic area score at or above which the area is listed as a strength.
pub const STRENGTH_THRESHOLD: f64 = 70.0;

/// Diagnostic area score below which the area is listed as a weakness.
pub const WEAKNESS_THRESHOLD: f64 = 50.0;

/// Successful repetitions required before an item graduates to mastered.
pub const MASTERY_REPETITIONS: u32 = 5;

/// Hours until newly queued homework is due.
pub const HOMEWORK_DEADLINE_HOURS: i64 = 48;

/// Fallback duration for weekly blocks stored without a usable value.
pub const DEFAULT_BLOCK_DURATION_MINUTES: u32 = 15;

/// How far ahead of a block the "pre" reminder fires.
pub const REMINDER_LOOKAHEAD_MINUTES: i64 = 5;

/// Time zone applied when a profile has none configured.
pub const DEFAULT_TIMEZONE: &str = "America/Asuncion";

/// Default cap on chat sessions per user per calendar day.
pub const DEFAULT_DAILY_SESSION_LIMIT: u32 = 50;

/// Upper bound on a reported session duration (30 minutes).
pub const MAX_SESSION_MS: i64 = 30 * 60 * 1000;

/// Lesson score required to unlock the next module in a track.
pub const MODULE_UNLOCK_SCORE: i64 = 60;

/// Adherence credit granted when overdue homework is finally completed.
pub const LATE_COMPLETION_CREDIT: f64 = 0.5;
