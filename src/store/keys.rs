//! Key layout for every tree. Per-user documents use a `{user_id}:` prefix so
//! a prefix scan enumerates one user's collection; time-ordered collections
//! embed a reverse timestamp so scans read newest-first.

pub fn user_key(user_id: &str) -> String {
    user_id.to_string()
}

pub fn diagnostic_key(user_id: &str, diagnostic_id: &str) -> String {
    format!("{}:{}", user_id, diagnostic_id)
}

pub fn session_key(user_id: &str, session_id: &str) -> String {
    format!("{}:{}", user_id, session_id)
}

pub fn session_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn homework_key(user_id: &str, homework_id: &str) -> String {
    format!("{}:{}", user_id, homework_id)
}

pub fn homework_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn lesson_progress_key(user_id: &str, module_id: &str) -> String {
    format!("{}:{}", user_id, module_id)
}

pub fn lesson_cache_key(user_id: &str, module_id: &str) -> String {
    format!("{}:{}", user_id, module_id)
}

/// Schedule-log document id: `{YYYY-MM-DD}_{HH:MM}`. The id is derived from
/// the matched occurrence, which is what makes repeated completions for the
/// same occurrence collapse into one log.
pub fn schedule_log_id(scheduled_date: &str, scheduled_time: &str) -> String {
    format!("{}_{}", scheduled_date, scheduled_time)
}

pub fn schedule_log_key(user_id: &str, log_id: &str) -> String {
    format!("{}:{}", user_id, log_id)
}

pub fn schedule_log_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn schedule_alert_key(user_id: &str, timestamp_ms: i64, alert_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", user_id, reverse_ts, alert_id)
}

pub fn schedule_alert_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn push_subscription_key(user_id: &str, subscription_id: &str) -> String {
    format!("{}:{}", user_id, subscription_id)
}

pub fn push_subscription_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

/// Dispatch-marker id: `{YYYY-MM-DD}_{HH:MM}_{pre|now}`. Existence of the id
/// is the whole de-duplication mechanism for reminders.
pub fn dispatch_id(iso_date: &str, time: &str, phase: &str) -> String {
    format!("{}_{}_{}", iso_date, time, phase)
}

pub fn dispatch_key(user_id: &str, dispatch_id: &str) -> String {
    format!("{}:{}", user_id, dispatch_id)
}

pub fn adaptation_key(user_id: &str, timestamp_ms: i64, adaptation_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{}:{:020}:{}", user_id, reverse_ts, adaptation_id)
}

pub fn adaptation_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}
