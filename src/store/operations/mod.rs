pub mod adaptations;
pub mod diagnostics;
pub mod dispatch;
pub mod homework;
pub mod lesson_progress;
pub mod schedule_logs;
pub mod sessions;
pub mod subscriptions;
pub mod users;
