pub const USERS: &str = "users";
pub const DIAGNOSTICS: &str = "diagnostics";
pub const SESSIONS: &str = "sessions";
pub const HOMEWORK: &str = "homework";
pub const LESSON_PROGRESS: &str = "lesson_progress";
pub const LESSON_CACHE: &str = "lesson_cache";
pub const SCHEDULE_LOGS: &str = "schedule_logs";
pub const SCHEDULE_ALERTS: &str = "schedule_alerts";
pub const PUSH_SUBSCRIPTIONS: &str = "push_subscriptions";
pub const NOTIFICATION_DISPATCH: &str = "notification_dispatch";
pub const ADAPTATIONS: &str = "adaptations";
