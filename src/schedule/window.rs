//! Nearest-occurrence search for weekly blocks.
//!
//! A block describes a weekday+time that recurs every week. For a given
//! session start we materialize the occurrence in the session's own
//! (user-local) week plus the adjacent weeks, so a session just across a week
//! boundary (Sunday 23:55 vs. a Monday 00:05 block) still finds its block.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};

use crate::schedule::blocks::{parse_block_time, WeeklyBlock};

/// One concrete occurrence of a weekly block near a session start.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub block: &'a WeeklyBlock,
    /// The occurrence expressed in the user's zone.
    pub scheduled_local: DateTime<FixedOffset>,
    /// Absolute distance between session start and occurrence, in minutes.
    pub diff_minutes: f64,
}

impl Candidate<'_> {
    /// `YYYY-MM-DD` of the occurrence in the user's zone; together with the
    /// block time this forms the schedule-log id.
    pub fn scheduled_iso_date(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}",
            self.scheduled_local.year(),
            self.scheduled_local.month(),
            self.scheduled_local.day()
        )
    }
}

/// Materialize the block occurrence in the session's local week and the two
/// adjacent weeks. Returns nothing for a block whose time does not parse
/// (pre-validated callers never hit this; the function stays total anyway).
pub fn candidate_occurrences<'a>(
    block: &'a WeeklyBlock,
    started_at: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<Candidate<'a>> {
    let Some((hour, minute)) = parse_block_time(&block.time) else {
        return Vec::new();
    };
    let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
        return Vec::new();
    };

    let local = started_at.with_timezone(&offset);
    let week_start = local.date_naive().week(Weekday::Mon).first_day();
    let anchor = week_start + Duration::days(i64::from(block.day.weekday().num_days_from_monday()));

    [-1i64, 0, 1]
        .into_iter()
        .filter_map(|week_offset| {
            let date = anchor + Duration::weeks(week_offset);
            let scheduled_local = offset.from_local_datetime(&date.and_time(time)).single()?;
            let diff = started_at.signed_duration_since(scheduled_local);
            Some(Candidate {
                block,
                scheduled_local,
                diff_minutes: diff.num_seconds().abs() as f64 / 60.0,
            })
        })
        .collect()
}

/// Global nearest occurrence across all blocks. Ties keep the candidate
/// encountered first, which is stable because block order is the declared
/// order and week offsets run -1, 0, +1.
pub fn nearest_candidate<'a>(
    blocks: &'a [WeeklyBlock],
    started_at: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<Candidate<'a>> {
    let mut nearest: Option<Candidate<'a>> = None;
    for block in blocks {
        for candidate in candidate_occurrences(block, started_at, offset) {
            let closer = nearest
                .as_ref()
                .map_or(true, |best| candidate.diff_minutes < best.diff_minutes);
            if closer {
                nearest = Some(candidate);
            }
        }
    }
    nearest
}
