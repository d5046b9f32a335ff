use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use espanhol_backend::schedule::blocks::{
    is_valid_block_time, parse_weekly_blocks, ActivityType, DayKey, WeeklyBlock,
};
use espanhol_backend::schedule::timezone::utc_offset_for;
use espanhol_backend::schedule::window::{candidate_occurrences, nearest_candidate};
use espanhol_backend::scoring::{calculate_overall_score, score_to_level};
use espanhol_backend::spaced_repetition::{process_spaced_repetition, ProgressionStatus};

fn day_strategy() -> impl Strategy<Value = DayKey> {
    prop_oneof![
        Just(DayKey::Mon),
        Just(DayKey::Tue),
        Just(DayKey::Wed),
        Just(DayKey::Thu),
        Just(DayKey::Fri),
        Just(DayKey::Sat),
        Just(DayKey::Sun),
    ]
}

proptest! {
    #[test]
    fn pt_banding_is_monotonic(a in 0i64..=100, b in 0i64..=100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(score_to_level(lo) <= score_to_level(hi));
    }

    #[test]
    fn pt_overall_score_stays_in_range(
        grammar in 0.0f64..=100.0,
        listening in 0.0f64..=100.0,
        pronunciation in 0.0f64..=100.0,
    ) {
        let overall = calculate_overall_score(grammar, listening, pronunciation);
        prop_assert!((0..=100).contains(&overall));
    }

    #[test]
    fn pt_progression_invariants(count in 0u32..20, score in 0.0f64..=100.0) {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let p = process_spaced_repetition(count, score, now);

        prop_assert!(p.spaced_repetition_step <= 4);
        prop_assert_eq!(p.interval.hours(), [1, 24, 72, 168, 720][p.spaced_repetition_step as usize]);

        if score < 70.0 {
            // Any failure restarts the ladder.
            prop_assert_eq!(p.status, ProgressionStatus::Pending);
            prop_assert_eq!(p.repetition_count, 1);
            prop_assert_eq!(p.spaced_repetition_step, 0);
            prop_assert!(p.next_review_at.is_some());
        } else {
            prop_assert_eq!(p.repetition_count, count + 1);
            if count >= 5 {
                prop_assert_eq!(p.status, ProgressionStatus::Mastered);
                prop_assert!(p.next_review_at.is_none());
            } else {
                prop_assert_eq!(p.status, ProgressionStatus::Completed);
                prop_assert!(p.next_review_at.is_some());
            }
        }
    }

    #[test]
    fn pt_next_review_is_always_in_the_future_unless_mastered(
        count in 0u32..20,
        score in 0.0f64..=100.0,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let p = process_spaced_repetition(count, score, now);
        if let Some(next) = p.next_review_at {
            prop_assert!(next > now);
        }
    }

    #[test]
    fn pt_block_parsing_never_panics_and_partitions_the_input(
        entries in prop::collection::vec(
            prop_oneof![
                Just(serde_json::json!({ "day": "mon", "time": "18:00", "type": "chat" })),
                Just(serde_json::json!({ "day": "xxx", "time": "18:00", "type": "chat" })),
                Just(serde_json::json!({ "day": "tue", "time": "18:07", "type": "chat" })),
                Just(serde_json::json!({ "day": "wed", "time": "09:15", "type": "lesson" })),
                Just(serde_json::json!("garbage")),
                Just(serde_json::json!(42)),
                Just(serde_json::json!(null)),
            ],
            0..12,
        )
    ) {
        let raw = serde_json::Value::Array(entries.clone());
        let parsed = parse_weekly_blocks(&raw);
        prop_assert_eq!(parsed.blocks.len() + parsed.dropped, entries.len());
        for block in &parsed.blocks {
            prop_assert!(is_valid_block_time(&block.time));
        }
    }

    #[test]
    fn pt_nearest_candidate_is_the_global_minimum(
        day in day_strategy(),
        hour in 0u32..24,
        quarter in 0u32..4,
        start_day_offset in 0i64..7,
        start_minute in 0u32..(24 * 60),
    ) {
        let offset = utc_offset_for("America/Asuncion");
        let block = WeeklyBlock {
            day,
            time: format!("{:02}:{:02}", hour, quarter * 15),
            block_type: ActivityType::Chat,
            duration_minutes: 15,
        };

        // An arbitrary instant inside the week of 2026-03-02.
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let started_at = base
            + chrono::Duration::days(start_day_offset)
            + chrono::Duration::minutes(i64::from(start_minute));

        let blocks = [block];
        let nearest = nearest_candidate(&blocks, started_at, offset).expect("candidate");
        for candidate in candidate_occurrences(&blocks[0], started_at, offset) {
            prop_assert!(nearest.diff_minutes <= candidate.diff_minutes);
        }
        // A weekly block is never more than half a week plus the search
        // margin away from its nearest occurrence.
        prop_assert!(nearest.diff_minutes <= 7.0 * 24.0 * 60.0);
    }
}
