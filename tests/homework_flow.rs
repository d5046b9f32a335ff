mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use espanhol_backend::adapter::SkillArea;
use espanhol_backend::clock::FixedClock;
use espanhol_backend::services::homework::{
    complete_homework, queue_homework, QueueHomeworkInput,
};
use espanhol_backend::spaced_repetition::ReviewInterval;
use espanhol_backend::store::operations::homework::HomeworkStatus;
use espanhol_backend::store::operations::schedule_logs::AlertReason;
use espanhol_backend::workers::homework_deadline;

use common::fixtures::{seed_profile, setup_store};

fn queue_input(id: &str) -> QueueHomeworkInput {
    QueueHomeworkInput {
        homework_id: id.to_string(),
        source_session_id: "s1".to_string(),
        source_type: SkillArea::Pronunciation,
        content_ref: format!("reinforcement:pronunciation:{id}"),
    }
}

#[tokio::test]
async fn ladder_climbs_through_every_interval_to_mastery() {
    let (_tmp, store) = setup_store("hw_ladder.sled");
    seed_profile(&store, "u1", "America/Asuncion", json!(null));
    let clock = FixedClock::at(Utc::now());

    queue_homework(&store, &clock, "u1", &queue_input("h1")).unwrap();

    let expected = [
        (ReviewInterval::OneHour, 0u8),
        (ReviewInterval::OneDay, 1),
        (ReviewInterval::ThreeDays, 2),
        (ReviewInterval::SevenDays, 3),
        (ReviewInterval::ThirtyDays, 4),
    ];
    for (interval, step) in expected {
        complete_homework(&store, &clock, "u1", "h1", 90).unwrap();
        let hw = store.get_homework("u1", "h1").unwrap().unwrap();
        assert_eq!(hw.interval, interval);
        assert_eq!(hw.spaced_repetition_step, step);
        assert_eq!(
            hw.next_review_at,
            Some(clock.now() + Duration::hours(interval.hours()))
        );
        clock.advance(Duration::hours(interval.hours()));
    }

    // Sixth pass graduates.
    let result = complete_homework(&store, &clock, "u1", "h1", 90).unwrap();
    assert_eq!(result.status, HomeworkStatus::Mastered);
    let hw = store.get_homework("u1", "h1").unwrap().unwrap();
    assert!(hw.next_review_at.is_none());
    assert_eq!(hw.repetition_count, 6);
}

#[tokio::test]
async fn mid_ladder_failure_restarts_from_one_hour() {
    let (_tmp, store) = setup_store("hw_reset.sled");
    seed_profile(&store, "u1", "America/Asuncion", json!(null));
    let clock = FixedClock::at(Utc::now());

    queue_homework(&store, &clock, "u1", &queue_input("h1")).unwrap();
    for _ in 0..3 {
        complete_homework(&store, &clock, "u1", "h1", 85).unwrap();
    }
    let hw = store.get_homework("u1", "h1").unwrap().unwrap();
    assert_eq!(hw.repetition_count, 3);
    assert_eq!(hw.interval, ReviewInterval::ThreeDays);

    complete_homework(&store, &clock, "u1", "h1", 69).unwrap();
    let hw = store.get_homework("u1", "h1").unwrap().unwrap();
    assert_eq!(hw.status, HomeworkStatus::Pending);
    assert_eq!(hw.repetition_count, 1);
    assert_eq!(hw.interval, ReviewInterval::OneHour);
    assert_eq!(hw.spaced_repetition_step, 0);
}

#[tokio::test]
async fn overdue_sweep_then_late_completion_gives_half_credit() {
    let (_tmp, store) = setup_store("hw_overdue.sled");
    seed_profile(&store, "u1", "America/Asuncion", json!(null));
    let clock = FixedClock::at(Utc::now());

    queue_homework(&store, &clock, "u1", &queue_input("h1")).unwrap();

    clock.advance(Duration::hours(49));
    homework_deadline::run(&store, &clock).await;

    let hw = store.get_homework("u1", "h1").unwrap().unwrap();
    assert_eq!(hw.status, HomeworkStatus::Overdue);
    let profile = store.get_user_profile("u1").unwrap().unwrap();
    assert_eq!(profile.adherence_score, -1.0);
    assert!(profile
        .homework_priority_queue
        .contains(&"reinforcement:pronunciation:h1".to_string()));
    let alerts = store.list_schedule_alerts("u1", 10).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].reason, AlertReason::HomeworkOverdue);

    let result = complete_homework(&store, &clock, "u1", "h1", 80).unwrap();
    assert!(result.accepted);
    assert_eq!(result.credit_applied, 0.5);
    let profile = store.get_user_profile("u1").unwrap().unwrap();
    assert_eq!(profile.adherence_score, -0.5);
}

#[tokio::test]
async fn requeueing_resets_the_deadline_and_ladder() {
    let (_tmp, store) = setup_store("hw_requeue.sled");
    seed_profile(&store, "u1", "America/Asuncion", json!(null));
    let clock = FixedClock::at(Utc::now());

    queue_homework(&store, &clock, "u1", &queue_input("h1")).unwrap();
    complete_homework(&store, &clock, "u1", "h1", 95).unwrap();

    clock.advance(Duration::hours(10));
    queue_homework(&store, &clock, "u1", &queue_input("h1")).unwrap();

    let hw = store.get_homework("u1", "h1").unwrap().unwrap();
    assert_eq!(hw.status, HomeworkStatus::Pending);
    assert_eq!(hw.repetition_count, 0);
    assert_eq!(hw.attempts, 0);
    assert_eq!(hw.deadline, clock.now() + Duration::hours(48));
}
