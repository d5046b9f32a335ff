//! Push-reminder dispatch for declared weekly blocks.
//!
//! Runs every five minutes. For each user, "now" and "now + 5 minutes" are
//! reduced to local time parts; a block matching the former fires a "now"
//! reminder, the latter a "pre" reminder. A block occurrence+phase is
//! dispatched at most once: the marker is claimed atomically before any
//! delivery, so duplicate timer fires and concurrent runs converge on one
//! send. Delivery failures never fail the run; 404/410 endpoints are
//! deleted.

use chrono::Duration;
use futures::future::join_all;
use serde::Serialize;

use crate::clock::Clock;
use crate::constants::REMINDER_LOOKAHEAD_MINUTES;
use crate::schedule::blocks::{parse_weekly_blocks, ActivityType, WeeklyBlock};
use crate::schedule::timezone::{time_parts, utc_offset_for};
use crate::services::push::{PushError, PushTransport};
use crate::store::keys;
use crate::store::operations::dispatch::{NotificationDispatch, ReminderPhase};
use crate::store::operations::subscriptions::PushSubscription;
use crate::store::operations::users::UserProfile;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderPayload {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Distinct copy per phase, in the learner's language.
pub fn reminder_payload(block_type: ActivityType, phase: ReminderPhase) -> ReminderPayload {
    let label = match block_type {
        ActivityType::Chat => "chat",
        ActivityType::Lesson => "lição",
    };
    let url = match block_type {
        ActivityType::Chat => "/chat",
        ActivityType::Lesson => "/lessons",
    };

    match phase {
        ReminderPhase::Pre => ReminderPayload {
            title: "Lembrete de estudo".to_string(),
            body: format!("Daqui a 5 minutos: seu bloco de {label} começa"),
            url: url.to_string(),
        },
        ReminderPhase::Now => ReminderPayload {
            title: "Hora de estudar!".to_string(),
            body: format!("Hora de estudar! Seu bloco de {label} começa agora."),
            url: url.to_string(),
        },
    }
}

struct DueReminder {
    phase: ReminderPhase,
    block: WeeklyBlock,
    iso_date: String,
}

pub async fn run<P: PushTransport>(
    store: &Store,
    push: &P,
    clock: &dyn Clock,
    default_timezone: &str,
) {
    tracing::info!("Schedule reminder worker running");

    let profiles = match store.list_user_profiles() {
        Ok(profiles) => profiles,
        Err(error) => {
            tracing::warn!(error = %error, "Reminder dispatch: failed to list users");
            return;
        }
    };

    let now = clock.now();
    let soon_instant = now + Duration::minutes(REMINDER_LOOKAHEAD_MINUTES);
    let mut dispatched = 0u32;
    let mut skipped = 0u32;

    for profile in &profiles {
        match process_user(store, push, profile, now, soon_instant, default_timezone).await {
            Ok((sent, deduped)) => {
                dispatched += sent;
                skipped += deduped;
            }
            Err(error) => {
                // Best-effort per user: one failing profile never blocks the rest.
                tracing::warn!(
                    user_id = %profile.id,
                    error = %error,
                    "Reminder dispatch failed for user"
                );
            }
        }
    }

    tracing::info!(dispatched, skipped, "Schedule reminder worker finished");
}

async fn process_user<P: PushTransport>(
    store: &Store,
    push: &P,
    profile: &UserProfile,
    now: chrono::DateTime<chrono::Utc>,
    soon_instant: chrono::DateTime<chrono::Utc>,
    default_timezone: &str,
) -> Result<(u32, u32), crate::store::StoreError> {
    let blocks = parse_weekly_blocks(&profile.weekly_blocks).blocks;
    if blocks.is_empty() {
        return Ok((0, 0));
    }

    let zone = profile
        .timezone
        .as_deref()
        .filter(|tz| !tz.is_empty())
        .unwrap_or(default_timezone);
    let offset = utc_offset_for(zone);
    let current = time_parts(now, offset);
    let soon = time_parts(soon_instant, offset);

    let mut due = Vec::new();
    for block in &blocks {
        if block.day == current.day && block.time == current.time {
            due.push(DueReminder {
                phase: ReminderPhase::Now,
                block: block.clone(),
                iso_date: current.iso_date.clone(),
            });
        }
        if block.day == soon.day && block.time == soon.time {
            due.push(DueReminder {
                phase: ReminderPhase::Pre,
                block: block.clone(),
                iso_date: soon.iso_date.clone(),
            });
        }
    }
    if due.is_empty() {
        return Ok((0, 0));
    }

    let subscriptions = store.list_push_subscriptions(&profile.id)?;
    if subscriptions.is_empty() {
        return Ok((0, 0));
    }

    let mut sent = 0u32;
    let mut deduped = 0u32;
    for event in due {
        let dispatch_id = keys::dispatch_id(
            &event.iso_date,
            &event.block.time,
            event.phase.as_str(),
        );
        let marker = NotificationDispatch {
            scheduled_date: event.iso_date.clone(),
            scheduled_time: event.block.time.clone(),
            phase: event.phase,
            block_type: event.block.block_type,
            created_at: now,
        };

        // Claim before sending: losing the claim means another run (or a
        // duplicate timer fire) already owns this occurrence+phase.
        if !store.try_claim_dispatch(&profile.id, &dispatch_id, &marker)? {
            deduped += 1;
            continue;
        }

        let payload = reminder_payload(event.block.block_type, event.phase);
        let payload_json = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(error = %error, "Failed to serialize reminder payload");
                continue;
            }
        };

        send_to_subscriptions(store, push, &profile.id, &subscriptions, &payload_json).await;
        sent += 1;
    }

    Ok((sent, deduped))
}

/// Fan out to every endpoint concurrently; endpoints are independent and no
/// ordering is guaranteed between them.
async fn send_to_subscriptions<P: PushTransport>(
    store: &Store,
    push: &P,
    user_id: &str,
    subscriptions: &[PushSubscription],
    payload_json: &str,
) {
    let sends = subscriptions.iter().map(|subscription| async move {
        match push.send(subscription, payload_json).await {
            Ok(()) => {}
            Err(PushError::Gone { status }) => {
                tracing::info!(
                    user_id,
                    endpoint = %subscription.endpoint,
                    status,
                    "Removing gone push endpoint"
                );
                if let Err(error) =
                    store.delete_push_subscriptions_by_endpoint(user_id, &subscription.endpoint)
                {
                    tracing::warn!(error = %error, "Failed to delete stale subscription");
                }
            }
            Err(error) => {
                tracing::warn!(user_id, error = %error, "Push send failed");
            }
        }
    });
    join_all(sends).await;
}
