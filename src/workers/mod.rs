pub mod homework_deadline;
pub mod schedule_reminder;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::clock::Clock;
use crate::config::Config;
use crate::services::push::WebPushProvider;
use crate::store::Store;

/// Timeout for individual worker invocations (5 minutes).
const WORKER_TIMEOUT: Duration = Duration::from_secs(300);

/// Drain period before scheduler shutdown to let in-flight tasks complete.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    ScheduleReminder,
    HomeworkDeadline,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScheduleReminder => "schedule_reminder",
            Self::HomeworkDeadline => "homework_deadline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    pub cron: &'static str,
    pub enabled: bool,
}

pub struct WorkerManager {
    store: Arc<Store>,
    push: Arc<WebPushProvider>,
    clock: Arc<dyn Clock>,
    shutdown_rx: broadcast::Receiver<()>,
    is_leader: bool,
    enable_reminders: bool,
    enable_deadline_sweep: bool,
    default_timezone: String,
}

impl WorkerManager {
    pub fn new(
        store: Arc<Store>,
        push: Arc<WebPushProvider>,
        clock: Arc<dyn Clock>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            push,
            clock,
            shutdown_rx,
            is_leader: config.worker.is_leader,
            enable_reminders: config.worker.enable_reminders,
            enable_deadline_sweep: config.worker.enable_deadline_sweep,
            default_timezone: config.default_timezone.clone(),
        }
    }

    /// Single source of truth for all planned jobs and their cron schedules.
    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        if !self.is_leader {
            return Vec::new();
        }

        vec![
            JobSpec {
                name: WorkerName::ScheduleReminder,
                cron: "0 */5 * * * *",
                enabled: self.enable_reminders,
            },
            JobSpec {
                name: WorkerName::HomeworkDeadline,
                cron: "0 */15 * * * *",
                enabled: self.enable_deadline_sweep,
            },
        ]
    }

    /// Start the worker scheduler and block until shutdown is signalled.
    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.is_leader {
            tracing::info!("Worker leader disabled; skipping worker startup");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;
        self.register_jobs(&scheduler).await;
        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            "Worker manager shutting down, draining for {}s",
            DRAIN_TIMEOUT.as_secs()
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler) {
        for spec in self.planned_jobs() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let store = self.store.clone();
            let name_str = spec.name.as_str();

            match spec.name {
                WorkerName::ScheduleReminder => {
                    let push = self.push.clone();
                    let clock = self.clock.clone();
                    let timezone = self.default_timezone.clone();
                    add_job(scheduler, spec.cron, name_str, move || {
                        let store = store.clone();
                        let push = push.clone();
                        let clock = clock.clone();
                        let timezone = timezone.clone();
                        async move {
                            schedule_reminder::run(&store, push.as_ref(), clock.as_ref(), &timezone)
                                .await;
                        }
                    })
                    .await;
                }
                WorkerName::HomeworkDeadline => {
                    let clock = self.clock.clone();
                    add_job(scheduler, spec.cron, name_str, move || {
                        let store = store.clone();
                        let clock = clock.clone();
                        async move {
                            homework_deadline::run(&store, clock.as_ref()).await;
                        }
                    })
                    .await;
                }
            }
            tracing::info!(name = name_str, cron = spec.cron, "Registered worker");
        }
    }
}

/// Add a job to the scheduler with an overlap guard and timeout wrapper.
async fn add_job<Fut, F>(scheduler: &JobScheduler, cron: &str, name: &'static str, mut run: F)
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let guard = running.clone();

        if guard
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(
                worker = name,
                "Skipping worker invocation: previous run still in progress"
            );
            return Box::pin(async {});
        }

        let fut = run();
        Box::pin(async move {
            match tokio::time::timeout(WORKER_TIMEOUT, fut).await {
                Ok(()) => {}
                Err(_) => {
                    tracing::error!(
                        worker = name,
                        timeout_secs = WORKER_TIMEOUT.as_secs(),
                        "Worker timed out"
                    );
                }
            }
            guard.store(false, Ordering::SeqCst);
        })
    });

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error=%err, cron, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => tracing::error!(error=%err, cron, worker = name, "Failed to create worker job"),
    }
}
