use super::context::JobContext;
use super::job::{BackgroundJob, HookEvent, JobError, JobSchedule};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Manages background job scheduling and execution.
///
/// Schedule state is in-memory: interval jobs run once at registration time
/// and then every interval. A hook or interval trigger that fires while the
/// same job is still running is dropped, not queued.
pub struct JobScheduler {
    jobs: HashMap<String, Arc<dyn BackgroundJob>>,

    /// Jobs currently executing, shared with their spawned tasks.
    running_jobs: Arc<RwLock<HashSet<String>>>,

    /// Next scheduled run per interval job.
    next_runs: HashMap<String, Instant>,

    /// Task handles for running jobs (managed by the scheduler loop).
    running_handles: HashMap<String, JoinHandle<()>>,

    /// Cancellation tokens for each running job.
    job_cancel_tokens: HashMap<String, CancellationToken>,

    /// Receiver for hook events from the rest of the application.
    hook_receiver: mpsc::Receiver<HookEvent>,

    /// Token to signal scheduler shutdown.
    shutdown_token: CancellationToken,

    /// Shared context provided to jobs during execution.
    job_context: JobContext,
}

impl JobScheduler {
    pub fn new(
        hook_receiver: mpsc::Receiver<HookEvent>,
        shutdown_token: CancellationToken,
        job_context: JobContext,
    ) -> Self {
        Self {
            jobs: HashMap::new(),
            running_jobs: Arc::new(RwLock::new(HashSet::new())),
            next_runs: HashMap::new(),
            running_handles: HashMap::new(),
            job_cancel_tokens: HashMap::new(),
            hook_receiver,
            shutdown_token,
            job_context,
        }
    }

    /// Register a job with the scheduler.
    pub fn register_job(&mut self, job: Arc<dyn BackgroundJob>) {
        let job_id = job.id().to_string();
        info!("Registering job: {} - {}", job_id, job.description());
        self.jobs.insert(job_id, job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Main scheduler loop. Runs until the shutdown token fires.
    pub async fn run(&mut self) {
        info!("Starting job scheduler with {} registered jobs", self.jobs.len());

        self.trigger_jobs_for_hook(HookEvent::OnStartup).await;

        loop {
            self.cleanup_completed_jobs().await;

            let sleep_duration = self.time_until_next_scheduled_job().await;
            debug!("Scheduler sleeping for {:?} until next scheduled job", sleep_duration);

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.run_due_jobs().await;
                }
                Some(event) = self.hook_receiver.recv() => {
                    debug!("Received hook event: {}", event);
                    self.trigger_jobs_for_hook(event).await;
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler received shutdown signal");
                    self.shutdown().await;
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
    }

    fn job_interval(schedule: &JobSchedule) -> Option<Duration> {
        match schedule {
            JobSchedule::Interval(interval) => Some(*interval),
            JobSchedule::Combined { interval, .. } => *interval,
            JobSchedule::Hook(_) => None,
        }
    }

    /// Time until the next interval job is due, capped at a default check
    /// interval so hook-only registrations still get loop iterations.
    async fn time_until_next_scheduled_job(&self) -> Duration {
        let mut min_duration = Duration::from_secs(60);

        let running = self.running_jobs.read().await;
        for (job_id, job) in &self.jobs {
            if running.contains(job_id) {
                continue;
            }
            if Self::job_interval(&job.schedule()).is_none() {
                continue;
            }

            match self.next_runs.get(job_id) {
                Some(next_run) => {
                    let until = next_run.saturating_duration_since(Instant::now());
                    if until.is_zero() {
                        return Duration::ZERO;
                    }
                    if until < min_duration {
                        min_duration = until;
                    }
                }
                // Never ran: due now
                None => return Duration::ZERO,
            }
        }

        min_duration
    }

    /// Run all interval jobs that are due.
    async fn run_due_jobs(&mut self) {
        let now = Instant::now();
        let mut jobs_to_run = Vec::new();

        {
            let running = self.running_jobs.read().await;
            for (job_id, job) in &self.jobs {
                if running.contains(job_id) {
                    continue;
                }
                if Self::job_interval(&job.schedule()).is_none() {
                    continue;
                }
                let due = match self.next_runs.get(job_id) {
                    Some(next_run) => *next_run <= now,
                    None => true,
                };
                if due {
                    jobs_to_run.push(job_id.clone());
                }
            }
        }

        for job_id in jobs_to_run {
            self.spawn_job(&job_id, "schedule").await;
        }
    }

    /// Trigger all jobs that listen for a specific hook event.
    async fn trigger_jobs_for_hook(&mut self, event: HookEvent) {
        let mut jobs_to_trigger = Vec::new();

        {
            let running = self.running_jobs.read().await;
            for (job_id, job) in &self.jobs {
                if running.contains(job_id) {
                    debug!("Skipping hook trigger for already running job: {}", job_id);
                    continue;
                }

                let should_trigger = match job.schedule() {
                    JobSchedule::Hook(hook_event) => hook_event == event,
                    JobSchedule::Combined { ref hooks, .. } => hooks.contains(&event),
                    _ => false,
                };

                if should_trigger {
                    jobs_to_trigger.push(job_id.clone());
                }
            }
        }

        for job_id in jobs_to_trigger {
            let trigger = format!("hook:{}", event);
            self.spawn_job(&job_id, &trigger).await;
        }
    }

    /// Spawn a job execution task.
    async fn spawn_job(&mut self, job_id: &str, triggered_by: &str) {
        let job = match self.jobs.get(job_id) {
            Some(job) => Arc::clone(job),
            None => {
                error!("Attempted to spawn unknown job: {}", job_id);
                return;
            }
        };

        info!("Starting job: {} (triggered_by: {})", job_id, triggered_by);
        self.running_jobs.write().await.insert(job_id.to_string());

        // Push the next run past the interval up front, so a slow job does
        // not come up due again the moment it finishes.
        if let Some(interval) = Self::job_interval(&job.schedule()) {
            self.next_runs
                .insert(job_id.to_string(), Instant::now() + interval);
        }

        let cancel_token = self.job_context.cancellation_token.child_token();
        self.job_cancel_tokens
            .insert(job_id.to_string(), cancel_token.clone());

        let ctx = JobContext::new(
            cancel_token,
            Arc::clone(&self.job_context.catalog_store),
            Arc::clone(&self.job_context.remote),
        );

        let job_id_owned = job_id.to_string();
        let running_jobs = Arc::clone(&self.running_jobs);

        let handle = tokio::spawn(async move {
            let start_time = Instant::now();
            let result = job.execute(&ctx).await;
            let elapsed = start_time.elapsed();

            match result {
                Ok(()) => {
                    info!("Job {} completed successfully in {:?}", job_id_owned, elapsed)
                }
                Err(JobError::Cancelled) => {
                    info!("Job {} was cancelled after {:?}", job_id_owned, elapsed)
                }
                Err(err) => {
                    error!("Job {} failed after {:?}: {}", job_id_owned, elapsed, err)
                }
            }

            running_jobs.write().await.remove(&job_id_owned);
        });

        self.running_handles.insert(job_id.to_string(), handle);
    }

    /// Reap handles and reschedule completed interval jobs.
    async fn cleanup_completed_jobs(&mut self) {
        let completed: Vec<String> = self
            .running_handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(job_id, _)| job_id.clone())
            .collect();

        for job_id in completed {
            if let Some(handle) = self.running_handles.remove(&job_id) {
                if let Err(err) = handle.await {
                    error!("Job task {} panicked: {}", job_id, err);
                    self.running_jobs.write().await.remove(&job_id);
                }
            }
            self.job_cancel_tokens.remove(&job_id);

            if let Some(job) = self.jobs.get(&job_id) {
                if let Some(interval) = Self::job_interval(&job.schedule()) {
                    self.next_runs
                        .insert(job_id.clone(), Instant::now() + interval);
                }
            }
        }
    }

    /// Cancel running jobs and wait for them to finish.
    async fn shutdown(&mut self) {
        info!("Shutting down scheduler...");

        for (job_id, token) in &self.job_cancel_tokens {
            debug!("Cancelling job: {}", job_id);
            token.cancel();
        }

        for (job_id, handle) in self.running_handles.drain() {
            if tokio::time::timeout(Duration::from_secs(30), handle)
                .await
                .is_err()
            {
                warn!("Job {} did not stop within the shutdown timeout", job_id);
            }
        }

        self.job_cancel_tokens.clear();
        info!("Scheduler shutdown complete");
    }
}
