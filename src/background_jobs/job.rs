use super::context::JobContext;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job was cancelled")]
    Cancelled,
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),
}

/// Events that can trigger hook-scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    OnStartup,
    /// An item was just added to the backlog and has no metadata yet.
    OnItemAdded,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookEvent::OnStartup => write!(f, "OnStartup"),
            HookEvent::OnItemAdded => write!(f, "OnItemAdded"),
        }
    }
}

/// When a job runs.
#[derive(Debug, Clone)]
pub enum JobSchedule {
    /// Run repeatedly with a fixed pause between completions.
    Interval(Duration),
    /// Run only when a hook event fires.
    Hook(HookEvent),
    /// Interval plus hook triggers.
    Combined {
        interval: Option<Duration>,
        hooks: Vec<HookEvent>,
    },
}

/// A unit of background work managed by the scheduler.
#[async_trait]
pub trait BackgroundJob: Send + Sync {
    /// Stable identifier, used for scheduling state and logs.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn schedule(&self) -> JobSchedule;

    /// Execute the job. Must observe `ctx.cancellation_token` and return
    /// promptly once it fires.
    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError>;
}
