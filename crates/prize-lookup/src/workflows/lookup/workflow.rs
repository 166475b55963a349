use super::gateway::LookupGateway;
use super::identifier::{validate, Identifier};
use super::profile::LookupResult;
use super::state::{RejectionReason, WorkflowEvent, WorkflowState, STATUS_MESSAGES};
use crate::config::LookupConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 16;

/// Events beyond this are dropped for subscribers that fall behind.
const EVENT_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub status_interval: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            status_interval: LookupConfig::DEFAULT_STATUS_INTERVAL,
        }
    }
}

impl From<&LookupConfig> for WorkflowSettings {
    fn from(config: &LookupConfig) -> Self {
        Self {
            status_interval: config.status_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("lookup workflow is no longer running")]
    Closed,
    #[error("another lookup is already in flight")]
    Busy,
    #[error("lookup was cancelled before it settled")]
    Cancelled,
}

type Reply = oneshot::Sender<Result<WorkflowState, WorkflowError>>;

#[derive(Debug)]
enum WorkflowCommand {
    Submit {
        raw: String,
        reply: Option<Reply>,
    },
    Dismiss,
    Cancel,
}

enum CallOutcome {
    Completed(LookupResult),
    Failed,
    Cancelled,
}

/// One lookup session. A single task owns the state and applies commands in arrival
/// order, so a submission can never interleave with the run already in flight.
pub struct LookupWorkflow<G> {
    gateway: Arc<G>,
    settings: WorkflowSettings,
    state: watch::Sender<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
    commands: mpsc::Receiver<WorkflowCommand>,
}

impl<G: LookupGateway> LookupWorkflow<G> {
    /// Starts the session task on the current runtime. The task ends once every handle is dropped.
    pub fn spawn(gateway: Arc<G>, settings: WorkflowSettings) -> WorkflowHandle {
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (state, state_rx) = watch::channel(WorkflowState::Idle);
        let (events, events_rx) = broadcast::channel(EVENT_BUFFER_SIZE);

        let workflow = Self {
            gateway,
            settings,
            state,
            events,
            commands,
        };
        tokio::spawn(workflow.run());

        WorkflowHandle {
            commands: command_tx,
            state: state_rx,
            events: events_rx,
        }
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                WorkflowCommand::Submit { raw, reply } => self.submit(raw, reply).await,
                WorkflowCommand::Dismiss => self.dismiss(),
                WorkflowCommand::Cancel => debug!("cancel ignored: nothing in flight"),
            }
        }
        debug!("lookup workflow stopped");
    }

    async fn submit(&mut self, raw: String, reply: Option<Reply>) {
        let accepts = self.state.borrow().accepts_submission();
        if !accepts {
            self.ignore_submission(reply);
            return;
        }

        let settled = self.run_lookup(raw).await;
        if let Some(reply) = reply {
            // The caller may have stopped waiting.
            let _ = reply.send(settled);
        }
    }

    async fn run_lookup(&mut self, raw: String) -> Result<WorkflowState, WorkflowError> {
        self.transition(WorkflowState::AwaitingValidation);
        self.transition(WorkflowState::Validating);
        let identifier = match validate(&raw) {
            Ok(identifier) => identifier,
            Err(reason) => {
                debug!(?reason, "identifier rejected");
                return Ok(self.settle(WorkflowState::Rejected(reason.into())));
            }
        };

        self.transition(WorkflowState::Simulating { identifier });
        let rotation = StatusRotation::start(self.events.clone(), self.settings.status_interval);
        let outcome = self.call_gateway(identifier).await;
        rotation.stop().await;

        match outcome {
            CallOutcome::Completed(result) => {
                track_result(&result);
                Ok(self.settle(WorkflowState::Resolved(result)))
            }
            CallOutcome::Failed => Ok(self.settle(WorkflowState::Rejected(
                RejectionReason::TransientFailure,
            ))),
            CallOutcome::Cancelled => {
                self.transition(WorkflowState::Idle);
                Err(WorkflowError::Cancelled)
            }
        }
    }

    // Runs the gateway in its own task so a panic surfaces as a join error instead of
    // taking the session down with it.
    async fn call_gateway(&mut self, identifier: Identifier) -> CallOutcome {
        let gateway = Arc::clone(&self.gateway);
        let mut call = tokio::spawn(async move { gateway.consult(identifier).await });

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(WorkflowCommand::Submit { reply, .. }) => self.ignore_submission(reply),
                    Some(WorkflowCommand::Dismiss) => debug!("dismiss ignored while simulating"),
                    Some(WorkflowCommand::Cancel) | None => {
                        call.abort();
                        debug!("in-flight lookup cancelled");
                        return CallOutcome::Cancelled;
                    }
                },
                joined = &mut call => {
                    return match joined {
                        Ok(Ok(result)) => CallOutcome::Completed(result),
                        Ok(Err(err)) => {
                            warn!(error = %err, "lookup backend failed");
                            CallOutcome::Failed
                        }
                        Err(err) => {
                            error!(error = %err, "lookup task aborted unexpectedly");
                            CallOutcome::Failed
                        }
                    };
                }
            }
        }
    }

    fn dismiss(&self) {
        let terminal = self.state.borrow().is_terminal();
        if terminal {
            self.transition(WorkflowState::Idle);
        } else {
            debug!("dismiss ignored: no result to clear");
        }
    }

    fn ignore_submission(&self, reply: Option<Reply>) {
        let current = self.state.borrow().label();
        warn!(state = current, "submission ignored while a lookup is in flight");
        let _ = self
            .events
            .send(WorkflowEvent::SubmissionIgnored { state: current });
        if let Some(reply) = reply {
            let _ = reply.send(Err(WorkflowError::Busy));
        }
    }

    fn settle(&self, state: WorkflowState) -> WorkflowState {
        self.transition(state.clone());
        state
    }

    fn transition(&self, next: WorkflowState) {
        let previous = self.state.borrow().label();
        debug!(from = previous, to = next.label(), "lookup transition");
        self.state.send_replace(next.clone());
        // No subscribers is fine; the watch snapshot still holds the state.
        let _ = self.events.send(WorkflowEvent::StateChanged { state: next });
    }
}

fn track_result(result: &LookupResult) {
    match &result.prize {
        Some(prize) => info!(
            event = "prize_found",
            cpf = %result.profile.formatted_identifier,
            prize_value = %prize.amount.formatted(),
            "lookup resolved"
        ),
        None => info!(
            event = "no_prize_found",
            cpf = %result.profile.formatted_identifier,
            "lookup resolved"
        ),
    }
}

/// Periodic loading-copy rotation tied to one `Simulating` phase.
struct StatusRotation {
    task: Option<JoinHandle<()>>,
}

impl StatusRotation {
    fn start(events: broadcast::Sender<WorkflowEvent>, period: Duration) -> Self {
        let _ = events.send(WorkflowEvent::StatusMessage {
            message: STATUS_MESSAGES[0].to_string(),
        });

        // interval panics on a zero period.
        let period = period.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            for message in STATUS_MESSAGES.iter().cycle().skip(1) {
                ticks.tick().await;
                let _ = events.send(WorkflowEvent::StatusMessage {
                    message: (*message).to_string(),
                });
            }
        });

        Self { task: Some(task) }
    }

    /// Aborts and joins the task so no message can trail the exit transition.
    async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for StatusRotation {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Host-side controls for one session. Clones share the session.
pub struct WorkflowHandle {
    commands: mpsc::Sender<WorkflowCommand>,
    state: watch::Receiver<WorkflowState>,
    events: broadcast::Receiver<WorkflowEvent>,
}

impl Clone for WorkflowHandle {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            state: self.state.clone(),
            events: self.events.resubscribe(),
        }
    }
}

impl WorkflowHandle {
    pub async fn submit(&self, raw: impl Into<String>) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Submit {
            raw: raw.into(),
            reply: None,
        })
        .await
    }

    pub async fn dismiss(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Dismiss).await
    }

    /// Aborts an in-flight lookup and returns the session to `Idle`.
    pub async fn cancel(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Cancel).await
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.resubscribe()
    }

    /// Waits until the session reaches `Resolved` or `Rejected`. Returns immediately when it
    /// already sits in one.
    pub async fn wait_until_settled(&self) -> Result<WorkflowState, WorkflowError> {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(WorkflowState::is_terminal)
            .await
            .map_err(|_| WorkflowError::Closed)?;
        Ok(settled.clone())
    }

    /// Submits and waits for the state this submission settles in. Fails with `Busy` when
    /// another run on the session is in flight and with `Cancelled` when the run is
    /// cancelled before it settles.
    pub async fn lookup(&self, raw: impl Into<String>) -> Result<WorkflowState, WorkflowError> {
        let (reply, settled) = oneshot::channel();
        self.send(WorkflowCommand::Submit {
            raw: raw.into(),
            reply: Some(reply),
        })
        .await?;

        settled.await.map_err(|_| WorkflowError::Closed)?
    }

    async fn send(&self, command: WorkflowCommand) -> Result<(), WorkflowError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| WorkflowError::Closed)
    }
}
