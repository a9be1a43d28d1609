// ABOUTME: Sync supervisor actor: one task owning the session, driven by tokio::select!.
// ABOUTME: The cloneable SyncHandle sends commands and reads the published view.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;

use super::error::{ActionError, SyncError};
use super::session::{ChannelOutcome, FetchOutcome, Session};
use super::view::{SyncNotice, SyncPhase, SyncView};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::reconcile::{Applied, RequestToken};
use crate::snapshot::Snapshot;
use crate::transport::{
    Backoff, ChannelEvent, FetchError, StatusSource, SubmitError, TransportChannel,
};
use crate::types::{ActionKind, Target};

const COMMAND_BUFFER: usize = 32;
const NOTICE_BUFFER: usize = 64;

type ActionReply = oneshot::Sender<std::result::Result<(), ActionError>>;
type FetchResult = (Target, RequestToken, std::result::Result<Snapshot, FetchError>);
type SubmitResult = (Target, ActionKind, std::result::Result<(), SubmitError>);

enum Command {
    Track {
        target: Target,
        done: oneshot::Sender<()>,
    },
    Untrack {
        done: oneshot::Sender<()>,
    },
    Submit {
        kind: ActionKind,
        reply: ActionReply,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Entry point for running status sync.
pub struct SyncSupervisor;

impl SyncSupervisor {
    /// Spawn the supervisor task. Must be called inside a tokio runtime.
    /// The task stops on [`SyncHandle::shutdown`] or when every handle is
    /// dropped.
    pub fn spawn(source: Arc<dyn StatusSource>, config: Config) -> SyncHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(SyncView::default());
        let (notices, _) = broadcast::channel(NOTICE_BUFFER);

        let actor = Actor {
            source,
            config,
            view: view_tx,
            notices: notices.clone(),
            session: None,
            channel: None,
            channel_rx: None,
            fetches: JoinSet::new(),
            submissions: JoinSet::new(),
            replies: BTreeMap::new(),
        };
        tokio::spawn(actor.run(commands_rx));

        SyncHandle {
            commands: commands_tx,
            view: view_rx,
            notices,
        }
    }
}

/// Cloneable handle to a running supervisor.
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SyncView>,
    notices: broadcast::Sender<SyncNotice>,
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("stopped", &self.commands.is_closed())
            .finish()
    }
}

impl SyncHandle {
    /// Start tracking `target`. Tracking the current target again is a
    /// no-op; any other target replaces the current one entirely.
    pub async fn track(&self, target: Target) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Track { target, done }).await?;
        rx.await.map_err(|_| Error::SupervisorStopped)
    }

    /// Stop tracking and return to idle.
    pub async fn untrack(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Untrack { done }).await?;
        rx.await.map_err(|_| Error::SupervisorStopped)
    }

    /// Submit a user action for the tracked resource. Resolves once the
    /// server accepted or rejected it; confirmation follows through the view.
    pub async fn submit(&self, kind: ActionKind) -> std::result::Result<(), ActionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Submit { kind, reply })
            .await
            .map_err(|_| ActionError::Stopped)?;
        rx.await.map_err(|_| ActionError::Stopped)?
    }

    /// Current view.
    pub fn view(&self) -> SyncView {
        self.view.borrow().clone()
    }

    /// Receiver notified whenever the view changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncView> {
        self.view.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<SyncNotice> {
        self.notices.subscribe()
    }

    /// Tear everything down and stop the supervisor task.
    pub async fn shutdown(self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Shutdown { done }).await?;
        rx.await.map_err(|_| Error::SupervisorStopped)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::SupervisorStopped)
    }
}

struct Actor {
    source: Arc<dyn StatusSource>,
    config: Config,
    view: watch::Sender<SyncView>,
    notices: broadcast::Sender<SyncNotice>,
    session: Option<Session>,
    channel: Option<TransportChannel>,
    channel_rx: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
    fetches: JoinSet<FetchResult>,
    submissions: JoinSet<SubmitResult>,
    replies: BTreeMap<ActionKind, ActionReply>,
}

impl Actor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            let poll_at = self.session.as_ref().and_then(|s| s.scheduler().deadline());
            let expire_at = self.session.as_ref().and_then(Session::next_expiry);

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Shutdown { done }) => {
                        self.teardown();
                        self.publish();
                        let _ = done.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.teardown();
                        break;
                    }
                },
                event = next_channel_event(&mut self.channel_rx) => self.on_channel_event(event),
                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    self.on_fetch(joined);
                }
                Some(joined) = self.submissions.join_next(), if !self.submissions.is_empty() => {
                    self.on_submission(joined);
                }
                () = sleep_until(expire_at) => self.on_expiry(),
                () = sleep_until(poll_at) => self.on_poll_due(),
            }

            self.publish();
        }
        tracing::debug!("Sync supervisor stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Track { target, done } => {
                self.track(target);
                let _ = done.send(());
            }
            Command::Untrack { done } => {
                self.teardown();
                let _ = done.send(());
            }
            Command::Submit { kind, reply } => self.submit(kind, reply),
            Command::Shutdown { done } => {
                let _ = done.send(());
            }
        }
    }

    fn track(&mut self, target: Target) {
        if self.session.as_ref().is_some_and(|s| s.target() == &target) {
            return;
        }

        self.teardown();
        tracing::debug!("Tracking {}", target);

        let mut session = Session::new(target.clone(), &self.config);
        let token = session.bootstrap(Instant::now());
        self.session = Some(session);
        self.spawn_fetch(target.clone(), token);

        if self.config.stream.enabled {
            let backoff = Backoff::from(&self.config.stream);
            let (channel, rx) = TransportChannel::open(Arc::clone(&self.source), target, backoff);
            self.channel = Some(channel);
            self.channel_rx = Some(rx);
        }
    }

    /// Release everything scoped to the current target before returning.
    fn teardown(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close();
        }
        self.channel_rx = None;
        self.fetches.abort_all();
        self.fetches = JoinSet::new();
        self.submissions.abort_all();
        self.submissions = JoinSet::new();
        for (kind, reply) in std::mem::take(&mut self.replies) {
            let _ = reply.send(Err(ActionError::Cancelled(kind)));
        }
        if let Some(session) = self.session.take() {
            tracing::debug!("Stopped tracking {}", session.target());
        }
    }

    fn submit(&mut self, kind: ActionKind, reply: ActionReply) {
        let Some(session) = self.session.as_mut() else {
            let _ = reply.send(Err(ActionError::NotTracking));
            return;
        };
        if let Err(e) = session.begin_submit(kind) {
            let _ = reply.send(Err(e));
            return;
        }

        let target = session.target().clone();
        tracing::debug!("Submitting {} for {}", kind, target);
        let source = Arc::clone(&self.source);
        self.submissions.spawn(async move {
            let result = source.submit(&target, kind).await;
            (target, kind, result)
        });
        self.replies.insert(kind, reply);
    }

    fn spawn_fetch(&mut self, target: Target, token: RequestToken) {
        let source = Arc::clone(&self.source);
        self.fetches.spawn(async move {
            let result = source.fetch(&target).await;
            (target, token, result)
        });
    }

    fn on_fetch(&mut self, joined: std::result::Result<FetchResult, JoinError>) {
        let (target, token, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::error!("Fetch task failed: {}", e);
                }
                return;
            }
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.target() != &target {
            return;
        }

        // Report the first failure of a run, not every retry.
        let was_degraded = session.phase() == SyncPhase::Degraded;
        match session.on_fetch_result(token, result, Instant::now()) {
            FetchOutcome::Applied(applied) => self.on_applied(applied),
            FetchOutcome::Deleted => self.on_deleted(),
            FetchOutcome::Failed(e) if !was_degraded => self.notify_failure(SyncError::from(e)),
            FetchOutcome::Stale | FetchOutcome::Failed(_) | FetchOutcome::Mismatched(_) => {}
        }
    }

    fn on_submission(&mut self, joined: std::result::Result<SubmitResult, JoinError>) {
        let (target, kind, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::error!("Submission task failed: {}", e);
                }
                return;
            }
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.target() != &target {
            return;
        }

        let outcome = match session.on_submit_result(kind, result, Instant::now()) {
            Ok(Some(token)) => {
                self.spawn_fetch(target, token);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(ActionError::Rejected { kind, source }) => {
                self.notify_failure(SyncError::ActionSubmission {
                    action: kind,
                    source: source.clone(),
                });
                Err(ActionError::Rejected { kind, source })
            }
            Err(e) => Err(e),
        };

        if let Some(reply) = self.replies.remove(&kind) {
            let _ = reply.send(outcome);
        }
    }

    fn on_channel_event(&mut self, event: Option<ChannelEvent>) {
        let now = Instant::now();
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let Some(event) = event else {
            // The channel task ended; polling covers for it from here on.
            self.channel = None;
            self.channel_rx = None;
            if let Some(token) = session.on_transport_lost(now) {
                let target = session.target().clone();
                self.spawn_fetch(target, token);
            }
            return;
        };

        match session.on_channel_event(event, now) {
            ChannelOutcome::Applied(applied) => self.on_applied(applied),
            ChannelOutcome::FetchNow(token) => {
                let target = session.target().clone();
                self.spawn_fetch(target, token);
            }
            ChannelOutcome::Dropped(e) => self.notify_failure(SyncError::from(e)),
            ChannelOutcome::Deleted => self.on_deleted(),
            ChannelOutcome::Mismatched(_) | ChannelOutcome::Nothing => {}
        }
    }

    fn on_applied(&mut self, applied: Applied) {
        for action in &applied.confirmed {
            tracing::debug!("{} confirmed for {}", action.kind, action.resource_id);
        }
        for status in applied.new_drift {
            self.notify_failure(SyncError::StatusVocabularyDrift { status });
        }
    }

    fn on_deleted(&mut self) {
        let Some(target) = self.session.as_ref().map(|s| s.target().clone()) else {
            return;
        };
        tracing::warn!("{} no longer exists, stopping sync", target);
        self.teardown();
        let _ = self.notices.send(SyncNotice::ResourceDeleted { target });
    }

    fn on_expiry(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for timeout in session.expire_actions(Instant::now()) {
            self.notify_failure(SyncError::ConfirmationTimeout {
                action: timeout.action.kind,
                waited: timeout.waited,
            });
        }
    }

    fn on_poll_due(&mut self) {
        let in_flight = self.fetches.len();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(token) = session.on_poll_due(Instant::now(), in_flight) {
            let target = session.target().clone();
            self.spawn_fetch(target, token);
        }
    }

    fn notify_failure(&self, error: SyncError) {
        let Some(target) = self.session.as_ref().map(|s| s.target().clone()) else {
            return;
        };
        // No subscribers is fine.
        let _ = self.notices.send(SyncNotice::Failure { target, error });
    }

    fn publish(&self) {
        let view = self.session.as_ref().map(Session::view).unwrap_or_default();
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

async fn next_channel_event(
    rx: &mut Option<mpsc::UnboundedReceiver<ChannelEvent>>,
) -> Option<ChannelEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn sleep_until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
