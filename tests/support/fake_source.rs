// ABOUTME: Scriptable in-memory StatusSource for driving the supervisor in tests.
// ABOUTME: Serves per-resource snapshots, scripted delayed fetches, and test-fed event streams.

use async_trait::async_trait;
use kahu::snapshot::Snapshot;
use kahu::transport::{
    EventStream, FetchError, StatusSource, StreamEvent, SubmitError, TransportError,
};
use kahu::types::{ActionKind, Target};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub type StreamSender = mpsc::UnboundedSender<Result<StreamEvent, TransportError>>;

/// One scripted fetch response, consumed in call order.
pub struct ScriptedFetch {
    pub delay: Duration,
    pub result: Result<Snapshot, FetchError>,
}

#[derive(Default)]
struct Inner {
    snapshots: HashMap<String, Snapshot>,
    scripted: VecDeque<ScriptedFetch>,
    failure: Option<FetchError>,
    streams: VecDeque<mpsc::UnboundedReceiver<Result<StreamEvent, TransportError>>>,
    submit_result: Option<SubmitError>,
    submit_delay: Duration,
    after_submit: Option<Snapshot>,
    fetched: Vec<Target>,
    submitted: Vec<(Target, ActionKind)>,
    stream_attempts: usize,
}

#[derive(Clone, Default)]
pub struct FakeSource {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `snapshot` for its resource until replaced.
    pub fn serve(&self, snapshot: Snapshot) {
        let id = snapshot.resource.id.to_string();
        self.inner.lock().snapshots.insert(id, snapshot);
    }

    /// Queue a one-off response for the next unscripted fetch.
    pub fn script(&self, delay: Duration, result: Result<Snapshot, FetchError>) {
        self.inner
            .lock()
            .scripted
            .push_back(ScriptedFetch { delay, result });
    }

    /// Fail every fetch with `error` until [`heal`](Self::heal).
    pub fn fail_fetches(&self, error: FetchError) {
        self.inner.lock().failure = Some(error);
    }

    pub fn heal(&self) {
        self.inner.lock().failure = None;
    }

    /// Make the next stream connection succeed, fed by the returned sender.
    /// Dropping the sender ends the stream.
    pub fn open_stream(&self) -> StreamSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().streams.push_back(rx);
        tx
    }

    pub fn reject_submissions(&self, error: SubmitError) {
        self.inner.lock().submit_result = Some(error);
    }

    /// Hold every submission reply back by `delay`.
    pub fn delay_submissions(&self, delay: Duration) {
        self.inner.lock().submit_delay = delay;
    }

    /// Serve `snapshot` once the next submission is accepted.
    pub fn on_submit_serve(&self, snapshot: Snapshot) {
        self.inner.lock().after_submit = Some(snapshot);
    }

    pub fn fetched(&self) -> Vec<Target> {
        self.inner.lock().fetched.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.lock().fetched.len()
    }

    pub fn submitted(&self) -> Vec<(Target, ActionKind)> {
        self.inner.lock().submitted.clone()
    }

    pub fn stream_attempts(&self) -> usize {
        self.inner.lock().stream_attempts
    }
}

#[async_trait]
impl StatusSource for FakeSource {
    async fn fetch(&self, target: &Target) -> Result<Snapshot, FetchError> {
        let (delay, result) = {
            let mut inner = self.inner.lock();
            inner.fetched.push(target.clone());
            if let Some(scripted) = inner.scripted.pop_front() {
                (scripted.delay, scripted.result)
            } else if let Some(error) = inner.failure.clone() {
                (Duration::ZERO, Err(error))
            } else {
                let result = inner
                    .snapshots
                    .get(target.id.as_str())
                    .cloned()
                    .ok_or(FetchError::NotFound);
                (Duration::ZERO, result)
            }
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn stream(&self, _target: &Target) -> Result<EventStream, TransportError> {
        let rx = {
            let mut inner = self.inner.lock();
            inner.stream_attempts += 1;
            inner.streams.pop_front()
        };
        let Some(rx) = rx else {
            return Err(TransportError::Connect("connection refused".to_string()));
        };

        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(events))
    }

    async fn submit(&self, target: &Target, kind: ActionKind) -> Result<(), SubmitError> {
        let (delay, result) = {
            let mut inner = self.inner.lock();
            inner.submitted.push((target.clone(), kind));
            let result = match inner.submit_result.clone() {
                Some(error) => Err(error),
                None => {
                    if let Some(snapshot) = inner.after_submit.take() {
                        let id = snapshot.resource.id.to_string();
                        inner.snapshots.insert(id, snapshot);
                    }
                    Ok(())
                }
            };
            (inner.submit_delay, result)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}
