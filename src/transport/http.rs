// ABOUTME: hyper-based StatusSource speaking JSON over HTTP/1.1.
// ABOUTME: Implements the status fetch, event-stream subscription, and action endpoints.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::collections::VecDeque;
use std::time::Duration;

use super::error::{FetchError, SubmitError, TransportError};
use super::source::{EventStream, StatusSource};
use super::sse::{SseDecoder, StreamEvent, interpret};
use crate::config::Config;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::types::{ActionKind, Target};

/// Longest response body excerpt kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Status server client over plain HTTP.
#[derive(Clone)]
pub struct HttpSource {
    client: Client<HttpConnector, Full<Bytes>>,
    endpoint: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            request_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.endpoint()?, config.request_timeout))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `{endpoint}/{resource}/{id}`
    pub fn resource_url(&self, target: &Target) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            target.kind,
            urlencoding::encode(target.id.as_str())
        )
    }

    pub fn status_url(&self, target: &Target) -> String {
        format!(
            "{}/status?environment={}",
            self.resource_url(target),
            urlencoding::encode(target.environment.as_str())
        )
    }

    pub fn stream_url(&self, target: &Target) -> String {
        format!(
            "{}/status/stream?environment={}",
            self.resource_url(target),
            urlencoding::encode(target.environment.as_str())
        )
    }

    pub fn action_url(&self, target: &Target, kind: ActionKind) -> String {
        format!("{}/{}", self.resource_url(target), kind.endpoint_path())
    }

    async fn send(
        &self,
        request: Request<Full<Bytes>>,
    ) -> std::result::Result<Response<Incoming>, RequestFailure> {
        match tokio::time::timeout(self.request_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(RequestFailure::Client(e.to_string())),
            Err(_) => Err(RequestFailure::Timeout(self.request_timeout)),
        }
    }
}

enum RequestFailure {
    Client(String),
    Timeout(Duration),
}

impl From<RequestFailure> for FetchError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Client(msg) => FetchError::Request(msg),
            RequestFailure::Timeout(d) => FetchError::Timeout(d),
        }
    }
}

impl From<RequestFailure> for SubmitError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Client(msg) => SubmitError::Request(msg),
            RequestFailure::Timeout(d) => SubmitError::Timeout(d),
        }
    }
}

impl From<RequestFailure> for TransportError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Client(msg) => TransportError::Connect(msg),
            RequestFailure::Timeout(d) => TransportError::Connect(format!("timed out after {d:?}")),
        }
    }
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut excerpt: String = text.chars().take(ERROR_BODY_LIMIT).collect();
    if text.chars().count() > ERROR_BODY_LIMIT {
        excerpt.push('…');
    }
    excerpt
}

fn empty_request(
    method: Method,
    url: &str,
    accept: &str,
) -> std::result::Result<Request<Full<Bytes>>, String> {
    Request::builder()
        .method(method)
        .uri(url)
        .header(ACCEPT, accept)
        .body(Full::new(Bytes::new()))
        .map_err(|e| format!("invalid request for {url}: {e}"))
}

#[async_trait]
impl StatusSource for HttpSource {
    async fn fetch(&self, target: &Target) -> std::result::Result<Snapshot, FetchError> {
        let url = self.status_url(target);
        let request =
            empty_request(Method::GET, &url, "application/json").map_err(FetchError::Request)?;

        tracing::debug!("GET {}", url);
        let response = self.send(request).await?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?
            .to_bytes();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn stream(&self, target: &Target) -> std::result::Result<EventStream, TransportError> {
        let url = self.stream_url(target);
        let mut request =
            empty_request(Method::GET, &url, "text/event-stream").map_err(TransportError::Connect)?;
        request
            .headers_mut()
            .insert(CACHE_CONTROL, hyper::header::HeaderValue::from_static("no-cache"));

        tracing::debug!("Opening event stream {}", url);
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected(status.as_u16()));
        }

        Ok(event_stream(response.into_body()))
    }

    async fn submit(
        &self,
        target: &Target,
        kind: ActionKind,
    ) -> std::result::Result<(), SubmitError> {
        let url = self.action_url(target, kind);
        let payload = serde_json::json!({ "environment": target.environment.as_str() });
        let request = Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(payload.to_string())))
            .map_err(|e| SubmitError::Request(format!("invalid request for {url}: {e}")))?;

        tracing::debug!("POST {}", url);
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .unwrap_or_default();
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            body: body_excerpt(&body),
        })
    }
}

struct StreamState {
    body: Incoming,
    decoder: SseDecoder,
    pending: VecDeque<std::result::Result<StreamEvent, TransportError>>,
    finished: bool,
}

/// Decode an event-stream body into status events. A clean end of body is
/// reported as `TransportError::Closed` so the channel reconnects.
fn event_stream(body: Incoming) -> EventStream {
    let state = StreamState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.frame().await {
                Some(Ok(frame)) => {
                    let Ok(data) = frame.into_data() else {
                        continue;
                    };
                    let events = match state.decoder.feed(&data) {
                        Ok(events) => events,
                        Err(e) => {
                            state.pending.push_back(Err(e));
                            continue;
                        }
                    };
                    for event in events {
                        match interpret(&event) {
                            Ok(Some(decoded)) => state.pending.push_back(Ok(decoded)),
                            Ok(None) => {}
                            Err(e) => state.pending.push_back(Err(e)),
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(TransportError::Interrupted(e.to_string())));
                }
                None => {
                    state.finished = true;
                    state.pending.push_back(Err(TransportError::Closed));
                }
            }
        }
    }))
}
