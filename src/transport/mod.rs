// ABOUTME: Transport to the status server: trait seam, HTTP client, and push channel.
// ABOUTME: Exports StatusSource, HttpSource, TransportChannel, and the event-stream decoder.

mod channel;
mod error;
mod http;
mod source;
mod sse;

pub use channel::{Backoff, ChannelEvent, TransportChannel};
pub use error::{FetchError, SubmitError, TransportError};
pub use http::HttpSource;
pub use source::{EventStream, StatusSource};
pub use sse::{MAX_EVENT_BYTES, SseDecoder, SseEvent, StreamEvent, interpret};
