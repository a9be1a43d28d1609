// ABOUTME: Integration tests for the HTTP status source against a canned local server.
// ABOUTME: Checks request paths, status-code mapping, timeouts, and event-stream decoding.

use futures::StreamExt;
use kahu::transport::{
    FetchError, HttpSource, StatusSource, StreamEvent, SubmitError, TransportError,
};
use kahu::types::{ActionKind, Environment, Target};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SNAPSHOT: &str = r#"{"resource": {"id": "svc-1", "status": "running"},
    "deploys": [{"id": "d-1", "resourceId": "svc-1", "environment": "production", "status": "building"}]}"#;

fn target() -> Target {
    Target::service("svc-1", Environment::default())
}

fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Accept one connection, answer it with `reply`, and hand back the raw request.
async fn serve_once(reply: String) -> (HttpSource, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });

    let source = HttpSource::new(format!("http://{addr}/api/"), Duration::from_secs(5));
    (source, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        let Some(head_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let content_length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + content_length {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

mod urls {
    use super::*;

    #[test]
    fn paths_follow_resource_layout() {
        let source = HttpSource::new("http://status.local/api/", Duration::from_secs(1));
        let target = Target::service("svc 1", Environment::new("pr-7").unwrap());

        assert_eq!(source.endpoint(), "http://status.local/api");
        assert_eq!(
            source.status_url(&target),
            "http://status.local/api/services/svc%201/status?environment=pr-7"
        );
        assert_eq!(
            source.stream_url(&target),
            "http://status.local/api/services/svc%201/status/stream?environment=pr-7"
        );
        assert_eq!(
            source.action_url(&target, ActionKind::PublishRules),
            "http://status.local/api/services/svc%201/rules/publish"
        );
    }
}

mod fetch {
    use super::*;

    #[tokio::test]
    async fn parses_snapshot() {
        let (source, server) = serve_once(response("200 OK", "application/json", SNAPSHOT)).await;

        let snapshot = source.fetch(&target()).await.unwrap();
        assert_eq!(snapshot.resource.id.as_str(), "svc-1");
        assert_eq!(snapshot.deploys.len(), 1);

        let request = server.await.unwrap();
        assert!(
            request.starts_with("GET /api/services/svc-1/status?environment=production HTTP/1.1"),
            "{request}"
        );
    }

    #[tokio::test]
    async fn not_found_means_deleted() {
        let (source, _server) = serve_once(response("404 Not Found", "text/plain", "gone")).await;
        assert_eq!(source.fetch(&target()).await, Err(FetchError::NotFound));
    }

    #[tokio::test]
    async fn server_error_keeps_body_excerpt() {
        let (source, _server) =
            serve_once(response("500 Internal Server Error", "text/plain", "boom")).await;
        assert_eq!(
            source.fetch(&target()).await,
            Err(FetchError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let (source, _server) =
            serve_once(response("200 OK", "application/json", "{\"nope\": 1}")).await;
        assert!(matches!(
            source.fetch(&target()).await,
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let source = HttpSource::new(format!("http://{addr}"), Duration::from_millis(100));
        assert_eq!(
            source.fetch(&target()).await,
            Err(FetchError::Timeout(Duration::from_millis(100)))
        );
    }
}

mod submit {
    use super::*;

    #[tokio::test]
    async fn posts_environment_to_action_path() {
        let (source, server) = serve_once(response("202 Accepted", "application/json", "{}")).await;

        source.submit(&target(), ActionKind::Deploy).await.unwrap();

        let request = server.await.unwrap();
        assert!(
            request.starts_with("POST /api/services/svc-1/deploy HTTP/1.1"),
            "{request}"
        );
        assert!(request.contains(r#"{"environment":"production"}"#), "{request}");
    }

    #[tokio::test]
    async fn conflict_is_a_rejection() {
        let (source, _server) =
            serve_once(response("409 Conflict", "text/plain", "deploy in progress")).await;
        assert_eq!(
            source.submit(&target(), ActionKind::Deploy).await,
            Err(SubmitError::Rejected {
                status: 409,
                body: "deploy in progress".to_string(),
            })
        );
    }
}

mod stream {
    use super::*;

    #[tokio::test]
    async fn decodes_events_until_close() {
        let body = format!(
            ": hello\n\nevent: snapshot\ndata: {}\n\nevent: ping\ndata: x\n\nevent: deleted\ndata: {{}}\n\n",
            SNAPSHOT.replace('\n', " ")
        );
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n{body}"
        );
        let (source, server) = serve_once(reply).await;

        let events: Vec<_> = source.stream(&target()).await.unwrap().collect().await;

        assert_eq!(events.len(), 4, "{events:?}");
        assert!(matches!(&events[0], Ok(StreamEvent::Snapshot(s)) if s.deploys.len() == 1));
        assert_eq!(events[1], Ok(StreamEvent::Heartbeat));
        assert_eq!(events[2], Ok(StreamEvent::Deleted));
        assert_eq!(events[3], Err(TransportError::Closed));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/services/svc-1/status/stream?environment=production"));
        assert!(request.to_ascii_lowercase().contains("accept: text/event-stream"));
    }

    #[tokio::test]
    async fn unavailable_stream_is_rejected() {
        let (source, _server) =
            serve_once(response("503 Service Unavailable", "text/plain", "")).await;
        assert!(matches!(
            source.stream(&target()).await,
            Err(TransportError::Rejected(503))
        ));
    }
}
