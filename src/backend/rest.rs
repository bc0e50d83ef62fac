//! REST client for the hosted realtime database.
//!
//! Documents live at `{base}/{path}.json` with an optional `?auth=` token;
//! `set`/`update`/`remove` map to PUT/PATCH/DELETE. `watch` opens the
//! database's `text/event-stream` endpoint and folds the incremental
//! `put`/`patch` events into a local mirror, emitting the full value after
//! each event. There is no reconnect: a dropped stream simply stops
//! delivering until the caller subscribes again.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::backend::{merge_at, split_path, write_at, RealtimeBackend, WatchStream};
use crate::error::BackendError;

/// Timeout for plain document requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout for the streaming connection. No total timeout: the
/// stream is expected to stay open for the lifetime of a subscription.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RestBackend {
    client: Client,
    stream_client: Client,
    base: String,
    auth: Option<String>,
}

impl RestBackend {
    pub fn new(base_url: &str, auth: Option<String>) -> Result<Self, BackendError> {
        let base = normalize_base_url(base_url);
        if base.is_empty() {
            return Err(BackendError::InvalidUrl {
                url: base_url.to_string(),
            });
        }

        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::from_reqwest(&base, e))?;
        let stream_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::from_reqwest(&base, e))?;

        Ok(Self {
            client,
            stream_client,
            base,
            auth: auth
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let trimmed = path.trim_matches('/');
        match &self.auth {
            Some(token) => format!("{}/{}.json?auth={}", self.base, trimmed, token),
            None => format!("{}/{}.json", self.base, trimmed),
        }
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(&self.base, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::from_status(status));
        }
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::from_reqwest(&self.base, e))?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Trim the URL, default the scheme (http only for loopback hosts), and
/// strip trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

#[async_trait]
impl RealtimeBackend for RestBackend {
    async fn get(&self, path: &str) -> Result<Value, BackendError> {
        self.send_json(self.client.get(self.endpoint(path))).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), BackendError> {
        self.send_json(self.client.put(self.endpoint(path)).json(&value))
            .await?;
        Ok(())
    }

    async fn update(&self, path: &str, patch: Value) -> Result<(), BackendError> {
        self.send_json(self.client.patch(self.endpoint(path)).json(&patch))
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), BackendError> {
        self.send_json(self.client.delete(self.endpoint(path)))
            .await?;
        Ok(())
    }

    async fn watch(&self, path: &str) -> Result<WatchStream, BackendError> {
        let response = self
            .stream_client
            .get(self.endpoint(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(&self.base, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::from_status(status));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let watched = path.to_string();
        tokio::spawn(async move {
            let mut response = response;
            let mut parser = SseParser::default();
            let mut mirror = Value::Null;
            loop {
                let chunk = tokio::select! {
                    // Receiver dropped: close the connection promptly
                    // instead of waiting for the next remote event.
                    _ = tx.closed() => break,
                    chunk = response.chunk() => chunk,
                };
                let bytes = match chunk {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => {
                        debug!(path = %watched, "event stream ended");
                        break;
                    }
                    Err(error) => {
                        warn!(path = %watched, error = %error, "event stream failed");
                        break;
                    }
                };

                for event in parser.feed(&bytes) {
                    match apply_stream_event(&mut mirror, &event) {
                        StreamAction::Snapshot => {
                            if tx.send(mirror.clone()).is_err() {
                                return;
                            }
                        }
                        StreamAction::Ignore => {}
                        StreamAction::End => {
                            warn!(path = %watched, event = %event.name, "event stream closed by server");
                            return;
                        }
                    }
                }
            }
        });

        Ok(WatchStream::new(rx))
    }
}

// ---------------------------------------------------------------------------
// Event-stream handling
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
struct SseEvent {
    name: String,
    data: String,
}

/// Incremental `text/event-stream` parser. Bytes are buffered until a full
/// line is available; splitting on `\n` is always UTF-8 safe because no
/// multi-byte sequence contains that byte.
#[derive(Default)]
struct SseParser {
    buffer: Vec<u8>,
    event_name: String,
    data: String,
}

impl SseParser {
    fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // Blank line dispatches the accumulated event.
                if !self.event_name.is_empty() || !self.data.is_empty() {
                    events.push(SseEvent {
                        name: if self.event_name.is_empty() {
                            "message".to_string()
                        } else {
                            std::mem::take(&mut self.event_name)
                        },
                        data: std::mem::take(&mut self.data),
                    });
                    self.event_name.clear();
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("event:") {
                self.event_name = rest.strip_prefix(' ').unwrap_or(rest).to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            }
            // Comment lines and unknown fields are ignored per the format.
        }

        events
    }
}

enum StreamAction {
    Snapshot,
    Ignore,
    End,
}

/// Fold one stream event into the mirror. `put` replaces the subtree at
/// the event's path (the first event is always a `put` of the whole watched
/// value), `patch` shallow-merges there.
fn apply_stream_event(mirror: &mut Value, event: &SseEvent) -> StreamAction {
    match event.name.as_str() {
        "put" | "patch" => {
            let payload: Value = match serde_json::from_str(&event.data) {
                Ok(value) => value,
                Err(error) => {
                    warn!(event = %event.name, error = %error, "undecodable stream event skipped");
                    return StreamAction::Ignore;
                }
            };
            let Some(rel_path) = payload.get("path").and_then(Value::as_str) else {
                warn!(event = %event.name, "stream event missing path, skipped");
                return StreamAction::Ignore;
            };
            let data = payload.get("data").cloned().unwrap_or(Value::Null);
            let segments = split_path(rel_path);
            if event.name == "put" {
                write_at(mirror, &segments, data);
            } else {
                merge_at(mirror, &segments, data);
            }
            StreamAction::Snapshot
        }
        "keep-alive" => StreamAction::Ignore,
        "cancel" | "auth_revoked" => StreamAction::End,
        other => {
            debug!(event = %other, "ignoring unrecognized stream event");
            StreamAction::Ignore
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
