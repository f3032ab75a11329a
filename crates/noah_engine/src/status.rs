use std::sync::Arc;

use futures_util::StreamExt;
use noah_logging::{noah_debug, noah_info, noah_warn};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::client::ProgressSink;
use crate::{ChannelError, EngineEvent};

/// One inbound status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Any non-terminal status, kept verbatim.
    Working(String),
    Completed,
    Failed,
    Duplicate,
}

#[derive(Deserialize)]
struct StatusMessage {
    status: serde_json::Value,
}

impl StatusEvent {
    pub fn from_status(status: &str) -> Self {
        match status {
            "completed" => StatusEvent::Completed,
            "failed" => StatusEvent::Failed,
            "duplicate" => StatusEvent::Duplicate,
            other => StatusEvent::Working(other.to_string()),
        }
    }

    /// Parses a `{"status": ...}` text frame. A non-string status is shown
    /// in its JSON form and is never terminal.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let message: StatusMessage = serde_json::from_str(text)?;
        Ok(match message.status {
            serde_json::Value::String(status) => Self::from_status(&status),
            other => StatusEvent::Working(other.to_string()),
        })
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusEvent::Working(_))
    }
}

/// How a status channel ended. Produced exactly once per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Completed,
    Failed,
    Duplicate,
    ChannelError(ChannelError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Awaiting,
    HasStatus(String),
    Closed(ChannelOutcome),
}

impl ChannelState {
    /// Applies one event. Returns the outcome on the transition to `Closed`;
    /// once closed every further event is ignored.
    pub fn apply(&mut self, event: StatusEvent) -> Option<ChannelOutcome> {
        if self.is_closed() {
            return None;
        }
        let outcome = match event {
            StatusEvent::Working(status) => {
                *self = ChannelState::HasStatus(status);
                return None;
            }
            StatusEvent::Completed => ChannelOutcome::Completed,
            StatusEvent::Failed => ChannelOutcome::Failed,
            StatusEvent::Duplicate => ChannelOutcome::Duplicate,
        };
        *self = ChannelState::Closed(outcome.clone());
        Some(outcome)
    }

    pub fn fail(&mut self, error: ChannelError) -> Option<ChannelOutcome> {
        if self.is_closed() {
            return None;
        }
        let outcome = ChannelOutcome::ChannelError(error);
        *self = ChannelState::Closed(outcome.clone());
        Some(outcome)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ChannelState::Closed(_))
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            ChannelState::HasStatus(status) => Some(status.as_str()),
            _ => None,
        }
    }
}

pub struct StatusChannel;

impl StatusChannel {
    /// Connects to `url` on a reader task that owns the socket until the
    /// channel closes.
    pub fn open(url: Url, sink: Arc<dyn ProgressSink>) -> StatusChannelHandle {
        let task = tokio::spawn(async move { watch_status(&url, sink.as_ref()).await });
        StatusChannelHandle { task }
    }
}

pub struct StatusChannelHandle {
    task: JoinHandle<ChannelOutcome>,
}

impl StatusChannelHandle {
    pub async fn closed(self) -> ChannelOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => ChannelOutcome::ChannelError(ChannelError::new(err.to_string())),
        }
    }
}

/// Reads status frames one at a time until a terminal status or a transport
/// failure. Non-terminal statuses are forwarded as
/// [`EngineEvent::StatusChanged`].
pub async fn watch_status(url: &Url, sink: &dyn ProgressSink) -> ChannelOutcome {
    let mut state = ChannelState::default();

    let (mut socket, _) = match connect_async(url.as_str()).await {
        Ok(pair) => pair,
        Err(err) => return close_with_error(&mut state, format!("connect {url}: {err}")),
    };
    noah_info!("status channel open at {}", url);

    while let Some(frame) = socket.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => return close_with_error(&mut state, err.to_string()),
        };
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let event = match StatusEvent::parse(text.as_str()) {
            Ok(event) => event,
            Err(err) => {
                noah_warn!("ignoring malformed status frame {:?}: {}", text.as_str(), err);
                continue;
            }
        };
        noah_debug!("status event {:?}", event);

        if let StatusEvent::Working(status) = &event {
            sink.emit(EngineEvent::StatusChanged {
                status: status.clone(),
            });
        }
        if let Some(outcome) = state.apply(event) {
            let _ = socket.close(None).await;
            noah_info!("status channel closed with {:?}", outcome);
            return outcome;
        }
    }

    close_with_error(&mut state, "socket closed before a terminal status")
}

fn close_with_error(state: &mut ChannelState, message: impl Into<String>) -> ChannelOutcome {
    let error = ChannelError::new(message);
    noah_warn!("{}", error);
    state
        .fail(error.clone())
        .unwrap_or(ChannelOutcome::ChannelError(error))
}
