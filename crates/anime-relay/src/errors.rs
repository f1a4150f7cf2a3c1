//! Relay error types
//!
//! Every failure is local to one inbound notification or one outbound call.
//! Nothing here is retried; errors are handed to an [`ErrorSink`](crate::sink::ErrorSink).

use std::path::PathBuf;

use anime_relay_types::{BotMethod, ErrorKind, RelayErrorEvent};
use thiserror::Error;

/// Failure of a single outbound Bot API call
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Failure while handling one inbound notification
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to decode notification: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to read public key {}: {source}", .path.display())]
    PublicKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{method} failed: {source}")]
    Gateway {
        method: BotMethod,
        #[source]
        source: GatewayError,
    },

    #[error("outbound task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

impl RelayError {
    pub fn gateway(method: BotMethod, source: GatewayError) -> Self {
        Self::Gateway { method, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::PublicKey { .. } => ErrorKind::PublicKey,
            Self::Gateway { source, .. } => match source {
                GatewayError::Encode(_) => ErrorKind::Encode,
                GatewayError::Transport(_) => ErrorKind::Transport,
                GatewayError::Status { .. } => ErrorKind::Status,
            },
            Self::Task(_) => ErrorKind::Task,
        }
    }

    /// Bot API method of the failed call
    pub fn method(&self) -> Option<BotMethod> {
        match self {
            Self::Gateway { method, .. } => Some(*method),
            _ => None,
        }
    }

    /// HTTP status when the Bot API answered with something other than 200
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway {
                source: GatewayError::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    pub fn to_event(&self) -> RelayErrorEvent {
        RelayErrorEvent {
            kind: self.kind(),
            method: self.method().map(|m| m.name().to_string()),
            status: self.status(),
            message: self.to_string(),
        }
    }
}
