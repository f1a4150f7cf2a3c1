//! Error event published by the relay when handling a notification fails

use serde::{Deserialize, Serialize};

/// Classification of relay failures
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Inbound payload could not be decoded
    Decode,
    /// Webhook public key file could not be read
    PublicKey,
    /// Outbound payload could not be serialized
    Encode,
    /// Network failure talking to the Bot API
    Transport,
    /// Bot API answered with a status other than 200
    Status,
    /// A concurrent outbound task panicked
    Task,
}

/// Error event published via NATS for every failure the relay reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayErrorEvent {
    pub kind: ErrorKind,
    /// Bot API method of the failed call, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// HTTP status (only for `Status`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable error message
    pub message: String,
}
