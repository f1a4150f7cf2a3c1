//! Where dispatch errors end up

use std::future::Future;

use tracing::{error, warn};

use crate::bus::PublishClient;
use crate::errors::RelayError;

/// Receives every error produced while handling a notification, one call
/// per error
pub trait ErrorSink: Send + Sync + 'static {
    fn report(&self, error: &RelayError) -> impl Future<Output = ()> + Send;
}

/// Logs errors with structured fields
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ErrorSink for LogSink {
    async fn report(&self, err: &RelayError) {
        let event = err.to_event();
        error!(
            kind = ?event.kind,
            method = event.method.as_deref(),
            status = event.status,
            error = %err,
            "Failed to relay notification"
        );
    }
}

/// Logs, then publishes a `RelayErrorEvent` to `subject`
pub struct NatsErrorSink<P> {
    client: P,
    subject: String,
}

impl<P: PublishClient> NatsErrorSink<P> {
    pub fn new(client: P, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

impl<P: PublishClient> ErrorSink for NatsErrorSink<P> {
    async fn report(&self, err: &RelayError) {
        LogSink.report(err).await;

        let payload = match serde_json::to_vec(&err.to_event()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to serialize error event");
                return;
            }
        };

        if let Err(e) = self
            .client
            .publish(self.subject.clone(), payload.into())
            .await
        {
            warn!(error = %e, subject = %self.subject, "Failed to publish error event");
        }
    }
}
