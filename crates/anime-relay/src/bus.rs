//! NATS connection, subscription loop and publishing seam

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_nats::subject::ToSubject;
use async_nats::{Client, ConnectOptions, Event};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::config::NatsSettings;
use crate::dispatcher::Dispatcher;
use crate::gateway::BotGateway;
use crate::health::AppState;
use crate::sink::ErrorSink;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to connect to NATS servers {servers:?}: {source}")]
    Connect {
        servers: Vec<String>,
        #[source]
        source: async_nats::ConnectError,
    },

    #[error("failed to subscribe to {subject}: {source}")]
    Subscribe {
        subject: String,
        #[source]
        source: async_nats::client::SubscribeError,
    },
}

/// Publishing half of the NATS client, mocked in tests
pub trait PublishClient: Send + Sync + Clone + 'static {
    type PublishError: std::error::Error + Send + Sync;

    fn publish<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), Self::PublishError>> + Send;
}

impl PublishClient for Client {
    type PublishError = async_nats::client::PublishError;

    async fn publish<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> Result<(), Self::PublishError> {
        Client::publish(self, subject, payload).await
    }
}

fn reconnect_delay(attempts: usize) -> Duration {
    let delay = Duration::from_secs(std::cmp::min(
        MAX_RECONNECT_DELAY.as_secs(),
        2u64.saturating_pow(attempts as u32),
    ));
    info!(attempts, delay_secs = delay.as_secs(), "NATS reconnect delay");
    delay
}

async fn handle_event(event: Event) {
    match event {
        Event::Connected => info!("NATS connected"),
        Event::Disconnected => warn!("NATS disconnected, will attempt reconnect"),
        Event::ServerError(err) => warn!(error = %err, "NATS server error"),
        Event::ClientError(err) => warn!(error = %err, "NATS client error"),
        Event::SlowConsumer(sid) => warn!(sid, "NATS slow consumer detected"),
        Event::LameDuckMode => warn!("NATS server entering lame duck mode"),
        Event::Closed => info!("NATS connection closed"),
        Event::Draining => info!("NATS connection draining"),
    }
}

/// Connect with automatic reconnection and event logging
#[instrument(name = "nats.connect", skip(settings), fields(servers = ?settings.servers))]
pub async fn connect(settings: &NatsSettings) -> Result<Client, BusError> {
    info!(servers = ?settings.servers, "Connecting to NATS");

    let result = ConnectOptions::new()
        .retry_on_initial_connect()
        .connection_timeout(CONNECTION_TIMEOUT)
        .reconnect_delay_callback(reconnect_delay)
        .event_callback(|event| async move { handle_event(event).await })
        .connect(&settings.servers)
        .await;

    match result {
        Ok(client) => {
            info!(servers = ?settings.servers, "Connected to NATS");
            Ok(client)
        }
        Err(source) => {
            warn!(error = %source, servers = ?settings.servers, "Failed to connect to NATS");
            Err(BusError::Connect {
                servers: settings.servers.clone(),
                source,
            })
        }
    }
}

/// Subscribe to `subject` and relay every message until the subscription
/// closes.
pub async fn run<G, S>(
    client: &Client,
    subject: &str,
    dispatcher: Arc<Dispatcher<G, S>>,
    state: AppState,
) -> Result<(), BusError>
where
    G: BotGateway,
    S: ErrorSink,
{
    let subscriber = client
        .subscribe(subject.to_string())
        .await
        .map_err(|source| BusError::Subscribe {
            subject: subject.to_string(),
            source,
        })?;

    info!(subject, "Listening for notifications");
    relay(subject, subscriber.map(|message| message.payload), dispatcher, state).await;
    Ok(())
}

/// Hand every payload to its own dispatch task. The health state reports
/// subscribed for as long as `payloads` is open.
pub async fn relay<St, G, S>(
    subject: &str,
    mut payloads: St,
    dispatcher: Arc<Dispatcher<G, S>>,
    state: AppState,
) where
    St: Stream<Item = Bytes> + Unpin,
    G: BotGateway,
    S: ErrorSink,
{
    state.set_subscribed(true).await;

    while let Some(payload) = payloads.next().await {
        debug!(subject, size = payload.len(), "Received notification");
        state.increment_messages_received().await;

        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            dispatcher.handle(&payload).await;
        });
    }

    state.set_subscribed(false).await;
    warn!(subject, "Subscription closed");
}
