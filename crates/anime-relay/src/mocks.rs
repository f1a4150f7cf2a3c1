//! Test doubles for the gateway, error sink and NATS publisher

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anime_relay_types::{BotMethod, RelayErrorEvent};
use async_nats::subject::ToSubject;
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Barrier;

use crate::bus::PublishClient;
use crate::config::{
    BotSettings, Config, DeepLinkTemplate, InlineSettings, NatsSettings, ServerSettings,
    WebhookSettings,
};
use crate::errors::{GatewayError, RelayError};
use crate::gateway::{BotGateway, Endpoint, MultipartForm};
use crate::sink::ErrorSink;

/// Configuration pointing the bot at `base_url` with token `token`
pub fn test_config(base_url: &str, public_key_path: PathBuf) -> Config {
    Config {
        nats: NatsSettings {
            servers: vec!["localhost:4222".into()],
            subject: "anime".into(),
            error_subject: None,
        },
        bot: BotSettings {
            base_url: base_url.into(),
            token: "token".into(),
            request_timeout: Some(Duration::from_secs(5)),
            accept_invalid_certs: false,
        },
        webhook: WebhookSettings {
            url: "https://relay.test/hook".into(),
            public_key_path,
        },
        server: ServerSettings { port: 8080 },
        inline: InlineSettings {
            deep_link: DeepLinkTemplate::parse("https://anime.test/a/%d").unwrap(),
        },
    }
}

/// Base URL on a local port nothing listens on
pub fn unreachable_base_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{path}")
}

#[derive(Debug, Clone)]
pub struct MockError(pub String);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockError {}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedBody {
    Json(serde_json::Value),
    Form(MultipartForm),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub body: RecordedBody,
}

impl RecordedCall {
    pub fn json(&self) -> &serde_json::Value {
        match &self.body {
            RecordedBody::Json(value) => value,
            RecordedBody::Form(_) => panic!("{} carried a form body", self.endpoint.method),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Status(u16),
    Panic,
}

/// Records every call; answers 200 unless a failure is injected for the method
#[derive(Clone, Default)]
pub struct MockGateway {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    failures: Arc<Mutex<HashMap<BotMethod, Failure>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with_status(&self, method: BotMethod, status: u16) {
        self.failures
            .lock()
            .unwrap()
            .insert(method, Failure::Status(status));
    }

    pub fn panic_on(&self, method: BotMethod) {
        self.failures.lock().unwrap().insert(method, Failure::Panic);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: BotMethod) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint.method == method)
            .collect()
    }

    fn record(&self, endpoint: &Endpoint, body: RecordedBody) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.clone(),
            body,
        });

        let failure = self.failures.lock().unwrap().get(&endpoint.method).copied();
        match failure {
            None => Ok(()),
            Some(Failure::Status(status)) => Err(GatewayError::Status {
                status,
                body: format!("{{\"ok\":false,\"error_code\":{status}}}"),
            }),
            Some(Failure::Panic) => panic!("mock gateway told to panic on {}", endpoint.method),
        }
    }
}

impl BotGateway for MockGateway {
    async fn post_json<T>(&self, endpoint: &Endpoint, body: &T) -> Result<(), GatewayError>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(body).map_err(GatewayError::Encode)?;
        self.record(endpoint, RecordedBody::Json(value))
    }

    async fn post_form(&self, endpoint: &Endpoint, form: MultipartForm) -> Result<(), GatewayError> {
        self.record(endpoint, RecordedBody::Form(form))
    }
}

/// Every call blocks until `parties` calls are in flight at once, then
/// succeeds
#[derive(Clone)]
pub struct BarrierGateway {
    barrier: Arc<Barrier>,
    completed: Arc<Mutex<Vec<BotMethod>>>,
}

impl BarrierGateway {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(parties)),
            completed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn completed(&self) -> Vec<BotMethod> {
        self.completed.lock().unwrap().clone()
    }

    async fn pass(&self, endpoint: &Endpoint) -> Result<(), GatewayError> {
        self.barrier.wait().await;
        self.completed.lock().unwrap().push(endpoint.method);
        Ok(())
    }
}

impl BotGateway for BarrierGateway {
    async fn post_json<T>(&self, endpoint: &Endpoint, _body: &T) -> Result<(), GatewayError>
    where
        T: Serialize + Sync,
    {
        self.pass(endpoint).await
    }

    async fn post_form(&self, endpoint: &Endpoint, _form: MultipartForm) -> Result<(), GatewayError> {
        self.pass(endpoint).await
    }
}

/// Keeps the event form of every reported error
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RelayErrorEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RelayErrorEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    async fn report(&self, error: &RelayError) {
        self.events.lock().unwrap().push(error.to_event());
    }
}

#[derive(Clone, Default)]
pub struct MockPublisher {
    published: Arc<Mutex<Vec<(String, Bytes)>>>,
    fail: bool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<(String, Bytes)> {
        self.published.lock().unwrap().clone()
    }
}

impl PublishClient for MockPublisher {
    type PublishError = MockError;

    async fn publish<S: ToSubject + Send>(
        &self,
        subject: S,
        payload: Bytes,
    ) -> Result<(), Self::PublishError> {
        if self.fail {
            return Err(MockError("publish refused".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((subject.to_subject().to_string(), payload));
        Ok(())
    }
}
