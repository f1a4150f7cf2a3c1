//! Outbound Bot API gateway
//!
//! One POST per call, JSON or multipart. Success is exactly HTTP 200;
//! nothing is retried.

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod gateway_tests;

use std::future::Future;

use anime_relay_types::BotMethod;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BotSettings;
use crate::errors::GatewayError;

/// Resolved Bot API target. `url` embeds the token, so log `method` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: BotMethod,
    pub url: String,
}

/// Multipart body built before it is handed to the HTTP client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    #[cfg(test)]
    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| match p {
            FormPart::Text { name: n, .. } | FormPart::File { name: n, .. } => n == name,
        })
    }

    fn into_reqwest(self) -> multipart::Form {
        self.parts
            .into_iter()
            .fold(multipart::Form::new(), |form, part| match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    bytes,
                } => form.part(name, multipart::Part::bytes(bytes).file_name(file_name)),
            })
    }
}

/// Seam between the dispatcher and the Bot API
pub trait BotGateway: Send + Sync + 'static {
    /// POST `body` as `application/json`
    fn post_json<T>(
        &self,
        endpoint: &Endpoint,
        body: &T,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send
    where
        T: Serialize + Sync;

    /// POST `form` as `multipart/form-data`
    fn post_form(
        &self,
        endpoint: &Endpoint,
        form: MultipartForm,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// [`BotGateway`] over a shared `reqwest::Client`
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(settings: &BotSettings) -> Result<Self, reqwest::Error> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(settings.accept_invalid_certs);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<(), GatewayError> {
        let response = request.send().await.map_err(GatewayError::Transport)?;
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    method = %endpoint.method,
                    status,
                    error = %e,
                    "Failed to read Bot API response body"
                );
                String::new()
            }
        };

        debug!(method = %endpoint.method, status, body = %body, "Bot API response");

        if status != 200 {
            return Err(GatewayError::Status { status, body });
        }
        Ok(())
    }
}

impl BotGateway for HttpGateway {
    async fn post_json<T>(&self, endpoint: &Endpoint, body: &T) -> Result<(), GatewayError>
    where
        T: Serialize + Sync,
    {
        let bytes = serde_json::to_vec(body).map_err(GatewayError::Encode)?;
        debug!(method = %endpoint.method, size = bytes.len(), "Posting JSON");

        let request = self
            .client
            .post(&endpoint.url)
            .header(CONTENT_TYPE, "application/json")
            .body(bytes);
        self.send(endpoint, request).await
    }

    async fn post_form(&self, endpoint: &Endpoint, form: MultipartForm) -> Result<(), GatewayError> {
        debug!(method = %endpoint.method, parts = form.parts.len(), "Posting multipart form");

        let request = self.client.post(&endpoint.url).multipart(form.into_reqwest());
        self.send(endpoint, request).await
    }
}
