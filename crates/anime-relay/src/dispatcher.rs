//! Routes decoded notifications to Bot API calls
//!
//! One notification produces zero or more errors. Errors never abort the
//! other calls of the same notification and nothing is retried.

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;

use std::sync::Arc;

use anime_relay_types::{BotMethod, CallbackAction, Notification, SubscriptionNotification};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::config::{BotSettings, Config, DeepLinkTemplate, WebhookSettings};
use crate::errors::RelayError;
use crate::gateway::BotGateway;
use crate::payloads;
use crate::sink::ErrorSink;

pub struct Dispatcher<G, S> {
    gateway: Arc<G>,
    sink: S,
    bot: BotSettings,
    webhook: WebhookSettings,
    deep_link: DeepLinkTemplate,
}

impl<G, S> Dispatcher<G, S>
where
    G: BotGateway,
    S: ErrorSink,
{
    pub fn new(gateway: Arc<G>, sink: S, config: &Config) -> Self {
        Self {
            gateway,
            sink,
            bot: config.bot.clone(),
            webhook: config.webhook.clone(),
            deep_link: config.inline.deep_link.clone(),
        }
    }

    /// Dispatch `payload` and report every resulting error to the sink
    pub async fn handle(&self, payload: &[u8]) {
        for error in self.dispatch(payload).await {
            self.sink.report(&error).await;
        }
    }

    /// Dispatch `payload` and return the errors, in completion order
    #[instrument(name = "relay.dispatch", skip_all, fields(size = payload.len()))]
    pub async fn dispatch(&self, payload: &[u8]) -> Vec<RelayError> {
        let notification = match Notification::from_slice(payload) {
            Ok(notification) => notification,
            Err(e) => return vec![RelayError::Decode(e)],
        };
        debug!(kind = notification.kind(), "Dispatching notification");

        match notification {
            Notification::Start(start) => match start.inline_anime {
                Some(anime) => {
                    let photo = payloads::anime_photo(start.telegram_id, &anime);
                    self.post(BotMethod::SendPhoto, &photo).await
                }
                None => {
                    let message = payloads::plain_message(start.telegram_id, start.text);
                    self.post(BotMethod::SendMessage, &message).await
                }
            },
            Notification::Default(text) => {
                let message = payloads::plain_message(text.telegram_id, text.text);
                self.post(BotMethod::SendMessage, &message).await
            }
            Notification::AnswerInlineQuery(query) => {
                let answer = payloads::inline_query_answer(
                    query.inline_query_id,
                    &query.inline_animes,
                    &self.deep_link,
                );
                self.post(BotMethod::AnswerInlineQuery, &answer).await
            }
            Notification::Subscribe(press) => {
                let next = CallbackAction::Unsubscribe(press.anime_id);
                self.toggle_subscription(press, next).await
            }
            Notification::Unsubscribe(press) => {
                let next = CallbackAction::Subscribe(press.anime_id);
                self.toggle_subscription(press, next).await
            }
            Notification::SetWebhook => self.set_webhook().await.err().into_iter().collect(),
            Notification::Animes(list) | Notification::Subscriptions(list) => {
                let message =
                    payloads::anime_list_message(list.telegram_id, list.text, &list.inline_animes);
                self.post(BotMethod::SendMessage, &message).await
            }
            Notification::Unknown => {
                debug!("Ignoring notification with unknown type");
                Vec::new()
            }
        }
    }

    async fn post<T>(&self, method: BotMethod, body: &T) -> Vec<RelayError>
    where
        T: Serialize + Sync,
    {
        match self.gateway.post_json(&self.bot.endpoint(method), body).await {
            Ok(()) => Vec::new(),
            Err(e) => vec![RelayError::gateway(method, e)],
        }
    }

    fn spawn_post<T>(&self, method: BotMethod, body: T) -> JoinHandle<Result<(), RelayError>>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let endpoint = self.bot.endpoint(method);
        tokio::spawn(async move {
            gateway
                .post_json(&endpoint, &body)
                .await
                .map_err(|e| RelayError::gateway(method, e))
        })
    }

    /// Acknowledge the button press and swap the message keyboard to
    /// `next`, concurrently
    async fn toggle_subscription(
        &self,
        press: SubscriptionNotification,
        next: CallbackAction,
    ) -> Vec<RelayError> {
        let ack = self.spawn_post(
            BotMethod::AnswerCallbackQuery,
            payloads::callback_ack(press.callback_query_id),
        );
        let edit = self.spawn_post(
            BotMethod::EditMessageReplyMarkup,
            payloads::toggled_markup(press.telegram_id, press.message_id, next),
        );

        let mut pending: FuturesUnordered<_> = [ack, edit].into_iter().collect();
        let mut errors = Vec::new();
        while let Some(joined) = pending.next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => errors.push(e),
                Err(e) => errors.push(RelayError::Task(e)),
            }
        }
        errors
    }

    async fn set_webhook(&self) -> Result<(), RelayError> {
        let path = &self.webhook.public_key_path;
        let certificate = tokio::fs::read(path)
            .await
            .map_err(|source| RelayError::PublicKey {
                path: path.clone(),
                source,
            })?;

        let form = payloads::webhook_form(path, certificate, &self.webhook.url);
        self.gateway
            .post_form(&self.bot.endpoint(BotMethod::SetWebhook), form)
            .await
            .map_err(|e| RelayError::gateway(BotMethod::SetWebhook, e))
    }
}
