use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use super::{Notifier, NotifyError, PushMessage};
use crate::{config::Config, model::push_subscription::PushSubscription};

/// Forwards messages to an HTTP push gateway that holds the platform
/// delivery credentials (VAPID / FCM).
pub struct PushGateway {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

#[derive(Serialize)]
struct Keys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Serialize)]
struct Target<'a> {
    endpoint: &'a str,
    keys: Keys<'a>,
}

#[derive(Serialize)]
struct GatewayRequest<'a> {
    subscription: Target<'a>,
    notification: &'a PushMessage,
}

impl PushGateway {
    pub fn new(endpoint: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        }
    }

    /// `None` unless both the gateway URL and the server key are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.push_gateway_url, &config.push_server_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some(Self::new(url.clone(), key.clone()))
            }
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for PushGateway {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), NotifyError> {
        let body = GatewayRequest {
            subscription: Target {
                endpoint: &subscription.endpoint,
                keys: Keys {
                    p256dh: &subscription.p256dh,
                    auth: &subscription.auth,
                },
            },
            notification: message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.server_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!(subscription_id = subscription.id, %status, "Push gateway responded");

        match status {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::GONE => Err(NotifyError::Gone(status.as_u16())),
            _ => Err(NotifyError::Rejected(status.as_u16())),
        }
    }
}
