use serde::Serialize;

use crate::model::push_subscription::PushSubscription;

pub mod push;

pub use push::PushGateway;

/// Payload shown by the client's push handler.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The subscription no longer exists on the push service.
    #[error("subscription gone (HTTP {0})")]
    Gone(u16),
    #[error("push gateway rejected message (HTTP {0})")]
    Rejected(u16),
    #[error("push transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Delivers one message to one subscription. No retry.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), NotifyError>;
}

/// Best-effort push to every subscription of one user. Failures are logged.
pub async fn notify_user(
    store: &dyn crate::store::SchoolStore,
    notifier: Option<&dyn Notifier>,
    user_id: u64,
    message: &PushMessage,
) {
    let Some(notifier) = notifier else {
        return;
    };
    let subscriptions = match store.push_subscriptions_for(&[user_id]).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "Failed to load push subscriptions");
            return;
        }
    };
    for subscription in &subscriptions {
        if let Err(e) = notifier.send(subscription, message).await {
            tracing::warn!(error = %e, user_id, subscription_id = subscription.id, "Push failed");
        }
    }
}
