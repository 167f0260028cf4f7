use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PushSubscription {
    pub id: u64,
    pub user_id: u64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPushSubscription {
    #[schema(example = "https://push.example.com/send/abc")]
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}
