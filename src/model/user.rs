use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

/// A user without credentials, as read by the reconciliation routines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "budi")]
    pub username: String,
    #[schema(example = "Budi Santoso")]
    pub full_name: String,
    #[schema(value_type = String, example = "teacher")]
    pub role: Role,
    pub is_active: bool,
}
