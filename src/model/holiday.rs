use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "2025-03-31", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Idul Fitri")]
    pub name: String,
}
