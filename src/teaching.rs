use chrono::NaiveDate;

use crate::store::{SchoolStore, StoreResult};

/// A teacher can teach on `date` unless an approved leave covers it.
///
/// Derived on every read from the leave table, so the permission ends on its
/// own when the leave period is over.
pub async fn can_teach(store: &dyn SchoolStore, teacher_id: u64, date: NaiveDate) -> StoreResult<bool> {
    let on_leave = store
        .approved_leaves_on(date)
        .await?
        .iter()
        .any(|l| l.user_id == teacher_id);
    Ok(!on_leave)
}
