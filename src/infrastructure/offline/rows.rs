use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OfflineOperationRow {
    pub id: i64,
    pub kind: String,
    pub entity_id: String,
    pub subject_key: String,
    pub payload: String,
    pub idempotency_key: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub status: String,
    pub error_message: Option<String>,
    pub synced_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SnapshotRow {
    pub parking_lot_id: String,
    pub data: String,
    pub cached_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct OfflineSessionRow {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub parking_lot_ids: String,
    pub saved_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct StatusCountRow {
    pub status: String,
    pub count: i64,
}
