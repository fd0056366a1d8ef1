use crate::domain::entities::offline::StoredSnapshot;
use crate::domain::entities::session::OfflineSessionSnapshot;
use crate::domain::value_objects::{ParkingLotId, SnapshotKind};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Last-writer-wins storage for reference snapshots and the offline session.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn put_snapshot(&self, snapshot: StoredSnapshot) -> Result<(), AppError>;
    async fn get_snapshot(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<Option<StoredSnapshot>, AppError>;
    async fn delete_snapshot(
        &self,
        kind: SnapshotKind,
        parking_lot_id: &ParkingLotId,
    ) -> Result<(), AppError>;

    async fn put_session(&self, session: OfflineSessionSnapshot) -> Result<(), AppError>;
    async fn get_session(&self) -> Result<Option<OfflineSessionSnapshot>, AppError>;
    async fn delete_session(&self) -> Result<(), AppError>;
}
