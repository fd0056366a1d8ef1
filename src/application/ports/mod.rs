pub mod connectivity;
pub mod operation_store;
pub mod remote_api;
pub mod snapshot_store;
pub mod token_provider;

pub use connectivity::ConnectivityEvent;
pub use operation_store::OperationStore;
pub use remote_api::{ParkingRemoteApi, ProfileApi, RemoteError};
pub use snapshot_store::SnapshotStore;
pub use token_provider::{AccessToken, TokenProvider};
