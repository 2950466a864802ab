pub mod description;
pub mod inventory;
pub mod metrics;
pub mod providers;
pub mod secrets;
pub mod storage;

pub use self::metrics::{get_metrics, init_metrics};
pub use secrets::{SecretStore, SecretsManagerStore};
pub use storage::{BlobStore, LocalBlobStore, S3BlobStore};
