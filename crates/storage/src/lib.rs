pub mod error;
mod key;
mod models;
pub mod store;

pub use crate::key::validate as validate_key;
pub use crate::models::UploadMetadata;
pub use crate::store::ObjectStore;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
