//! Object-store capability used by the artifact publisher.

pub mod memory;
pub mod s3;

use crate::error::TrainingResult;

pub use memory::{InMemoryObjectStore, StoredObject};
pub use s3::S3ObjectStore;

/// Blocking object store. Each `put` is a single whole-object write.
pub trait ObjectStore {
    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str) -> TrainingResult<()>;

    fn delete(&self, bucket: &str, key: &str) -> TrainingResult<()>;
}
