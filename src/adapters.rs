use crate::model::{
    error::BackendError,
    object::{ObjectBody, ObjectPage},
};

pub mod gcs;
pub mod mock;
pub mod s3;

/// Blocking access to one object storage provider.
///
/// Implementations are shared between background workers, so every call must
/// be safe to issue concurrently from several threads.
pub trait ObjectBackend: Send + Sync {
    /// Lists one page of keys under `prefix`, resuming after `continuation_token`.
    fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError>;

    /// Server-side copy; no object data passes through this process.
    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), BackendError>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;

    fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, BackendError>;

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError>;
}
