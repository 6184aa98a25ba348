//! Async variants of every [`ObjectStoreClient`] operation.
//!
//! Each call moves a clone of the client onto tokio's blocking pool with
//! `spawn_blocking` and awaits the result. Dropping the returned future stops
//! waiting but does not stop the backend request already in flight.

use std::path::{Path, PathBuf};

use tracing::error;

use crate::{
    client::ObjectStoreClient,
    model::error::{Error, Result},
};

impl ObjectStoreClient {
    /// Runs a blocking operation on a worker thread and awaits it.
    pub async fn run_blocking<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&ObjectStoreClient) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.clone();

        tokio::task::spawn_blocking(move || operation(&client))
            .await
            .map_err(|err| {
                error!(error_message = %err, error_group = "spawn_blocking");
                Error::Join(err.to_string())
            })?
    }

    pub async fn list_object_keys_async(
        &self,
        bucket: &str,
        prefix: &str,
        exclude_folders: bool,
    ) -> Result<Vec<String>> {
        let (bucket, prefix) = (bucket.to_string(), prefix.to_string());
        self.run_blocking(move |client| client.list_object_keys(&bucket, &prefix, exclude_folders))
            .await
    }

    pub async fn copy_object_async(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<()> {
        let (src_bucket, src_key) = (src_bucket.to_string(), src_key.to_string());
        let (dest_bucket, dest_key) = (dest_bucket.to_string(), dest_key.to_string());
        self.run_blocking(move |client| {
            client.copy_object(&src_bucket, &src_key, &dest_bucket, &dest_key)
        })
        .await
    }

    pub async fn delete_object_async(&self, bucket: &str, key: &str) -> Result<()> {
        let (bucket, key) = (bucket.to_string(), key.to_string());
        self.run_blocking(move |client| client.delete_object(&bucket, &key))
            .await
    }

    pub async fn move_object_async(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<()> {
        let (src_bucket, src_key) = (src_bucket.to_string(), src_key.to_string());
        let (dest_bucket, dest_key) = (dest_bucket.to_string(), dest_key.to_string());
        self.run_blocking(move |client| {
            client.move_object(&src_bucket, &src_key, &dest_bucket, &dest_key)
        })
        .await
    }

    pub async fn download_object_async(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<()> {
        let (bucket, key, local_path) = owned(bucket, key, local_path);
        self.run_blocking(move |client| client.download_object(&bucket, &key, &local_path))
            .await
    }

    pub async fn download_folder_async(
        &self,
        bucket: &str,
        prefix: &str,
        local_path: &Path,
    ) -> Result<()> {
        let (bucket, prefix, local_path) = owned(bucket, prefix, local_path);
        self.run_blocking(move |client| client.download_folder(&bucket, &prefix, &local_path))
            .await
    }

    pub async fn put_object_async(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let (bucket, key, local_path) = owned(bucket, key, local_path);
        self.run_blocking(move |client| client.put_object(&bucket, &key, &local_path))
            .await
    }

    pub async fn put_folder_async(
        &self,
        bucket: &str,
        prefix: &str,
        local_path: &Path,
    ) -> Result<()> {
        let (bucket, prefix, local_path) = owned(bucket, prefix, local_path);
        self.run_blocking(move |client| client.put_folder(&bucket, &prefix, &local_path))
            .await
    }
}

fn owned(bucket: &str, name: &str, local_path: &Path) -> (String, String, PathBuf) {
    (bucket.to_string(), name.to_string(), local_path.to_path_buf())
}
