use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::Path,
    sync::Arc,
};

use tracing::{error, info, span, Level};
use walkdir::WalkDir;

use crate::{
    adapters::ObjectBackend,
    model::{
        error::{BackendError, Error, Result},
        object::Operation,
    },
    util::object::{ensure_relative, is_folder_marker, join_key, relative_key},
};

pub mod asynchronous;

/// Object storage operations against one backend.
///
/// Cloning is cheap and every clone shares the same backend connection.
/// Nothing here retries; the first failure of a composite operation is
/// returned and already completed steps are left in place.
#[derive(Clone)]
pub struct ObjectStoreClient {
    backend: Arc<dyn ObjectBackend>,
}

impl ObjectStoreClient {
    pub fn new<B: ObjectBackend + 'static>(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    pub fn with_backend(backend: Arc<dyn ObjectBackend>) -> Self {
        Self { backend }
    }

    /// Lists every key under `prefix`, following continuation tokens until the
    /// backend reports the last page. Folder markers are dropped when
    /// `exclude_folders` is set.
    pub fn list_object_keys(
        &self,
        bucket: &str,
        prefix: &str,
        exclude_folders: bool,
    ) -> Result<Vec<String>> {
        let span = span!(Level::INFO, "list_object_keys", context = "list_object_keys");
        let _e = span.enter();
        info!(bucket = bucket, prefix = prefix, exclude_folders, "called");

        ensure_relative("prefix", prefix)?;

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let page = self
                .backend
                .list_objects_page(bucket, prefix, continuation_token)
                .map_err(|err| storage_failure(Operation::List, bucket, prefix, err))?;

            keys.extend(page.keys);

            continuation_token = page.continuation_token;
            if continuation_token.is_none() {
                break;
            }
        }

        if exclude_folders {
            keys.retain(|key| !is_folder_marker(key));
        }

        Ok(keys)
    }

    pub fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<()> {
        let span = span!(Level::INFO, "copy_object", context = "copy_object");
        let _e = span.enter();
        info!(
            src_bucket = src_bucket,
            src_key = src_key,
            dest_bucket = dest_bucket,
            dest_key = dest_key,
            "called"
        );

        ensure_relative("object_key", src_key)?;
        ensure_relative("object_key", dest_key)?;

        self.backend
            .copy_object(src_bucket, src_key, dest_bucket, dest_key)
            .map_err(|err| storage_failure(Operation::Copy, src_bucket, src_key, err))
    }

    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let span = span!(Level::INFO, "delete_object", context = "delete_object");
        let _e = span.enter();
        info!(bucket = bucket, key = key, "called");

        ensure_relative("object_key", key)?;

        self.backend
            .delete_object(bucket, key)
            .map_err(|err| storage_failure(Operation::Delete, bucket, key, err))
    }

    /// Copy followed by delete of the source. Not atomic: when the delete
    /// fails the object exists at both locations and the delete error is
    /// returned.
    pub fn move_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<()> {
        let span = span!(Level::INFO, "move_object", context = "move_object");
        let _e = span.enter();
        info!(
            src_bucket = src_bucket,
            src_key = src_key,
            dest_bucket = dest_bucket,
            dest_key = dest_key,
            "called"
        );

        ensure_relative("object_key", src_key)?;
        ensure_relative("object_key", dest_key)?;

        self.copy_object(src_bucket, src_key, dest_bucket, dest_key)?;
        self.delete_object(src_bucket, src_key)
    }

    /// Streams one object into `local_path`, creating parent directories and
    /// overwriting any existing file. A failure while streaming may leave a
    /// partial file behind.
    pub fn download_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let span = span!(Level::INFO, "download_object", context = "download_object");
        let _e = span.enter();
        info!(bucket = bucket, key = key, local_path = %local_path.display(), "called");

        ensure_relative("object_key", key)?;

        info!(
            "downloading object '{}/{}' to '{}'",
            bucket,
            key,
            local_path.display()
        );

        let body = self
            .backend
            .get_object(bucket, key)
            .map_err(|err| storage_failure(Operation::Get, bucket, key, err))?;

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| local_failure(parent, err))?;
            }
        }

        let file = File::create(local_path).map_err(|err| local_failure(local_path, err))?;
        let mut writer = BufWriter::new(file);

        for chunk in body {
            let chunk = chunk.map_err(|err| storage_failure(Operation::Get, bucket, key, err))?;
            writer
                .write_all(&chunk)
                .map_err(|err| local_failure(local_path, err))?;
        }

        writer.flush().map_err(|err| local_failure(local_path, err))
    }

    /// Downloads every object under `prefix` into `local_path`, keeping the
    /// key layout below the prefix. Stops at the first failing object.
    pub fn download_folder(&self, bucket: &str, prefix: &str, local_path: &Path) -> Result<()> {
        let span = span!(Level::INFO, "download_folder", context = "download_folder");
        let _e = span.enter();
        info!(bucket = bucket, prefix = prefix, local_path = %local_path.display(), "called");

        ensure_relative("prefix", prefix)?;

        let keys = self.list_object_keys(bucket, prefix, true)?;

        for key in keys {
            if is_folder_marker(&key) {
                continue;
            }

            let relative = relative_key(&key, prefix).map_err(|err| {
                error!(error_message = %err, error_group = "relative_path", bucket = bucket, key = %key);
                err
            })?;

            self.download_object(bucket, &key, &local_path.join(relative))?;
        }

        Ok(())
    }

    /// Uploads a whole local file as one object body.
    pub fn put_object(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let span = span!(Level::INFO, "put_object", context = "put_object");
        let _e = span.enter();
        info!(bucket = bucket, key = key, local_path = %local_path.display(), "called");

        ensure_relative("object_key", key)?;

        let body = fs::read(local_path).map_err(|err| local_failure(local_path, err))?;

        self.backend
            .put_object(bucket, key, body)
            .map_err(|err| storage_failure(Operation::Put, bucket, key, err))
    }

    /// Uploads every regular file below `local_path` under `prefix`, in
    /// file-name order. A `local_path` that is itself a file uploads nothing.
    /// Stops at the first failing file.
    pub fn put_folder(&self, bucket: &str, prefix: &str, local_path: &Path) -> Result<()> {
        let span = span!(Level::INFO, "put_folder", context = "put_folder");
        let _e = span.enter();
        info!(bucket = bucket, prefix = prefix, local_path = %local_path.display(), "called");

        ensure_relative("prefix", prefix)?;

        for entry in WalkDir::new(local_path).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| local_path.to_path_buf());
                local_failure(&path, io::Error::from(err))
            })?;

            // symlinks are followed for the file check, not for descent
            if !entry.path().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(local_path).map_err(|_| {
                Error::RelativePath {
                    key: entry.path().display().to_string(),
                    prefix: local_path.display().to_string(),
                }
            })?;

            let key = join_key(prefix, relative);
            self.put_object(bucket, &key, entry.path())?;
        }

        Ok(())
    }
}

fn storage_failure(operation: Operation, bucket: &str, key: &str, source: BackendError) -> Error {
    error!(
        error_message = %source,
        error_group = operation.as_str(),
        bucket = bucket,
        key = key
    );

    Error::storage(operation, bucket, key, source)
}

fn local_failure(path: &Path, source: io::Error) -> Error {
    error!(error_message = %source, error_group = "local_io", path = %path.display());

    Error::local_io(path, source)
}
