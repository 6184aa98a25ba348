use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::{
        objects::{
            copy::CopyObjectRequest,
            delete::DeleteObjectRequest,
            download::Range,
            get::GetObjectRequest,
            list::ListObjectsRequest,
            upload::{Media, UploadObjectRequest, UploadType},
        },
        Error as GcsError,
    },
};
use tokio::runtime::Handle;

use crate::{
    adapters,
    model::{
        error::{BackendError, Error},
        object::{ObjectBody, ObjectPage},
    },
    util,
};

/// Google Cloud Storage through `google-cloud-storage`.
pub struct GcsBackend {
    pub client: Client,
    pub handle: Handle,
}

impl GcsBackend {
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    /// Credentials follow the application-default lookup of `google-cloud-auth`.
    pub async fn from_env() -> Result<Self, Error> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|err| Error::Config(format!("failed to load gcs credentials, {}", err)))?;

        Ok(Self::new(Client::new(config), Handle::current()))
    }
}

fn gcs_error(what: &str, target: &str, err: GcsError) -> BackendError {
    let message = format!("failed to {} at: {}, {}", what, target, err);

    match err {
        GcsError::Response(resp) if resp.code == 404 => BackendError::not_found(message),
        _ => BackendError::new(message),
    }
}

impl adapters::ObjectBackend for GcsBackend {
    fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError> {
        let req = ListObjectsRequest {
            bucket: bucket.to_string(),
            prefix: Some(prefix.to_string()),
            page_token: continuation_token,
            ..Default::default()
        };

        let lo = util::poll::poll_until_ready_error(&self.handle, self.client.list_objects(&req))
            .map_err(|err| gcs_error("list_objects", prefix, err))?;

        let keys = lo
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|obj| obj.name)
            .collect();

        Ok(ObjectPage {
            keys,
            continuation_token: lo.next_page_token,
        })
    }

    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), BackendError> {
        let req = CopyObjectRequest {
            source_bucket: src_bucket.to_string(),
            source_object: src_key.to_string(),
            destination_bucket: dest_bucket.to_string(),
            destination_object: dest_key.to_string(),
            ..Default::default()
        };

        util::poll::poll_until_ready_error(&self.handle, self.client.copy_object(&req))
            .map_err(|err| gcs_error("copy_object", src_key, err))?;

        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        let req = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };

        util::poll::poll_until_ready_error(&self.handle, self.client.delete_object(&req))
            .map_err(|err| gcs_error("delete_object", key, err))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, BackendError> {
        let req = GetObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };

        // The JSON API download is buffered whole and handed back as one chunk.
        let bytes = util::poll::poll_until_ready_error(
            &self.handle,
            self.client.download_object(&req, &Range::default()),
        )
        .map_err(|err| gcs_error("download_object", key, err))?;

        Ok(Box::new(std::iter::once(Ok(bytes))))
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError> {
        let req = UploadObjectRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };

        util::poll::poll_until_ready_error(
            &self.handle,
            self.client.upload_object(
                &req,
                body,
                &UploadType::Simple(Media::new(key.to_string())),
            ),
        )
        .map_err(|err| gcs_error("put_object", key, err))?;

        Ok(())
    }
}
