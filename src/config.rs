use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{info, warn};

use crate::{
    adapters::{gcs::GcsBackend, s3::S3Backend},
    client::ObjectStoreClient,
    model::error::Result,
    util::object::{parse_bucket_from_uri, parse_provider_from_uri, Provider},
};

impl ObjectStoreClient {
    /// Builds a client for `provider` from the SDK's ambient configuration.
    ///
    /// The current tokio runtime is captured to drive SDK calls made by the
    /// blocking operations, so this must be awaited inside that runtime, and
    /// the runtime must be multi-threaded for blocking calls made from plain
    /// threads to make progress.
    pub async fn from_env(provider: Provider) -> Result<Self> {
        info!(provider = ?provider, "loading backend configuration");

        if Handle::current().runtime_flavor() == RuntimeFlavor::CurrentThread {
            warn!("current-thread runtime: blocking calls from other threads may hang");
        }

        match provider {
            Provider::AWS => Ok(Self::new(S3Backend::from_env().await)),
            Provider::GCS => Ok(Self::new(GcsBackend::from_env().await?)),
        }
    }

    /// Like [`ObjectStoreClient::from_env`], picking the provider from a
    /// `s3://bucket` or `gs://bucket` URI. Returns the client and bucket name.
    pub async fn from_uri(bucket_uri: &str) -> Result<(Self, String)> {
        let provider = parse_provider_from_uri(bucket_uri)?;
        let bucket = parse_bucket_from_uri(bucket_uri).to_string();
        info!(bucket = %bucket, "parsed bucket uri");

        Ok((Self::from_env(provider).await?, bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::error::Error;

    #[tokio::test]
    async fn test_from_uri_rejects_unknown_scheme() {
        let cases = vec!["ftp://bucket", "bucket", ""];

        for input in cases {
            let result = ObjectStoreClient::from_uri(input).await;
            assert!(
                matches!(result, Err(Error::Config(_))),
                "failed for case: {}",
                input
            );
        }
    }
}
