use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::runtime::Handle;

use crate::{
    adapters,
    model::{
        error::BackendError,
        object::{ObjectBody, ObjectPage},
    },
    util,
};

/// AWS S3 through `aws-sdk-s3`, driven from blocking callers on `handle`.
pub struct S3Backend {
    pub client: aws_sdk_s3::Client,
    pub handle: Handle,
}

impl S3Backend {
    pub fn new(client: aws_sdk_s3::Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    /// Region, credentials and endpoint come from the usual `AWS_*` environment
    /// and profile files. Must be awaited inside the runtime that will later
    /// drive the SDK calls, and that runtime must be multi-threaded: a
    /// current-thread runtime only makes IO progress while something is
    /// inside its own `block_on`.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), Handle::current())
    }
}

/// Characters left as-is in a copy source; everything else is percent-encoded.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Value of the `x-amz-copy-source` header: `bucket/key` with every key
/// segment percent-encoded and the `/` separators kept.
fn copy_source(bucket: &str, key: &str) -> String {
    let key = key
        .split(util::object::SEPARATOR)
        .map(|segment| utf8_percent_encode(segment, COPY_SOURCE).to_string())
        .collect::<Vec<_>>()
        .join("/");

    format!("{}/{}", bucket, key)
}

fn sdk_error<E, R>(what: &str, target: &str, err: SdkError<E, R>) -> BackendError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    BackendError::new(format!(
        "failed to {} at: {}, {}",
        what,
        target,
        DisplayErrorContext(&err)
    ))
}

impl adapters::ObjectBackend for S3Backend {
    fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, BackendError> {
        let mut req = self.client.list_objects_v2().bucket(bucket).prefix(prefix);

        if let Some(tok) = continuation_token {
            req = req.continuation_token(tok);
        }

        let lo = util::poll::poll_until_ready_error(&self.handle, req.send())
            .map_err(|err| sdk_error("list_objects", prefix, err))?;

        let keys = lo
            .contents()
            .iter()
            .filter_map(|o| o.key())
            .map(str::to_string)
            .collect();

        Ok(ObjectPage {
            keys,
            continuation_token: lo.next_continuation_token().map(str::to_string),
        })
    }

    fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dest_bucket: &str,
        dest_key: &str,
    ) -> Result<(), BackendError> {
        let req = self
            .client
            .copy_object()
            .bucket(dest_bucket)
            .key(dest_key)
            .copy_source(copy_source(src_bucket, src_key));

        util::poll::poll_until_ready_error(&self.handle, req.send())
            .map_err(|err| sdk_error("copy_object", src_key, err))?;

        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        let req = self.client.delete_object().bucket(bucket).key(key);

        util::poll::poll_until_ready_error(&self.handle, req.send())
            .map_err(|err| sdk_error("delete_object", key, err))?;

        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, BackendError> {
        let req = self.client.get_object().bucket(bucket).key(key);

        let o = match util::poll::poll_until_ready_error(&self.handle, req.send()) {
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|svc_err| svc_err.is_no_such_key())
                    .unwrap_or(false);
                let err = sdk_error("get_object", key, err);

                return Err(if not_found {
                    BackendError::not_found(err.message)
                } else {
                    err
                });
            }
            Ok(o) => o,
        };

        Ok(Box::new(S3ObjectBody {
            body: o.body,
            handle: self.handle.clone(),
            key: key.to_string(),
        }))
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), BackendError> {
        let req = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body));

        util::poll::poll_until_ready_error(&self.handle, req.send())
            .map_err(|err| sdk_error("put_object", key, err))?;

        Ok(())
    }
}

struct S3ObjectBody {
    body: ByteStream,
    handle: Handle,
    key: String,
}

impl Iterator for S3ObjectBody {
    type Item = Result<Vec<u8>, BackendError>;

    fn next(&mut self) -> Option<Self::Item> {
        match util::poll::poll_until_ready_error(&self.handle, self.body.try_next()) {
            Ok(Some(chunk)) => Some(Ok(chunk.to_vec())),
            Ok(None) => None,
            Err(err) => Some(Err(BackendError::new(format!(
                "failed to collect body: {}, {}",
                self.key, err
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use aws_smithy_http_client::test_util::capture_request;

    use super::*;
    use crate::adapters::ObjectBackend;

    #[test]
    fn test_copy_source() {
        let cases = vec![
            ("src", "a.txt", "src/a.txt"),
            ("src", "data/sub/b.txt", "src/data/sub/b.txt"),
            ("src", "reports/Q1 2024+final?.csv", "src/reports/Q1%202024%2Bfinal%3F.csv"),
            ("src", "100%/x&y=z", "src/100%25/x%26y%3Dz"),
            ("src", "caf\u{e9}/~a-b_c.d", "src/caf%C3%A9/~a-b_c.d"),
        ];

        for (bucket, key, expected) in cases {
            assert_eq!(copy_source(bucket, key), expected, "failed for case: {}", key);
        }
    }

    #[test]
    fn test_copy_object_sends_encoded_copy_source() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (http_client, mut requests) = capture_request(None);
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("akid", "secret", None, None, "test"))
            .http_client(http_client)
            .build();
        let backend = S3Backend::new(
            aws_sdk_s3::Client::from_conf(config),
            runtime.handle().clone(),
        );

        // only the outgoing request matters; the canned empty response may not parse
        let _ = backend.copy_object("src", "reports/Q1 2024+final?.csv", "dest", "x");

        let request = requests.expect_request();
        assert_eq!(
            request.headers().get("x-amz-copy-source"),
            Some("src/reports/Q1%202024%2Bfinal%3F.csv")
        );
    }
}
