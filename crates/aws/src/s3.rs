use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use jwks_rotate::error::Err;
use jwks_rotate::{tracerr, ObjectStore, Result};

/// Amazon S3 object store. Containers are buckets and names are object keys.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Create an S3 client from shared AWS configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

impl ObjectStore for S3Store {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let output = match self.client.get_object().bucket(container).key(name).send().await {
            Ok(output) => output,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    tracerr!(Err::NotFound, "s3://{}/{} does not exist", container, name);
                }
                tracerr!(
                    Err::RequestError,
                    "GetObject s3://{}/{} failed: {}",
                    container,
                    name,
                    DisplayErrorContext(&e)
                );
            }
        };

        match output.body.collect().await {
            Ok(body) => Ok(body.into_bytes().to_vec()),
            Err(e) => {
                tracerr!(Err::RequestError, "unable to read s3://{}/{}: {}", container, name, e)
            }
        }
    }

    async fn put(
        &self, container: &str, name: &str, body: Vec<u8>, content_type: &str,
    ) -> Result<()> {
        if let Err(e) = self
            .client
            .put_object()
            .bucket(container)
            .key(name)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
        {
            tracerr!(
                Err::RequestError,
                "PutObject s3://{}/{} failed: {}",
                container,
                name,
                DisplayErrorContext(&e)
            );
        }
        Ok(())
    }
}
