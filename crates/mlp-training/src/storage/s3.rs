use super::ObjectStore;
use crate::config::PublishConfig;
use crate::error::{TrainingError, TrainingResult};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

/// S3-compatible store (MinIO, AWS S3) behind a blocking interface.
///
/// Owns a current-thread runtime; every call blocks until the request
/// completes. Requests are not retried.
pub struct S3ObjectStore {
    client: S3Client,
    runtime: tokio::runtime::Runtime,
}

impl S3ObjectStore {
    pub fn connect(config: &PublishConfig) -> TrainingResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "mlp-static",
        );

        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .endpoint_url(&config.endpoint)
                .region(Region::new(config.region.clone()))
                .credentials_provider(credentials)
                .retry_config(RetryConfig::disabled())
                .load(),
        );

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(true).build();
        debug!("S3 client configured for endpoint {}", config.endpoint);

        Ok(Self { client: S3Client::from_conf(s3_config), runtime })
    }
}

fn classify<E, R>(key: &str, err: &SdkError<E, R>) -> TrainingError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let reason = DisplayErrorContext(err).to_string();
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => TrainingError::StorageUnavailable(reason),
        _ => TrainingError::UploadFailed { key: key.to_string(), reason },
    }
}

impl ObjectStore for S3ObjectStore {
    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str) -> TrainingResult<()> {
        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send();

        self.runtime.block_on(request).map_err(|e| classify(key, &e))?;
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> TrainingResult<()> {
        let request = self.client.delete_object().bucket(bucket).key(key).send();
        self.runtime.block_on(request).map_err(|e| classify(key, &e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_endpoint_is_storage_unavailable() {
        let config = PublishConfig { endpoint: "http://127.0.0.1:1".to_string(), ..PublishConfig::default() };
        let store = S3ObjectStore::connect(&config).unwrap();

        let err = store.put("model", "m/model.bin", vec![1], "application/octet-stream").unwrap_err();
        assert!(matches!(err, TrainingError::StorageUnavailable(_)), "got {err:?}");
    }
}
