//! AWS S3 implementation of the [`ObjectStore`] contract.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;

use crate::error::StoreError;
use crate::store::{ObjectFetch, ObjectMetadata, ObjectStore};

/// [`ObjectStore`] backed by an `aws_sdk_s3::Client`.
///
/// Revalidation maps onto `HeadObject` (etag comparison without a body
/// transfer) and conditional `GetObject` with `If-None-Match`; an HTTP 304
/// from the latter is surfaced as [`ObjectFetch::NotModified`], not an error.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS environment (profile, IAM role,
    /// env credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

/// S3 wraps etags in quotes (`"686897..."`); weak validators carry a `W/`
/// prefix. Comparisons happen on the normalized form.
pub(crate) fn normalize_etag(raw: &str) -> String {
    raw.trim_start_matches("W/").trim_matches('"').to_string()
}

fn http_status<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|r| r.status().as_u16())
}

fn map_transport<E>(err: SdkError<E>, bucket: &str, key: &str) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    match http_status(&err) {
        Some(404) => StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some(401 | 403) => StoreError::Auth {
            reason: format!("{}", DisplayErrorContext(&err)),
        },
        _ => StoreError::Transport {
            reason: format!("{}", DisplayErrorContext(&err)),
        },
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match response {
            Ok(output) => Ok(ObjectMetadata {
                etag: normalize_etag(output.e_tag().unwrap_or_default()),
            }),
            Err(err) => {
                if err.as_service_error().is_some_and(HeadObjectError::is_not_found) {
                    return Err(StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                Err(map_transport(err, bucket, key))
            }
        }
    }

    async fn get(
        &self,
        bucket: &str,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectFetch, StoreError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_if_none_match(if_none_match.map(ToString::to_string))
            .send()
            .await;

        match response {
            Ok(output) => {
                let etag = normalize_etag(output.e_tag().unwrap_or_default());
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StoreError::Transport {
                        reason: e.to_string(),
                    })?
                    .into_bytes()
                    .to_vec();
                Ok(ObjectFetch::Fetched { bytes, etag })
            }
            Err(err) => {
                if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                    return Err(StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                // S3 reports a matching If-None-Match as HTTP 304 rather
                // than a success response.
                if http_status(&err) == Some(304) {
                    return Ok(ObjectFetch::NotModified);
                }
                Err(map_transport(err, bucket, key))
            }
        }
    }
}
