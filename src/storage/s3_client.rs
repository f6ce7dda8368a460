//! S3 object store
//!
//! Implements [`ObjectStore`] with `rust-s3`. Works against AWS S3 and
//! S3-compatible endpoints (MinIO, LocalStack) when `S3_ENDPOINT` is set.

use super::{ObjectPage, ObjectRecord, ObjectStore, StorageError, StorageResult};
use crate::config::StorageConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use s3::creds::Credentials;
use s3::serde_types::Object;
use s3::{Bucket, Region};
use tracing::{debug, info, warn};

pub struct S3Store {
    bucket: Bucket,
    bucket_name: String,
    max_keys: Option<usize>,
}

impl S3Store {
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        if config.bucket.is_empty() {
            return Err(StorageError::Config("bucket name is empty".to_string()));
        }

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Config(format!("invalid region: {}", e)))?,
        };

        let credentials = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access.as_str()), Some(secret.as_str()), None, None, None)
            }
            _ => Credentials::default(),
        }
        .map_err(|e| StorageError::Config(format!("credentials: {}", e)))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        // Custom endpoints rarely support virtual-host addressing
        let bucket = if config.endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        };

        info!(bucket = %config.bucket, region = %config.region, "S3 store ready");

        Ok(Self {
            bucket,
            bucket_name: config.bucket.clone(),
            max_keys: config.list_max_keys,
        })
    }
}

fn to_record(object: Object) -> ObjectRecord {
    let last_modified = parse_last_modified(&object.key, &object.last_modified);
    ObjectRecord {
        key: object.key,
        size: object.size,
        last_modified,
    }
}

fn parse_last_modified(key: &str, raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "Unparseable LastModified, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> StorageResult<ObjectPage> {
        let (result, status) = self
            .bucket
            .list_page(prefix.to_string(), None, continuation_token, None, self.max_keys)
            .await
            .map_err(|e| StorageError::Backend(format!("S3 list failed: {}", e)))?;

        debug!(
            bucket = %self.bucket_name,
            prefix = %prefix,
            status,
            count = result.contents.len(),
            "Listed S3 page"
        );

        Ok(ObjectPage {
            records: result.contents.into_iter().map(to_record).collect(),
            next_continuation_token: result.next_continuation_token,
            is_truncated: result.is_truncated,
        })
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u32,
    ) -> StorageResult<String> {
        // Signed, so the upload must send the same Content-Type
        let value = HeaderValue::from_str(content_type).map_err(|e| {
            StorageError::Backend(format!("invalid content type {:?}: {}", content_type, e))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, value);

        let url = self
            .bucket
            .presign_put(key, expires_in_secs, Some(headers))
            .await
            .map_err(|e| StorageError::Backend(format!("S3 presign failed: {}", e)))?;

        debug!(bucket = %self.bucket_name, key = %key, content_type = %content_type, "Presigned S3 upload");
        Ok(url)
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(format!("S3 delete failed: {}", e)))?;

        let status = response.status_code();
        if status == 404 {
            return Err(StorageError::NotFound { key: key.to_string() });
        }
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "S3 delete returned status {}",
                status
            )));
        }

        debug!(bucket = %self.bucket_name, key = %key, "Deleted S3 object");
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_last_modified() {
        let parsed = parse_last_modified("docs/a.pdf", "2024-03-01T12:30:00.000Z");
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_bad_timestamp_falls_back_to_epoch() {
        assert_eq!(
            parse_last_modified("a.txt", "yesterday"),
            DateTime::<Utc>::UNIX_EPOCH
        );
    }

    fn static_config(bucket: &str) -> StorageConfig {
        StorageConfig {
            bucket: bucket.to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
            upload_url_expiry_secs: 300,
            list_max_keys: None,
        }
    }

    fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
        let start = url.find(&format!("{}=", name))? + name.len() + 1;
        let rest = &url[start..];
        Some(rest.split('&').next().unwrap_or(rest))
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let config = StorageConfig {
            bucket: String::new(),
            access_key_id: None,
            secret_access_key: None,
            ..static_config("unused")
        };
        assert!(matches!(S3Store::new(&config), Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_presigned_put_signs_content_type() {
        let store = S3Store::new(&static_config("docs-bucket")).unwrap();

        let url = store
            .presign_upload("docs/x.pdf", "application/pdf", 300)
            .await
            .unwrap();

        assert!(url.contains("docs/x.pdf"));
        assert_eq!(query_param(&url, "X-Amz-Expires"), Some("300"));
        let signed = query_param(&url, "X-Amz-SignedHeaders").unwrap().to_lowercase();
        assert!(signed.contains("content-type"), "signed headers: {}", signed);
        assert!(signed.contains("host"), "signed headers: {}", signed);
    }

    #[tokio::test]
    async fn test_presign_rejects_unencodable_content_type() {
        let store = S3Store::new(&static_config("docs-bucket")).unwrap();
        let result = store.presign_upload("docs/x.pdf", "text/plain\nx", 300).await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
    }
}
