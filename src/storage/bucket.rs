//! Resumable uploads against an HTTP bucket.

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, LOCATION};
use reqwest::{Client, StatusCode, redirect::Policy};

use crate::storage::{ObjectStore, StoreError, UploadSession};

/// Object store speaking the resumable-upload protocol.
#[derive(Clone)]
pub struct HttpBucket {
    http: Client,
    endpoint: String,
    bucket: String,
}

impl HttpBucket {
    /// Create a new [`HttpBucket`] under `endpoint` for `bucket`.
    pub fn new(endpoint: &str, bucket: &str) -> Self {
        // 308 answers carry upload state and must not be followed.
        let http = Client::builder()
            .redirect(Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            bucket: bucket.to_owned(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpBucket {
    async fn create(
        &self,
        key: &str,
        total: u64,
    ) -> Result<Box<dyn UploadSession>, StoreError> {
        let response = self
            .http
            .post(format!(
                "{}/upload/storage/v1/b/{}/o?uploadType=resumable&name={}",
                self.endpoint, self.bucket, key
            ))
            .header(CONTENT_LENGTH, 0)
            .header("x-upload-content-length", total)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Rejected(response.status().as_u16()));
        }

        let session_url = response
            .headers()
            .get(LOCATION)
            .and_then(|location| location.to_str().ok())
            .map(str::to_owned)
            .ok_or(StoreError::NoSession)?;

        Ok(Box::new(BucketSession {
            http: self.http.clone(),
            object_url: format!("{}/{}/{}", self.endpoint, self.bucket, key),
            session_url,
            offset: 0,
            total,
        }))
    }
}

struct BucketSession {
    http: Client,
    object_url: String,
    session_url: String,
    offset: u64,
    total: u64,
}

#[async_trait]
impl UploadSession for BucketSession {
    async fn append(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        let start = self.offset;
        let end = start + chunk.len() as u64;

        let response = self
            .http
            .put(&self.session_url)
            .header(
                CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end - 1, self.total),
            )
            .body(chunk.to_vec())
            .send()
            .await?;

        // 308 acknowledges an intermediate chunk, 2xx the last one.
        if response.status() != StatusCode::PERMANENT_REDIRECT
            && !response.status().is_success()
        {
            return Err(StoreError::Rejected(response.status().as_u16()));
        }

        self.offset = end;
        Ok(())
    }

    async fn complete(self: Box<Self>) -> Result<String, StoreError> {
        // An empty object is finalized with a bare range request.
        if self.total == 0 {
            let response = self
                .http
                .put(&self.session_url)
                .header(CONTENT_LENGTH, 0)
                .header(CONTENT_RANGE, "bytes */0")
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(StoreError::Rejected(response.status().as_u16()));
            }
        }

        Ok(self.object_url)
    }
}
