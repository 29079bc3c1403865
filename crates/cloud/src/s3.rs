//! Amazon S3 (or S3-compatible) storage provider.
//!
//! S3 has no rename: `move_object` is copy-then-delete and is **not
//! atomic**. Two spoolers claiming from the same backend at the same moment
//! can both copy the job before either deletes it. Run a single spooler per
//! backend when using this provider.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use qspool_core::storage::{StorageBackend, StorageError};

pub struct S3Storage {
    client: Client,
    bucket: String,
    /// Key prefix prepended to every storage path; empty or ending in `/`.
    prefix: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        Self {
            client,
            bucket: bucket.into(),
            prefix: if prefix.is_empty() {
                String::new()
            } else {
                format!("{prefix}/")
            },
        }
    }

    /// Build a client from the standard AWS environment (credentials chain,
    /// `AWS_REGION`, `AWS_ENDPOINT_URL`).
    pub async fn from_env(bucket: impl Into<String>, prefix: &str) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), bucket, prefix)
    }

    fn key(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => match classify(path, err) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }
}

/// Map an SDK failure onto the storage taxonomy by HTTP status.
fn classify<E>(path: &str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: std::error::Error + 'static,
{
    match err.raw_response().map(|r| r.status().as_u16()) {
        Some(404) => StorageError::NotFound(path.to_string()),
        Some(409 | 412) => StorageError::Conflict(path.to_string()),
        _ => StorageError::Backend(format!("{path}: {}", DisplayErrorContext(&err))),
    }
}

/// Percent-encode a key for the `x-amz-copy-source` header, keeping `/`.
fn encode_copy_source(bucket: &str, key: &str) -> String {
    let mut out = format!("{bucket}/");
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .content_type("application/json")
            .body(ByteStream::from(content))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| classify(path, e))
    }

    async fn put_new(&self, path: &str, content: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .content_type("application/json")
            .if_none_match("*")
            .body(ByteStream::from(content))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| classify(path, e))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map_err(|e| classify(path, e))?;
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("{path}: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut key_prefix = self.key(prefix);
        if !key_prefix.is_empty() && !key_prefix.ends_with('/') {
            key_prefix.push('/');
        }

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&key_prefix)
            .delimiter("/")
            .into_paginator()
            .send();

        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify(prefix, e))?;
            names.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| key.strip_prefix(key_prefix.as_str()))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(names)
    }

    async fn move_object(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        if self.exists(dst).await? {
            return Err(StorageError::Conflict(dst.to_string()));
        }

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(encode_copy_source(&self.bucket, &self.key(src)))
            .key(self.key(dst))
            .send()
            .await
            .map_err(|e| classify(src, e))?;

        if let Err(e) = self.delete(src).await {
            tracing::error!(src, dst, error = %e, "Copied object but could not remove the source");
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        if !self.exists(path).await? {
            return Err(StorageError::NotFound(path.to_string()));
        }
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| classify(path, e))
    }
}
