// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use bytes::Bytes;
use cosync_core::time::{now_millis, DateTime};
use cosync_core::{Context, Error, Result, Signer};
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{Method, Request};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::Provider;

/// A file to upload, held in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name.
    pub name: String,
    /// Sent as `Content-Type`.
    pub content_type: String,
    /// The whole body.
    pub content: Bytes,
}

impl UploadFile {
    /// Create a new upload file.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// Outcome of an upload, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    /// Public url of the object, CDN based when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Object key the file was stored under.
    #[serde(rename = "key", skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

impl UploadResult {
    fn succeeded(message: impl Into<String>, url: Option<String>, object_key: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            url,
            object_key,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            url: None,
            object_key: None,
        }
    }
}

/// Counters of [`StorageClient::upload_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkUploadReport {
    pub succeeded: usize,
    pub failed: usize,
    /// One result per item, in order.
    pub results: Vec<UploadResult>,
}

/// StorageClient uploads to and deletes from the configured provider.
///
/// Requests are signed with the provider's own algorithm and sent through
/// the [`Context`]'s [`HttpSend`](cosync_core::HttpSend).
#[derive(Debug, Clone)]
pub struct StorageClient {
    ctx: Context,
    provider: Provider,
    time: Option<DateTime>,
}

impl StorageClient {
    /// Create a client for `provider`.
    pub fn new(ctx: Context, provider: Provider) -> Self {
        Self {
            ctx,
            provider,
            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// The configured provider.
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn sign(&self, parts: &mut Parts) -> Result<()> {
        let ctx = self.ctx.clone();
        match &self.provider {
            Provider::Aliyun(c) => {
                let mut builder = cosync_aliyun_oss::RequestSigner::new(&c.bucket);
                if let Some(time) = self.time {
                    builder = builder.with_time(time);
                }
                let loader = cosync_aliyun_oss::StaticCredentialProvider::new(
                    &c.access_key_id,
                    &c.access_key_secret,
                );
                Signer::new(ctx, loader, builder).sign(parts).await
            }
            Provider::Tencent(c) => {
                let mut builder = cosync_tencent_cos::RequestSigner::new();
                if let Some(time) = self.time {
                    builder = builder.with_time(time);
                }
                let loader = cosync_tencent_cos::StaticCredentialProvider::new(
                    &c.access_key_id,
                    &c.access_key_secret,
                );
                Signer::new(ctx, loader, builder).sign(parts).await
            }
            Provider::Aws(c) => {
                let mut builder = cosync_aws_v4::RequestSigner::new("s3", &c.region);
                if let Some(time) = self.time {
                    builder = builder.with_time(time);
                }
                let loader = cosync_aws_v4::StaticCredentialProvider::new(
                    &c.access_key_id,
                    &c.access_key_secret,
                );
                Signer::new(ctx, loader, builder).sign(parts).await
            }
            Provider::Cloudflare(c) => {
                let mut builder =
                    cosync_aws_v4::RequestSigner::new("s3", cosync_aws_v4::R2_REGION);
                if let Some(time) = self.time {
                    builder = builder.with_time(time);
                }
                let loader = cosync_aws_v4::StaticCredentialProvider::new(
                    &c.access_key_id,
                    &c.access_key_secret,
                );
                Signer::new(ctx, loader, builder).sign(parts).await
            }
        }
    }

    /// Build and sign the request for `remote_path` without sending it.
    ///
    /// With a `file`, its content type and bytes become the header and body.
    pub async fn signed_request(
        &self,
        method: Method,
        remote_path: &str,
        file: Option<&UploadFile>,
    ) -> Result<Request<Bytes>> {
        self.provider.validate()?;

        let mut builder = Request::builder()
            .method(method)
            .uri(self.provider.object_url(remote_path));
        if let Some(file) = file {
            builder = builder.header(CONTENT_TYPE, file.content_type.as_str());
        }
        let body = file.map(|f| f.content.clone()).unwrap_or_default();

        let (mut parts, body) = builder.body(body)?.into_parts();
        self.sign(&mut parts).await?;
        Ok(Request::from_parts(parts, body))
    }

    /// Send a signed request, failing on non-2xx.
    async fn send(&self, req: Request<Bytes>) -> Result<()> {
        debug!("sending {} {}", req.method(), req.uri());
        let resp = self.ctx.http_send_as_string(req).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::http_status(status, resp.body()));
        }
        Ok(())
    }

    /// Upload `file` to `remote_path`.
    ///
    /// Every failure, including an incomplete configuration, is reported
    /// through the returned [`UploadResult`].
    pub async fn upload(&self, file: &UploadFile, remote_path: &str) -> UploadResult {
        let result: Result<()> = async {
            let req = self
                .signed_request(Method::PUT, remote_path, Some(file))
                .await?;
            self.send(req).await
        }
        .await;

        match result {
            Ok(()) => UploadResult::succeeded(
                "upload succeeded",
                Some(self.provider.public_url(remote_path)),
                Some(remote_path.to_string()),
            ),
            Err(err) => {
                warn!("upload of {remote_path} failed: {err}");
                UploadResult::failed(format!(
                    "{} upload failed: {err}",
                    self.provider.kind().label()
                ))
            }
        }
    }

    /// Delete the object at `remote_path`.
    pub async fn delete(&self, remote_path: &str) -> Result<()> {
        let req = self
            .signed_request(Method::DELETE, remote_path, None)
            .await?;
        self.send(req).await
    }

    /// Check that the configuration can authenticate and write.
    ///
    /// Uploads a small temporary object and deletes it again. A failed
    /// delete is logged and does not change the verdict.
    pub async fn test_connection(&self) -> UploadResult {
        let file = UploadFile::new("test.txt", "text/plain", Bytes::from_static(b"test"));
        let path = format!("test-{}.txt", now_millis());

        let result = self.upload(&file, &path).await;
        if !result.success {
            return result;
        }

        if let Err(err) = self.delete(&path).await {
            warn!("failed to delete connection test object {path}: {err}");
        }
        UploadResult::succeeded("connection test succeeded", None, None)
    }

    /// Upload every item in order, running to completion.
    pub async fn upload_all(
        &self,
        items: impl IntoIterator<Item = (UploadFile, String)>,
    ) -> BulkUploadReport {
        let mut report = BulkUploadReport::default();
        for (file, remote_path) in items {
            let result = self.upload(&file, &remote_path).await;
            if result.success {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.results.push(result);
        }
        report
    }
}
