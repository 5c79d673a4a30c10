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

//! Upload files to object storage with hand-rolled request signing.
//!
//! cosync talks to Aliyun OSS, Tencent COS, AWS S3 and Cloudflare R2. Each
//! provider signs with its own algorithm from the `cosync-*` service crates;
//! this crate ties them together behind [`StorageClient`].
//!
//! ## Example
//!
//! ```no_run
//! use cosync::{default_context, Settings, UploadFile};
//!
//! # async fn example() -> cosync::Result<()> {
//! let ctx = default_context();
//! let settings = Settings::load(&ctx, "cosync.toml").await?;
//! let client = settings.client(ctx)?;
//!
//! let file = UploadFile::new("a.png", "image/png", std::fs::read("a.png")?);
//! let result = client.upload(&file, "images/a.png").await;
//! println!("{}: {:?}", result.message, result.url);
//! # Ok(())
//! # }
//! ```
//!
//! Besides uploading, the crate keeps a [`cache::FileStateCache`] of what
//! has been synced, debounces local edits with a [`ModificationWatcher`]
//! and classifies GitHub API failures in [`github`].

pub use cosync_core::{Context, Error, ErrorKind, Result};

pub mod cache;
pub mod github;
pub mod path;

mod client;
pub use client::{BulkUploadReport, StorageClient, UploadFile, UploadResult};
mod config;
pub use config::{
    BucketConfig, CacheSettings, Provider, ProviderKind, R2Config, Settings, COSYNC_ACCESS_KEY_ID,
    COSYNC_ACCESS_KEY_SECRET, COSYNC_BUCKET, COSYNC_CDN_BASE_URL, COSYNC_ENDPOINT,
    COSYNC_IMAGE_UPLOAD_PATH, COSYNC_PROVIDER, COSYNC_REGION,
};
mod watcher;
pub use watcher::{ModificationWatcher, DEFAULT_QUIET_PERIOD};

use cosync_core::OsEnv;
use cosync_file_read_tokio::TokioFileRead;
use cosync_http_send_reqwest::ReqwestHttpSend;

/// A [`Context`] wired to tokio file reads, reqwest and the process env.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
}
