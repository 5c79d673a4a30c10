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

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

use cosync_core::utils::Redact;
use cosync_core::{Context, Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::StorageClient;

/// Env value for the provider name: `aliyun`, `tencent`, `aws` or `cloudflare`.
pub const COSYNC_PROVIDER: &str = "COSYNC_PROVIDER";
pub const COSYNC_ACCESS_KEY_ID: &str = "COSYNC_ACCESS_KEY_ID";
pub const COSYNC_ACCESS_KEY_SECRET: &str = "COSYNC_ACCESS_KEY_SECRET";
pub const COSYNC_BUCKET: &str = "COSYNC_BUCKET";
pub const COSYNC_REGION: &str = "COSYNC_REGION";
/// Only read for Cloudflare R2.
pub const COSYNC_ENDPOINT: &str = "COSYNC_ENDPOINT";
pub const COSYNC_CDN_BASE_URL: &str = "COSYNC_CDN_BASE_URL";
pub const COSYNC_IMAGE_UPLOAD_PATH: &str = "COSYNC_IMAGE_UPLOAD_PATH";

/// Object keys keep `/` as the separator, everything else outside the
/// unreserved set is percent encoded.
static OBJECT_KEY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The storage providers cosync can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Aliyun OSS
    Aliyun,
    /// Tencent COS
    Tencent,
    /// AWS S3
    Aws,
    /// Cloudflare R2
    Cloudflare,
}

impl ProviderKind {
    /// The name used in settings and env.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Aliyun => "aliyun",
            ProviderKind::Tencent => "tencent",
            ProviderKind::Aws => "aws",
            ProviderKind::Cloudflare => "cloudflare",
        }
    }

    /// Human readable product name, used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Aliyun => "Aliyun OSS",
            ProviderKind::Tencent => "Tencent COS",
            ProviderKind::Aws => "AWS S3",
            ProviderKind::Cloudflare => "Cloudflare R2",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aliyun" => Ok(ProviderKind::Aliyun),
            "tencent" => Ok(ProviderKind::Tencent),
            "aws" => Ok(ProviderKind::Aws),
            "cloudflare" => Ok(ProviderKind::Cloudflare),
            _ => Err(Error::unsupported_provider(s.trim())),
        }
    }
}

/// Bucket settings shared by Aliyun OSS, Tencent COS and AWS S3.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Access key id (`SecretId` for Tencent).
    pub access_key_id: String,
    /// Access key secret (`SecretKey` for Tencent).
    pub access_key_secret: String,
    /// Bucket name, Tencent buckets carry the appid suffix.
    pub bucket: String,
    /// Region such as `cn-hangzhou`, `ap-guangzhou` or `us-east-1`.
    pub region: String,
    /// Public base url that replaces the provider url in upload results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_base_url: Option<String>,
}

impl Debug for BucketConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketConfig")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("access_key_secret", &Redact::from(&self.access_key_secret))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("cdn_base_url", &self.cdn_base_url)
            .finish()
    }
}

/// Cloudflare R2 settings.
///
/// R2 always signs with region `auto` and is addressed through `endpoint`,
/// for example `https://<account>.r2.cloudflarestorage.com/<bucket>`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct R2Config {
    /// R2 API token access key id.
    pub access_key_id: String,
    /// R2 API token secret access key.
    pub access_key_secret: String,
    /// Bucket name.
    pub bucket: String,
    /// Base url objects are uploaded under.
    pub endpoint: String,
    /// Public base url that replaces the endpoint url in upload results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_base_url: Option<String>,
}

impl Debug for R2Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("R2Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("access_key_secret", &Redact::from(&self.access_key_secret))
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("cdn_base_url", &self.cdn_base_url)
            .finish()
    }
}

/// A configured storage provider together with its credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum Provider {
    /// Aliyun OSS
    Aliyun(BucketConfig),
    /// Tencent COS
    Tencent(BucketConfig),
    /// AWS S3
    Aws(BucketConfig),
    /// Cloudflare R2
    Cloudflare(R2Config),
}

impl Provider {
    /// Which provider this is.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Aliyun(_) => ProviderKind::Aliyun,
            Provider::Tencent(_) => ProviderKind::Tencent,
            Provider::Aws(_) => ProviderKind::Aws,
            Provider::Cloudflare(_) => ProviderKind::Cloudflare,
        }
    }

    /// Load the provider from `COSYNC_*` env.
    ///
    /// Keys fall back to each vendor's own env names (for example
    /// `TENCENTCLOUD_SECRET_ID` or `AWS_ACCESS_KEY_ID`). Returns `None` when
    /// `COSYNC_PROVIDER` is not set.
    pub fn from_env(ctx: &Context) -> Result<Option<Self>> {
        let Some(name) = ctx.env_var_non_empty(COSYNC_PROVIDER) else {
            return Ok(None);
        };
        let kind: ProviderKind = name.parse()?;

        let access_key_id = ctx.env_var_non_empty(COSYNC_ACCESS_KEY_ID);
        let access_key_secret = ctx.env_var_non_empty(COSYNC_ACCESS_KEY_SECRET);
        let bucket = ctx.env_var(COSYNC_BUCKET).unwrap_or_default();
        let region = ctx.env_var_non_empty(COSYNC_REGION);
        let cdn_base_url = ctx.env_var_non_empty(COSYNC_CDN_BASE_URL);

        let provider = match kind {
            ProviderKind::Aliyun => {
                let cfg = cosync_aliyun_oss::Config {
                    access_key_id,
                    access_key_secret,
                }
                .from_env(ctx);
                Provider::Aliyun(BucketConfig {
                    access_key_id: cfg.access_key_id.unwrap_or_default(),
                    access_key_secret: cfg.access_key_secret.unwrap_or_default(),
                    bucket,
                    region: region.unwrap_or_default(),
                    cdn_base_url,
                })
            }
            ProviderKind::Tencent => {
                let cfg = cosync_tencent_cos::Config {
                    secret_id: access_key_id,
                    secret_key: access_key_secret,
                }
                .from_env(ctx);
                Provider::Tencent(BucketConfig {
                    access_key_id: cfg.secret_id.unwrap_or_default(),
                    access_key_secret: cfg.secret_key.unwrap_or_default(),
                    bucket,
                    region: region.unwrap_or_default(),
                    cdn_base_url,
                })
            }
            ProviderKind::Aws => {
                let cfg = cosync_aws_v4::Config {
                    access_key_id,
                    secret_access_key: access_key_secret,
                    region,
                }
                .from_env(ctx);
                Provider::Aws(BucketConfig {
                    access_key_id: cfg.access_key_id.unwrap_or_default(),
                    access_key_secret: cfg.secret_access_key.unwrap_or_default(),
                    bucket,
                    region: cfg.region.unwrap_or_default(),
                    cdn_base_url,
                })
            }
            ProviderKind::Cloudflare => {
                let cfg = cosync_aws_v4::Config {
                    access_key_id,
                    secret_access_key: access_key_secret,
                    region: Some(cosync_aws_v4::R2_REGION.to_string()),
                }
                .from_env(ctx);
                Provider::Cloudflare(R2Config {
                    access_key_id: cfg.access_key_id.unwrap_or_default(),
                    access_key_secret: cfg.secret_access_key.unwrap_or_default(),
                    bucket,
                    endpoint: ctx.env_var(COSYNC_ENDPOINT).unwrap_or_default(),
                    cdn_base_url,
                })
            }
        };

        Ok(Some(provider))
    }

    /// Check that every required field is filled.
    ///
    /// Region is required for every provider except R2, which needs its
    /// endpoint instead. Runs before any request is built.
    pub fn validate(&self) -> Result<()> {
        let label = self.kind().label();
        let required: Vec<(&str, &str)> = match self {
            Provider::Aliyun(c) | Provider::Tencent(c) | Provider::Aws(c) => vec![
                ("access_key_id", c.access_key_id.as_str()),
                ("access_key_secret", c.access_key_secret.as_str()),
                ("bucket", c.bucket.as_str()),
                ("region", c.region.as_str()),
            ],
            Provider::Cloudflare(c) => vec![
                ("access_key_id", c.access_key_id.as_str()),
                ("access_key_secret", c.access_key_secret.as_str()),
                ("bucket", c.bucket.as_str()),
                ("endpoint", c.endpoint.as_str()),
            ],
        };

        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((field, _)) => Err(Error::config_incomplete(format!(
                "{label} configuration is incomplete: {field} is required"
            ))),
            None => Ok(()),
        }
    }

    /// The provider url of an object.
    ///
    /// The object key is percent encoded with `/` kept as is.
    pub fn object_url(&self, remote_path: &str) -> String {
        let key = utf8_percent_encode(remote_path.trim_start_matches('/'), &OBJECT_KEY_ENCODE_SET);
        match self {
            Provider::Aliyun(c) => {
                format!("https://{}.oss-{}.aliyuncs.com/{key}", c.bucket, c.region)
            }
            Provider::Tencent(c) => {
                format!("https://{}.cos.{}.myqcloud.com/{key}", c.bucket, c.region)
            }
            Provider::Aws(c) => {
                format!("https://{}.s3.{}.amazonaws.com/{key}", c.bucket, c.region)
            }
            Provider::Cloudflare(c) => format!("{}/{key}", c.endpoint.trim_end_matches('/')),
        }
    }

    /// The configured CDN base, if any.
    pub fn cdn_base_url(&self) -> Option<&str> {
        let cdn = match self {
            Provider::Aliyun(c) | Provider::Tencent(c) | Provider::Aws(c) => &c.cdn_base_url,
            Provider::Cloudflare(c) => &c.cdn_base_url,
        };
        cdn.as_deref()
            .map(|v| v.trim().trim_end_matches('/'))
            .filter(|v| !v.is_empty())
    }

    /// The url handed back to callers: `{cdn}/{remote_path}` when a CDN is
    /// configured, the provider url otherwise.
    pub fn public_url(&self, remote_path: &str) -> String {
        match self.cdn_base_url() {
            Some(cdn) => format!("{cdn}/{}", remote_path.trim_start_matches('/')),
            None => self.object_url(remote_path),
        }
    }
}

/// Cache related settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// How long a cache entry stays valid, in seconds.
    pub max_age_secs: u64,
    /// Quiet period before a modified file is re-hashed, in milliseconds.
    pub quiet_period_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_age_secs: 300,
            quiet_period_ms: 2000,
        }
    }
}

/// Settings for cosync, usually loaded from a TOML file.
///
/// ```toml
/// image_upload_path = "images/{YYYY}/{MM}"
///
/// [storage]
/// provider = "tencent"
/// access_key_id = "AKIDexample"
/// access_key_secret = "SECRETexample"
/// bucket = "examplebucket-1250000000"
/// region = "ap-guangzhou"
///
/// [cache]
/// max_age_secs = 600
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Template used to place pasted images, see [`crate::path::resolve`].
    pub image_upload_path: String,
    /// The storage provider, absent until configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Provider>,
    /// Cache settings.
    pub cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_upload_path: "images/{YYYY}/{MM}/{DD}".to_string(),
            storage: None,
            cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: toml::Table = content
            .parse()
            .map_err(|e| Error::unexpected("failed to parse settings").with_source(e))?;

        // Report unknown or missing providers with a precise error instead of
        // a generic deserialize failure.
        if let Some(storage) = table.get("storage") {
            match storage.get("provider").and_then(|v| v.as_str()) {
                Some(name) => {
                    name.parse::<ProviderKind>()?;
                }
                None => return Err(Error::config_incomplete("storage.provider is required")),
            }
        }

        toml::from_str(content)
            .map_err(|e| Error::unexpected("failed to deserialize settings").with_source(e))
    }

    /// Load settings from a TOML file.
    pub async fn load(ctx: &Context, path: &str) -> Result<Self> {
        let content = ctx.file_read_as_string(path).await?;
        Self::from_toml(&content)
    }

    /// Fill the unset parts from `COSYNC_*` env.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if self.storage.is_none() {
            self.storage = Provider::from_env(ctx)?;
        }
        if let Some(v) = ctx.env_var_non_empty(COSYNC_IMAGE_UPLOAD_PATH) {
            self.image_upload_path = v;
        }
        Ok(self)
    }

    /// How long a cache entry stays valid.
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache.max_age_secs)
    }

    /// Quiet period of the modification watcher.
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.cache.quiet_period_ms)
    }

    /// Build a storage client for the configured provider.
    pub fn client(&self, ctx: Context) -> Result<StorageClient> {
        let provider = self
            .storage
            .clone()
            .ok_or_else(|| Error::config_incomplete("no storage provider configured"))?;
        provider.validate()?;
        Ok(StorageClient::new(ctx, provider))
    }
}
