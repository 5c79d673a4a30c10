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

//! Aliyun OSS signing for cosync.
//!
//! OSS accepts a simple HMAC-SHA1 header signature: the method, an empty
//! Content-MD5 slot, the content type, the request date and the canonical
//! resource `/{bucket}/{object}` are joined by newlines, signed with the
//! access key secret and sent as `Authorization: OSS {id}:{signature}`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cosync_aliyun_oss::{RequestSigner, StaticCredentialProvider};
//! use cosync_core::{Context, Signer};
//! use cosync_http_send_reqwest::ReqwestHttpSend;
//!
//! # async fn example() -> cosync_core::Result<()> {
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//! let loader = StaticCredentialProvider::new("access_key_id", "access_key_secret");
//! let signer = Signer::new(ctx, loader, RequestSigner::new("examplebucket"));
//!
//! let mut req = http::Request::put("https://examplebucket.oss-cn-hangzhou.aliyuncs.com/images/a.png")
//!     .header("content-type", "image/png")
//!     .body(())
//!     .unwrap()
//!     .into_parts()
//!     .0;
//! signer.sign(&mut req).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Credential Sources
//!
//! [`Config::from_env`] fills unset keys from:
//!
//! ```bash
//! export ALIBABA_CLOUD_ACCESS_KEY_ID=your-access-key-id
//! export ALIBABA_CLOUD_ACCESS_KEY_SECRET=your-access-key-secret
//! ```

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
