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

//! AWS Signature Version 4 for cosync.
//!
//! Both AWS S3 and Cloudflare R2 speak SigV4. R2 is addressed by its account
//! endpoint and always signs with the region `auto`:
//!
//! ```no_run
//! use cosync_aws_v4::{RequestSigner, StaticCredentialProvider, R2_REGION};
//! use cosync_core::{Context, Signer};
//!
//! # async fn example() -> cosync_core::Result<()> {
//! let loader = StaticCredentialProvider::new("access_key_id", "secret_access_key");
//! let signer = Signer::new(Context::new(), loader, RequestSigner::new("s3", R2_REGION));
//!
//! let mut req = http::Request::put("https://0123456789abcdef.r2.cloudflarestorage.com/bucket/a.png")
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
//! The payload is never hashed: every request carries
//! `x-amz-content-sha256: UNSIGNED-PAYLOAD`, and only `host`,
//! `x-amz-content-sha256` and `x-amz-date` are signed.

mod constants;
pub use constants::R2_REGION;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
