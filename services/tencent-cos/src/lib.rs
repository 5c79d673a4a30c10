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

//! Tencent COS signing for cosync.
//!
//! COS v5 signs with a time-windowed key: `q-key-time` opens a one hour
//! window starting at the signing instant, the window is signed with the
//! secret key, and the result signs a digest of the canonical http string.
//! Only the `host` header takes part in the signature.
//!
//! ```no_run
//! use cosync_core::{Context, Signer};
//! use cosync_tencent_cos::{RequestSigner, StaticCredentialProvider};
//!
//! # async fn example() -> cosync_core::Result<()> {
//! let loader = StaticCredentialProvider::new("secret_id", "secret_key");
//! let signer = Signer::new(Context::new(), loader, RequestSigner::new());
//!
//! let mut req = http::Request::put("https://examplebucket-1250000000.cos.ap-guangzhou.myqcloud.com/test.txt")
//!     .body(())
//!     .unwrap()
//!     .into_parts()
//!     .0;
//! signer.sign(&mut req).await?;
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::KEY_TIME_WINDOW;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
