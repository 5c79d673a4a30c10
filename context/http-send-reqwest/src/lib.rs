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

//! Reqwest-based HTTP transport for cosync.
//!
//! `ReqwestHttpSend` implements [`HttpSend`] on top of a [`reqwest::Client`].
//! Every signed upload and delete leaves the process through it.
//!
//! ## Example
//!
//! ```no_run
//! use cosync_core::Context;
//! use cosync_http_send_reqwest::ReqwestHttpSend;
//! use std::time::Duration;
//!
//! let client = reqwest::Client::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));
//! ```
//!
//! Timeouts are a property of the client; cosync adds none of its own.

use async_trait::async_trait;
use bytes::Bytes;
use cosync_core::{Error, HttpSend, Result};
use http_body_util::BodyExt;
use reqwest::{Client, Request};

/// HttpSend implementation backed by reqwest.
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to convert request").with_source(e))?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::network(format!("failed to send request: {e}")).with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::network("failed to read response body").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
