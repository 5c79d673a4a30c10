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

use crate::constants::{CONTENT_MD5, X_OSS_PREFIX};
use crate::credential::Credential;
use async_trait::async_trait;
use cosync_core::hash::base64_hmac_sha1;
use cosync_core::time::{format_http_date, now, DateTime};
use cosync_core::{Context, Result, SignRequest, SigningRequest};
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::HeaderName;
use http::HeaderValue;
use log::debug;
use std::fmt::Write;

/// RequestSigner for Aliyun OSS signature.
///
/// - [OSS Header Signature](https://help.aliyun.com/document_detail/31951.html)
#[derive(Debug)]
pub struct RequestSigner {
    bucket: String,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for the given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
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
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut http::request::Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };

        let date = format_http_date(self.time.unwrap_or_else(now));
        let mut signing_req = SigningRequest::build(req)?;

        let string_to_sign = self.build_string_to_sign(&signing_req, &date)?;
        debug!("calculated string to sign: {string_to_sign:?}");
        let signature =
            base64_hmac_sha1(cred.access_key_secret.as_bytes(), string_to_sign.as_bytes());

        signing_req.headers.insert(DATE, date.parse()?);

        let mut authorization: HeaderValue =
            format!("OSS {}:{}", cred.access_key_id, signature).parse()?;
        authorization.set_sensitive(true);
        signing_req.headers.insert(AUTHORIZATION, authorization);

        signing_req.apply(req)
    }
}

impl RequestSigner {
    /// ```text
    /// PUT
    /// {content-md5}
    /// {content-type}
    /// {date}
    /// {x-oss-* headers, one per line}
    /// /{bucket}/{object}
    /// ```
    fn build_string_to_sign(&self, req: &SigningRequest, date: &str) -> Result<String> {
        let mut s = String::new();
        writeln!(&mut s, "{}", req.method.as_str())?;
        writeln!(
            &mut s,
            "{}",
            req.header_get_or_default(&HeaderName::from_static(CONTENT_MD5))?
        )?;
        writeln!(&mut s, "{}", req.header_get_or_default(&CONTENT_TYPE)?)?;
        writeln!(&mut s, "{date}")?;

        let oss_headers = canonicalize_oss_headers(req)?;
        if !oss_headers.is_empty() {
            writeln!(&mut s, "{oss_headers}")?;
        }

        write!(&mut s, "/{}{}", self.bucket, req.path_percent_decoded())?;

        Ok(s)
    }
}

fn canonicalize_oss_headers(req: &SigningRequest) -> Result<String> {
    let mut headers = Vec::new();
    for (name, value) in req.headers.iter() {
        if name.as_str().starts_with(X_OSS_PREFIX) {
            headers.push((name.as_str().to_string(), value.to_str()?.trim().to_string()));
        }
    }

    Ok(SigningRequest::header_to_string(headers, ":", "\n"))
}
