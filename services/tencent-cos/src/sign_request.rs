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

use crate::constants::{KEY_TIME_WINDOW, TENCENT_URI_ENCODE_SET};
use crate::Credential;
use async_trait::async_trait;
use cosync_core::hash::{hex_hmac_sha1, hex_sha1};
use cosync_core::time::{now, DateTime};
use cosync_core::{Context, Error, Result, SignRequest, SigningRequest};
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::HeaderValue;
use log::debug;
use percent_encoding::utf8_percent_encode;

/// RequestSigner that implements Tencent COS signing.
///
/// - [Tencent COS Signature](https://cloud.tencent.com/document/product/436/7778)
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for Tencent COS.
    pub fn new() -> Self {
        Self { time: None }
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
        _ctx: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };

        let now = self.time.unwrap_or_else(now);
        let mut signing_req = SigningRequest::build(req)?;

        let authorization = build_authorization(&signing_req, cred, now)?;
        signing_req.headers.insert(AUTHORIZATION, {
            let mut value: HeaderValue = authorization.parse()?;
            value.set_sensitive(true);
            value
        });

        signing_req.apply(req)
    }
}

/// `{start};{end}` in unix seconds, end is start plus [`KEY_TIME_WINDOW`].
fn key_time(now: DateTime) -> Result<String> {
    let window = chrono::TimeDelta::from_std(KEY_TIME_WINDOW)
        .map_err(|e| Error::request_invalid("invalid key time window").with_source(e))?;
    Ok(format!("{};{}", now.timestamp(), (now + window).timestamp()))
}

fn build_authorization(req: &SigningRequest, cred: &Credential, now: DateTime) -> Result<String> {
    let key_time = key_time(now)?;
    let sign_key = hex_hmac_sha1(cred.secret_key.as_bytes(), key_time.as_bytes());

    let mut params = req
        .query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(&k.to_lowercase(), &TENCENT_URI_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &TENCENT_URI_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    params.sort();

    let param_list = params
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let param_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    debug!("param string: {param_string}");

    // Only host is signed. The header list and the header string are both
    // rendered from this vector.
    let headers = vec![(
        "host".to_string(),
        utf8_percent_encode(req.authority.as_str(), &TENCENT_URI_ENCODE_SET).to_string(),
    )];

    let header_list = headers
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let header_string = headers
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    debug!("header string: {header_string}");

    let mut http_string = String::new();
    http_string.push_str(&req.method.as_str().to_ascii_lowercase());
    http_string.push('\n');
    http_string.push_str(&req.path_percent_decoded());
    http_string.push('\n');
    http_string.push_str(&param_string);
    http_string.push('\n');
    http_string.push_str(&header_string);
    http_string.push('\n');
    debug!("http string: {http_string:?}");

    let mut string_to_sign = String::new();
    string_to_sign.push_str("sha1");
    string_to_sign.push('\n');
    string_to_sign.push_str(&key_time);
    string_to_sign.push('\n');
    string_to_sign.push_str(&hex_sha1(http_string.as_bytes()));
    string_to_sign.push('\n');
    debug!("string to sign: {string_to_sign:?}");

    let signature = hex_hmac_sha1(sign_key.as_bytes(), string_to_sign.as_bytes());

    Ok(format!(
        "q-sign-algorithm=sha1&q-ak={}&q-sign-time={key_time}&q-key-time={key_time}&q-header-list={header_list}&q-url-param-list={param_list}&q-signature={signature}",
        cred.secret_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const HOST: &str = "https://b.cos.ap-guangzhou.myqcloud.com";

    fn credential() -> Credential {
        Credential {
            secret_id: "AKIDexample".to_string(),
            secret_key: "SECRETexample".to_string(),
        }
    }

    fn signing_time() -> DateTime {
        Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
    }

    async fn sign(method: http::Method, path: &str) -> Parts {
        let mut parts = http::Request::builder()
            .method(method)
            .uri(format!("{HOST}{path}"))
            .header("content-type", "text/plain")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        RequestSigner::new()
            .with_time(signing_time())
            .sign_request(&Context::new(), &mut parts, Some(&credential()))
            .await
            .unwrap();
        parts
    }

    #[test_case(http::Method::PUT, "/test.txt", "fc3ea2a59988aa71277b99de6fbd5e9b5cba7cfd"; "put")]
    #[test_case(http::Method::DELETE, "/test.txt", "3dbc1ccf842f50967d0d4b6e80e066b81714f7e9"; "delete")]
    #[test_case(http::Method::PUT, "/images/%E5%9B%BE.png", "598b49392452c637eb26197c9a01af356268e143"; "non ascii key")]
    #[tokio::test]
    async fn test_sign(method: http::Method, path: &str, signature: &str) {
        let parts = sign(method, path).await;

        assert_eq!(
            parts.headers[AUTHORIZATION].to_str().unwrap(),
            format!(
                "q-sign-algorithm=sha1&q-ak=AKIDexample&q-sign-time=1709596800;1709600400&q-key-time=1709596800;1709600400&q-header-list=host&q-url-param-list=&q-signature={signature}"
            )
        );
        assert!(parts.headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_key_time_window_is_fixed() {
        let past = Utc.with_ymd_and_hms(2001, 9, 9, 1, 46, 40).unwrap();
        assert_eq!(key_time(past).unwrap(), "1000000000;1000003600");
        assert_eq!(key_time(signing_time()).unwrap(), "1709596800;1709600400");
    }

    #[tokio::test]
    async fn test_sign_is_deterministic() {
        let a = sign(http::Method::PUT, "/notes/a.md").await;
        let b = sign(http::Method::PUT, "/notes/a.md").await;
        assert_eq!(a.headers[AUTHORIZATION], b.headers[AUTHORIZATION]);

        let c = sign(http::Method::PUT, "/notes/b.md").await;
        assert_ne!(a.headers[AUTHORIZATION], c.headers[AUTHORIZATION]);
    }

    #[test]
    fn test_query_params_are_listed() {
        let (mut parts, _) = http::Request::get(format!("{HOST}/?prefix=images/&max-keys=10"))
            .body(())
            .unwrap()
            .into_parts();
        let req = SigningRequest::build(&mut parts).unwrap();

        let auth = build_authorization(&req, &credential(), signing_time()).unwrap();
        assert!(auth.contains("&q-header-list=host&q-url-param-list=max-keys;prefix&"));
    }
}
