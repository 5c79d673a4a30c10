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

use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use cosync_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use cosync_core::time::{format_date, format_iso8601, now, DateTime};
use cosync_core::{Context, Error, Result, SignRequest, SigningRequest};
use http::request::Parts;
use http::{header, HeaderName, HeaderValue};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::fmt::Write;

/// Headers covered by the signature, already in canonical order.
const SIGNED_HEADERS: [&str; 3] = ["host", X_AMZ_CONTENT_SHA_256, X_AMZ_DATE];

/// RequestSigner that implements AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug)]
pub struct RequestSigner {
    service: String,
    region: String,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new builder for AWS V4 signer.
    ///
    /// Use region [`R2_REGION`](crate::R2_REGION) for Cloudflare R2.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),

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

    fn scope(&self, now: DateTime) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            format_date(now),
            self.region,
            self.service
        )
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };

        let now = self.time.unwrap_or_else(now);
        let mut signed_req = SigningRequest::build(req)?;

        canonicalize_header(&mut signed_req, now)?;
        canonicalize_query(&mut signed_req);

        let creq = canonical_request_string(&signed_req)?;
        let encoded_req = hex_sha256(creq.as_bytes());

        // Scope: "20240305/<region>/<service>/aws4_request"
        let scope = self.scope(now);
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20240305T000000Z
        // 20240305/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "AWS4-HMAC-SHA256")?;
            writeln!(f, "{}", format_iso8601(now))?;
            writeln!(f, "{}", &scope)?;
            write!(f, "{}", &encoded_req)?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let mut authorization = HeaderValue::from_str(&format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id,
            scope,
            SIGNED_HEADERS.join(";"),
            signature
        ))?;
        authorization.set_sensitive(true);
        signed_req
            .headers
            .insert(header::AUTHORIZATION, authorization);

        signed_req.apply(req)
    }
}

fn canonical_request_string(ctx: &SigningRequest) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    writeln!(f, "{}", ctx.method)?;
    // Insert encoded path
    let path = percent_decode_str(&ctx.path)
        .decode_utf8()
        .map_err(|e| Error::request_invalid("request path is not valid utf-8").with_source(e))?;
    writeln!(f, "{}", utf8_percent_encode(&path, &AWS_URI_ENCODE_SET))?;
    // Insert query
    writeln!(
        f,
        "{}",
        ctx.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    )?;
    // Insert signed headers
    for name in SIGNED_HEADERS {
        writeln!(
            f,
            "{}:{}",
            name,
            ctx.header_get_or_default(&HeaderName::from_static(name))?
        )?;
    }
    writeln!(f)?;
    writeln!(f, "{}", SIGNED_HEADERS.join(";"))?;
    write!(
        f,
        "{}",
        ctx.header_get_or_default(&HeaderName::from_static(X_AMZ_CONTENT_SHA_256))?
    )?;

    Ok(f)
}

fn canonicalize_header(ctx: &mut SigningRequest, now: DateTime) -> Result<()> {
    for (_, value) in ctx.headers.iter_mut() {
        SigningRequest::header_value_normalize(value)
    }

    // Insert HOST header if not present.
    if ctx.headers.get(header::HOST).is_none() {
        ctx.headers
            .insert(header::HOST, ctx.authority.as_str().parse()?);
    }

    // The date always reflects this signature.
    ctx.headers
        .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);
    ctx.headers.insert(
        X_AMZ_CONTENT_SHA_256,
        HeaderValue::from_static(UNSIGNED_PAYLOAD),
    );

    Ok(())
}

fn canonicalize_query(ctx: &mut SigningRequest) {
    if ctx.query.is_empty() {
        return;
    }

    // Sort by param name
    ctx.query.sort();

    ctx.query = ctx
        .query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn credential() -> Credential {
        Credential {
            access_key_id: "AKIDexample".to_string(),
            secret_access_key: "SECRETexample".to_string(),
        }
    }

    fn signing_time() -> DateTime {
        Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
    }

    async fn sign(region: &str, method: http::Method, url: &str) -> Parts {
        let mut parts = http::Request::builder()
            .method(method)
            .uri(url)
            .header("content-type", "text/plain")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        RequestSigner::new("s3", region)
            .with_time(signing_time())
            .sign_request(&Context::new(), &mut parts, Some(&credential()))
            .await
            .unwrap();
        parts
    }

    #[test_case(
        "us-east-1", http::Method::PUT, "https://b.s3.us-east-1.amazonaws.com/test.txt",
        "b37b433ae4cadb7c5a56e2f424cbe8b5ad57ec97566487479313d1e99dfb9302"; "s3 put"
    )]
    #[test_case(
        "us-east-1", http::Method::DELETE, "https://b.s3.us-east-1.amazonaws.com/test.txt",
        "9bf5927a6a76087c6079f5ddfba5f549ccf4f630f5dc8a06ecc0abec298ece3d"; "s3 delete"
    )]
    #[test_case(
        "auto", http::Method::PUT, "https://0123456789abcdef.r2.cloudflarestorage.com/b/test.txt",
        "0066cf521cf4decdbf17e7e9bcbed51267655b4b5020a9efff08c870506d921d"; "r2 put"
    )]
    #[test_case(
        "us-east-1", http::Method::PUT, "https://b.s3.us-east-1.amazonaws.com/images/%E5%9B%BE.png",
        "3dc4e2136cd1d95d57d69abf5e51b27d33501889e1ee6f25a19f9be2d01bec50"; "non ascii key"
    )]
    #[tokio::test]
    async fn test_sign(region: &str, method: http::Method, url: &str, signature: &str) {
        let parts = sign(region, method, url).await;

        assert_eq!(
            parts.headers[header::AUTHORIZATION].to_str().unwrap(),
            format!(
                "AWS4-HMAC-SHA256 Credential=AKIDexample/20240305/{region}/s3/aws4_request, SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature={signature}"
            )
        );
        assert!(parts.headers[header::AUTHORIZATION].is_sensitive());
        assert_eq!(parts.headers[X_AMZ_DATE], "20240305T000000Z");
        assert_eq!(parts.headers[X_AMZ_CONTENT_SHA_256], UNSIGNED_PAYLOAD);
        assert_eq!(parts.headers[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_canonical_request() {
        let (mut parts, _) = http::Request::put("https://b.s3.us-east-1.amazonaws.com/test.txt")
            .body(())
            .unwrap()
            .into_parts();
        let mut req = SigningRequest::build(&mut parts).unwrap();
        canonicalize_header(&mut req, signing_time()).unwrap();
        canonicalize_query(&mut req);

        assert_eq!(
            canonical_request_string(&req).unwrap(),
            "PUT\n/test.txt\n\nhost:b.s3.us-east-1.amazonaws.com\nx-amz-content-sha256:UNSIGNED-PAYLOAD\nx-amz-date:20240305T000000Z\n\nhost;x-amz-content-sha256;x-amz-date\nUNSIGNED-PAYLOAD"
        );
    }

    #[test]
    fn test_region_only_changes_scope() {
        let s3 = RequestSigner::new("s3", "us-east-1");
        let r2 = RequestSigner::new("s3", R2_REGION);

        assert_eq!(s3.scope(signing_time()), "20240305/us-east-1/s3/aws4_request");
        assert_eq!(r2.scope(signing_time()), "20240305/auto/s3/aws4_request");
        assert_ne!(
            generate_signing_key("SECRETexample", signing_time(), "us-east-1", "s3"),
            generate_signing_key("SECRETexample", signing_time(), R2_REGION, "s3"),
        );
    }

    #[test]
    fn test_query_is_sorted_and_encoded() {
        let (mut parts, _) =
            http::Request::get("https://b.s3.us-east-1.amazonaws.com/?prefix=a/b&list-type=2")
                .body(())
                .unwrap()
                .into_parts();
        let mut req = SigningRequest::build(&mut parts).unwrap();
        canonicalize_query(&mut req);

        assert_eq!(
            req.query,
            vec![
                ("list-type".to_string(), "2".to_string()),
                ("prefix".to_string(), "a%2Fb".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_sign_without_credential_is_noop() {
        let mut parts = http::Request::put("https://b.s3.us-east-1.amazonaws.com/test.txt")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        RequestSigner::new("s3", "us-east-1")
            .sign_request(&Context::new(), &mut parts, None)
            .await
            .unwrap();
        assert!(parts.headers.get(header::AUTHORIZATION).is_none());
    }
}
