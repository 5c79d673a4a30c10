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

use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::{Arc, Mutex};

/// Signer is the main struct used to sign the request.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    loader: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<Mutex<Option<K>>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            loader: Arc::new(loader),
            builder: Arc::new(builder),
            credential: Arc::new(Mutex::new(None)),
        }
    }

    /// The context this signer was built with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Sign the request.
    ///
    /// The credential is loaded on first use and reused until it is no
    /// longer valid. Signing fails with a credential error when the loader
    /// has nothing valid to offer.
    pub async fn sign(&self, req: &mut http::request::Parts) -> Result<()> {
        let credential = self.credential.lock().expect("lock poisoned").clone();
        let credential = if credential.is_valid() {
            credential
        } else {
            let loaded = self.loader.provide_credential(&self.ctx).await?;
            *self.credential.lock().expect("lock poisoned") = loaded.clone();
            loaded
        };

        if !credential.is_valid() {
            return Err(Error::credential_invalid(
                "no valid credential available for signing",
            ));
        }

        self.builder
            .sign_request(&self.ctx, req, credential.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use async_trait::async_trait;
    use http::request::Parts;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug)]
    struct TestCredential(String);

    impl SigningCredential for TestCredential {
        fn is_valid(&self) -> bool {
            !self.0.is_empty()
        }
    }

    #[derive(Debug, Default)]
    struct CountingLoader {
        secret: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProvideCredential for CountingLoader {
        type Credential = TestCredential;

        async fn provide_credential(&self, _: &Context) -> Result<Option<TestCredential>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(TestCredential(self.secret.clone())))
        }
    }

    #[derive(Debug)]
    struct HeaderSigner;

    #[async_trait]
    impl SignRequest for HeaderSigner {
        type Credential = TestCredential;

        async fn sign_request(
            &self,
            _: &Context,
            req: &mut Parts,
            credential: Option<&TestCredential>,
        ) -> Result<()> {
            let cred = credential.ok_or_else(|| Error::credential_invalid("missing"))?;
            req.headers
                .insert(http::header::AUTHORIZATION, cred.0.parse()?);
            Ok(())
        }
    }

    fn parts() -> Parts {
        http::Request::put("https://bucket.example.com/a.txt")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_credential_is_loaded_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            secret: "token".to_string(),
            calls: calls.clone(),
        };
        let signer = Signer::new(Context::new(), loader, HeaderSigner);

        let mut req = parts();
        signer.sign(&mut req).await.unwrap();
        signer.sign(&mut req).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(req.headers[http::header::AUTHORIZATION], "token");
    }

    #[tokio::test]
    async fn test_invalid_credential_is_rejected() {
        let loader = CountingLoader::default();
        let signer = Signer::new(Context::new(), loader, HeaderSigner);

        let mut req = parts();
        let err = signer.sign(&mut req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
        assert!(req.headers.get(http::header::AUTHORIZATION).is_none());
    }
}
