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

use crate::Credential;
use async_trait::async_trait;
use cosync_core::{Context, ProvideCredential, Result, SigningCredential};
use log::debug;

/// StaticCredentialProvider hands out a fixed `SecretId` / `SecretKey`.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create a provider for `secret_id` / `secret_key`.
    pub fn new(secret_id: &str, secret_key: &str) -> Self {
        Self {
            credential: Credential {
                secret_id: secret_id.trim().to_string(),
                secret_key: secret_key.trim().to_string(),
            },
        }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        if !self.credential.is_valid() {
            debug!("static cos key pair is incomplete, skipped");
            return Ok(None);
        }
        Ok(Some(self.credential.clone()))
    }
}
