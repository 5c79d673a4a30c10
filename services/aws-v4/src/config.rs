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
use cosync_core::utils::Redact;
use cosync_core::Context;
use std::fmt::{Debug, Formatter};

/// Config for AWS S3 compatible services.
#[derive(Clone, Default)]
pub struct Config {
    /// Access key id, falls back to env value [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// Secret access key, falls back to env value [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// Signing region, falls back to env value [`AWS_REGION`]
    pub region: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("region", &self.region)
            .finish()
    }
}

impl Config {
    /// Fill the unset fields from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var_non_empty(AWS_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var_non_empty(AWS_SECRET_ACCESS_KEY) {
            self.secret_access_key.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var_non_empty(AWS_REGION) {
            self.region.get_or_insert(v);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosync_core::StaticEnv;

    #[test]
    fn test_from_env() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (AWS_ACCESS_KEY_ID, "AKIAEXAMPLE"),
            (AWS_SECRET_ACCESS_KEY, "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY"),
            (AWS_REGION, "us-east-1"),
        ]));

        let config = Config {
            region: Some(R2_REGION.to_string()),
            ..Default::default()
        }
        .from_env(&ctx);

        assert_eq!(config.access_key_id.as_deref(), Some("AKIAEXAMPLE"));
        assert_eq!(config.region.as_deref(), Some("auto"));
        assert!(format!("{config:?}").contains("wJa***KEY"));
    }
}
