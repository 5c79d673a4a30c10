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

/// Config carries the key pair used to sign Aliyun OSS requests.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `access_key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_SECRET`]
    pub access_key_secret: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("access_key_secret", &Redact::from(&self.access_key_secret))
            .finish()
    }
}

impl Config {
    /// Fill the unset fields from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var_non_empty(ALIBABA_CLOUD_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var_non_empty(ALIBABA_CLOUD_ACCESS_KEY_SECRET) {
            self.access_key_secret.get_or_insert(v);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosync_core::StaticEnv;

    #[test]
    fn test_from_env_keeps_explicit_values() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (ALIBABA_CLOUD_ACCESS_KEY_ID, "env_id"),
            (ALIBABA_CLOUD_ACCESS_KEY_SECRET, "env_secret"),
        ]));

        let config = Config {
            access_key_id: Some("explicit_id".to_string()),
            ..Default::default()
        }
        .from_env(&ctx);

        assert_eq!(config.access_key_id.as_deref(), Some("explicit_id"));
        assert_eq!(config.access_key_secret.as_deref(), Some("env_secret"));
        assert!(!format!("{config:?}").contains("env_secret"));
    }
}
