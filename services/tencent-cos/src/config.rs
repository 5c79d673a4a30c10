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

/// Config for Tencent COS services.
#[derive(Clone, Default)]
pub struct Config {
    /// Secret ID, falls back to env value [`TENCENTCLOUD_SECRET_ID`]
    pub secret_id: Option<String>,
    /// Secret Key, falls back to env value [`TENCENTCLOUD_SECRET_KEY`]
    pub secret_key: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_id", &Redact::from(&self.secret_id))
            .field("secret_key", &Redact::from(&self.secret_key))
            .finish()
    }
}

impl Config {
    /// Fill the unset fields from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var_non_empty(TENCENTCLOUD_SECRET_ID) {
            self.secret_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var_non_empty(TENCENTCLOUD_SECRET_KEY) {
            self.secret_key.get_or_insert(v);
        }
        self
    }
}
