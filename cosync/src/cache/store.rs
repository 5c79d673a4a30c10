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

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use cosync_core::{Error, Result};
use log::debug;

/// CacheStore persists the serialized cache mapping under a key.
///
/// Calls are synchronous: every cache mutation is written before it
/// returns.
pub trait CacheStore: Debug + Send + Sync + 'static {
    /// Load the value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing what was there.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`, missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// MemoryCacheStore keeps values in process memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().expect("lock poisoned").get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().expect("lock poisoned").remove(key);
        Ok(())
    }
}

/// FileCacheStore writes every key to `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    /// Create a store under `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::unexpected(format!("failed to read cache {key}")).with_source(e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        fs::write(&path, value)?;
        debug!("cache {key} written to {}", path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
