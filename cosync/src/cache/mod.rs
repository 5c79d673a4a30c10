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

//! Local file state cache.
//!
//! The cache remembers, per local file, where it was synced to and the hash
//! of its content at that time. It answers "does this file need a sync"
//! without a network round trip.
//!
//! Entries expire after [`DEFAULT_MAX_AGE`] unless configured otherwise. An
//! expired entry is evicted by the reader that finds it.

mod store;
pub use store::{CacheStore, FileCacheStore, MemoryCacheStore};

use std::collections::HashMap;
use std::time::Duration;

use cosync_core::time::now_millis;
use cosync_core::{Context, Error, Result};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

/// Key the whole mapping is persisted under.
pub const CACHE_KEY: &str = "cosync-file-cache";

/// How long an entry stays valid by default.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// What is known about one local file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCacheEntry {
    /// Local path, also the key of the entry.
    #[serde(rename = "filePath")]
    pub local_path: String,
    /// Path of the file on the remote side.
    #[serde(rename = "githubPath")]
    pub remote_path: String,
    /// Last modification time reported by the remote.
    #[serde(rename = "lastModified")]
    pub last_modified_remote: String,
    /// Remote revision marker (a blob sha for GitHub), may be empty.
    #[serde(rename = "sha")]
    pub remote_revision: String,
    pub is_published: bool,
    pub is_synced: bool,
    /// Epoch milliseconds of the last write.
    pub cache_time: i64,
    /// Content length in UTF-16 code units.
    pub file_size: u64,
    /// See [`content_hash`].
    pub content_hash: String,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total: usize,
    pub published: usize,
    pub synced: usize,
    pub expired: usize,
}

/// Fast, non cryptographic hash of `content` for change detection.
///
/// 31-multiplier rolling hash over UTF-16 code units, wrapped to 32 bits
/// and written in base 36 with a leading `-` for negative values.
pub fn content_hash(content: &str) -> String {
    let hash = content
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c)));
    to_base36(hash)
}

fn to_base36(value: i32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let mut n = i64::from(value).unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    if value < 0 {
        buf.push(b'-');
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

fn content_size(content: &str) -> u64 {
    content.encode_utf16().count() as u64
}

/// FileStateCache maps local paths to [`FileCacheEntry`].
///
/// The mapping lives in memory and is written to the [`CacheStore`] after
/// every change. Failing to persist is logged and otherwise ignored.
#[derive(Debug)]
pub struct FileStateCache<S: CacheStore = MemoryCacheStore> {
    store: S,
    entries: HashMap<String, FileCacheEntry>,
    max_age: Duration,
}

impl<S: CacheStore> FileStateCache<S> {
    /// Open the cache persisted in `store`.
    ///
    /// A blob that cannot be parsed is discarded and the cache starts empty.
    pub fn new(store: S) -> Self {
        let entries = match Self::load(&store) {
            Ok(entries) => entries,
            Err(err) => {
                error!("file cache discarded: {err}");
                if let Err(err) = store.remove(CACHE_KEY) {
                    warn!("failed to remove corrupt file cache: {err}");
                }
                HashMap::new()
            }
        };
        debug!("loaded {} file caches", entries.len());

        Self {
            store,
            entries,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Set how long entries stay valid.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(store: &S) -> Result<HashMap<String, FileCacheEntry>> {
        match store.load(CACHE_KEY)? {
            None => Ok(HashMap::new()),
            Some(blob) => serde_json::from_str(&blob)
                .map_err(|e| Error::cache_corrupt("persisted file cache is not valid").with_source(e)),
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| Error::unexpected("failed to serialize file cache").with_source(e))
            .and_then(|blob| self.store.save(CACHE_KEY, &blob));
        if let Err(err) = result {
            error!("failed to save file cache: {err}");
        }
    }

    /// Whether `entry` is younger than the max age.
    pub fn is_valid(&self, entry: &FileCacheEntry) -> bool {
        let age = now_millis().saturating_sub(entry.cache_time);
        u128::try_from(age).map_or(true, |age| age < self.max_age.as_millis())
    }

    /// Get the entry of `path`, evicting it if it has expired.
    pub fn get(&mut self, path: &str) -> Option<FileCacheEntry> {
        let entry = self.entries.get(path)?;
        if !self.is_valid(entry) {
            debug!("file cache of {path} has expired");
            self.remove(path);
            return None;
        }
        Some(entry.clone())
    }

    /// Insert or replace the entry of `path`, stamping its cache time.
    pub fn put(&mut self, path: &str, mut entry: FileCacheEntry) {
        entry.cache_time = now_millis();
        self.entries.insert(path.to_string(), entry);
        self.persist();
        debug!("file cache of {path} updated");
    }

    /// Remove the entry of `path`.
    pub fn remove(&mut self, path: &str) {
        if self.entries.remove(path).is_some() {
            self.persist();
            debug!("file cache of {path} removed");
        }
    }

    /// Remove every entry and the persisted blob.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(err) = self.store.remove(CACHE_KEY) {
            error!("failed to clear file cache: {err}");
        }
    }

    /// All entries, expired ones included.
    pub fn entries(&self) -> impl Iterator<Item = &FileCacheEntry> {
        self.entries.values()
    }

    /// Count entries by state.
    pub fn stats(&self) -> CacheStats {
        self.entries.values().fold(CacheStats::default(), |mut s, e| {
            s.total += 1;
            s.published += usize::from(e.is_published);
            s.synced += usize::from(e.is_synced);
            s.expired += usize::from(!self.is_valid(e));
            s
        })
    }

    /// Whether `path` needs a sync.
    ///
    /// `content` is the current local content, `None` if the file could not
    /// be read. Anything but a valid entry with a matching hash counts as
    /// modified.
    pub fn is_modified_locally(&mut self, path: &str, content: Option<&str>) -> bool {
        let Some(entry) = self.get(path) else {
            return true;
        };
        let Some(content) = content else {
            return true;
        };
        content_hash(content) != entry.content_hash
    }

    /// Record a successful sync of `path` with its current `content`.
    pub fn update_after_sync(
        &mut self,
        path: &str,
        remote_path: &str,
        remote_revision: &str,
        last_modified: &str,
        published: bool,
        content: &str,
    ) {
        self.put(
            path,
            FileCacheEntry {
                local_path: path.to_string(),
                remote_path: remote_path.to_string(),
                last_modified_remote: last_modified.to_string(),
                remote_revision: remote_revision.to_string(),
                is_published: published,
                is_synced: true,
                cache_time: now_millis(),
                file_size: content_size(content),
                content_hash: content_hash(content),
            },
        );
    }

    /// Record a local change of `path`.
    ///
    /// When the hash of `content` differs from the cached one, the entry
    /// takes the new hash and is marked as not synced. Returns whether the
    /// entry changed.
    pub fn mark_modified(&mut self, path: &str, content: &str) -> bool {
        let Some(mut entry) = self.get(path) else {
            return false;
        };
        let hash = content_hash(content);
        if hash == entry.content_hash {
            return false;
        }

        debug!("file content modified: {path}");
        entry.content_hash = hash;
        entry.file_size = content_size(content);
        entry.is_synced = false;
        self.put(path, entry);
        true
    }

    /// [`Self::is_modified_locally`] with the content read through `ctx`.
    ///
    /// Read failures count as modified.
    pub async fn is_modified_on_disk(&mut self, ctx: &Context, path: &str) -> bool {
        if self.get(path).is_none() {
            return true;
        }
        let content = match ctx.file_read_as_string(path).await {
            Ok(v) => Some(v),
            Err(err) => {
                debug!("failed to read {path}, treat as modified: {err}");
                None
            }
        };
        self.is_modified_locally(path, content.as_deref())
    }

    /// [`Self::update_after_sync`] with the content read through `ctx`.
    pub async fn update_after_sync_from_disk(
        &mut self,
        ctx: &Context,
        path: &str,
        remote_path: &str,
        remote_revision: &str,
        last_modified: &str,
        published: bool,
    ) -> Result<()> {
        let content = ctx.file_read_as_string(path).await?;
        self.update_after_sync(
            path,
            remote_path,
            remote_revision,
            last_modified,
            published,
            &content,
        );
        Ok(())
    }
}
