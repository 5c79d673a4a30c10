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
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cosync_core::Context;
use log::debug;
use tokio::task::JoinHandle;

use crate::cache::{CacheStore, FileStateCache};

/// Default quiet period before a modified file is re-hashed.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// ModificationWatcher debounces local modification events.
///
/// Every [`notify`](Self::notify) for a path cancels the check pending for
/// that path and schedules a new one after the quiet period. The check
/// reads the file through the [`Context`] and calls
/// [`FileStateCache::mark_modified`].
///
/// Pending checks are aborted when the watcher is dropped.
#[derive(Debug)]
pub struct ModificationWatcher<S: CacheStore> {
    ctx: Context,
    cache: Arc<Mutex<FileStateCache<S>>>,
    quiet_period: Duration,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl<S: CacheStore> ModificationWatcher<S> {
    /// Create a watcher with [`DEFAULT_QUIET_PERIOD`].
    pub fn new(ctx: Context, cache: Arc<Mutex<FileStateCache<S>>>) -> Self {
        Self {
            ctx,
            cache,
            quiet_period: DEFAULT_QUIET_PERIOD,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Set the quiet period.
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Report that `path` was modified.
    ///
    /// Must be called within a tokio runtime.
    pub fn notify(&self, path: &str) {
        let ctx = self.ctx.clone();
        let cache = self.cache.clone();
        let quiet_period = self.quiet_period;
        let owned = path.to_string();

        let task = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;

            let content = match ctx.file_read_as_string(&owned).await {
                Ok(v) => v,
                Err(err) => {
                    debug!("failed to read modified file {owned}: {err}");
                    return;
                }
            };
            cache
                .lock()
                .expect("lock poisoned")
                .mark_modified(&owned, &content);
        });

        let mut pending = self.pending.lock().expect("lock poisoned");
        pending.retain(|_, t| !t.is_finished());
        if let Some(previous) = pending.insert(path.to_string(), task) {
            previous.abort();
        }
    }

    /// Number of checks still waiting or running.
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|t| !t.is_finished())
            .count()
    }

    /// Abort every pending check.
    pub fn cancel_all(&self) {
        for (_, task) in self.pending.lock().expect("lock poisoned").drain() {
            task.abort();
        }
    }
}

impl<S: CacheStore> Drop for ModificationWatcher<S> {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            for (_, task) in pending.drain() {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use async_trait::async_trait;
    use cosync_core::{FileRead, Result};
    use cosync_file_read_tokio::TokioFileRead;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default)]
    struct CountingFileRead {
        reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FileRead for CountingFileRead {
        async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            TokioFileRead.file_read(path).await
        }
    }

    #[tokio::test]
    async fn test_notify_is_debounced() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.md");
        let path = path.to_str().unwrap();
        tokio::fs::write(path, "hello world").await?;

        let fs = CountingFileRead::default();
        let ctx = Context::new().with_file_read(fs.clone());
        let cache = Arc::new(Mutex::new(FileStateCache::new(MemoryCacheStore::new())));
        cache.lock().unwrap().update_after_sync(
            path,
            "docs/a.md",
            "sha",
            "2024-03-05",
            true,
            "hello world",
        );

        let watcher =
            ModificationWatcher::new(ctx, cache.clone()).with_quiet_period(Duration::from_millis(100));

        tokio::fs::write(path, "hello world, again").await?;
        watcher.notify(path);
        tokio::time::sleep(Duration::from_millis(20)).await;
        watcher.notify(path);
        assert_eq!(watcher.pending(), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fs.reads.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.pending(), 0);

        let entry = cache.lock().unwrap().get(path).unwrap();
        assert!(!entry.is_synced);
        assert!(cache.lock().unwrap().is_modified_locally(path, Some("hello world")));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_all() -> anyhow::Result<()> {
        let fs = CountingFileRead::default();
        let ctx = Context::new().with_file_read(fs.clone());
        let cache = Arc::new(Mutex::new(FileStateCache::new(MemoryCacheStore::new())));

        let watcher = ModificationWatcher::new(ctx, cache).with_quiet_period(Duration::from_millis(50));
        watcher.notify("a.md");
        watcher.notify("b.md");
        assert_eq!(watcher.pending(), 2);

        watcher.cancel_all();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(watcher.pending(), 0);
        assert_eq!(fs.reads.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_file_stays_synced() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("a.md");
        let path = path.to_str().unwrap();
        tokio::fs::write(path, "hello world").await?;

        let ctx = Context::new().with_file_read(TokioFileRead);
        let cache = Arc::new(Mutex::new(FileStateCache::new(MemoryCacheStore::new())));
        cache
            .lock()
            .unwrap()
            .update_after_sync(path, "docs/a.md", "sha", "", false, "hello world");

        let watcher =
            ModificationWatcher::new(ctx, cache.clone()).with_quiet_period(Duration::from_millis(10));
        watcher.notify(path);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.lock().unwrap().get(path).unwrap().is_synced);
        Ok(())
    }
}
