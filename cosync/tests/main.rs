use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use cosync::cache::{FileCacheStore, FileStateCache};
use cosync::{
    default_context, Context, ModificationWatcher, ProviderKind, Result, Settings, UploadFile,
};
use cosync_core::hash::{hex_hmac_sha1, hex_sha1};
use cosync_core::HttpSend;
use cosync_file_read_tokio::TokioFileRead;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use log::warn;
use pretty_assertions::assert_eq;

/// Accepts every request and keeps a copy of it.
#[derive(Debug, Clone, Default)]
struct RecordingHttpSend {
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
}

#[async_trait]
impl HttpSend for RecordingHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        self.requests.lock().unwrap().push(req);
        Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Bytes::new())?)
    }
}

const TENCENT: &str = r#"
[storage]
provider = "tencent"
access_key_id = "AKIDexample"
access_key_secret = "SECRETexample"
bucket = "b"
region = "ap-guangzhou"
"#;

fn tencent_client(http: RecordingHttpSend) -> cosync::StorageClient {
    let _ = env_logger::builder().is_test(true).try_init();

    let settings = Settings::from_toml(TENCENT).unwrap();
    settings
        .client(Context::new().with_http_send(http))
        .unwrap()
}

/// Pull one `k=v` pair out of a Tencent authorization value.
fn auth_param<'a>(auth: &'a str, key: &str) -> &'a str {
    auth.split('&')
        .find_map(|kv| kv.strip_prefix(key)?.strip_prefix('='))
        .unwrap_or_default()
}

#[tokio::test]
async fn test_tencent_upload_with_fixed_time() {
    let http = RecordingHttpSend::default();
    let client =
        tencent_client(http.clone()).with_time(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    assert_eq!(client.provider().kind(), ProviderKind::Tencent);

    let file = UploadFile::new("test.txt", "text/plain", Bytes::from_static(b"test"));
    let result = client.upload(&file, "test.txt").await;
    assert!(result.success, "{}", result.message);
    assert_eq!(
        result.url.as_deref(),
        Some("https://b.cos.ap-guangzhou.myqcloud.com/test.txt")
    );

    let requests = http.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method(), Method::PUT);
    assert_eq!(
        req.uri().to_string(),
        "https://b.cos.ap-guangzhou.myqcloud.com/test.txt"
    );
    assert_eq!(req.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(req.body().as_ref(), b"test");
    assert_eq!(
        req.headers()[AUTHORIZATION],
        "q-sign-algorithm=sha1&q-ak=AKIDexample&q-sign-time=1709596800;1709600400&q-key-time=1709596800;1709600400&q-header-list=host&q-url-param-list=&q-signature=fc3ea2a59988aa71277b99de6fbd5e9b5cba7cfd"
    );
}

#[tokio::test]
async fn test_tencent_signature_matches_key_time() {
    let http = RecordingHttpSend::default();
    let client = tencent_client(http.clone());

    client.delete("images/a.png").await.unwrap();

    let requests = http.requests.lock().unwrap();
    let auth = requests[0].headers()[AUTHORIZATION].to_str().unwrap();

    let key_time = auth_param(auth, "q-key-time");
    let (start, end) = key_time.split_once(';').unwrap();
    let start: i64 = start.parse().unwrap();
    let end: i64 = end.parse().unwrap();
    assert_eq!(end - start, 3600);
    assert!((Utc::now().timestamp() - start).abs() < 60);

    let http_string = "delete\n/images/a.png\n\nhost=b.cos.ap-guangzhou.myqcloud.com\n";
    let string_to_sign = format!("sha1\n{key_time}\n{}\n", hex_sha1(http_string.as_bytes()));
    let sign_key = hex_hmac_sha1(b"SECRETexample", key_time.as_bytes());
    assert_eq!(
        auth_param(auth, "q-signature"),
        hex_hmac_sha1(sign_key.as_bytes(), string_to_sign.as_bytes())
    );
}

#[tokio::test]
async fn test_settings_without_storage() {
    let settings = Settings::from_toml("image_upload_path = \"img\"").unwrap();
    let err = settings.client(Context::new()).unwrap_err();
    assert_eq!(err.kind(), cosync::ErrorKind::ConfigIncomplete);
}

#[tokio::test]
async fn test_watcher_marks_synced_file_modified() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir()?;
    let note = dir.path().join("note.md");
    let note = note.to_str().unwrap().to_string();
    tokio::fs::write(&note, "# Title\n").await?;

    let ctx = Context::new().with_file_read(TokioFileRead);
    let store = FileCacheStore::new(dir.path().join("cache"));

    let mut cache = FileStateCache::new(store.clone());
    cache
        .update_after_sync_from_disk(&ctx, &note, "docs/note.md", "abc123", "", true)
        .await?;
    assert!(!cache.is_modified_on_disk(&ctx, &note).await);

    let cache = Arc::new(Mutex::new(cache));
    let watcher = ModificationWatcher::new(ctx.clone(), cache.clone())
        .with_quiet_period(Duration::from_millis(50));

    tokio::fs::write(&note, "# Title\n\nmore\n").await?;
    watcher.notify(&note);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(watcher.pending(), 0);

    let entry = cache.lock().unwrap().get(&note).unwrap();
    assert!(!entry.is_synced);
    assert_eq!(entry.remote_revision, "abc123");

    // A fresh cache over the same directory sees the persisted change.
    let mut reloaded = FileStateCache::new(store);
    let entry = reloaded.get(&note).unwrap();
    assert!(!entry.is_synced);
    assert_eq!(reloaded.stats().total, 1);
    Ok(())
}

/// Live round trip against a real bucket.
///
/// Configure with `COSYNC_TEST=on` plus the `COSYNC_*` variables read by
/// [`Settings::from_env`].
#[tokio::test]
async fn test_live_connection() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("COSYNC_TEST").unwrap_or_default() != "on" {
        warn!("COSYNC_TEST is not set, skipped");
        return Ok(());
    }

    let ctx = default_context();
    let settings = Settings::default().from_env(&ctx)?;
    let client = settings.client(ctx)?;

    let result = client.test_connection().await;
    assert!(result.success, "{}", result.message);
    Ok(())
}
