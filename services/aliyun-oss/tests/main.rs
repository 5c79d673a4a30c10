use std::env;

use bytes::Bytes;
use cosync_aliyun_oss::{Credential, RequestSigner, StaticCredentialProvider};
use cosync_core::{Context, Result, Signer};
use cosync_http_send_reqwest::ReqwestHttpSend;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use log::{debug, warn};

fn init_signer() -> Option<(Context, Signer<Credential>, String)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("COSYNC_ALIYUN_OSS_TEST").unwrap_or_default() != "on" {
        return None;
    }

    let access_key_id =
        env::var("COSYNC_ALIYUN_OSS_ACCESS_KEY").expect("env COSYNC_ALIYUN_OSS_ACCESS_KEY must set");
    let access_key_secret =
        env::var("COSYNC_ALIYUN_OSS_SECRET_KEY").expect("env COSYNC_ALIYUN_OSS_SECRET_KEY must set");
    let bucket = env::var("COSYNC_ALIYUN_OSS_BUCKET").expect("env COSYNC_ALIYUN_OSS_BUCKET must set");
    let url = env::var("COSYNC_ALIYUN_OSS_URL").expect("env COSYNC_ALIYUN_OSS_URL must set");

    let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
    let loader = StaticCredentialProvider::new(&access_key_id, &access_key_secret);
    let signer = Signer::new(ctx.clone(), loader, RequestSigner::new(&bucket));

    Some((ctx, signer, url))
}

async fn send(
    ctx: &Context,
    signer: &Signer<Credential>,
    req: Request<Bytes>,
) -> Result<StatusCode> {
    let (mut parts, body) = req.into_parts();
    signer.sign(&mut parts).await?;
    let req = Request::from_parts(parts, body);
    debug!("signed request: {req:?}");

    let resp = ctx.http_send_as_string(req).await?;
    debug!("got response: {resp:?}");
    Ok(resp.status())
}

#[tokio::test]
async fn test_put_and_delete_object() -> Result<()> {
    let Some((ctx, signer, url)) = init_signer() else {
        warn!("COSYNC_ALIYUN_OSS_TEST is not set, skipped");
        return Ok(());
    };

    let object = format!("{url}/cosync-test/{}.txt", unique_suffix());

    let put = Request::builder()
        .method(Method::PUT)
        .uri(&object)
        .header(CONTENT_TYPE, "text/plain")
        .body(Bytes::from_static(b"test"))?;
    assert_eq!(StatusCode::OK, send(&ctx, &signer, put).await?);

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri(&object)
        .body(Bytes::new())?;
    assert_eq!(StatusCode::NO_CONTENT, send(&ctx, &signer, delete).await?);

    Ok(())
}

#[tokio::test]
async fn test_put_object_with_wrong_secret() -> Result<()> {
    let Some((ctx, _, url)) = init_signer() else {
        warn!("COSYNC_ALIYUN_OSS_TEST is not set, skipped");
        return Ok(());
    };

    let bucket = env::var("COSYNC_ALIYUN_OSS_BUCKET").expect("env COSYNC_ALIYUN_OSS_BUCKET must set");
    let signer = Signer::new(
        ctx.clone(),
        StaticCredentialProvider::new("LTAI5tInvalid", "not-the-secret"),
        RequestSigner::new(&bucket),
    );

    let put = Request::builder()
        .method(Method::PUT)
        .uri(format!("{url}/cosync-test/denied.txt"))
        .header(CONTENT_TYPE, "text/plain")
        .body(Bytes::from_static(b"test"))?;
    assert_eq!(StatusCode::FORBIDDEN, send(&ctx, &signer, put).await?);

    Ok(())
}

fn unique_suffix() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
