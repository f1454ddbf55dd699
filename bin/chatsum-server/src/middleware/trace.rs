use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// JSON bodies at most this large are logged at debug level.
const MAX_LOGGED_BODY: u64 = 1024;

/// Tag each request with a trace id (propagated from `x-trace-id` when the
/// caller sent a valid UUID), run it inside an `http_request` span, and log
/// status and latency on the way out.
pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        debug!("request started");
        let (parts, body) = req.into_parts();
        let body = log_body("request", &parts.headers, body).await;
        let mut req = Request::from_parts(parts, body);
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(req).await;

        let (parts, body) = response.into_parts();
        let body = log_body("response", &parts.headers, body).await;
        let mut response = Response::from_parts(parts, body);
        if let Some(value) = trace_header {
            response.headers_mut().insert(X_TRACE_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "request finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Log a small JSON body and hand back an equivalent one. Bodies whose size
/// is unknown or above [`MAX_LOGGED_BODY`] pass through without buffering.
async fn log_body(direction: &str, headers: &header::HeaderMap, body: Body) -> Body {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let size = body.size_hint().upper();

    if !is_json || !size.is_some_and(|n| n <= MAX_LOGGED_BODY) {
        if size != Some(0) {
            debug!(size = ?size, "{direction} body skipped");
        }
        return body;
    }

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to buffer {direction} body");
            return Body::empty();
        }
    };
    if let Ok(text) = std::str::from_utf8(&bytes) {
        debug!(body = %text, "{direction} body");
    }
    Body::from(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::body::Bytes;
    use futures::stream;
    use tracing_test::traced_test;

    fn json_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[tokio::test]
    #[traced_test]
    async fn small_json_body_is_logged_and_preserved() {
        let body = log_body("request", &json_headers(), Body::from(r#"{"user_id":"u"}"#)).await;
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"user_id":"u"}"#);
        assert!(logs_contain("user_id"));
    }

    #[tokio::test]
    #[traced_test]
    async fn large_body_is_not_buffered() {
        let big = "x".repeat(4096);
        let body = log_body("request", &json_headers(), Body::from(big.clone())).await;
        assert_eq!(body.size_hint().exact(), Some(4096));
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.len(), big.len());
        assert!(logs_contain("request body skipped"));
        assert!(!logs_contain("xxxx"));
    }

    #[tokio::test]
    #[traced_test]
    async fn streamed_body_of_unknown_size_passes_through() {
        let chunks = stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"{\"a\":")),
            Ok(Bytes::from_static(b"1}")),
        ]);
        let body = log_body("request", &json_headers(), Body::from_stream(chunks)).await;
        assert_eq!(body.size_hint().upper(), None);
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"{\"a\":1}");
        assert!(logs_contain("request body skipped"));
    }
}
