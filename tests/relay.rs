//! End-to-end tests for the relay: proxy in-process, raw TCP mock upstreams.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use rewrite_proxy::config::ProxyConfig;
use serde_json::Value;

mod common;

use common::{http_response, start_proxy, start_upstream, RawRequest};

fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.timeouts.connect_secs = 3;
    config.timeouts.request_secs = 10;
    config
}

fn encoded(url: &str) -> String {
    format!("/api/proxy?url={}", urlencoding::encode(url))
}

#[tokio::test]
async fn test_missing_url_is_rejected() {
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(format!("http://{}/api/proxy", proxy.addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json: Value = res.json().await.unwrap();
    assert_eq!(
        json["error"],
        "Invalid or missing url query. Use /api/proxy?url=https://example.com"
    );
}

#[tokio::test]
async fn test_non_http_target_is_rejected() {
    let proxy = start_proxy(test_config()).await;

    for target in ["ftp://example.com/file", "example.com", "javascript:alert(1)"] {
        let res = common::client().get(proxy.url(target)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{} should be rejected", target);
    }
}

#[tokio::test]
async fn test_unknown_host_is_bad_gateway() {
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(proxy.url("http://nonexistent-host.invalid/"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Failed to reach upstream URL");
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_refused_connection_is_bad_gateway() {
    // Bind and drop to get a port nothing listens on.
    let closed: SocketAddr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(proxy.url(&format!("http://{}/", closed)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Failed to reach upstream URL");
}

#[tokio::test]
async fn test_html_is_rewritten_and_headers_filtered() {
    const PAGE: &str = r#"<html><head><title>t</title><link rel="stylesheet" href="style.css"></head><body><img src="/logo.png" srcset="a.png 1x, b.png 2x"><div style="background:url('bg.jpg')"></div><a href="https://other.org/x">x</a><a href="mailto:me@a.com">m</a></body></html>"#;

    let upstream = start_upstream(|_req: RawRequest| async move {
        http_response(
            "200 OK",
            &[
                ("Content-Type", "text/html; charset=utf-8"),
                ("Content-Security-Policy", "default-src 'self'"),
                ("Content-Security-Policy-Report-Only", "default-src 'self'"),
                ("X-Frame-Options", "DENY"),
                ("Set-Cookie", "session=abc"),
                ("X-Upstream", "yes"),
            ],
            PAGE.as_bytes(),
        )
    })
    .await;
    let proxy = start_proxy(test_config()).await;

    let page_url = format!("http://{}/dir/page.html", upstream);
    let res = common::client().get(proxy.url(&page_url)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers().clone();
    assert!(headers.get("content-security-policy").is_none());
    assert!(headers.get("content-security-policy-report-only").is_none());
    assert!(headers.get("x-frame-options").is_none());
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    assert_eq!(headers["set-cookie"], "session=abc");
    assert_eq!(headers["x-upstream"], "yes");
    assert!(headers.get("x-request-id").is_some());

    let body = res.text().await.unwrap();
    // The upstream length is dropped; the server frames the rewritten body itself.
    assert_ne!(body.len(), PAGE.len());
    assert_eq!(headers["content-length"], body.len().to_string().as_str());

    let origin = format!("http://{}", upstream);
    assert!(body.contains(&format!(r#"<head><base href="{}">"#, page_url)));
    assert!(body.contains(&format!(r#"href="{}""#, encoded(&format!("{}/dir/style.css", origin)))));
    assert!(body.contains(&format!(r#"src="{}""#, encoded(&format!("{}/logo.png", origin)))));
    assert!(body.contains(&format!(
        r#"srcset="{} 1x, {} 2x""#,
        encoded(&format!("{}/dir/a.png", origin)),
        encoded(&format!("{}/dir/b.png", origin))
    )));
    assert!(body.contains(&format!(r#"url("{}")"#, encoded(&format!("{}/dir/bg.jpg", origin)))));
    assert!(body.contains(&format!(r#"href="{}""#, encoded("https://other.org/x"))));
    assert!(body.contains(r#"href="mailto:me@a.com""#));
}

#[tokio::test]
async fn test_stalled_upstream_is_bad_gateway() {
    let upstream = start_upstream(|_req: RawRequest| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        http_response("200 OK", &[("Content-Type", "text/plain")], b"late")
    })
    .await;
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    let proxy = start_proxy(config).await;

    let started = Instant::now();
    let res = common::client()
        .get(proxy.url(&format!("http://{}/slow", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(5));
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["error"], "Failed to reach upstream URL");
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_binary_passes_through_unchanged() {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff, 0xfe, b'u', b'r', b'l', b'(', b'x', b')'];

    let upstream = start_upstream(|_req: RawRequest| async move {
        http_response(
            "200 OK",
            &[("Content-Type", "image/png"), ("Cache-Control", "max-age=60")],
            PNG,
        )
    })
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(proxy.url(&format!("http://{}/img.png", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.headers()["cache-control"], "max-age=60");
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);
}

#[tokio::test]
async fn test_hop_by_hop_headers_not_forwarded() {
    let upstream = start_upstream(|req: RawRequest| async move {
        http_response("200 OK", &[("Content-Type", "text/plain")], req.head.as_bytes())
    })
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(proxy.url(&format!("http://{}/echo", upstream)))
        .header("connection", "keep-alive")
        .header("keep-alive", "timeout=5")
        .header("proxy-authorization", "Basic Zm9vOmJhcg==")
        .header("accept-encoding", "gzip, br")
        .header("x-custom", "kept")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let head = res.text().await.unwrap();
    let received = RawRequest { head, body: Vec::new() };

    assert_eq!(received.method(), "GET");
    assert_eq!(received.path(), "/echo");
    assert!(received.header("connection").is_none());
    assert!(received.header("keep-alive").is_none());
    assert!(received.header("proxy-authorization").is_none());
    assert_eq!(received.header("accept-encoding").as_deref(), Some("identity"));
    assert_eq!(received.header("x-custom").as_deref(), Some("kept"));
    assert_eq!(received.header("host"), Some(upstream.to_string()));
}

#[tokio::test]
async fn test_request_body_and_status_relayed() {
    let upstream = start_upstream(|req: RawRequest| async move {
        let echo = format!("{} {}", req.method(), String::from_utf8_lossy(&req.body));
        http_response("201 Created", &[("Content-Type", "text/plain")], echo.as_bytes())
    })
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .post(proxy.url(&format!("http://{}/submit", upstream)))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("a=1&b=2")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), "POST a=1&b=2");
}

#[tokio::test]
async fn test_redirects_followed_and_final_url_is_base() {
    let upstream = start_upstream(|req: RawRequest| async move {
        match req.path() {
            "/start" => http_response("302 Found", &[("Location", "/final/index.html")], b""),
            "/final/index.html" => http_response(
                "200 OK",
                &[("Content-Type", "text/html")],
                br#"<head></head><img src="pic.png">"#,
            ),
            _ => http_response("404 Not Found", &[], b"missing"),
        }
    })
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(proxy.url(&format!("http://{}/start", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    let final_url = format!("http://{}/final/index.html", upstream);
    assert_eq!(
        body,
        format!(
            r#"<head><base href="{}"></head><img src="{}">"#,
            final_url,
            encoded(&format!("http://{}/final/pic.png", upstream))
        )
    );
}

#[tokio::test]
async fn test_upstream_error_status_mirrored() {
    let upstream = start_upstream(|_req: RawRequest| async move {
        http_response(
            "404 Not Found",
            &[("Content-Type", "application/xhtml+xml")],
            br#"<p><a href="/home">home</a></p>"#,
        )
    })
    .await;
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(proxy.url(&format!("http://{}/nope", upstream)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    let body = res.text().await.unwrap();
    assert!(body.contains(&encoded(&format!("http://{}/home", upstream))));
}

#[tokio::test]
async fn test_health_endpoint() {
    let proxy = start_proxy(test_config()).await;

    let res = common::client()
        .get(format!("http://{}/health", proxy.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json: Value = res.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
