//! End-to-end tests for the HTTP API.
//!
//! The router is driven in-process with `oneshot`; logo hosts are stood in
//! for by a wiremock server.

use std::time::{Duration, Instant};

use analytics_db::{Database, NewRequest};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qr_service::app::SharedState;
use qr_service::config::AppConfig;
use qr_service::server::router::create_router;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

// === Helpers ===

fn test_config() -> AppConfig {
    AppConfig {
        logo_fetch_timeout: Duration::from_secs(2),
        analytics_timeout: Duration::from_secs(2),
        ..AppConfig::default()
    }
}

fn test_app_with(config: AppConfig) -> (Router, SharedState) {
    let db = Database::open_in_memory().expect("Failed to create test DB");
    let state = SharedState::new(db, config).unwrap();
    (create_router(state.clone()), state)
}

fn test_app() -> (Router, SharedState) {
    test_app_with(test_config())
}

struct Reply {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    fn image(&self) -> DynamicImage {
        image::load_from_memory_with_format(&self.body, ImageFormat::Png).unwrap()
    }
}

async fn send(router: &Router, req: Request<Body>) -> Reply {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = axum::body::to_bytes(resp.into_body(), 64 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec();
    Reply {
        status,
        content_type,
        body,
    }
}

async fn post_qr(router: &Router, body: Value) -> Reply {
    let req = Request::builder()
        .method("POST")
        .uri("/generate-qr/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, req).await
}

async fn get(router: &Router, uri: &str) -> Reply {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, req).await
}

/// Analytics are written in the background; poll until they land.
async fn wait_for_total(router: &Router, expected: i64) {
    for _ in 0..100 {
        let reply = get(router, "/analytics/total").await;
        if reply.json()["total_qr_codes"] == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("analytics total never reached {expected}");
}

fn png_logo(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color));
    qr_engine::encode_png(&img).unwrap()
}

async fn logo_server(status: u16, body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "image/png")
                .set_body_bytes(body),
        )
        .mount(&server)
        .await;
    server
}

fn module_width(text: &str) -> u32 {
    qr_engine::encode(text).unwrap().width()
}

// === Generation ===

#[tokio::test]
async fn test_generate_plain_png() {
    let (router, _) = test_app();
    let reply = post_qr(&router, json!({ "text": "https://example.com" })).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "image/png");
    assert!(reply.body.starts_with(PNG_MAGIC));

    let img = reply.image();
    assert_eq!(img.width(), (module_width("https://example.com") + 8) * 10);
    assert_eq!(img.width(), img.height());
}

#[tokio::test]
async fn test_generate_respects_size() {
    let (router, _) = test_app();
    let reply = post_qr(&router, json!({ "text": "hello", "size": 4 })).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.image().width(), (module_width("hello") + 8) * 4);
}

#[tokio::test]
async fn test_generate_with_color() {
    let (router, _) = test_app();
    let reply = post_qr(
        &router,
        json!({ "text": "hello", "color": { "red": 255, "green": 0, "blue": 0 } }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    let img = reply.image().to_rgb8();
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    // Top-left finder module sits just inside the quiet zone.
    assert_eq!(img.get_pixel(40, 40).0, [255, 0, 0]);
}

#[tokio::test]
async fn test_out_of_range_channel_rejected() {
    let (router, _) = test_app();
    for bad in [256, -1] {
        let reply = post_qr(
            &router,
            json!({ "text": "hello", "color": { "red": bad, "green": 0, "blue": 0 } }),
        )
        .await;

        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = reply.json()["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("color.red"), "{detail}");
        assert!(!reply.body.starts_with(PNG_MAGIC));
    }

    let total = get(&router, "/analytics/total").await;
    assert_eq!(total.json(), json!({ "total_qr_codes": 0 }));
}

#[tokio::test]
async fn test_invalid_bodies_rejected() {
    let (router, _) = test_app();

    let missing_text = post_qr(&router, json!({ "size": 3 })).await;
    assert_eq!(missing_text.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(missing_text.json()["detail"].is_string());

    let empty_text = post_qr(&router, json!({ "text": "" })).await;
    assert_eq!(empty_text.status, StatusCode::UNPROCESSABLE_ENTITY);

    let zero_size = post_qr(&router, json!({ "text": "a", "size": 0 })).await;
    assert_eq!(zero_size.status, StatusCode::UNPROCESSABLE_ENTITY);

    let req = Request::builder()
        .method("POST")
        .uri("/generate-qr/")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let reply = send(&router, req).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.json()["detail"].is_string());
}

#[tokio::test]
async fn test_oversized_text_is_client_error() {
    let (router, _) = test_app();
    let reply = post_qr(&router, json!({ "text": "x".repeat(3000) })).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json()["detail"].as_str().unwrap().contains("too long"));
}

// === Logo ===

#[tokio::test]
async fn test_logo_is_composited_at_center() {
    let server = logo_server(200, png_logo(40, 40, Rgba([0, 0, 255, 255]))).await;
    let (router, _) = test_app();

    let reply = post_qr(
        &router,
        json!({ "text": "hello", "logo_url": format!("{}/logo.png", server.uri()) }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    let img = reply.image().to_rgba8();
    assert_eq!(img.width(), (module_width("hello") + 8) * 10);

    let center = img.get_pixel(img.width() / 2, img.height() / 2);
    assert!(center[2] > 245 && center[0] < 10, "center was {center:?}");
    // Quiet zone is untouched.
    assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn test_logo_404_aborts_pipeline() {
    let server = logo_server(404, Vec::new()).await;
    let (router, _) = test_app();

    let reply = post_qr(
        &router,
        json!({ "text": "hello", "logo_url": format!("{}/logo.png", server.uri()) }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.content_type.starts_with("application/json"));
    assert!(!reply.body.starts_with(PNG_MAGIC));
    let detail = reply.json()["detail"].as_str().unwrap().to_string();
    assert!(detail.contains("404"), "{detail}");

    tokio::time::sleep(Duration::from_millis(100)).await;
    let total = get(&router, "/analytics/total").await;
    assert_eq!(total.json()["total_qr_codes"], 0);
}

#[tokio::test]
async fn test_logo_not_an_image() {
    let server = logo_server(200, b"<html>hello</html>".to_vec()).await;
    let (router, _) = test_app();

    let reply = post_qr(
        &router,
        json!({ "text": "hello", "logo_url": format!("{}/logo.png", server.uri()) }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "detail": "Logo is not a valid image" }));
}

#[tokio::test]
async fn test_slow_logo_host_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_logo(8, 8, Rgba([0, 0, 0, 255])))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (router, _) = test_app_with(AppConfig {
        logo_fetch_timeout: Duration::from_millis(300),
        ..test_config()
    });

    let reply = post_qr(
        &router,
        json!({ "text": "hello", "logo_url": format!("{}/logo.png", server.uri()) }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json()["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch logo"));
}

#[tokio::test]
async fn test_oversized_logo_is_rejected() {
    let server = logo_server(200, vec![0u8; 4096]).await;
    let (router, _) = test_app_with(AppConfig {
        logo_max_bytes: 1024,
        ..test_config()
    });

    let reply = post_qr(
        &router,
        json!({ "text": "hello", "logo_url": format!("{}/logo.png", server.uri()) }),
    )
    .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.json(),
        json!({ "detail": "Logo exceeds the 1024 byte limit" })
    );
}

// === Analytics ===

#[tokio::test]
async fn test_feature_breakdown_after_three_requests() {
    let server = logo_server(200, png_logo(20, 10, Rgba([0, 128, 0, 255]))).await;
    let (router, _) = test_app();

    let plain = post_qr(&router, json!({ "text": "one" })).await;
    let colored = post_qr(
        &router,
        json!({ "text": "two", "color": { "red": 1, "green": 2, "blue": 3 } }),
    )
    .await;
    let both = post_qr(
        &router,
        json!({
            "text": "three",
            "size": 4,
            "color": { "red": 200, "green": 0, "blue": 0 },
            "logo_url": format!("{}/logo.png", server.uri())
        }),
    )
    .await;
    for reply in [&plain, &colored, &both] {
        assert_eq!(reply.status, StatusCode::OK);
    }

    wait_for_total(&router, 3).await;

    let reply = get(&router, "/analytics/features").await;
    assert_eq!(reply.status, StatusCode::OK);
    let stats = reply.json();
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["with_color"], 2);
    assert_eq!(stats["with_logo"], 1);
    assert_eq!(stats["with_both"], 1);
    assert_eq!(stats["average_size"], 8.0);
    assert!(stats["average_response_time_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_features_on_empty_table() {
    let (router, _) = test_app();
    let reply = get(&router, "/analytics/features").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({
            "total": 0,
            "with_color": 0,
            "with_logo": 0,
            "with_both": 0,
            "average_size": null,
            "average_response_time_ms": null
        })
    );
}

#[tokio::test]
async fn test_period_counts_today() {
    let (router, _) = test_app();
    assert_eq!(post_qr(&router, json!({ "text": "hi" })).await.status, StatusCode::OK);
    wait_for_total(&router, 1).await;

    let today = chrono::Utc::now().date_naive().to_string();
    for timeframe in ["today", "month", "year"] {
        let reply = get(&router, &format!("/analytics/period?timeframe={timeframe}")).await;
        assert_eq!(reply.status, StatusCode::OK);
        let body = reply.json();
        assert_eq!(body["timeframe"], timeframe);
        assert_eq!(body["count"], 1);
        assert_eq!(body["period_end"], today.as_str());
        assert!(body["period_start"].is_string());
    }
}

#[tokio::test]
async fn test_period_rejects_unknown_timeframe() {
    let (router, _) = test_app();

    let reply = get(&router, "/analytics/period?timeframe=bogus").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "detail": "invalid input" }));

    let reply = get(&router, "/analytics/period").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json(), json!({ "detail": "invalid input" }));
}

#[tokio::test]
async fn test_analytics_failure_does_not_break_generation() {
    let (router, state) = test_app();
    state
        .db()
        .with_conn(|conn| {
            conn.execute_batch("DROP TABLE qr_requests;")?;
            Ok(())
        })
        .unwrap();

    let reply = post_qr(&router, json!({ "text": "still works" })).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type, "image/png");
    assert_eq!(reply.image().width(), (module_width("still works") + 8) * 10);

    for uri in ["/analytics/total", "/analytics/features", "/analytics/period?timeframe=today"] {
        let reply = get(&router, uri).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(reply.json(), json!({ "detail": "internal server error" }));
    }
}

// === Core ===

#[tokio::test]
async fn test_status_endpoint() {
    let (router, _) = test_app();
    let reply = get(&router, "/status").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["status"], "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stalled_database_does_not_delay_generation() {
    let (router, state) = test_app();

    // Hold the connection lock so every analytics write stalls.
    let db = state.db().clone();
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let blocker = std::thread::spawn(move || {
        db.with_conn(|_| {
            let _ = locked_tx.send(());
            std::thread::sleep(Duration::from_secs(2));
            Ok(())
        })
    });
    locked_rx.await.unwrap();

    let record = NewRequest {
        has_color: false,
        has_logo: false,
        size: 10,
        response_time_ms: 5,
    };
    for _ in 0..600 {
        state.analytics().record_detached(record);
    }

    let started = Instant::now();
    let reply = post_qr(&router, json!({ "text": "while the database is stuck" })).await;
    let elapsed = started.elapsed();

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.starts_with(PNG_MAGIC));
    assert!(
        elapsed < Duration::from_secs(1),
        "generation took {elapsed:?} while the database was stalled"
    );

    tokio::task::spawn_blocking(move || blocker.join())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    wait_for_total(&router, 601).await;
}
