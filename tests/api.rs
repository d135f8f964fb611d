use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Local, TimeZone};
use serde_json::Value;
use tower::ServiceExt;

use practice_timer::{
    alarm::SilentDevice,
    clock::ManualClock,
    create_router,
    engine::{TaskEngine, DEFAULT_TICK},
    store::MemoryStore,
    AppState,
};

struct Harness {
    router: Router,
    clock: Arc<ManualClock>,
    device: Arc<SilentDevice>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(
        Local.with_ymd_and_hms(2024, 6, 2, 18, 0, 0).unwrap(),
    ));
    let device = Arc::new(SilentDevice::new());
    let engine = TaskEngine::load(
        Arc::new(MemoryStore::new()),
        clock.clone(),
        device.clone(),
        DEFAULT_TICK,
    );
    let state = Arc::new(AppState::new(engine, 0, "127.0.0.1".to_string()));
    Harness {
        router: create_router(state),
        clock,
        device,
    }
}

async fn call(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn lists_template_tasks() {
    let h = harness();
    let (status, body) = call(&h.router, "GET", "/tasks").await;
    assert_eq!(status, StatusCode::OK);

    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 4);
    assert_eq!(tasks[0]["display"], "05:00");
    assert_eq!(tasks[1]["rich"]["label"], "La");
    assert_eq!(tasks[2]["timeLeft"], 900);
}

#[tokio::test]
async fn start_pause_reports_elapsed_time() {
    let h = harness();
    let (status, body) = call(&h.router, "POST", "/tasks/1/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tasks"][0]["isRunning"], true);

    h.clock.advance_millis(65_300);
    let (_, body) = call(&h.router, "POST", "/tasks/1/pause").await;
    assert_eq!(body["tasks"][0]["isRunning"], false);
    assert_eq!(body["tasks"][0]["timeLeft"], 235);
    assert_eq!(body["tasks"][0]["display"], "03:55");
}

#[tokio::test]
async fn unknown_task_is_ignored_not_rejected() {
    let h = harness();
    let (status, body) = call(&h.router, "POST", "/tasks/42/start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["tasks"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn alarm_flow_completes_task() {
    let h = harness();
    call(&h.router, "POST", "/tasks/1/start").await;
    h.clock.advance_millis(300_500);

    // Let the background countdown observe the expiry.
    let mut ringing = false;
    for _ in 0..200 {
        let (_, status) = call(&h.router, "GET", "/status").await;
        if status["ringing"] == serde_json::json!([1]) {
            ringing = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(ringing);
    assert_eq!(h.device.play_count(), 1);

    let (_, body) = call(&h.router, "POST", "/tasks/1/stop-alarm").await;
    assert_eq!(body["tasks"][0]["completed"], true);
    assert_eq!(body["tasks"][0]["alarmActive"], false);

    let (_, status) = call(&h.router, "GET", "/status").await;
    assert_eq!(status["progress"]["completed"], 1);
    assert_eq!(status["last_action"], "stop-alarm 1");
}

#[tokio::test]
async fn reset_all_clears_progress() {
    let h = harness();
    call(&h.router, "POST", "/tasks/2/toggle").await;
    call(&h.router, "POST", "/tasks/4/toggle").await;
    let (_, status) = call(&h.router, "GET", "/status").await;
    assert_eq!(status["progress"]["completed"], 2);

    let (_, body) = call(&h.router, "POST", "/tasks/reset-all").await;
    assert!(body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["completed"] == false));

    let (_, status) = call(&h.router, "GET", "/status").await;
    assert_eq!(status["progress"]["completed"], 0);
    assert_eq!(status["practice_day"], "2024-06-02");
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let (status, body) = call(&h.router, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
