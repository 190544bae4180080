//! HTTP API tests for the lock RPC surface
//!
//! Drives the actix routes in-process and checks grant/deny results, error
//! codes, and HTTP status mapping.

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use serde_json::{Value, json};

use dlock_common::error::{
    EPOCH_MISMATCH, INVALID_ARGUMENT, NOT_LOCKED, NOT_WRITE_LOCKED, REQUEST_ID_NOT_FOUND,
    WRITE_LOCKED,
};
use dlock_core::{Epoch, LockServer};
use dlock_server::api;

fn envelope(server: &LockServer, name: &str, request_id: &str) -> Value {
    json!({
        "resourceName": name,
        "requesterNode": "127.0.0.1:9901",
        "callbackPath": "/dlock/client/expired",
        "requestId": request_id,
        "epoch": server.epoch(),
    })
}

macro_rules! test_app {
    ($server:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::from($server.clone()))
                .service(api::routes()),
        )
        .await
    };
}

macro_rules! call {
    ($app:expr, $route:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri(&format!("/dlock/v1/{}", $route))
            .set_json($body)
            .to_request();
        let resp = test::call_service($app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn test_write_lock_contention() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    let (status, body) = call!(&app, "lock", envelope(&server, "file1", "u1"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], true);

    let (_, body) = call!(&app, "lock", envelope(&server, "file1", "u2"));
    assert_eq!(body["data"], false);

    let (status, body) = call!(&app, "unlock", envelope(&server, "file1", "u1"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);

    let (_, body) = call!(&app, "lock", envelope(&server, "file1", "u2"));
    assert_eq!(body["data"], true);
}

#[actix_web::test]
async fn test_readers_then_writer() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    assert_eq!(call!(&app, "rlock", envelope(&server, "file2", "a")).1["data"], true);
    assert_eq!(call!(&app, "rlock", envelope(&server, "file2", "b")).1["data"], true);
    assert_eq!(call!(&app, "lock", envelope(&server, "file2", "c")).1["data"], false);

    // Unlock on a reader set is rejected
    let (status, body) = call!(&app, "unlock", envelope(&server, "file2", "a"));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], NOT_WRITE_LOCKED.code);

    assert_eq!(call!(&app, "runlock", envelope(&server, "file2", "a")).0, StatusCode::OK);
    assert_eq!(call!(&app, "runlock", envelope(&server, "file2", "b")).0, StatusCode::OK);
    assert_eq!(call!(&app, "lock", envelope(&server, "file2", "c")).1["data"], true);

    // RUnlock on a writer is rejected
    let (status, body) = call!(&app, "runlock", envelope(&server, "file2", "c"));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], WRITE_LOCKED.code);
}

#[actix_web::test]
async fn test_force_unlock_absent_name() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    let (status, body) = call!(&app, "force-unlock", envelope(&server, "file3", ""));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], true);
    assert_eq!(server.stats().resources, 0);
}

#[actix_web::test]
async fn test_force_unlock_with_request_id_rejected() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    call!(&app, "lock", envelope(&server, "file3", "u1"));
    let (status, body) = call!(&app, "force-unlock", envelope(&server, "file3", "u1"));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], INVALID_ARGUMENT.code);
    assert_eq!(server.holders("file3").len(), 1);
}

#[actix_web::test]
async fn test_release_errors() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    let (status, body) = call!(&app, "unlock", envelope(&server, "nothing", "u1"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], NOT_LOCKED.code);

    call!(&app, "lock", envelope(&server, "held", "u1"));
    let (status, body) = call!(&app, "unlock", envelope(&server, "held", "u2"));
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], REQUEST_ID_NOT_FOUND.code);
}

#[actix_web::test]
async fn test_stale_epoch_rejected_without_mutation() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    let previous_run = Epoch::from_datetime(server.epoch().as_datetime() - chrono_seconds(30));
    let mut body = envelope(&server, "file1", "u1");
    body["epoch"] = json!(previous_run);

    for route in ["lock", "rlock", "unlock", "runlock", "expired"] {
        let (status, reply) = call!(&app, route, body.clone());
        assert_eq!(status, StatusCode::CONFLICT, "route {}", route);
        assert_eq!(reply["code"], EPOCH_MISMATCH.code);
    }
    assert_eq!(server.stats().resources, 0);
}

#[actix_web::test]
async fn test_expired_probe() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    assert_eq!(call!(&app, "expired", envelope(&server, "r", "a")).1["data"], true);
    call!(&app, "rlock", envelope(&server, "r", "a"));
    assert_eq!(call!(&app, "expired", envelope(&server, "r", "a")).1["data"], false);
    assert_eq!(call!(&app, "expired", envelope(&server, "r", "b")).1["data"], true);
}

#[actix_web::test]
async fn test_stats_endpoint() {
    let server = Arc::new(LockServer::new());
    let app = test_app!(server);

    call!(&app, "lock", envelope(&server, "w", "u1"));
    call!(&app, "rlock", envelope(&server, "r", "a"));
    call!(&app, "rlock", envelope(&server, "r", "b"));

    let req = test::TestRequest::get().uri("/dlock/v1/stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!({"resources": 2, "writeLocks": 1, "readLocks": 2}));
}

fn chrono_seconds(seconds: i64) -> chrono::TimeDelta {
    chrono::TimeDelta::seconds(seconds)
}
