//! Lock maintenance against a live requester over HTTP
//!
//! A small actix server plays the requesting node: it answers liveness
//! probes from a set of request ids it still considers active.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{App, HttpResponse, HttpServer, web};
use serde::Deserialize;
use serde_json::json;

use dlock_core::{
    HttpLivenessVerifier, HttpVerifierConfig, LockArgs, LockMaintenance, LockServer,
    MaintenanceReport,
};

const CALLBACK_PATH: &str = "/dlock/client/expired";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Probe {
    #[allow(dead_code)]
    resource_name: String,
    request_id: String,
}

/// Request ids the fake requester still holds
type ActiveIds = Arc<Mutex<HashSet<String>>>;

async fn expired_callback(active: web::Data<ActiveIds>, probe: web::Json<Probe>) -> HttpResponse {
    let expired = !active
        .lock()
        .expect("active ids poisoned")
        .contains(&probe.request_id);
    HttpResponse::Ok().json(json!({"code": 0, "message": "success", "data": expired}))
}

/// Start the fake requester and return its `host:port`
fn start_requester(active: ActiveIds) -> String {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(active.clone()))
            .route(CALLBACK_PATH, web::post().to(expired_callback))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("bind requester");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr.to_string()
}

fn verifier() -> Arc<HttpLivenessVerifier> {
    Arc::new(
        HttpLivenessVerifier::new(HttpVerifierConfig {
            connect_timeout_ms: 500,
            timeout_ms: 2000,
        })
        .expect("build verifier"),
    )
}

fn request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[actix_web::test]
async fn test_reaps_only_holders_the_requester_forgot() {
    let active: ActiveIds = Arc::new(Mutex::new(HashSet::new()));
    let requester = start_requester(active.clone());

    let server = Arc::new(LockServer::new());
    let live_reader = request_id();
    let dead_reader = request_id();
    let dead_writer = request_id();
    active.lock().unwrap().insert(live_reader.clone());

    for id in [&live_reader, &dead_reader] {
        let args = LockArgs::new("file2", id.as_str(), server.epoch()).with_requester(requester.as_str(), CALLBACK_PATH);
        assert_eq!(server.rlock(&args), Ok(true));
    }
    let args = LockArgs::new("file1", dead_writer.as_str(), server.epoch()).with_requester(requester.as_str(), CALLBACK_PATH);
    assert_eq!(server.lock(&args), Ok(true));

    let maintenance = LockMaintenance::new(server.clone(), verifier(), Duration::ZERO);
    let report = maintenance.run_cycle().await;

    assert_eq!(
        report,
        MaintenanceReport {
            selected: 3,
            live: 1,
            expired: 2,
            inconclusive: 0,
            reaped: 2,
        }
    );
    assert!(server.holders("file1").is_empty());
    let readers = server.holders("file2");
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].request_id, live_reader);
}

#[actix_web::test]
async fn test_unreachable_requester_keeps_lock() {
    let server = Arc::new(LockServer::new());
    let args = LockArgs::new("file1", request_id(), server.epoch()).with_requester("127.0.0.1:1", CALLBACK_PATH);
    assert_eq!(server.lock(&args), Ok(true));

    let maintenance = LockMaintenance::new(server.clone(), verifier(), Duration::ZERO);
    let report = maintenance.run_cycle().await;

    assert_eq!(report.inconclusive, 1);
    assert_eq!(report.reaped, 0);
    assert_eq!(server.holders("file1").len(), 1);
}

#[actix_web::test]
async fn test_missing_callback_route_is_inconclusive() {
    let active: ActiveIds = Arc::new(Mutex::new(HashSet::new()));
    let requester = start_requester(active);

    let server = Arc::new(LockServer::new());
    let args = LockArgs::new("file1", request_id(), server.epoch()).with_requester(requester.as_str(), "/no/such/route");
    assert_eq!(server.lock(&args), Ok(true));

    let maintenance = LockMaintenance::new(server.clone(), verifier(), Duration::ZERO);
    let report = maintenance.run_cycle().await;

    assert_eq!(report.inconclusive, 1);
    assert_eq!(server.holders("file1").len(), 1);
}
