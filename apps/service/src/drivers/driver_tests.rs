//! Driver tests against fake gatekeeper and ping monitor servers
//!
//! These tests verify:
//! - Topology and access classification parsing
//! - Relay echo ticks over HTTP, including undeliverable proposals
//! - Rotation across pairs once their measurement status is reported
//! - Ack handling of the ping monitor, including null bodies

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, test, web};
use relay_qos::{
    CandidateSelector, CloudAccess, CloudDescriptor, EchoContext, GatekeeperClient, MemoryCatalog,
    ProbeProvider, ProbeRequest, ProbeSettings, RelayEchoTask, TickOutcome, TopologyDirectory,
};
use relay_qos::crypto::generate_keypair;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{HttpGatekeeper, HttpPingMonitor};
use crate::measurements;

const PROCESS_ID: &str = "5b0b8d2c-7d6c-4a53-9d39-5d8f2b7f1a10";

/// Start a fake server on a free port
async fn serve(configure: fn(&mut web::ServiceConfig)) -> (u16, ServerHandle) {
    let server = HttpServer::new(move || App::new().configure(configure))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let port = server.addrs()[0].port();
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (port, handle)
}

fn relay(address: &str) -> serde_json::Value {
    json!({"address": address, "port": 8443, "secure": true, "exclusive": false, "type": "GATEKEEPER_RELAY"})
}

async fn clouds() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "count": 3,
        "data": [
            {"operator": "aitia", "name": "own", "secure": true, "neighbor": false, "ownCloud": true},
            {"operator": "aitia", "name": "direct", "secure": true, "neighbor": true, "ownCloud": false,
             "gatekeeperRelays": [relay("10.0.2.1")]},
            {"operator": "aitia", "name": "relayed", "secure": true, "neighbor": true, "ownCloud": false,
             "gatekeeperRelays": [relay("10.0.3.1"), relay("10.0.3.2")]}
        ]
    }))
}

async fn access_types(clouds: web::Json<Vec<CloudDescriptor>>) -> HttpResponse {
    let data: Vec<CloudAccess> = clouds
        .iter()
        .map(|cloud| CloudAccess {
            cloud_operator: cloud.operator.clone(),
            cloud_name: cloud.name.clone(),
            direct_access: cloud.name == "direct",
        })
        .collect();
    HttpResponse::Ok().json(json!({"count": data.len(), "data": data}))
}

async fn accept_proposal(proposal: web::Json<serde_json::Value>) -> HttpResponse {
    if proposal.get("senderQoSMonitorPublicKey").is_none() {
        return HttpResponse::BadRequest().finish();
    }
    HttpResponse::Created().finish()
}

fn gatekeeper_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/gatekeeper/clouds", web::get().to(clouds))
        .route("/gatekeeper/cloud/access-types", web::post().to(access_types))
        .route("/gatekeeper/relay-test/init", web::post().to(accept_proposal));
}

fn broken_gatekeeper_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/gatekeeper/clouds", web::get().to(clouds))
        .route("/gatekeeper/cloud/access-types", web::post().to(access_types))
        .route("/gatekeeper/relay-test/init", web::post().to(internal_error));
}

async fn ok() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().finish()
}

async fn ack(request: web::Json<ProbeRequest>) -> HttpResponse {
    if request.ttl != 255 {
        return HttpResponse::BadRequest().finish();
    }
    HttpResponse::Ok().json(json!({"ackOk": "OK", "externalMeasurementUuid": PROCESS_ID}))
}

async fn null_ack() -> HttpResponse {
    HttpResponse::Ok().content_type("application/json").body("null")
}

fn ping_monitor_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::post().to(ack))
        .route("/echo", web::get().to(ok))
        .route("/subscribe", web::post().to(ok));
}

fn null_ping_monitor_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ping", web::post().to(null_ack));
}

fn gatekeeper(port: u16) -> Arc<HttpGatekeeper> {
    Arc::new(HttpGatekeeper::new("127.0.0.1", port, false, Duration::from_secs(5)).unwrap())
}

fn echo_context() -> EchoContext {
    EchoContext {
        standalone: false,
        secure_mode: true,
        keypair: Some(Arc::new(generate_keypair())),
    }
}

fn status_update(address: &str, status: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/measurements/relay-echo").set_json(json!({
        "cloud": {"operator": "aitia", "name": "relayed"},
        "relay": relay(address),
        "status": status
    }))
}

async fn proposed_relay(task: &RelayEchoTask) -> String {
    match task.run().await.unwrap() {
        TickOutcome::Submitted(proposal) => proposal.relay.address,
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn ping_monitor(port: u16) -> HttpPingMonitor {
    HttpPingMonitor::new("127.0.0.1", port, "/ping", false, Duration::from_secs(5)).unwrap()
}

#[actix_web::test]
async fn test_topology_and_access_classification() {
    let (port, handle) = serve(gatekeeper_routes).await;
    let gatekeeper = gatekeeper(port);

    let clouds = gatekeeper.list_clouds_with_relays().await.unwrap();
    assert_eq!(clouds.len(), 3);
    assert!(clouds[0].own_cloud);
    assert!(clouds[0].gatekeeper_relays.is_empty());

    let descriptors: Vec<_> = clouds.iter().map(|cloud| cloud.descriptor()).collect();
    let access = gatekeeper.classify_access(&descriptors).await.unwrap();
    assert_eq!(access.iter().filter(|entry| entry.direct_access).count(), 1);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_relay_echo_tick_over_http() {
    let (port, handle) = serve(gatekeeper_routes).await;
    let gatekeeper = gatekeeper(port);

    let selector = CandidateSelector::new(gatekeeper.clone(), Arc::new(MemoryCatalog::new()));
    let task = RelayEchoTask::new(selector, gatekeeper, echo_context());

    match task.run().await.unwrap() {
        TickOutcome::Submitted(proposal) => {
            assert_eq!(proposal.target_cloud.name, "relayed");
            assert_eq!(proposal.relay.address, "10.0.3.1");
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_reported_measurements_rotate_the_tested_pair() {
    let (port, handle) = serve(gatekeeper_routes).await;
    let gatekeeper = gatekeeper(port);
    let catalog = Arc::new(MemoryCatalog::new());
    let receiver = test::init_service(
        App::new()
            .app_data(web::Data::from(catalog.clone()))
            .configure(|cfg| measurements::register(cfg, "/measurements/relay-echo")),
    )
    .await;
    let task = RelayEchoTask::new(CandidateSelector::new(gatekeeper.clone(), catalog), gatekeeper, echo_context());

    // Without reports every tick would propose the same pair
    assert_eq!(proposed_relay(&task).await, "10.0.3.1");
    assert_eq!(proposed_relay(&task).await, "10.0.3.1");

    let response = test::call_service(&receiver, status_update("10.0.3.1", "PENDING").to_request()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(proposed_relay(&task).await, "10.0.3.2");

    for (address, status) in [("10.0.3.1", "FINISHED"), ("10.0.3.2", "PENDING")] {
        let response = test::call_service(&receiver, status_update(address, status).to_request()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
    assert_eq!(proposed_relay(&task).await, "10.0.3.1");

    // Both finished: the older measurement goes first
    let response = test::call_service(&receiver, status_update("10.0.3.2", "FINISHED").to_request()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(proposed_relay(&task).await, "10.0.3.1");

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_rejected_proposal_is_an_error() {
    let (port, handle) = serve(broken_gatekeeper_routes).await;
    let gatekeeper = gatekeeper(port);

    let clouds = gatekeeper.list_clouds_with_relays().await.unwrap();
    let keypair = generate_keypair();
    let proposal = relay_qos::TestProposal::signed(
        clouds[0].descriptor(),
        clouds[2].descriptor(),
        clouds[2].gatekeeper_relays[0].clone(),
        &keypair,
    )
    .unwrap();

    assert!(gatekeeper.submit_test_proposal(&proposal).await.is_err());

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_ping_monitor_ack_and_subscription() {
    let (port, handle) = serve(ping_monitor_routes).await;
    let monitor = ping_monitor(port);

    monitor.check_echo().await.unwrap();
    monitor
        .subscribe(&relay_qos::SystemDescriptor {
            system_name: "qosmonitor".into(),
            address: "127.0.0.1".into(),
            port: 8451,
        })
        .await
        .unwrap();

    let ack = monitor.submit(&ProbeRequest::new("10.0.0.7", &ProbeSettings::default())).await.unwrap();
    assert_eq!(ack.process_id().unwrap(), Uuid::parse_str(PROCESS_ID).unwrap());

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_null_ack_is_unusable() {
    let (port, handle) = serve(null_ping_monitor_routes).await;
    let monitor = ping_monitor(port);

    let ack = monitor.submit(&ProbeRequest::new("10.0.0.7", &ProbeSettings::default())).await.unwrap();
    assert!(ack.process_id().is_err());
    assert!(monitor.check_echo().await.is_err());

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_unreachable_ping_monitor() {
    // Nothing listens on the port of a stopped server
    let (port, handle) = serve(ping_monitor_routes).await;
    handle.stop(true).await;

    let monitor = ping_monitor(port);
    assert!(monitor.check_echo().await.is_err());
}
