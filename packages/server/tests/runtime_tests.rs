//! Dual-server runtime: startup, graceful drain and shutdown triggers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::common::{test_config, RunningApp, SlowRepository};
use providers_core::domains::providers::{InMemoryProviderRepository, ProviderService};
use providers_core::kernel::{RuntimeState, Trigger};
use providers_core::server::grpc::proto::ListAllProvidersRequest;
use providers_core::server::Application;

fn service() -> Arc<ProviderService> {
    Arc::new(ProviderService::new(Arc::new(
        InMemoryProviderRepository::new(),
    )))
}

#[tokio::test]
async fn both_servers_answer_while_running() {
    let app = RunningApp::in_memory().await;

    let health = reqwest::get(app.http_url("/healthz")).await.unwrap();
    let listed = app
        .grpc_client()
        .await
        .list_all_providers(ListAllProvidersRequest {})
        .await;

    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert!(listed.is_ok());
    assert_eq!(*app.state.borrow(), RuntimeState::Running);

    app.stop().await;
}

#[tokio::test]
async fn occupied_http_port_aborts_startup() {
    let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let mut config = test_config(Duration::from_secs(3));
    config.http.port = taken.local_addr().unwrap().port();

    let err = Application::bind(&config, service()).await.err().unwrap();

    assert!(err.to_string().contains("HTTP"));
}

#[tokio::test]
async fn occupied_grpc_port_aborts_startup() {
    let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
    let mut config = test_config(Duration::from_secs(3));
    config.grpc.port = taken.local_addr().unwrap().port();

    let err = Application::bind(&config, service()).await.err().unwrap();

    assert!(err.to_string().contains("gRPC"));
}

#[tokio::test]
async fn signal_moves_through_draining_to_stopped() {
    let app = RunningApp::in_memory().await;
    let mut state = app.state.clone();

    app.signal_shutdown();
    state
        .wait_for(|s| matches!(s, RuntimeState::Draining | RuntimeState::Stopped))
        .await
        .unwrap();
    let trigger = app.stopped().await;

    assert!(matches!(trigger, Trigger::Signal));
    assert_eq!(*state.borrow(), RuntimeState::Stopped);
}

#[tokio::test]
async fn in_flight_http_request_completes_during_drain() {
    let repo = Arc::new(SlowRepository::new(Duration::from_millis(300)));
    let entered = repo.entered.clone();
    let app = RunningApp::start(repo, Duration::from_secs(3)).await;

    let url = app.http_url("/v1/providers");
    let in_flight = tokio::spawn(async move { reqwest::get(url).await });
    entered.notified().await;

    let http_addr = app.http_addr;
    let trigger = app.stop().await;
    let response = in_flight.await.unwrap().unwrap();

    assert!(matches!(trigger, Trigger::Signal));
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let after = reqwest::get(format!("http://{}/healthz", http_addr)).await;
    assert!(after.unwrap_err().is_connect());
}

#[tokio::test]
async fn http_drain_is_bounded_by_shutdown_timeout() {
    let repo = Arc::new(SlowRepository::new(Duration::from_secs(30)));
    let entered = repo.entered.clone();
    let app = RunningApp::start(repo, Duration::from_millis(200)).await;

    let url = app.http_url("/v1/providers");
    let _stuck = tokio::spawn(async move { reqwest::get(url).await });
    entered.notified().await;

    let http_addr = app.http_addr;
    let trigger = tokio::time::timeout(Duration::from_secs(5), app.stop())
        .await
        .expect("drain was not bounded");

    // Drain failures are logged, not returned.
    assert!(matches!(trigger, Trigger::Signal));
    let after = reqwest::get(format!("http://{}/healthz", http_addr)).await;
    assert!(after.unwrap_err().is_connect());
}

#[tokio::test]
async fn request_outliving_http_drain_is_aborted() {
    let repo = Arc::new(SlowRepository::new(Duration::from_secs(2)));
    let entered = repo.entered.clone();
    let app = RunningApp::start(repo, Duration::from_millis(200)).await;

    let url = app.http_url("/v1/providers");
    let in_flight = tokio::spawn(async move { reqwest::get(url).await });
    entered.notified().await;

    app.stop().await;
    let outcome = tokio::time::timeout(Duration::from_secs(1), in_flight)
        .await
        .expect("request kept running after the drain timed out")
        .unwrap();

    let status = outcome.ok().map(|response| response.status());
    assert_ne!(status, Some(reqwest::StatusCode::OK));
}

#[tokio::test]
async fn in_flight_grpc_call_completes_during_drain() {
    let repo = Arc::new(SlowRepository::new(Duration::from_millis(300)));
    let entered = repo.entered.clone();
    let app = RunningApp::start(repo, Duration::from_secs(3)).await;

    let mut client = app.grpc_client().await;
    let in_flight = tokio::spawn(async move {
        client
            .list_all_providers(ListAllProvidersRequest {})
            .await
    });
    entered.notified().await;

    let trigger = app.stop().await;
    let response = in_flight.await.unwrap();

    assert!(matches!(trigger, Trigger::Signal));
    assert!(response.unwrap().into_inner().providers.is_empty());
}
