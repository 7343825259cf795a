//! Connection monitor tests

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_providers::*;
use gateway_core::{ConnectionStatus, ProviderKind};
use gateway_providers::ConnectionMonitor;
use std::time::Duration;

async fn request_count(mock: &MockOpenAiCompatible) -> usize {
    mock.server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len())
}

#[tokio::test]
async fn test_local_provider_becomes_connected() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["llama3"]).await;

    let monitor = ConnectionMonitor::start(
        gateway(),
        local_config(&mock.url(), "llama3"),
        Duration::from_millis(50),
    );

    assert!(wait_for(Duration::from_secs(2), || monitor.status() == ConnectionStatus::Connected).await);
    monitor.shutdown().await;
}

#[tokio::test]
async fn test_local_provider_polls_until_stopped() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["llama3"]).await;

    let monitor = ConnectionMonitor::start(
        gateway(),
        local_config(&mock.url(), "llama3"),
        Duration::from_millis(50),
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    monitor.stop();
    assert!(monitor.is_stopped());
    monitor.stop();

    let polled = mock.server.received_requests().await.map_or(0, |r| r.len());
    assert!(polled >= 2, "expected repeated polls, got {polled}");

    tokio::time::sleep(Duration::from_millis(200)).await;
    let after_stop = mock.server.received_requests().await.map_or(0, |r| r.len());
    assert!(after_stop <= polled + 1);
}

#[tokio::test]
async fn test_unreachable_local_provider_is_disconnected() {
    let monitor = ConnectionMonitor::start(
        gateway_with_probe_timeout(Duration::from_millis(200)),
        local_config("http://127.0.0.1:1", "llama3"),
        Duration::from_secs(30),
    );

    assert!(wait_for(Duration::from_secs(2), || monitor.status() == ConnectionStatus::Disconnected).await);
    monitor.shutdown().await;
}

#[tokio::test]
async fn test_hosted_provider_rechecks_on_demand() {
    let mock = MockOpenAiCompatible::new().await;
    mock.mock_models("gsk-test", &["llama-3.1-8b-instant"]).await;

    let monitor = ConnectionMonitor::start(
        gateway_with_api_base(ProviderKind::Groq, &mock.url()),
        hosted_config(ProviderKind::Groq, "llama-3.1-8b-instant", "gsk-test"),
        Duration::from_millis(50),
    );

    assert!(wait_for(Duration::from_secs(2), || monitor.status() == ConnectionStatus::Connected).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(request_count(&mock).await, 1);

    monitor.check_now();
    let mut rechecked = false;
    for _ in 0..100 {
        if request_count(&mock).await == 2 {
            rechecked = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(rechecked);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_subscribers_see_status_changes() {
    let mock = MockLocal::new().await;
    mock.mock_tags(&["llama3"]).await;

    let monitor = ConnectionMonitor::start(
        gateway(),
        local_config(&mock.url(), "llama3"),
        Duration::from_secs(30),
    );
    let mut status = monitor.subscribe();

    let connected = tokio::time::timeout(
        Duration::from_secs(2),
        status.wait_for(|s| *s == ConnectionStatus::Connected),
    )
    .await;
    assert!(matches!(connected, Ok(Ok(_))));

    monitor.shutdown().await;
}
