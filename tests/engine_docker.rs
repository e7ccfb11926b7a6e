//! Integration tests against a live container engine.
//!
//! These need a running Docker/Podman daemon, so they are `#[ignore]`d by
//! default; run them with `cargo test -- --ignored`. They additionally gate
//! on engine availability (or SKIP_CONTAINER_TESTS=1) so an explicit run on
//! a daemonless machine skips instead of failing.

use redock::{ContainerEngine, DockerEngine, EngineClient, EngineError};
use serial_test::serial;
use test_tag::tag;

/// Check if container tests should run.
fn should_run_container_tests() -> bool {
    if let Ok(value) = std::env::var("SKIP_CONTAINER_TESTS") {
        if value == "1" || value.eq_ignore_ascii_case("true") {
            return false;
        }
    }

    std::process::Command::new("docker")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
        || std::process::Command::new("podman")
            .arg("info")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
}

#[tokio::test]
#[serial]
#[tag(integration, engine)]
#[ignore] // Requires Docker/Podman
async fn connects_and_pings() {
    if !should_run_container_tests() {
        eprintln!("Skipping engine tests (no daemon or SKIP_CONTAINER_TESTS=1)");
        return;
    }

    let client = EngineClient::new().await.expect("Failed to connect");
    client.ping().await.expect("Ping failed");
}

#[tokio::test]
#[serial]
#[tag(integration, engine)]
#[ignore] // Requires Docker/Podman
async fn stop_of_missing_container_is_not_found() {
    if !should_run_container_tests() {
        eprintln!("Skipping engine tests");
        return;
    }

    let engine = DockerEngine::connect().await.expect("Failed to connect");
    let err = engine
        .stop("redock-test-does-not-exist")
        .await
        .expect_err("stop of a missing container should fail");
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
#[serial]
#[tag(integration, engine)]
#[ignore] // Requires Docker/Podman
async fn remove_of_missing_container_is_not_found() {
    if !should_run_container_tests() {
        eprintln!("Skipping engine tests");
        return;
    }

    let engine = DockerEngine::connect().await.expect("Failed to connect");
    let err = engine
        .remove("redock-test-does-not-exist")
        .await
        .expect_err("remove of a missing container should fail");
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
#[serial]
#[tag(integration, engine)]
#[ignore] // Requires Docker/Podman
async fn build_with_missing_context_fails() {
    if !should_run_container_tests() {
        eprintln!("Skipping engine tests");
        return;
    }

    let engine = DockerEngine::connect().await.expect("Failed to connect");
    let err = engine
        .build(std::path::Path::new("/nonexistent/context"), "redock-test")
        .await
        .expect_err("build from a missing context should fail");
    assert!(matches!(err, EngineError::Io(_)));
}
