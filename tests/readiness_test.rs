mod common;

use game_evaluator::{EvalError, ReadinessGate};
use reqwest::Client;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn gate(poll_millis: u64) -> ReadinessGate {
    ReadinessGate::new(Client::new(), Duration::from_millis(poll_millis))
}

#[tokio::test]
async fn ready_on_first_probe() {
    let (addr, hits) = common::spawn_flaky_probe(0);
    gate(10)
        .wait_ready(&addr.to_string(), "/v1/models", Some(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_probes_do_not_abort_the_wait() {
    let failures = 3;
    let (addr, hits) = common::spawn_flaky_probe(failures);
    gate(10)
        .wait_ready(&addr.to_string(), "/v1/models", Some(Duration::from_secs(5)))
        .await
        .unwrap();
    // Exactly N failures then one success.
    assert_eq!(hits.load(Ordering::SeqCst), failures + 1);
}

#[tokio::test]
async fn unreachable_service_times_out() {
    let addr = common::closed_port_addr();
    let err = gate(20)
        .wait_ready(
            &addr.to_string(),
            "/v1/models",
            Some(Duration::from_millis(150)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::ReadinessTimeout { .. }));
}

#[tokio::test]
async fn deadline_is_checked_even_when_probes_connect() {
    // Server answers but never with 200, so only the deadline can end the wait.
    let addr = common::spawn_fixed(503, "{}");
    let err = gate(20)
        .wait_ready(
            &addr.to_string(),
            "/v1/models",
            Some(Duration::from_millis(150)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::ReadinessTimeout { .. }));
}
