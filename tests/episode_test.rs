mod common;

use game_evaluator::{EpisodeRequest, EpisodeRunner};
use reqwest::Client;
use std::net::SocketAddr;
use std::time::Duration;

fn runner(addr: SocketAddr) -> EpisodeRunner {
    EpisodeRunner::new(
        Client::new(),
        format!("http://{}/evaluate", addr),
        Duration::from_secs(5),
    )
}

fn request(task_id: u64) -> EpisodeRequest {
    EpisodeRequest {
        model: "Qwen/Qwen2.5-3B-Instruct".to_string(),
        base_url: "http://vllm-server:8000/v1".to_string(),
        task_id,
        temperature: 0.0,
        seed: Some(42),
        opponent: None,
        api_key: None,
    }
}

#[tokio::test]
async fn flat_response_shape_is_accepted() {
    let addr = common::spawn_fixed(
        200,
        r#"{"score": 0.75, "time_taken": 1.5, "task_name": "gin_rummy", "success": true}"#,
    );
    let result = runner(addr).run(&request(300000001)).await;
    assert_eq!(result.task_id, 300000001);
    assert_eq!(result.score, 0.75);
    assert_eq!(result.time_taken, 1.5);
    assert_eq!(result.task_name, "gin_rummy");
    assert!(result.success);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn wrapped_response_shape_is_accepted() {
    let addr = common::spawn_fixed(
        200,
        r#"{"status": "success", "result": {"score": 0.5, "task_name": "hearts"}}"#,
    );
    let result = runner(addr).run(&request(800000001)).await;
    assert_eq!(result.score, 0.5);
    assert_eq!(result.task_name, "hearts");
    // Success comes from the wrapper status when the inner result omits it.
    assert!(result.success);
    // time_taken falls back to the measured wall time.
    assert!(result.time_taken >= 0.0);
}

#[tokio::test]
async fn wrapped_fields_win_over_flat_ones() {
    let addr = common::spawn_fixed(
        200,
        r#"{"score": 9.9, "status": "success", "result": {"score": 0.25}}"#,
    );
    let result = runner(addr).run(&request(1)).await;
    assert_eq!(result.score, 0.25);
}

#[tokio::test]
async fn missing_fields_get_protocol_defaults() {
    let addr = common::spawn_fixed(200, "{}");
    let result = runner(addr).run(&request(1)).await;
    assert_eq!(result.score, 0.0);
    assert!(!result.success);
    assert_eq!(result.task_name, "unknown");
    assert!(result.error.is_none());
}

#[tokio::test]
async fn server_error_becomes_a_failed_result() {
    let addr = common::spawn_fixed(500, r#"{"detail": "engine exploded"}"#);
    let result = runner(addr).run(&request(17)).await;
    assert_eq!(result.task_id, 17);
    assert_eq!(result.score, 0.0);
    assert!(!result.success);
    let error = result.error.expect("error populated");
    assert!(error.contains("500"));
    assert!(error.contains("engine exploded"));
}

#[tokio::test]
async fn malformed_body_becomes_a_failed_result() {
    let addr = common::spawn_fixed(200, r#"{"score": "very high"}"#);
    let result = runner(addr).run(&request(5)).await;
    assert!(!result.success);
    assert_eq!(result.score, 0.0);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn unreachable_server_becomes_a_failed_result() {
    let addr = common::closed_port_addr();
    let result = runner(addr).run(&request(9)).await;
    assert!(!result.success);
    assert_eq!(result.score, 0.0);
    assert!(result.error.is_some());
    assert!(result.time_taken >= 0.0);
}
