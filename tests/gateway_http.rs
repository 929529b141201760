//! Integration test: start the gateway on a free port and drive it over real HTTP.
//! The server task is aborted when each test ends.

use honeypot::config::Config;
use honeypot::gateway;
use serde_json::{json, Value};
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

struct Running {
    base: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start(config: Config) -> Running {
    let port = free_port();
    let handle = tokio::spawn(async move {
        let _ = gateway::run_gateway("127.0.0.1", port, config).await;
    });

    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&base).send().await {
            if resp.status().is_success() {
                return Running {
                    base,
                    client,
                    handle,
                };
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    handle.abort();
    panic!("gateway at {base} did not become healthy within 5s");
}

#[tokio::test]
async fn health_and_escalation_over_http() {
    let server = start(Config::default()).await;

    let health: Value = server
        .client
        .get(format!("{}/honeypot", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "success"}));

    let defaults = Config::default().persona.replies;
    let body = json!({"sessionId": "http-a1", "message": "your account is blocked, verify now"});
    let mut last = Value::Null;
    for n in 1..=3u64 {
        let resp = server
            .client
            .post(format!("{}/honeypot", server.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        last = resp.json().await.unwrap();
        assert_eq!(last["messageCount"], n);
        assert_eq!(last["scamDetected"], true);
        let reply = last["reply"].as_str().unwrap().to_string();
        if n < 3 {
            assert!(defaults.confused.contains(&reply));
        }
    }
    let reply = last["reply"].as_str().unwrap().to_string();
    assert!(defaults.helper.contains(&reply));
}

#[tokio::test]
async fn bad_api_key_gets_401() {
    let server = start(Config::default()).await;

    let resp = server
        .client
        .post(&server.base)
        .header("x-api-key", "badkey")
        .body(r#"{"message":"bank"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Invalid API Key"}));
}

#[tokio::test]
async fn empty_body_is_answered_neutrally() {
    let server = start(Config::default()).await;

    let resp = server.client.post(&server.base).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["scamDetected"], false);
    assert_eq!(body["reply"], "Okay.");
    assert_eq!(body["messageCount"], 1);
}

#[tokio::test]
async fn concurrent_requests_for_one_session_get_distinct_counts() {
    let server = start(Config::default()).await;
    let n = 32u64;

    let tasks: Vec<_> = (0..n)
        .map(|_| {
            let client = server.client.clone();
            let url = format!("{}/honeypot", server.base);
            tokio::spawn(async move {
                let body: Value = client
                    .post(url)
                    .json(&json!({"session_id": "burst", "message": "urgent"}))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                body["messageCount"].as_u64().unwrap()
            })
        })
        .collect();

    let mut counts = Vec::new();
    for task in tasks {
        counts.push(task.await.unwrap());
    }
    counts.sort_unstable();
    assert_eq!(counts, (1..=n).collect::<Vec<_>>());
}
