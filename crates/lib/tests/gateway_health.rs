//! Integration test: start the gateway on a free port and talk to it over HTTP.
//! Does not require an AI backend or a messaging gateway. The server task is left running when the test ends.

use lib::config::Config;
use lib::gateway;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

const WEBHOOK_SECRET: &str = "s3cret";

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

fn temp_config_dir() -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("torcida-gateway-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create config dir");
    let config_path = dir.join("config.json");
    std::fs::File::create(&config_path)
        .and_then(|mut f| f.write_all(b"{}"))
        .expect("write config.json");
    std::fs::write(dir.join("catalog.json"), lib::init::BUNDLED_CATALOG).expect("write catalog.json");
    (dir, config_path)
}

/// Spawn the gateway and wait until GET / answers. Returns the base URL.
async fn start_gateway() -> String {
    let port = free_port();
    let (_temp_dir, config_path) = temp_config_dir();

    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    config.channels.messaging.webhook_secret = Some(WEBHOOK_SECRET.to_string());

    tokio::spawn(async move {
        let _ = gateway::run_gateway(config, config_path).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(format!("{}/", base)).send().await {
            Ok(resp) if resp.status().is_success() => return base,
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "GET {}/ did not return 200 within 5s; last error: {:?}",
        base, last_err
    );
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let base = start_gateway().await;
    let json: serde_json::Value = reqwest::get(format!("{}/", base))
        .await
        .expect("GET /")
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
    assert_eq!(json.get("protocol").and_then(|v| v.as_u64()), Some(1));
    let port = base.rsplit(':').next().and_then(|p| p.parse::<u64>().ok());
    assert_eq!(json.get("port").and_then(|v| v.as_u64()), port);
}

#[tokio::test]
async fn webhook_checks_secret_and_acks_events() {
    let base = start_gateway().await;
    let client = reqwest::Client::new();
    let url = format!("{}/webhook", base);

    let resp = client
        .post(&url)
        .json(&serde_json::json!({"type": "ReceivedCallback", "phone": "5511999990000", "text": {"message": "oi"}}))
        .send()
        .await
        .expect("POST /webhook");
    assert_eq!(resp.status().as_u16(), 403);

    let ack: serde_json::Value = client
        .post(&url)
        .header("X-Webhook-Secret", WEBHOOK_SECRET)
        .json(&serde_json::json!({"type": "ReceivedCallback", "phone": "5511999990000", "fromMe": true, "text": {"message": "oi"}}))
        .send()
        .await
        .expect("POST /webhook")
        .json()
        .await
        .expect("ack JSON");
    assert_eq!(ack["success"], true);
    assert_eq!(ack["status"], "filtered");

    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", WEBHOOK_SECRET)
        .body("not json")
        .send()
        .await
        .expect("POST /webhook");
    assert!(resp.status().is_success());
    let ack: serde_json::Value = resp.json().await.expect("ack JSON");
    assert_eq!(ack["success"], false);
    assert!(ack["error"].as_str().is_some());

    let ack: serde_json::Value = client
        .post(&url)
        .header("X-Webhook-Secret", WEBHOOK_SECRET)
        .json(&serde_json::json!({"channel": "web", "userId": "w-9", "message": "tabela"}))
        .send()
        .await
        .expect("POST /webhook")
        .json()
        .await
        .expect("ack JSON");
    assert_eq!(ack["status"], "processed");
    assert_eq!(ack["intent"], "standings");
    assert!(ack["reply"].as_str().unwrap_or("").contains("Tabela"));
}

#[tokio::test]
async fn simulate_and_metrics() {
    let base = start_gateway().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/simulate", base))
        .json(&serde_json::json!({"userId": "sim-1", "message": "oi", "name": "Carla"}))
        .send()
        .await
        .expect("POST /simulate")
        .json()
        .await
        .expect("simulate JSON");
    assert!(body["reply"].as_str().unwrap_or("").starts_with("Olá, Carla!"));

    let metrics: serde_json::Value = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .expect("GET /metrics")
        .json()
        .await
        .expect("metrics JSON");
    assert_eq!(metrics["totalRequests"], 1);
    assert_eq!(metrics["patternHits"], 1);

    let reload: serde_json::Value = client
        .post(format!("{}/admin/reload-aliases", base))
        .send()
        .await
        .expect("POST /admin/reload-aliases")
        .json()
        .await
        .expect("reload JSON");
    assert_eq!(reload["ok"], true);
    assert!(reload["teams"].as_u64().unwrap_or(0) >= 10);
}
