//! End-to-end tests for the HTTP surface: a real listener on an ephemeral
//! port, a real config file in a tempdir, no poller running.

use raceticker_service::{AppContext, router};
use serde_json::{Value, json};

const CONFIG_YAML: &str = concat!(
    "app:\n  host: 127.0.0.1\n  port: 8080\n",
    "mode:\n  source: live\n  freeze_updates: false\n",
    "races:\n  active_race_id: race_5k\n  profiles:\n",
    "    race_5k:\n      name: 5K\n      csv_url: \"http://feed.example/5k.csv\"\n",
    "    race_half:\n      name: Half Marathon\n      csv_url: \"http://feed.example/half.csv\"\n",
);

struct TestApp {
    base: String,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

impl TestApp {
    async fn get(&self, path: &str) -> Value {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json body")
    }

    async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .expect("request");
        let status = response.status().as_u16();
        let body = response.json().await.expect("json body");
        (status, body)
    }
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, CONFIG_YAML).expect("write config");

    let context = AppContext::bootstrap(&config_path).expect("bootstrap");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(context)).await.expect("serve");
    });

    TestApp {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

#[tokio::test]
async fn clock_endpoints_drive_the_state_machine() {
    let app = spawn_app().await;

    let clock = app.get("/api/clock").await;
    assert_eq!(clock["state"], "stopped");
    assert_eq!(clock["elapsed_display"], "0:00");

    let (status, body) = app.post("/api/clock/start", &json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    assert_eq!(app.get("/api/clock").await["state"], "running");

    let (_, body) = app.post("/api/clock/pause", &json!({})).await;
    assert_eq!(body["ok"], true);
    assert_eq!(app.get("/api/clock").await["state"], "paused");

    app.post("/api/clock/reset", &json!({})).await;
    let clock = app.get("/api/clock").await;
    assert_eq!(clock["state"], "stopped");
    assert_eq!(clock["elapsed_seconds"], 0.0);
}

#[tokio::test]
async fn payload_starts_as_loading_and_loop_complete_reports_no_swap() {
    let app = spawn_app().await;

    let payload = app.get("/api/payload").await;
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["ticker_text"], "Loading Data");
    assert_eq!(payload["style"]["text_color"], "#ff9900");

    let (status, body) = app.post("/api/loop_complete", &json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body["swapped"], false);
    assert_eq!(body["version"], 1);
}

#[tokio::test]
async fn config_patch_persists_and_refreshes_the_active_payload() {
    let app = spawn_app().await;

    let (status, config) = app
        .post("/api/config", &json!({"display": {"max_runners": 5}}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(config["display"]["max_runners"], 5);
    assert_eq!(app.get("/api/config").await["display"]["max_runners"], 5);

    // A presentation patch takes effect without waiting for a loop boundary.
    let payload = app.get("/api/payload").await;
    assert!(payload["version"].as_u64().expect("version") > 1);
    assert_eq!(payload["ticker_text"], "Loading Data");
}

#[tokio::test]
async fn invalid_config_patch_is_rejected_without_side_effects() {
    let app = spawn_app().await;

    let (status, body) = app
        .post("/api/config", &json!({"csv": {"timeout_s": 0}}))
        .await;
    assert_eq!(status, 400);
    assert!(
        body["error"]
            .as_str()
            .expect("message")
            .contains("timeout_s")
    );

    let config = app.get("/api/config").await;
    assert_eq!(config["csv"]["timeout_s"], 5.0);
}

#[tokio::test]
async fn mode_endpoint_validates_source() {
    let app = spawn_app().await;

    let (status, body) = app.post("/api/mode", &json!({"source": "replay"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "source must be 'live' or 'simulate'");

    let (status, _) = app.post("/api/mode", &json!({"source": "simulate"})).await;
    assert_eq!(status, 200);
    assert_eq!(app.get("/api/config").await["mode"]["source"], "simulate");
}

#[tokio::test]
async fn freeze_endpoint_requires_a_boolean() {
    let app = spawn_app().await;

    let (status, body) = app.post("/api/freeze", &json!({"freeze": "yes"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "freeze must be boolean");

    let (status, _) = app.post("/api/freeze", &json!({"freeze": true})).await;
    assert_eq!(status, 200);
    assert_eq!(
        app.get("/api/config").await["mode"]["freeze_updates"],
        true
    );
}

#[tokio::test]
async fn race_select_rejects_unknown_ids() {
    let app = spawn_app().await;

    let (status, body) = app
        .post("/api/race/select", &json!({"race_id": "race_ultra"}))
        .await;
    assert_eq!(status, 400);
    assert!(
        body["error"]
            .as_str()
            .expect("message")
            .contains("race_ultra")
    );

    let (status, body) = app.post("/api/race/select", &json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "race_id required (string)");

    let (status, _) = app
        .post("/api/race/select", &json!({"race_id": "race_half"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(
        app.get("/api/config").await["races"]["active_race_id"],
        "race_half"
    );
}

#[tokio::test]
async fn status_reports_clock_and_fetch_state() {
    let app = spawn_app().await;

    let status = app.get("/status").await;
    assert_eq!(status["config_loaded"], true);
    assert_eq!(status["clock"]["state"], "stopped");
    assert_eq!(status["using_last_known_good"], false);
    assert_eq!(status["race_state_summary"], Value::Null);
    assert!(status["uptime_seconds"].as_f64().expect("uptime") >= 0.0);
    assert!(
        status["current_time_utc"]
            .as_str()
            .expect("timestamp")
            .ends_with('Z')
    );
}
