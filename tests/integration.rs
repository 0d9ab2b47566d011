use futures::StreamExt;
use grammar_quiz::{build_state, config::AppConfig, routes::build_router};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

async fn spawn_server_with(config: AppConfig) -> String {
    let state = build_state(&config).await.expect("state");
    let app = build_router(state, &config.cors_origins);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_server() -> String {
    spawn_server_with(AppConfig::default()).await
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> (reqwest::StatusCode, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap())
}

async fn wait_for_status(client: &reqwest::Client, base: &str, status: &str) -> Value {
    for _ in 0..100 {
        let view: Value = client
            .get(format!("{}/api/v1/quiz", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if view["status"] == status {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("quiz never reached {status}");
}

#[tokio::test]
async fn topics_are_listed() {
    let base = spawn_server().await;
    let body: Value = reqwest::get(format!("{}/api/v1/topics", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["countOptions"], json!([20, 40, 50, 100]));
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 30);
    assert!(topics.iter().any(|t| t["id"] == "modals"));
}

#[tokio::test]
async fn rejects_unknown_topic_and_bad_counts() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = post(&client, format!("{}/api/v1/quiz/start", base), json!({"count": 20})).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

    let resp = client
        .post(format!("{}/api/v1/quiz/topic", base))
        .header("x-request-id", "req-404")
        .json(&json!({"topicId": "klingon"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["request_id"], "req-404");

    let (status, _) = post(&client, format!("{}/api/v1/quiz/topic", base), json!({"topicId": "modals"})).await;
    assert_eq!(status, 200);

    let (status, body) = post(&client, format!("{}/api/v1/quiz/start", base), json!({"count": 101})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"][0]["field"], "count");

    let view = wait_for_status(&client, &base, "setup").await;
    assert_eq!(view["topic"]["name"], "Modal Verbs");
}

#[tokio::test]
async fn full_quiz_flow_over_http() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let view = wait_for_status(&client, &base, "idle").await;
    assert!(view.get("topic").is_none());

    let (_, view) = post(&client, format!("{}/api/v1/quiz/topic", base), json!({"topicId": "tenses"})).await;
    assert_eq!(view["status"], "setup");

    let (status, view) = post(&client, format!("{}/api/v1/quiz/start", base), json!({"count": 20})).await;
    assert_eq!(status, 202);
    assert_eq!(view["status"], "loading");
    assert_eq!(view["requestedCount"], 20);

    let view = wait_for_status(&client, &base, "active").await;
    assert_eq!(view["session"]["questionNumber"], 1);
    assert_eq!(view["session"]["total"], 20);
    assert_eq!(view["session"]["question"]["options"].as_array().unwrap().len(), 4);

    let (status, _) = post(&client, format!("{}/api/v1/quiz/next", base), json!({})).await;
    assert_eq!(status, 409);

    let (_, view) = post(&client, format!("{}/api/v1/quiz/hint", base), json!({})).await;
    assert!(view["session"]["question"]["hint"].is_string());

    // mock questions cycle the correct index through 0..4
    let (_, res) = post(&client, format!("{}/api/v1/quiz/answer", base), json!({"option": 1})).await;
    assert_eq!(res["feedback"]["outcome"], "incorrect");
    assert_eq!(res["feedback"]["correctOption"], 0);
    assert_eq!(res["quiz"]["session"]["score"], json!({"correct": 0, "wrong": 1}));

    let (status, res) = post(&client, format!("{}/api/v1/quiz/answer", base), json!({"option": 0})).await;
    assert_eq!(status, 200);
    assert!(res["feedback"].is_null());
    assert_eq!(res["quiz"]["session"]["score"], json!({"correct": 0, "wrong": 1}));

    let (status, _) = post(&client, format!("{}/api/v1/quiz/hint", base), json!({})).await;
    assert_eq!(status, 409);

    for i in 1..20 {
        let (_, view) = post(&client, format!("{}/api/v1/quiz/next", base), json!({})).await;
        assert_eq!(view["session"]["questionNumber"], i + 1);
        assert!(view["session"]["question"].get("answer").is_none());
        let (_, res) = post(&client, format!("{}/api/v1/quiz/answer", base), json!({"option": i % 4})).await;
        assert_eq!(res["feedback"]["outcome"], "correct");
    }

    let (_, view) = post(&client, format!("{}/api/v1/quiz/next", base), json!({})).await;
    assert_eq!(view["status"], "finished");
    assert_eq!(view["summary"]["correct"], 19);
    assert_eq!(view["summary"]["wrong"], 1);
    assert_eq!(view["summary"]["correctPct"], 95.0);

    let (status, view) = post(&client, format!("{}/api/v1/quiz/restart", base), json!({})).await;
    assert_eq!(status, 202);
    assert_eq!(view["status"], "loading");
    assert_eq!(view["topic"]["id"], "tenses");

    let view = wait_for_status(&client, &base, "active").await;
    assert_eq!(view["session"]["score"], json!({"correct": 0, "wrong": 0}));
    assert_eq!(view["session"]["questionNumber"], 1);

    let (_, view) = post(&client, format!("{}/api/v1/quiz/home", base), json!({})).await;
    assert_eq!(view["status"], "idle");
}

#[tokio::test]
async fn reconfigure_returns_to_setup_from_finished() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    post(&client, format!("{}/api/v1/quiz/topic", base), json!({"topicId": "articles"})).await;
    post(&client, format!("{}/api/v1/quiz/start", base), json!({"count": 1})).await;
    wait_for_status(&client, &base, "active").await;

    let (status, _) = post(&client, format!("{}/api/v1/quiz/reconfigure", base), json!({})).await;
    assert_eq!(status, 409);

    post(&client, format!("{}/api/v1/quiz/answer", base), json!({"option": 0})).await;
    let (_, view) = post(&client, format!("{}/api/v1/quiz/next", base), json!({})).await;
    assert_eq!(view["status"], "finished");

    let (status, view) = post(&client, format!("{}/api/v1/quiz/reconfigure", base), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(view["status"], "setup");
    assert_eq!(view["topic"]["id"], "articles");
    assert!(view.get("error").is_none());
}

#[tokio::test]
async fn preferences_are_persisted() {
    let dir = std::env::temp_dir().join(format!("grammar_quiz_it_{}", uuid::Uuid::new_v4()));
    let path = dir.join("preferences.json");
    let config = AppConfig {
        preferences_path: Some(path.clone()),
        ..AppConfig::default()
    };
    let base = spawn_server_with(config).await;
    let client = reqwest::Client::new();

    let prefs: Value = client
        .get(format!("{}/api/v1/preferences", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prefs, json!({"darkMode": false, "muted": false}));

    let prefs: Value = client
        .put(format!("{}/api/v1/preferences", base))
        .json(&json!({"darkMode": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prefs, json!({"darkMode": true, "muted": false}));

    let stored: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(stored["grammar_dark_mode"], true);
    assert_eq!(stored["grammar_muted"], false);

    let restarted = spawn_server_with(AppConfig {
        preferences_path: Some(path.clone()),
        ..AppConfig::default()
    })
    .await;
    let prefs: Value = client
        .get(format!("{}/api/v1/preferences", restarted))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prefs["darkMode"], true);

    let _ = tokio::fs::remove_dir_all(dir).await;
}

#[tokio::test]
async fn ws_receives_status_and_feedback_events() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let ws_url = format!("{}/ws/events", base.replace("http://", "ws://"));
    let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();
    // the server subscribes after the upgrade completes
    tokio::time::sleep(Duration::from_millis(100)).await;

    client
        .put(format!("{}/api/v1/preferences", base))
        .json(&json!({"muted": true}))
        .send()
        .await
        .unwrap();
    post(&client, format!("{}/api/v1/quiz/topic", base), json!({"topicId": "prepositions"})).await;
    post(&client, format!("{}/api/v1/quiz/start", base), json!({"count": 5})).await;
    wait_for_status(&client, &base, "active").await;
    post(&client, format!("{}/api/v1/quiz/answer", base), json!({"option": 0})).await;

    let mut statuses = Vec::new();
    let feedback = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let env: Value = serde_json::from_str(&text).unwrap();
            if env["event"] == "status_changed" {
                statuses.push(env["payload"]["status"].as_str().unwrap().to_string());
            }
            if env["event"] == "answer_feedback" {
                return env;
            }
        }
        panic!("ws closed before feedback");
    })
    .await
    .expect("feedback event");

    assert_eq!(statuses, vec!["setup", "loading", "active"]);
    assert_eq!(feedback["payload"]["feedback"]["outcome"], "correct");
    assert_eq!(feedback["payload"]["muted"], true);
    assert!(feedback["ts"].is_string());
}
