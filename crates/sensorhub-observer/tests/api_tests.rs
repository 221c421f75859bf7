//! Integration tests for the Observer API endpoints.
//!
//! Most tests use Axum's `Router` directly via `tower::ServiceExt`
//! without starting a TCP server. The last two spawn the server on a
//! loopback port to cover the socket path and the live stream.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::StreamExt;
use sensorhub_core::{FanOut, Ingestor, ManualClock, SensorStore, TopicRouter};
use sensorhub_observer::router::build_router;
use sensorhub_observer::server::ServerConfig;
use sensorhub_observer::startup::spawn_observer;
use sensorhub_observer::state::AppState;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

async fn make_test_parts() -> (Arc<AppState>, Ingestor) {
    let clock = Arc::new(ManualClock::new(2000.0));
    let store = Arc::new(SensorStore::new());
    let fanout = FanOut::new(16);
    let ingestor = Ingestor::new(
        TopicRouter::new(clock.clone()),
        Arc::clone(&store),
        fanout.clone(),
    );

    let events: [(&str, &str); 6] = [
        (
            "iot/parking/disponibilite/P1",
            r#"{"name":"P1","places_disponibles":42,"timestamp":1000}"#,
        ),
        (
            "iot/parking/disponibilite/P1",
            r#"{"name":"P1","places_disponibles":30,"timestamp":1010}"#,
        ),
        (
            "iot/batiments/info/sciences",
            r#"{"salles":[{"occupation_actuelle":12},{"occupation_actuelle":8}],"timestamp":1005}"#,
        ),
        (
            "iot/wifi/etat/AP001",
            r#"{"puissance_signal":-61.5,"utilisateurs_connectes":17,"timestamp":1001}"#,
        ),
        (
            "iot/transport/position/bus/BUS_L1_1",
            r#"{"latitude":48.85,"longitude":2.35,"passagers":23,"timestamp":1002}"#,
        ),
        ("iot/parking/disponibilite/P1", "{not json"),
    ];
    for (channel, payload) in events {
        let _ = ingestor.handle(channel, payload.as_bytes()).await;
    }

    let state = Arc::new(AppState::new(store, fanout, ingestor.stats(), clock));
    (state, ingestor)
}

async fn make_test_state() -> Arc<AppState> {
    make_test_parts().await.0
}

fn loopback() -> ServerConfig {
    ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(path: &str) -> (StatusCode, Value) {
    let state = make_test_state().await;
    let response = build_router(state)
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

#[tokio::test]
async fn test_status_reports_counters() {
    let (status, json) = get("/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "online");
    assert_eq!(json["timestamp"], 2000.0);
    assert_eq!(json["stats"]["accepted"], 5);
    assert_eq!(json["stats"]["dropped_malformed"], 1);
    assert_eq!(json["store"]["parking"], json!({"entities": 1, "records": 2}));
    assert_eq!(json["store"]["transport_taxi"], json!({"entities": 0, "records": 0}));
}

#[tokio::test]
async fn test_list_latest_parking() {
    let (status, json) = get("/api/parking").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["P1"]["places_disponibles"], 30);
    assert_eq!(json.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_latest_empty_domain_is_empty_object() {
    let (status, json) = get("/api/meteo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({}));
}

#[tokio::test]
async fn test_get_latest_by_id() {
    let (status, json) = get("/api/wifi/AP001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["utilisateurs_connectes"], 17);
    assert_eq!(json["timestamp"], 1001.0);
}

#[tokio::test]
async fn test_get_latest_not_found() {
    let (status, json) = get("/api/wifi/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_unknown_domain_is_404() {
    let (status, _) = get("/api/tram").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get("/api/transport/tram/T1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_in_arrival_order() {
    let (status, json) = get("/api/parking/P1/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            {"timestamp": 1000.0, "available_spaces": 42},
            {"timestamp": 1010.0, "available_spaces": 30},
        ])
    );
}

#[tokio::test]
async fn test_history_range_and_aliases() {
    let (status, json) = get("/api/parking/P1/history?from=1005").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["available_spaces"], 30);

    let (status, json) = get("/api/parking/P1/historique?debut=0&fin=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["places_disponibles"], 42);

    let (status, json) = get("/api/parking/P1/history?from=5000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_history_bad_bound_is_400() {
    let (status, json) = get("/api/parking/P1/history?from=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_history_unknown_entity_is_404() {
    let (status, _) = get("/api/batiments/nope/history").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_building_history_sums_rooms() {
    let (status, json) = get("/api/batiments/sciences/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([{"timestamp": 1005.0, "total_occupancy": 20}]));
}

#[tokio::test]
async fn test_historique_serves_producer_keys() {
    let (status, json) = get("/api/parking/P1/historique").await;
    assert_eq!(status, StatusCode::OK);
    let mut keys: Vec<&str> = json[0].as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["places_disponibles", "timestamp"]);

    let (status, json) = get("/api/batiments/sciences/historique").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([{"timestamp": 1005.0, "occupation_totale": 20}]));

    let (status, json) = get("/api/wifi/AP001/historique").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([{"timestamp": 1001.0, "puissance_signal": -61.5, "utilisateurs_connectes": 17}])
    );

    let (status, json) = get("/api/transport/bus/BUS_L1_1/historique").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["passagers"], 23);
    assert!(json[0].get("passengers").is_none());

    let (status, _) = get("/api/parking/nope/historique").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transport_routes() {
    let (status, json) = get("/api/transport/bus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["BUS_L1_1"]["passagers"], 23);

    let (status, json) = get("/api/transport/bus/BUS_L1_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["latitude"], 48.85);

    let (status, json) = get("/api/transport/bus/BUS_L1_1/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["passengers"], 23);

    let (status, json) = get("/api/transport/taxi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({}));
}

#[tokio::test]
async fn test_spawned_server_answers_and_shuts_down() {
    let state = make_test_state().await;
    let token = CancellationToken::new();
    let running = spawn_observer(&loopback(), state, token.clone()).await.unwrap();

    let mut stream = tokio::net::TcpStream::connect(running.local_addr)
        .await
        .unwrap();
    stream
        .write_all(b"GET /api/status HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("\"online\""));

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_ws_events_streams_ingested_reading() {
    let (state, ingestor) = make_test_parts().await;
    let token = CancellationToken::new();
    let running = spawn_observer(&loopback(), state, token.clone()).await.unwrap();

    let url = format!("ws://{}/ws/events", running.local_addr);
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    ingestor
        .handle(
            "iot/parking/disponibilite/P2",
            br#"{"name":"P2","places_disponibles":7,"timestamp":1020}"#,
        )
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let event: Value = serde_json::from_str(&frame.into_text().unwrap()).unwrap();
    assert_eq!(event["event"], "update_parking");
    assert_eq!(event["domain"], "parking");
    assert_eq!(event["entity_id"], "P2");
    assert_eq!(event["reading"]["places_disponibles"], 7);
    assert_eq!(event["reading"]["timestamp"], 1020.0);

    ws.close(None).await.unwrap();
    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .unwrap()
        .unwrap();
}
