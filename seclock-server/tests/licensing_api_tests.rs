mod common;

use common::{encrypt_grant, grant, spawn_test_server, test_keypair};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

async fn post_license(client: &reqwest::Client, base: &str, license: &str) -> reqwest::Response {
    client
        .post(format!("{base}/licensing"))
        .json(&json!({ "license": license }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn self_report_returns_identity() {
    let server = spawn_test_server(true).await;
    let resp = reqwest::get(format!("{}/license", server.base)).await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "id": "licensing", "name": "Licensing" }));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let server = spawn_test_server(true).await;
    let resp = reqwest::get(format!("{}/licensing/nonexistent", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn license_round_trip() {
    let server = spawn_test_server(true).await;
    let client = reqwest::Client::new();

    let resp = reqwest::get(format!("{}/licensing", server.base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 404);

    let ciphertext = encrypt_grant(&grant(5, "tenant-1"));
    let resp = post_license(&client, &server.base, &ciphertext).await;
    assert_eq!(resp.status(), 200);
    let stored: Value = resp.json().await.unwrap();
    assert_eq!(stored["license"], ciphertext.as_str());
    assert_eq!(stored["tagName"], "license");

    let loaded: Value = reqwest::get(format!("{}/licensing", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded["maxUsers"], 5);
    assert_eq!(loaded["tpld"], "tenant-1");

    let resp = post_license(&client, &server.base, &encrypt_grant(&grant(6, "tenant-2"))).await;
    assert_eq!(resp.status(), 409);

    let resp = client
        .delete(format!("{}/licensing", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.json::<bool>().await.unwrap());
}

#[tokio::test]
async fn check_reports_verdict() {
    let server = spawn_test_server(true).await;
    let client = reqwest::Client::new();
    post_license(&client, &server.base, &encrypt_grant(&grant(1, "tenant-1"))).await;

    let verdict: Value = reqwest::get(format!("{}/licensing/check", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(verdict["exceededUsers"], 2);
    assert_eq!(verdict["unlicensedServices"], json!(["B"]));
    assert_eq!(verdict["dateExceeded"], false);
    assert_eq!(verdict["tpld"], "tenant-1");
}

#[tokio::test]
async fn check_maps_registry_failure_to_bad_gateway() {
    let server = spawn_test_server(true).await;
    let client = reqwest::Client::new();
    post_license(&client, &server.base, &encrypt_grant(&grant(5, "tenant-1"))).await;
    server.peers.registry_down.store(true, Ordering::SeqCst);

    let resp = reqwest::get(format!("{}/licensing/check", server.base)).await.unwrap();
    assert_eq!(resp.status(), 502);
}

#[tokio::test]
async fn light_check_reads_cached_state() {
    let server = spawn_test_server(true).await;

    let state: Value = reqwest::get(format!("{}/licensing/check/light", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        state,
        json!({ "isValid": false, "timeStamp": 0, "message": "", "tpld": "" })
    );

    let client = reqwest::Client::new();
    post_license(&client, &server.base, &encrypt_grant(&grant(5, "tenant-1"))).await;
    server.cycle.trigger().await.unwrap();

    let state: Value = reqwest::get(format!("{}/licensing/check/light", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["tpld"], "tenant-1");
    assert_eq!(state["isValid"], false);
}

#[tokio::test]
async fn keys_are_served() {
    let server = spawn_test_server(true).await;

    let body: Value = reqwest::get(format!("{}/licensing/publickey", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["publickey"], test_keypair().public_key.as_str());

    let body: Value = reqwest::get(format!("{}/licensing/load/privatekey", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["privatekey"], test_keypair().private_key.as_str());
}

#[tokio::test]
async fn absent_keys_are_bad_requests() {
    let server = spawn_test_server(false).await;

    for route in ["/licensing/publickey", "/licensing/load/privatekey"] {
        let resp = reqwest::get(format!("{}{}", server.base, route)).await.unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], 400);
    }

    let client = reqwest::Client::new();
    let resp = post_license(&client, &server.base, &encrypt_grant(&grant(5, "t"))).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn checksum_is_served() {
    let server = spawn_test_server(true).await;
    let resp = reqwest::get(format!("{}/licensing/load/checksum", server.base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let client = reqwest::Client::new();
    post_license(&client, &server.base, &encrypt_grant(&grant(5, "tenant-1"))).await;

    let body: Value = reqwest::get(format!("{}/licensing/load/checksum", server.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["checksum"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn invalid_bodies_are_bad_requests() {
    let server = spawn_test_server(true).await;
    let client = reqwest::Client::new();

    let resp = post_license(&client, &server.base, "").await;
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/licensing", server.base))
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = post_license(&client, &server.base, "not base64 !!").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("invalid license payload"));
}
