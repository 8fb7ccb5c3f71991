//! End-to-end tests of the transfer endpoints over real connections.

use std::time::Duration;

use serde_json::{json, Value};

mod common;

const USER_1: &str = "12345678-abcd-abcd-1234-000000000001";
const USER_2: &str = "12345678-abcd-abcd-1234-000000000002";

#[tokio::test]
async fn test_seed_accounts_are_served() {
    let app = common::spawn_app(common::test_config()).await;

    let res = common::client()
        .get(app.url(&format!("/account/{USER_1}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"id": USER_1, "name": "User 1", "balance": "1000.00"}));
}

#[tokio::test]
async fn test_transfer_flow() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::client();

    let res = client
        .post(app.url("/transfer"))
        .query(&[("senderAccountId", USER_1), ("receiverAccountId", USER_2), ("amount", "100")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Money transferred successfully.");

    let receiver: Value = client
        .get(app.url(&format!("/account/{USER_2}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(receiver["balance"], "600.00");

    let res = client
        .post(app.url("/transfer"))
        .query(&[("senderAccountId", USER_1), ("amount", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Missing parameter: receiverAccountId", "data": null}));
}

#[tokio::test]
async fn test_withdrawal_settles_in_background() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::client();

    let res = client
        .post(app.url("/withdrawal"))
        .json(&json!({"senderAccountId": USER_2, "address": "1234-5678", "amount": "200"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    let id = body["data"].as_str().unwrap().to_string();

    // Settlement is immediate in the test config; the monitor applies it.
    let state = wait_for_final_state(&app, &client, &id).await;
    let balance: Value = client
        .get(app.url(&format!("/account/{USER_2}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    match state.as_str() {
        "COMPLETED" => assert_eq!(balance["balance"], "300.00"),
        "FAILED" => assert_eq!(balance["balance"], "500.00"),
        other => panic!("unexpected state {other}"),
    }
}

/// Poll the status endpoint until the withdrawal reports a final state.
async fn wait_for_final_state(app: &common::RunningApp, client: &reqwest::Client, id: &str) -> String {
    for _ in 0..100 {
        let state: String = client
            .get(app.url(&format!("/withdrawal/status/{id}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if state != "PROCESSING" {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("withdrawal {id} never settled");
}

#[tokio::test]
async fn test_unknown_withdrawal_and_bad_ids() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::client();

    let res = client
        .get(app.url("/withdrawal/status/00000000-0000-0000-0000-000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client.get(app.url("/account/nope")).send().await.unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_create_account_and_health() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::client();

    let res = client
        .post(app.url("/account"))
        .json(&json!({"name": "Carol", "balance": "25"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let account: Value = res.json().await.unwrap();
    let id = account["id"].as_str().unwrap();

    let fetched: Value = client
        .get(app.url(&format!("/account/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["balance"], "25.00");

    let res = client.get(app.url("/health/")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    app.shutdown.trigger("test");
    app.task.await.unwrap().unwrap();
}
