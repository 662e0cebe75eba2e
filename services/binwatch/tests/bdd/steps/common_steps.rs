//! Shared BDD steps and request helpers

use std::sync::Arc;

use cucumber::{given, then, when};

use binwatch::action::Params;
use binwatch::api::{respond, ApiState, RequestMode};
use binwatch::store::Store;
use binwatch::Settings;

use crate::world::BinwatchWorld;

pub fn state(world: &BinwatchWorld) -> &ApiState {
    world.state.as_ref().expect("store not set up")
}

fn params(action: &str, pairs: &[(&str, &str)]) -> Params {
    let mut params: Params = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    params.insert("action".to_string(), action.to_string());
    params
}

async fn send(world: &mut BinwatchWorld, mode: RequestMode, params: Params) {
    let response = respond(state(world), mode, params).await;
    world.last_status = Some(response.status());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.last_body = Some(serde_json::from_slice(&body).unwrap());
}

/// Issue a GET-style action
pub async fn read(world: &mut BinwatchWorld, action: &str, pairs: &[(&str, &str)]) {
    send(world, RequestMode::Read, params(action, pairs)).await;
}

/// Issue a POST-style action
pub async fn write(world: &mut BinwatchWorld, action: &str, pairs: &[(&str, &str)]) {
    send(world, RequestMode::Write, params(action, pairs)).await;
}

pub fn body(world: &BinwatchWorld) -> &serde_json::Value {
    world.last_body.as_ref().expect("no response body")
}

pub async fn count(world: &BinwatchWorld, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(state(world).store.pool())
        .await
        .unwrap()
}

#[given("an empty bin store")]
async fn empty_store(world: &mut BinwatchWorld) {
    world.state = Some(ApiState {
        store: Store::in_memory().await.unwrap(),
        settings: Arc::new(Settings::default()),
    });
}

#[given(expr = "the row count of {word} is recorded")]
#[when(expr = "the row count of {word} is recorded")]
async fn record_count(world: &mut BinwatchWorld, table: String) {
    let rows = count(world, &table).await;
    world.counts_before.insert(table, rows);
}

#[then("the response should be successful")]
fn response_successful(world: &mut BinwatchWorld) {
    let body = body(world);
    assert_eq!(body["success"], true, "unexpected failure: {}", body);
}

#[then(expr = "the response should fail with message {string}")]
fn response_fails_with(world: &mut BinwatchWorld, message: String) {
    let body = body(world);
    assert_eq!(body["success"], false, "unexpected success: {}", body);
    assert_eq!(body["message"], message.as_str());
}

#[then("the response should fail")]
fn response_fails(world: &mut BinwatchWorld) {
    let body = body(world);
    assert_eq!(body["success"], false, "unexpected success: {}", body);
}

#[then(expr = "the response message should be {string}")]
fn response_message(world: &mut BinwatchWorld, message: String) {
    assert_eq!(body(world)["message"], message.as_str());
}

#[then(expr = "the HTTP status should be {int}")]
fn http_status(world: &mut BinwatchWorld, status: u16) {
    assert_eq!(
        world.last_status.expect("no response").as_u16(),
        status,
        "body: {:?}",
        world.last_body
    );
}

#[then(expr = "the row count of {word} should be unchanged")]
async fn count_unchanged(world: &mut BinwatchWorld, table: String) {
    let before = *world
        .counts_before
        .get(&table)
        .expect("row count was not recorded");
    assert_eq!(count(world, &table).await, before);
}

#[then(expr = "the row count of {word} should be {int}")]
async fn count_is(world: &mut BinwatchWorld, table: String, expected: i64) {
    assert_eq!(count(world, &table).await, expected);
}
