//! BDD step definitions for sensors and readings feature

use cucumber::{given, then, when};

use super::common_steps::{body, state, write};
use crate::world::BinwatchWorld;

fn sensor_id(world: &BinwatchWorld, name: &str) -> i64 {
    *world
        .sensors
        .get(name)
        .unwrap_or_else(|| panic!("sensor {} was never created", name))
}

async fn readings_of(world: &BinwatchWorld, sensor: i64) -> Vec<f64> {
    sqlx::query_scalar("SELECT reading_value FROM sensor_readings WHERE sensor_id = ? ORDER BY id")
        .bind(sensor)
        .fetch_all(state(world).store.pool())
        .await
        .unwrap()
}

#[when(expr = "a sensor named {string} is added to bin {string}")]
async fn add_sensor(world: &mut BinwatchWorld, name: String, identifier: String) {
    let bin = world
        .bins
        .get(&identifier)
        .unwrap_or_else(|| panic!("bin {} was never created", identifier))
        .to_string();
    write(
        world,
        "add_sensor",
        &[("bin_id", bin.as_str()), ("sensor_name", name.as_str())],
    )
    .await;
    if let Some(id) = body(world)["newSensor"]["id"].as_i64() {
        world.sensors.insert(name.trim().to_string(), id);
    }
}

#[given(expr = "bin {string} has a sensor named {string}")]
async fn bin_has_sensor(world: &mut BinwatchWorld, identifier: String, name: String) {
    add_sensor(world, name, identifier).await;
    assert_eq!(body(world)["success"], true);
}

#[when(expr = "sensor {string} reports {string}")]
async fn report_value(world: &mut BinwatchWorld, name: String, value: String) {
    let id = sensor_id(world, &name).to_string();
    write(
        world,
        "update_sensor_reading",
        &[("sensor_id", id.as_str()), ("value", value.as_str())],
    )
    .await;
}

#[when(expr = "sensor {string} is removed")]
async fn remove_sensor(world: &mut BinwatchWorld, name: String) {
    let id = sensor_id(world, &name).to_string();
    write(world, "delete_sensor", &[("sensor_id", id.as_str())]).await;
}

#[when(expr = "a reading of {string} is sent for sensor id {int}")]
async fn report_for_id(world: &mut BinwatchWorld, value: String, id: i64) {
    let id = id.to_string();
    write(
        world,
        "update_sensor_reading",
        &[("sensor_id", id.as_str()), ("value", value.as_str())],
    )
    .await;
}

#[then(expr = "sensor {string} should have no readings")]
async fn no_readings(world: &mut BinwatchWorld, name: String) {
    let id = sensor_id(world, &name);
    assert!(readings_of(world, id).await.is_empty());
}

#[then(expr = "sensor {string} should have exactly the reading {float}")]
async fn exactly_one_reading(world: &mut BinwatchWorld, name: String, expected: f64) {
    let id = sensor_id(world, &name);
    assert_eq!(readings_of(world, id).await, vec![expected]);
}

#[then(expr = "bin {string} should report air quality {string}")]
async fn air_quality(world: &mut BinwatchWorld, identifier: String, expected: String) {
    let id = *world.bins.get(&identifier).expect("unknown bin");
    let stored: Option<String> =
        sqlx::query_scalar("SELECT air_quality_status FROM bins WHERE id = ?")
            .bind(id)
            .fetch_one(state(world).store.pool())
            .await
            .unwrap();
    assert_eq!(stored.as_deref().unwrap_or("N/A"), expected);
}

#[then(expr = "the new sensor should be named {string}")]
fn new_sensor_named(world: &mut BinwatchWorld, expected: String) {
    assert_eq!(body(world)["newSensor"]["sensor_name"], expected.as_str());
}

#[then(expr = "sensor {string} should no longer exist")]
async fn sensor_gone(world: &mut BinwatchWorld, name: String) {
    let id = sensor_id(world, &name);
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensors WHERE id = ?")
        .bind(id)
        .fetch_one(state(world).store.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
