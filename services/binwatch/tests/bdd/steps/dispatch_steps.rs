//! BDD step definitions for action dispatch and transaction feature

use cucumber::{given, when};

use super::common_steps::{read, state, write};
use crate::world::BinwatchWorld;

#[when(expr = "the action {string} is requested with GET")]
async fn get_action(world: &mut BinwatchWorld, action: String) {
    read(world, &action, &[]).await;
}

#[when(expr = "the action {string} is requested with POST")]
async fn post_action(world: &mut BinwatchWorld, action: String) {
    write(world, &action, &[]).await;
}

#[given("the store rejects new sensors")]
async fn reject_sensors(world: &mut BinwatchWorld) {
    sqlx::query(
        "CREATE TRIGGER reject_sensors BEFORE INSERT ON sensors BEGIN SELECT RAISE(ABORT, 'sensor insert rejected'); END",
    )
    .execute(state(world).store.pool())
    .await
    .unwrap();
}
