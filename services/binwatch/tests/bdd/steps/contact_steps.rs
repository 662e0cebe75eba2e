//! BDD step definitions for contact form feature

use cucumber::when;

use super::common_steps::write;
use crate::world::BinwatchWorld;

#[when(expr = "a contact message is submitted by {string} with email {string} saying {string}")]
async fn submit_contact(world: &mut BinwatchWorld, name: String, email: String, message: String) {
    write(
        world,
        "submit_contact",
        &[
            ("contact_name", name.as_str()),
            ("contact_email", email.as_str()),
            ("contact_message", message.as_str()),
        ],
    )
    .await;
}
