//! Contact form mailbox

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use sqlx::SqliteConnection;

use crate::error::{ApiError, StoreContext};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// A validated contact form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactSubmission {
    /// All fields are required (after trimming) and the email must be
    /// syntactically valid.
    pub fn new(name: &str, email: &str, message: &str) -> Result<Self, ApiError> {
        let (name, email, message) = (name.trim(), email.trim(), message.trim());
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(ApiError::validation("Please fill in all required fields."));
        }
        if !is_valid_email(email) {
            return Err(ApiError::validation("Invalid email format provided."));
        }
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL.is_match(email)
}

pub async fn submit(
    conn: &mut SqliteConnection,
    submission: &ContactSubmission,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO contact_messages (name, email, message, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&submission.name)
    .bind(&submission.email)
    .bind(&submission.message)
    .bind(Utc::now().naive_utc())
    .execute(&mut *conn)
    .await
    .store_context("Error saving message to database")?;

    tracing::info!("Contact message saved from {}", submission.email);
    Ok(())
}
