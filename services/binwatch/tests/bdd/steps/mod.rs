//! BDD step definitions for binwatch service

pub mod common_steps;
pub mod contact_steps;
pub mod dispatch_steps;
pub mod sensor_steps;
