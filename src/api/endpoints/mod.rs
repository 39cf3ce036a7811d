//! API endpoint handlers.
//!
//! One module per resource. Handlers open a connection per request and
//! delegate to the repository, booking and account modules.

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod health;
pub mod patients;
pub mod schedules;
pub mod services;
pub mod users;
