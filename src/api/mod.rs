//! Front-office HTTP API.
//!
//! Routes are nested under `/api/`. Login and health are public; every
//! other route requires a bearer token and runs through Auth → Audit.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
