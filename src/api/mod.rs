// Control API routes and handlers

pub mod error;
pub mod exercises;
pub mod health;
pub mod routes;

pub use error::ControlError;
pub use routes::{create_routes, AppState};
