pub mod app;
pub mod authz;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod policies;
pub mod routes;

// Re-export commonly used items for tests
pub use app::{create_app, create_app_with};
