//! listing-service: vehicle inventory lookup and AI listing descriptions.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
