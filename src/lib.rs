pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod services;

pub use app::{app, AppState, StartupError};

#[cfg(test)]
pub mod testing;
