//! chat-relay-service: forwards visitor chat messages to a generative model
//! and keeps one conversation seeded from a transcript file.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{build_router, AppState, Application};
