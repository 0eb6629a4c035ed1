//! Session wiring: configuration, tracing and the actors behind a session.

pub mod config;
pub mod session;
pub mod tracing;

pub use config::{Config, ConfigError};
pub use session::Session;
pub use self::tracing::setup_tracing;
