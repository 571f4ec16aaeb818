//! Core library for authdeck: identity backend client, action vocabulary and
//! dispatch, Google federated flow, session container, config, and logging.

pub mod actions;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod google;
pub mod logging;
pub mod photo;

pub use auth::{AuthBackend, AuthSession};
pub use config::Config;
