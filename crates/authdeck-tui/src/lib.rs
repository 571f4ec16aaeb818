//! Full-screen TUI for exercising the identity backend.

pub mod common;
pub mod effects;
pub mod events;
pub mod fields;
pub mod output;
pub mod render;
pub mod runtime;
pub mod selection;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, stderr};
use std::sync::Arc;

use anyhow::Result;
pub use runtime::{RuntimeDeps, TuiRuntime};

use authdeck_core::auth::{AuthSession, IdentityClient};
use authdeck_core::config::Config;
use authdeck_core::google::GoogleFlow;

/// Runs the interactive console until the user quits.
pub async fn run(config: &Config) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!("authdeck requires a terminal");
    }

    let deps = RuntimeDeps {
        backend: Arc::new(IdentityClient::new(config.identity_options())),
        session: AuthSession::new(),
        google: Arc::new(GoogleFlow::new(config.google_options())),
        http: reqwest::Client::new(),
    };

    let mut runtime = TuiRuntime::new(deps)?;
    runtime.run()?;

    eprintln!("Goodbye!");
    Ok(())
}
