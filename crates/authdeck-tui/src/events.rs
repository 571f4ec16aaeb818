//! Events consumed by the reducer.
//!
//! Terminal input arrives from the crossterm poll; everything else arrives
//! through the runtime's inbox channel from spawned tasks or the session
//! watcher.

use authdeck_core::auth::AuthUser;
use authdeck_core::photo::PhotoMeta;

use crate::common::TaskId;

#[derive(Debug)]
pub enum UiEvent {
    /// Animation/cadence tick.
    Tick,
    /// Raw terminal input.
    Terminal(crossterm::event::Event),
    /// An execute task finished; `result` is already rendered for display.
    ExecuteFinished {
        id: TaskId,
        result: Result<String, String>,
    },
    /// The session identity changed (sign-in, sign-out, user switch).
    AuthStateChanged(Option<AuthUser>),
    /// A profile photo fetch completed.
    PhotoFetched {
        id: TaskId,
        url: String,
        result: Result<PhotoMeta, String>,
    },
}
