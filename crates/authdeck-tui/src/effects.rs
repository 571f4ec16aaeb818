//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer only mutates state and returns effects; all I/O and task
//! spawning happens in the runtime.

use authdeck_core::actions::{Action, CredentialMethod};

use crate::common::TaskId;

/// Everything the runtime needs to run one action: the selection snapshot
/// plus the raw field inputs at the moment Enter was pressed.
#[derive(Debug, Clone)]
pub struct ExecutePlan {
    pub action: Action,
    pub method: CredentialMethod,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,
    /// Resolve a credential if needed, dispatch the action, report back.
    Execute { task: TaskId, plan: ExecutePlan },
    /// Fetch the profile photo behind `url`.
    FetchPhoto { task: TaskId, url: String },
}
