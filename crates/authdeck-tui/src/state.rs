//! Application state composition.
//!
//! ```text
//! AppState
//! ├── selection: SelectionState   (mode, actions, credential method)
//! ├── fields: FieldsState         (email/password buffers)
//! ├── focus: Focus                (which control receives keys)
//! ├── output: OutputState         (timestamped result log)
//! ├── current_user: Option<AuthUser>  (mirror of the session identity)
//! ├── photo: PhotoState           (latest-wins photo fetch bookkeeping)
//! └── tasks / task_seq            (in-flight async operations)
//! ```
//!
//! All mutation happens in the reducer (`update`); the runtime executes the
//! effects the reducer returns and feeds results back as events.

use authdeck_core::auth::AuthUser;
use authdeck_core::photo::PhotoMeta;

use crate::common::{TaskSeq, Tasks};
use crate::fields::{Field, FieldsState};
use crate::output::OutputState;
use crate::selection::SelectionState;

/// Which control currently receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    ModePicker,
    ActionPicker,
    MethodPicker,
    EmailField,
    PasswordField,
}

impl Focus {
    pub fn as_field(self) -> Option<Field> {
        match self {
            Focus::EmailField => Some(Field::Email),
            Focus::PasswordField => Some(Field::Password),
            _ => None,
        }
    }
}

/// Latest-wins photo fetch state.
///
/// `last_requested` is the only URL whose completion may be applied; results
/// for any other URL are stale and discarded.
#[derive(Debug, Default, Clone)]
pub struct PhotoState {
    pub last_requested: Option<String>,
    pub meta: Option<PhotoMeta>,
}

pub struct AppState {
    pub should_quit: bool,
    pub selection: SelectionState,
    pub fields: FieldsState,
    pub focus: Focus,
    pub output: OutputState,
    /// Mirror of the session identity, updated only via `AuthStateChanged`.
    pub current_user: Option<AuthUser>,
    pub photo: PhotoState,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    /// Spinner animation frame counter (while an execute is in flight).
    pub spinner_frame: usize,
}

impl AppState {
    pub fn new() -> Self {
        let mut state = Self {
            should_quit: false,
            selection: SelectionState::new(),
            fields: FieldsState::default(),
            focus: Focus::ModePicker,
            output: OutputState::default(),
            current_user: None,
            photo: PhotoState::default(),
            task_seq: TaskSeq::default(),
            tasks: Tasks::default(),
            spinner_frame: 0,
        };
        state
            .output
            .info("Select an action and press Enter to execute.");
        state
    }

    pub fn signed_in(&self) -> bool {
        self.current_user.is_some()
    }

    /// Focus ring for the current enablement: pickers always, fields only
    /// when the derived requirements say they accept input.
    pub fn focus_ring(&self) -> Vec<Focus> {
        let requirements = self.selection.field_requirements();
        let mut ring = vec![Focus::ModePicker, Focus::ActionPicker];
        if self.selection.requires_credential() {
            ring.push(Focus::MethodPicker);
        }
        if requirements.email {
            ring.push(Focus::EmailField);
        }
        if requirements.password {
            ring.push(Focus::PasswordField);
        }
        ring
    }

    /// Moves focus one step through the ring (negative delta moves back).
    pub fn cycle_focus(&mut self, delta: isize) {
        let ring = self.focus_ring();
        let current = ring.iter().position(|f| *f == self.focus).unwrap_or(0);
        let len = ring.len() as isize;
        let next = (current as isize + delta).rem_euclid(len) as usize;
        self.focus = ring[next];
    }

    /// Snaps focus back into the ring after enablement changed under it.
    pub fn clamp_focus(&mut self) {
        let ring = self.focus_ring();
        if !ring.contains(&self.focus) {
            self.focus = Focus::ActionPicker;
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use authdeck_core::actions::{CredentialMethod, SessionAction};

    use super::*;

    #[test]
    fn test_focus_ring_tracks_enablement() {
        let mut state = AppState::new();
        // Default action (fetch providers) needs the email field only.
        assert_eq!(
            state.focus_ring(),
            vec![Focus::ModePicker, Focus::ActionPicker, Focus::EmailField]
        );

        state
            .selection
            .select_session_action(SessionAction::SignInWithCredential);
        state
            .selection
            .select_credential_method(CredentialMethod::EmailPassword);
        assert_eq!(
            state.focus_ring(),
            vec![
                Focus::ModePicker,
                Focus::ActionPicker,
                Focus::MethodPicker,
                Focus::EmailField,
                Focus::PasswordField
            ]
        );
    }

    #[test]
    fn test_cycle_focus_wraps() {
        let mut state = AppState::new();
        state.focus = Focus::EmailField;
        state.cycle_focus(1);
        assert_eq!(state.focus, Focus::ModePicker);
        state.cycle_focus(-1);
        assert_eq!(state.focus, Focus::EmailField);
    }

    #[test]
    fn test_clamp_focus_after_enablement_change() {
        let mut state = AppState::new();
        state.focus = Focus::EmailField;
        state
            .selection
            .select_session_action(SessionAction::SignInAnonymously);
        state.clamp_focus();
        assert_eq!(state.focus, Focus::ActionPicker);
    }
}
