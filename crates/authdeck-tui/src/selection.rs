//! Selection state machine.
//!
//! Tracks the chosen operation mode, the action within each mode, and the
//! credential method. Transitions are synchronous and deterministic; field
//! enablement is derived, never stored.
//!
//! Inherited policy: switching modes resets the newly active action to the
//! first list entry, while the other mode's stored action is preserved.

use authdeck_core::actions::{
    Action, CredentialMethod, FieldRequirements, OperationMode, SessionAction, UserAction,
    field_requirements,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub mode: OperationMode,
    pub session_action: SessionAction,
    pub user_action: UserAction,
    pub credential_method: CredentialMethod,
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            mode: OperationMode::Session,
            session_action: SessionAction::ALL[0],
            user_action: UserAction::ALL[0],
            credential_method: CredentialMethod::ALL[0],
        }
    }

    /// The action the active mode points at.
    pub fn current_action(&self) -> Action {
        match self.mode {
            OperationMode::Session => Action::Session(self.session_action),
            OperationMode::User => Action::User(self.user_action),
        }
    }

    /// Switches the operation mode.
    ///
    /// A real switch resets the newly active action list to its first entry;
    /// the now-inactive mode keeps its stored action.
    pub fn select_mode(&mut self, mode: OperationMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        match mode {
            OperationMode::Session => self.session_action = SessionAction::ALL[0],
            OperationMode::User => self.user_action = UserAction::ALL[0],
        }
    }

    pub fn select_session_action(&mut self, action: SessionAction) {
        self.session_action = action;
    }

    pub fn select_user_action(&mut self, action: UserAction) {
        self.user_action = action;
    }

    pub fn select_credential_method(&mut self, method: CredentialMethod) {
        self.credential_method = method;
    }

    /// Moves the active action selection by one step, clamped to the list.
    pub fn move_action(&mut self, delta: isize) {
        match self.mode {
            OperationMode::Session => {
                let index = step_index(self.action_index(), SessionAction::ALL.len(), delta);
                self.session_action = SessionAction::ALL[index];
            }
            OperationMode::User => {
                let index = step_index(self.action_index(), UserAction::ALL.len(), delta);
                self.user_action = UserAction::ALL[index];
            }
        }
    }

    pub fn toggle_credential_method(&mut self) {
        self.credential_method = match self.credential_method {
            CredentialMethod::Google => CredentialMethod::EmailPassword,
            CredentialMethod::EmailPassword => CredentialMethod::Google,
        };
    }

    /// Reacts to an identity change (sign-in, sign-out, or user switch):
    /// mode falls back to the lowest-ordinal valid value and the active
    /// action resets to the first entry.
    pub fn reset_for_auth_change(&mut self, signed_in: bool) {
        self.mode = OperationMode::default_for(signed_in);
        match self.mode {
            OperationMode::Session => self.session_action = SessionAction::ALL[0],
            OperationMode::User => self.user_action = UserAction::ALL[0],
        }
    }

    // ------------------------------------------------------------------
    // Derived enablement (pure)
    // ------------------------------------------------------------------

    pub fn requires_credential(&self) -> bool {
        self.current_action().requires_credential()
    }

    pub fn field_requirements(&self) -> FieldRequirements {
        field_requirements(self.current_action(), self.credential_method)
    }

    // ------------------------------------------------------------------
    // Presentation helpers
    // ------------------------------------------------------------------

    pub fn action_labels(&self) -> Vec<&'static str> {
        match self.mode {
            OperationMode::Session => SessionAction::ALL.iter().map(|a| a.label()).collect(),
            OperationMode::User => UserAction::ALL.iter().map(|a| a.label()).collect(),
        }
    }

    pub fn action_index(&self) -> usize {
        match self.mode {
            OperationMode::Session => SessionAction::ALL
                .iter()
                .position(|a| *a == self.session_action)
                .unwrap_or(0),
            OperationMode::User => UserAction::ALL
                .iter()
                .position(|a| *a == self.user_action)
                .unwrap_or(0),
        }
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

fn step_index(current: usize, len: usize, delta: isize) -> usize {
    let stepped = current as isize + delta;
    stepped.clamp(0, len as isize - 1) as usize
}
