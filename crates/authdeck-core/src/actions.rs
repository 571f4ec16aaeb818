//! Action vocabulary shared between the dispatcher and the UI.
//!
//! Two action families exist: session-level operations (valid with or without
//! a signed-in user) and user-level operations (require a signed-in user).
//! Each action carries three capability flags that drive input-field
//! enablement and credential resolution:
//!
//! - `requires_credential` - the action consumes a [`Credential`] that must be
//!   resolved before dispatch (sign-in, link, reauthenticate).
//! - `requires_email_field` / `requires_password_field` - the action reads the
//!   raw field inputs directly (provider lookup, create, update).
//!
//! Capabilities are plain per-variant match tables rather than trait objects,
//! so the full (mode, action, method) space stays enumerable in tests.
//!
//! [`Credential`]: crate::auth::Credential

use std::fmt;

/// Top-level operation mode: act on the auth session or on the signed-in user.
///
/// Declaration order is ordinal order. `Session` is the lowest-ordinal mode
/// and the only valid one while nobody is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Session,
    User,
}

impl OperationMode {
    pub const ALL: &'static [OperationMode] = &[OperationMode::Session, OperationMode::User];

    /// Modes selectable for the given signed-in status.
    pub fn valid_modes(signed_in: bool) -> &'static [OperationMode] {
        if signed_in {
            Self::ALL
        } else {
            &[OperationMode::Session]
        }
    }

    /// Lowest-ordinal mode valid for the given signed-in status.
    pub fn default_for(signed_in: bool) -> OperationMode {
        Self::valid_modes(signed_in)[0]
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationMode::Session => "Session",
            OperationMode::User => "User",
        }
    }
}

/// Operations against the auth session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    FetchProvidersForEmail,
    SignInAnonymously,
    SignInWithCredential,
    CreateUser,
    SignOut,
}

impl SessionAction {
    pub const ALL: &'static [SessionAction] = &[
        SessionAction::FetchProvidersForEmail,
        SessionAction::SignInAnonymously,
        SessionAction::SignInWithCredential,
        SessionAction::CreateUser,
        SessionAction::SignOut,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionAction::FetchProvidersForEmail => "Fetch providers for email",
            SessionAction::SignInAnonymously => "Sign in anonymously",
            SessionAction::SignInWithCredential => "Sign in with credential",
            SessionAction::CreateUser => "Create user",
            SessionAction::SignOut => "Sign out",
        }
    }
}

/// Operations against the currently signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    UpdateEmail,
    UpdatePassword,
    Reload,
    Reauthenticate,
    GetIdToken,
    LinkWithCredential,
    DeleteAccount,
}

impl UserAction {
    pub const ALL: &'static [UserAction] = &[
        UserAction::UpdateEmail,
        UserAction::UpdatePassword,
        UserAction::Reload,
        UserAction::Reauthenticate,
        UserAction::GetIdToken,
        UserAction::LinkWithCredential,
        UserAction::DeleteAccount,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UserAction::UpdateEmail => "Update email",
            UserAction::UpdatePassword => "Update password",
            UserAction::Reload => "Reload user",
            UserAction::Reauthenticate => "Reauthenticate",
            UserAction::GetIdToken => "Get ID token",
            UserAction::LinkWithCredential => "Link with credential",
            UserAction::DeleteAccount => "Delete account",
        }
    }
}

/// How a credential is acquired when an action needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMethod {
    Google,
    EmailPassword,
}

impl CredentialMethod {
    pub const ALL: &'static [CredentialMethod] =
        &[CredentialMethod::Google, CredentialMethod::EmailPassword];

    /// Whether resolving a credential with this method reads the email field.
    pub fn requires_email_field(self) -> bool {
        matches!(self, CredentialMethod::EmailPassword)
    }

    /// Whether resolving a credential with this method reads the password field.
    pub fn requires_password_field(self) -> bool {
        matches!(self, CredentialMethod::EmailPassword)
    }

    pub fn label(self) -> &'static str {
        match self {
            CredentialMethod::Google => "Google",
            CredentialMethod::EmailPassword => "Email & password",
        }
    }
}

/// A session or user action, tagged by mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Session(SessionAction),
    User(UserAction),
}

impl Action {
    pub fn mode(self) -> OperationMode {
        match self {
            Action::Session(_) => OperationMode::Session,
            Action::User(_) => OperationMode::User,
        }
    }

    /// Whether dispatch needs a resolved credential first.
    pub fn requires_credential(self) -> bool {
        match self {
            Action::Session(a) => matches!(a, SessionAction::SignInWithCredential),
            Action::User(a) => {
                matches!(a, UserAction::Reauthenticate | UserAction::LinkWithCredential)
            }
        }
    }

    /// Whether the action itself reads the email field (independent of any
    /// credential the method may need).
    pub fn requires_email_field(self) -> bool {
        match self {
            Action::Session(a) => matches!(
                a,
                SessionAction::FetchProvidersForEmail | SessionAction::CreateUser
            ),
            Action::User(a) => matches!(a, UserAction::UpdateEmail),
        }
    }

    /// Whether the action itself reads the password field.
    pub fn requires_password_field(self) -> bool {
        match self {
            Action::Session(a) => matches!(a, SessionAction::CreateUser),
            Action::User(a) => matches!(a, UserAction::UpdatePassword),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Session(a) => a.label(),
            Action::User(a) => a.label(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which input fields the UI should enable for a given action + method pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRequirements {
    pub email: bool,
    pub password: bool,
}

/// Derives field enablement for an action under a credential method.
///
/// A field is required either because the action reads it directly, or because
/// the action needs a credential and the chosen method builds one from it.
pub fn field_requirements(action: Action, method: CredentialMethod) -> FieldRequirements {
    let via_credential = action.requires_credential();
    FieldRequirements {
        email: (via_credential && method.requires_email_field()) || action.requires_email_field(),
        password: (via_credential && method.requires_password_field())
            || action.requires_password_field(),
    }
}
