//! Identity and credential types.

use serde::{Deserialize, Serialize};

/// Read-only snapshot of a signed-in identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_ids: Vec<String>,
}

impl AuthUser {
    /// One-line description for the output log.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("uid={}", self.uid)];
        if let Some(email) = &self.email {
            parts.push(format!("email={email}"));
        }
        if let Some(name) = &self.display_name {
            parts.push(format!("name={name}"));
        }
        if !self.provider_ids.is_empty() {
            parts.push(format!("providers=[{}]", self.provider_ids.join(", ")));
        }
        parts.join(" ")
    }
}

/// An opaque proof of identity consumed by sign-in, link, and reauthenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    EmailPassword { email: String, password: String },
    GoogleIdToken { id_token: String },
}

impl Credential {
    /// Builds an email/password credential from the two field inputs.
    ///
    /// Deterministic: the credential's fields equal the inputs. Empty inputs
    /// are a dispatcher precondition, not checked here.
    pub fn email_password(email: &str, password: &str) -> Self {
        Credential::EmailPassword {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub fn provider_id(&self) -> &'static str {
        match self {
            Credential::EmailPassword { .. } => "password",
            Credential::GoogleIdToken { .. } => "google.com",
        }
    }
}

/// Result of any backend call that establishes or refreshes a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub user: AuthUser,
    pub id_token: String,
    pub refresh_token: String,
}

/// Fresh tokens from the secure-token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRefresh {
    pub id_token: String,
    pub refresh_token: String,
}

/// Result of a profile mutation (email/password update, credential link).
///
/// The backend rotates tokens on some of these calls; when it does, the new
/// tokens ride along so the session can adopt them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub user: AuthUser,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_password_credential_is_deterministic() {
        let cred = Credential::email_password("a@b.com", "pw");
        assert_eq!(
            cred,
            Credential::EmailPassword {
                email: "a@b.com".to_string(),
                password: "pw".to_string(),
            }
        );
        assert_eq!(cred.provider_id(), "password");
    }

    #[test]
    fn test_describe_includes_known_fields() {
        let user = AuthUser {
            uid: "u1".to_string(),
            email: Some("a@b.com".to_string()),
            display_name: None,
            photo_url: None,
            provider_ids: vec!["password".to_string(), "google.com".to_string()],
        };
        let line = user.describe();
        assert!(line.contains("uid=u1"));
        assert!(line.contains("email=a@b.com"));
        assert!(line.contains("providers=[password, google.com]"));
        assert!(!line.contains("name="));
    }
}
