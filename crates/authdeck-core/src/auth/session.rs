//! In-memory auth session.
//!
//! Holds the currently signed-in user plus its tokens, and broadcasts every
//! identity change over a watch channel. Subscribers (the TUI runtime) receive
//! the new `Option<AuthUser>` whenever the session identity changes, including
//! out-of-band changes made by the dispatcher.
//!
//! Nothing here persists: state lives for one process and is dropped with it.

use tokio::sync::watch;

use super::types::{AuthUser, SignedIn};

/// Current signed-in identity and session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user: AuthUser,
    pub id_token: String,
    pub refresh_token: String,
}

/// Shared session container.
///
/// Cheap to clone; all clones observe the same session. Mutation happens only
/// through the dispatcher, so a failed backend call never touches it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    tx: watch::Sender<Option<SessionUser>>,
}

impl AuthSession {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Snapshot of the current user, if signed in.
    pub fn current(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replaces the session after a successful sign-in/create/link.
    pub fn set(&self, signed_in: SignedIn) {
        let _ = self.tx.send(Some(SessionUser {
            user: signed_in.user,
            id_token: signed_in.id_token,
            refresh_token: signed_in.refresh_token,
        }));
    }

    /// Updates only the identity snapshot, keeping the current tokens.
    ///
    /// No-op when signed out.
    pub fn update_user(&self, user: AuthUser) {
        self.tx.send_if_modified(|slot| match slot {
            Some(session) => {
                if session.user == user {
                    false
                } else {
                    session.user = user;
                    true
                }
            }
            None => false,
        });
    }

    /// Replaces the session tokens, keeping the identity snapshot.
    pub fn update_tokens(&self, id_token: String, refresh_token: String) {
        self.tx.send_if_modified(|slot| match slot {
            Some(session) => {
                session.id_token = id_token.clone();
                session.refresh_token = refresh_token.clone();
                true
            }
            None => false,
        });
    }

    /// Signs out locally.
    pub fn clear(&self) {
        let _ = self.tx.send(None);
    }

    /// Subscribes to identity changes.
    ///
    /// The receiver observes the full `Option<SessionUser>`; callers usually
    /// project it down to `Option<AuthUser>`.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.tx.subscribe()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(uid: &str) -> SignedIn {
        SignedIn {
            user: AuthUser {
                uid: uid.to_string(),
                ..AuthUser::default()
            },
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[test]
    fn test_set_and_clear() {
        let session = AuthSession::new();
        assert!(!session.is_signed_in());

        session.set(signed_in("u1"));
        assert_eq!(session.current().map(|s| s.user.uid), Some("u1".to_string()));

        session.clear();
        assert!(session.current().is_none());
    }

    #[test]
    fn test_update_user_keeps_tokens() {
        let session = AuthSession::new();
        session.set(signed_in("u1"));

        let mut user = session.current().map(|s| s.user).unwrap_or_default();
        user.email = Some("a@b.com".to_string());
        session.update_user(user);

        let current = session.current().expect("signed in");
        assert_eq!(current.user.email.as_deref(), Some("a@b.com"));
        assert_eq!(current.id_token, "id");
        assert_eq!(current.refresh_token, "refresh");
    }

    #[test]
    fn test_update_user_when_signed_out_is_noop() {
        let session = AuthSession::new();
        session.update_user(AuthUser {
            uid: "ghost".to_string(),
            ..AuthUser::default()
        });
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_subscribe_observes_changes() {
        let session = AuthSession::new();
        let mut rx = session.subscribe();

        session.set(signed_in("u1"));
        rx.changed().await.expect("sender alive");
        assert_eq!(
            rx.borrow().as_ref().map(|s| s.user.uid.clone()),
            Some("u1".to_string())
        );

        session.clear();
        rx.changed().await.expect("sender alive");
        assert!(rx.borrow().is_none());
    }
}
