//! Action dispatcher.
//!
//! Maps every (mode, action) pair to exactly one backend call, checks
//! preconditions up front, and renders the outcome as a display message.
//! Successful identity-changing calls update the [`AuthSession`]; a failing
//! call leaves both the session and the caller's state untouched. No retry,
//! no rollback.

use anyhow::{Result, bail};

use crate::actions::{Action, SessionAction, UserAction};
use crate::auth::{AuthBackend, AuthSession, Credential, SessionUser};

/// One execute request: the chosen action, the raw field inputs, and the
/// credential when the action needs one (resolved by the caller, see
/// [`crate::google`] for the interactive path).
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub action: Action,
    pub email: String,
    pub password: String,
    pub credential: Option<Credential>,
}

impl ExecuteRequest {
    fn email(&self) -> Result<&str> {
        let email = self.email.trim();
        if email.is_empty() {
            bail!("Email field is empty");
        }
        Ok(email)
    }

    fn password(&self) -> Result<&str> {
        if self.password.is_empty() {
            bail!("Password field is empty");
        }
        Ok(&self.password)
    }

    fn credential(&self) -> Result<&Credential> {
        self.action
            .requires_credential()
            .then_some(self.credential.as_ref())
            .flatten()
            .ok_or_else(|| anyhow::anyhow!("No credential resolved for {}", self.action))
    }
}

/// Executes one action against the backend and returns the display message.
pub async fn execute(
    backend: &dyn AuthBackend,
    session: &AuthSession,
    request: &ExecuteRequest,
) -> Result<String> {
    match request.action {
        Action::Session(action) => execute_session(backend, session, request, action).await,
        Action::User(action) => {
            // Acting on the current user with nobody signed in is an API
            // misuse; reject it here instead of trapping downstream.
            let Some(current) = session.current() else {
                bail!("No user is signed in");
            };
            execute_user(backend, session, request, action, &current).await
        }
    }
}

async fn execute_session(
    backend: &dyn AuthBackend,
    session: &AuthSession,
    request: &ExecuteRequest,
    action: SessionAction,
) -> Result<String> {
    match action {
        SessionAction::FetchProvidersForEmail => {
            let email = request.email()?;
            let providers = backend.fetch_providers(email).await?;
            if providers.is_empty() {
                Ok(format!("No providers registered for {email}"))
            } else {
                Ok(format!("Providers for {email}: {}", providers.join(", ")))
            }
        }
        SessionAction::SignInAnonymously => {
            let signed_in = backend.sign_in_anonymously().await?;
            let line = format!("Signed in anonymously: {}", signed_in.user.describe());
            session.set(signed_in);
            Ok(line)
        }
        SessionAction::SignInWithCredential => {
            let credential = request.credential()?;
            let signed_in = backend.sign_in_with_credential(credential).await?;
            let line = format!("Signed in: {}", signed_in.user.describe());
            session.set(signed_in);
            Ok(line)
        }
        SessionAction::CreateUser => {
            let email = request.email()?;
            let password = request.password()?;
            let signed_in = backend.create_user(email, password).await?;
            let line = format!("User created: {}", signed_in.user.describe());
            session.set(signed_in);
            Ok(line)
        }
        SessionAction::SignOut => {
            // Purely local: no provider tokens are retained, so federated
            // sign-out reduces to clearing the session.
            session.clear();
            Ok("Signed out".to_string())
        }
    }
}

async fn execute_user(
    backend: &dyn AuthBackend,
    session: &AuthSession,
    request: &ExecuteRequest,
    action: UserAction,
    current: &SessionUser,
) -> Result<String> {
    match action {
        UserAction::UpdateEmail => {
            let email = request.email()?;
            let update = backend.update_email(&current.id_token, email).await?;
            let line = format!("Email updated to {email}");
            apply_update(session, update);
            Ok(line)
        }
        UserAction::UpdatePassword => {
            let password = request.password()?;
            let update = backend.update_password(&current.id_token, password).await?;
            apply_update(session, update);
            Ok("Password updated".to_string())
        }
        UserAction::Reload => {
            let user = backend.reload(&current.id_token).await?;
            let line = format!("Reloaded: {}", user.describe());
            session.update_user(user);
            Ok(line)
        }
        UserAction::Reauthenticate => {
            let credential = request.credential()?;
            let signed_in = backend.sign_in_with_credential(credential).await?;
            if signed_in.user.uid != current.user.uid {
                bail!(
                    "Credential belongs to a different user ({})",
                    signed_in.user.uid
                );
            }
            let line = format!("Reauthenticated: {}", signed_in.user.describe());
            session.set(signed_in);
            Ok(line)
        }
        UserAction::GetIdToken => {
            let tokens = backend.refresh_id_token(&current.refresh_token).await?;
            let line = tokens.id_token.clone();
            session.update_tokens(tokens.id_token, tokens.refresh_token);
            Ok(line)
        }
        UserAction::LinkWithCredential => {
            let credential = request.credential()?;
            let update = backend
                .link_credential(&current.id_token, credential)
                .await?;
            let line = format!("Linked {}: {}", credential.provider_id(), update.user.describe());
            apply_update(session, update);
            Ok(line)
        }
        UserAction::DeleteAccount => {
            backend.delete_account(&current.id_token).await?;
            session.clear();
            Ok("Account deleted".to_string())
        }
    }
}

/// Folds a profile mutation into the session: identity snapshot always, token
/// pair only when the backend rotated it.
fn apply_update(session: &AuthSession, update: crate::auth::AccountUpdate) {
    let mut user = update.user;
    if user.uid.is_empty() {
        // Some update responses omit the uid; keep the current one.
        if let Some(current) = session.current() {
            user.uid = current.user.uid;
        }
    }
    session.update_user(user);
    if let (Some(id_token), Some(refresh_token)) = (update.id_token, update.refresh_token) {
        session.update_tokens(id_token, refresh_token);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::actions::{CredentialMethod, OperationMode, field_requirements};
    use crate::auth::{AccountUpdate, AuthUser, SignedIn, TokenRefresh};

    /// Records every backend call by name; optionally fails all of them.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<&'static str>>,
        fail: bool,
    }

    impl FakeBackend {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn record(&self, name: &'static str) -> Result<()> {
            self.calls.lock().expect("lock").push(name);
            if self.fail {
                Err(anyhow!("BACKEND_DOWN"))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("lock").clone()
        }

        fn user(uid: &str) -> AuthUser {
            AuthUser {
                uid: uid.to_string(),
                email: Some("a@b.com".to_string()),
                ..AuthUser::default()
            }
        }

        fn signed_in(uid: &str) -> SignedIn {
            SignedIn {
                user: Self::user(uid),
                id_token: "id-token".to_string(),
                refresh_token: "refresh-token".to_string(),
            }
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn fetch_providers(&self, _email: &str) -> Result<Vec<String>> {
            self.record("fetch_providers")?;
            Ok(vec!["password".to_string(), "google.com".to_string()])
        }

        async fn sign_in_anonymously(&self) -> Result<SignedIn> {
            self.record("sign_in_anonymously")?;
            Ok(Self::signed_in("anon"))
        }

        async fn sign_in_with_credential(&self, credential: &Credential) -> Result<SignedIn> {
            self.record("sign_in_with_credential")?;
            match credential {
                Credential::EmailPassword { .. } => Ok(Self::signed_in("u1")),
                Credential::GoogleIdToken { .. } => Ok(Self::signed_in("g1")),
            }
        }

        async fn create_user(&self, _email: &str, _password: &str) -> Result<SignedIn> {
            self.record("create_user")?;
            Ok(Self::signed_in("new"))
        }

        async fn update_email(&self, _id_token: &str, new_email: &str) -> Result<AccountUpdate> {
            self.record("update_email")?;
            let mut user = Self::user("u1");
            user.email = Some(new_email.to_string());
            Ok(AccountUpdate {
                user,
                id_token: Some("rotated-id".to_string()),
                refresh_token: Some("rotated-refresh".to_string()),
            })
        }

        async fn update_password(
            &self,
            _id_token: &str,
            _new_password: &str,
        ) -> Result<AccountUpdate> {
            self.record("update_password")?;
            Ok(AccountUpdate {
                user: Self::user("u1"),
                id_token: None,
                refresh_token: None,
            })
        }

        async fn reload(&self, _id_token: &str) -> Result<AuthUser> {
            self.record("reload")?;
            Ok(Self::user("u1"))
        }

        async fn refresh_id_token(&self, _refresh_token: &str) -> Result<TokenRefresh> {
            self.record("refresh_id_token")?;
            Ok(TokenRefresh {
                id_token: "fresh-id".to_string(),
                refresh_token: "fresh-refresh".to_string(),
            })
        }

        async fn link_credential(
            &self,
            _id_token: &str,
            _credential: &Credential,
        ) -> Result<AccountUpdate> {
            self.record("link_credential")?;
            Ok(AccountUpdate {
                user: Self::user("u1"),
                id_token: None,
                refresh_token: None,
            })
        }

        async fn delete_account(&self, _id_token: &str) -> Result<()> {
            self.record("delete_account")
        }
    }

    fn signed_in_session(uid: &str) -> AuthSession {
        let session = AuthSession::new();
        session.set(FakeBackend::signed_in(uid));
        session
    }

    fn request(action: Action) -> ExecuteRequest {
        let needs_fields = field_requirements(action, CredentialMethod::EmailPassword);
        ExecuteRequest {
            action,
            email: if needs_fields.email {
                "a@b.com".to_string()
            } else {
                String::new()
            },
            password: if needs_fields.password {
                "pw".to_string()
            } else {
                String::new()
            },
            credential: action
                .requires_credential()
                .then(|| Credential::email_password("a@b.com", "pw")),
        }
    }

    /// Expected backend call per action; None means the action is local.
    fn expected_call(action: Action) -> Option<&'static str> {
        match action {
            Action::Session(SessionAction::FetchProvidersForEmail) => Some("fetch_providers"),
            Action::Session(SessionAction::SignInAnonymously) => Some("sign_in_anonymously"),
            Action::Session(SessionAction::SignInWithCredential)
            | Action::User(UserAction::Reauthenticate) => Some("sign_in_with_credential"),
            Action::Session(SessionAction::CreateUser) => Some("create_user"),
            Action::Session(SessionAction::SignOut) => None,
            Action::User(UserAction::UpdateEmail) => Some("update_email"),
            Action::User(UserAction::UpdatePassword) => Some("update_password"),
            Action::User(UserAction::Reload) => Some("reload"),
            Action::User(UserAction::GetIdToken) => Some("refresh_id_token"),
            Action::User(UserAction::LinkWithCredential) => Some("link_credential"),
            Action::User(UserAction::DeleteAccount) => Some("delete_account"),
        }
    }

    fn all_actions() -> Vec<Action> {
        let mut actions: Vec<Action> = SessionAction::ALL
            .iter()
            .copied()
            .map(Action::Session)
            .collect();
        actions.extend(UserAction::ALL.iter().copied().map(Action::User));
        actions
    }

    #[tokio::test]
    async fn test_dispatch_table_is_total_and_unambiguous() {
        for action in all_actions() {
            let backend = FakeBackend::default();
            let session = signed_in_session("u1");
            let result = execute(&backend, &session, &request(action)).await;
            assert!(result.is_ok(), "{action} failed: {result:?}");

            let calls = backend.calls();
            match expected_call(action) {
                Some(name) => assert_eq!(calls, vec![name], "{action}"),
                None => assert!(calls.is_empty(), "{action} should be local"),
            }
        }
    }

    #[tokio::test]
    async fn test_user_actions_require_signed_in_user() {
        for &action in UserAction::ALL {
            let backend = FakeBackend::default();
            let session = AuthSession::new();
            let err = execute(&backend, &session, &request(Action::User(action)))
                .await
                .expect_err("must reject signed-out user op");
            assert!(err.to_string().contains("No user is signed in"));
            assert!(backend.calls().is_empty(), "no call may be made");
        }
    }

    #[tokio::test]
    async fn test_empty_email_is_rejected_before_dispatch() {
        let backend = FakeBackend::default();
        let session = AuthSession::new();
        let req = ExecuteRequest {
            action: Action::Session(SessionAction::FetchProvidersForEmail),
            email: "   ".to_string(),
            password: String::new(),
            credential: None,
        };
        let err = execute(&backend, &session, &req).await.expect_err("empty email");
        assert!(err.to_string().contains("Email field is empty"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_is_rejected() {
        let backend = FakeBackend::default();
        let session = AuthSession::new();
        let req = ExecuteRequest {
            action: Action::Session(SessionAction::SignInWithCredential),
            email: String::new(),
            password: String::new(),
            credential: None,
        };
        let err = execute(&backend, &session, &req).await.expect_err("no credential");
        assert!(err.to_string().contains("No credential resolved"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failing_call_never_mutates_session() {
        for action in all_actions() {
            if expected_call(action).is_none() {
                continue;
            }
            let backend = FakeBackend::failing();
            let session = signed_in_session("u1");
            let before = session.current();

            let result = execute(&backend, &session, &request(action)).await;
            assert!(result.is_err(), "{action} should propagate the failure");
            assert_eq!(session.current(), before, "{action} mutated the session");
        }
    }

    #[tokio::test]
    async fn test_sign_in_updates_session() {
        let backend = FakeBackend::default();
        let session = AuthSession::new();
        let message = execute(
            &backend,
            &session,
            &request(Action::Session(SessionAction::SignInWithCredential)),
        )
        .await
        .expect("sign in");
        assert!(message.contains("uid=u1"));
        assert_eq!(session.current().map(|s| s.user.uid), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_without_backend_call() {
        let backend = FakeBackend::default();
        let session = signed_in_session("u1");
        let message = execute(
            &backend,
            &session,
            &request(Action::Session(SessionAction::SignOut)),
        )
        .await
        .expect("sign out");
        assert_eq!(message, "Signed out");
        assert!(session.current().is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reauthenticate_rejects_uid_mismatch() {
        let backend = FakeBackend::default();
        let session = signed_in_session("someone-else");
        let err = execute(
            &backend,
            &session,
            &request(Action::User(UserAction::Reauthenticate)),
        )
        .await
        .expect_err("uid mismatch");
        assert!(err.to_string().contains("different user"));
        // Session keeps the original identity.
        assert_eq!(
            session.current().map(|s| s.user.uid),
            Some("someone-else".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_id_token_returns_raw_token_and_rotates() {
        let backend = FakeBackend::default();
        let session = signed_in_session("u1");
        let message = execute(
            &backend,
            &session,
            &request(Action::User(UserAction::GetIdToken)),
        )
        .await
        .expect("token");
        assert_eq!(message, "fresh-id");
        let current = session.current().expect("signed in");
        assert_eq!(current.id_token, "fresh-id");
        assert_eq!(current.refresh_token, "fresh-refresh");
    }

    #[tokio::test]
    async fn test_update_email_adopts_rotated_tokens() {
        let backend = FakeBackend::default();
        let session = signed_in_session("u1");
        execute(
            &backend,
            &session,
            &request(Action::User(UserAction::UpdateEmail)),
        )
        .await
        .expect("update");
        let current = session.current().expect("signed in");
        assert_eq!(current.user.email.as_deref(), Some("a@b.com"));
        assert_eq!(current.id_token, "rotated-id");
    }

    #[tokio::test]
    async fn test_delete_account_clears_session() {
        let backend = FakeBackend::default();
        let session = signed_in_session("u1");
        execute(
            &backend,
            &session,
            &request(Action::User(UserAction::DeleteAccount)),
        )
        .await
        .expect("delete");
        assert!(session.current().is_none());
    }

    #[test]
    fn test_mode_of_every_action_matches_its_family() {
        for action in all_actions() {
            match action {
                Action::Session(_) => assert_eq!(action.mode(), OperationMode::Session),
                Action::User(_) => assert_eq!(action.mode(), OperationMode::User),
            }
        }
    }
}
