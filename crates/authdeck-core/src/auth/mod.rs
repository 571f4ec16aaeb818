//! Auth backend seam, identity types, and the in-memory session.
//!
//! The dispatcher talks to `dyn AuthBackend`, so tests substitute a recording
//! fake and the production build plugs in [`client::IdentityClient`].

pub mod client;
pub mod session;
pub mod types;
pub mod wire;

use anyhow::Result;
use async_trait::async_trait;

pub use client::{IdentityClient, IdentityOptions};
pub use session::{AuthSession, SessionUser};
pub use types::{AccountUpdate, AuthUser, Credential, SignedIn, TokenRefresh};

/// Remote operations against the identity backend.
///
/// Sign-out is not here: it is a local session operation with no wire call.
/// User-scoped operations take the caller's current ID token explicitly; a
/// missing token is rejected by the dispatcher before any call is made.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Lists the sign-in providers registered for an email address.
    async fn fetch_providers(&self, email: &str) -> Result<Vec<String>>;

    async fn sign_in_anonymously(&self) -> Result<SignedIn>;

    async fn sign_in_with_credential(&self, credential: &Credential) -> Result<SignedIn>;

    async fn create_user(&self, email: &str, password: &str) -> Result<SignedIn>;

    async fn update_email(&self, id_token: &str, new_email: &str) -> Result<AccountUpdate>;

    async fn update_password(&self, id_token: &str, new_password: &str) -> Result<AccountUpdate>;

    /// Re-fetches the identity snapshot for the given token.
    async fn reload(&self, id_token: &str) -> Result<AuthUser>;

    /// Exchanges a refresh token for a fresh ID token.
    async fn refresh_id_token(&self, refresh_token: &str) -> Result<TokenRefresh>;

    /// Links a credential to the account behind `id_token`.
    async fn link_credential(&self, id_token: &str, credential: &Credential)
    -> Result<AccountUpdate>;

    async fn delete_account(&self, id_token: &str) -> Result<()>;
}
