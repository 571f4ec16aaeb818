//! REST client for the Identity Toolkit surface.
//!
//! One struct, one HTTP client, one endpoint helper. Backend failures carry
//! the server's error message (`EMAIL_EXISTS`, `INVALID_PASSWORD`, ...) up the
//! anyhow chain; tokens are never logged.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{AccountUpdate, AuthUser, Credential, SignedIn, TokenRefresh};
use super::wire::{
    ApiErrorEnvelope, AuthResponse, CreateAuthUriRequest, CreateAuthUriResponse,
    DeleteAccountRequest, LookupRequest, LookupResponse, SecureTokenResponse,
    SignInPasswordRequest, SignInWithIdpRequest, SignUpRequest, UpdateAccountRequest,
};
use super::AuthBackend;

/// Production Identity Toolkit endpoint.
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
/// Production secure-token endpoint.
pub const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com";

/// The API requires a continue/request URI even for non-redirect flows.
const LOCAL_CONTINUE_URI: &str = "http://localhost";

/// Connection settings for [`IdentityClient`].
#[derive(Debug, Clone)]
pub struct IdentityOptions {
    pub api_key: String,
    pub base_url: String,
    pub secure_token_url: String,
}

/// Identity Toolkit API client.
pub struct IdentityClient {
    options: IdentityOptions,
    http: reqwest::Client,
}

impl IdentityClient {
    /// Creates a new client with the given connection settings.
    ///
    /// # Panics
    /// In test builds, panics if `base_url` is the production API. Unit tests
    /// must point `base_url` at a local mock or the emulator.
    pub fn new(options: IdentityOptions) -> Self {
        #[cfg(test)]
        if options.base_url == DEFAULT_BASE_URL {
            panic!(
                "Tests must not use the production Identity Toolkit API!\n\
                 Point base_url at a mock server or the emulator.\n\
                 Found base_url: {}",
                options.base_url
            );
        }

        Self {
            options,
            http: reqwest::Client::new(),
        }
    }

    fn account_endpoint(&self, verb: &str) -> String {
        format!(
            "{}/v1/accounts:{verb}?key={}",
            self.options.base_url, self.options.api_key
        )
    }

    fn token_endpoint(&self) -> String {
        format!(
            "{}/v1/token?key={}",
            self.options.secure_token_url, self.options.api_key
        )
    }

    /// Posts a JSON body and decodes either the success payload or the
    /// backend's error envelope.
    async fn post<Req: Serialize + Sync, Resp: DeserializeOwned>(
        &self,
        url: &str,
        body: &Req,
    ) -> Result<Resp> {
        tracing::debug!(url, "identity request");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send identity request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(&text) {
                bail!("{}", envelope.error.message);
            }
            bail!("Identity request failed (HTTP {status}): {text}");
        }

        response
            .json()
            .await
            .context("Failed to parse identity response")
    }

    /// Builds the canonical signed-in result for a fresh token pair.
    ///
    /// Sign-in responses carry a partial profile; a follow-up lookup returns
    /// the full snapshot (provider IDs, photo) the way the upstream SDKs
    /// refresh the user after sign-in.
    async fn signed_in(&self, response: AuthResponse) -> Result<SignedIn> {
        let id_token = response
            .id_token
            .clone()
            .context("Backend returned no ID token")?;
        let refresh_token = response
            .refresh_token
            .clone()
            .context("Backend returned no refresh token")?;
        let user = self.reload(&id_token).await.unwrap_or_else(|_| {
            let providers = response.provider_id.clone().into_iter().collect();
            response.to_user(providers)
        });
        Ok(SignedIn {
            user,
            id_token,
            refresh_token,
        })
    }

    async fn sign_in_with_idp(
        &self,
        google_id_token: &str,
        link_to: Option<&str>,
    ) -> Result<AuthResponse> {
        let post_body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("id_token", google_id_token)
            .append_pair("providerId", "google.com")
            .finish();
        let request = SignInWithIdpRequest {
            post_body,
            request_uri: LOCAL_CONTINUE_URI,
            return_secure_token: true,
            return_idp_credential: true,
            id_token: link_to,
        };
        self.post(&self.account_endpoint("signInWithIdp"), &request)
            .await
    }

    fn account_update(response: AuthResponse) -> AccountUpdate {
        let id_token = response.id_token.clone();
        let refresh_token = response.refresh_token.clone();
        let providers = response.provider_id.clone().into_iter().collect();
        AccountUpdate {
            user: response.to_user(providers),
            id_token,
            refresh_token,
        }
    }
}

#[async_trait]
impl AuthBackend for IdentityClient {
    async fn fetch_providers(&self, email: &str) -> Result<Vec<String>> {
        let request = CreateAuthUriRequest {
            identifier: email,
            continue_uri: LOCAL_CONTINUE_URI,
        };
        let response: CreateAuthUriResponse = self
            .post(&self.account_endpoint("createAuthUri"), &request)
            .await?;
        // Newer backends report signinMethods; allProviders is the legacy name.
        if response.all_providers.is_empty() {
            Ok(response.signin_methods)
        } else {
            Ok(response.all_providers)
        }
    }

    async fn sign_in_anonymously(&self) -> Result<SignedIn> {
        let request = SignUpRequest {
            email: None,
            password: None,
            return_secure_token: true,
        };
        let response: AuthResponse = self.post(&self.account_endpoint("signUp"), &request).await?;
        self.signed_in(response).await
    }

    async fn sign_in_with_credential(&self, credential: &Credential) -> Result<SignedIn> {
        let response: AuthResponse = match credential {
            Credential::EmailPassword { email, password } => {
                let request = SignInPasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                };
                self.post(&self.account_endpoint("signInWithPassword"), &request)
                    .await?
            }
            Credential::GoogleIdToken { id_token } => {
                self.sign_in_with_idp(id_token, None).await?
            }
        };
        self.signed_in(response).await
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<SignedIn> {
        let request = SignUpRequest {
            email: Some(email),
            password: Some(password),
            return_secure_token: true,
        };
        let response: AuthResponse = self.post(&self.account_endpoint("signUp"), &request).await?;
        self.signed_in(response).await
    }

    async fn update_email(&self, id_token: &str, new_email: &str) -> Result<AccountUpdate> {
        let request = UpdateAccountRequest {
            id_token,
            email: Some(new_email),
            password: None,
            return_secure_token: true,
        };
        let response: AuthResponse =
            self.post(&self.account_endpoint("update"), &request).await?;
        Ok(Self::account_update(response))
    }

    async fn update_password(&self, id_token: &str, new_password: &str) -> Result<AccountUpdate> {
        let request = UpdateAccountRequest {
            id_token,
            email: None,
            password: Some(new_password),
            return_secure_token: true,
        };
        let response: AuthResponse =
            self.post(&self.account_endpoint("update"), &request).await?;
        Ok(Self::account_update(response))
    }

    async fn reload(&self, id_token: &str) -> Result<AuthUser> {
        let request = LookupRequest { id_token };
        let response: LookupResponse =
            self.post(&self.account_endpoint("lookup"), &request).await?;
        response
            .users
            .into_iter()
            .next()
            .map(super::wire::LookupUser::into_user)
            .context("Backend returned no user for token")
    }

    async fn refresh_id_token(&self, refresh_token: &str) -> Result<TokenRefresh> {
        tracing::debug!("secure token exchange");
        let response = self
            .http
            .post(self.token_endpoint())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(&text) {
                bail!("{}", envelope.error.message);
            }
            bail!("Token refresh failed (HTTP {status}): {text}");
        }

        let tokens: SecureTokenResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;
        Ok(TokenRefresh {
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
        })
    }

    async fn link_credential(
        &self,
        id_token: &str,
        credential: &Credential,
    ) -> Result<AccountUpdate> {
        let response: AuthResponse = match credential {
            // Email/password links through the profile update endpoint.
            Credential::EmailPassword { email, password } => {
                let request = UpdateAccountRequest {
                    id_token,
                    email: Some(email),
                    password: Some(password),
                    return_secure_token: true,
                };
                self.post(&self.account_endpoint("update"), &request).await?
            }
            Credential::GoogleIdToken {
                id_token: google_token,
            } => self.sign_in_with_idp(google_token, Some(id_token)).await?,
        };
        Ok(Self::account_update(response))
    }

    async fn delete_account(&self, id_token: &str) -> Result<()> {
        let request = DeleteAccountRequest { id_token };
        let _: serde_json::Value = self.post(&self.account_endpoint("delete"), &request).await?;
        Ok(())
    }
}
