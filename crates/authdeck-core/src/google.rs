//! Interactive Google federated sign-in.
//!
//! The flow: generate PKCE and a `state` nonce, bind a one-shot localhost
//! listener, open the system browser at the consent URL, wait for the single
//! callback request, exchange the code for tokens, and wrap the returned
//! `id_token` into a [`Credential`]. The operator closing or denying the
//! consent page surfaces as an error; there is no separate cancel signal.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str = "openid email profile";
const CALLBACK_PATH: &str = "/callback";

/// How long to wait for the operator to finish the consent page.
const CALLBACK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

const CALLBACK_PAGE: &str = "<html><body><p>Sign-in complete. \
     You can close this window and return to authdeck.</p></body></html>";

/// PKCE code verifier and challenge.
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

/// Generates a PKCE verifier/challenge pair (S256).
pub fn generate_pkce() -> Pkce {
    // Two UUIDs give 32 random bytes for the verifier.
    let uuid1 = uuid::Uuid::new_v4();
    let uuid2 = uuid::Uuid::new_v4();
    let mut verifier_bytes = [0u8; 32];
    verifier_bytes[..16].copy_from_slice(uuid1.as_bytes());
    verifier_bytes[16..].copy_from_slice(uuid2.as_bytes());
    let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

    Pkce {
        verifier,
        challenge,
    }
}

/// Builds the consent-page URL.
pub fn build_auth_url(client_id: &str, pkce: &Pkce, state: &str, redirect_uri: &str) -> String {
    let params = [
        ("client_id", client_id),
        ("response_type", "code"),
        ("redirect_uri", redirect_uri),
        ("scope", SCOPES),
        ("code_challenge", &pkce.challenge),
        ("code_challenge_method", "S256"),
        ("state", state),
        ("access_type", "offline"),
        ("prompt", "select_account"),
    ];

    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    format!("{AUTHORIZE_URL}?{query}")
}

pub fn build_redirect_uri(port: u16) -> String {
    format!("http://127.0.0.1:{port}{CALLBACK_PATH}")
}

/// Extracts `code` and `state` from the callback request target.
///
/// A provider-reported `error` (consent denied, flow aborted) becomes an
/// error here, per the single error taxonomy.
pub fn parse_callback_target(target: &str) -> Result<(String, String)> {
    let url = url::Url::parse(&format!("http://localhost{target}"))
        .context("Malformed callback request")?;
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => bail!("Federated sign-in failed: {value}"),
            _ => {}
        }
    }
    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => bail!("Callback carried no authorization code"),
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// Google OAuth client settings.
#[derive(Debug, Clone)]
pub struct GoogleOptions {
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Token endpoint, overridable for tests/emulators.
    pub token_url: String,
}

impl GoogleOptions {
    pub fn new(client_id: String, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// Runs the interactive federated flow end to end.
pub struct GoogleFlow {
    options: GoogleOptions,
    http: reqwest::Client,
}

impl GoogleFlow {
    pub fn new(options: GoogleOptions) -> Self {
        Self {
            options,
            http: reqwest::Client::new(),
        }
    }

    /// Opens the consent page and resolves a Google credential.
    ///
    /// Suspends until the operator completes or abandons the consent flow.
    pub async fn sign_in(&self) -> Result<crate::auth::Credential> {
        if self.options.client_id.is_empty() {
            bail!("No Google client_id configured (set [google].client_id in config)");
        }

        let pkce = generate_pkce();
        let state = uuid::Uuid::new_v4().to_string();

        // Bind before opening the browser so the redirect cannot race us.
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind local callback listener")?;
        let port = listener
            .local_addr()
            .context("Failed to read callback listener address")?
            .port();
        let redirect_uri = build_redirect_uri(port);
        let auth_url = build_auth_url(&self.options.client_id, &pkce, &state, &redirect_uri);

        tracing::info!(port, "starting federated sign-in");
        open::that(&auth_url).context("Failed to open browser for consent page")?;

        let (code, returned_state) = tokio::time::timeout(
            CALLBACK_TIMEOUT,
            accept_callback(&listener),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Federated sign-in timed out"))??;

        if returned_state != state {
            bail!("Federated sign-in state mismatch");
        }

        self.exchange_code(&code, &pkce, &redirect_uri).await
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce: &Pkce,
        redirect_uri: &str,
    ) -> Result<crate::auth::Credential> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.options.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", pkce.verifier.as_str()),
        ];
        if let Some(secret) = &self.options.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self
            .http
            .post(&self.options.token_url)
            .form(&form)
            .send()
            .await
            .context("Failed to send token exchange request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Token exchange failed (HTTP {status}): {body}");
        }

        let tokens: GoogleTokenResponse = response
            .json()
            .await
            .context("Failed to parse token exchange response")?;
        let id_token = tokens
            .id_token
            .context("Token response carried no id_token")?;

        Ok(crate::auth::Credential::GoogleIdToken { id_token })
    }
}

/// Accepts exactly one callback request and answers it with a small HTML page.
async fn accept_callback(listener: &TcpListener) -> Result<(String, String)> {
    let (mut stream, _) = listener
        .accept()
        .await
        .context("Failed to accept callback connection")?;

    let mut buf = vec![0u8; 8192];
    let n = stream
        .read(&mut buf)
        .await
        .context("Failed to read callback request")?;
    let request = String::from_utf8_lossy(&buf[..n]);

    // "GET /callback?code=...&state=... HTTP/1.1"
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .context("Malformed callback request line")?;
    let parsed = parse_callback_target(target);

    let body = match &parsed {
        Ok(_) => CALLBACK_PAGE.to_string(),
        Err(e) => format!("<html><body><p>Sign-in failed: {e}</p></body></html>"),
    };
    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(reply.as_bytes()).await;
    let _ = stream.shutdown().await;

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_challenge_is_s256_of_verifier() {
        let pkce = generate_pkce();
        // 32 bytes -> 43 chars of unpadded base64url.
        assert_eq!(pkce.verifier.len(), 43);
        let mut hasher = Sha256::new();
        hasher.update(pkce.verifier.as_bytes());
        let expected = URL_SAFE_NO_PAD.encode(hasher.finalize());
        assert_eq!(pkce.challenge, expected);
    }

    #[test]
    fn test_pkce_is_unique_per_call() {
        assert_ne!(generate_pkce().verifier, generate_pkce().verifier);
    }

    #[test]
    fn test_auth_url_carries_required_params() {
        let pkce = generate_pkce();
        let url = build_auth_url("client-1", &pkce, "state-1", "http://127.0.0.1:7777/callback");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("code_challenge={}", pkce.challenge)));
        assert!(url.contains("state=state-1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A7777%2Fcallback"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn test_parse_callback_extracts_code_and_state() {
        let (code, state) =
            parse_callback_target("/callback?state=s1&code=c1").expect("parse");
        assert_eq!(code, "c1");
        assert_eq!(state, "s1");
    }

    #[test]
    fn test_parse_callback_denied_is_error() {
        let err = parse_callback_target("/callback?error=access_denied").expect_err("denied");
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_parse_callback_without_code_is_error() {
        assert!(parse_callback_target("/callback?state=s1").is_err());
    }
}
