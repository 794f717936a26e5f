//! OpenID Connect identity provider.
//!
//! Only the `(sub, email)` pair leaves this module; tokens are not stored.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use super::{check_status, ClientError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start a login.
    fn auth_code_url(&self, state: &str, nonce: &str, locale: &str) -> Result<String>;

    async fn exchange(&self, code: &str, nonce: &str) -> Result<Tokens>;

    async fn user_info(&self, access_token: &str) -> Result<UserInfo>;
}

pub struct OidcClient {
    client: Client,
    issuer: String,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl OidcClient {
    pub fn new(
        issuer: &str,
        client_id: &str,
        client_secret: &str,
        redirect_url: &str,
    ) -> Result<Self> {
        if issuer.is_empty() || client_id.is_empty() {
            return Err(ClientError::Config(
                "identity issuer and client_id are required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            issuer: issuer.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_url: redirect_url.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.issuer, path)
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn auth_code_url(&self, state: &str, nonce: &str, locale: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("response_type", "code"),
                ("scope", "openid email"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("state", state),
                ("nonce", nonce),
                ("ui_locales", locale),
            ],
        )
        .map_err(|e| ClientError::Config(format!("invalid issuer url: {e}")))?;

        Ok(url.into())
    }

    async fn exchange(&self, code: &str, nonce: &str) -> Result<Tokens> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await?;

        let tokens: Tokens = check_status("identity", response).await?.json().await?;
        if !tokens.id_token.is_empty() {
            check_nonce(&tokens.id_token, nonce)?;
        }

        debug!("Exchanged authorisation code");
        Ok(tokens)
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo> {
        let response = self
            .client
            .get(self.endpoint("userinfo"))
            .bearer_auth(access_token)
            .send()
            .await?;

        Ok(check_status("identity", response).await?.json().await?)
    }
}

#[derive(Deserialize)]
struct IdClaims {
    #[serde(default)]
    nonce: String,
}

/// Compare the `nonce` claim of an ID token with the one sent at login.
///
/// The token signature is not verified here; the token came straight from
/// the provider over TLS.
fn check_nonce(id_token: &str, nonce: &str) -> Result<()> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::InvalidResponse("id token is not a JWT".to_string()))?;
    let claims: IdClaims = serde_json::from_slice(
        &URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| ClientError::InvalidResponse(format!("id token payload: {e}")))?,
    )?;

    if claims.nonce != nonce {
        return Err(ClientError::InvalidResponse("id token nonce mismatch".to_string()));
    }
    Ok(())
}

/// Identity provider that logs everyone in as one fixed user.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    pub user: UserInfo,
    pub base_url: String,
}

impl MockIdentityProvider {
    pub fn new(sub: &str, email: &str) -> Self {
        Self {
            user: UserInfo {
                sub: sub.to_string(),
                email: email.to_string(),
            },
            base_url: "http://localhost/mock-login".to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn auth_code_url(&self, state: &str, nonce: &str, locale: &str) -> Result<String> {
        Ok(format!(
            "{}?state={state}&nonce={nonce}&ui_locales={locale}",
            self.base_url
        ))
    }

    async fn exchange(&self, code: &str, _nonce: &str) -> Result<Tokens> {
        if code.is_empty() {
            return Err(ClientError::Unavailable("missing code".to_string()));
        }
        Ok(Tokens {
            access_token: format!("token-{code}"),
            id_token: String::new(),
        })
    }

    async fn user_info(&self, _access_token: &str) -> Result<UserInfo> {
        Ok(self.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_code_url_encodes_params() {
        let client = OidcClient::new(
            "https://id.example.com/",
            "client",
            "secret",
            "http://localhost:5050/login-callback",
        )
        .unwrap();

        let url = client.auth_code_url("st", "no", "cy").unwrap();

        assert!(url.starts_with("https://id.example.com/authorize?"));
        assert!(url.contains("scope=openid+email"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5050%2Flogin-callback"));
        assert!(url.contains("state=st"));
        assert!(url.contains("ui_locales=cy"));
    }

    #[test]
    fn test_check_nonce() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"s","nonce":"n-1"}"#);
        let token = format!("header.{payload}.sig");

        assert!(check_nonce(&token, "n-1").is_ok());
        assert!(matches!(
            check_nonce(&token, "other"),
            Err(ClientError::InvalidResponse(_))
        ));
        assert!(check_nonce("garbage", "n-1").is_err());
    }

    #[test]
    fn test_new_requires_issuer() {
        assert!(matches!(
            OidcClient::new("", "client", "secret", "http://x"),
            Err(ClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_provider() {
        let provider = MockIdentityProvider::new("sub-1", "a@example.com");
        let tokens = provider.exchange("code", "nonce").await.unwrap();

        assert_eq!(tokens.access_token, "token-code");
        assert_eq!(
            provider.user_info(&tokens.access_token).await.unwrap().sub,
            "sub-1"
        );
        assert!(provider.exchange("", "nonce").await.is_err());
    }
}
