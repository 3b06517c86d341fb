use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::IdentityProviderSettings;
use crate::models::ProviderProfile;

/// Parameters the dashboard contributes to an authorization redirect.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub state: String,
    pub code_challenge: String,
}

/// External identity provider. The dashboard never verifies identities itself;
/// it trusts whatever profile the provider hands back from `exchange_code`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;

    /// URL of the provider's consent page for this login attempt.
    fn authorization_url(&self, request: &AuthorizationRequest) -> Result<String, AppError>;

    /// Trades an authorization code for the user's profile.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderProfile, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Accepts both the OpenID Connect userinfo shape (`sub`, `email_verified`)
/// and Google's legacy v2 shape (`id`, `verified_email`).
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(alias = "id")]
    sub: String,
    email: Option<String>,
    #[serde(alias = "verified_email")]
    email_verified: Option<bool>,
    name: Option<String>,
}

/// OAuth 2.0 authorization-code provider with PKCE (S256).
pub struct OAuthProvider {
    client: Client,
    settings: IdentityProviderSettings,
}

impl OAuthProvider {
    pub fn new(settings: IdentityProviderSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    async fn fetch_access_token(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<String, AppError> {
        let token_res = self
            .client
            .traced_post(&self.settings.token_url)
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                (
                    "client_secret",
                    self.settings.client_secret.expose_secret().as_str(),
                ),
                ("code", code),
                ("code_verifier", code_verifier),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.settings.name, error = %e, "Failed to reach token endpoint");
                AppError::BadGateway("identity provider unreachable".to_string())
            })?;

        if !token_res.status().is_success() {
            let status = token_res.status();
            let err_body = token_res.text().await.unwrap_or_default();
            tracing::error!(
                provider = %self.settings.name,
                status = %status,
                body = %err_body,
                "Token exchange rejected"
            );
            return Err(AppError::AuthError(anyhow::anyhow!("Authentication failed")));
        }

        let token: TokenResponse = token_res.json().await.map_err(|e| {
            tracing::error!(provider = %self.settings.name, error = %e, "Failed to parse token response");
            AppError::BadGateway("invalid token response".to_string())
        })?;

        Ok(token.access_token)
    }

    async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, AppError> {
        let user_info_res = self
            .client
            .traced_get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = %self.settings.name, error = %e, "Failed to reach userinfo endpoint");
                AppError::BadGateway("identity provider unreachable".to_string())
            })?;

        if !user_info_res.status().is_success() {
            tracing::error!(
                provider = %self.settings.name,
                status = %user_info_res.status(),
                "Userinfo request rejected"
            );
            return Err(AppError::AuthError(anyhow::anyhow!("Authentication failed")));
        }

        user_info_res.json().await.map_err(|e| {
            tracing::error!(provider = %self.settings.name, error = %e, "Failed to parse user info");
            AppError::BadGateway("invalid userinfo response".to_string())
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    fn name(&self) -> &str {
        &self.settings.name
    }

    fn authorization_url(&self, request: &AuthorizationRequest) -> Result<String, AppError> {
        let url = Url::parse_with_params(
            &self.settings.authorize_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.settings.scopes.as_str()),
                ("state", request.state.as_str()),
                ("code_challenge", request.code_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid authorize_url for provider '{}': {}",
                self.settings.name,
                e
            ))
        })?;

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<ProviderProfile, AppError> {
        let access_token = self.fetch_access_token(code, code_verifier).await?;
        let user_info = self.fetch_user_info(&access_token).await?;

        if user_info.email_verified == Some(false) {
            tracing::warn!(provider = %self.settings.name, subject = %user_info.sub, "Provider reports unverified email");
            return Err(AppError::AuthError(anyhow::anyhow!(
                "Account email not verified"
            )));
        }

        Ok(ProviderProfile {
            provider: self.settings.name.clone(),
            subject: user_info.sub,
            email: user_info.email,
            name: user_info.name,
        })
    }
}

/// Identity providers available for login, keyed by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn IdentityProvider>, AppError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Unknown identity provider: {}", name))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}
