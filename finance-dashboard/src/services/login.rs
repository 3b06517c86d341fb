use axum::response::Redirect;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use service_core::error::AppError;
use sha2::{Digest, Sha256};
use tower_sessions::Session;

use crate::gate::SessionIdentity;
use crate::models::{keys, PendingLogin, ProviderProfile};
use crate::services::identity_provider::{AuthorizationRequest, IdentityProvider};

fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::SessionError(anyhow::Error::new(err))
}

/// Returns `(code_verifier, code_challenge)` for an S256 PKCE exchange.
pub fn generate_pkce_pair() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let code_verifier = URL_SAFE_NO_PAD.encode(bytes);
    let code_challenge = pkce_challenge(&code_verifier);
    (code_verifier, code_challenge)
}

pub fn pkce_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Starts the provider's login flow: remembers the OAuth state and PKCE
/// verifier in the session and redirects the browser to the consent page.
pub async fn begin_login(
    session: &Session,
    provider: &dyn IdentityProvider,
) -> Result<Redirect, AppError> {
    let state = uuid::Uuid::new_v4().to_string();
    let (code_verifier, code_challenge) = generate_pkce_pair();

    let url = provider.authorization_url(&AuthorizationRequest {
        state: state.clone(),
        code_challenge,
    })?;

    session
        .insert(
            keys::PENDING_LOGIN,
            PendingLogin {
                provider: provider.name().to_string(),
                state,
                code_verifier,
            },
        )
        .await
        .map_err(session_error)?;

    tracing::info!(provider = %provider.name(), "Redirecting to identity provider");

    Ok(Redirect::to(&url))
}

/// Finishes a login started by [`begin_login`] and stores the resulting
/// identity in a fresh session id.
pub async fn complete_login(
    session: &Session,
    provider: &dyn IdentityProvider,
    code: &str,
    state: &str,
) -> Result<ProviderProfile, AppError> {
    let pending: PendingLogin = session
        .remove(keys::PENDING_LOGIN)
        .await
        .map_err(session_error)?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No login in progress")))?;

    if pending.provider != provider.name() || pending.state != state {
        tracing::warn!(provider = %provider.name(), "OAuth state mismatch");
        return Err(AppError::BadRequest(anyhow::anyhow!("Invalid OAuth state")));
    }

    let profile = provider.exchange_code(code, &pending.code_verifier).await?;

    // New id for the authenticated session so a pre-login id cannot be reused.
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(keys::IDENTITY, &profile)
        .await
        .map_err(session_error)?;

    tracing::info!(
        provider = %profile.provider,
        subject = %profile.subject,
        "User logged in via identity provider"
    );

    Ok(profile)
}

/// Destroys the session identity and its cookie.
pub async fn end_logout(session: &Session) -> Result<(), AppError> {
    session.flush().await.map_err(session_error)?;
    tracing::info!("Session cleared on logout");
    Ok(())
}

/// Reads the identity for this render. No stored profile means anonymous.
pub async fn load_identity(session: &Session) -> Result<SessionIdentity, AppError> {
    let profile: Option<ProviderProfile> =
        session.get(keys::IDENTITY).await.map_err(session_error)?;

    Ok(profile
        .map(|p| p.to_identity())
        .unwrap_or_else(SessionIdentity::anonymous))
}
