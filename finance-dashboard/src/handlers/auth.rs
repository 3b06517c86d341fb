use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use service_core::error::AppError;
use tower_sessions::Session;

use crate::services::login::{begin_login, complete_login, end_logout};
use crate::AppState;

/// Query parameters the provider appends when redirecting back.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Starts a login with the named provider.
pub async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    session: Session,
) -> Result<Redirect, AppError> {
    let provider = state.providers.get(&provider)?;
    begin_login(&session, provider.as_ref()).await
}

/// Processes the provider's redirect back to the dashboard.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
    session: Session,
) -> Result<Redirect, AppError> {
    let provider = state.providers.get(&provider)?;

    if let Some(error) = params.error {
        tracing::warn!(provider = %provider.name(), error = %error, "Provider returned an error");
        return Err(AppError::AuthError(anyhow::anyhow!(
            "Login was not completed: {}",
            error
        )));
    }

    let (code, oauth_state) = match (params.code, params.state) {
        (Some(code), Some(oauth_state)) => (code, oauth_state),
        _ => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Missing code or state"
            )))
        }
    };

    complete_login(&session, provider.as_ref(), &code, &oauth_state).await?;

    Ok(Redirect::to("/"))
}

pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    end_logout(&session).await?;
    Ok(Redirect::to("/"))
}
