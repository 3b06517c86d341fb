use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use service_core::error::AppError;
use tower_sessions::Session;

use crate::gate::GateDecision;
use crate::locale::{Locale, Text};
use crate::services::dashboard::Dashboard;
use crate::services::login::{begin_login, load_identity};
use crate::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub lang: &'static str,
    pub page_title: &'static str,
    pub greeting: String,
    pub sign_out: &'static str,
    pub headline_title: &'static str,
    pub details_title: &'static str,
    pub dashboard: &'a Dashboard,
}

impl<'a> DashboardTemplate<'a> {
    fn new(dashboard: &'a Dashboard, locale: Locale, display_name: &str) -> Self {
        Self {
            lang: locale.html_lang(),
            page_title: locale.page_title(),
            greeting: locale.greeting(display_name),
            sign_out: locale.sign_out(),
            headline_title: locale.text(Text::HeadlineSection),
            details_title: locale.text(Text::ShowDetails),
            dashboard,
        }
    }
}

#[derive(Template)]
#[template(path = "denied.html")]
pub struct DeniedTemplate {
    pub lang: &'static str,
    pub page_title: &'static str,
    pub message: &'static str,
    pub sign_out: &'static str,
}

impl DeniedTemplate {
    fn new(locale: Locale) -> Self {
        Self {
            lang: locale.html_lang(),
            page_title: locale.page_title(),
            message: locale.denial_message(),
            sign_out: locale.sign_out(),
        }
    }
}

/// The protected page. Every render re-reads the session identity and asks the
/// gate before anything from the dashboard is produced.
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let identity = load_identity(&session).await?;
    let decision = state.access.decide(&identity);
    let locale = state.access.locale;

    counter!("gate_decisions_total", "outcome" => decision.outcome()).increment(1);

    match decision {
        GateDecision::Unauthenticated => {
            tracing::info!(outcome = decision.outcome(), "Gate decision");
            let provider = state.providers.get(&state.access.login_provider)?;
            Ok(begin_login(&session, provider.as_ref()).await?.into_response())
        }
        GateDecision::Granted { ref display_name } => {
            tracing::info!(outcome = decision.outcome(), "Gate decision");
            Ok(DashboardTemplate::new(&state.dashboard, locale, display_name).into_response())
        }
        GateDecision::Denied { ref email } => {
            tracing::warn!(
                outcome = decision.outcome(),
                email = email.as_deref().unwrap_or("<none>"),
                "Gate decision"
            );
            Ok((StatusCode::FORBIDDEN, DeniedTemplate::new(locale)).into_response())
        }
    }
}
