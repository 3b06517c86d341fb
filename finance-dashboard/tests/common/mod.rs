//! Shared setup for router-level tests: a scripted identity provider, a
//! temporary data directory and helpers that carry the session cookie between
//! requests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use finance_dashboard::{
    config::{DataSettings, ServerSettings},
    gate::{AccessPolicy, AllowList},
    locale::Locale,
    models::ProviderProfile,
    services::{
        dashboard::Dashboard,
        datasets::Datasets,
        identity_provider::{AuthorizationRequest, IdentityProvider, ProviderRegistry},
    },
    session_store::BoundedMemoryStore,
    startup::build_router,
    AppState,
};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const PROVIDER: &str = "google";
pub const AUTHORIZE_URL: &str = "https://idp.test/authorize";

/// Identity provider that hands out a fixed profile per authorization code.
pub struct MockProvider {
    profiles: HashMap<String, ProviderProfile>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn with_user(mut self, code: &str, email: Option<&str>, name: Option<&str>) -> Self {
        self.profiles.insert(
            code.to_string(),
            ProviderProfile {
                provider: PROVIDER.to_string(),
                subject: format!("sub-{}", code),
                email: email.map(str::to_string),
                name: name.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn authorization_url(&self, request: &AuthorizationRequest) -> Result<String, AppError> {
        Ok(format!(
            "{}?state={}&code_challenge={}",
            AUTHORIZE_URL, request.state, request.code_challenge
        ))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: &str,
    ) -> Result<ProviderProfile, AppError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("unknown code")))
    }
}

pub const EXPENSES_CSV: &str = ",mês,Alimentação,Extras,Alimentação %,Extras %\n\
0,Jan,400,100,13.0,3.0\n\
1,Fev,420,,14.0,\n";
pub const INCOME_CSV: &str = ",mês,Renda Bruta,Renda disponível,Lucro\n\
0,Jan,4000,3000,200\n\
1,Fev,4200,3100,150\n";
pub const BALANCE_CSV: &str = ",mês,Saldo Inicial\n0,Jan,1500\n1,Fev,1750.5\n";
pub const INVESTMENTS_CSV: &str = ",mês,Valor Aplicado,Rendimento\n0,Jan,450,10\n1,Fev,500,12\n";

pub struct TestApp {
    pub router: Router,
    pub sessions: BoundedMemoryStore,
    _data_dir: TempDir,
}

pub struct TestAppBuilder {
    allowed: Vec<String>,
    provider: MockProvider,
    locale: Locale,
    files: Vec<(&'static str, &'static str)>,
    max_sessions: usize,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            allowed: vec!["alice@x.com".to_string(), "bob@x.com".to_string()],
            provider: MockProvider::new()
                .with_user("alice", Some("alice@x.com"), Some("Alice"))
                .with_user("carol", Some("carol@x.com"), Some("Carol"))
                .with_user("shouty", Some("Alice@x.com"), Some("Alice"))
                .with_user("nameless", Some("bob@x.com"), None)
                .with_user("no-email", None, Some("Ghost")),
            locale: Locale::PtBr,
            files: vec![
                ("gastos.csv", EXPENSES_CSV),
                ("rendas.csv", INCOME_CSV),
                ("saldo_mes.csv", BALANCE_CSV),
                ("investimento.csv", INVESTMENTS_CSV),
            ],
            max_sessions: 100,
        }
    }

    pub fn allowed(mut self, emails: &[&str]) -> Self {
        self.allowed = emails.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn without_file(mut self, file: &str) -> Self {
        self.files.retain(|(name, _)| *name != file);
        self
    }

    pub fn build(self) -> TestApp {
        let data_dir = TempDir::new().unwrap();
        for (name, contents) in &self.files {
            std::fs::write(data_dir.path().join(name), contents).unwrap();
        }

        let data = DataSettings::default();
        let datasets = Datasets::load(&data, data_dir.path()).unwrap();
        let dashboard = Dashboard::build(&datasets, &data, self.locale);

        let access = AccessPolicy {
            allow_list: AllowList::new(&self.allowed),
            login_provider: PROVIDER.to_string(),
            locale: self.locale,
        };
        let providers = ProviderRegistry::new().register(Arc::new(self.provider));
        let metrics = PrometheusBuilder::new().build_recorder().handle();

        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            session_expiry_hours: 1,
            max_sessions: self.max_sessions,
            secure_cookies: false,
            static_dir: "static".to_string(),
        };

        let state = AppState::new(access, providers, dashboard, metrics);
        let sessions = BoundedMemoryStore::new(self.max_sessions);
        let router = build_router(state, &server, data_dir.path(), sessions.clone());

        TestApp {
            router,
            sessions,
            _data_dir: data_dir,
        }
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Visits the dashboard anonymously and returns the session cookie and the
    /// OAuth `state` the dashboard sent to the provider.
    pub async fn start_login(&self) -> (String, String) {
        let response = self.get("/", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let cookie = session_cookie(&response).expect("login should start a session");
        let state = query_param(location(&response), "state").expect("state in redirect");
        (cookie, state)
    }

    /// Runs the whole login handshake for `code` and returns the cookie of the
    /// authenticated session.
    pub async fn login(&self, code: &str) -> String {
        let (cookie, state) = self.start_login().await;
        let response = self
            .get(
                &format!("/auth/{}/callback?code={}&state={}", PROVIDER, code, state),
                Some(&cookie),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        session_cookie(&response).unwrap_or(cookie)
    }
}

/// `name=value` of the session cookie set on this response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("id="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    let url = reqwest::Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
