use crate::locale::Locale;
use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use std::path::{Path, PathBuf};

/// Settings keys that may be given as comma separated lists in the environment,
/// e.g. `APP_ACCESS__ALLOWED_EMAILS=a@x.com,b@x.com`.
const LIST_KEYS: &[&str] = &["access.allowed_emails"];

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    pub access: AccessSettings,
    pub identity_provider: IdentityProviderSettings,
    #[serde(default)]
    pub data: DataSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions expire after this many hours without a request.
    #[serde(default = "default_session_expiry_hours")]
    pub session_expiry_hours: i64,
    /// Upper bound on live sessions kept in memory.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_session_expiry_hours() -> i64 {
    24
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_static_dir() -> String {
    "static".to_string()
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g. http://tempo:4317). Export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Clone)]
pub struct AccessSettings {
    /// Email addresses allowed to see the dashboard. Matched exactly.
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    /// Identity provider used when an anonymous visitor hits the dashboard.
    #[serde(default = "default_login_provider")]
    pub login_provider: String,
    #[serde(default)]
    pub locale: Locale,
}

fn default_login_provider() -> String {
    "google".to_string()
}

#[derive(Deserialize, Clone)]
pub struct IdentityProviderSettings {
    #[serde(default = "default_login_provider")]
    pub name: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Callback URL registered with the provider, normally
    /// `<public base>/auth/<name>/callback`.
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

fn default_authorize_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

fn default_scopes() -> String {
    "openid email profile".to_string()
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding the CSV tables. Relative paths resolve against the
    /// service root.
    pub directory: PathBuf,
    pub expenses_file: String,
    pub income_file: String,
    pub balance_file: String,
    pub investments_file: String,
    /// Amount invested before the first tracked month.
    pub initial_investment: f64,
    /// Target share of monthly spending per expense column, in percent.
    pub ideal_expense_shares: Vec<IdealShare>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct IdealShare {
    pub category: String,
    pub percent: f64,
}

impl IdealShare {
    fn new(category: &str, percent: f64) -> Self {
        Self {
            category: category.to_string(),
            percent,
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            expenses_file: "gastos.csv".to_string(),
            income_file: "rendas.csv".to_string(),
            balance_file: "saldo_mes.csv".to_string(),
            investments_file: "investimento.csv".to_string(),
            initial_investment: 2710.74,
            ideal_expense_shares: vec![
                IdealShare::new("Alimentação %", 13.33),
                IdealShare::new("Aplicação %", 15.0),
                IdealShare::new("Conta fixa %", 45.0),
                IdealShare::new("Doação %", 10.0),
                IdealShare::new("Empréstimo saída %", 0.0),
                IdealShare::new("Extras %", 5.0),
                IdealShare::new("Passeios %", 5.0),
                IdealShare::new("Transporte %", 4.0),
            ],
        }
    }
}

impl DataSettings {
    pub fn resolve_directory(&self) -> Result<PathBuf, AppError> {
        resolve_path(&self.directory)
    }
}

impl ServerSettings {
    pub fn resolve_static_dir(&self) -> Result<PathBuf, AppError> {
        resolve_path(Path::new(&self.static_dir))
    }
}

/// Absolute paths are kept, relative ones are anchored at [`service_root`].
pub fn resolve_path(path: &Path) -> Result<PathBuf, AppError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(service_root()?.join(path))
    }
}

/// Directory that holds `config/`, `data/` and `static/`. Works both when
/// started from the workspace root and from inside the crate.
pub fn service_root() -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Failed to determine the current directory: {}",
            e
        ))
    })?;

    if base_path.ends_with("finance-dashboard") {
        Ok(base_path)
    } else {
        Ok(base_path.join("finance-dashboard"))
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let configuration_directory = service_root()?.join("config");
    service_core::config::load_layered(&configuration_directory, LIST_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AccessPolicy;

    const BASE: &str = "\
server:
  host: \"127.0.0.1\"
  port: 8080
access:
  allowed_emails: [\"base@x.com\"]
identity_provider:
  client_id: \"id\"
  client_secret: \"secret\"
  redirect_uri: \"http://localhost:8080/auth/google/callback\"
";

    fn load(dir: &Path) -> Settings {
        service_core::config::load_layered(dir, LIST_KEYS).unwrap()
    }

    #[test]
    fn allow_list_comes_from_a_single_variable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("base.yaml"), BASE).unwrap();

        let settings = load(dir.path());
        assert_eq!(settings.access.allowed_emails, vec!["base@x.com"]);
        assert_eq!(settings.server.max_sessions, 10_000);
        assert_eq!(settings.data.expenses_file, "gastos.csv");

        std::env::set_var("APP_ACCESS__ALLOWED_EMAILS", "a@x.com, b@x.com");
        let policy = AccessPolicy::from_settings(&load(dir.path()).access);
        assert_eq!(policy.allow_list.len(), 2);
        assert!(policy.allow_list.contains("b@x.com"));
        assert!(!policy.allow_list.contains("base@x.com"));

        std::env::set_var("APP_ACCESS__ALLOWED_EMAILS", "");
        let policy = AccessPolicy::from_settings(&load(dir.path()).access);
        assert!(policy.allow_list.is_empty());

        std::env::remove_var("APP_ACCESS__ALLOWED_EMAILS");
    }
}
