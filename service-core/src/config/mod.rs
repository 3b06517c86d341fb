use crate::error::AppError;
use config::{Config as Cfg, Environment as EnvSource, File};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// Deployment environment, selected with `APP_ENVIRONMENT` (defaults to `dev`).
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    pub fn current() -> Result<Self, AppError> {
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "local" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!(
                "{} is not a supported environment. Use either `dev` or `prod`.",
                other
            )),
        }
    }
}

/// Layered settings loader.
///
/// Reads `base.yaml` from `config_dir`, then the optional `<environment>.yaml`
/// next to it, then `APP_`-prefixed environment variables (`__` separates
/// nested keys, e.g. `APP_SERVER__PORT`). Keys named in `list_keys` are split
/// on commas so list settings can be supplied through a single variable.
pub fn load_layered<T: DeserializeOwned>(
    config_dir: &Path,
    list_keys: &[&str],
) -> Result<T, AppError> {
    let environment = Environment::current()?;

    let mut env_source = EnvSource::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);

    if !list_keys.is_empty() {
        env_source = env_source.list_separator(",");
        for key in list_keys {
            env_source = env_source.with_list_parse_key(key);
        }
    }

    let settings = Cfg::builder()
        .add_source(File::from(config_dir.join("base.yaml")).required(true))
        .add_source(
            File::from(config_dir.join(format!("{}.yaml", environment.as_str())))
                .required(false),
        )
        .add_source(env_source)
        .build()?;

    Ok(settings.try_deserialize()?)
}
