pub mod config;
pub mod gate;
pub mod handlers;
pub mod locale;
pub mod models;
pub mod services;
pub mod session_store;
pub mod startup;

use gate::AccessPolicy;
use metrics_exporter_prometheus::PrometheusHandle;
use services::{dashboard::Dashboard, identity_provider::ProviderRegistry};
use std::sync::Arc;

/// Shared application state. Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub access: Arc<AccessPolicy>,
    pub providers: ProviderRegistry,
    pub dashboard: Arc<Dashboard>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        access: AccessPolicy,
        providers: ProviderRegistry,
        dashboard: Dashboard,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            access: Arc::new(access),
            providers,
            dashboard: Arc::new(dashboard),
            metrics,
        }
    }
}
