use dotenvy::dotenv;
use finance_dashboard::config::get_configuration;
use finance_dashboard::gate::AccessPolicy;
use finance_dashboard::services::dashboard::Dashboard;
use finance_dashboard::services::datasets::Datasets;
use finance_dashboard::services::identity_provider::{OAuthProvider, ProviderRegistry};
use finance_dashboard::session_store::BoundedMemoryStore;
use finance_dashboard::startup::build_router;
use finance_dashboard::AppState;
use service_core::middleware::metrics::install_prometheus_recorder;
use service_core::observability::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "finance-dashboard",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    );

    let metrics = install_prometheus_recorder()?;

    let access = AccessPolicy::from_settings(&configuration.access);
    if access.allow_list.is_empty() {
        tracing::warn!("Allow-list is empty; every signed-in user will be denied");
    }
    info!(allowed = access.allow_list.len(), "Loaded access policy");

    let data_dir = configuration
        .data
        .resolve_directory()
        .map_err(|e| anyhow::anyhow!("Invalid data directory: {}", e))?;
    let datasets = Datasets::load(&configuration.data, &data_dir).map_err(|e| {
        tracing::error!(error = %e, "Failed to load datasets");
        anyhow::anyhow!("Failed to load datasets: {}", e)
    })?;
    let dashboard = Dashboard::build(&datasets, &configuration.data, access.locale);
    info!(
        charts = dashboard.chart_count(),
        issues = dashboard.issues.len(),
        "Dashboard prepared"
    );

    let providers = ProviderRegistry::new().register(Arc::new(OAuthProvider::new(
        configuration.identity_provider.clone(),
    )));
    if !providers.contains(&access.login_provider) {
        tracing::warn!(
            provider = %access.login_provider,
            "Configured login provider is not registered; anonymous visitors will get 404"
        );
    }

    let static_dir = configuration
        .server
        .resolve_static_dir()
        .map_err(|e| anyhow::anyhow!("Invalid static directory: {}", e))?;

    let session_store = BoundedMemoryStore::new(configuration.server.max_sessions);
    tokio::spawn(
        session_store
            .clone()
            .continuously_delete_expired(Duration::from_secs(60)),
    );

    let state = AppState::new(access, providers, dashboard, metrics);
    let app = build_router(state, &configuration.server, &static_dir, session_store);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting finance-dashboard on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
