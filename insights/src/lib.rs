pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod errors;
pub mod metrics_defs;
pub mod openapi;
pub mod service;
pub mod topic;
pub mod upstream;

#[cfg(test)]
mod testutils;

use credentials::Credentials;
use dispatcher::Dispatcher;
use errors::InsightsError;
use service::InsightsService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use upstream::GongClient;

/// Runs the insights listener and the admin listener until either fails.
pub async fn run(config: config::Config, credentials: Credentials) -> Result<(), InsightsError> {
    let client = GongClient::new(&config.upstream, credentials)?;
    let dispatcher = Dispatcher::new(client, config.list_defaults.clone());
    let descriptor = openapi::descriptor(&config.server_url());
    let insights_service = InsightsService::new(dispatcher, &descriptor);

    tracing::info!(
        upstream = %config.upstream.base_url,
        timeout_secs = config.upstream.timeout_secs,
        "starting insights service"
    );

    let insights_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        insights_service,
    );
    // Credentials are loaded before we get here, so the service is ready as soon as it listens.
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, InsightsError>::new(|| true),
    );

    tokio::try_join!(insights_task, admin_task)?;
    Ok(())
}
