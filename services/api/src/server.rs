use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_lookup_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use prize_lookup::config::AppConfig;
use prize_lookup::error::AppError;
use prize_lookup::telemetry;
use prize_lookup::workflows::lookup::LookupService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let lookup_service = LookupService::simulated(&config.lookup)?;

    let app = with_lookup_routes(lookup_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        latency_ms = config.lookup.latency.as_millis() as u64,
        "prize lookup service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
