use crate::cli::ServeArgs;
use crate::infra::{in_memory_workflow, seeded_directory, AppState};
use crate::routes::with_recruitment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_recruit::config::AppConfig;
use campus_recruit::error::AppError;
use campus_recruit::telemetry;
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

    let registry = config.recruitment.registry();
    let stage_count = registry.len();
    let directory = seeded_directory(args.seed_candidates)?;
    let workflow = in_memory_workflow(registry, directory);

    let app = with_recruitment_routes(workflow)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        stage_count,
        seeded_candidates = args.seed_candidates,
        "recruitment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
