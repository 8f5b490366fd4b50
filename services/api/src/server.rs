use crate::cli::ServeArgs;
use crate::infra::{build_policy, seed_bootstrap_admin, AppState, LogNotifier};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hydra::config::AppConfig;
use hydra::error::AppError;
use hydra::pipeline::{pipeline_router, InMemoryPipelineRepository, RecruitmentPipeline};
use hydra::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let policy = Arc::new(build_policy(&config.pipeline)?);
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        catalog: Arc::new(policy.catalog.clone()),
    };

    let repository = Arc::new(InMemoryPipelineRepository::new());
    if let Err(err) = seed_bootstrap_admin(repository.as_ref()) {
        warn!(error = %err, "bootstrap administrador not created");
    }
    let notifier = Arc::new(LogNotifier::default());
    let pipeline = Arc::new(RecruitmentPipeline::new(policy, repository, notifier));

    let app = with_operational_routes(pipeline_router(pipeline))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        token_ttl_days = config.pipeline.token_ttl_days,
        "recruitment pipeline ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
