use crate::cli::ServeArgs;
use crate::infra::{
    load_jobs, load_users, AppState, InMemoryApplicationRegistry, InMemoryJobCatalog,
    InMemoryUserDirectory, LoggingNotifier,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hiretrack::applications::{FsArtifactStore, JobApplicationService};
use hiretrack::config::AppConfig;
use hiretrack::error::AppError;
use hiretrack::telemetry;
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
    if let Some(upload_dir) = args.upload_dir.take() {
        config.storage.upload_dir = upload_dir;
    }
    if let Some(jobs_seed) = args.jobs_seed.take() {
        config.storage.jobs_seed = Some(jobs_seed);
    }
    if let Some(users_seed) = args.users_seed.take() {
        config.storage.users_seed = Some(users_seed);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let users = load_users(config.storage.users_seed.as_deref())?;
    let jobs = load_jobs(config.storage.jobs_seed.as_deref())?;
    info!(
        users = users.len(),
        jobs = jobs.len(),
        "directory and catalog seeded"
    );

    let service = Arc::new(JobApplicationService::new(
        Arc::new(InMemoryApplicationRegistry::default()),
        Arc::new(InMemoryUserDirectory::new(users)),
        Arc::new(InMemoryJobCatalog::new(jobs)),
        Arc::new(FsArtifactStore::new(config.storage.upload_dir.clone())),
        Arc::new(LoggingNotifier),
    ));

    let app = with_application_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "applicant tracking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
