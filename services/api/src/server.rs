use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState};
use crate::routes::with_listing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use smart_property::auth::spawn_session_listener;
use smart_property::config::AppConfig;
use smart_property::error::AppError;
use smart_property::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

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

    let service = Arc::new(build_service(&config)?);
    let mode = service.mode();

    let (mut session, _listener) = spawn_session_listener(service.auth().subscribe(), service.store());
    tokio::spawn(async move {
        while let Some(snapshot) = session.changed().await {
            debug!(
                signed_in = snapshot.user.is_some(),
                favorites = snapshot.favorites.len(),
                "session state changed"
            );
        }
    });

    let app = with_listing_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, ?mode, %addr, "smart property service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
