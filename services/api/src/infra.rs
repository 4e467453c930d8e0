use metrics_exporter_prometheus::PrometheusHandle;
use smart_property::auth::{AuthProvider, SupabaseAuth, UnconfiguredAuth};
use smart_property::config::AppConfig;
use smart_property::error::AppError;
use smart_property::insights::{GeminiInsights, InsightGenerator, UnconfiguredInsights};
use smart_property::listings::{FallbackStore, ListingService, ListingStore, SupabaseStore};
use smart_property::supabase::SupabaseClient;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Pick the store, auth provider, and insight generator once from configuration.
pub(crate) fn build_service(config: &AppConfig) -> Result<ListingService, AppError> {
    let (store, auth): (Arc<dyn ListingStore>, Arc<dyn AuthProvider>) = match &config.backend {
        Some(backend) => {
            let client = SupabaseClient::new(backend, config.http_timeout)?;
            info!(url = %client.base_url(), "using hosted listing backend");
            (
                Arc::new(SupabaseStore::new(client.clone())),
                Arc::new(SupabaseAuth::new(client)),
            )
        }
        None => {
            warn!("SUPABASE_URL or SUPABASE_ANON_KEY missing; serving the static catalog");
            (
                Arc::new(FallbackStore::with_catalog(config.fallback.latency)),
                Arc::new(UnconfiguredAuth::default()),
            )
        }
    };

    let insights: Arc<dyn InsightGenerator> = match &config.insights {
        Some(settings) => Arc::new(GeminiInsights::new(settings, config.http_timeout)?),
        None => {
            warn!("GEMINI_API_KEY missing; property insights disabled");
            Arc::new(UnconfiguredInsights)
        }
    };

    Ok(ListingService::new(store, auth, insights))
}

/// `1250000` -> `1,250,000`.
pub(crate) fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_property::config::{AppEnvironment, FallbackConfig, ServerConfig, TelemetryConfig};
    use smart_property::listings::StoreMode;
    use std::time::Duration;

    fn offline_config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            backend: None,
            insights: None,
            fallback: FallbackConfig {
                latency: Duration::ZERO,
            },
            http_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn missing_backend_selects_fallback_store() {
        let service = build_service(&offline_config()).expect("service builds");
        assert_eq!(service.mode(), StoreMode::Fallback);
        assert!(!service.auth().is_configured());
    }

    #[test]
    fn backend_credentials_select_hosted_store() {
        let mut config = offline_config();
        config.backend = Some(
            smart_property::config::BackendConfig::new(
                "https://demo.supabase.co",
                "anon".to_string(),
            )
            .expect("valid url"),
        );
        let service = build_service(&config).expect("service builds");
        assert_eq!(service.mode(), StoreMode::Backend);
        assert!(service.auth().is_configured());
    }

    #[test]
    fn prices_group_thousands() {
        assert_eq!(format_price(0), "0");
        assert_eq!(format_price(999), "999");
        assert_eq!(format_price(320_000), "320,000");
        assert_eq!(format_price(1_250_000), "1,250,000");
    }
}
