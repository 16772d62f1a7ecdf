use hireflow::config::AppConfig;
use hireflow::error::AppError;
use hireflow::workflows::hiring::{
    ChatCompletionWriter, CheckoutGateway, HiringApi, HiringError, InMemoryHireRepository,
    InMemoryProfileRepository, OperatorKey, PaymentGateway, ProfileTextGenerator, TokenSigner,
    UnconfiguredGateway, UnconfiguredWriter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

pub(crate) type ServiceApi = HiringApi<InMemoryHireRepository, InMemoryProfileRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the hiring workflow against in-memory stores and the configured providers.
pub(crate) fn build_hiring_api(config: &AppConfig) -> Result<ServiceApi, AppError> {
    let hires = Arc::new(InMemoryHireRepository::default());
    let profiles = Arc::new(InMemoryProfileRepository::default());
    let signer = TokenSigner::new(&config.auth.token_secret, config.auth.token_ttl_hours);

    let gateway: Arc<dyn PaymentGateway> = match config.payments.secret_key.as_deref() {
        Some(key) => Arc::new(
            CheckoutGateway::new(&config.payments, key).map_err(HiringError::from)?,
        ),
        None => {
            warn!("PAYMENT_SECRET_KEY not set; checkout requests will fail");
            Arc::new(UnconfiguredGateway)
        }
    };

    let generator: Arc<dyn ProfileTextGenerator> =
        match config.text_generation.api_key.as_deref() {
            Some(key) => Arc::new(
                ChatCompletionWriter::new(&config.text_generation, key)
                    .map_err(HiringError::from)?,
            ),
            None => {
                warn!("TEXTGEN_API_KEY not set; profile copy generation will fail");
                Arc::new(UnconfiguredWriter)
            }
        };

    if config.auth.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set; operator routes are closed");
    }

    Ok(HiringApi::new(
        hires,
        profiles,
        Arc::new(signer),
        OperatorKey::new(config.auth.admin_token.clone()),
        gateway,
        generator,
    ))
}
