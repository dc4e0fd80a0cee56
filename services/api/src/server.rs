use crate::cli::ServeArgs;
use crate::infra::{
    dev_token, AppState, ConfiguredGenerator, InMemoryFileStorage, InMemoryOnboardingRepository,
    StaticIdentityProvider,
};
use crate::routes::with_onboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use maverick_mindset::config::{AppConfig, AppEnvironment, GenerationConfig};
use maverick_mindset::error::AppError;
use maverick_mindset::onboarding::{
    ChatCompletionsClient, GenerationError, OnboardingService, Principal, RosterImporter,
    TraineeFilter,
};
use maverick_mindset::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryOnboardingRepository::default());
    let generator = Arc::new(build_generator(&config.generation).await?);
    let generation_enabled = generator.is_enabled();
    let storage = Arc::new(InMemoryFileStorage::default());
    let service = Arc::new(OnboardingService::new(repository, generator, storage));

    if let Some(path) = args.roster.take() {
        let trainees = RosterImporter::from_path(&path)?;
        let added = service.import_roster(&system_principal(), trainees)?;
        info!(roster = %path.display(), added, "roster loaded");
    }

    let identity = Arc::new(StaticIdentityProvider::default());
    if let Some(token) = config.auth.admin_token.clone() {
        identity.insert(token, system_principal());
    }
    if config.environment == AppEnvironment::Development {
        let roster = service.list_trainees(&system_principal(), &TraineeFilter::default(), None)?;
        for trainee in roster {
            identity.insert(
                dev_token(&trainee.id),
                Principal::trainee(trainee.id.0.clone(), trainee.email),
            );
        }
        warn!(sessions = identity.len(), "development trainee tokens issued");
    }
    if identity.is_empty() {
        warn!("no bearer tokens configured; every API request will be rejected");
    }

    let app = with_onboarding_routes(service, identity)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        generation = generation_enabled,
        "maverick mindset api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn system_principal() -> Principal {
    Principal::admin("admin", "admin@maverick.local")
}

/// The blocking HTTP client owns a runtime of its own, so it is built off the async workers.
async fn build_generator(config: &GenerationConfig) -> Result<ConfiguredGenerator, AppError> {
    let Some(client_config) = config.client_config() else {
        warn!("MINDSET_AI_API_KEY not set; content generation disabled");
        return Ok(ConfiguredGenerator::Disabled);
    };

    let client = tokio::task::spawn_blocking(move || ChatCompletionsClient::new(client_config))
        .await
        .map_err(|err| GenerationError::Transport(err.to_string()))??;
    info!(model = client.model(), "content generation enabled");
    Ok(ConfiguredGenerator::Remote(client))
}
