use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaak_backend::controllers::tts::TtsController;
use vaak_backend::dispatch::{Dispatcher, JobExecutor};
use vaak_backend::domain::job::{AdmissionPolicy, JobService};
use vaak_backend::domain::quota::QuotaLedger;
use vaak_backend::infrastructure::config::{Config, LogFormat, SynthesisEngine};
use vaak_backend::infrastructure::db::{check_connection, create_pool};
use vaak_backend::infrastructure::http::start_http_server;
use vaak_backend::infrastructure::queue::{JobQueue, RedisJobQueue};
use vaak_backend::infrastructure::repositories::{
    AccountRepository, JobRepository, PgAccountRepository, PgJobRepository, PgUsageRepository,
    UsageRepository,
};
use vaak_backend::infrastructure::storage::{BlobStore, LocalBlobStore};
use vaak_backend::infrastructure::synthesis::{
    MockSynthesizer, ParlerSynthesizer, PollySynthesizer, Synthesizer, SynthesizerRegistry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Vaak Backend on {}:{}", config.host, config.port);

    // Create database connection pool
    let pool = create_pool(&config.database_url, 10).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    // Broker client; routing survives a down broker, so startup does not
    // wait on a successful ping
    let queue: Arc<dyn JobQueue> = Arc::new(RedisJobQueue::new(&config.redis_url)?);
    if queue.ping(Duration::from_millis(config.broker_ping_timeout_ms)).await {
        tracing::info!("Broker connection verified");
    } else {
        tracing::warn!("Broker unreachable at startup; high-resource jobs will be rejected or degraded");
    }

    // Synthesis engines by language class
    let registry = match config.synthesis_engine {
        SynthesisEngine::Mock => {
            tracing::info!("Using mock synthesizers for both language classes");
            Arc::new(SynthesizerRegistry::new(
                Arc::new(MockSynthesizer),
                Arc::new(MockSynthesizer),
            ))
        }
        SynthesisEngine::Live => {
            tracing::info!(
                region = %config.aws_region,
                parler_endpoint = %config.parler_endpoint,
                "Initializing live synthesizers"
            );

            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));

            let standard: Arc<dyn Synthesizer> = Arc::new(PollySynthesizer::new(polly_client));
            let high_resource: Arc<dyn Synthesizer> =
                Arc::new(ParlerSynthesizer::new(config.parler_endpoint.clone()));
            Arc::new(SynthesizerRegistry::new(standard, high_resource))
        }
    };

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool)
    let job_repo: Arc<dyn JobRepository> = Arc::new(PgJobRepository::new(pool.clone()));
    let account_repo: Arc<dyn AccountRepository> = Arc::new(PgAccountRepository::new(pool.clone()));
    let usage_repo: Arc<dyn UsageRepository> = Arc::new(PgUsageRepository::new(pool.clone()));

    // 2. Audio storage
    let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        config.storage_path.clone(),
        config.public_base_url.clone(),
    ));

    // 3. Instantiate services (inject repositories and clients)
    let ledger = Arc::new(QuotaLedger::new(account_repo.clone()));
    let executor = Arc::new(JobExecutor::new(
        job_repo.clone(),
        registry,
        blob_store,
        ledger.clone(),
    ));

    if config.allow_degraded_routing && !config.is_development() {
        tracing::warn!(
            "Degraded routing is enabled in production: high-resource jobs may run in-process when the broker is down"
        );
    }

    let dispatcher = Arc::new(Dispatcher::new(
        queue.clone(),
        job_repo.clone(),
        executor,
        config.allow_degraded_routing,
        Duration::from_millis(config.broker_ping_timeout_ms),
    ));

    let job_service = Arc::new(JobService::new(
        job_repo,
        usage_repo.clone(),
        ledger.clone(),
        dispatcher,
        AdmissionPolicy {
            max_chars_per_request: config.max_chars_per_request,
            high_cost_language_multiplier: config.high_cost_language_multiplier,
            enable_voice_cloning: config.enable_voice_cloning,
        },
    ));

    // 4. Instantiate controllers (inject services)
    let tts_controller = Arc::new(TtsController::new(job_service, usage_repo, ledger));

    // Start HTTP server with all routes
    start_http_server(pool, config, queue, tts_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "vaak_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "vaak_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
