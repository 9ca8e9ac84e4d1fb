use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Dispatch
    /// Run high-resource-language jobs in-process when the broker is
    /// down instead of failing them. Read once at startup; never
    /// inferred from the environment at dispatch time.
    pub allow_degraded_routing: bool,
    pub broker_ping_timeout_ms: u64,
    // Admission
    pub max_chars_per_request: usize,
    pub high_cost_language_multiplier: f64,
    pub enable_voice_cloning: bool,
    // Synthesis engines
    pub synthesis_engine: SynthesisEngine,
    pub parler_endpoint: String,
    pub aws_region: String,
    // Audio storage
    pub storage_path: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which synthesizer variants back the execution adapter boundary.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisEngine {
    /// Real engines: Polly for standard languages, the remote Parler
    /// server for the high-resource class.
    Live,
    /// Deterministic always-succeeding double for both classes.
    Mock,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379/0".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            allow_degraded_routing: parse_bool("ALLOW_DEGRADED_ROUTING", false),
            broker_ping_timeout_ms: env::var("BROKER_PING_TIMEOUT_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            max_chars_per_request: env::var("MAX_CHARS_PER_REQUEST")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            high_cost_language_multiplier: env::var("HIGH_COST_LANGUAGE_MULTIPLIER")
                .unwrap_or_else(|_| "2.0".to_string())
                .parse()?,
            enable_voice_cloning: parse_bool("ENABLE_VOICE_CLONING", false),
            synthesis_engine: env::var("SYNTHESIS_ENGINE")
                .unwrap_or_else(|_| "mock".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "live" => SynthesisEngine::Live,
                    _ => SynthesisEngine::Mock,
                })?,
            parler_endpoint: env::var("PARLER_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9090".to_string()),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "ap-south-1".to_string()),
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|s| s.to_lowercase() == "true")
        .unwrap_or(default)
}
