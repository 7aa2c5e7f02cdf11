use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_ssm::Client as SsmClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Prefix of every environment variable the service reads
pub const ENV_PREFIX: &str = "FOODGRAM";

/// SSM parameter that overrides `DatabaseConfig::media_cdn_url`
pub const MEDIA_CDN_URL_PARAMETER: &str = "/foodgram/media-cdn-url";

const PARAMETER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },

    #[error("AWS SDK error: {source}")]
    AwsSdk {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub aws: AwsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_recipes_table")]
    pub recipes_table_name: String,
    #[serde(default = "default_ingredients_table")]
    pub ingredients_table_name: String,
    #[serde(default = "default_tags_table")]
    pub tags_table_name: String,
    #[serde(default = "default_users_table")]
    pub users_table_name: String,
    #[serde(default = "default_user_lists_table")]
    pub user_lists_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Base URL recipe image paths are resolved against
    #[serde(default)]
    pub media_cdn_url: String,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    pub dynamodb_client: DynamoDbClient,
    pub ssm_client: SsmClient,
    pub parameter_store: Arc<ParameterStoreConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    /// Empty means the collector on localhost
    #[serde(default)]
    pub otlp_endpoint: String,
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

/// SSM Parameter Store reader with a per-name TTL cache
pub struct ParameterStoreConfig {
    ssm_client: SsmClient,
    cache: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for ParameterStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStoreConfig")
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

/// Deserialize one config section from `FOODGRAM_*` variables.
/// `overrides` replaces the process environment, which keeps tests hermetic.
fn load_section<T: DeserializeOwned>(
    section: &str,
    overrides: Option<HashMap<String, String>>,
) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(overrides),
        )
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

impl Config {
    pub async fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");

        let server = ServerConfig::from_env()?;
        let mut database = DatabaseConfig::from_env()?;
        let observability = ObservabilityConfig::from_env()?;

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(database.region.clone()))
            .load()
            .await;

        let dynamodb_client = DynamoDbClient::new(&aws_config);
        let ssm_client = SsmClient::new(&aws_config);
        let parameter_store = Arc::new(ParameterStoreConfig::new(
            ssm_client.clone(),
            PARAMETER_CACHE_TTL,
        ));

        database.media_cdn_url = parameter_store
            .get_parameter_with_default(MEDIA_CDN_URL_PARAMETER, &database.media_cdn_url)
            .await;

        let config = Config {
            server,
            database,
            aws: AwsConfig {
                region: aws_config
                    .region()
                    .map(|region| region.to_string())
                    .unwrap_or_else(default_region),
                dynamodb_client,
                ssm_client,
                parameter_store,
            },
            observability,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        load_section("server", None)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "Request timeout cannot be 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_timeout(),
            max_request_size: default_max_request_size(),
        }
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        load_section("database", None)
    }

    fn table_names(&self) -> [(&'static str, &str); 5] {
        [
            ("Recipes", &self.recipes_table_name),
            ("Ingredients", &self.ingredients_table_name),
            ("Tags", &self.tags_table_name),
            ("Users", &self.users_table_name),
            ("User lists", &self.user_lists_table_name),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, name) in self.table_names() {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("{} table name cannot be empty", label),
                });
            }
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            recipes_table_name: default_recipes_table(),
            ingredients_table_name: default_ingredients_table(),
            tags_table_name: default_tags_table(),
            users_table_name: default_users_table(),
            user_lists_table_name: default_user_lists_table(),
            region: default_region(),
            media_cdn_url: String::new(),
        }
    }
}

impl ObservabilityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        load_section("observability", None)
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            service_version: default_service_version(),
            otlp_endpoint: String::new(),
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            enable_json_logging: false,
        }
    }
}

impl ParameterStoreConfig {
    pub fn new(ssm_client: SsmClient, cache_ttl: Duration) -> Self {
        Self {
            ssm_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
        }
    }

    async fn cached(&self, name: &str) -> Option<String> {
        let cache = self.cache.read().await;
        cache
            .get(name)
            .filter(|(_, fetched_at)| fetched_at.elapsed() < self.cache_ttl)
            .map(|(value, _)| value.clone())
    }

    pub async fn get_parameter(&self, name: &str) -> Result<String, ConfigError> {
        if let Some(value) = self.cached(name).await {
            debug!("Parameter served from cache: {}", name);
            return Ok(value);
        }

        debug!("Fetching parameter from AWS SSM: {}", name);
        let output = self
            .ssm_client
            .get_parameter()
            .name(name)
            .with_decryption(false)
            .send()
            .await
            .map_err(|e| ConfigError::AwsSdk {
                source: Box::new(e),
            })?;

        let value = output
            .parameter()
            .and_then(|parameter| parameter.value())
            .ok_or_else(|| ConfigError::ParameterNotFound {
                name: name.to_string(),
            })?
            .to_string();

        self.cache
            .write()
            .await
            .insert(name.to_string(), (value.clone(), Instant::now()));

        Ok(value)
    }

    /// Parameter value, or `default` when it is missing or SSM is unreachable
    pub async fn get_parameter_with_default(&self, name: &str, default: &str) -> String {
        match self.get_parameter(name).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Using default for parameter {}: {}", name, e);
                default.to_string()
            }
        }
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        info!("Parameter store cache cleared");
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024
}

pub(crate) fn default_recipes_table() -> String {
    "FoodgramRecipes".to_string()
}

pub(crate) fn default_ingredients_table() -> String {
    "FoodgramIngredients".to_string()
}

pub(crate) fn default_tags_table() -> String {
    "FoodgramTags".to_string()
}

pub(crate) fn default_users_table() -> String {
    "FoodgramUsers".to_string()
}

pub(crate) fn default_user_lists_table() -> String {
    "FoodgramUserLists".to_string()
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_service_name() -> String {
    "foodgram-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_metrics_port() -> u16 {
    9090
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
