use secrecy::SecretString;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: i32 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub common: core_config::Config,
    pub inventory: InventoryConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub description: DescriptionConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Unset values are reported per request as a 500, not at startup.
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub stock_match: StockMatch,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: i32,
    pub request_timeout_secs: u64,
    pub openai_base_url: String,
    /// Direct key; when absent the key is read from the secret store at startup.
    pub openai_api_key: Option<SecretString>,
    pub openai_secret_name: String,
}

#[derive(Debug, Clone)]
pub struct DescriptionConfig {
    pub append_disclaimer: bool,
}

/// How the requested stock number is compared with the inventory column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockMatch {
    #[default]
    Exact,
    CaseInsensitive,
}

impl StockMatch {
    pub fn matches(self, candidate: &str, requested: &str) -> bool {
        match self {
            StockMatch::Exact => candidate == requested,
            StockMatch::CaseInsensitive => candidate.to_uppercase() == requested.to_uppercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Bedrock,
    OpenAi,
    Mock,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Bedrock => "anthropic.claude-3-5-haiku-20241022-v1:0",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Mock => "mock-copywriter",
        }
    }
}

impl FromStr for StockMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" | "case_sensitive" => Ok(StockMatch::Exact),
            "case_insensitive" | "insensitive" => Ok(StockMatch::CaseInsensitive),
            _ => Err(format!("Invalid stock match mode: {}", s)),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bedrock" => Ok(ProviderKind::Bedrock),
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            _ => Err(format!("Invalid LLM provider: {}", s)),
        }
    }
}

impl ListingConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let provider: ProviderKind = parse_env("LLM_PROVIDER", Some("bedrock"), is_prod)?;

        Ok(ListingConfig {
            common: common_config,
            inventory: InventoryConfig {
                bucket: optional_env("BUCKET_NAME"),
                key: optional_env("CSV_KEY"),
                stock_match: parse_env("STOCK_MATCH", Some("exact"), is_prod)?,
            },
            storage: StorageConfig {
                backend: parse_env("STORAGE_BACKEND", Some("s3"), is_prod)?,
                local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), is_prod)?,
            },
            llm: LlmConfig {
                provider,
                model_id: env::var("LLM_MODEL_ID")
                    .unwrap_or_else(|_| provider.default_model().to_string()),
                temperature: env::var("LLM_TEMPERATURE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_TEMPERATURE),
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_TOKENS),
                request_timeout_secs: env::var("LLM_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                openai_base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                openai_api_key: env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.is_empty())
                    .map(SecretString::new),
                openai_secret_name: env::var("OPENAI_SECRET_NAME")
                    .unwrap_or_else(|_| "openai/api-key".to_string()),
            },
            description: DescriptionConfig {
                append_disclaimer: env::var("APPEND_DISCLAIMER")
                    .map(|v| is_truthy(&v))
                    .unwrap_or(false),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

/// Accepts the usual spellings of an enabled flag.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    get_env(key, default, is_prod)?
        .parse()
        .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
