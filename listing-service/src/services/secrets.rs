use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsClient;
use secrecy::SecretString;
use service_core::error::AppError;

/// JSON keys searched, in order, when a secret holds an object.
const API_KEY_FIELDS: [&str; 3] = ["OPENAI_API_KEY", "openai_api_key", "api_key"];

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<SecretString, AppError>;
}

pub struct SecretsManagerStore {
    client: SecretsClient,
}

impl SecretsManagerStore {
    pub fn new(client: SecretsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, AppError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Failed to read secret '{}': {}",
                    name,
                    aws_sdk_secretsmanager::error::DisplayErrorContext(&e)
                ))
            })?;

        output
            .secret_string()
            .map(|value| SecretString::new(value.to_string()))
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("Secret '{}' has no string value", name))
            })
    }
}

/// Pull an API key out of a secret that is either the raw key or a JSON object.
pub fn extract_api_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => API_KEY_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(|v| v.as_str()))
            .filter(|key| !key.is_empty())
            .map(str::to_string),
        _ => Some(trimmed.to_string()),
    }
}

/// Read the provider key once at startup.
pub async fn fetch_api_key(store: &dyn SecretStore, name: &str) -> Result<SecretString, AppError> {
    use secrecy::ExposeSecret;

    let secret = store.get_secret(name).await?;
    extract_api_key(secret.expose_secret())
        .map(SecretString::new)
        .ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("Secret '{}' does not contain an API key", name))
        })
}
