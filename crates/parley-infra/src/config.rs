//! Client configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed, and per field when an endpoint URL or a
//! timeout is unusable.

use std::path::Path;

use parley_types::config::ClientConfig;

use crate::filesystem::config_path;

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config
///   with unusable endpoints and zero timeouts reset to their defaults.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config_path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => validate_client_config(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Reset fields the client cannot work with to their defaults.
///
/// Endpoints must be absolute `http`/`https` URLs; timeouts must be non-zero.
pub fn validate_client_config(mut config: ClientConfig) -> ClientConfig {
    let defaults = ClientConfig::default();

    if let Err(reason) = check_endpoint(&config.completion_url) {
        tracing::warn!(
            url = %config.completion_url,
            %reason,
            "Invalid completion_url, using {}",
            defaults.completion_url
        );
        config.completion_url = defaults.completion_url;
    }
    if let Err(reason) = check_endpoint(&config.balance_url) {
        tracing::warn!(
            url = %config.balance_url,
            %reason,
            "Invalid balance_url, using {}",
            defaults.balance_url
        );
        config.balance_url = defaults.balance_url;
    }
    if config.request_timeout_ms == 0 {
        tracing::warn!("request_timeout_ms must be positive, using {}", defaults.request_timeout_ms);
        config.request_timeout_ms = defaults.request_timeout_ms;
    }
    if config.balance_timeout_ms == 0 {
        tracing::warn!("balance_timeout_ms must be positive, using {}", defaults.balance_timeout_ms);
        config.balance_timeout_ms = defaults.balance_timeout_ms;
    }

    config
}

fn check_endpoint(raw: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme `{other}`")),
    }
}
