use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("api base URL is not configured for production")]
    MissingApiUrl,
    #[error("production deployment is pointing at a local development address: {0}")]
    LocalAddressInProduction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub solana: SolanaConfig,
    pub environment: Environment,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the bot backend, e.g. "https://bot.example.com".
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    pub rpc_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// Loads configuration from a TOML file layered with
    /// `WALLET_CONFIRM_*` environment variables, then validates it.
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::new(config_path, config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix("WALLET_CONFIRM"))
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Production must fail loudly instead of silently falling back to a
    /// local development backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.is_production() {
            if self.api.base_url.trim().is_empty() {
                return Err(ConfigError::MissingApiUrl);
            }
            if is_local_address(&self.api.base_url) {
                return Err(ConfigError::LocalAddressInProduction(
                    self.api.base_url.clone(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
            },
            solana: SolanaConfig {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            },
            environment: Environment::Development,
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// Whether a URL points at a local development host. Shared between
/// config validation and the Misconfigured classification in the client.
pub fn is_local_address(url: &str) -> bool {
    ["localhost", "127.0.0.1", "0.0.0.0", "[::1]"]
        .iter()
        .any(|marker| url.contains(marker))
}
