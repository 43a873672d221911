use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.eloverblik.dk/customerapi".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Rows per bulk INSERT; one calendar year of hourly data is split
    /// into batches of this size to stay under SQLite's bind limit.
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/eldata.db"),
            batch_size: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Single-line text file holding the long-lived refresh token.
    pub token_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.txt"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from the TOML file named by `ELDATA_CONFIG`
    /// (default `eldata-config.toml`). A missing file is not an error;
    /// every field has a default.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("ELDATA_CONFIG").unwrap_or_else(|_| "eldata-config.toml".to_string());
        if !std::path::Path::new(&path).exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_customer_api() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api.base_url, "https://api.eloverblik.dk/customerapi");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.auth.token_path, PathBuf::from("token.txt"));
        assert!(cfg.store.batch_size > 0);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [store]
            path = "/tmp/other.db"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(cfg.store.batch_size, 500);
        assert_eq!(cfg.api.base_url, "https://api.eloverblik.dk/customerapi");
    }
}
