use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// How generated investments are cross-checked against the fund catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityMode {
    /// Return the model output as validated, without catalog checks.
    Off,
    /// Drop investments that reference unknown funds or asset classes.
    Filter,
    /// Fail the whole generation on the first unknown fund or asset class.
    Reject,
}

impl FromStr for FidelityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(FidelityMode::Off),
            "filter" => Ok(FidelityMode::Filter),
            "reject" => Ok(FidelityMode::Reject),
            other => anyhow::bail!("FIDELITY_MODE must be off, filter or reject (got '{}')", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub genai_api_key: String,
    pub genai_base_url: String,
    pub genai_model: String,
    pub generation_timeout_secs: u64,
    pub portfolio_count_hint: u8,
    pub fidelity_mode: FidelityMode,
    pub session_ttl_secs: u64,
    pub fund_catalog_path: Option<PathBuf>,
}

fn parse_or_default<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", name, raw)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            genai_api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("GEMINI_API_KEY or GOOGLE_API_KEY environment variable required")
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("GEMINI_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            genai_base_url: std::env::var("GENAI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string())
                .trim()
                .to_string(),
            genai_model: std::env::var("GENAI_MODEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            generation_timeout_secs: parse_or_default("GENERATION_TIMEOUT_SECS", 60)?,
            portfolio_count_hint: parse_or_default("PORTFOLIO_COUNT_HINT", 3)?,
            fidelity_mode: parse_or_default("FIDELITY_MODE", FidelityMode::Filter)?,
            session_ttl_secs: parse_or_default("SESSION_TTL_SECS", 3600)?,
            fund_catalog_path: std::env::var("FUND_CATALOG_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("GenAI Base URL: {}", config.genai_base_url);
        tracing::debug!("GenAI Model: {}", config.genai_model);
        tracing::debug!("Fidelity mode: {:?}", config.fidelity_mode);
        if let Some(ref path) = config.fund_catalog_path {
            tracing::info!("Fund catalog override configured: {}", path.display());
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Range checks shared by `from_env` and hand-built configs.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.genai_base_url)
            .map_err(|e| anyhow::anyhow!("GENAI_BASE_URL is not a valid URL: {}", e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("GENAI_BASE_URL must start with http:// or https://");
        }
        if self.generation_timeout_secs == 0 {
            anyhow::bail!("GENERATION_TIMEOUT_SECS must be greater than 0");
        }
        if !(1..=5).contains(&self.portfolio_count_hint) {
            anyhow::bail!("PORTFOLIO_COUNT_HINT must be between 1 and 5");
        }
        if self.session_ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            port: 3000,
            genai_api_key: "key".to_string(),
            genai_base_url: "https://generativelanguage.googleapis.com".to_string(),
            genai_model: "gemini-2.0-flash".to_string(),
            generation_timeout_secs: 60,
            portfolio_count_hint: 3,
            fidelity_mode: FidelityMode::Filter,
            session_ttl_secs: 3600,
            fund_catalog_path: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut cfg = config();
        cfg.genai_base_url = "ftp://models.example.com".to_string();
        assert!(cfg.validate().is_err());

        cfg.genai_base_url = "not a url".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut cfg = config();
        cfg.portfolio_count_hint = 6;
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.generation_timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_fidelity_mode_parsing() {
        assert_eq!("Reject".parse::<FidelityMode>().unwrap(), FidelityMode::Reject);
        assert_eq!(" off ".parse::<FidelityMode>().unwrap(), FidelityMode::Off);
        assert!("strict".parse::<FidelityMode>().is_err());
    }
}
