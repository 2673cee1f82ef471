use config::{Config, Environment};
use magazzino::client::Credential;
use serde::Deserialize;

/// CLI settings, loaded from `MAGAZZINO_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// JWT for the `Authorization: Bearer` header.
    #[serde(default)]
    pub token: Option<String>,
    /// Key for the `X-API-Key` header variant.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Public customer id of an embedded deployment; exchanged for a
    /// bearer token on first use when no explicit credential is set.
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let config = Config::builder()
            .set_default("base_url", default_base_url())?
            .add_source(
                Environment::with_prefix("MAGAZZINO")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }

    /// Credential derived from the settings. The bearer token wins when
    /// both header variants are configured; with neither, calls go out
    /// anonymous.
    pub fn credential(&self) -> Credential {
        if let Some(token) = &self.token {
            Credential::Bearer(token.clone())
        } else if let Some(key) = &self.api_key {
            Credential::ApiKey(key.clone())
        } else {
            Credential::Anonymous
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("MAGAZZINO_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn default_settings_are_anonymous_and_local() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
        assert!(matches!(settings.credential(), Credential::Anonymous));
    }

    #[test]
    #[serial]
    fn environment_overrides_and_bearer_wins() {
        clean_env();
        env::set_var("MAGAZZINO_BASE_URL", "https://warehouse.example.com");
        env::set_var("MAGAZZINO_TOKEN", "jwt-123");
        env::set_var("MAGAZZINO_API_KEY", "key-456");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.base_url, "https://warehouse.example.com");
        assert!(matches!(settings.credential(), Credential::Bearer(token) if token == "jwt-123"));

        env::remove_var("MAGAZZINO_BASE_URL");
        env::remove_var("MAGAZZINO_TOKEN");
        env::remove_var("MAGAZZINO_API_KEY");
    }

    #[test]
    #[serial]
    fn api_key_alone_selects_the_header_variant() {
        clean_env();
        env::set_var("MAGAZZINO_API_KEY", "key-456");

        let settings = Settings::new().unwrap();
        assert!(matches!(settings.credential(), Credential::ApiKey(key) if key == "key-456"));

        env::remove_var("MAGAZZINO_API_KEY");
    }
}
