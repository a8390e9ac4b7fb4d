use serde::{Deserialize, Serialize};

use crate::logic::{MatrixSettings, DEFAULT_LABEL_SEPARATOR};
use crate::model::VariantDefaults;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub defaults: DefaultsConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
}

/// Base price and stock given to variants nobody has edited yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub label_separator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            price: 0.0,
            stock: 0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            label_separator: DEFAULT_LABEL_SEPARATOR.to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and config file
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("variant-matrix").required(false));

        // Environment variables like MATRIX_DEFAULTS__PRICE
        config = config.add_source(
            config::Environment::with_prefix("MATRIX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Engine settings derived from this configuration
    pub fn matrix_settings(&self) -> MatrixSettings {
        MatrixSettings::from(self)
    }
}

impl From<&AppConfig> for MatrixSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            defaults: VariantDefaults::new(config.defaults.price, config.defaults.stock),
            label_separator: config.display.label_separator.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_to_matrix_settings() {
        let mut config = AppConfig::default();
        config.defaults.price = 19.9;
        config.defaults.stock = 3;
        config.display.label_separator = " - ".to_string();

        let settings = config.matrix_settings();
        assert_eq!(settings.defaults, VariantDefaults::new(19.9, 3));
        assert_eq!(settings.label_separator, " - ");
    }

    #[test]
    fn test_load_without_file_or_env_uses_defaults() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.display.label_separator, DEFAULT_LABEL_SEPARATOR);
        assert_eq!(config.log.level, "info");
    }
}
