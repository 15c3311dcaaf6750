use serde::Deserialize;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub pricing: PricingConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `LOG_FORMAT=json` включает JSON-логи для продакшена.
    pub log_json: bool,
}

// Настройки ценообразования
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Цена билета, если запрос её не передал.
    pub default_ticket_price: f64,
    pub currency: String,
    /// JSON-файл с промокодами; без него хранилище стартует пустым.
    pub discount_codes_path: Option<String>,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_discount_codes: bool,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(name, default);
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "ticket_pricing=debug,tower_http=debug".to_string(),
                log_json: false,
            },
            pricing: PricingConfig {
                default_ticket_price: 0.0,
                currency: "TRY".to_string(),
                discount_codes_path: None,
            },
            features: FeatureFlags {
                enable_discount_codes: true,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_ticket_price: f64 = parse_var("DEFAULT_TICKET_PRICE", "0")?;
        if !default_ticket_price.is_finite() || default_ticket_price < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "DEFAULT_TICKET_PRICE",
                value: default_ticket_price.to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var("PORT", "8000")?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "ticket_pricing=debug,tower_http=debug"),
                log_json: var_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            },
            pricing: PricingConfig {
                default_ticket_price,
                currency: var_or("CURRENCY", "TRY"),
                discount_codes_path: env::var("DISCOUNT_CODES_PATH").ok().filter(|p| !p.trim().is_empty()),
            },
            features: FeatureFlags {
                enable_discount_codes: parse_var("ENABLE_DISCOUNT_CODES", "true")?,
            },
        })
    }
}
