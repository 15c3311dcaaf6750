pub mod config;
pub mod error;
pub mod money;
pub mod models;
pub mod services;
pub mod controllers;

use std::sync::Arc;
use tracing::info;

use services::discount_codes::{DiscountCodeError, DiscountCodeStore};

// Shared state для всего приложения
pub struct AppState {
    pub config: config::Config,
    pub discount_codes: DiscountCodeStore,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Arc<Self>, DiscountCodeError> {
        let discount_codes = match config.pricing.discount_codes_path.as_deref() {
            Some(path) => DiscountCodeStore::load_from_file(path)?,
            None => {
                info!("DISCOUNT_CODES_PATH not set, starting with an empty discount code store");
                DiscountCodeStore::new()
            }
        };

        Ok(Self::with_store(config, discount_codes))
    }

    pub fn with_store(config: config::Config, discount_codes: DiscountCodeStore) -> Arc<Self> {
        Arc::new(Self { config, discount_codes })
    }
}
