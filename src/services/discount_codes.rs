//! discount_codes.rs
//!
//! Проверка промокодов. Калькулятору нужен только готовый `DiscountResult`,
//! поэтому сама проверка спрятана за трейтом `DiscountCodeValidator`.
//!
//! `DiscountCodeStore` - хранилище в памяти, которое создаётся явно и
//! передаётся в `AppState`. Правила проверки:
//! - код активен и не истёк;
//! - не исчерпан общий лимит и лимит на пользователя;
//! - категория подходит (пустой список категорий - подходит любая);
//! - сумма покупки не меньше минимальной.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{DiscountCode, DiscountResult, DiscountType};
use crate::money::round_currency;

pub const ERR_INVALID_CODE: &str = "Invalid discount code";
pub const ERR_EXPIRED: &str = "Discount code has expired";
pub const ERR_USAGE_LIMIT: &str = "Discount code usage limit reached";
pub const ERR_USER_LIMIT: &str = "You have already used this discount code";
pub const ERR_CATEGORY: &str = "Discount code is not valid for this category";
pub const ERR_USER_REQUIRED: &str = "Sign in to use this discount code";
pub const ERR_AMOUNT: &str = "Invalid purchase amount";

#[derive(Debug, Error)]
pub enum DiscountCodeError {
    #[error("discount code '{0}' not found")]
    NotFound(String),

    #[error("discount code '{code}' rejected: {reason}")]
    Rejected { code: String, reason: String },

    #[error("invalid discount code definition: {0}")]
    InvalidDefinition(String),

    #[error("failed to read discount codes: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse discount codes: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Запрос на проверку кода.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCheck {
    pub code: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Сумма, к которой применяется код (после групповой скидки).
    pub purchase_amount: f64,
    #[serde(default)]
    pub category: Option<String>,
}

pub trait DiscountCodeValidator: Send + Sync {
    fn validate(&self, check: &DiscountCheck, now: DateTime<Utc>) -> DiscountResult;
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone)]
struct CodeEntry {
    code: DiscountCode,
    uses: u32,
    uses_by_user: HashMap<String, u32>,
}

impl CodeEntry {
    fn check(&self, check: &DiscountCheck, now: DateTime<Utc>) -> DiscountResult {
        let code = &self.code;

        if !code.active {
            return DiscountResult::invalid(ERR_INVALID_CODE);
        }
        if code.expires_at.is_some_and(|expires_at| now > expires_at) {
            return DiscountResult::invalid(ERR_EXPIRED);
        }
        if code.max_uses.is_some_and(|max| self.uses >= max) {
            return DiscountResult::invalid(ERR_USAGE_LIMIT);
        }
        // Лимит на пользователя без пользователя не проверить - такой код анонимно не принимаем.
        if let Some(max) = code.max_uses_per_user {
            let Some(user_id) = check.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
                return DiscountResult::invalid(ERR_USER_REQUIRED);
            };
            if self.uses_by_user.get(user_id).copied().unwrap_or(0) >= max {
                return DiscountResult::invalid(ERR_USER_LIMIT);
            }
        }
        if !code.categories.is_empty() {
            let eligible = check
                .category
                .as_deref()
                .is_some_and(|category| code.categories.iter().any(|c| c == category));
            if !eligible {
                return DiscountResult::invalid(ERR_CATEGORY);
            }
        }
        if !check.purchase_amount.is_finite() || check.purchase_amount < 0.0 {
            return DiscountResult::invalid(ERR_AMOUNT);
        }
        if let Some(min) = code.min_purchase {
            if check.purchase_amount < min {
                return DiscountResult::invalid(format!("Minimum purchase amount is {:.2}", min));
            }
        }

        match code.discount_type {
            DiscountType::Percentage => {
                DiscountResult::percentage(code.value, round_currency(check.purchase_amount * code.value / 100.0))
            }
            DiscountType::Fixed => DiscountResult::fixed(code.value),
        }
    }
}

/// Хранилище промокодов в памяти.
#[derive(Debug, Default)]
pub struct DiscountCodeStore {
    codes: RwLock<HashMap<String, CodeEntry>>,
}

impl DiscountCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_codes(codes: Vec<DiscountCode>) -> Result<Self, DiscountCodeError> {
        let store = Self::new();
        for code in codes {
            store.insert(code)?;
        }
        Ok(store)
    }

    /// Загружает JSON-массив промокодов из файла.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DiscountCodeError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let codes: Vec<DiscountCode> = serde_json::from_str(&data)?;
        let store = Self::from_codes(codes)?;
        info!("Loaded {} discount codes from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn insert(&self, mut code: DiscountCode) -> Result<(), DiscountCodeError> {
        code.code = normalize(&code.code);
        if code.code.is_empty() {
            return Err(DiscountCodeError::InvalidDefinition("code must not be empty".to_string()));
        }
        if !code.value.is_finite() || code.value < 0.0 {
            return Err(DiscountCodeError::InvalidDefinition(format!(
                "{}: value {} must be a non-negative number",
                code.code, code.value
            )));
        }
        if code.discount_type == DiscountType::Percentage && code.value > 100.0 {
            return Err(DiscountCodeError::InvalidDefinition(format!(
                "{}: percentage {} is above 100",
                code.code, code.value
            )));
        }

        let mut codes = self.codes.write().unwrap_or_else(PoisonError::into_inner);
        if codes.contains_key(&code.code) {
            return Err(DiscountCodeError::InvalidDefinition(format!("duplicate code {}", code.code)));
        }
        codes.insert(
            code.code.clone(),
            CodeEntry {
                code,
                uses: 0,
                uses_by_user: HashMap::new(),
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.codes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Сколько раз код уже использован.
    pub fn usage(&self, code: &str) -> Option<u32> {
        self.codes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize(code))
            .map(|entry| entry.uses)
    }

    /// Проверяет код и сразу списывает одно использование под одной блокировкой,
    /// так что два параллельных погашения не превысят лимит.
    pub fn redeem(&self, check: &DiscountCheck, now: DateTime<Utc>) -> Result<DiscountResult, DiscountCodeError> {
        let key = normalize(&check.code);
        let mut codes = self.codes.write().unwrap_or_else(PoisonError::into_inner);
        let entry = codes
            .get_mut(&key)
            .ok_or_else(|| DiscountCodeError::NotFound(key.clone()))?;

        let result = entry.check(check, now);
        if !result.valid {
            let reason = result.error.unwrap_or_else(|| ERR_INVALID_CODE.to_string());
            warn!("Discount code {} rejected on redeem: {}", key, reason);
            return Err(DiscountCodeError::Rejected { code: key, reason });
        }

        entry.uses += 1;
        if let Some(user_id) = check.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            *entry.uses_by_user.entry(user_id.to_string()).or_insert(0) += 1;
        }
        info!("Discount code {} redeemed ({} uses)", key, entry.uses);
        Ok(result)
    }
}

impl DiscountCodeValidator for DiscountCodeStore {
    fn validate(&self, check: &DiscountCheck, now: DateTime<Utc>) -> DiscountResult {
        let codes = self.codes.read().unwrap_or_else(PoisonError::into_inner);
        match codes.get(&normalize(&check.code)) {
            Some(entry) => entry.check(check, now),
            None => DiscountResult::invalid(ERR_INVALID_CODE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn percent_code(code: &str, value: f64) -> DiscountCode {
        DiscountCode {
            code: code.to_string(),
            discount_type: DiscountType::Percentage,
            value,
            active: true,
            expires_at: None,
            max_uses: None,
            max_uses_per_user: None,
            min_purchase: None,
            categories: vec![],
        }
    }

    fn check(code: &str, amount: f64) -> DiscountCheck {
        DiscountCheck {
            code: code.to_string(),
            user_id: Some("user-1".to_string()),
            purchase_amount: amount,
            category: None,
        }
    }

    #[test]
    fn percentage_code_computes_amount() {
        let store = DiscountCodeStore::from_codes(vec![percent_code("SPRING10", 10.0)]).unwrap();
        let result = store.validate(&check("spring10 ", 800.0), Utc::now());
        assert!(result.valid);
        assert_eq!(result.discount_type, Some(DiscountType::Percentage));
        assert_eq!(result.value, Some(10.0));
        assert_eq!(result.discount_amount, Some(80.0));
    }

    #[test]
    fn fixed_code_reports_its_value() {
        let code = DiscountCode {
            discount_type: DiscountType::Fixed,
            ..percent_code("FLAT50", 50.0)
        };
        let store = DiscountCodeStore::from_codes(vec![code]).unwrap();
        let result = store.validate(&check("FLAT50", 30.0), Utc::now());
        assert_eq!(result, DiscountResult::fixed(50.0));
    }

    #[test]
    fn unknown_and_inactive_codes_are_invalid() {
        let inactive = DiscountCode { active: false, ..percent_code("OFF", 10.0) };
        let store = DiscountCodeStore::from_codes(vec![inactive]).unwrap();

        assert_eq!(store.validate(&check("NOPE", 10.0), Utc::now()).error.as_deref(), Some(ERR_INVALID_CODE));
        assert_eq!(store.validate(&check("OFF", 10.0), Utc::now()).error.as_deref(), Some(ERR_INVALID_CODE));
    }

    #[test]
    fn expired_code() {
        let now = Utc::now();
        let code = DiscountCode {
            expires_at: Some(now - Duration::hours(1)),
            ..percent_code("OLD", 10.0)
        };
        let store = DiscountCodeStore::from_codes(vec![code]).unwrap();
        let result = store.validate(&check("OLD", 100.0), now);
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some(ERR_EXPIRED));
    }

    #[test]
    fn minimum_purchase() {
        let code = DiscountCode { min_purchase: Some(500.0), ..percent_code("BIG", 10.0) };
        let store = DiscountCodeStore::from_codes(vec![code]).unwrap();
        let result = store.validate(&check("BIG", 499.99), Utc::now());
        assert_eq!(result.error.as_deref(), Some("Minimum purchase amount is 500.00"));
        assert!(store.validate(&check("BIG", 500.0), Utc::now()).valid);
    }

    #[test]
    fn category_eligibility() {
        let code = DiscountCode { categories: vec!["concert".to_string()], ..percent_code("MUSIC", 10.0) };
        let store = DiscountCodeStore::from_codes(vec![code]).unwrap();

        let mut request = check("MUSIC", 100.0);
        assert_eq!(store.validate(&request, Utc::now()).error.as_deref(), Some(ERR_CATEGORY));

        request.category = Some("theater".to_string());
        assert!(!store.validate(&request, Utc::now()).valid);

        request.category = Some("concert".to_string());
        assert!(store.validate(&request, Utc::now()).valid);
    }

    #[test]
    fn redeem_enforces_global_and_per_user_limits() {
        let code = DiscountCode {
            max_uses: Some(2),
            max_uses_per_user: Some(1),
            ..percent_code("ONCE", 10.0)
        };
        let store = DiscountCodeStore::from_codes(vec![code]).unwrap();
        let now = Utc::now();

        store.redeem(&check("ONCE", 100.0), now).unwrap();
        assert_eq!(store.usage("once"), Some(1));

        let err = store.redeem(&check("ONCE", 100.0), now).unwrap_err();
        assert!(matches!(err, DiscountCodeError::Rejected { ref reason, .. } if reason == ERR_USER_LIMIT));

        let other = DiscountCheck { user_id: Some("user-2".to_string()), ..check("ONCE", 100.0) };
        store.redeem(&other, now).unwrap();

        let third = DiscountCheck { user_id: Some("user-3".to_string()), ..check("ONCE", 100.0) };
        let err = store.redeem(&third, now).unwrap_err();
        assert!(matches!(err, DiscountCodeError::Rejected { ref reason, .. } if reason == ERR_USAGE_LIMIT));
        assert_eq!(store.usage("ONCE"), Some(2));
    }

    #[test]
    fn per_user_limit_requires_a_user() {
        let code = DiscountCode { max_uses_per_user: Some(1), ..percent_code("WELCOME10", 10.0) };
        let store = DiscountCodeStore::from_codes(vec![code]).unwrap();
        let now = Utc::now();

        for user_id in [None, Some("   ".to_string())] {
            let anonymous = DiscountCheck { user_id, ..check("WELCOME10", 100.0) };
            assert_eq!(store.validate(&anonymous, now).error.as_deref(), Some(ERR_USER_REQUIRED));

            let err = store.redeem(&anonymous, now).unwrap_err();
            assert!(matches!(err, DiscountCodeError::Rejected { ref reason, .. } if reason == ERR_USER_REQUIRED));
        }
        assert_eq!(store.usage("WELCOME10"), Some(0));

        let padded = DiscountCheck { user_id: Some(" user-1 ".to_string()), ..check("WELCOME10", 100.0) };
        store.redeem(&padded, now).unwrap();
        let err = store.redeem(&check("WELCOME10", 100.0), now).unwrap_err();
        assert!(matches!(err, DiscountCodeError::Rejected { ref reason, .. } if reason == ERR_USER_LIMIT));
        assert_eq!(store.usage("WELCOME10"), Some(1));
    }

    #[test]
    fn codes_without_user_limit_accept_anonymous_checks() {
        let store = DiscountCodeStore::from_codes(vec![percent_code("OPEN5", 5.0)]).unwrap();
        let anonymous = DiscountCheck { user_id: None, ..check("OPEN5", 100.0) };
        assert!(store.redeem(&anonymous, Utc::now()).unwrap().valid);
        assert!(store.redeem(&anonymous, Utc::now()).unwrap().valid);
        assert_eq!(store.usage("OPEN5"), Some(2));
    }

    #[test]
    fn redeem_unknown_code_is_not_found() {
        let store = DiscountCodeStore::new();
        assert!(matches!(
            store.redeem(&check("GHOST", 10.0), Utc::now()),
            Err(DiscountCodeError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_bad_definitions() {
        let store = DiscountCodeStore::new();
        assert!(store.insert(percent_code("  ", 10.0)).is_err());
        assert!(store.insert(percent_code("HUGE", 120.0)).is_err());
        assert!(store.insert(percent_code("NEG", -1.0)).is_err());
        store.insert(percent_code("DUP", 5.0)).unwrap();
        assert!(store.insert(percent_code("dup", 5.0)).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn parses_code_documents() {
        let json = r#"[
            {"code": "WELCOME", "type": "percentage", "value": 15, "maxUsesPerUser": 1},
            {"code": "DOOR20", "type": "fixed", "value": 20, "active": false}
        ]"#;
        let codes: Vec<DiscountCode> = serde_json::from_str(json).unwrap();
        assert!(codes[0].active);
        assert_eq!(codes[0].max_uses_per_user, Some(1));
        assert!(!codes[1].active);
        assert_eq!(DiscountCodeStore::from_codes(codes).unwrap().len(), 2);
    }

    #[test]
    fn loads_sample_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/discount_codes.sample.json");
        let store = DiscountCodeStore::load_from_file(path).unwrap();
        assert_eq!(store.len(), 3);

        let result = store.validate(&check("door50", 150.0), Utc::now());
        assert_eq!(result.error.as_deref(), Some("Minimum purchase amount is 200.00"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            DiscountCodeStore::load_from_file("/nonexistent/codes.json"),
            Err(DiscountCodeError::Io(_))
        ));
    }
}
