// ==========================================
// Экономика RFQ - конвертация валют
// ==========================================
// Контракт: convert(...) никогда не возвращает ошибку -
// отсутствующий курс деградирует одну строку расчёта
// (типизированное предупреждение), а не всю агрегацию.
// Источник курсов - внешний коллаборатор, он падать может.
// ==========================================

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::engine::normalize::{normalize_currency_str, round4};

// ==========================================
// FxRateSource - внешний источник курсов
// ==========================================

/// Курс с указанием источника
#[derive(Debug, Clone)]
pub struct FxRate {
    pub rate: f64,
    pub source: String,
}

/// Внешний поставщик курсов валют.
///
/// Может падать (сеть, лимиты) - конвертер обязан перехватить
/// сбой и превратить его в предупреждение.
pub trait FxRateSource: Send + Sync {
    fn get_rate(&self, from: &str, to: &str, force_refresh: bool) -> anyhow::Result<FxRate>;
}

// ==========================================
// Предупреждения конвертации
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertWarning {
    AmountMissing,
    CurrencyMissing,
    FxFailed { from: String, to: String },
}

impl fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertWarning::AmountMissing => write!(f, "amount_missing"),
            ConvertWarning::CurrencyMissing => write!(f, "currency_missing"),
            ConvertWarning::FxFailed { from, to } => write!(f, "fx_failed:{}->{}", from, to),
        }
    }
}

/// Результат конвертации
#[derive(Debug, Clone)]
pub struct Conversion {
    pub value: Option<f64>,
    pub converted: bool,
    pub rate: Option<f64>,
    pub warning: Option<ConvertWarning>,
}

impl Conversion {
    fn failed(warning: ConvertWarning) -> Self {
        Self {
            value: None,
            converted: false,
            rate: None,
            warning: Some(warning),
        }
    }
}

// ==========================================
// CurrencyConverter - конвертер с кэшем курсов
// ==========================================

/// Конвертер сумм между валютами.
///
/// Курс каждой пары запрашивается у источника один раз и
/// переиспользуется в рамках экземпляра (одна агрегация -
/// один конвертер). Политика по умолчанию: без
/// принудительного обновления курса.
pub struct CurrencyConverter {
    source: Arc<dyn FxRateSource>,
    force_refresh: bool,
    cache: Mutex<HashMap<(String, String), f64>>,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn FxRateSource>) -> Self {
        Self {
            source,
            force_refresh: false,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Конвертер с принудительным обновлением курсов
    pub fn with_force_refresh(source: Arc<dyn FxRateSource>, force_refresh: bool) -> Self {
        Self {
            source,
            force_refresh,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Конвертировать сумму из одной валюты в другую
    ///
    /// # Возвращает
    /// Conversion; возможные предупреждения:
    /// - amount_missing: сумма не задана
    /// - currency_missing: не задана одна из валют
    /// - fx_failed:<из>-><в>: источник курса не ответил
    pub fn convert(&self, amount: Option<f64>, from: Option<&str>, to: Option<&str>) -> Conversion {
        let amount = match amount {
            Some(a) => a,
            None => return Conversion::failed(ConvertWarning::AmountMissing),
        };

        let from = from.and_then(normalize_currency_str);
        let to = to.and_then(normalize_currency_str);
        let (from, to) = match (from, to) {
            (Some(f), Some(t)) => (f, t),
            _ => return Conversion::failed(ConvertWarning::CurrencyMissing),
        };

        if from == to {
            return Conversion {
                value: Some(amount),
                converted: true,
                rate: Some(1.0),
                warning: None,
            };
        }

        let rate = match self.lookup_rate(&from, &to) {
            Some(rate) => rate,
            None => return Conversion::failed(ConvertWarning::FxFailed { from, to }),
        };

        Conversion {
            value: Some(round4(amount * rate)),
            converted: true,
            rate: Some(rate),
            warning: None,
        }
    }

    fn lookup_rate(&self, from: &str, to: &str) -> Option<f64> {
        let key = (from.to_string(), to.to_string());

        if let Ok(cache) = self.cache.lock() {
            if let Some(rate) = cache.get(&key) {
                return Some(*rate);
            }
        }

        match self.source.get_rate(from, to, self.force_refresh) {
            Ok(fx) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(key, fx.rate);
                }
                Some(fx.rate)
            }
            Err(e) => {
                tracing::warn!("курс {}->{} не получен: {}", from, to, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedRates {
        rates: HashMap<(String, String), f64>,
        calls: AtomicUsize,
    }

    impl FixedRates {
        fn new(pairs: &[(&str, &str, f64)]) -> Self {
            let rates = pairs
                .iter()
                .map(|(f, t, r)| ((f.to_string(), t.to_string()), *r))
                .collect();
            Self {
                rates,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FxRateSource for FixedRates {
        fn get_rate(&self, from: &str, to: &str, _force_refresh: bool) -> anyhow::Result<FxRate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rates
                .get(&(from.to_string(), to.to_string()))
                .map(|rate| FxRate {
                    rate: *rate,
                    source: "test".to_string(),
                })
                .ok_or_else(|| anyhow!("нет курса {}->{}", from, to))
        }
    }

    #[test]
    fn test_identity_conversion() {
        let converter = CurrencyConverter::new(Arc::new(FixedRates::new(&[])));
        let result = converter.convert(Some(123.4567), Some("USD"), Some("USD"));
        assert_eq!(result.value, Some(123.4567));
        assert!(result.converted);
        assert_eq!(result.rate, Some(1.0));
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_missing_amount_and_currency() {
        let converter = CurrencyConverter::new(Arc::new(FixedRates::new(&[])));

        let result = converter.convert(None, Some("USD"), Some("EUR"));
        assert_eq!(result.warning, Some(ConvertWarning::AmountMissing));
        assert!(!result.converted);

        let result = converter.convert(Some(1.0), None, Some("EUR"));
        assert_eq!(result.warning, Some(ConvertWarning::CurrencyMissing));

        let result = converter.convert(Some(1.0), Some("USD"), Some("  "));
        assert_eq!(result.warning, Some(ConvertWarning::CurrencyMissing));
    }

    #[test]
    fn test_fx_failed_warning_format() {
        let converter = CurrencyConverter::new(Arc::new(FixedRates::new(&[])));
        let result = converter.convert(Some(10.0), Some("usd"), Some("eur"));
        assert!(!result.converted);
        assert_eq!(
            result.warning.unwrap().to_string(),
            "fx_failed:USD->EUR".to_string()
        );
    }

    #[test]
    fn test_conversion_with_rate_and_rounding() {
        let converter =
            CurrencyConverter::new(Arc::new(FixedRates::new(&[("USD", "EUR", 0.91234567)])));
        let result = converter.convert(Some(100.0), Some("USD"), Some("EUR"));
        assert!(result.converted);
        assert_eq!(result.value, Some(91.2346));
        assert_eq!(result.rate, Some(0.91234567));
    }

    #[test]
    fn test_round_trip_reciprocal_rates() {
        let converter = CurrencyConverter::new(Arc::new(FixedRates::new(&[
            ("USD", "EUR", 0.8),
            ("EUR", "USD", 1.25),
        ])));
        let there = converter.convert(Some(100.0), Some("USD"), Some("EUR"));
        let back = converter.convert(there.value, Some("EUR"), Some("USD"));
        assert!((back.value.unwrap() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_rate_cache_hits_source_once() {
        let source = Arc::new(FixedRates::new(&[("USD", "EUR", 0.9)]));
        let converter = CurrencyConverter::new(source.clone());
        converter.convert(Some(1.0), Some("USD"), Some("EUR"));
        converter.convert(Some(2.0), Some("USD"), Some("EUR"));
        converter.convert(Some(3.0), Some("USD"), Some("EUR"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
