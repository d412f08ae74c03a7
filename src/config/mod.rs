// ==========================================
// Экономика RFQ - конфигурация ядра
// ==========================================
// Немногочисленные настройки расчёта. Источник - JSON-файл,
// каждое поле имеет значение по умолчанию, поэтому частичный
// файл допустим.
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Конфигурация движка экономики
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Целевая валюта итогов сценария по умолчанию
    pub default_target_currency: String,
    /// Принудительно обновлять курс при каждом запросе
    pub fx_force_refresh: bool,
    /// Страна-заглушка для позиций с неизвестным происхождением
    pub unknown_origin_country: String,
    /// Тег стратегии для авто-выбора по минимальному landed
    pub min_landed_strategy_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_target_currency: "RUB".to_string(),
            fx_force_refresh: false,
            unknown_origin_country: "UN".to_string(),
            min_landed_strategy_tag: "MIN_LANDED".to_string(),
        }
    }
}

impl EngineConfig {
    /// Загрузить конфигурацию из JSON-файла
    ///
    /// # Возвращает
    /// - Ok(EngineConfig): конфигурация (отсутствующие поля - по умолчанию)
    /// - Err: файл не читается или JSON некорректен
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Загрузить из файла, при его отсутствии - значения по умолчанию
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("конфигурация не прочитана ({}), используются значения по умолчанию", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.default_target_currency, "RUB");
        assert!(!config.fx_force_refresh);
        assert_eq!(config.unknown_origin_country, "UN");
        assert_eq!(config.min_landed_strategy_tag, "MIN_LANDED");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"default_target_currency":"USD"}"#).unwrap();
        assert_eq!(config.default_target_currency, "USD");
        assert_eq!(config.unknown_origin_country, "UN");
    }
}
