// ==========================================
// Экономика RFQ - вариант строки (LineOption)
// ==========================================
// LineOption - проекция на чтение: собирается из отчётной
// витрины (norm/base) или fallback-запроса, в БД как
// отдельная таблица не хранится.
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RawOptionRow - денормализованная строка источника
// ==========================================

/// Сырая строка отчётной витрины вариантов.
///
/// Все поля опциональны: витрина `_norm` и базовая витрина
/// имеют разный набор колонок, маппер сам выбирает
/// `*_norm`-поля с откатом на базовые.
#[derive(Debug, Clone, Default)]
pub struct RawOptionRow {
    pub rfq_item_id: Option<i64>,
    pub response_line_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub route_id: Option<i64>,
    pub line_no: Option<i64>,
    pub selection_key_norm: Option<String>,
    pub selection_key_raw: Option<String>,
    pub supplier_name: Option<String>,
    pub route_name: Option<String>,
    pub goods_amount: Option<f64>,
    pub goods_currency: Option<String>,
    pub logistics_amount: Option<f64>,
    pub logistics_currency: Option<String>,
    pub duty_amount: Option<f64>,
    pub duty_currency: Option<String>,
    pub landed_amount: Option<f64>,
    pub landed_currency: Option<String>,
    pub eta_days: Option<i64>,
    pub supplier_score: Option<f64>,
    pub fx_missing_flag: Option<i64>,
}

// ==========================================
// LineOption - каноническое предложение поставщика
// ==========================================

/// Одно предложение поставщика по одной строке RFQ.
///
/// Инвариант: `landed_amount` пригоден для сравнения между
/// вариантами только при `fx_missing == false` и заполненной
/// `landed_currency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineOption {
    pub rfq_item_id: i64,
    pub response_line_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub route_id: Option<i64>,
    pub line_no: Option<i64>,
    /// Нормализованный ключ - ярлык для отображения
    pub selection_key_norm: String,
    /// Сырой ключ - по нему группируются конкурирующие варианты
    pub selection_key_raw: String,
    pub supplier_name: Option<String>,
    pub route_name: Option<String>,
    pub goods_amount: Option<f64>,
    pub goods_currency: Option<String>,
    pub logistics_amount: Option<f64>,
    pub logistics_currency: Option<String>,
    pub duty_amount: Option<f64>,
    pub duty_currency: Option<String>,
    pub landed_amount: Option<f64>,
    /// Валюта landed. Может быть выведена из goods/logistics
    /// как подсказка для отображения - такая подсказка не
    /// используется в кросс-валютной арифметике.
    pub landed_currency: Option<String>,
    pub eta_days: Option<i64>,
    pub supplier_score: Option<f64>,
    pub fx_missing: bool,
}

impl LineOption {
    /// Пригоден ли вариант для сравнения по landed cost
    pub fn comparable(&self) -> bool {
        !self.fx_missing && self.landed_amount.is_some() && self.landed_currency.is_some()
    }
}
