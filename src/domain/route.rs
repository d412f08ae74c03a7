// ==========================================
// Экономика RFQ - справочник маршрутов
// ==========================================
// RouteTemplate - переиспользуемое логистическое плечо
// (коридор) и его тариф. Для ядра - только чтение.
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::PricingModel;

/// Шаблон маршрута: коридор + тарифное определение
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTemplate {
    pub route_template_id: i64,
    pub title: String,
    pub origin_country: Option<String>,
    pub dest_country: Option<String>,
    pub pricing_model: Option<PricingModel>,
    pub currency: Option<String>,
    pub fixed_cost: Option<f64>,
    pub rate_per_kg: Option<f64>,
    pub rate_per_cbm: Option<f64>,
    pub min_cost: Option<f64>,
    pub markup_pct: Option<f64>,
    pub markup_fixed: Option<f64>,
    pub eta_min_days: Option<i64>,
    pub eta_max_days: Option<i64>,
    pub is_active: bool,
}
