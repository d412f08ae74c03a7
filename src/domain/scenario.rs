// ==========================================
// Экономика RFQ - сценарии
// ==========================================
// Scenario - один оценённый план по RFQ:
// - legacy-снимок MIN_LANDED по строкам (одна валюта), либо
// - v2-сценарий со ссылкой на CandidateSet и маршрутами групп.
// Пересчёт всегда перезаписывает итоги (идемпотентно).
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{PricingModel, RouteCalcStatus, ScenarioStatus};

// ==========================================
// Scenario - заголовок сценария
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: String,
    pub rfq_id: i64,
    /// Для v2-сценариев: набор кандидатов, на котором построен
    pub candidate_set_id: Option<String>,
    /// Свободный тег стратегии (по умолчанию MIN_LANDED)
    pub strategy: String,
    pub status: ScenarioStatus,
    /// Целевая валюта итогов
    pub target_currency: String,
    pub goods_total: Option<f64>,
    pub logistics_total: Option<f64>,
    pub duty_total: Option<f64>,
    pub other_total: Option<f64>,
    pub landed_total: Option<f64>,
    /// "Худший из лучших": максимум eta_min по выбранным плечам
    pub eta_best_days: Option<i64>,
    /// Максимум eta_max по выбранным плечам
    pub eta_worst_days: Option<i64>,
    pub warning_count: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// ScenarioLine - снимок выигравшего варианта (legacy)
// ==========================================

/// Неизменяемый снимок победителя min-landed по одной группе
/// `(rfq_item_id, selection_key_raw)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioLine {
    pub scenario_line_id: String,
    pub scenario_id: String,
    pub rfq_item_id: i64,
    pub response_line_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub route_id: Option<i64>,
    pub selection_key_raw: String,
    pub selection_key_norm: String,
    pub landed_amount: f64,
    pub landed_currency: Option<String>,
    pub eta_days: Option<i64>,
}

// ==========================================
// ScenarioGroupRoute - назначение тарификации группе
// ==========================================

/// Назначение маршрута (шаблонного или ad-hoc) одной группе
/// отгрузки внутри одного сценария.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioGroupRoute {
    pub group_route_id: String,
    pub scenario_id: String,
    pub shipment_group_id: String,
    /// Ссылка на шаблон; None - ad-hoc параметры ниже
    pub route_template_id: Option<i64>,
    pub pricing_model: Option<PricingModel>,
    pub currency: Option<String>,
    pub fixed_cost: Option<f64>,
    pub rate_per_kg: Option<f64>,
    pub rate_per_cbm: Option<f64>,
    pub min_cost: Option<f64>,
    pub markup_pct: Option<f64>,
    pub markup_fixed: Option<f64>,
    /// Пошлина по группе (начисляется на группу при пересечении границы)
    pub duty_amount: Option<f64>,
    pub duty_currency: Option<String>,
    /// Рассчитанная логистическая сумма (после наценки)
    pub logistics_amount_calc: Option<f64>,
    pub eta_min_days_calc: Option<i64>,
    pub eta_max_days_calc: Option<i64>,
    pub calc_status: RouteCalcStatus,
    pub calc_message: Option<String>,
    /// Участвует ли группа в итогах сценария
    pub selected_for_scenario: bool,
}

// ==========================================
// ScenarioOtherCost - прочие затраты сценария
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOtherCost {
    pub other_cost_id: String,
    pub scenario_id: String,
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub qty: f64,
    pub enabled: bool,
}
