// ==========================================
// Экономика RFQ - тарификация маршрута
// ==========================================
// Чистая функция расчёта логистической суммы группы по
// модели тарифа. Недостающие обязательные входы дают
// status=error и amount=NULL - исключений нет, статус и
// сообщение сохраняются дословно для оператора.
// ==========================================

use crate::domain::types::{PricingModel, RouteCalcStatus};
use crate::engine::normalize::round4;

/// Входы расчёта маршрута
#[derive(Debug, Clone, Default)]
pub struct RouteCalcInput {
    pub model: Option<PricingModel>,
    pub fixed_cost: Option<f64>,
    pub rate_per_kg: Option<f64>,
    pub rate_per_cbm: Option<f64>,
    pub min_cost: Option<f64>,
    pub markup_pct: Option<f64>,
    pub markup_fixed: Option<f64>,
    pub weight_kg: Option<f64>,
    pub volume_cbm: Option<f64>,
}

/// Результат расчёта маршрута
#[derive(Debug, Clone)]
pub struct RouteCalcOutcome {
    pub ok: bool,
    pub status: RouteCalcStatus,
    pub message: Option<String>,
    pub amount: Option<f64>,
}

impl RouteCalcOutcome {
    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: RouteCalcStatus::Error,
            message: Some(message.into()),
            amount: None,
        }
    }

    fn done(status: RouteCalcStatus, message: Option<String>, amount: f64) -> Self {
        Self {
            ok: true,
            status,
            message,
            amount: Some(amount),
        }
    }
}

/// Рассчитать логистическую сумму группы по маршруту
///
/// Наценка применяется после базы:
/// `final = base * (1 + markup_pct/100) + markup_fixed`,
/// затем округление до 4 знаков.
pub fn calc_route_amount(input: &RouteCalcInput) -> RouteCalcOutcome {
    let model = match input.model {
        Some(m) => m,
        None => return RouteCalcOutcome::error("модель тарификации не задана"),
    };

    let min_cost = input.min_cost.unwrap_or(0.0);

    // Стоимости по сторонам (вес/объём): считаются только при
    // наличии и меры, и ставки
    let weight_cost = match (input.weight_kg, input.rate_per_kg) {
        (Some(w), Some(r)) => Some(w * r),
        _ => None,
    };
    let volume_cost = match (input.volume_cbm, input.rate_per_cbm) {
        (Some(v), Some(r)) => Some(v * r),
        _ => None,
    };

    let (base, status, message) = match model {
        PricingModel::Fixed => {
            let fixed = match input.fixed_cost {
                Some(f) => f,
                None => return RouteCalcOutcome::error("fixed: не задана фиксированная ставка"),
            };
            (fixed, RouteCalcStatus::Ok, None)
        }

        PricingModel::PerKg => {
            let cost = match weight_cost {
                Some(c) => c,
                None => {
                    return RouteCalcOutcome::error("per_kg: нужны вес группы и ставка за кг")
                }
            };
            (cost.max(min_cost), RouteCalcStatus::Ok, None)
        }

        PricingModel::PerCbm => {
            let cost = match volume_cost {
                Some(c) => c,
                None => {
                    return RouteCalcOutcome::error("per_cbm: нужны объём группы и ставка за м3")
                }
            };
            (cost.max(min_cost), RouteCalcStatus::Ok, None)
        }

        PricingModel::PerKgOrCbmMax => match (weight_cost, volume_cost) {
            (None, None) => {
                return RouteCalcOutcome::error(
                    "per_kg_or_cbm_max: нет ни весовой, ни объёмной пары (мера + ставка)",
                )
            }
            (Some(w), Some(v)) => (w.max(v).max(min_cost), RouteCalcStatus::Ok, None),
            (Some(w), None) => (
                w.max(min_cost),
                RouteCalcStatus::Warning,
                Some("per_kg_or_cbm_max: учтена только весовая сторона".to_string()),
            ),
            (None, Some(v)) => (
                v.max(min_cost),
                RouteCalcStatus::Warning,
                Some("per_kg_or_cbm_max: учтена только объёмная сторона".to_string()),
            ),
        },

        PricingModel::Hybrid => {
            if input.fixed_cost.is_none() && weight_cost.is_none() && volume_cost.is_none() {
                return RouteCalcOutcome::error(
                    "hybrid: нет ни фиксированной части, ни переменных входов",
                );
            }

            let variable = weight_cost
                .unwrap_or(0.0)
                .max(volume_cost.unwrap_or(0.0))
                .max(min_cost);
            let base = input.fixed_cost.unwrap_or(0.0) + variable;

            if weight_cost.is_some() && volume_cost.is_some() {
                (base, RouteCalcStatus::Ok, None)
            } else {
                (
                    base,
                    RouteCalcStatus::Warning,
                    Some("hybrid: часть переменных входов отсутствует".to_string()),
                )
            }
        }
    };

    let markup_pct = input.markup_pct.unwrap_or(0.0);
    let markup_fixed = input.markup_fixed.unwrap_or(0.0);
    let amount = round4(base * (1.0 + markup_pct / 100.0) + markup_fixed);

    RouteCalcOutcome::done(status, message, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_model() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::Fixed),
            fixed_cost: Some(1200.0),
            ..Default::default()
        });
        assert!(outcome.ok);
        assert_eq!(outcome.status, RouteCalcStatus::Ok);
        assert_eq!(outcome.amount, Some(1200.0));
    }

    #[test]
    fn test_per_kg_with_min_cost_floor() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::PerKg),
            rate_per_kg: Some(2.0),
            weight_kg: Some(10.0),
            min_cost: Some(100.0),
            ..Default::default()
        });
        assert_eq!(outcome.amount, Some(100.0));
    }

    #[test]
    fn test_per_kg_missing_inputs_is_error() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::PerKg),
            rate_per_kg: Some(2.0),
            ..Default::default()
        });
        assert!(!outcome.ok);
        assert_eq!(outcome.status, RouteCalcStatus::Error);
        assert_eq!(outcome.amount, None);
        assert!(outcome.message.is_some());
    }

    #[test]
    fn test_max_model_both_sides_with_markup() {
        // 100кг * 2 = 200, 1м3 * 500 = 500, min 0 -> база 500
        // наценка 10% -> 550.0000
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::PerKgOrCbmMax),
            rate_per_kg: Some(2.0),
            rate_per_cbm: Some(500.0),
            weight_kg: Some(100.0),
            volume_cbm: Some(1.0),
            min_cost: Some(0.0),
            markup_pct: Some(10.0),
            ..Default::default()
        });
        assert!(outcome.ok);
        assert_eq!(outcome.status, RouteCalcStatus::Ok);
        assert_eq!(outcome.amount, Some(550.0));
    }

    #[test]
    fn test_max_model_one_side_is_warning() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::PerKgOrCbmMax),
            rate_per_kg: Some(2.0),
            weight_kg: Some(100.0),
            volume_cbm: Some(1.0),
            ..Default::default()
        });
        assert!(outcome.ok);
        assert_eq!(outcome.status, RouteCalcStatus::Warning);
        assert_eq!(outcome.amount, Some(200.0));
    }

    #[test]
    fn test_hybrid_model() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::Hybrid),
            fixed_cost: Some(300.0),
            rate_per_kg: Some(1.5),
            weight_kg: Some(200.0),
            rate_per_cbm: Some(100.0),
            volume_cbm: Some(2.0),
            ..Default::default()
        });
        // 300 + max(300, 200, 0) = 600
        assert_eq!(outcome.amount, Some(600.0));
        assert_eq!(outcome.status, RouteCalcStatus::Ok);
    }

    #[test]
    fn test_hybrid_partial_variables_is_warning() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::Hybrid),
            fixed_cost: Some(300.0),
            ..Default::default()
        });
        assert_eq!(outcome.status, RouteCalcStatus::Warning);
        assert_eq!(outcome.amount, Some(300.0));
    }

    #[test]
    fn test_hybrid_without_any_input_is_error() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::Hybrid),
            ..Default::default()
        });
        assert_eq!(outcome.status, RouteCalcStatus::Error);
    }

    #[test]
    fn test_markup_fixed_applied_after_pct() {
        let outcome = calc_route_amount(&RouteCalcInput {
            model: Some(PricingModel::Fixed),
            fixed_cost: Some(100.0),
            markup_pct: Some(10.0),
            markup_fixed: Some(5.0),
            ..Default::default()
        });
        assert_eq!(outcome.amount, Some(115.0));
    }

    #[test]
    fn test_missing_model_is_error() {
        let outcome = calc_route_amount(&RouteCalcInput::default());
        assert_eq!(outcome.status, RouteCalcStatus::Error);
    }
}
