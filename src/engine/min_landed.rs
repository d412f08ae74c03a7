// ==========================================
// Экономика RFQ - автоотбор минимального landed
// ==========================================
// Детерминированный отбор: по одному победителю на группу
// (rfq_item_id, selection_key_raw). Снимок победителей
// пишется как неизменяемый Scenario одной транзакцией.
// ==========================================

use chrono::Utc;
use uuid::Uuid;

use crate::domain::line_option::LineOption;
use crate::domain::scenario::{Scenario, ScenarioLine};
use crate::domain::types::ScenarioStatus;
use crate::engine::option_mapper::map_rows;
use crate::repository::{LineOptionRepository, ScenarioRepository};

/// Тег стратегии по умолчанию
pub const DEFAULT_STRATEGY: &str = "MIN_LANDED";

#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub scenario_id: String,
    /// Число строк снимка (0 - допустимый результат)
    pub picked_lines: usize,
    /// Сколько вариантов прошло фильтр пригодности
    pub eligible_options: usize,
    /// Сколько вариантов отброшено фильтром
    pub filtered_out: usize,
}

/// Победители по группам (чистая часть отбора)
///
/// Вход обязан быть детерминированно отсортирован
/// (option_mapper::sort_options) - при полном равенстве
/// остаётся первый увиденный.
pub fn select_winners(options: &[LineOption]) -> Vec<&LineOption> {
    let mut winners: Vec<&LineOption> = Vec::new();

    for option in options {
        let landed = match option.landed_amount {
            Some(a) => a,
            None => continue,
        };

        match winners.iter().position(|w| {
            w.rfq_item_id == option.rfq_item_id && w.selection_key_raw == option.selection_key_raw
        }) {
            Some(pos) => {
                let incumbent = winners[pos];
                // Несущий инвариант: landed строго меньше - замена;
                // точное равенство - тай-брейк по меньшему ETA;
                // неизвестный ETA с любой стороны - остаётся первый
                let incumbent_landed = incumbent.landed_amount.unwrap_or(f64::INFINITY);
                let replace = if landed < incumbent_landed {
                    true
                } else if landed == incumbent_landed {
                    match (option.eta_days, incumbent.eta_days) {
                        (Some(a), Some(b)) => a < b,
                        _ => false,
                    }
                } else {
                    false
                };
                if replace {
                    winners[pos] = option;
                }
            }
            None => winners.push(option),
        }
    }

    winners
}

/// Построить снимок минимального landed по RFQ
///
/// # Параметры
/// - strategy: тег стратегии (None -> MIN_LANDED)
/// - target_currency: валюта, записываемая в заголовок
///
/// # Возвращает
/// - Ok(SelectionOutcome); ноль победителей - не ошибка,
///   сценарий создаётся пустым
pub fn auto_select_min_landed(
    option_repo: &LineOptionRepository,
    scenario_repo: &ScenarioRepository,
    rfq_id: i64,
    strategy: Option<&str>,
    target_currency: &str,
) -> anyhow::Result<SelectionOutcome> {
    let raw_rows = option_repo.fetch_raw_rows(rfq_id)?;
    let require_response_line = option_repo.source_has_response_line()?;

    let options = map_rows(&raw_rows);
    let total = options.len();

    let eligible: Vec<LineOption> = options
        .into_iter()
        .filter(|o| o.comparable())
        .filter(|o| !require_response_line || o.response_line_id.is_some())
        .collect();

    let winners = select_winners(&eligible);

    let now = Utc::now().naive_utc();
    let scenario = Scenario {
        scenario_id: Uuid::new_v4().to_string(),
        rfq_id,
        candidate_set_id: None,
        strategy: strategy
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STRATEGY)
            .to_string(),
        status: ScenarioStatus::Draft,
        target_currency: target_currency.to_string(),
        goods_total: None,
        logistics_total: None,
        duty_total: None,
        other_total: None,
        landed_total: None,
        eta_best_days: None,
        eta_worst_days: None,
        warning_count: 0,
        created_at: now,
        updated_at: now,
    };

    let lines: Vec<ScenarioLine> = winners
        .iter()
        .map(|w| ScenarioLine {
            scenario_line_id: Uuid::new_v4().to_string(),
            scenario_id: scenario.scenario_id.clone(),
            rfq_item_id: w.rfq_item_id,
            response_line_id: w.response_line_id,
            supplier_id: w.supplier_id,
            route_id: w.route_id,
            selection_key_raw: w.selection_key_raw.clone(),
            selection_key_norm: w.selection_key_norm.clone(),
            // Фильтр пригодности гарантирует наличие суммы
            landed_amount: w.landed_amount.unwrap_or(0.0),
            landed_currency: w.landed_currency.clone(),
            eta_days: w.eta_days,
        })
        .collect();

    let picked_lines = scenario_repo.create_with_lines(&scenario, &lines)?;

    tracing::info!(
        "автоотбор rfq={}: вариантов={} пригодных={} строк снимка={}",
        rfq_id,
        total,
        eligible.len(),
        picked_lines
    );

    Ok(SelectionOutcome {
        scenario_id: scenario.scenario_id,
        picked_lines,
        eligible_options: eligible.len(),
        filtered_out: total - eligible.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::option_mapper::sort_options;

    fn option(
        rfq_item_id: i64,
        key: &str,
        landed: Option<f64>,
        eta: Option<i64>,
        supplier: &str,
    ) -> LineOption {
        LineOption {
            rfq_item_id,
            response_line_id: Some(1),
            supplier_id: Some(1),
            route_id: None,
            line_no: Some(1),
            selection_key_norm: key.to_string(),
            selection_key_raw: key.to_string(),
            supplier_name: Some(supplier.to_string()),
            route_name: None,
            goods_amount: None,
            goods_currency: None,
            logistics_amount: None,
            logistics_currency: None,
            duty_amount: None,
            duty_currency: None,
            landed_amount: landed,
            landed_currency: Some("USD".to_string()),
            eta_days: eta,
            supplier_score: None,
            fx_missing: false,
        }
    }

    #[test]
    fn test_one_winner_per_group_with_min_landed() {
        let mut options = vec![
            option(1, "A", Some(120.0), Some(5), "P1"),
            option(1, "A", Some(100.0), Some(9), "P2"),
            option(1, "B", Some(80.0), Some(3), "P3"),
            option(2, "A", Some(50.0), Some(2), "P4"),
        ];
        sort_options(&mut options);

        let winners = select_winners(&options);
        assert_eq!(winners.len(), 3);

        let group_a = winners
            .iter()
            .find(|w| w.rfq_item_id == 1 && w.selection_key_raw == "A")
            .unwrap();
        assert_eq!(group_a.landed_amount, Some(100.0));
        // Инвариант отбора: победитель не дороже любого в группе
        for o in options.iter().filter(|o| o.rfq_item_id == 1 && o.selection_key_raw == "A") {
            assert!(group_a.landed_amount.unwrap() <= o.landed_amount.unwrap());
        }
    }

    #[test]
    fn test_tie_breaks_on_lower_eta() {
        let mut options = vec![
            option(1, "A", Some(100.0), Some(10), "Supplier A"),
            option(1, "A", Some(100.0), Some(7), "Supplier B"),
        ];
        sort_options(&mut options);

        let winners = select_winners(&options);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].eta_days, Some(7));
        assert_eq!(winners[0].supplier_name.as_deref(), Some("Supplier B"));
    }

    #[test]
    fn test_unknown_eta_keeps_first_seen() {
        let mut options = vec![
            option(1, "A", Some(100.0), None, "Alpha"),
            option(1, "A", Some(100.0), Some(3), "Beta"),
        ];
        sort_options(&mut options);

        // После сортировки первым идёт Alpha (имя поставщика);
        // ETA-тай-брейк с неизвестной стороной не срабатывает
        let winners = select_winners(&options);
        assert_eq!(winners[0].supplier_name.as_deref(), Some("Alpha"));
    }

    #[test]
    fn test_options_without_landed_are_skipped() {
        let options = vec![option(1, "A", None, Some(1), "P1")];
        assert!(select_winners(&options).is_empty());
    }
}
