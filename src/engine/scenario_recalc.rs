// ==========================================
// Экономика RFQ - пересчёт сценария
// ==========================================
// Полная перезапись итогов: каждый вызов считает всё с нуля,
// никаких инкрементальных поправок (защита от дрейфа).
// Пробел в данных - предупреждение строки, не ошибка вызова.
// ==========================================

use crate::domain::scenario::ScenarioGroupRoute;
use crate::domain::types::{RouteCalcStatus, ScenarioStatus};
use crate::engine::fx::CurrencyConverter;
use crate::engine::normalize::round4;
use crate::engine::route_pricing::{calc_route_amount, RouteCalcInput, RouteCalcOutcome};
use crate::repository::{
    RepositoryError, RouteTemplateRepository, ScenarioRepository, ScenarioTotalsUpdate,
    ShipmentGroupRepository,
};

// ==========================================
// Тарификация одного маршрута группы
// ==========================================

#[derive(Debug, Clone)]
pub struct GroupRoutePricing {
    pub group_route_id: String,
    pub status: RouteCalcStatus,
    pub message: Option<String>,
    pub logistics_amount: Option<f64>,
    pub eta_min_days: Option<i64>,
    pub eta_max_days: Option<i64>,
}

/// Эффективный вход расчёта: ad-hoc поле назначения
/// перекрывает одноимённое поле шаблона
fn effective_input(
    route: &ScenarioGroupRoute,
    template: Option<&crate::domain::route::RouteTemplate>,
    weight_kg: Option<f64>,
    volume_cbm: Option<f64>,
) -> RouteCalcInput {
    RouteCalcInput {
        model: route
            .pricing_model
            .or_else(|| template.and_then(|t| t.pricing_model)),
        fixed_cost: route.fixed_cost.or_else(|| template.and_then(|t| t.fixed_cost)),
        rate_per_kg: route.rate_per_kg.or_else(|| template.and_then(|t| t.rate_per_kg)),
        rate_per_cbm: route.rate_per_cbm.or_else(|| template.and_then(|t| t.rate_per_cbm)),
        min_cost: route.min_cost.or_else(|| template.and_then(|t| t.min_cost)),
        markup_pct: route.markup_pct.or_else(|| template.and_then(|t| t.markup_pct)),
        markup_fixed: route
            .markup_fixed
            .or_else(|| template.and_then(|t| t.markup_fixed)),
        weight_kg,
        volume_cbm,
    }
}

/// Тарифицировать маршрут группы и сохранить результат
///
/// # Возвращает
/// - Ok(GroupRoutePricing): статус/сумма, уже записанные в БД
/// - Err: назначение или группа не найдены, сбой хранилища
pub fn price_group_route(
    scenario_repo: &ScenarioRepository,
    group_repo: &ShipmentGroupRepository,
    route_repo: &RouteTemplateRepository,
    group_route_id: &str,
) -> anyhow::Result<GroupRoutePricing> {
    let route = scenario_repo
        .find_group_route(group_route_id)?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "scenario_group_route".to_string(),
            id: group_route_id.to_string(),
        })?;

    let group = group_repo
        .find_by_id(&route.shipment_group_id)?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "shipment_group".to_string(),
            id: route.shipment_group_id.clone(),
        })?;

    let template = match route.route_template_id {
        Some(id) => route_repo.find_by_id(id)?,
        None => None,
    };

    let input = effective_input(&route, template.as_ref(), group.weight_kg, group.volume_cbm);
    let outcome: RouteCalcOutcome = calc_route_amount(&input);

    let eta_min = template.as_ref().and_then(|t| t.eta_min_days);
    let eta_max = template.as_ref().and_then(|t| t.eta_max_days);

    scenario_repo.update_group_route_calc(
        group_route_id,
        outcome.status,
        outcome.message.as_deref(),
        outcome.amount,
        eta_min,
        eta_max,
    )?;

    Ok(GroupRoutePricing {
        group_route_id: group_route_id.to_string(),
        status: outcome.status,
        message: outcome.message,
        logistics_amount: outcome.amount,
        eta_min_days: eta_min,
        eta_max_days: eta_max,
    })
}

// ==========================================
// Пересчёт итогов сценария
// ==========================================

#[derive(Debug, Clone)]
pub struct RecalcOutcome {
    pub scenario_id: String,
    pub status: ScenarioStatus,
    pub goods_total: f64,
    pub logistics_total: f64,
    pub duty_total: f64,
    pub other_total: f64,
    pub landed_total: f64,
    pub eta_best_days: Option<i64>,
    pub eta_worst_days: Option<i64>,
    pub selected_groups: usize,
    pub route_errors: i64,
    pub warning_count: i64,
    /// Человекочитаемые записи о пробелах данных
    pub warnings: Vec<String>,
}

/// Пересчитать итоги сценария (полная перезапись)
///
/// Шаги по порядку: товары (с масштабированием количества и
/// конвертацией), логистика выбранных маршрутов, пошлины
/// групп, прочие затраты, ETA как "худший из лучших плеч".
/// Статус calculated - только при >=1 выбранной группе и нуле
/// ошибок маршрутов.
pub fn recalculate_scenario(
    scenario_repo: &ScenarioRepository,
    group_repo: &ShipmentGroupRepository,
    converter: &CurrencyConverter,
    scenario_id: &str,
) -> anyhow::Result<RecalcOutcome> {
    let scenario = scenario_repo
        .find_by_id(scenario_id)?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "scenario".to_string(),
            id: scenario_id.to_string(),
        })?;

    let target = scenario.target_currency.as_str();
    let routes = scenario_repo.list_group_routes(scenario_id)?;
    let selected: Vec<&ScenarioGroupRoute> =
        routes.iter().filter(|r| r.selected_for_scenario).collect();

    let mut warnings: Vec<String> = Vec::new();
    let mut warning_count: i64 = 0;
    let mut route_errors: i64 = 0;

    // Шаг 1: товары выбранных групп
    let mut goods_total = 0.0;
    for route in &selected {
        for item in group_repo.list_included_items(&route.shipment_group_id)? {
            let amount = item.goods_amount.map(|a| {
                // Масштабирование на переопределённое количество
                match item.qty_override {
                    Some(eff) if item.qty > 0.0 && eff != item.qty => a * (eff / item.qty),
                    _ => a,
                }
            });

            let conv = converter.convert(amount, item.goods_currency.as_deref(), Some(target));
            match conv.value {
                Some(v) => goods_total += v,
                None => {
                    warning_count += 1;
                    if let Some(w) = conv.warning {
                        warnings.push(format!("позиция {}: {}", item.candidate_item_id, w));
                    }
                }
            }
        }
    }

    // Шаги 2 и частично 4: логистика, пошлины, ETA
    let mut logistics_total = 0.0;
    let mut duty_total = 0.0;
    let mut eta_best: Option<i64> = None;
    let mut eta_worst: Option<i64> = None;

    for route in &selected {
        match route.calc_status {
            RouteCalcStatus::Error | RouteCalcStatus::NotApplicable => {
                route_errors += 1;
                continue;
            }
            RouteCalcStatus::Warning => warning_count += 1,
            RouteCalcStatus::Ok => {}
        }

        if route.logistics_amount_calc.is_some() {
            let conv = converter.convert(
                route.logistics_amount_calc,
                route.currency.as_deref(),
                Some(target),
            );
            match conv.value {
                Some(v) => logistics_total += v,
                None => {
                    warning_count += 1;
                    if let Some(w) = conv.warning {
                        warnings.push(format!("маршрут {}: {}", route.group_route_id, w));
                    }
                }
            }
        }

        if route.duty_amount.is_some() {
            let conv =
                converter.convert(route.duty_amount, route.duty_currency.as_deref(), Some(target));
            match conv.value {
                Some(v) => duty_total += v,
                None => {
                    warning_count += 1;
                    if let Some(w) = conv.warning {
                        warnings.push(format!("пошлина {}: {}", route.group_route_id, w));
                    }
                }
            }
        }

        // "Худший из лучших": бегущий максимум обеих границ -
        // сценарий не быстрее самого медленного плеча
        if let Some(min) = route.eta_min_days_calc {
            eta_best = Some(eta_best.map_or(min, |b| b.max(min)));
        }
        if let Some(max) = route.eta_max_days_calc {
            eta_worst = Some(eta_worst.map_or(max, |w| w.max(max)));
        }
    }

    // Шаг 3: прочие затраты (amount x qty)
    let mut other_total = 0.0;
    for cost in scenario_repo.list_other_costs(scenario_id)? {
        if !cost.enabled {
            continue;
        }
        let amount = cost.amount.map(|a| a * cost.qty);
        let conv = converter.convert(amount, cost.currency.as_deref(), Some(target));
        match conv.value {
            Some(v) => other_total += v,
            None => {
                warning_count += 1;
                if let Some(w) = conv.warning {
                    warnings.push(format!("затрата {}: {}", cost.other_cost_id, w));
                }
            }
        }
    }

    // Шаг 4: каждая компонента округляется до суммирования
    let goods_total = round4(goods_total);
    let logistics_total = round4(logistics_total);
    let duty_total = round4(duty_total);
    let other_total = round4(other_total);
    let landed_total = round4(goods_total + logistics_total + duty_total + other_total);

    let status = if !selected.is_empty() && route_errors == 0 {
        ScenarioStatus::Calculated
    } else {
        ScenarioStatus::Draft
    };

    let total_warnings = warning_count + route_errors;

    scenario_repo.update_totals(
        scenario_id,
        &ScenarioTotalsUpdate {
            goods_total: Some(goods_total),
            logistics_total: Some(logistics_total),
            duty_total: Some(duty_total),
            other_total: Some(other_total),
            landed_total: Some(landed_total),
            eta_best_days: eta_best,
            eta_worst_days: eta_worst,
            warning_count: total_warnings,
            status,
        },
    )?;

    tracing::info!(
        "пересчёт сценария {}: landed={} статус={} предупреждений={} ошибок маршрутов={}",
        scenario_id,
        landed_total,
        status,
        total_warnings,
        route_errors
    );

    Ok(RecalcOutcome {
        scenario_id: scenario_id.to_string(),
        status,
        goods_total,
        logistics_total,
        duty_total,
        other_total,
        landed_total,
        eta_best_days: eta_best,
        eta_worst_days: eta_worst,
        selected_groups: selected.len(),
        route_errors,
        warning_count: total_warnings,
        warnings,
    })
}
