// ==========================================
// Интеграционные тесты тарификации и пересчёта сценария
// ==========================================


use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use rfq_economics::api::EconomicsApi;
use rfq_economics::config::EngineConfig;
use rfq_economics::domain::scenario::{Scenario, ScenarioGroupRoute, ScenarioOtherCost};
use rfq_economics::domain::types::{RouteCalcStatus, ScenarioStatus};
use rfq_economics::repository::ScenarioRepository;

use test_helpers::*;

fn api_with_rates(
    conn: &std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>,
    rates: &[(&str, &str, f64)],
) -> EconomicsApi {
    EconomicsApi::new(
        conn.clone(),
        Arc::new(FixedRates::new(rates)),
        EngineConfig::default(),
    )
}

fn new_scenario(rfq_id: i64, candidate_set_id: &str) -> Scenario {
    let now = Utc::now().naive_utc();
    Scenario {
        scenario_id: Uuid::new_v4().to_string(),
        rfq_id,
        candidate_set_id: Some(candidate_set_id.to_string()),
        strategy: "MANUAL".to_string(),
        status: ScenarioStatus::Draft,
        target_currency: "RUB".to_string(),
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
    }
}

fn new_group_route(
    scenario_id: &str,
    shipment_group_id: &str,
    route_template_id: Option<i64>,
) -> ScenarioGroupRoute {
    ScenarioGroupRoute {
        group_route_id: Uuid::new_v4().to_string(),
        scenario_id: scenario_id.to_string(),
        shipment_group_id: shipment_group_id.to_string(),
        route_template_id,
        pricing_model: None,
        currency: Some("USD".to_string()),
        fixed_cost: None,
        rate_per_kg: None,
        rate_per_cbm: None,
        min_cost: None,
        markup_pct: None,
        markup_fixed: None,
        duty_amount: None,
        duty_currency: None,
        logistics_amount_calc: None,
        eta_min_days_calc: None,
        eta_max_days_calc: None,
        calc_status: RouteCalcStatus::NotApplicable,
        calc_message: None,
        selected_for_scenario: true,
    }
}

/// Набор + группа CN с весом 100кг и объёмом 1м3
fn seed_group(
    api: &EconomicsApi,
    conn: &std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>,
) -> (String, String) {
    let set_id = api
        .import_combinations(1, 10, r#"{
            "key": "C1",
            "supplier_ids": [11],
            "assignment_preview": [
                {"slot_key": "S1", "supplier_id": 11, "qty": 2, "goods_amount": 100,
                 "goods_currency": "USD", "lead_time_days": 15, "origin_country": "CN"}
            ]
        }"#)
        .unwrap()
        .candidate_set_ids
        .remove(0);

    let group_id = api
        .build_shipment_groups(1, &set_id, false)
        .unwrap()
        .group_ids
        .remove(0);
    set_group_measures(conn, &group_id, Some(100.0), Some(1.0)).unwrap();

    (set_id, group_id)
}

#[test]
fn test_price_group_route_from_template() {
    let (_db, conn) = create_test_db().unwrap();
    insert_route_template(
        &conn, 7, "Море CN", "per_kg_or_cbm_max", "USD",
        Some(2.0), Some(500.0), Some(0.0), Some(10.0), Some(10), Some(20),
    )
    .unwrap();

    let api = api_with_rates(&conn, &[]);
    let (set_id, group_id) = seed_group(&api, &conn);

    let scenario_repo = ScenarioRepository::from_connection(conn.clone());
    let scenario = new_scenario(1, &set_id);
    scenario_repo.create(&scenario).unwrap();

    let route = new_group_route(&scenario.scenario_id, &group_id, Some(7));
    scenario_repo.insert_group_route(&route).unwrap();

    // max(100*2, 1*500, 0) = 500, наценка 10% -> 550
    let result = api.price_group_route(&route.group_route_id).unwrap();
    assert_eq!(result.calc_status, "ok");
    assert_eq!(result.logistics_amount, Some(550.0));
    assert_eq!(result.eta_min_days, Some(10));
    assert_eq!(result.eta_max_days, Some(20));

    let stored = scenario_repo
        .find_group_route(&route.group_route_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.calc_status, RouteCalcStatus::Ok);
    assert_eq!(stored.logistics_amount_calc, Some(550.0));
}

#[test]
fn test_price_group_route_without_model_is_error_not_panic() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_with_rates(&conn, &[]);
    let (set_id, group_id) = seed_group(&api, &conn);

    let scenario_repo = ScenarioRepository::from_connection(conn.clone());
    let scenario = new_scenario(1, &set_id);
    scenario_repo.create(&scenario).unwrap();

    let route = new_group_route(&scenario.scenario_id, &group_id, None);
    scenario_repo.insert_group_route(&route).unwrap();

    let result = api.price_group_route(&route.group_route_id).unwrap();
    assert_eq!(result.calc_status, "error");
    assert_eq!(result.logistics_amount, None);
    assert!(result.calc_message.is_some());
}

#[test]
fn test_recalculate_scenario_totals_and_status() {
    let (_db, conn) = create_test_db().unwrap();
    insert_route_template(
        &conn, 7, "Море CN", "per_kg_or_cbm_max", "USD",
        Some(2.0), Some(500.0), Some(0.0), Some(10.0), Some(10), Some(20),
    )
    .unwrap();

    let api = api_with_rates(&conn, &[("USD", "RUB", 90.0)]);
    let (set_id, group_id) = seed_group(&api, &conn);

    let scenario_repo = ScenarioRepository::from_connection(conn.clone());
    let scenario = new_scenario(1, &set_id);
    scenario_repo.create(&scenario).unwrap();

    let mut route = new_group_route(&scenario.scenario_id, &group_id, Some(7));
    route.duty_amount = Some(10.0);
    route.duty_currency = Some("USD".to_string());
    scenario_repo.insert_group_route(&route).unwrap();
    api.price_group_route(&route.group_route_id).unwrap();

    scenario_repo
        .insert_other_cost(&ScenarioOtherCost {
            other_cost_id: Uuid::new_v4().to_string(),
            scenario_id: scenario.scenario_id.clone(),
            title: Some("Сертификация".to_string()),
            amount: Some(5.0),
            currency: Some("USD".to_string()),
            qty: 2.0,
            enabled: true,
        })
        .unwrap();

    let result = api.recalculate_scenario(&scenario.scenario_id).unwrap();

    // Товары: 100 USD * 90; логистика: 550 * 90; пошлина: 10 * 90;
    // прочее: 5 * 2 * 90
    assert_eq!(result.goods_total, 9000.0);
    assert_eq!(result.logistics_total, 49500.0);
    assert_eq!(result.duty_total, 900.0);
    assert_eq!(result.other_total, 900.0);
    assert_eq!(result.landed_total, 60300.0);
    assert_eq!(result.eta_best_days, Some(10));
    assert_eq!(result.eta_worst_days, Some(20));
    assert_eq!(result.status, "calculated");
    assert_eq!(result.warning_count, 0);
    assert_eq!(result.route_errors, 0);

    let stored = scenario_repo
        .find_by_id(&scenario.scenario_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ScenarioStatus::Calculated);
    assert_eq!(stored.landed_total, Some(60300.0));
}

#[test]
fn test_recalculation_is_idempotent() {
    let (_db, conn) = create_test_db().unwrap();
    insert_route_template(
        &conn, 7, "Море CN", "per_kg", "USD",
        Some(2.0), None, Some(0.0), None, Some(5), Some(9),
    )
    .unwrap();

    let api = api_with_rates(&conn, &[("USD", "RUB", 90.0)]);
    let (set_id, group_id) = seed_group(&api, &conn);

    let scenario_repo = ScenarioRepository::from_connection(conn.clone());
    let scenario = new_scenario(1, &set_id);
    scenario_repo.create(&scenario).unwrap();

    let route = new_group_route(&scenario.scenario_id, &group_id, Some(7));
    scenario_repo.insert_group_route(&route).unwrap();
    api.price_group_route(&route.group_route_id).unwrap();

    let first = api.recalculate_scenario(&scenario.scenario_id).unwrap();
    let second = api.recalculate_scenario(&scenario.scenario_id).unwrap();

    assert_eq!(first.goods_total, second.goods_total);
    assert_eq!(first.logistics_total, second.logistics_total);
    assert_eq!(first.landed_total, second.landed_total);
    assert_eq!(first.warning_count, second.warning_count);
    assert_eq!(first.status, second.status);
}

#[test]
fn test_fx_gap_degrades_to_warning_and_route_error_blocks_calculated() {
    let (_db, conn) = create_test_db().unwrap();
    // Курса USD->RUB нет
    let api = api_with_rates(&conn, &[]);
    let (set_id, group_id) = seed_group(&api, &conn);

    let scenario_repo = ScenarioRepository::from_connection(conn.clone());
    let scenario = new_scenario(1, &set_id);
    scenario_repo.create(&scenario).unwrap();

    // Маршрут без модели тарифа: после тарификации - error
    let route = new_group_route(&scenario.scenario_id, &group_id, None);
    scenario_repo.insert_group_route(&route).unwrap();
    api.price_group_route(&route.group_route_id).unwrap();

    let result = api.recalculate_scenario(&scenario.scenario_id).unwrap();
    assert_eq!(result.status, "draft");
    assert_eq!(result.route_errors, 1);
    // Товарная конвертация тоже не удалась - предупреждение
    assert!(result.warning_count >= 2);
    assert!(result.warnings.iter().any(|w| w.contains("fx_failed:USD->RUB")));
    assert_eq!(result.goods_total, 0.0);
}

#[test]
fn test_unselected_routes_are_ignored() {
    let (_db, conn) = create_test_db().unwrap();
    insert_route_template(
        &conn, 7, "Море CN", "per_kg", "USD",
        Some(2.0), None, Some(0.0), None, Some(5), Some(9),
    )
    .unwrap();

    let api = api_with_rates(&conn, &[("USD", "RUB", 90.0)]);
    let (set_id, group_id) = seed_group(&api, &conn);

    let scenario_repo = ScenarioRepository::from_connection(conn.clone());
    let scenario = new_scenario(1, &set_id);
    scenario_repo.create(&scenario).unwrap();

    let route = new_group_route(&scenario.scenario_id, &group_id, Some(7));
    scenario_repo.insert_group_route(&route).unwrap();
    api.price_group_route(&route.group_route_id).unwrap();
    scenario_repo
        .set_route_selected(&route.group_route_id, false)
        .unwrap();

    let result = api.recalculate_scenario(&scenario.scenario_id).unwrap();
    // Ни одной выбранной группы - сценарий остаётся черновиком
    assert_eq!(result.selected_groups, 0);
    assert_eq!(result.status, "draft");
    assert_eq!(result.goods_total, 0.0);
    assert_eq!(result.logistics_total, 0.0);
    assert_eq!(result.eta_best_days, None);
}
