// ==========================================
// Интеграционные тесты импорта комбинаций
// ==========================================


use std::sync::Arc;

use rfq_economics::api::EconomicsApi;
use rfq_economics::config::EngineConfig;
use rfq_economics::domain::types::{CandidateItemStatus, CandidateSetStatus};
use rfq_economics::repository::CandidateSetRepository;

use test_helpers::*;

fn api_over(conn: &std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>) -> EconomicsApi {
    EconomicsApi::new(
        conn.clone(),
        Arc::new(FixedRates::empty()),
        EngineConfig::default(),
    )
}

const PAYLOAD: &str = r#"{
    "key": "COMBO-1",
    "supplier_ids": [11, 12],
    "supplier_names": ["Альфа", "Бета"],
    "status": "Готов к экономике",
    "consolidation_hint": "высокий",
    "countries": ["CN", "TR"],
    "score": 0.82,
    "assignment_preview": [
        {"slot_key": "S1", "supplier_id": 11, "qty": "2", "goods_amount": "100,00",
         "goods_currency": "usd", "lead_time_days": 20, "origin_country": "cn"},
        {"slot_key": "S2", "supplier_id": 12}
    ]
}"#;

#[test]
fn test_import_is_idempotent_on_combo_hash() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_over(&conn);
    let repo = CandidateSetRepository::from_connection(conn.clone());

    let first = api.import_combinations(1, 10, PAYLOAD).unwrap();
    assert_eq!(first.created, 1);
    assert_eq!(first.updated, 0);
    assert_eq!(repo.count_sets(1, 10).unwrap(), 1);

    let second = api.import_combinations(1, 10, PAYLOAD).unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 1);
    // Число наборов не изменилось, id тот же
    assert_eq!(repo.count_sets(1, 10).unwrap(), 1);
    assert_eq!(first.candidate_set_ids, second.candidate_set_ids);
}

#[test]
fn test_reimport_fully_replaces_children() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_over(&conn);
    let repo = CandidateSetRepository::from_connection(conn.clone());

    let first = api.import_combinations(1, 10, PAYLOAD).unwrap();
    let set_id = &first.candidate_set_ids[0];
    assert_eq!(repo.count_children(set_id).unwrap(), (2, 2, 2));

    // Повторный импорт с одним поставщиком и одной позицией,
    // но тем же внешним ключом
    let smaller = r#"{
        "key": "COMBO-1",
        "supplier_ids": [11],
        "assignment_preview": [
            {"slot_key": "S1", "supplier_id": 11, "goods_amount": 55, "goods_currency": "EUR"}
        ]
    }"#;
    api.import_combinations(1, 10, smaller).unwrap();
    assert_eq!(repo.count_children(set_id).unwrap(), (1, 1, 1));
}

#[test]
fn test_classification_and_item_statuses() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_over(&conn);
    let repo = CandidateSetRepository::from_connection(conn.clone());

    let result = api.import_combinations(1, 10, PAYLOAD).unwrap();
    let set = repo
        .find_by_id(&result.candidate_set_ids[0])
        .unwrap()
        .unwrap();

    assert_eq!(set.status, CandidateSetStatus::SelectedForEconomics);
    assert_eq!(set.combo_hash, "COMBO-1");
    assert_eq!(set.supplier_count, 2);
    assert_eq!(set.country_count, 2);
    assert!(set.is_active);

    let items = repo.list_items(&set.candidate_set_id).unwrap();
    assert_eq!(items.len(), 2);

    let priced = items.iter().find(|i| i.supplier_id == Some(11)).unwrap();
    assert_eq!(priced.status, CandidateItemStatus::Candidate);
    assert_eq!(priced.goods_amount, Some(100.0));
    assert_eq!(priced.goods_currency, Some("USD".to_string()));
    assert_eq!(priced.qty, 2.0);
    assert_eq!(priced.origin_country, Some("CN".to_string()));

    let unpriced = items.iter().find(|i| i.supplier_id == Some(12)).unwrap();
    assert_eq!(unpriced.status, CandidateItemStatus::NoPrice);
    assert!(!unpriced.has_price);
}

#[test]
fn test_fallback_combo_hash_from_sorted_supplier_ids() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_over(&conn);
    let repo = CandidateSetRepository::from_connection(conn.clone());

    let payload = r#"{"supplier_ids": [30, 10, 20]}"#;
    api.import_combinations(1, 10, payload).unwrap();

    let set = repo.find_by_hash(1, 10, "10+20+30").unwrap();
    assert!(set.is_some());

    // Другой порядок поставщиков - та же комбинация
    let reordered = r#"{"supplier_ids": [20, 30, 10]}"#;
    let result = api.import_combinations(1, 10, reordered).unwrap();
    assert_eq!(result.updated, 1);
    assert_eq!(repo.count_sets(1, 10).unwrap(), 1);
}

#[test]
fn test_soft_invalidate_keeps_row() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_over(&conn);
    let repo = CandidateSetRepository::from_connection(conn.clone());

    let result = api.import_combinations(1, 10, PAYLOAD).unwrap();
    let set_id = &result.candidate_set_ids[0];

    repo.soft_invalidate(set_id).unwrap();
    let set = repo.find_by_id(set_id).unwrap().unwrap();
    assert!(!set.is_active);

    // Повторный импорт возвращает набор в строй
    api.import_combinations(1, 10, PAYLOAD).unwrap();
    let set = repo.find_by_id(set_id).unwrap().unwrap();
    assert!(set.is_active);
}

#[test]
fn test_invalid_input_is_rejected() {
    let (_db, conn) = create_test_db().unwrap();
    let api = api_over(&conn);

    assert!(api.import_combinations(0, 10, PAYLOAD).is_err());
    assert!(api.import_combinations(1, 10, "не json").is_err());
    assert!(api.import_combinations(1, 10, "42").is_err());
}
