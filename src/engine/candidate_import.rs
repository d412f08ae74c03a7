// ==========================================
// Экономика RFQ - импорт комбинаций кандидатов
// ==========================================
// Превращает внешне оценённые "комбинации" в наборы
// кандидатов. Импорт идемпотентен по ключу содержимого
// (rfq_id, rfq_item_id, combo_hash): повторный импорт
// обновляет заголовок и полностью заменяет детей.
// ==========================================

use std::collections::BTreeSet;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::candidate::{
    AssignmentPreview, CandidateItem, CandidateSet, CandidateSlot, CandidateSupplier,
    CombinationPayload,
};
use crate::domain::types::{
    CandidateItemStatus, CandidateSetStatus, ConsolidationPotential, CoverageStatus,
};
use crate::engine::normalize::{
    normalize_currency_str, to_decimal_or_null, to_positive_integer,
};
use crate::repository::CandidateSetRepository;

// ==========================================
// Классификация текстовых подсказок
// ==========================================

/// Статус набора из свободного текста.
///
/// Подсказка приходит из внешней системы с потерями, поэтому
/// сверка по ключевым словам, а не по точному значению.
/// Незнакомый текст деградирует в `candidate`.
pub fn classify_status(hint: Option<&str>) -> CandidateSetStatus {
    let hint = match hint {
        Some(h) => h.trim().to_lowercase(),
        None => return CandidateSetStatus::Candidate,
    };

    if hint.contains("готов") || hint.contains("ready") {
        CandidateSetStatus::SelectedForEconomics
    } else {
        // "кандидат"/"candidate" и всё незнакомое
        CandidateSetStatus::Candidate
    }
}

/// Потенциал консолидации из свободного текста, по той же
/// схеме деградации: незнакомое -> `unknown`
pub fn classify_potential(hint: Option<&str>) -> ConsolidationPotential {
    let hint = match hint {
        Some(h) => h.trim().to_lowercase(),
        None => return ConsolidationPotential::Unknown,
    };

    if hint.contains("высок") || hint.contains("high") {
        ConsolidationPotential::High
    } else if hint.contains("средн") || hint.contains("medium") {
        ConsolidationPotential::Medium
    } else if hint.contains("низк") || hint.contains("low") {
        ConsolidationPotential::Low
    } else {
        ConsolidationPotential::Unknown
    }
}

/// Fallback-ключ содержимого: отсортированные id поставщиков
/// через "+"
pub fn fallback_combo_hash(supplier_ids: &[i64]) -> String {
    let sorted: BTreeSet<i64> = supplier_ids.iter().copied().collect();
    sorted
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("+")
}

fn combo_hash_for(payload: &CombinationPayload) -> String {
    payload
        .key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_combo_hash(&payload.supplier_ids))
}

// ==========================================
// Итог импорта
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub candidate_set_id: String,
    pub updated: bool,
    pub item_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub set_ids: Vec<String>,
}

// ==========================================
// Импортёр
// ==========================================

/// Импортировать одну комбинацию как набор кандидатов
///
/// # Возвращает
/// - Ok(ImportOutcome): id набора и признак обновления
pub fn import_combination(
    repo: &CandidateSetRepository,
    rfq_id: i64,
    rfq_item_id: i64,
    payload: &CombinationPayload,
) -> anyhow::Result<ImportOutcome> {
    let combo_hash = combo_hash_for(payload);
    let now = Utc::now().naive_utc();

    let suppliers = build_suppliers(payload);
    let (slots, items) = build_slots_and_items(payload);

    let country_count = suppliers
        .iter()
        .filter_map(|s| s.country_code.as_deref())
        .chain(payload.countries.iter().map(String::as_str))
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .len() as i64;

    let set = CandidateSet {
        candidate_set_id: Uuid::new_v4().to_string(),
        rfq_id,
        rfq_item_id,
        combo_hash,
        title: payload
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        status: classify_status(payload.status.as_deref()),
        consolidation_potential: classify_potential(payload.consolidation_hint.as_deref()),
        structure_coverage_pct: payload.structure_coverage_pct,
        priced_coverage_pct: payload.priced_coverage_pct,
        supplier_count: suppliers.len() as i64,
        country_count,
        score: payload.score,
        oem_ok: payload.oem_ok.unwrap_or(false),
        payload_json: Some(serde_json::to_string(payload)?),
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let item_count = items.len();
    let (candidate_set_id, updated) =
        repo.upsert_with_children(&set, &suppliers, &slots, &items)?;

    tracing::info!(
        "импорт комбинации rfq={} item={} set={} updated={} позиций={}",
        rfq_id,
        rfq_item_id,
        candidate_set_id,
        updated,
        item_count
    );

    Ok(ImportOutcome {
        candidate_set_id,
        updated,
        item_count,
    })
}

/// Импортировать пакет комбинаций по одной строке RFQ
pub fn import_combinations(
    repo: &CandidateSetRepository,
    rfq_id: i64,
    rfq_item_id: i64,
    payloads: &[CombinationPayload],
) -> anyhow::Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for payload in payloads {
        let outcome = import_combination(repo, rfq_id, rfq_item_id, payload)?;
        if outcome.updated {
            summary.updated += 1;
        } else {
            summary.created += 1;
        }
        summary.set_ids.push(outcome.candidate_set_id);
    }
    Ok(summary)
}

fn build_suppliers(payload: &CombinationPayload) -> Vec<CandidateSupplier> {
    // Страны сопоставляются поставщикам по индексу только при
    // совпадении длин списков, иначе остаются незаполненными
    let countries_aligned = payload.countries.len() == payload.supplier_ids.len();

    payload
        .supplier_ids
        .iter()
        .enumerate()
        .map(|(i, supplier_id)| CandidateSupplier {
            candidate_supplier_id: Uuid::new_v4().to_string(),
            candidate_set_id: String::new(),
            supplier_id: Some(*supplier_id),
            supplier_name: payload.supplier_names.get(i).cloned(),
            country_code: if countries_aligned {
                payload
                    .countries
                    .get(i)
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty())
            } else {
                None
            },
        })
        .collect()
}

fn build_slots_and_items(
    payload: &CombinationPayload,
) -> (Vec<CandidateSlot>, Vec<CandidateItem>) {
    let mut slots: Vec<CandidateSlot> = Vec::new();
    let mut items: Vec<CandidateItem> = Vec::new();

    for preview in &payload.assignment_preview {
        let slot_id = preview
            .slot_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|key| match slots.iter().position(|s| s.slot_key == key) {
                Some(pos) => slots[pos].candidate_slot_id.clone(),
                None => {
                    let slot = CandidateSlot {
                        candidate_slot_id: Uuid::new_v4().to_string(),
                        candidate_set_id: String::new(),
                        slot_key: key.to_string(),
                        chosen_variant: preview.chosen_variant.clone(),
                        coverage_status: CoverageStatus::Empty,
                    };
                    let id = slot.candidate_slot_id.clone();
                    slots.push(slot);
                    id
                }
            });

        items.push(build_item(preview, slot_id));
    }

    // Покрытие слота выводится из его позиций: есть оценённая -
    // covered_priced, есть хоть какая-то - partial
    for slot in &mut slots {
        let slot_items: Vec<&CandidateItem> = items
            .iter()
            .filter(|it| it.candidate_slot_id.as_deref() == Some(&slot.candidate_slot_id))
            .collect();
        slot.coverage_status = if slot_items.iter().any(|it| it.has_price) {
            CoverageStatus::CoveredPriced
        } else if !slot_items.is_empty() {
            CoverageStatus::Partial
        } else {
            CoverageStatus::Empty
        };
    }

    (slots, items)
}

fn build_item(preview: &AssignmentPreview, slot_id: Option<String>) -> CandidateItem {
    let goods_amount = preview.goods_amount.as_ref().and_then(to_decimal_or_null);
    let goods_currency = preview
        .goods_currency
        .as_deref()
        .and_then(normalize_currency_str);

    // Инвариант: status=candidate только при цене И валюте
    let status = if goods_amount.is_some() && goods_currency.is_some() {
        CandidateItemStatus::Candidate
    } else {
        CandidateItemStatus::NoPrice
    };

    CandidateItem {
        candidate_item_id: Uuid::new_v4().to_string(),
        candidate_set_id: String::new(),
        candidate_slot_id: slot_id,
        supplier_id: preview.supplier_id,
        qty: preview
            .qty
            .as_ref()
            .and_then(to_decimal_or_null)
            .filter(|q| *q > 0.0)
            .unwrap_or(1.0),
        goods_amount,
        goods_currency,
        lead_time_days: preview.lead_time_days.as_ref().and_then(to_positive_integer),
        moq: preview.moq.as_ref().and_then(to_decimal_or_null),
        lot_size: preview.lot_size.as_ref().and_then(to_decimal_or_null),
        packaging: preview
            .packaging
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        origin_country: preview
            .origin_country
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty()),
        has_price: goods_amount.is_some(),
        is_oem_offer: preview.is_oem_offer.unwrap_or(false),
        is_blocked: preview.is_blocked.unwrap_or(false),
        status,
    }
}

/// Разобрать входной JSON импорта в список комбинаций
///
/// Принимает и массив, и одиночный объект.
pub fn parse_payloads(raw: &str) -> anyhow::Result<Vec<CombinationPayload>> {
    let value: Value = serde_json::from_str(raw)?;
    let payloads = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => anyhow::bail!("ожидается JSON-объект или массив комбинаций"),
    };
    Ok(payloads)
}
