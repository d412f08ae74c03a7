// ==========================================
// Экономика RFQ - консолидация групп отгрузки
// ==========================================
// Разбивает неблокированные позиции набора кандидатов на
// группы по стране происхождения. Происхождение позиции:
// страна позиции -> страна регистрации поставщика -> "UN".
// ==========================================

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::candidate::CandidateItem;
use crate::domain::shipment::ShipmentGroup;
use crate::domain::types::{DataReadiness, GroupingStrategy};
use crate::repository::{
    CandidateSetRepository, GroupItemLink, RepositoryError, ShipmentGroupRepository,
};

/// Код страны-заглушки для неизвестного происхождения
pub const UNKNOWN_ORIGIN: &str = "UN";

#[derive(Debug, Clone)]
pub struct ConsolidationOutcome {
    pub group_count: usize,
    pub group_ids: Vec<String>,
    pub skipped_blocked: usize,
}

/// Готовность данных группы по доле оценённых позиций
pub fn readiness_of(item_count: usize, priced_count: usize) -> DataReadiness {
    if item_count == 0 || priced_count == 0 {
        DataReadiness::Unknown
    } else if priced_count == item_count {
        DataReadiness::Ready
    } else {
        DataReadiness::Partial
    }
}

/// Страна происхождения позиции с деградацией до "UN"
fn resolve_origin(
    candidate_repo: &CandidateSetRepository,
    item: &CandidateItem,
) -> anyhow::Result<String> {
    if let Some(country) = item.origin_country.as_deref() {
        let trimmed = country.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_uppercase());
        }
    }

    if let Some(supplier_id) = item.supplier_id {
        if let Some(country) = candidate_repo.supplier_country(supplier_id)? {
            let trimmed = country.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_uppercase());
            }
        }
    }

    Ok(UNKNOWN_ORIGIN.to_string())
}

/// Построить группы отгрузки для набора кандидатов
///
/// # Параметры
/// - strategy: стратегия консолидации (ключ группы)
/// - replace_existing: заменить старые группы пары
///   (rfq_id, candidate_set_id)
///
/// # Возвращает
/// - Ok(ConsolidationOutcome)
/// - Err: набор не найден либо сбой хранилища
pub fn build_shipment_groups(
    candidate_repo: &CandidateSetRepository,
    group_repo: &ShipmentGroupRepository,
    rfq_id: i64,
    candidate_set_id: &str,
    strategy: GroupingStrategy,
    replace_existing: bool,
) -> anyhow::Result<ConsolidationOutcome> {
    let set = candidate_repo
        .find_by_id(candidate_set_id)?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "candidate_set".to_string(),
            id: candidate_set_id.to_string(),
        })?;

    let items = candidate_repo.list_items(&set.candidate_set_id)?;
    let skipped_blocked = items.iter().filter(|it| it.is_blocked).count();

    // BTreeMap даёт детерминированный порядок стран
    let mut by_origin: BTreeMap<String, Vec<&CandidateItem>> = BTreeMap::new();
    for item in items.iter().filter(|it| !it.is_blocked) {
        let origin = resolve_origin(candidate_repo, item)?;
        by_origin.entry(origin).or_default().push(item);
    }

    let now = Utc::now().naive_utc();
    let mut groups: Vec<ShipmentGroup> = Vec::new();
    let mut links: Vec<GroupItemLink> = Vec::new();

    for (origin_country, origin_items) in &by_origin {
        let priced = origin_items.iter().filter(|it| it.has_price).count();
        let group = ShipmentGroup {
            shipment_group_id: Uuid::new_v4().to_string(),
            rfq_id,
            candidate_set_id: set.candidate_set_id.clone(),
            origin_country: origin_country.clone(),
            consolidation_key: strategy.consolidation_key().to_string(),
            data_readiness: readiness_of(origin_items.len(), priced),
            item_count: origin_items.len() as i64,
            priced_item_count: priced as i64,
            weight_kg: None,
            volume_cbm: None,
            created_at: now,
        };

        for item in origin_items {
            links.push(GroupItemLink {
                shipment_group_id: group.shipment_group_id.clone(),
                candidate_item_id: item.candidate_item_id.clone(),
                qty_override: None,
                included: true,
            });
        }

        groups.push(group);
    }

    let group_ids: Vec<String> = groups.iter().map(|g| g.shipment_group_id.clone()).collect();
    let group_count = group_repo.create_groups(
        rfq_id,
        &set.candidate_set_id,
        &groups,
        &links,
        replace_existing,
    )?;

    tracing::info!(
        "консолидация set={}: групп={} пропущено блокированных={}",
        candidate_set_id,
        group_count,
        skipped_blocked
    );

    Ok(ConsolidationOutcome {
        group_count,
        group_ids,
        skipped_blocked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_fractions() {
        assert_eq!(readiness_of(3, 3), DataReadiness::Ready);
        assert_eq!(readiness_of(3, 1), DataReadiness::Partial);
        assert_eq!(readiness_of(3, 0), DataReadiness::Unknown);
        assert_eq!(readiness_of(0, 0), DataReadiness::Unknown);
    }
}
