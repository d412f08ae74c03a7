// ==========================================
// Экономика RFQ - группы отгрузки
// ==========================================
// ShipmentGroup - консолидация позиций кандидатов с общей
// страной происхождения для совместной тарификации логистики.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::DataReadiness;

/// Группа отгрузки одного набора кандидатов.
///
/// Жизненный цикл: создаётся пакетно из позиций одного
/// CandidateSet (при replace-семантике старые группы пары
/// `(rfq_id, candidate_set_id)` предварительно удаляются);
/// удаление каскадно снимает привязки позиций.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentGroup {
    pub shipment_group_id: String,
    pub rfq_id: i64,
    pub candidate_set_id: String,
    /// Страна происхождения; "UN" - страна неизвестна
    pub origin_country: String,
    /// Ключ консолидации (GroupingStrategy::consolidation_key)
    pub consolidation_key: String,
    pub data_readiness: DataReadiness,
    pub item_count: i64,
    pub priced_item_count: i64,
    /// Вес и объём для тарификации маршрута
    pub weight_kg: Option<f64>,
    pub volume_cbm: Option<f64>,
    pub created_at: NaiveDateTime,
}
