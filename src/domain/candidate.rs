// ==========================================
// Экономика RFQ - наборы кандидатов
// ==========================================
// CandidateSet и его дети (поставщики/слоты/позиции).
// Импортируются из внешне оценённых "комбинаций";
// повторный импорт сопоставляется по combo_hash.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CandidateItemStatus, CandidateSetStatus, ConsolidationPotential, CoverageStatus,
};

// ==========================================
// CandidateSet - набор выбора поставщиков по строке RFQ
// ==========================================

/// Именованный набор выбора поставщиков по одной строке RFQ.
///
/// Жизненный цикл: создаётся/обновляется импортом, мягко
/// инвалидируется (`is_active = 0`), жёстко при повторном
/// импорте не удаляется.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSet {
    pub candidate_set_id: String,
    pub rfq_id: i64,
    pub rfq_item_id: i64,
    /// Ключ содержимого комбинации: внешний ключ либо fallback
    /// из отсортированных id поставщиков
    pub combo_hash: String,
    pub title: Option<String>,
    pub status: CandidateSetStatus,
    pub consolidation_potential: ConsolidationPotential,
    pub structure_coverage_pct: Option<f64>,
    pub priced_coverage_pct: Option<f64>,
    pub supplier_count: i64,
    pub country_count: i64,
    pub score: Option<f64>,
    pub oem_ok: bool,
    /// Снимок исходной комбинации как JSON
    pub payload_json: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// CandidateSupplier - поставщик в наборе
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSupplier {
    pub candidate_supplier_id: String,
    pub candidate_set_id: String,
    pub supplier_id: Option<i64>,
    pub supplier_name: Option<String>,
    pub country_code: Option<String>,
}

// ==========================================
// CandidateSlot - позиция спроса (элемент BOM)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub candidate_slot_id: String,
    pub candidate_set_id: String,
    pub slot_key: String,
    pub chosen_variant: Option<String>,
    pub coverage_status: CoverageStatus,
}

// ==========================================
// CandidateItem - атомарное оценённое предложение
// ==========================================

/// Атомарное предложение, привязанное к слоту и поставщику.
///
/// Инвариант: `status == Candidate` только когда заполнены
/// и `goods_amount`, и `goods_currency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    pub candidate_item_id: String,
    pub candidate_set_id: String,
    pub candidate_slot_id: Option<String>,
    pub supplier_id: Option<i64>,
    pub qty: f64,
    pub goods_amount: Option<f64>,
    pub goods_currency: Option<String>,
    pub lead_time_days: Option<i64>,
    pub moq: Option<f64>,
    pub lot_size: Option<f64>,
    pub packaging: Option<String>,
    pub origin_country: Option<String>,
    pub has_price: bool,
    pub is_oem_offer: bool,
    pub is_blocked: bool,
    pub status: CandidateItemStatus,
}

// ==========================================
// Входной контракт импорта - "комбинация"
// ==========================================

/// Одна внешне оценённая комбинация (граница импорта, JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationPayload {
    /// Внешний ключ комбинации; при отсутствии вычисляется
    /// fallback из supplier_ids
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub supplier_ids: Vec<i64>,
    #[serde(default)]
    pub supplier_names: Vec<String>,
    /// Текстовая подсказка статуса (русскоязычная, с потерями)
    #[serde(default)]
    pub status: Option<String>,
    /// Текстовая подсказка потенциала консолидации
    #[serde(default)]
    pub consolidation_hint: Option<String>,
    #[serde(default)]
    pub structure_coverage_pct: Option<f64>,
    #[serde(default)]
    pub priced_coverage_pct: Option<f64>,
    #[serde(default)]
    pub oem_ok: Option<bool>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub assignment_preview: Vec<AssignmentPreview>,
}

/// Назначение "позиция спроса -> поставщик" внутри комбинации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentPreview {
    #[serde(default)]
    pub slot_key: Option<String>,
    #[serde(default)]
    pub chosen_variant: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub qty: Option<serde_json::Value>,
    #[serde(default)]
    pub goods_amount: Option<serde_json::Value>,
    #[serde(default)]
    pub goods_currency: Option<String>,
    #[serde(default)]
    pub lead_time_days: Option<serde_json::Value>,
    #[serde(default)]
    pub moq: Option<serde_json::Value>,
    #[serde(default)]
    pub lot_size: Option<serde_json::Value>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub origin_country: Option<String>,
    #[serde(default)]
    pub is_oem_offer: Option<bool>,
    #[serde(default)]
    pub is_blocked: Option<bool>,
}
