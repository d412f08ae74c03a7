// ==========================================
// Экономика RFQ - доменные типы
// ==========================================
// Формат сериализации: snake_case (как в БД)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Статус набора кандидатов (Candidate Set Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSetStatus {
    Draft,                // черновик
    Candidate,            // кандидат
    SelectedForEconomics, // выбран для расчёта экономики
    Archived,             // архив
}

impl fmt::Display for CandidateSetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl CandidateSetStatus {
    /// Разбор статуса из строки БД (неизвестное значение -> Candidate)
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "draft" => CandidateSetStatus::Draft,
            "selected_for_economics" => CandidateSetStatus::SelectedForEconomics,
            "archived" => CandidateSetStatus::Archived,
            _ => CandidateSetStatus::Candidate,
        }
    }

    /// Строка для хранения в БД
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CandidateSetStatus::Draft => "draft",
            CandidateSetStatus::Candidate => "candidate",
            CandidateSetStatus::SelectedForEconomics => "selected_for_economics",
            CandidateSetStatus::Archived => "archived",
        }
    }
}

// ==========================================
// Потенциал консолидации (Consolidation Potential)
// ==========================================
// Классификация из текстовых подсказок внешней системы,
// по умолчанию всегда Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationPotential {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for ConsolidationPotential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl ConsolidationPotential {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "high" => ConsolidationPotential::High,
            "medium" => ConsolidationPotential::Medium,
            "low" => ConsolidationPotential::Low,
            _ => ConsolidationPotential::Unknown,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConsolidationPotential::High => "high",
            ConsolidationPotential::Medium => "medium",
            ConsolidationPotential::Low => "low",
            ConsolidationPotential::Unknown => "unknown",
        }
    }
}

// ==========================================
// Статус покрытия слота (Slot Coverage Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Empty,        // позиция не закрыта
    Partial,      // закрыта частично
    CoveredPriced, // закрыта и оценена
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl CoverageStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "partial" => CoverageStatus::Partial,
            "covered_priced" => CoverageStatus::CoveredPriced,
            _ => CoverageStatus::Empty,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CoverageStatus::Empty => "empty",
            CoverageStatus::Partial => "partial",
            CoverageStatus::CoveredPriced => "covered_priced",
        }
    }
}

// ==========================================
// Статус позиции кандидата (Candidate Item Status)
// ==========================================
// Инвариант: Candidate только при наличии и цены, и валюты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateItemStatus {
    Candidate,
    NoPrice,
}

impl fmt::Display for CandidateItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl CandidateItemStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "candidate" => CandidateItemStatus::Candidate,
            _ => CandidateItemStatus::NoPrice,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            CandidateItemStatus::Candidate => "candidate",
            CandidateItemStatus::NoPrice => "no_price",
        }
    }
}

// ==========================================
// Готовность данных группы (Data Readiness)
// ==========================================
// Выводится из доли позиций с ценой: все/часть/ни одной
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataReadiness {
    Ready,
    Partial,
    Unknown,
}

impl fmt::Display for DataReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl DataReadiness {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "ready" => DataReadiness::Ready,
            "partial" => DataReadiness::Partial,
            _ => DataReadiness::Unknown,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DataReadiness::Ready => "ready",
            DataReadiness::Partial => "partial",
            DataReadiness::Unknown => "unknown",
        }
    }
}

// ==========================================
// Статус сценария (Scenario Status)
// ==========================================
// Переход draft -> calculated только когда все выбранные
// маршруты групп посчитаны без ошибок
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Draft,
    Calculated,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl ScenarioStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "calculated" => ScenarioStatus::Calculated,
            _ => ScenarioStatus::Draft,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Draft => "draft",
            ScenarioStatus::Calculated => "calculated",
        }
    }
}

// ==========================================
// Статус расчёта маршрута (Route Calc Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCalcStatus {
    Ok,
    Warning,       // расчёт выполнен, но часть входов отсутствовала
    Error,         // расчёт невозможен, amount = NULL
    NotApplicable, // маршрут не назначен
}

impl fmt::Display for RouteCalcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl RouteCalcStatus {
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "ok" => RouteCalcStatus::Ok,
            "warning" => RouteCalcStatus::Warning,
            "error" => RouteCalcStatus::Error,
            _ => RouteCalcStatus::NotApplicable,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RouteCalcStatus::Ok => "ok",
            RouteCalcStatus::Warning => "warning",
            RouteCalcStatus::Error => "error",
            RouteCalcStatus::NotApplicable => "not_applicable",
        }
    }
}

// ==========================================
// Модель тарификации маршрута (Pricing Model)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    Fixed,          // фиксированная ставка
    PerKg,          // за килограмм
    PerCbm,         // за кубометр
    PerKgOrCbmMax,  // максимум из весовой и объёмной ставок
    Hybrid,         // фикс + максимум из переменных частей
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl PricingModel {
    /// Разбор из строки БД; неизвестная модель -> None
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(PricingModel::Fixed),
            "per_kg" => Some(PricingModel::PerKg),
            "per_cbm" => Some(PricingModel::PerCbm),
            "per_kg_or_cbm_max" => Some(PricingModel::PerKgOrCbmMax),
            "hybrid" => Some(PricingModel::Hybrid),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PricingModel::Fixed => "fixed",
            PricingModel::PerKg => "per_kg",
            PricingModel::PerCbm => "per_cbm",
            PricingModel::PerKgOrCbmMax => "per_kg_or_cbm_max",
            PricingModel::Hybrid => "hybrid",
        }
    }
}

// ==========================================
// Стратегия группировки (Grouping Strategy)
// ==========================================
// Закрытый набор: сейчас одна стратегия "standard"
// (группировка по стране происхождения). Новые политики
// консолидации добавляются новыми вариантами, ядро цикла
// группировки не меняется.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    Standard,
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.consolidation_key())
    }
}

impl GroupingStrategy {
    /// Ключ консолидации, записываемый в shipment_group
    pub fn consolidation_key(&self) -> &'static str {
        match self {
            GroupingStrategy::Standard => "standard",
        }
    }

    pub fn from_db_str(_s: &str) -> Self {
        GroupingStrategy::Standard
    }
}
