// ==========================================
// Экономика RFQ - ядро расчёта landed-стоимости
// ==========================================
// Синхронное ядро закупочного бэкенда: варианты строк,
// наборы кандидатов, группы отгрузки, тарификация маршрутов
// и пересчёт сценариев в одной целевой валюте.
// ==========================================

// ==========================================
// Объявление модулей
// ==========================================

// Доменный слой - сущности и типы
pub mod domain;

// Слой хранения - доступ к данным
pub mod repository;

// Слой движка - бизнес-правила
pub mod engine;

// Конфигурация ядра
pub mod config;

// Инфраструктура БД (соединения/PRAGMA/схема)
pub mod db;

// Логирование
pub mod logging;

// API-слой - фасад для внешнего слоя
pub mod api;

// ==========================================
// Реэкспорт основных типов
// ==========================================

// Доменные типы
pub use domain::types::{
    CandidateItemStatus, CandidateSetStatus, ConsolidationPotential, CoverageStatus,
    DataReadiness, GroupingStrategy, PricingModel, RouteCalcStatus, ScenarioStatus,
};

// Доменные сущности
pub use domain::{
    CandidateItem, CandidateSet, CandidateSlot, CandidateSupplier, CombinationPayload,
    LineOption, RouteTemplate, Scenario, ScenarioGroupRoute, ScenarioLine, ScenarioOtherCost,
    ShipmentGroup,
};

// Движок
pub use engine::{
    auto_select_min_landed, build_shipment_groups, calc_route_amount, import_combinations,
    price_group_route, recalculate_scenario, CurrencyConverter, FxRate, FxRateSource,
};

// API
pub use api::{ApiError, ApiResult, EconomicsApi};

// Конфигурация
pub use config::EngineConfig;

// ==========================================
// Константы
// ==========================================

// Версия ядра
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Имя системы
pub const APP_NAME: &str = "Экономика RFQ";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
