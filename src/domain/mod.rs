// ==========================================
// Экономика RFQ - доменный слой
// ==========================================
// Сущности и закрытые перечисления предметной области.
// Красная линия: домен не знает про SQL и сериализацию витрин.
// ==========================================

pub mod candidate;
pub mod line_option;
pub mod route;
pub mod scenario;
pub mod shipment;
pub mod types;

// Реэкспорт основных сущностей
pub use candidate::{
    AssignmentPreview, CandidateItem, CandidateSet, CandidateSlot, CandidateSupplier,
    CombinationPayload,
};
pub use line_option::{LineOption, RawOptionRow};
pub use route::RouteTemplate;
pub use scenario::{Scenario, ScenarioGroupRoute, ScenarioLine, ScenarioOtherCost};
pub use shipment::ShipmentGroup;
pub use types::{
    CandidateItemStatus, CandidateSetStatus, ConsolidationPotential, CoverageStatus,
    DataReadiness, GroupingStrategy, PricingModel, RouteCalcStatus, ScenarioStatus,
};
