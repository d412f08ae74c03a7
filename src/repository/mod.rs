// ==========================================
// Экономика RFQ - слой хранения
// ==========================================
// Красная линия: Repository не содержит бизнес-логики.
// Все запросы параметризованы; динамические имена витрин
// проходят allow-list проверку (validate_identifier).
// ==========================================

pub mod candidate_repo;
pub mod error;
pub mod line_option_repo;
pub mod route_repo;
pub mod scenario_repo;
pub mod shipment_group_repo;

// Реэкспорт основных типов слоя
pub use candidate_repo::CandidateSetRepository;
pub use error::{validate_identifier, RepositoryError, RepositoryResult};
pub use line_option_repo::LineOptionRepository;
pub use route_repo::RouteTemplateRepository;
pub use scenario_repo::{ScenarioRepository, ScenarioTotalsUpdate};
pub use shipment_group_repo::{GroupItemLink, GroupedItem, ShipmentGroupRepository};
