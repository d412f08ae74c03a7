// ==========================================
// Экономика RFQ - слой движка
// ==========================================
// Бизнес-правила расчёта landed-стоимости.
// Красная линия: Engine не собирает SQL - весь доступ к
// данным через Repository; чистые правила отделены от
// оркестрации.
// ==========================================

pub mod candidate_import;
pub mod consolidation;
pub mod fx;
pub mod min_landed;
pub mod normalize;
pub mod option_mapper;
pub mod route_pricing;
pub mod scenario_recalc;

// Реэкспорт основных точек входа движка
pub use candidate_import::{import_combination, import_combinations, ImportSummary};
pub use consolidation::{build_shipment_groups, ConsolidationOutcome};
pub use fx::{Conversion, ConvertWarning, CurrencyConverter, FxRate, FxRateSource};
pub use min_landed::{auto_select_min_landed, SelectionOutcome};
pub use route_pricing::{calc_route_amount, RouteCalcInput, RouteCalcOutcome};
pub use scenario_recalc::{price_group_route, recalculate_scenario, RecalcOutcome};
