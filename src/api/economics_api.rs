// ==========================================
// Экономика RFQ - фасад ядра экономики
// ==========================================
// Тонкая обёртка над движком для внешнего CRUD/HTTP-слоя.
// Все ответы сериализуемы; бизнес-пробелы возвращаются как
// статусы и предупреждения, ошибками являются только
// инфраструктурные сбои.
// ==========================================

use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineConfig;
use crate::domain::line_option::LineOption;
use crate::domain::types::GroupingStrategy;
use crate::engine::fx::{CurrencyConverter, FxRateSource};
use crate::engine::{
    candidate_import, consolidation, min_landed, option_mapper, scenario_recalc,
};
use crate::repository::{
    CandidateSetRepository, LineOptionRepository, RouteTemplateRepository, ScenarioRepository,
    ShipmentGroupRepository,
};

// ==========================================
// Ответы фасада
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub created: usize,
    pub updated: usize,
    pub candidate_set_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingResponse {
    pub group_count: usize,
    pub group_ids: Vec<String>,
    pub skipped_blocked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutePricingResponse {
    pub group_route_id: String,
    pub calc_status: String,
    pub calc_message: Option<String>,
    pub logistics_amount: Option<f64>,
    pub eta_min_days: Option<i64>,
    pub eta_max_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecalcResponse {
    pub scenario_id: String,
    pub status: String,
    pub goods_total: f64,
    pub logistics_total: f64,
    pub duty_total: f64,
    pub other_total: f64,
    pub landed_total: f64,
    pub eta_best_days: Option<i64>,
    pub eta_worst_days: Option<i64>,
    pub selected_groups: usize,
    pub route_errors: i64,
    pub warning_count: i64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionResponse {
    pub scenario_id: String,
    pub picked_lines: usize,
    pub eligible_options: usize,
    pub filtered_out: usize,
}

// ==========================================
// EconomicsApi - фасад
// ==========================================
pub struct EconomicsApi {
    option_repo: LineOptionRepository,
    candidate_repo: CandidateSetRepository,
    group_repo: ShipmentGroupRepository,
    scenario_repo: ScenarioRepository,
    route_repo: RouteTemplateRepository,
    fx_source: Arc<dyn FxRateSource>,
    config: EngineConfig,
}

impl EconomicsApi {
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        fx_source: Arc<dyn FxRateSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            option_repo: LineOptionRepository::from_connection(conn.clone()),
            candidate_repo: CandidateSetRepository::from_connection(conn.clone()),
            group_repo: ShipmentGroupRepository::from_connection(conn.clone()),
            scenario_repo: ScenarioRepository::from_connection(conn.clone()),
            route_repo: RouteTemplateRepository::from_connection(conn),
            fx_source,
            config,
        }
    }

    /// Конвертер на одну операцию: кэш курсов не переживает
    /// вызов фасада
    fn converter(&self) -> CurrencyConverter {
        CurrencyConverter::with_force_refresh(self.fx_source.clone(), self.config.fx_force_refresh)
    }

    /// Варианты строк RFQ в каноническом отсортированном виде
    pub fn list_line_options(&self, rfq_id: i64) -> ApiResult<Vec<LineOption>> {
        let rows = self.option_repo.fetch_raw_rows(rfq_id)?;
        Ok(option_mapper::map_rows(&rows))
    }

    /// Импорт комбинаций кандидатов (JSON-объект или массив)
    pub fn import_combinations(
        &self,
        rfq_id: i64,
        rfq_item_id: i64,
        payload_json: &str,
    ) -> ApiResult<ImportResponse> {
        if rfq_id <= 0 || rfq_item_id <= 0 {
            return Err(ApiError::InvalidInput(
                "rfq_id и rfq_item_id должны быть положительными".to_string(),
            ));
        }

        let payloads = candidate_import::parse_payloads(payload_json)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let summary =
            candidate_import::import_combinations(&self.candidate_repo, rfq_id, rfq_item_id, &payloads)?;

        Ok(ImportResponse {
            created: summary.created,
            updated: summary.updated,
            candidate_set_ids: summary.set_ids,
        })
    }

    /// Построить группы отгрузки набора кандидатов
    pub fn build_shipment_groups(
        &self,
        rfq_id: i64,
        candidate_set_id: &str,
        replace_existing: bool,
    ) -> ApiResult<GroupingResponse> {
        let outcome = consolidation::build_shipment_groups(
            &self.candidate_repo,
            &self.group_repo,
            rfq_id,
            candidate_set_id,
            GroupingStrategy::Standard,
            replace_existing,
        )?;

        Ok(GroupingResponse {
            group_count: outcome.group_count,
            group_ids: outcome.group_ids,
            skipped_blocked: outcome.skipped_blocked,
        })
    }

    /// Тарифицировать маршрут группы и сохранить результат
    pub fn price_group_route(&self, group_route_id: &str) -> ApiResult<RoutePricingResponse> {
        let pricing = scenario_recalc::price_group_route(
            &self.scenario_repo,
            &self.group_repo,
            &self.route_repo,
            group_route_id,
        )?;

        Ok(RoutePricingResponse {
            group_route_id: pricing.group_route_id,
            calc_status: pricing.status.to_db_str().to_string(),
            calc_message: pricing.message,
            logistics_amount: pricing.logistics_amount,
            eta_min_days: pricing.eta_min_days,
            eta_max_days: pricing.eta_max_days,
        })
    }

    /// Пересчитать итоги сценария (полная перезапись)
    pub fn recalculate_scenario(&self, scenario_id: &str) -> ApiResult<RecalcResponse> {
        let converter = self.converter();
        let outcome = scenario_recalc::recalculate_scenario(
            &self.scenario_repo,
            &self.group_repo,
            &converter,
            scenario_id,
        )?;

        Ok(RecalcResponse {
            scenario_id: outcome.scenario_id,
            status: outcome.status.to_db_str().to_string(),
            goods_total: outcome.goods_total,
            logistics_total: outcome.logistics_total,
            duty_total: outcome.duty_total,
            other_total: outcome.other_total,
            landed_total: outcome.landed_total,
            eta_best_days: outcome.eta_best_days,
            eta_worst_days: outcome.eta_worst_days,
            selected_groups: outcome.selected_groups,
            route_errors: outcome.route_errors,
            warning_count: outcome.warning_count,
            warnings: outcome.warnings,
        })
    }

    /// Автоотбор минимального landed по RFQ
    pub fn auto_select_min_landed(
        &self,
        rfq_id: i64,
        strategy: Option<&str>,
    ) -> ApiResult<SelectionResponse> {
        let strategy = strategy.or(Some(self.config.min_landed_strategy_tag.as_str()));
        let outcome = min_landed::auto_select_min_landed(
            &self.option_repo,
            &self.scenario_repo,
            rfq_id,
            strategy,
            &self.config.default_target_currency,
        )?;

        Ok(SelectionResponse {
            scenario_id: outcome.scenario_id,
            picked_lines: outcome.picked_lines,
            eligible_options: outcome.eligible_options,
            filtered_out: outcome.filtered_out,
        })
    }
}
