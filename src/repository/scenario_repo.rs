// ==========================================
// Экономика RFQ - хранение сценариев
// ==========================================
// Снимок min-landed пишется атомарно: заголовок и все строки
// в одной транзакции, при сбое любой строки откатывается всё.
// Итоги пересчёта всегда перезаписываются целиком.
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use crate::domain::scenario::{Scenario, ScenarioGroupRoute, ScenarioLine, ScenarioOtherCost};
use crate::domain::types::{PricingModel, RouteCalcStatus, ScenarioStatus};
use crate::repository::candidate_repo::{now_ts, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// Итоговые значения сценария (полная перезапись)
#[derive(Debug, Clone)]
pub struct ScenarioTotalsUpdate {
    pub goods_total: Option<f64>,
    pub logistics_total: Option<f64>,
    pub duty_total: Option<f64>,
    pub other_total: Option<f64>,
    pub landed_total: Option<f64>,
    pub eta_best_days: Option<i64>,
    pub eta_worst_days: Option<i64>,
    pub warning_count: i64,
    pub status: ScenarioStatus,
}

// ==========================================
// ScenarioRepository - хранилище сценариев
// ==========================================
pub struct ScenarioRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScenarioRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_scenario(row: &Row<'_>) -> rusqlite::Result<Scenario> {
        Ok(Scenario {
            scenario_id: row.get(0)?,
            rfq_id: row.get(1)?,
            candidate_set_id: row.get(2)?,
            strategy: row.get(3)?,
            status: ScenarioStatus::from_db_str(&row.get::<_, String>(4)?),
            target_currency: row.get(5)?,
            goods_total: row.get(6)?,
            logistics_total: row.get(7)?,
            duty_total: row.get(8)?,
            other_total: row.get(9)?,
            landed_total: row.get(10)?,
            eta_best_days: row.get(11)?,
            eta_worst_days: row.get(12)?,
            warning_count: row.get(13)?,
            created_at: parse_ts(&row.get::<_, String>(14)?),
            updated_at: parse_ts(&row.get::<_, String>(15)?),
        })
    }

    const SCENARIO_COLUMNS: &'static str = "scenario_id, rfq_id, candidate_set_id, strategy, \
        status, target_currency, goods_total, logistics_total, duty_total, other_total, \
        landed_total, eta_best_days, eta_worst_days, warning_count, created_at, updated_at";

    /// Создать заголовок сценария
    pub fn create(&self, scenario: &Scenario) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_scenario(&conn, scenario)?;
        Ok(())
    }

    fn insert_scenario(conn: &Connection, scenario: &Scenario) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO scenario (
                scenario_id, rfq_id, candidate_set_id, strategy, status,
                target_currency, goods_total, logistics_total, duty_total,
                other_total, landed_total, eta_best_days, eta_worst_days,
                warning_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
            "#,
            params![
                scenario.scenario_id,
                scenario.rfq_id,
                scenario.candidate_set_id,
                scenario.strategy,
                scenario.status.to_db_str(),
                scenario.target_currency,
                scenario.goods_total,
                scenario.logistics_total,
                scenario.duty_total,
                scenario.other_total,
                scenario.landed_total,
                scenario.eta_best_days,
                scenario.eta_worst_days,
                scenario.warning_count,
                now_ts(),
            ],
        )?;
        Ok(())
    }

    /// Атомарно создать сценарий-снимок вместе со строками
    ///
    /// Либо записывается заголовок и все строки, либо ничего:
    /// сбой вставки любой строки откатывает и заголовок.
    /// Пустой список строк допустим (picked_lines = 0).
    pub fn create_with_lines(
        &self,
        scenario: &Scenario,
        lines: &[ScenarioLine],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| -> RepositoryResult<usize> {
            Self::insert_scenario(&conn, scenario)?;

            for line in lines {
                conn.execute(
                    r#"
                    INSERT INTO scenario_line (
                        scenario_line_id, scenario_id, rfq_item_id, response_line_id,
                        supplier_id, route_id, selection_key_raw, selection_key_norm,
                        landed_amount, landed_currency, eta_days
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                    params![
                        line.scenario_line_id,
                        line.scenario_id,
                        line.rfq_item_id,
                        line.response_line_id,
                        line.supplier_id,
                        line.route_id,
                        line.selection_key_raw,
                        line.selection_key_norm,
                        line.landed_amount,
                        line.landed_currency,
                        line.eta_days,
                    ],
                )?;
            }

            Ok(lines.len())
        })();

        match result {
            Ok(n) => {
                conn.execute("COMMIT", [])?;
                Ok(n)
            }
            Err(e) => {
                if let Err(rollback_err) = conn.execute("ROLLBACK", []) {
                    tracing::warn!("откат снимка сценария не удался: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Сценарий по идентификатору
    pub fn find_by_id(&self, scenario_id: &str) -> RepositoryResult<Option<Scenario>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM scenario WHERE scenario_id = ?1",
            Self::SCENARIO_COLUMNS
        ))?;
        let scenario = stmt
            .query_row(params![scenario_id], Self::map_scenario)
            .optional()?;
        Ok(scenario)
    }

    /// Строки снимка сценария
    pub fn list_lines(&self, scenario_id: &str) -> RepositoryResult<Vec<ScenarioLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                scenario_line_id, scenario_id, rfq_item_id, response_line_id,
                supplier_id, route_id, selection_key_raw, selection_key_norm,
                landed_amount, landed_currency, eta_days
            FROM scenario_line
            WHERE scenario_id = ?1
            ORDER BY rfq_item_id, selection_key_raw
            "#,
        )?;
        let lines = stmt
            .query_map(params![scenario_id], |row| {
                Ok(ScenarioLine {
                    scenario_line_id: row.get(0)?,
                    scenario_id: row.get(1)?,
                    rfq_item_id: row.get(2)?,
                    response_line_id: row.get(3)?,
                    supplier_id: row.get(4)?,
                    route_id: row.get(5)?,
                    selection_key_raw: row.get(6)?,
                    selection_key_norm: row.get(7)?,
                    landed_amount: row.get(8)?,
                    landed_currency: row.get(9)?,
                    eta_days: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lines)
    }

    fn map_group_route(row: &Row<'_>) -> rusqlite::Result<ScenarioGroupRoute> {
        Ok(ScenarioGroupRoute {
            group_route_id: row.get(0)?,
            scenario_id: row.get(1)?,
            shipment_group_id: row.get(2)?,
            route_template_id: row.get(3)?,
            pricing_model: row
                .get::<_, Option<String>>(4)?
                .as_deref()
                .and_then(PricingModel::from_db_str),
            currency: row.get(5)?,
            fixed_cost: row.get(6)?,
            rate_per_kg: row.get(7)?,
            rate_per_cbm: row.get(8)?,
            min_cost: row.get(9)?,
            markup_pct: row.get(10)?,
            markup_fixed: row.get(11)?,
            duty_amount: row.get(12)?,
            duty_currency: row.get(13)?,
            logistics_amount_calc: row.get(14)?,
            eta_min_days_calc: row.get(15)?,
            eta_max_days_calc: row.get(16)?,
            calc_status: RouteCalcStatus::from_db_str(&row.get::<_, String>(17)?),
            calc_message: row.get(18)?,
            selected_for_scenario: row.get::<_, i64>(19)? != 0,
        })
    }

    const ROUTE_COLUMNS: &'static str = "group_route_id, scenario_id, shipment_group_id, \
        route_template_id, pricing_model, currency, fixed_cost, rate_per_kg, rate_per_cbm, \
        min_cost, markup_pct, markup_fixed, duty_amount, duty_currency, logistics_amount_calc, \
        eta_min_days_calc, eta_max_days_calc, calc_status, calc_message, selected_for_scenario";

    /// Создать назначение маршрута группе
    pub fn insert_group_route(&self, route: &ScenarioGroupRoute) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO scenario_group_route (
                group_route_id, scenario_id, shipment_group_id, route_template_id,
                pricing_model, currency, fixed_cost, rate_per_kg, rate_per_cbm,
                min_cost, markup_pct, markup_fixed, duty_amount, duty_currency,
                logistics_amount_calc, eta_min_days_calc, eta_max_days_calc,
                calc_status, calc_message, selected_for_scenario
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
            params![
                route.group_route_id,
                route.scenario_id,
                route.shipment_group_id,
                route.route_template_id,
                route.pricing_model.map(|m| m.to_db_str()),
                route.currency,
                route.fixed_cost,
                route.rate_per_kg,
                route.rate_per_cbm,
                route.min_cost,
                route.markup_pct,
                route.markup_fixed,
                route.duty_amount,
                route.duty_currency,
                route.logistics_amount_calc,
                route.eta_min_days_calc,
                route.eta_max_days_calc,
                route.calc_status.to_db_str(),
                route.calc_message,
                route.selected_for_scenario as i64,
            ],
        )?;
        Ok(())
    }

    /// Маршруты групп сценария
    pub fn list_group_routes(&self, scenario_id: &str) -> RepositoryResult<Vec<ScenarioGroupRoute>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM scenario_group_route WHERE scenario_id = ?1 ORDER BY group_route_id",
            Self::ROUTE_COLUMNS
        ))?;
        let routes = stmt
            .query_map(params![scenario_id], Self::map_group_route)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(routes)
    }

    /// Маршрут группы по идентификатору
    pub fn find_group_route(
        &self,
        group_route_id: &str,
    ) -> RepositoryResult<Option<ScenarioGroupRoute>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM scenario_group_route WHERE group_route_id = ?1",
            Self::ROUTE_COLUMNS
        ))?;
        let route = stmt
            .query_row(params![group_route_id], Self::map_group_route)
            .optional()?;
        Ok(route)
    }

    /// Сохранить результат тарификации маршрута
    ///
    /// Статус и сообщение сохраняются дословно - оператор видит
    /// причину ошибки расчёта как есть.
    pub fn update_group_route_calc(
        &self,
        group_route_id: &str,
        calc_status: RouteCalcStatus,
        calc_message: Option<&str>,
        logistics_amount_calc: Option<f64>,
        eta_min_days_calc: Option<i64>,
        eta_max_days_calc: Option<i64>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE scenario_group_route SET
                calc_status = ?1, calc_message = ?2, logistics_amount_calc = ?3,
                eta_min_days_calc = ?4, eta_max_days_calc = ?5
            WHERE group_route_id = ?6
            "#,
            params![
                calc_status.to_db_str(),
                calc_message,
                logistics_amount_calc,
                eta_min_days_calc,
                eta_max_days_calc,
                group_route_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "scenario_group_route".to_string(),
                id: group_route_id.to_string(),
            });
        }
        Ok(())
    }

    /// Переключить участие группы в итогах сценария
    pub fn set_route_selected(
        &self,
        group_route_id: &str,
        selected: bool,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE scenario_group_route SET selected_for_scenario = ?1 WHERE group_route_id = ?2",
            params![selected as i64, group_route_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "scenario_group_route".to_string(),
                id: group_route_id.to_string(),
            });
        }
        Ok(())
    }

    /// Прочие затраты сценария
    pub fn list_other_costs(&self, scenario_id: &str) -> RepositoryResult<Vec<ScenarioOtherCost>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT other_cost_id, scenario_id, title, amount, currency, qty, enabled
            FROM scenario_other_cost
            WHERE scenario_id = ?1
            ORDER BY other_cost_id
            "#,
        )?;
        let costs = stmt
            .query_map(params![scenario_id], |row| {
                Ok(ScenarioOtherCost {
                    other_cost_id: row.get(0)?,
                    scenario_id: row.get(1)?,
                    title: row.get(2)?,
                    amount: row.get(3)?,
                    currency: row.get(4)?,
                    qty: row.get(5)?,
                    enabled: row.get::<_, i64>(6)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(costs)
    }

    /// Добавить прочую затрату
    pub fn insert_other_cost(&self, cost: &ScenarioOtherCost) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO scenario_other_cost (
                other_cost_id, scenario_id, title, amount, currency, qty, enabled
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                cost.other_cost_id,
                cost.scenario_id,
                cost.title,
                cost.amount,
                cost.currency,
                cost.qty,
                cost.enabled as i64,
            ],
        )?;
        Ok(())
    }

    /// Полная перезапись итогов сценария
    ///
    /// Пересчёт никогда не инкрементален - все итоговые поля
    /// обновляются за один UPDATE.
    pub fn update_totals(
        &self,
        scenario_id: &str,
        totals: &ScenarioTotalsUpdate,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE scenario SET
                goods_total = ?1, logistics_total = ?2, duty_total = ?3,
                other_total = ?4, landed_total = ?5, eta_best_days = ?6,
                eta_worst_days = ?7, warning_count = ?8, status = ?9,
                updated_at = ?10
            WHERE scenario_id = ?11
            "#,
            params![
                totals.goods_total,
                totals.logistics_total,
                totals.duty_total,
                totals.other_total,
                totals.landed_total,
                totals.eta_best_days,
                totals.eta_worst_days,
                totals.warning_count,
                totals.status.to_db_str(),
                now_ts(),
                scenario_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "scenario".to_string(),
                id: scenario_id.to_string(),
            });
        }
        Ok(())
    }
}
