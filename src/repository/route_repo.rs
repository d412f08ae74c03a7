// ==========================================
// Экономика RFQ - справочник шаблонов маршрутов
// ==========================================
// Для ядра экономики - только чтение: ведение коридоров
// и тарифов принадлежит внешнему CRUD-слою.
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use crate::domain::route::RouteTemplate;
use crate::domain::types::PricingModel;
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct RouteTemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteTemplateRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_template(row: &Row<'_>) -> rusqlite::Result<RouteTemplate> {
        Ok(RouteTemplate {
            route_template_id: row.get(0)?,
            title: row.get(1)?,
            origin_country: row.get(2)?,
            dest_country: row.get(3)?,
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
            eta_min_days: row.get(12)?,
            eta_max_days: row.get(13)?,
            is_active: row.get::<_, i64>(14)? != 0,
        })
    }

    const TEMPLATE_COLUMNS: &'static str = "route_template_id, title, origin_country, \
        dest_country, pricing_model, currency, fixed_cost, rate_per_kg, rate_per_cbm, \
        min_cost, markup_pct, markup_fixed, eta_min_days, eta_max_days, is_active";

    /// Шаблон маршрута по идентификатору
    pub fn find_by_id(&self, route_template_id: i64) -> RepositoryResult<Option<RouteTemplate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM route_template WHERE route_template_id = ?1",
            Self::TEMPLATE_COLUMNS
        ))?;
        let template = stmt
            .query_row(params![route_template_id], Self::map_template)
            .optional()?;
        Ok(template)
    }

    /// Активные шаблоны для страны происхождения
    pub fn list_active_for_origin(
        &self,
        origin_country: &str,
    ) -> RepositoryResult<Vec<RouteTemplate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM route_template \
             WHERE is_active = 1 AND (origin_country IS NULL OR origin_country = ?1) \
             ORDER BY route_template_id",
            Self::TEMPLATE_COLUMNS
        ))?;
        let templates = stmt
            .query_map(params![origin_country], Self::map_template)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    }
}
