// ==========================================
// Экономика RFQ - хранение групп отгрузки
// ==========================================
// Группы создаются пакетно из одного набора кандидатов.
// Replace-семантика: при запросе замены старые группы пары
// (rfq_id, candidate_set_id) удаляются в той же транзакции
// (связи позиций снимаются каскадом).
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use crate::domain::shipment::ShipmentGroup;
use crate::domain::types::DataReadiness;
use crate::repository::candidate_repo::{now_ts, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// Привязка позиции кандидата к группе отгрузки
#[derive(Debug, Clone)]
pub struct GroupItemLink {
    pub shipment_group_id: String,
    pub candidate_item_id: String,
    /// Переопределение количества; None - количество позиции
    pub qty_override: Option<f64>,
    pub included: bool,
}

/// Позиция группы вместе с данными для пересчёта
#[derive(Debug, Clone)]
pub struct GroupedItem {
    pub candidate_item_id: String,
    pub qty: f64,
    pub qty_override: Option<f64>,
    pub goods_amount: Option<f64>,
    pub goods_currency: Option<String>,
    pub lead_time_days: Option<i64>,
}

// ==========================================
// ShipmentGroupRepository - хранилище групп
// ==========================================
pub struct ShipmentGroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShipmentGroupRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_group(row: &Row<'_>) -> rusqlite::Result<ShipmentGroup> {
        Ok(ShipmentGroup {
            shipment_group_id: row.get(0)?,
            rfq_id: row.get(1)?,
            candidate_set_id: row.get(2)?,
            origin_country: row.get(3)?,
            consolidation_key: row.get(4)?,
            data_readiness: DataReadiness::from_db_str(&row.get::<_, String>(5)?),
            item_count: row.get(6)?,
            priced_item_count: row.get(7)?,
            weight_kg: row.get(8)?,
            volume_cbm: row.get(9)?,
            created_at: parse_ts(&row.get::<_, String>(10)?),
        })
    }

    const GROUP_COLUMNS: &'static str = "shipment_group_id, rfq_id, candidate_set_id, \
        origin_country, consolidation_key, data_readiness, item_count, priced_item_count, \
        weight_kg, volume_cbm, created_at";

    /// Пакетное создание групп с привязками позиций
    ///
    /// # Параметры
    /// - replace_existing: предварительно удалить все группы
    ///   пары (rfq_id, candidate_set_id)
    ///
    /// # Возвращает
    /// - Ok(usize): число созданных групп
    pub fn create_groups(
        &self,
        rfq_id: i64,
        candidate_set_id: &str,
        groups: &[ShipmentGroup],
        links: &[GroupItemLink],
        replace_existing: bool,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;

        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| -> RepositoryResult<usize> {
            if replace_existing {
                conn.execute(
                    "DELETE FROM shipment_group WHERE rfq_id = ?1 AND candidate_set_id = ?2",
                    params![rfq_id, candidate_set_id],
                )?;
            }

            for group in groups {
                conn.execute(
                    r#"
                    INSERT INTO shipment_group (
                        shipment_group_id, rfq_id, candidate_set_id, origin_country,
                        consolidation_key, data_readiness, item_count,
                        priced_item_count, weight_kg, volume_cbm, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                    params![
                        group.shipment_group_id,
                        group.rfq_id,
                        group.candidate_set_id,
                        group.origin_country,
                        group.consolidation_key,
                        group.data_readiness.to_db_str(),
                        group.item_count,
                        group.priced_item_count,
                        group.weight_kg,
                        group.volume_cbm,
                        now_ts(),
                    ],
                )?;
            }

            for link in links {
                conn.execute(
                    r#"
                    INSERT INTO shipment_group_item (
                        shipment_group_id, candidate_item_id, qty_override, included
                    ) VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        link.shipment_group_id,
                        link.candidate_item_id,
                        link.qty_override,
                        link.included as i64,
                    ],
                )?;
            }

            Ok(groups.len())
        })();

        match result {
            Ok(n) => {
                conn.execute("COMMIT", [])?;
                Ok(n)
            }
            Err(e) => {
                if let Err(rollback_err) = conn.execute("ROLLBACK", []) {
                    tracing::warn!("откат создания групп отгрузки не удался: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Группы по паре (rfq_id, candidate_set_id)
    pub fn list_groups(
        &self,
        rfq_id: i64,
        candidate_set_id: &str,
    ) -> RepositoryResult<Vec<ShipmentGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM shipment_group \
             WHERE rfq_id = ?1 AND candidate_set_id = ?2 \
             ORDER BY origin_country",
            Self::GROUP_COLUMNS
        ))?;
        let groups = stmt
            .query_map(params![rfq_id, candidate_set_id], Self::map_group)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// Группа по идентификатору
    pub fn find_by_id(&self, shipment_group_id: &str) -> RepositoryResult<Option<ShipmentGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM shipment_group WHERE shipment_group_id = ?1",
            Self::GROUP_COLUMNS
        ))?;
        let group = stmt
            .query_row(params![shipment_group_id], Self::map_group)
            .optional()?;
        Ok(group)
    }

    /// Удаление группы (привязки позиций снимаются каскадом)
    pub fn delete_group(&self, shipment_group_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM shipment_group WHERE shipment_group_id = ?1",
            params![shipment_group_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "shipment_group".to_string(),
                id: shipment_group_id.to_string(),
            });
        }
        Ok(())
    }

    /// Включённые позиции группы с данными для пересчёта
    pub fn list_included_items(
        &self,
        shipment_group_id: &str,
    ) -> RepositoryResult<Vec<GroupedItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                i.candidate_item_id, i.qty, l.qty_override,
                i.goods_amount, i.goods_currency, i.lead_time_days
            FROM shipment_group_item l
            JOIN candidate_item i ON i.candidate_item_id = l.candidate_item_id
            WHERE l.shipment_group_id = ?1 AND l.included = 1
            ORDER BY i.candidate_item_id
            "#,
        )?;

        let items = stmt
            .query_map(params![shipment_group_id], |row| {
                Ok(GroupedItem {
                    candidate_item_id: row.get(0)?,
                    qty: row.get(1)?,
                    qty_override: row.get(2)?,
                    goods_amount: row.get(3)?,
                    goods_currency: row.get(4)?,
                    lead_time_days: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }
}
