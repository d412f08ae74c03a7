// ==========================================
// Экономика RFQ - хранение наборов кандидатов
// ==========================================
// Ключ содержимого: (rfq_id, rfq_item_id, combo_hash).
// Повторный импорт обновляет заголовок на месте и полностью
// заменяет детей (delete-then-reinsert) в одной транзакции.
// Красная линия: Repository не содержит бизнес-логики.
// ==========================================

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use crate::domain::candidate::{CandidateItem, CandidateSet, CandidateSlot, CandidateSupplier};
use crate::domain::types::{
    CandidateItemStatus, CandidateSetStatus, ConsolidationPotential, CoverageStatus,
};
use crate::repository::error::{RepositoryError, RepositoryResult};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Разбор текстовой метки времени из БД
pub(crate) fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .unwrap_or_else(|_| chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc())
}

pub(crate) fn now_ts() -> String {
    Utc::now().naive_utc().format(TS_FORMAT).to_string()
}

// ==========================================
// CandidateSetRepository - хранилище наборов
// ==========================================
pub struct CandidateSetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CandidateSetRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_set(row: &Row<'_>) -> rusqlite::Result<CandidateSet> {
        Ok(CandidateSet {
            candidate_set_id: row.get(0)?,
            rfq_id: row.get(1)?,
            rfq_item_id: row.get(2)?,
            combo_hash: row.get(3)?,
            title: row.get(4)?,
            status: CandidateSetStatus::from_db_str(&row.get::<_, String>(5)?),
            consolidation_potential: ConsolidationPotential::from_db_str(
                &row.get::<_, String>(6)?,
            ),
            structure_coverage_pct: row.get(7)?,
            priced_coverage_pct: row.get(8)?,
            supplier_count: row.get(9)?,
            country_count: row.get(10)?,
            score: row.get(11)?,
            oem_ok: row.get::<_, i64>(12)? != 0,
            payload_json: row.get(13)?,
            is_active: row.get::<_, i64>(14)? != 0,
            created_at: parse_ts(&row.get::<_, String>(15)?),
            updated_at: parse_ts(&row.get::<_, String>(16)?),
        })
    }

    const SET_COLUMNS: &'static str = "candidate_set_id, rfq_id, rfq_item_id, combo_hash, title, \
         status, consolidation_potential, structure_coverage_pct, priced_coverage_pct, \
         supplier_count, country_count, score, oem_ok, payload_json, is_active, \
         created_at, updated_at";

    /// Найти набор по ключу содержимого
    pub fn find_by_hash(
        &self,
        rfq_id: i64,
        rfq_item_id: i64,
        combo_hash: &str,
    ) -> RepositoryResult<Option<CandidateSet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM candidate_set WHERE rfq_id = ?1 AND rfq_item_id = ?2 AND combo_hash = ?3",
            Self::SET_COLUMNS
        ))?;
        let set = stmt
            .query_row(params![rfq_id, rfq_item_id, combo_hash], Self::map_set)
            .optional()?;
        Ok(set)
    }

    /// Найти набор по идентификатору
    pub fn find_by_id(&self, candidate_set_id: &str) -> RepositoryResult<Option<CandidateSet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM candidate_set WHERE candidate_set_id = ?1",
            Self::SET_COLUMNS
        ))?;
        let set = stmt
            .query_row(params![candidate_set_id], Self::map_set)
            .optional()?;
        Ok(set)
    }

    /// Число наборов по строке RFQ (для контроля идемпотентности)
    pub fn count_sets(&self, rfq_id: i64, rfq_item_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM candidate_set WHERE rfq_id = ?1 AND rfq_item_id = ?2",
            params![rfq_id, rfq_item_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Вставить или обновить набор вместе с детьми (полная замена)
    ///
    /// Одна транзакция: заголовок upsert по ключу содержимого,
    /// дети удаляются и вставляются заново. При ошибке - полный
    /// откат; ошибка самого отката проглатывается (логируется),
    /// наружу уходит исходная ошибка.
    ///
    /// # Возвращает
    /// - Ok((id, updated)): id набора и признак обновления
    pub fn upsert_with_children(
        &self,
        set: &CandidateSet,
        suppliers: &[CandidateSupplier],
        slots: &[CandidateSlot],
        items: &[CandidateItem],
    ) -> RepositoryResult<(String, bool)> {
        let existing = self.find_by_hash(set.rfq_id, set.rfq_item_id, &set.combo_hash)?;
        let conn = self.get_conn()?;

        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| -> RepositoryResult<(String, bool)> {
            let (set_id, updated) = match &existing {
                Some(found) => {
                    conn.execute(
                        r#"
                        UPDATE candidate_set SET
                            title = ?1, status = ?2, consolidation_potential = ?3,
                            structure_coverage_pct = ?4, priced_coverage_pct = ?5,
                            supplier_count = ?6, country_count = ?7, score = ?8,
                            oem_ok = ?9, payload_json = ?10, is_active = 1,
                            updated_at = ?11
                        WHERE candidate_set_id = ?12
                        "#,
                        params![
                            set.title,
                            set.status.to_db_str(),
                            set.consolidation_potential.to_db_str(),
                            set.structure_coverage_pct,
                            set.priced_coverage_pct,
                            set.supplier_count,
                            set.country_count,
                            set.score,
                            set.oem_ok as i64,
                            set.payload_json,
                            now_ts(),
                            found.candidate_set_id,
                        ],
                    )?;

                    // Полная замена детей, не merge
                    for table in ["candidate_item", "candidate_slot", "candidate_supplier"] {
                        conn.execute(
                            &format!("DELETE FROM {} WHERE candidate_set_id = ?1", table),
                            params![found.candidate_set_id],
                        )?;
                    }

                    (found.candidate_set_id.clone(), true)
                }
                None => {
                    conn.execute(
                        r#"
                        INSERT INTO candidate_set (
                            candidate_set_id, rfq_id, rfq_item_id, combo_hash, title,
                            status, consolidation_potential, structure_coverage_pct,
                            priced_coverage_pct, supplier_count, country_count, score,
                            oem_ok, payload_json, is_active, created_at, updated_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 1, ?15, ?15)
                        "#,
                        params![
                            set.candidate_set_id,
                            set.rfq_id,
                            set.rfq_item_id,
                            set.combo_hash,
                            set.title,
                            set.status.to_db_str(),
                            set.consolidation_potential.to_db_str(),
                            set.structure_coverage_pct,
                            set.priced_coverage_pct,
                            set.supplier_count,
                            set.country_count,
                            set.score,
                            set.oem_ok as i64,
                            set.payload_json,
                            now_ts(),
                        ],
                    )?;
                    (set.candidate_set_id.clone(), false)
                }
            };

            for supplier in suppliers {
                conn.execute(
                    r#"
                    INSERT INTO candidate_supplier (
                        candidate_supplier_id, candidate_set_id, supplier_id,
                        supplier_name, country_code
                    ) VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        supplier.candidate_supplier_id,
                        set_id,
                        supplier.supplier_id,
                        supplier.supplier_name,
                        supplier.country_code,
                    ],
                )?;
            }

            for slot in slots {
                conn.execute(
                    r#"
                    INSERT INTO candidate_slot (
                        candidate_slot_id, candidate_set_id, slot_key,
                        chosen_variant, coverage_status
                    ) VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        slot.candidate_slot_id,
                        set_id,
                        slot.slot_key,
                        slot.chosen_variant,
                        slot.coverage_status.to_db_str(),
                    ],
                )?;
            }

            for item in items {
                conn.execute(
                    r#"
                    INSERT INTO candidate_item (
                        candidate_item_id, candidate_set_id, candidate_slot_id,
                        supplier_id, qty, goods_amount, goods_currency,
                        lead_time_days, moq, lot_size, packaging, origin_country,
                        has_price, is_oem_offer, is_blocked, status
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                    "#,
                    params![
                        item.candidate_item_id,
                        set_id,
                        item.candidate_slot_id,
                        item.supplier_id,
                        item.qty,
                        item.goods_amount,
                        item.goods_currency,
                        item.lead_time_days,
                        item.moq,
                        item.lot_size,
                        item.packaging,
                        item.origin_country,
                        item.has_price as i64,
                        item.is_oem_offer as i64,
                        item.is_blocked as i64,
                        item.status.to_db_str(),
                    ],
                )?;
            }

            Ok((set_id, updated))
        })();

        match result {
            Ok(out) => {
                conn.execute("COMMIT", [])?;
                Ok(out)
            }
            Err(e) => {
                if let Err(rollback_err) = conn.execute("ROLLBACK", []) {
                    tracing::warn!("откат upsert набора кандидатов не удался: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Мягкая инвалидация набора (is_active = 0)
    pub fn soft_invalidate(&self, candidate_set_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE candidate_set SET is_active = 0, updated_at = ?1 WHERE candidate_set_id = ?2",
            params![now_ts(), candidate_set_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "candidate_set".to_string(),
                id: candidate_set_id.to_string(),
            });
        }
        Ok(())
    }

    /// Позиции набора
    pub fn list_items(&self, candidate_set_id: &str) -> RepositoryResult<Vec<CandidateItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                candidate_item_id, candidate_set_id, candidate_slot_id, supplier_id,
                qty, goods_amount, goods_currency, lead_time_days, moq, lot_size,
                packaging, origin_country, has_price, is_oem_offer, is_blocked, status
            FROM candidate_item
            WHERE candidate_set_id = ?1
            ORDER BY candidate_item_id
            "#,
        )?;

        let items = stmt
            .query_map(params![candidate_set_id], |row| {
                Ok(CandidateItem {
                    candidate_item_id: row.get(0)?,
                    candidate_set_id: row.get(1)?,
                    candidate_slot_id: row.get(2)?,
                    supplier_id: row.get(3)?,
                    qty: row.get(4)?,
                    goods_amount: row.get(5)?,
                    goods_currency: row.get(6)?,
                    lead_time_days: row.get(7)?,
                    moq: row.get(8)?,
                    lot_size: row.get(9)?,
                    packaging: row.get(10)?,
                    origin_country: row.get(11)?,
                    has_price: row.get::<_, i64>(12)? != 0,
                    is_oem_offer: row.get::<_, i64>(13)? != 0,
                    is_blocked: row.get::<_, i64>(14)? != 0,
                    status: CandidateItemStatus::from_db_str(&row.get::<_, String>(15)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Число детей набора (для контроля полной замены в тестах)
    pub fn count_children(&self, candidate_set_id: &str) -> RepositoryResult<(i64, i64, i64)> {
        let conn = self.get_conn()?;
        let mut counts = [0i64; 3];
        for (i, table) in ["candidate_supplier", "candidate_slot", "candidate_item"]
            .iter()
            .enumerate()
        {
            counts[i] = conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE candidate_set_id = ?1", table),
                params![candidate_set_id],
                |row| row.get(0),
            )?;
        }
        Ok((counts[0], counts[1], counts[2]))
    }

    /// Страна регистрации поставщика (fallback происхождения)
    pub fn supplier_country(&self, supplier_id: i64) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let country: Option<Option<String>> = conn
            .query_row(
                "SELECT country_code FROM supplier WHERE supplier_id = ?1",
                params![supplier_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(country.flatten())
    }
}
