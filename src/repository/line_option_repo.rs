// ==========================================
// Экономика RFQ - чтение вариантов строк (витрина)
// ==========================================
// LineOption - проекция на чтение. Источник выбирается на
// лету: нормализованная витрина rfq_line_option_norm, при её
// отсутствии - базовая rfq_line_option_base. Любое имя перед
// подстановкой в SQL проходит allow-list проверку.
// Красная линия: Repository не содержит бизнес-логики,
// маппинг в LineOption выполняет engine::option_mapper.
// ==========================================

use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::domain::line_option::RawOptionRow;
use crate::repository::error::{validate_identifier, RepositoryError, RepositoryResult};

/// Нормализованная витрина вариантов
pub const NORM_SOURCE: &str = "rfq_line_option_norm";
/// Базовая витрина вариантов (fallback)
pub const BASE_SOURCE: &str = "rfq_line_option_base";

/// Поля витрины: (поле RawOptionRow, кандидаты колонок по убыванию
/// приоритета). Колонки с суффиксом _norm предпочитаются базовым.
const COLUMN_CANDIDATES: &[(&str, &[&str])] = &[
    ("rfq_item_id", &["rfq_item_id"]),
    ("response_line_id", &["response_line_id"]),
    ("supplier_id", &["supplier_id"]),
    ("route_id", &["route_id"]),
    ("line_no", &["line_no"]),
    ("selection_key_norm", &["selection_key_norm"]),
    ("selection_key_raw", &["selection_key"]),
    ("supplier_name", &["supplier_name"]),
    ("route_name", &["route_name"]),
    ("goods_amount", &["goods_amount_norm", "goods_amount"]),
    ("goods_currency", &["goods_currency_norm", "goods_currency"]),
    ("logistics_amount", &["logistics_amount_norm", "logistics_amount"]),
    ("logistics_currency", &["logistics_currency_norm", "logistics_currency"]),
    ("duty_amount", &["duty_amount_norm", "duty_amount"]),
    ("duty_currency", &["duty_currency_norm", "duty_currency"]),
    ("landed_amount", &["landed_amount_norm", "landed_amount"]),
    ("landed_currency", &["landed_currency_norm", "landed_currency"]),
    ("eta_days", &["eta_days"]),
    ("supplier_score", &["supplier_score"]),
    ("fx_missing", &["fx_missing"]),
];

// ==========================================
// LineOptionRepository - доступ к витрине вариантов
// ==========================================
pub struct LineOptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LineOptionRepository {
    /// Создать репозиторий поверх готового соединения
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Существует ли таблица или view с данным именем
    fn relation_exists(conn: &Connection, name: &str) -> RepositoryResult<bool> {
        let name = validate_identifier(name)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table','view') AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Множество колонок таблицы/витрины
    fn relation_columns(conn: &Connection, name: &str) -> RepositoryResult<HashSet<String>> {
        let name = validate_identifier(name)?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", name))?;
        let cols = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(cols)
    }

    /// Выбрать источник: норм-витрина, иначе базовая
    ///
    /// # Возвращает
    /// - Ok(имя): валидированное имя источника
    /// - Err: ни одной витрины нет
    pub fn resolve_source(&self) -> RepositoryResult<&'static str> {
        let conn = self.get_conn()?;
        if Self::relation_exists(&conn, NORM_SOURCE)? {
            return Ok(NORM_SOURCE);
        }
        if Self::relation_exists(&conn, BASE_SOURCE)? {
            return Ok(BASE_SOURCE);
        }
        Err(RepositoryError::NotFound {
            entity: "line option source".to_string(),
            id: format!("{}|{}", NORM_SOURCE, BASE_SOURCE),
        })
    }

    /// Прочитать сырые строки вариантов по RFQ
    ///
    /// Отсутствующие в источнике колонки читаются как NULL -
    /// обе витрины обслуживаются одним запросом.
    ///
    /// # Параметры
    /// - rfq_id: идентификатор RFQ
    pub fn fetch_raw_rows(&self, rfq_id: i64) -> RepositoryResult<Vec<RawOptionRow>> {
        let source = self.resolve_source()?;
        let conn = self.get_conn()?;
        let available = Self::relation_columns(&conn, source)?;

        // Каждое поле превращается в колонку либо в NULL-заглушку,
        // чтобы индексы в row.get были стабильными
        let select_list: Vec<String> = COLUMN_CANDIDATES
            .iter()
            .map(|(field, candidates)| {
                match candidates.iter().find(|c| available.contains(**c)) {
                    Some(col) => format!("{} AS {}", col, field),
                    None => format!("NULL AS {}", field),
                }
            })
            .collect();

        let sql = format!(
            "SELECT {} FROM {} WHERE rfq_id = ?1",
            select_list.join(", "),
            validate_identifier(source)?
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![rfq_id], |row| {
                Ok(RawOptionRow {
                    rfq_item_id: row.get(0)?,
                    response_line_id: row.get(1)?,
                    supplier_id: row.get(2)?,
                    route_id: row.get(3)?,
                    line_no: row.get(4)?,
                    selection_key_norm: row.get(5)?,
                    selection_key_raw: row.get(6)?,
                    supplier_name: row.get(7)?,
                    route_name: row.get(8)?,
                    goods_amount: row.get(9)?,
                    goods_currency: row.get(10)?,
                    logistics_amount: row.get(11)?,
                    logistics_currency: row.get(12)?,
                    duty_amount: row.get(13)?,
                    duty_currency: row.get(14)?,
                    landed_amount: row.get(15)?,
                    landed_currency: row.get(16)?,
                    eta_days: row.get(17)?,
                    supplier_score: row.get(18)?,
                    fx_missing_flag: row.get(19)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Есть ли в источнике ссылка на строку ответа поставщика
    ///
    /// Если колонки response_line_id нет, селектор не требует её
    /// наличия у вариантов (см. фильтр min-landed).
    pub fn source_has_response_line(&self) -> RepositoryResult<bool> {
        let source = self.resolve_source()?;
        let conn = self.get_conn()?;
        let cols = Self::relation_columns(&conn, source)?;
        Ok(cols.contains("response_line_id"))
    }
}
