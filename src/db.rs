// ==========================================
// Экономика RFQ - инициализация SQLite
// ==========================================
// Цели:
// - единые PRAGMA для всех Connection::open (внешние ключи,
//   busy_timeout), чтобы поведение не зависело от модуля
// - bootstrap схемы ядра: таблицы кандидатов/групп/сценариев
//   принадлежат этому ядру, отчётные витрины вариантов строк
//   создаются внешней системой (в тестах - как таблицы)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// busy_timeout по умолчанию (мс)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Версия схемы, ожидаемая текущим кодом
///
/// Используется для предупреждения при запуске на старой базе,
/// автоматическая миграция не выполняется.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// DDL ядра экономики
///
/// Все дочерние таблицы объявлены с ON DELETE CASCADE:
/// полная замена детей при повторном импорте и каскадное
/// удаление групп опираются на это.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS supplier (
    supplier_id INTEGER PRIMARY KEY,
    name TEXT,
    country_code TEXT
);

CREATE TABLE IF NOT EXISTS route_template (
    route_template_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    origin_country TEXT,
    dest_country TEXT,
    pricing_model TEXT,
    currency TEXT,
    fixed_cost REAL,
    rate_per_kg REAL,
    rate_per_cbm REAL,
    min_cost REAL,
    markup_pct REAL,
    markup_fixed REAL,
    eta_min_days INTEGER,
    eta_max_days INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS candidate_set (
    candidate_set_id TEXT PRIMARY KEY,
    rfq_id INTEGER NOT NULL,
    rfq_item_id INTEGER NOT NULL,
    combo_hash TEXT NOT NULL,
    title TEXT,
    status TEXT NOT NULL DEFAULT 'candidate',
    consolidation_potential TEXT NOT NULL DEFAULT 'unknown',
    structure_coverage_pct REAL,
    priced_coverage_pct REAL,
    supplier_count INTEGER NOT NULL DEFAULT 0,
    country_count INTEGER NOT NULL DEFAULT 0,
    score REAL,
    oem_ok INTEGER NOT NULL DEFAULT 0,
    payload_json TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (rfq_id, rfq_item_id, combo_hash)
);

CREATE TABLE IF NOT EXISTS candidate_supplier (
    candidate_supplier_id TEXT PRIMARY KEY,
    candidate_set_id TEXT NOT NULL
        REFERENCES candidate_set(candidate_set_id) ON DELETE CASCADE,
    supplier_id INTEGER,
    supplier_name TEXT,
    country_code TEXT
);

CREATE TABLE IF NOT EXISTS candidate_slot (
    candidate_slot_id TEXT PRIMARY KEY,
    candidate_set_id TEXT NOT NULL
        REFERENCES candidate_set(candidate_set_id) ON DELETE CASCADE,
    slot_key TEXT NOT NULL,
    chosen_variant TEXT,
    coverage_status TEXT NOT NULL DEFAULT 'empty'
);

CREATE TABLE IF NOT EXISTS candidate_item (
    candidate_item_id TEXT PRIMARY KEY,
    candidate_set_id TEXT NOT NULL
        REFERENCES candidate_set(candidate_set_id) ON DELETE CASCADE,
    candidate_slot_id TEXT,
    supplier_id INTEGER,
    qty REAL NOT NULL DEFAULT 1,
    goods_amount REAL,
    goods_currency TEXT,
    lead_time_days INTEGER,
    moq REAL,
    lot_size REAL,
    packaging TEXT,
    origin_country TEXT,
    has_price INTEGER NOT NULL DEFAULT 0,
    is_oem_offer INTEGER NOT NULL DEFAULT 0,
    is_blocked INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'no_price'
);

CREATE TABLE IF NOT EXISTS shipment_group (
    shipment_group_id TEXT PRIMARY KEY,
    rfq_id INTEGER NOT NULL,
    candidate_set_id TEXT NOT NULL
        REFERENCES candidate_set(candidate_set_id) ON DELETE CASCADE,
    origin_country TEXT NOT NULL,
    consolidation_key TEXT NOT NULL DEFAULT 'standard',
    data_readiness TEXT NOT NULL DEFAULT 'unknown',
    item_count INTEGER NOT NULL DEFAULT 0,
    priced_item_count INTEGER NOT NULL DEFAULT 0,
    weight_kg REAL,
    volume_cbm REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS shipment_group_item (
    shipment_group_id TEXT NOT NULL
        REFERENCES shipment_group(shipment_group_id) ON DELETE CASCADE,
    candidate_item_id TEXT NOT NULL
        REFERENCES candidate_item(candidate_item_id) ON DELETE CASCADE,
    qty_override REAL,
    included INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (shipment_group_id, candidate_item_id)
);

CREATE TABLE IF NOT EXISTS scenario (
    scenario_id TEXT PRIMARY KEY,
    rfq_id INTEGER NOT NULL,
    candidate_set_id TEXT,
    strategy TEXT NOT NULL DEFAULT 'MIN_LANDED',
    status TEXT NOT NULL DEFAULT 'draft',
    target_currency TEXT NOT NULL DEFAULT 'RUB',
    goods_total REAL,
    logistics_total REAL,
    duty_total REAL,
    other_total REAL,
    landed_total REAL,
    eta_best_days INTEGER,
    eta_worst_days INTEGER,
    warning_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS scenario_line (
    scenario_line_id TEXT PRIMARY KEY,
    scenario_id TEXT NOT NULL
        REFERENCES scenario(scenario_id) ON DELETE CASCADE,
    rfq_item_id INTEGER NOT NULL,
    response_line_id INTEGER,
    supplier_id INTEGER,
    route_id INTEGER,
    selection_key_raw TEXT NOT NULL,
    selection_key_norm TEXT NOT NULL,
    landed_amount REAL NOT NULL,
    landed_currency TEXT,
    eta_days INTEGER
);

CREATE TABLE IF NOT EXISTS scenario_group_route (
    group_route_id TEXT PRIMARY KEY,
    scenario_id TEXT NOT NULL
        REFERENCES scenario(scenario_id) ON DELETE CASCADE,
    shipment_group_id TEXT NOT NULL
        REFERENCES shipment_group(shipment_group_id) ON DELETE CASCADE,
    route_template_id INTEGER,
    pricing_model TEXT,
    currency TEXT,
    fixed_cost REAL,
    rate_per_kg REAL,
    rate_per_cbm REAL,
    min_cost REAL,
    markup_pct REAL,
    markup_fixed REAL,
    duty_amount REAL,
    duty_currency TEXT,
    logistics_amount_calc REAL,
    eta_min_days_calc INTEGER,
    eta_max_days_calc INTEGER,
    calc_status TEXT NOT NULL DEFAULT 'not_applicable',
    calc_message TEXT,
    selected_for_scenario INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS scenario_other_cost (
    other_cost_id TEXT PRIMARY KEY,
    scenario_id TEXT NOT NULL
        REFERENCES scenario(scenario_id) ON DELETE CASCADE,
    title TEXT,
    amount REAL,
    currency TEXT,
    qty REAL NOT NULL DEFAULT 1,
    enabled INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_candidate_set_rfq
    ON candidate_set(rfq_id, rfq_item_id);
CREATE INDEX IF NOT EXISTS idx_shipment_group_set
    ON shipment_group(rfq_id, candidate_set_id);
CREATE INDEX IF NOT EXISTS idx_scenario_rfq
    ON scenario(rfq_id);
"#;

/// Единые PRAGMA для соединения
///
/// foreign_keys и busy_timeout действуют на уровне отдельного
/// соединения, поэтому применяются при каждом открытии.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Открыть соединение SQLite с едиными настройками
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Создать таблицы ядра (идемпотентно) и зафиксировать версию схемы
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// Прочитать версию схемы (None, если таблицы ещё нет)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_read_schema_version_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
