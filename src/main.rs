// ==========================================
// Экономика RFQ - сервисный вход
// ==========================================
// Инициализация файла БД: создание схемы ядра и вывод
// версии схемы со счётчиками строк.
// ==========================================

use std::process::ExitCode;

use rfq_economics::{db, logging};

fn main() -> ExitCode {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", rfq_economics::APP_NAME, rfq_economics::VERSION);
    tracing::info!("==================================================");

    let db_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("использование: rfq-economics <путь-к-БД>");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(&db_path) {
        tracing::error!("инициализация не удалась: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(db_path: &str) -> anyhow::Result<()> {
    tracing::info!("база данных: {}", db_path);

    let conn = db::open_sqlite_connection(db_path)?;
    db::init_schema(&conn)?;

    match db::read_schema_version(&conn)? {
        Some(v) if v == db::CURRENT_SCHEMA_VERSION => {
            tracing::info!("версия схемы: {}", v);
        }
        Some(v) => {
            tracing::warn!(
                "версия схемы {} отличается от ожидаемой {}",
                v,
                db::CURRENT_SCHEMA_VERSION
            );
        }
        None => tracing::warn!("версия схемы не записана"),
    }

    for table in [
        "candidate_set",
        "shipment_group",
        "scenario",
        "route_template",
    ] {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        tracing::info!("{}: {} строк", table, count);
    }

    Ok(())
}
