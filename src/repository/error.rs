// ==========================================
// Экономика RFQ - ошибки слоя хранения
// ==========================================
// Инструмент: thiserror
// Важно: сюда попадают только инфраструктурные сбои;
// бизнес-пробелы данных (нет цены, нет курса) ошибками
// не являются и моделируются статусами/предупреждениями.
// ==========================================

use thiserror::Error;

/// Ошибки слоя хранения
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("запись не найдена: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("ошибка соединения с БД: {0}")]
    DatabaseConnectionError(String),

    #[error("ошибка получения блокировки соединения: {0}")]
    LockError(String),

    #[error("ошибка транзакции: {0}")]
    DatabaseTransactionError(String),

    #[error("ошибка запроса к БД: {0}")]
    DatabaseQueryError(String),

    #[error("нарушение уникальности: {0}")]
    UniqueConstraintViolation(String),

    #[error("нарушение внешнего ключа: {0}")]
    ForeignKeyViolation(String),

    /// Имя таблицы/витрины не прошло allow-list проверку
    #[error("недопустимый идентификатор: {0}")]
    InvalidIdentifier(String),

    #[error("ошибка валидации данных: {0}")]
    ValidationError(String),

    #[error("внутренняя ошибка: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Псевдоним Result слоя хранения
pub type RepositoryResult<T> = Result<T, RepositoryError>;

// ==========================================
// Allow-list идентификаторов для динамического SQL
// ==========================================

/// Проверка идентификатора перед подстановкой в SQL.
///
/// Динамический выбор витрины (norm/base) требует подстановки
/// имени, поэтому имя обязано состоять только из
/// [A-Za-z0-9_] и быть непустым.
pub fn validate_identifier(name: &str) -> RepositoryResult<&str> {
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Ok(name)
    } else {
        Err(RepositoryError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_accepts_plain_names() {
        assert!(validate_identifier("rfq_line_option_norm").is_ok());
        assert!(validate_identifier("v2").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_injection() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("x; DROP TABLE scenario").is_err());
        assert!(validate_identifier("таблица").is_err());
        assert!(validate_identifier("a-b").is_err());
    }
}
