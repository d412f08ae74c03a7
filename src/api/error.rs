// ==========================================
// Экономика RFQ - ошибки API-слоя
// ==========================================
// Только инфраструктурные сбои. Пробелы бизнес-данных
// (нет курса, нет цены, нет входов тарифа) - не ошибки,
// они возвращаются как статусы и предупреждения в ответах.
// ==========================================

use thiserror::Error;

use crate::repository::error::RepositoryError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("некорректный вход: {0}")]
    InvalidInput(String),

    #[error("не найдено: {0}")]
    NotFound(String),

    #[error("ошибка хранилища: {0}")]
    Storage(String),

    #[error("внутренняя ошибка: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {}", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InvalidIdentifier(name) => {
                ApiError::InvalidInput(format!("недопустимый идентификатор: {}", name))
            }
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        // Репозиторные ошибки из anyhow-цепочки сохраняют класс
        match e.downcast::<RepositoryError>() {
            Ok(repo_err) => ApiError::from(repo_err),
            Err(other) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::InvalidInput(format!("некорректный JSON: {}", e))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_api_not_found() {
        let err = ApiError::from(RepositoryError::NotFound {
            entity: "scenario".to_string(),
            id: "s1".to_string(),
        });
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_anyhow_chain_preserves_repository_class() {
        let inner = RepositoryError::ValidationError("пусто".to_string());
        let err = ApiError::from(anyhow::Error::new(inner));
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
