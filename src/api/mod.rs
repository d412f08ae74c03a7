// ==========================================
// Экономика RFQ - API-слой
// ==========================================
// Фасад для внешнего CRUD/HTTP-слоя.
// ==========================================

pub mod economics_api;
pub mod error;

// Реэкспорт основных типов
pub use economics_api::{
    EconomicsApi, GroupingResponse, ImportResponse, RecalcResponse, RoutePricingResponse,
    SelectionResponse,
};
pub use error::{ApiError, ApiResult};
