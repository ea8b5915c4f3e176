use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

/// `GET /api/orders/{id}`: raw stored payload straight from the cache.
///
/// The durable store is never consulted here; absence in the cache IS
/// absence, because the cache mirrors every committed record.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if id.is_empty() {
        return Err(AppError::BadRequest("missing order id".into()));
    }

    match state.cache.get(&id) {
        Some(payload) => Ok((
            [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
            payload,
        )
            .into_response()),
        None => Err(AppError::NotFound(format!("order {id} not found"))),
    }
}

/// `GET /api/orders/` with an empty identifier segment.
pub async fn missing_order_id() -> AppError {
    AppError::BadRequest("missing order id".into())
}
