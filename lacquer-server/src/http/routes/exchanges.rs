//! Exchange endpoints
//!
//! Creating an exchange is the only POST with a body; the lifecycle
//! moves through bare POST actions so the transition rules live in one
//! place, the repository.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{ExchangeRepo, ExchangeRequest, ExchangeWithProducts};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::server::AppState;
use lacquer_core::models::{Paginated, Pagination, PaginationParams};

/// Create exchange request
#[derive(Deserialize)]
pub struct CreateExchangeRequest {
    pub offered_product_id: Uuid,
    pub requested_product_id: Uuid,
    pub message: Option<String>,
}

/// Bare exchange payload, returned from create and transitions
#[derive(Serialize)]
pub struct ExchangeResponse {
    pub id: String,
    pub offered_product_id: String,
    pub requested_product_id: String,
    pub requester_id: String,
    pub owner_id: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ExchangeRequest> for ExchangeResponse {
    fn from(e: ExchangeRequest) -> Self {
        Self {
            id: e.id.to_string(),
            offered_product_id: e.offered_product_id.to_string(),
            requested_product_id: e.requested_product_id.to_string(),
            requester_id: e.requester_id.to_string(),
            owner_id: e.owner_id.to_string(),
            message: e.message,
            status: e.status,
            created_at: e.created_at.to_rfc3339(),
            updated_at: e.updated_at.to_rfc3339(),
        }
    }
}

/// Exchange payload with both product titles for inbox views
#[derive(Serialize)]
pub struct ExchangeListItem {
    pub id: String,
    pub offered_product_id: String,
    pub offered_title: String,
    pub requested_product_id: String,
    pub requested_title: String,
    pub requester_id: String,
    pub owner_id: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ExchangeWithProducts> for ExchangeListItem {
    fn from(e: ExchangeWithProducts) -> Self {
        Self {
            id: e.id.to_string(),
            offered_product_id: e.offered_product_id.to_string(),
            offered_title: e.offered_title,
            requested_product_id: e.requested_product_id.to_string(),
            requested_title: e.requested_title,
            requester_id: e.requester_id.to_string(),
            owner_id: e.owner_id.to_string(),
            message: e.message,
            status: e.status,
            created_at: e.created_at.to_rfc3339(),
            updated_at: e.updated_at.to_rfc3339(),
        }
    }
}

/// POST /exchanges - propose an exchange
async fn create_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateExchangeRequest>,
) -> Result<(StatusCode, Json<ExchangeResponse>), ApiError> {
    let exchange = ExchangeRepo::new(&state.pool)
        .create(
            user_id,
            req.offered_product_id,
            req.requested_product_id,
            req.message,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ExchangeResponse::from(exchange))))
}

/// GET /exchanges/sent - exchanges the user proposed
async fn sent_exchanges(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ExchangeListItem>>, ApiError> {
    let page = Pagination::from(params);
    let result = ExchangeRepo::new(&state.pool).list_sent(user_id, page).await?;
    Ok(Json(result.map(ExchangeListItem::from)))
}

/// GET /exchanges/received - exchanges aimed at the user's products
async fn received_exchanges(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ExchangeListItem>>, ApiError> {
    let page = Pagination::from(params);
    let result = ExchangeRepo::new(&state.pool)
        .list_received(user_id, page)
        .await?;
    Ok(Json(result.map(ExchangeListItem::from)))
}

/// GET /exchanges/{id} - one exchange, participants only
async fn get_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ExchangeListItem>, ApiError> {
    let exchange = ExchangeRepo::new(&state.pool).get(id, user_id).await?;
    Ok(Json(ExchangeListItem::from(exchange)))
}

/// POST /exchanges/{id}/accept - owner accepts
async fn accept_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ExchangeResponse>, ApiError> {
    let exchange = ExchangeRepo::new(&state.pool).accept(id, user_id).await?;
    Ok(Json(ExchangeResponse::from(exchange)))
}

/// POST /exchanges/{id}/reject - owner rejects
async fn reject_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ExchangeResponse>, ApiError> {
    let exchange = ExchangeRepo::new(&state.pool).reject(id, user_id).await?;
    Ok(Json(ExchangeResponse::from(exchange)))
}

/// POST /exchanges/{id}/cancel - requester withdraws
async fn cancel_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ExchangeResponse>, ApiError> {
    let exchange = ExchangeRepo::new(&state.pool).cancel(id, user_id).await?;
    Ok(Json(ExchangeResponse::from(exchange)))
}

/// POST /exchanges/{id}/complete - either side confirms the swap happened
async fn complete_exchange(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ExchangeResponse>, ApiError> {
    let exchange = ExchangeRepo::new(&state.pool).complete(id, user_id).await?;
    Ok(Json(ExchangeResponse::from(exchange)))
}

/// Exchange routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exchanges", post(create_exchange))
        .route("/exchanges/sent", get(sent_exchanges))
        .route("/exchanges/received", get(received_exchanges))
        .route("/exchanges/{id}", get(get_exchange))
        .route("/exchanges/{id}/accept", post(accept_exchange))
        .route("/exchanges/{id}/reject", post(reject_exchange))
        .route("/exchanges/{id}/cancel", post(cancel_exchange))
        .route("/exchanges/{id}/complete", post(complete_exchange))
}

#[cfg(test)]
mod tests {
    // Integration tests with test database
    // Run with: DATABASE_URL=... cargo test -p lacquer-server -- --ignored
}
