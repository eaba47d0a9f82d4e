//! Review endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{Review, ReviewRepo, ReviewWithParties};
use crate::http::error::ApiError;
use crate::http::extractors::CurrentUser;
use crate::http::server::AppState;
use lacquer_core::models::{Paginated, Pagination, PaginationParams, Rating};

/// Create review request
#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub reviewed_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Bare review payload, returned from create
#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub reviewer_id: String,
    pub reviewed_id: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id.to_string(),
            reviewer_id: r.reviewer_id.to_string(),
            reviewed_id: r.reviewed_id.to_string(),
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Review payload with both usernames for list views
#[derive(Serialize)]
pub struct ReviewListItem {
    pub id: String,
    pub reviewer_id: String,
    pub reviewer_username: String,
    pub reviewed_id: String,
    pub reviewed_username: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<ReviewWithParties> for ReviewListItem {
    fn from(r: ReviewWithParties) -> Self {
        Self {
            id: r.id.to_string(),
            reviewer_id: r.reviewer_id.to_string(),
            reviewer_username: r.reviewer_username,
            reviewed_id: r.reviewed_id.to_string(),
            reviewed_username: r.reviewed_username,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// POST /reviews - review another user
async fn create_review(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let rating = Rating::new(req.rating)?;
    let review = ReviewRepo::new(&state.pool)
        .create(user_id, req.reviewed_id, rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

/// GET /reviews/given - reviews the acting user wrote
async fn given_reviews(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ReviewListItem>>, ApiError> {
    let page = Pagination::from(params);
    let result = ReviewRepo::new(&state.pool).list_given(user_id, page).await?;
    Ok(Json(result.map(ReviewListItem::from)))
}

/// GET /reviews/received - reviews about the acting user
async fn received_reviews(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ReviewListItem>>, ApiError> {
    let page = Pagination::from(params);
    let result = ReviewRepo::new(&state.pool)
        .list_received(user_id, page)
        .await?;
    Ok(Json(result.map(ReviewListItem::from)))
}

/// Review routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/given", get(given_reviews))
        .route("/reviews/received", get(received_reviews))
}

#[cfg(test)]
mod tests {
    // Integration tests with test database
    // Run with: DATABASE_URL=... cargo test -p lacquer-server -- --ignored
}
