//! User endpoints
//!
//! `/users/me` works on the acting user from the identity header; the
//! public `/users/{id}` view hides contact details and only shows what
//! a storefront profile page needs.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::repos::{NewUser, Profile, ProfileChanges, Reputation, ReviewRepo, User, UserDetail, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, ValidUuid};
use crate::http::routes::reviews::ReviewListItem;
use crate::http::server::AppState;
use lacquer_core::models::{Email, Paginated, Pagination, PaginationParams, Role, Username};

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

/// Profile update request; absent fields are left unchanged
#[derive(Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub whatsapp: Option<String>,
}

/// Own-account view
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username,
            email: u.email,
            phone: u.phone,
            role: u.role,
            is_verified: u.is_verified,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Profile fields
#[derive(Serialize)]
pub struct ProfileResponse {
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub whatsapp: Option<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            bio: p.bio,
            avatar_path: p.avatar_path,
            address: p.address,
            city: p.city,
            state: p.state,
            country: p.country,
            postal_code: p.postal_code,
            instagram: p.instagram,
            facebook: p.facebook,
            whatsapp: p.whatsapp,
        }
    }
}

/// Derived reputation fields
#[derive(Serialize)]
pub struct ReputationResponse {
    pub total_sales: i32,
    pub total_purchases: i32,
    pub positive_reviews: i32,
    pub negative_reviews: i32,
    pub average_rating: Decimal,
}

impl From<Reputation> for ReputationResponse {
    fn from(r: Reputation) -> Self {
        Self {
            total_sales: r.total_sales,
            total_purchases: r.total_purchases,
            positive_reviews: r.positive_reviews,
            negative_reviews: r.negative_reviews,
            average_rating: r.average_rating,
        }
    }
}

/// Full account view for the owner
#[derive(Serialize)]
pub struct UserDetailResponse {
    pub user: UserResponse,
    pub profile: ProfileResponse,
    pub reputation: ReputationResponse,
}

impl From<UserDetail> for UserDetailResponse {
    fn from(d: UserDetail) -> Self {
        Self {
            user: UserResponse::from(d.user),
            profile: ProfileResponse::from(d.profile),
            reputation: ReputationResponse::from(d.reputation),
        }
    }
}

/// Public profile view: no email, phone, or street address
#[derive(Serialize)]
pub struct PublicUserResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub is_verified: bool,
    pub member_since: String,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub whatsapp: Option<String>,
    pub reputation: ReputationResponse,
}

impl From<UserDetail> for PublicUserResponse {
    fn from(d: UserDetail) -> Self {
        Self {
            id: d.user.id.to_string(),
            username: d.user.username,
            role: d.user.role,
            is_verified: d.user.is_verified,
            member_since: d.user.created_at.to_rfc3339(),
            bio: d.profile.bio,
            avatar_path: d.profile.avatar_path,
            city: d.profile.city,
            state: d.profile.state,
            country: d.profile.country,
            instagram: d.profile.instagram,
            facebook: d.profile.facebook,
            whatsapp: d.profile.whatsapp,
            reputation: ReputationResponse::from(d.reputation),
        }
    }
}

/// POST /users - register an account
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserDetailResponse>), ApiError> {
    let role = match req.role.as_deref() {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::default(),
    };
    let new = NewUser {
        username: Username::new(&req.username)?,
        email: Email::new(&req.email)?,
        phone: req.phone,
        role,
    };

    let detail = UserRepo::new(&state.pool).register(new).await?;
    Ok((StatusCode::CREATED, Json(UserDetailResponse::from(detail))))
}

/// GET /users/me - the acting user's own account
async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let detail = UserRepo::new(&state.pool).get_detail(user_id).await?;
    Ok(Json(UserDetailResponse::from(detail)))
}

/// PUT /users/me - update the acting user's profile
async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let changes = ProfileChanges {
        bio: req.bio,
        avatar_path: req.avatar_path,
        address: req.address,
        city: req.city,
        state: req.state,
        country: req.country,
        postal_code: req.postal_code,
        instagram: req.instagram,
        facebook: req.facebook,
        whatsapp: req.whatsapp,
    };

    let profile = UserRepo::new(&state.pool)
        .update_profile(user_id, changes)
        .await?;
    Ok(Json(ProfileResponse::from(profile)))
}

/// GET /users/{id} - public profile
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<PublicUserResponse>, ApiError> {
    let detail = UserRepo::new(&state.pool).get_detail(id).await?;
    Ok(Json(PublicUserResponse::from(detail)))
}

/// GET /users/{id}/reviews - reviews received by a user
async fn user_reviews(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<ReviewListItem>>, ApiError> {
    // 404 for unknown users instead of an empty page
    UserRepo::new(&state.pool).get(id).await?;

    let page = Pagination::from(params);
    let reviews = ReviewRepo::new(&state.pool).list_received(id, page).await?;
    Ok(Json(reviews.map(ReviewListItem::from)))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(me).put(update_me))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/reviews", get(user_reviews))
}
