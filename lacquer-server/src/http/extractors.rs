//! Custom Axum extractors

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use lacquer_core::models::ValidationError;

const USER_ID_HEADER: &str = "x-user-id";

/// Acting user, taken from the `x-user-id` header the gateway sets.
/// Missing or malformed headers reject with 401.
#[derive(Debug)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(ApiError::Unauthorized {
                reason: "missing x-user-id header",
            })?
            .to_str()
            .map_err(|_| ApiError::Unauthorized {
                reason: "x-user-id header is not valid text",
            })?;

        let id = Uuid::parse_str(raw).map_err(|_| ApiError::Unauthorized {
            reason: "x-user-id must be a UUID",
        })?;

        Ok(Self(id))
    }
}

/// Optional identity for endpoints that anonymous visitors can hit,
/// like product pages. A present-but-malformed header still rejects.
#[derive(Debug)]
pub struct MaybeUser(pub Option<Uuid>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if parts.headers.get(USER_ID_HEADER).is_none() {
            return Ok(Self(None));
        }
        let CurrentUser(id) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(Self(Some(id)))
    }
}

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(USER_ID_HEADER, v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn current_user_reads_header() {
        let id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&id.to_string()));
        let CurrentUser(extracted) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted, id);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let mut parts = parts_with_header(None);
        let err = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn malformed_uuid_is_unauthorized() {
        let mut parts = parts_with_header(Some("not-a-uuid"));
        let err = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn maybe_user_tolerates_absence_but_not_garbage() {
        let mut parts = parts_with_header(None);
        let MaybeUser(none) = MaybeUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(none.is_none());

        let mut parts = parts_with_header(Some("garbage"));
        let err = MaybeUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }
}
