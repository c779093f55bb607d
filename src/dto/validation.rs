//! Validation helpers for DTOs.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use axum_valid::{Valid, ValidRejection};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Highest jersey number a player can wear.
pub const MAX_JERSEY_NUMBER: u16 = 99;

/// JSON body checked with its `validator` rules. Both malformed JSON and rule
/// violations answer with the regular error body.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Valid(Json(payload)) = Valid::<Json<T>>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                ValidRejection::Valid(errors) => AppError::from(errors),
                ValidRejection::Inner(inner) => AppError::BadRequest(inner.body_text()),
            })?;
        Ok(Self(payload))
    }
}

/// Path parameters whose parse failures answer with the regular error body.
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Self(value))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

/// Rejects comments made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comments_are_rejected() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("  \n\t").is_err());
        assert!(validate_not_blank("jersey mix-up on player 9").is_ok());
    }
}
