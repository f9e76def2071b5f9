//! The authenticated caller, as resolved by the upstream gateway.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";

/// Present in a handler means the gateway attached a numeric user id.
#[derive(Debug, Clone)]
pub struct Caller {
  pub user_id:  i64,
  pub username: Option<String>,
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let header = |name: &str| {
      parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    };
    let user_id = header(USER_ID_HEADER)
      .and_then(|v| v.parse().ok())
      .ok_or(ApiError::Unauthorized)?;
    let username = header(USERNAME_HEADER).map(str::to_owned);
    Ok(Self { user_id, username })
  }
}
