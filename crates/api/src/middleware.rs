use std::str::FromStr;

use anyhow::anyhow;
use axum::body::Body;
use axum::http::StatusCode;
use axum::{extract::Request, response::Response};
use axum::middleware::Next;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use promptdraw_runtime::UserRole;

use crate::response::AppError;

/// Set by the upstream gateway once it has authenticated the caller.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

fn header_str<'a>(req: &'a Request, name: &str) -> Result<Option<&'a str>, AppError> {
    req.headers()
        .get(name)
        .map(|value| value.to_str()
            .map_err(|_| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("invalid {} header", name))))
        .transpose()
}

pub async fn authenticate(
    mut req: Request, next: Next
) -> Result<Response<Body>, AppError> {
    let user_id = header_str(&req, USER_ID_HEADER)?
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("missing {} header", USER_ID_HEADER)))
        .and_then(|raw| Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("invalid {} header", USER_ID_HEADER)))
        )?;

    let role = match header_str(&req, USER_ROLE_HEADER)? {
        Some(raw) => UserRole::from_str(raw.trim())
            .map_err(|_| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("invalid {} header", USER_ROLE_HEADER)))?,
        None => UserRole::User,
    };

    req.extensions_mut().insert(AuthenticatedUser { user_id, role });
    Ok(next.run(req).await)
}

/// Must run after [`authenticate`].
pub async fn admin_only(
    req: Request, next: Next
) -> Result<Response<Body>, AppError> {
    let user = req.extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, anyhow!("request is not authenticated")))?;

    if user.role != UserRole::Admin {
        return Err(AppError::new(StatusCode::FORBIDDEN, anyhow!("admin role required")));
    }

    Ok(next.run(req).await)
}
