use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use gridview_core::{AppError, AppResult, UserIdentity};

use crate::error::ApiResult;

pub const USER_SUBJECT_HEADER: &str = "x-user-subject";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads the identity an upstream authenticator attached to the request.
pub fn identity_from_headers(headers: &HeaderMap) -> AppResult<UserIdentity> {
    let subject = header_text(headers, USER_SUBJECT_HEADER)
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let display_name = header_text(headers, USER_NAME_HEADER).unwrap_or(subject);
    let email = header_text(headers, USER_EMAIL_HEADER).map(ToOwned::to_owned);

    Ok(UserIdentity::new(subject, display_name, email))
}

pub async fn require_auth(mut request: Request, next: Next) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
