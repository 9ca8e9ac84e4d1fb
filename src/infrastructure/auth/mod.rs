use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;

pub const X_USER_ID: &str = "x-user-id";
pub const X_REQUEST_ID: &str = "x-request-id";

/// Caller identity established by the upstream gateway.
///
/// Authentication itself is out of scope here; the gateway terminates
/// it and forwards the authenticated user id in a trusted header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Middleware that requires a valid `x-user-id` header and attaches
/// the caller identity to the request extensions.
pub async fn identity_middleware(mut request: Request, next: Next) -> Response {
    let user_id = request
        .headers()
        .get(X_USER_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok());

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(AuthUser { user_id });
            next.run(request).await
        }
        None => AppError::Unauthorized("missing or malformed x-user-id header".to_string())
            .into_response(),
    }
}

/// Request ID wrapper type for extension
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Middleware to generate and attach a request ID to each request,
/// echoed back in the response headers for log correlation.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, header_value);
    }

    response
}
