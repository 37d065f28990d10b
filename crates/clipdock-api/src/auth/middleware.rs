//! Bearer token authentication middleware.

use crate::auth::models::Principal;
use crate::auth::verifier::TokenVerifier;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use clipdock_core::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
}

/// Authenticate the request and stash the resulting [`Principal`] in the
/// request extensions for handlers to extract.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(header_value) = header_value else {
        return unauthenticated("Missing authorization header");
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        return unauthenticated("Invalid authorization header format");
    };

    match auth_state.verifier.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal {
                user_id: claims.sub,
            });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}

fn unauthenticated(reason: &str) -> Response {
    HttpAppError(AppError::Unauthenticated(reason.to_string())).into_response()
}
