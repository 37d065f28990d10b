//! Bearer authentication: token verification, middleware, and the
//! request-scoped principal.

pub mod middleware;
pub mod models;
pub mod verifier;

pub use middleware::{auth_middleware, AuthState};
pub use models::{Claims, Principal};
pub use verifier::TokenVerifier;
