/// Access guards for Axum
///
/// Middleware that authenticates requests by bearer token and restricts
/// routes to members of a role tier.
///
/// # Middleware Types
///
/// - **Token auth**: resolves `Authorization: Bearer <token>` through
///   `user:tokens` and adds a [`SessionUser`] to the request
/// - **Role guard**: rejects the request unless the [`SessionUser`] is a
///   member of the required tier
///
/// A session layer outside this crate may insert [`SessionUser`] itself;
/// the role guard only reads the extension.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use rolestore_shared::auth::middleware::{require_admin, token_auth, SessionUser};
/// use rolestore_shared::rbac::UserStore;
///
/// async fn settings(Extension(user): Extension<SessionUser>) -> String {
///     format!("Hello, {}", user.user_id)
/// }
///
/// fn router(store: UserStore) -> Router {
///     Router::new()
///         .route("/settings", get(settings))
///         .layer(middleware::from_fn(require_admin(store.clone())))
///         .layer(middleware::from_fn(token_auth(store)))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::authorization::{authorize, AuthzError};
use super::token::is_well_formed_token;
use crate::rbac::{UserStore, ROLE_ADMIN, ROLE_ANALYST};

/// Authenticated identity added to request extensions
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use rolestore_shared::auth::middleware::SessionUser;
///
/// async fn handler(Extension(user): Extension<SessionUser>) -> String {
///     format!("User: {}", user.user_id)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
}

impl SessionUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Error type for the guards
#[derive(Debug)]
pub enum GuardError {
    /// No session user, or the user lacks the role
    Unauthorized,

    /// Authorization header present but not a bearer token
    InvalidFormat(String),

    /// Token does not resolve to a user
    InvalidToken,

    /// Store lookup failed
    StoreError(String),
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            GuardError::InvalidFormat(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            GuardError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token").into_response(),
            GuardError::StoreError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<AuthzError> for GuardError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAuthenticated | AuthzError::MissingRole { .. } => GuardError::Unauthorized,
            AuthzError::Store(e) => GuardError::StoreError(e.to_string()),
        }
    }
}

/// Boxed middleware future, as accepted by `axum::middleware::from_fn`
pub type GuardFuture = Pin<Box<dyn Future<Output = Result<Response, GuardError>> + Send>>;

/// Bearer token authentication middleware
///
/// Requests without an `Authorization` header pass through untouched so
/// that another session layer can still authenticate them.
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is not a bearer token or the
/// token is malformed or unknown, and 500 if the lookup fails. Malformed
/// tokens never reach the store.
pub async fn token_auth_middleware(
    store: UserStore,
    mut req: Request,
    next: Next,
) -> Result<Response, GuardError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default().to_string());
    let Some(auth_header) = auth_header else {
        return Ok(next.run(req).await);
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| GuardError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !is_well_formed_token(token) {
        tracing::debug!("Malformed bearer token rejected");
        return Err(GuardError::InvalidToken);
    }

    let user_id = store
        .user_by_token(token)
        .await
        .map_err(|e| GuardError::StoreError(e.to_string()))?
        .ok_or(GuardError::InvalidToken)?;

    tracing::debug!(user = %user_id, "Token authenticated");
    req.extensions_mut().insert(SessionUser::new(user_id));

    Ok(next.run(req).await)
}

/// Role guard middleware
///
/// Runs the wrapped handler only if the request's [`SessionUser`] is in
/// `user_role:<role>`.
///
/// # Errors
///
/// Returns 401 Unauthorized with no session user or a missing role, and 500
/// if the membership lookup fails.
pub async fn role_guard_middleware(
    store: UserStore,
    role: Arc<str>,
    req: Request,
    next: Next,
) -> Result<Response, GuardError> {
    let user = req.extensions().get::<SessionUser>().cloned();

    if let Err(e) = authorize(&store, user.as_ref(), &role).await {
        match &e {
            AuthzError::Store(err) => tracing::error!(role = %role, error = %err, "Role lookup failed"),
            other => tracing::debug!(role = %role, reason = %other, "Request rejected"),
        }
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

/// Creates a token authentication middleware closure
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use rolestore_shared::auth::middleware::token_auth;
/// use rolestore_shared::rbac::UserStore;
///
/// fn router(store: UserStore) -> Router {
///     Router::new()
///         .route("/", get(|| async { "OK" }))
///         .layer(middleware::from_fn(token_auth(store)))
/// }
/// ```
pub fn token_auth(store: UserStore) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    move |req, next| {
        let store = store.clone();
        Box::pin(token_auth_middleware(store, req, next))
    }
}

/// Creates a role guard middleware closure for `role`
///
/// The role name is copied, so it may come from runtime data.
pub fn require_role(
    store: UserStore,
    role: &str,
) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    let role: Arc<str> = Arc::from(role);
    move |req, next| {
        let store = store.clone();
        let role = role.clone();
        Box::pin(role_guard_middleware(store, role, req, next))
    }
}

/// Role guard for the `admin` tier
pub fn require_admin(store: UserStore) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    require_role(store, ROLE_ADMIN)
}

/// Role guard for the `analyst` tier (admins pass too)
pub fn require_analyst(store: UserStore) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    require_role(store, ROLE_ANALYST)
}
