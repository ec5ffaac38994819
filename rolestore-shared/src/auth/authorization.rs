/// Role checks
///
/// Framework-independent authorization against the stored tier sets. The
/// axum guards in [`super::middleware`] are thin wrappers over [`authorize`].
///
/// # Permission Model
///
/// Membership is additive: a user holding `admin` is also stored in every
/// lower tier, so checking `user_role:<required>` alone answers "at least
/// this role".
///
/// # Example
///
/// ```no_run
/// use rolestore_shared::auth::authorization::authorize;
/// use rolestore_shared::auth::middleware::SessionUser;
/// use rolestore_shared::rbac::UserStore;
///
/// # async fn example(store: UserStore) -> Result<(), Box<dyn std::error::Error>> {
/// let user = SessionUser::new("analyst@example.com");
/// authorize(&store, Some(&user), "analyst").await?;
/// # Ok(())
/// # }
/// ```

use super::middleware::SessionUser;
use crate::rbac::{RbacError, UserStore};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// No authenticated user on the request
    #[error("Not authenticated")]
    NotAuthenticated,

    /// User is not in the required tier
    #[error("User {user_id} is not in role {required}")]
    MissingRole { user_id: String, required: String },

    /// Membership lookup failed
    #[error("Store error: {0}")]
    Store(#[from] RbacError),
}

/// Checks that `user` is present and a member of `role`
///
/// # Errors
///
/// - `AuthzError::NotAuthenticated` if `user` is `None`
/// - `AuthzError::MissingRole` if the user is not in `user_role:<role>`
/// - `AuthzError::Store` if the lookup fails
pub async fn authorize(
    store: &UserStore,
    user: Option<&SessionUser>,
    role: &str,
) -> Result<(), AuthzError> {
    let user = user.ok_or(AuthzError::NotAuthenticated)?;

    if !store.is_in_role(&user.user_id, role).await? {
        return Err(AuthzError::MissingRole {
            user_id: user.user_id.clone(),
            required: role.to_string(),
        });
    }

    Ok(())
}
