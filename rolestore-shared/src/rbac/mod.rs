/// Role-based access control bookkeeping
///
/// # Modules
///
/// - [`roles`]: role hierarchy queries and tier diffs (pure, no I/O)
/// - [`users`]: the [`UserStore`], which does user CRUD, tokens and membership over a [`KeyValueStore`]
/// - [`bootstrap`]: first-run seeding of roles and the administrator account
///
/// [`KeyValueStore`]: crate::store::KeyValueStore
///
/// # Membership Model
///
/// Roles sit on an ordered integer scale and membership is additive: a user
/// at level `L` is stored in `user_role:<r>` for every role `r` with level
/// `<= L`. The effective role is the highest tier held.

pub mod bootstrap;
pub mod roles;
pub mod users;

pub use bootstrap::{bootstrap, BootstrapConfig, BootstrapReport};
pub use roles::{Role, RoleHierarchy, TierDiff, ROLE_ADMIN, ROLE_ANALYST};
pub use users::UserStore;

use crate::auth::password::PasswordError;
use crate::store::StoreError;

/// Errors from RBAC operations
#[derive(Debug, thiserror::Error)]
pub enum RbacError {
    /// Role is not part of the hierarchy
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// User has no metadata record
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Another role already sits on this level
    #[error("Level {level} is already held by role '{existing}'")]
    DuplicateLevel { level: i64, existing: String },

    /// Bootstrap was requested on a store without a bootstrap configuration
    #[error("No bootstrap configuration set on this store")]
    BootstrapNotConfigured,

    /// Storage backend failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing failure
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Sentinel file failure
    #[error("Sentinel file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for RBAC operations
pub type RbacResult<T> = Result<T, RbacError>;
