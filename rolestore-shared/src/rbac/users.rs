/// User and role store
///
/// [`UserStore`] owns every RBAC read and write: credentials, tokens, role
/// labels and tier membership. It is constructed around an injected
/// [`KeyValueStore`] handle and is cheap to clone.
///
/// # Consistency
///
/// Each operation is a sequence of independent store commands with no
/// transaction around them. A crash part way through `create` can leave a
/// token written without role membership, and concurrent edits of one user
/// resolve as last-writer-wins.
///
/// # Example
///
/// ```
/// use rolestore_shared::auth::password::HashParams;
/// use rolestore_shared::models::user::CreateUser;
/// use rolestore_shared::rbac::{RoleHierarchy, UserStore};
/// use rolestore_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = UserStore::new(Arc::new(MemoryStore::new()))
///     .with_hash_params(HashParams::interactive());
/// store
///     .seed_roles(&RoleHierarchy::from_pairs([("analyst", 1), ("admin", 2)])?)
///     .await?;
///
/// let token = store
///     .create(CreateUser::new("boss@example.com", "Boss2Boss22").with_role("admin"))
///     .await?;
///
/// assert!(store.is_in_role("boss@example.com", "analyst").await?);
/// assert_eq!(store.user_by_token(&token).await?.as_deref(), Some("boss@example.com"));
///
/// store.edit("boss@example.com", "analyst", None).await?;
/// assert!(!store.is_in_role("boss@example.com", "admin").await?);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use super::bootstrap::BootstrapConfig;
use super::roles::{RoleHierarchy, TierDiff};
use super::{RbacError, RbacResult};
use crate::auth::password::{self, HashParams, PasswordError};
use crate::auth::token::generate_token;
use crate::models::user::{CreateUser, EditUser, UserRecord};
use crate::redis::keys::{
    user_metadata_key, user_role_key, FIELD_CHANGE_PASSWORD, FIELD_ROLE, FIELD_TOKEN, FLAG_TRUE,
    ROLES_KEY, TOKENS_KEY, USERS_KEY,
};
use crate::store::KeyValueStore;

/// RBAC bookkeeping over a key-value store
#[derive(Clone)]
pub struct UserStore {
    kv: Arc<dyn KeyValueStore>,
    hash_params: HashParams,
    bootstrap: Option<Arc<BootstrapConfig>>,
}

impl UserStore {
    /// Creates a store over the given backend with default hash parameters
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            hash_params: HashParams::default(),
            bootstrap: None,
        }
    }

    /// Sets the Argon2 cost used for new hashes
    pub fn with_hash_params(mut self, params: HashParams) -> Self {
        self.hash_params = params;
        self
    }

    /// Sets the first-run administrator identity and sentinel file
    pub fn with_bootstrap(mut self, config: BootstrapConfig) -> Self {
        self.bootstrap = Some(Arc::new(config));
        self
    }

    /// Underlying key-value backend
    pub fn backend(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    pub fn bootstrap_config(&self) -> Option<&BootstrapConfig> {
        self.bootstrap.as_deref()
    }

    // ------------------------------------------------------------------
    // Role hierarchy
    // ------------------------------------------------------------------

    /// The full hierarchy, ascending by level
    pub async fn hierarchy(&self) -> RbacResult<RoleHierarchy> {
        let members = self.kv.zrange_withscores(ROLES_KEY, 0, -1).await?;
        Ok(RoleHierarchy::from_scored(members))
    }

    /// Role names, ascending by level
    pub async fn all_roles(&self) -> RbacResult<Vec<String>> {
        Ok(self.kv.zrange(ROLES_KEY, 0, -1).await?)
    }

    /// Level of a role
    ///
    /// # Errors
    ///
    /// `RbacError::UnknownRole` if the role is not in the hierarchy.
    pub async fn role_level(&self, role: &str) -> RbacResult<i64> {
        self.kv
            .zscore(ROLES_KEY, role)
            .await?
            .map(|score| score as i64)
            .ok_or_else(|| RbacError::UnknownRole(role.to_string()))
    }

    /// Roles from `role`'s level up to the top, ascending
    pub async fn roles_at_or_above(&self, role: &str) -> RbacResult<Vec<String>> {
        let hierarchy = self.hierarchy().await?;
        hierarchy
            .at_or_above(role)
            .map(|names| names.into_iter().map(str::to_string).collect())
            .ok_or_else(|| RbacError::UnknownRole(role.to_string()))
    }

    /// Roles from the bottom up to `role`'s level, ascending
    pub async fn roles_at_or_below(&self, role: &str) -> RbacResult<Vec<String>> {
        let hierarchy = self.hierarchy().await?;
        hierarchy
            .at_or_below(role)
            .map(|names| names.into_iter().map(str::to_string).collect())
            .ok_or_else(|| RbacError::UnknownRole(role.to_string()))
    }

    /// Inclusive positional slice of the ascending role list (`ZRANGE` rules)
    pub async fn roles_in_range(&self, low: isize, high: isize) -> RbacResult<Vec<String>> {
        Ok(self.kv.zrange(ROLES_KEY, low, high).await?)
    }

    /// Adds a role, or moves an existing role to a new level
    ///
    /// Moving a role does not rewrite existing memberships.
    ///
    /// # Errors
    ///
    /// `RbacError::DuplicateLevel` if another role already holds `level`.
    pub async fn define_role(&self, name: &str, level: i64) -> RbacResult<()> {
        let mut hierarchy = self.hierarchy().await?;
        hierarchy.insert(super::roles::Role::new(name, level))?;

        self.kv.zadd(ROLES_KEY, name, level as f64).await?;
        tracing::info!(role = name, level, "Role defined");
        Ok(())
    }

    /// Writes `roles` into an empty hierarchy
    ///
    /// Returns `false` without writing if any role is already defined.
    pub async fn seed_roles(&self, roles: &RoleHierarchy) -> RbacResult<bool> {
        if !self.all_roles().await?.is_empty() {
            tracing::debug!("Role hierarchy already present, skipping seed");
            return Ok(false);
        }

        for role in roles.roles() {
            self.kv.zadd(ROLES_KEY, &role.name, role.level as f64).await?;
        }
        tracing::info!(roles = ?roles.names(), "Role hierarchy seeded");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // User lifecycle
    // ------------------------------------------------------------------

    /// Creates a user, or overwrites an existing user's credentials
    ///
    /// Always issues a fresh token (the previous one stops resolving) and
    /// stores the password hash. Then either:
    ///
    /// - `completes_reset`: clears the pending password change, and removes
    ///   the sentinel file if this is the bootstrap administrator
    /// - otherwise: flags a pending change for `default_password`, and grants
    ///   the role's tier and everything below it if the role is known
    ///
    /// Returns the new token.
    pub async fn create(&self, input: CreateUser) -> RbacResult<String> {
        let CreateUser {
            user_id,
            password,
            default_password,
            role,
            completes_reset,
        } = input;
        let meta_key = user_metadata_key(&user_id);

        let password_hash = self.hash(password).await?;

        let token = generate_token();
        let previous_token = self.kv.hget(&meta_key, FIELD_TOKEN).await?;
        if let Some(previous) = previous_token {
            self.kv.hdel(TOKENS_KEY, &previous).await?;
        }
        self.kv.hset(TOKENS_KEY, &token, &user_id).await?;
        self.kv.hset(&meta_key, FIELD_TOKEN, &token).await?;

        if completes_reset {
            self.kv.hdel(&meta_key, FIELD_CHANGE_PASSWORD).await?;
            self.remove_sentinel_for(&user_id).await?;
        } else {
            if default_password {
                self.kv.hset(&meta_key, FIELD_CHANGE_PASSWORD, FLAG_TRUE).await?;
            }
            if let Some(role) = role {
                self.grant_initial_role(&user_id, &role).await?;
            }
        }

        self.kv.hset(USERS_KEY, &user_id, &password_hash).await?;

        tracing::info!(user = %user_id, completes_reset, "User credentials written");
        Ok(token)
    }

    async fn grant_initial_role(&self, user_id: &str, role: &str) -> RbacResult<()> {
        let hierarchy = self.hierarchy().await?;
        let Some(level) = hierarchy.level(role) else {
            tracing::warn!(user = %user_id, role, "Ignoring unknown role on create");
            return Ok(());
        };

        // A re-created user may still hold tiers above the new role
        let meta_key = user_metadata_key(user_id);
        let diff = match self.kv.hget(&meta_key, FIELD_ROLE).await? {
            Some(_) => TierDiff::reset(&hierarchy, level),
            None => TierDiff::between(&hierarchy, None, level),
        };
        self.apply_diff(user_id, &diff).await?;

        self.kv.hset(&meta_key, FIELD_ROLE, role).await?;
        Ok(())
    }

    async fn remove_sentinel_for(&self, user_id: &str) -> RbacResult<()> {
        let Some(config) = self.bootstrap.as_deref() else {
            return Ok(());
        };
        if !config.is_admin(user_id) {
            return Ok(());
        }

        match tokio::fs::remove_file(&config.sentinel_path).await {
            Ok(()) => {
                tracing::info!(path = %config.sentinel_path.display(), "Default password file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %config.sentinel_path.display(), "Default password file already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Changes a user's role and optionally their password
    ///
    /// Membership is moved with a [`TierDiff`] so that afterwards the user
    /// belongs to exactly the tiers at or below `role`. Nothing is written if
    /// the role or user is unknown.
    ///
    /// # Errors
    ///
    /// - `RbacError::UserNotFound` if the user has no metadata record
    /// - `RbacError::UnknownRole` if `role` is not in the hierarchy
    pub async fn edit(&self, user_id: &str, role: &str, password: Option<&str>) -> RbacResult<()> {
        let meta_key = user_metadata_key(user_id);
        if !self.kv.exists(&meta_key).await? {
            return Err(RbacError::UserNotFound(user_id.to_string()));
        }

        let hierarchy = self.hierarchy().await?;
        let requested = hierarchy
            .level(role)
            .ok_or_else(|| RbacError::UnknownRole(role.to_string()))?;

        if let Some(password) = password {
            let password_hash = self.hash(password.to_string()).await?;
            self.kv.hset(USERS_KEY, user_id, &password_hash).await?;
            tracing::info!(user = %user_id, "Password updated");
        }

        let current_role = self.kv.hget(&meta_key, FIELD_ROLE).await?;
        if current_role.as_deref() == Some(role) {
            return Ok(());
        }

        let diff = match current_role.as_deref() {
            None => TierDiff::between(&hierarchy, None, requested),
            Some(current) => match hierarchy.level(current) {
                Some(level) => TierDiff::between(&hierarchy, Some(level), requested),
                None => {
                    tracing::warn!(user = %user_id, role = current, "Stored role no longer defined, rebuilding membership");
                    TierDiff::reset(&hierarchy, requested)
                }
            },
        };
        self.apply_diff(user_id, &diff).await?;

        self.kv.hset(&meta_key, FIELD_ROLE, role).await?;
        tracing::info!(user = %user_id, from = ?current_role, to = role, "Role changed");
        Ok(())
    }

    /// [`UserStore::edit`] driven by an [`EditUser`] input
    pub async fn edit_user(&self, input: EditUser) -> RbacResult<()> {
        self.edit(&input.user_id, &input.role, input.password.as_deref()).await
    }

    async fn apply_diff(&self, user_id: &str, diff: &TierDiff) -> RbacResult<()> {
        tracing::debug!(user = %user_id, add = ?diff.add, remove = ?diff.remove, "Applying tier diff");

        for role in &diff.remove {
            self.kv.srem(&user_role_key(role), user_id).await?;
        }
        for role in &diff.add {
            self.kv.sadd(&user_role_key(role), user_id).await?;
        }
        Ok(())
    }

    /// Deletes a user, their token, credentials and every membership
    ///
    /// Returns `false` (and writes nothing) if the user does not exist.
    pub async fn delete(&self, user_id: &str) -> RbacResult<bool> {
        let meta_key = user_metadata_key(user_id);
        if !self.kv.exists(&meta_key).await? {
            return Ok(false);
        }

        for role in self.all_roles().await? {
            self.kv.srem(&user_role_key(&role), user_id).await?;
        }

        if let Some(token) = self.kv.hget(&meta_key, FIELD_TOKEN).await? {
            self.kv.hdel(TOKENS_KEY, &token).await?;
        }
        self.kv.del(&meta_key).await?;
        self.kv.hdel(USERS_KEY, user_id).await?;

        tracing::info!(user = %user_id, "User deleted");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub async fn user_exists(&self, user_id: &str) -> RbacResult<bool> {
        Ok(self.kv.exists(&user_metadata_key(user_id)).await?)
    }

    /// Reads a user's metadata record
    pub async fn get_user(&self, user_id: &str) -> RbacResult<Option<UserRecord>> {
        let fields = self.kv.hgetall(&user_metadata_key(user_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(UserRecord::from_metadata(user_id, fields)))
    }

    /// Resolves a token to its user
    pub async fn user_by_token(&self, token: &str) -> RbacResult<Option<String>> {
        Ok(self.kv.hget(TOKENS_KEY, token).await?)
    }

    /// Current token of a user
    pub async fn user_token(&self, user_id: &str) -> RbacResult<Option<String>> {
        Ok(self.kv.hget(&user_metadata_key(user_id), FIELD_TOKEN).await?)
    }

    /// Whether the user is a member of the role's tier
    ///
    /// Membership is additive, so this is true for the user's own role and
    /// every role below it.
    pub async fn is_in_role(&self, user_id: &str, role: &str) -> RbacResult<bool> {
        Ok(self.kv.sismember(&user_role_key(role), user_id).await?)
    }

    /// Tiers the user currently belongs to, ascending by level
    pub async fn memberships(&self, user_id: &str) -> RbacResult<Vec<String>> {
        let mut held = Vec::new();
        for role in self.all_roles().await? {
            if self.is_in_role(user_id, &role).await? {
                held.push(role);
            }
        }
        Ok(held)
    }

    /// Whether a password change is pending for the user
    pub async fn must_change_password(&self, user_id: &str) -> RbacResult<bool> {
        Ok(self
            .kv
            .hget(&user_metadata_key(user_id), FIELD_CHANGE_PASSWORD)
            .await?
            .is_some())
    }

    /// Verifies a password against the stored hash
    ///
    /// Unknown users verify as `false`, and so do users whose stored hash is
    /// not Argon2 (legacy bcrypt credentials must be reset first).
    pub async fn check_credentials(&self, user_id: &str, password: &str) -> RbacResult<bool> {
        let Some(stored) = self.kv.hget(USERS_KEY, user_id).await? else {
            return Ok(false);
        };
        if !password::is_argon2_hash(&stored) {
            tracing::warn!(user = %user_id, "Stored credential is not Argon2, password reset required");
            return Ok(false);
        }

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored))
            .await
            .map_err(|e| PasswordError::VerifyError(e.to_string()))??;
        Ok(verified)
    }

    /// Token of the bootstrap administrator, if configured and present
    pub async fn bootstrap_admin_token(&self) -> RbacResult<Option<String>> {
        match self.bootstrap.as_deref() {
            Some(config) => self.user_token(&config.admin_user).await,
            None => Ok(None),
        }
    }

    async fn hash(&self, password: String) -> RbacResult<String> {
        let params = self.hash_params;
        let hash = tokio::task::spawn_blocking(move || password::hash_password_with(&password, &params))
            .await
            .map_err(|e| PasswordError::HashError(e.to_string()))??;
        Ok(hash)
    }
}
