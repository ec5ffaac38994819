/// First-run bootstrap
///
/// Seeds the role hierarchy and creates the administrator account the
/// first time a deployment starts against an empty store. The generated
/// administrator password is written to a sentinel file next to the
/// deployment and the account is flagged for a password change. Completing
/// that change through [`UserStore::create`] with `completes_reset` removes
/// the file again.
///
/// # Sentinel File
///
/// ```text
/// email=admin@admin.test
/// password=<generated>
/// API_Key=<token>
/// ```
///
/// On unix the file is created with mode `0600`.
///
/// # Example
///
/// ```no_run
/// use rolestore_shared::rbac::{bootstrap, BootstrapConfig, RoleHierarchy, UserStore};
/// use rolestore_shared::store::memory::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = UserStore::new(Arc::new(MemoryStore::new()))
///     .with_bootstrap(BootstrapConfig::new("admin@admin.test", "/srv/app/DEFAULT_PASSWORD"));
///
/// if let Some(report) = bootstrap(&store, &RoleHierarchy::default_tiers()).await? {
///     println!("Administrator created, see {}", report.sentinel_path.display());
/// }
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::roles::RoleHierarchy;
use super::users::UserStore;
use super::{RbacError, RbacResult};
use crate::auth::password::generate_password;
use crate::models::user::CreateUser;

/// Sentinel file name under the deployment home
pub const SENTINEL_FILE_NAME: &str = "DEFAULT_PASSWORD";

/// Administrator identity and sentinel location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// User id of the first-run administrator
    pub admin_user: String,

    /// File holding the generated administrator password
    pub sentinel_path: PathBuf,
}

impl BootstrapConfig {
    /// Administrator id used when none is configured
    pub const DEFAULT_ADMIN: &'static str = "admin@admin.test";

    pub fn new(admin_user: impl Into<String>, sentinel_path: impl Into<PathBuf>) -> Self {
        Self {
            admin_user: admin_user.into(),
            sentinel_path: sentinel_path.into(),
        }
    }

    /// Loads the configuration from the environment
    ///
    /// - `ROLESTORE_ADMIN_USER` (default `admin@admin.test`)
    /// - `ROLESTORE_HOME` (default `.`)
    /// - `ROLESTORE_SENTINEL_FILE` (default `$ROLESTORE_HOME/DEFAULT_PASSWORD`)
    pub fn from_env() -> Self {
        let admin_user = std::env::var("ROLESTORE_ADMIN_USER")
            .unwrap_or_else(|_| Self::DEFAULT_ADMIN.to_string());

        let sentinel_path = match std::env::var("ROLESTORE_SENTINEL_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let home = std::env::var("ROLESTORE_HOME").unwrap_or_else(|_| ".".to_string());
                Path::new(&home).join(SENTINEL_FILE_NAME)
            }
        };

        Self {
            admin_user,
            sentinel_path,
        }
    }

    /// Whether `user_id` is the configured administrator
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_user == user_id
    }
}

/// What a bootstrap run created
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub admin_user: String,

    /// Role granted to the administrator, if the hierarchy has one
    pub role: Option<String>,

    /// Generated password (also in the sentinel file)
    #[serde(skip)]
    pub password: String,

    #[serde(skip)]
    pub token: String,

    pub sentinel_path: PathBuf,

    /// Whether the role hierarchy was seeded by this run
    pub seeded_roles: bool,
}

/// Seeds roles and creates the administrator if missing
///
/// The hierarchy is only seeded when `ail:all_role` is empty. The
/// administrator gets the highest role of the stored hierarchy.
///
/// Returns `None` when the administrator already existed, so repeated runs
/// change nothing.
///
/// # Errors
///
/// - `RbacError::BootstrapNotConfigured` if `store` has no [`BootstrapConfig`]
/// - store, hashing or sentinel file errors
pub async fn bootstrap(store: &UserStore, roles: &RoleHierarchy) -> RbacResult<Option<BootstrapReport>> {
    let config = store
        .bootstrap_config()
        .ok_or(RbacError::BootstrapNotConfigured)?
        .clone();

    let seeded_roles = store.seed_roles(roles).await?;

    if store.user_exists(&config.admin_user).await? {
        tracing::debug!(user = %config.admin_user, "Administrator already present");
        return Ok(None);
    }

    let role = store.hierarchy().await?.highest().map(|r| r.name.clone());
    let password = generate_password();

    let mut input = CreateUser::new(config.admin_user.clone(), password.clone()).default_password();
    input.role = role.clone();
    let token = store.create(input).await?;

    write_sentinel(&config, &password, &token).await?;

    tracing::info!(
        user = %config.admin_user,
        role = ?role,
        path = %config.sentinel_path.display(),
        "Administrator created"
    );

    Ok(Some(BootstrapReport {
        admin_user: config.admin_user,
        role,
        password,
        token,
        sentinel_path: config.sentinel_path,
        seeded_roles,
    }))
}

async fn write_sentinel(config: &BootstrapConfig, password: &str, token: &str) -> RbacResult<()> {
    let contents = format!(
        "email={}\npassword={}\nAPI_Key={}\n",
        config.admin_user, password, token
    );

    if let Some(parent) = config.sentinel_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&config.sentinel_path).await?;
    file.write_all(contents.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
