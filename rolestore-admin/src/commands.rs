/// Command execution
///
/// Each subcommand runs against a [`UserStore`] and returns the text to
/// print, so the CLI can be driven from tests without a terminal.
///
/// # Example
///
/// ```no_run
/// use rolestore_admin::cli::Commands;
/// use rolestore_admin::commands::execute;
/// use rolestore_shared::rbac::UserStore;
///
/// # async fn example(store: UserStore) -> anyhow::Result<()> {
/// let output = execute(&store, Commands::Roles).await?;
/// println!("{}", output);
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use rolestore_shared::auth::password::{generate_password, validate_password_strength};
use rolestore_shared::models::user::{CreateUser, EditUser, UserRecord};
use rolestore_shared::rbac::{bootstrap, RoleHierarchy, UserStore};
use rolestore_shared::redis::RedisClient;
use rolestore_shared::store::memory::MemoryStore;
use rolestore_shared::store::KeyValueStore;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::cli::Commands;
use crate::config::{BackendConfig, Config};

/// New user id, validated as an email address
#[derive(Debug, Validate)]
pub struct NewUserId {
    #[validate(email(message = "User id must be an email address"))]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
struct CreatedUser<'a> {
    user_id: &'a str,
    role: Option<&'a str>,
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_password: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UserView {
    #[serde(flatten)]
    record: UserRecord,
    tiers: Vec<String>,
}

/// Opens the configured backend and wraps it in a [`UserStore`]
///
/// The in-memory backend starts out seeded with the default tiers so that
/// user commands have roles to work with.
pub async fn open_store(config: &Config) -> anyhow::Result<UserStore> {
    let kv: Arc<dyn KeyValueStore> = match &config.backend {
        BackendConfig::Redis(redis) => Arc::new(
            RedisClient::new(redis.clone())
                .await
                .context("Failed to connect to Redis")?,
        ),
        BackendConfig::Memory => Arc::new(MemoryStore::new()),
    };

    let store = UserStore::new(kv)
        .with_hash_params(config.hash)
        .with_bootstrap(config.bootstrap.clone());

    if config.is_memory() {
        store.seed_roles(&RoleHierarchy::default_tiers()).await?;
    }

    tracing::debug!(backend = store.backend().backend(), "Store ready");
    Ok(store)
}

/// Runs one subcommand and returns its output
///
/// # Errors
///
/// Returns an error for invalid input (bad email, weak password, unknown
/// user or role) and for any store failure.
pub async fn execute(store: &UserStore, command: Commands) -> anyhow::Result<String> {
    match command {
        Commands::Bootstrap => run_bootstrap(store).await,
        Commands::Roles => list_roles(store).await,
        Commands::CreateUser {
            user_id,
            role,
            default_password,
            password,
        } => create_user(store, user_id, role, default_password, password).await,
        Commands::EditUser {
            user_id,
            role,
            password,
        } => {
            let mut input = EditUser::new(user_id, role);
            if let Some(password) = password {
                validate_password_strength(&password)?;
                input = input.with_password(password);
            }
            let summary = format!("Updated {} to role {}", input.user_id, input.role);
            store.edit_user(input).await?;
            Ok(summary)
        }
        Commands::DeleteUser { user_id } => {
            if store.delete(&user_id).await? {
                Ok(format!("Deleted {}", user_id))
            } else {
                anyhow::bail!("User not found: {}", user_id)
            }
        }
        Commands::ShowUser { user_id } => show_user(store, &user_id).await,
        Commands::CheckPassword { password } => {
            validate_password_strength(&password)?;
            Ok("Password meets the strength policy".to_string())
        }
        Commands::ResetPassword { user_id, password } => {
            validate_password_strength(&password)?;
            if !store.user_exists(&user_id).await? {
                anyhow::bail!("User not found: {}", user_id);
            }

            let token = store
                .create(CreateUser::new(user_id.as_str(), password).completing_reset())
                .await?;
            Ok(format!("Password reset for {}\nAPI_Key={}", user_id, token))
        }
    }
}

async fn run_bootstrap(store: &UserStore) -> anyhow::Result<String> {
    match bootstrap(store, &RoleHierarchy::default_tiers()).await? {
        Some(report) => Ok(format!(
            "Created administrator {}\nPassword written to {}\nAPI_Key={}",
            report.admin_user,
            report.sentinel_path.display(),
            report.token
        )),
        None => Ok("Already bootstrapped, nothing to do".to_string()),
    }
}

async fn list_roles(store: &UserStore) -> anyhow::Result<String> {
    let hierarchy = store.hierarchy().await?;
    if hierarchy.is_empty() {
        return Ok("No roles defined, run `bootstrap` first".to_string());
    }

    let lines: Vec<String> = hierarchy
        .roles()
        .iter()
        .map(|role| format!("{}\t{}", role.level, role.name))
        .collect();
    Ok(lines.join("\n"))
}

async fn create_user(
    store: &UserStore,
    user_id: String,
    role: Option<String>,
    default_password: bool,
    password: Option<String>,
) -> anyhow::Result<String> {
    NewUserId {
        user_id: user_id.clone(),
    }
    .validate()
    .with_context(|| format!("Invalid user id '{}'", user_id))?;

    if let Some(role) = &role {
        // create() skips unknown roles; refuse them here instead
        store.role_level(role).await?;
    }

    let (password, generated) = match password {
        Some(password) => {
            validate_password_strength(&password)?;
            (password, false)
        }
        None => (generate_password(), true),
    };

    let mut input = CreateUser::new(user_id.as_str(), password.as_str());
    input.role = role.clone();
    input.default_password = default_password || generated;
    let token = store.create(input).await?;

    let created = CreatedUser {
        user_id: &user_id,
        role: role.as_deref(),
        token: &token,
        generated_password: generated.then_some(password.as_str()),
    };
    Ok(serde_json::to_string_pretty(&created)?)
}

async fn show_user(store: &UserStore, user_id: &str) -> anyhow::Result<String> {
    let record = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found: {}", user_id))?;

    let view = UserView {
        record: record.redacted(),
        tiers: store.memberships(user_id).await?,
    };
    Ok(serde_json::to_string_pretty(&view)?)
}
