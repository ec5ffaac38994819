/// Integration tests for admin CLI commands
///
/// Commands run against the in-memory backend through `open_store`.

use rolestore_admin::cli::Commands;
use rolestore_admin::commands::{execute, open_store};
use rolestore_admin::config::{BackendConfig, Config};
use rolestore_shared::auth::password::HashParams;
use rolestore_shared::auth::token::generate_token;
use rolestore_shared::rbac::{BootstrapConfig, UserStore};
use std::path::PathBuf;

const ADMIN: &str = "admin@admin.test";

fn test_config() -> Config {
    let dir = std::env::temp_dir().join(format!("rolestore-admin-test-{}", generate_token()));
    Config {
        backend: BackendConfig::Memory,
        bootstrap: BootstrapConfig::new(ADMIN, dir.join("DEFAULT_PASSWORD")),
        hash: HashParams::interactive(),
    }
}

async fn memory_store() -> (UserStore, PathBuf) {
    let config = test_config();
    let store = open_store(&config).await.unwrap();
    (store, config.bootstrap.sentinel_path)
}

fn create(user_id: &str, role: Option<&str>, password: Option<&str>) -> Commands {
    Commands::CreateUser {
        user_id: user_id.to_string(),
        role: role.map(str::to_string),
        default_password: false,
        password: password.map(str::to_string),
    }
}

#[tokio::test]
async fn test_memory_store_has_default_tiers() {
    let (store, _) = memory_store().await;

    let output = execute(&store, Commands::Roles).await.unwrap();
    assert_eq!(
        output,
        "1\tread_only\n2\tuser_no_api\n3\tuser\n4\tanalyst\n5\tadmin"
    );
}

#[tokio::test]
async fn test_create_user_with_password() {
    let (store, _) = memory_store().await;

    let output = execute(&store, create("an@example.com", Some("analyst"), Some("Analyst2024x")))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["user_id"], "an@example.com");
    assert_eq!(json["role"], "analyst");
    assert!(json.get("generated_password").is_none());
    assert!(store.is_in_role("an@example.com", "user").await.unwrap());
    assert!(!store.must_change_password("an@example.com").await.unwrap());
}

#[tokio::test]
async fn test_create_user_generates_password() {
    let (store, _) = memory_store().await;

    let output = execute(&store, create("gen@example.com", None, None))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    let password = json["generated_password"].as_str().unwrap();

    assert!(store.check_credentials("gen@example.com", password).await.unwrap());
    assert!(store.must_change_password("gen@example.com").await.unwrap());
}

#[tokio::test]
async fn test_create_user_rejects_bad_input() {
    let (store, _) = memory_store().await;

    assert!(execute(&store, create("not-an-email", None, None)).await.is_err());
    assert!(execute(&store, create("a@example.com", None, Some("weak"))).await.is_err());
    assert!(execute(&store, create("a@example.com", Some("wizard"), None)).await.is_err());
    assert!(!store.user_exists("a@example.com").await.unwrap());
}

#[tokio::test]
async fn test_edit_and_show_user() {
    let (store, _) = memory_store().await;
    execute(&store, create("u@example.com", Some("admin"), Some("Admin2024xx")))
        .await
        .unwrap();

    execute(
        &store,
        Commands::EditUser {
            user_id: "u@example.com".to_string(),
            role: "user".to_string(),
            password: None,
        },
    )
    .await
    .unwrap();

    let output = execute(
        &store,
        Commands::ShowUser {
            user_id: "u@example.com".to_string(),
        },
    )
    .await
    .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(json["role"], "user");
    assert_eq!(
        json["tiers"],
        serde_json::json!(["read_only", "user_no_api", "user"])
    );
    assert!(json.get("token").is_none());
}

#[tokio::test]
async fn test_edit_user_changes_password() {
    let (store, _) = memory_store().await;
    execute(&store, create("u@example.com", Some("user"), Some("User2024xxx")))
        .await
        .unwrap();

    let edit = |password: &str| Commands::EditUser {
        user_id: "u@example.com".to_string(),
        role: "analyst".to_string(),
        password: Some(password.to_string()),
    };

    assert!(execute(&store, edit("weak")).await.is_err());
    assert!(!store.is_in_role("u@example.com", "analyst").await.unwrap());

    let output = execute(&store, edit("Analyst2024y")).await.unwrap();
    assert_eq!(output, "Updated u@example.com to role analyst");
    assert!(store.is_in_role("u@example.com", "analyst").await.unwrap());
    assert!(store.check_credentials("u@example.com", "Analyst2024y").await.unwrap());
}

#[tokio::test]
async fn test_delete_user() {
    let (store, _) = memory_store().await;
    execute(&store, create("u@example.com", Some("user"), Some("User2024xxx")))
        .await
        .unwrap();

    let delete = || Commands::DeleteUser {
        user_id: "u@example.com".to_string(),
    };
    assert!(execute(&store, delete()).await.is_ok());
    assert!(execute(&store, delete()).await.is_err());
}

#[tokio::test]
async fn test_check_password() {
    let (store, _) = memory_store().await;

    let ok = Commands::CheckPassword {
        password: "Strong2024Pass".to_string(),
    };
    assert!(execute(&store, ok).await.is_ok());

    let weak = Commands::CheckPassword {
        password: "strongpass".to_string(),
    };
    let err = execute(&store, weak).await.unwrap_err();
    assert!(err.to_string().contains("digits"));
}

#[tokio::test]
async fn test_bootstrap_then_reset_password() {
    let (store, sentinel) = memory_store().await;

    let output = execute(&store, Commands::Bootstrap).await.unwrap();
    assert!(output.contains(ADMIN));
    assert!(sentinel.exists());

    let again = execute(&store, Commands::Bootstrap).await.unwrap();
    assert!(again.contains("nothing to do"));

    execute(
        &store,
        Commands::ResetPassword {
            user_id: ADMIN.to_string(),
            password: "Chosen2024Admin".to_string(),
        },
    )
    .await
    .unwrap();

    assert!(!sentinel.exists());
    assert!(!store.must_change_password(ADMIN).await.unwrap());
    assert!(store.check_credentials(ADMIN, "Chosen2024Admin").await.unwrap());

    if let Some(dir) = sentinel.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn test_reset_password_unknown_user() {
    let (store, _) = memory_store().await;

    let result = execute(
        &store,
        Commands::ResetPassword {
            user_id: "ghost@example.com".to_string(),
            password: "Ghost2024Pass".to_string(),
        },
    )
    .await;

    assert!(result.is_err());
    assert!(!store.user_exists("ghost@example.com").await.unwrap());
}
