/// Integration tests for the user store
///
/// Runs against the in-memory backend and inspects raw keys to check the
/// storage layout other components read.

mod common;

use common::{TestContext, PASSWORD};
use rolestore_shared::auth::password::{check_password_strength, hash_password_with, verify_password, HashParams};
use rolestore_shared::auth::token::is_well_formed_token;
use rolestore_shared::models::user::CreateUser;
use rolestore_shared::rbac::RbacError;
use rolestore_shared::redis::keys::{user_metadata_key, user_role_key, TOKENS_KEY, USERS_KEY};
use rolestore_shared::store::KeyValueStore;

#[test]
fn test_password_strength_boundaries() {
    assert!(check_password_strength(&format!("Aa12{}", "x".repeat(6))));
    assert!(!check_password_strength(&format!("Aa12{}", "x".repeat(5))));
    assert!(check_password_strength(&format!("Aa12{}", "x".repeat(96))));
    assert!(!check_password_strength(&format!("Aa12{}", "x".repeat(97))));

    assert!(!check_password_strength("aa12xxxxxxxx"));
    assert!(!check_password_strength("AA12XXXXXXXX"));
    assert!(!check_password_strength("Aa1xxxxxxxxx"));
}

#[test]
fn test_hash_is_salted_and_verifies() {
    let params = HashParams::interactive();
    let first = hash_password_with(PASSWORD, &params).unwrap();
    let second = hash_password_with(PASSWORD, &params).unwrap();

    assert_ne!(first, second);
    assert!(verify_password(PASSWORD, &first).unwrap());
    assert!(verify_password(PASSWORD, &second).unwrap());
}

#[tokio::test]
async fn test_admin_is_member_of_both_tiers() {
    let ctx = TestContext::two_tier().await;
    ctx.user("boss@x.io", "admin").await;

    assert!(ctx.mem.sismember(&user_role_key("admin"), "boss@x.io").await.unwrap());
    assert!(ctx.mem.sismember(&user_role_key("analyst"), "boss@x.io").await.unwrap());
}

#[tokio::test]
async fn test_delete_clears_all_traces() {
    let ctx = TestContext::two_tier().await;
    let token = ctx.user("boss@x.io", "admin").await;

    assert!(ctx.store.delete("boss@x.io").await.unwrap());

    for role in ["admin", "analyst"] {
        assert!(ctx.mem.smembers(&user_role_key(role)).await.unwrap().is_empty());
    }
    assert_eq!(ctx.mem.hget(TOKENS_KEY, &token).await.unwrap(), None);
    assert!(ctx.mem.hgetall(&user_metadata_key("boss@x.io")).await.unwrap().is_empty());
    assert_eq!(ctx.mem.hget(USERS_KEY, "boss@x.io").await.unwrap(), None);
    assert!(ctx.store.get_user("boss@x.io").await.unwrap().is_none());
}

#[tokio::test]
async fn test_demote_admin_to_analyst() {
    let ctx = TestContext::two_tier().await;
    ctx.user("boss@x.io", "admin").await;

    ctx.store.edit("boss@x.io", "analyst", None).await.unwrap();

    assert!(ctx.mem.sismember(&user_role_key("analyst"), "boss@x.io").await.unwrap());
    assert!(!ctx.mem.sismember(&user_role_key("admin"), "boss@x.io").await.unwrap());
}

#[tokio::test]
async fn test_tokens_unique_and_resolvable() {
    let ctx = TestContext::two_tier().await;
    let a = ctx.user("a@x.io", "analyst").await;
    let b = ctx.user("b@x.io", "analyst").await;

    assert_ne!(a, b);
    assert!(is_well_formed_token(&a));
    assert_eq!(ctx.mem.hget(TOKENS_KEY, &a).await.unwrap().as_deref(), Some("a@x.io"));
    assert_eq!(ctx.mem.hget(TOKENS_KEY, &b).await.unwrap().as_deref(), Some("b@x.io"));
}

#[tokio::test]
async fn test_full_promotion_and_demotion() {
    let ctx = TestContext::new().await;
    ctx.user("u@x.io", "read_only").await;

    ctx.store.edit("u@x.io", "admin", None).await.unwrap();
    assert_eq!(
        ctx.store.memberships("u@x.io").await.unwrap(),
        ctx.store.all_roles().await.unwrap()
    );

    ctx.store.edit("u@x.io", "read_only", None).await.unwrap();
    assert_eq!(ctx.store.memberships("u@x.io").await.unwrap(), vec!["read_only"]);
}

#[tokio::test]
async fn test_adjacent_moves_change_one_tier() {
    let ctx = TestContext::new().await;
    ctx.user("u@x.io", "user").await;

    ctx.store.edit("u@x.io", "analyst", None).await.unwrap();
    assert_eq!(ctx.store.memberships("u@x.io").await.unwrap().len(), 4);

    ctx.store.edit("u@x.io", "user", None).await.unwrap();
    assert_eq!(ctx.store.memberships("u@x.io").await.unwrap().len(), 3);
    assert!(!ctx.store.is_in_role("u@x.io", "analyst").await.unwrap());
}

#[tokio::test]
async fn test_recreate_retires_old_token() {
    let ctx = TestContext::two_tier().await;
    let old = ctx.user("u@x.io", "analyst").await;
    let new = ctx.user("u@x.io", "analyst").await;

    assert_eq!(ctx.store.user_by_token(&old).await.unwrap(), None);
    assert_eq!(ctx.store.user_token("u@x.io").await.unwrap(), Some(new.clone()));
    assert_eq!(ctx.mem.hgetall(TOKENS_KEY).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_unknown_role_changes_nothing() {
    let ctx = TestContext::two_tier().await;
    ctx.user("u@x.io", "admin").await;
    let before = ctx.mem.keys().await;
    let record_before = ctx.store.get_user("u@x.io").await.unwrap();

    let err = ctx
        .store
        .edit("u@x.io", "superuser", Some("Replaced99Pass"))
        .await
        .unwrap_err();

    assert!(matches!(err, RbacError::UnknownRole(_)));
    assert_eq!(ctx.mem.keys().await, before);
    assert_eq!(ctx.store.get_user("u@x.io").await.unwrap(), record_before);
    assert!(ctx.store.check_credentials("u@x.io", PASSWORD).await.unwrap());
}

#[tokio::test]
async fn test_default_password_flow() {
    let ctx = TestContext::two_tier().await;
    ctx.store
        .create(CreateUser::new("new@x.io", PASSWORD).with_role("analyst").default_password())
        .await
        .unwrap();

    let record = ctx.store.get_user("new@x.io").await.unwrap().unwrap();
    assert!(record.change_password);
    assert_eq!(record.role.as_deref(), Some("analyst"));

    ctx.store
        .create(CreateUser::new("new@x.io", "Chosen2024Pass").completing_reset())
        .await
        .unwrap();

    assert!(!ctx.store.must_change_password("new@x.io").await.unwrap());
    assert!(ctx.store.is_in_role("new@x.io", "analyst").await.unwrap());
}

#[tokio::test]
async fn test_roles_in_range_uses_positions() {
    let ctx = TestContext::new().await;

    assert_eq!(
        ctx.store.roles_in_range(0, 1).await.unwrap(),
        vec!["read_only", "user_no_api"]
    );
    assert_eq!(
        ctx.store.roles_in_range(-2, 100).await.unwrap(),
        vec!["analyst", "admin"]
    );
    assert!(ctx.store.roles_in_range(3, 1).await.unwrap().is_empty());
}
