/// Key schema for RBAC data
///
/// These names are shared with existing deployments and must stay bit-exact.
///
/// | Key | Type | Contents |
/// |---|---|---|
/// | `user:all` | hash | user id → password hash |
/// | `user:tokens` | hash | token → user id |
/// | `user_metadata:{user}` | hash | `token`, `role`, `change_passwd` |
/// | `user_role:{role}` | set | user ids holding the tier |
/// | `ail:all_role` | sorted set | role name scored by level |
///
/// Hashes in `user:all` are Argon2id PHC strings. Entries left by older
/// deployments may be bcrypt (`$2b$`); those never verify and the user needs
/// a password reset, which rewrites the entry.

/// Credential hash (user id → password hash)
pub const USERS_KEY: &str = "user:all";

/// Token reverse lookup (token → user id)
pub const TOKENS_KEY: &str = "user:tokens";

/// Role hierarchy sorted set
pub const ROLES_KEY: &str = "ail:all_role";

/// Metadata field holding the user's token
pub const FIELD_TOKEN: &str = "token";

/// Metadata field holding the user's role label
pub const FIELD_ROLE: &str = "role";

/// Metadata field set while a password change is pending
pub const FIELD_CHANGE_PASSWORD: &str = "change_passwd";

/// Stored value of a set boolean flag
pub const FLAG_TRUE: &str = "True";

/// Per-user metadata hash key
///
/// # Example
///
/// ```
/// use rolestore_shared::redis::keys::user_metadata_key;
///
/// assert_eq!(user_metadata_key("admin@admin.test"), "user_metadata:admin@admin.test");
/// ```
pub fn user_metadata_key(user_id: &str) -> String {
    format!("user_metadata:{}", user_id)
}

/// Membership set key for a role tier
pub fn user_role_key(role: &str) -> String {
    format!("user_role:{}", role)
}
