/// User records and their inputs
///
/// A user is identified by its id string (usually an email address) and
/// described by the `user_metadata:<id>` hash. The password hash lives
/// separately in `user:all` and is never part of a [`UserRecord`].
///
/// # Example
///
/// ```
/// use rolestore_shared::models::user::CreateUser;
///
/// let new_user = CreateUser::new("analyst@example.com", "Analyst2024x")
///     .with_role("analyst")
///     .default_password();
///
/// assert_eq!(new_user.role.as_deref(), Some("analyst"));
/// assert!(new_user.default_password);
/// assert!(!new_user.completes_reset);
/// ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use crate::redis::keys::{FIELD_CHANGE_PASSWORD, FIELD_ROLE, FIELD_TOKEN};

/// A user as read back from its metadata hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// User id (username or email)
    pub user_id: String,

    /// Role label, if one was assigned
    pub role: Option<String>,

    /// Current token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Whether a password change is required at next login
    pub change_password: bool,

    /// Any other metadata fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl UserRecord {
    /// Builds a record from a metadata hash
    ///
    /// `change_passwd` counts as set whenever the field is present, whatever
    /// its value.
    pub fn from_metadata(user_id: impl Into<String>, mut fields: HashMap<String, String>) -> Self {
        let token = fields.remove(FIELD_TOKEN);
        let role = fields.remove(FIELD_ROLE);
        let change_password = fields.remove(FIELD_CHANGE_PASSWORD).is_some();

        Self {
            user_id: user_id.into(),
            role,
            token,
            change_password,
            extra: fields.into_iter().collect(),
        }
    }

    /// Copy of the record with the token hidden, for display
    pub fn redacted(&self) -> Self {
        Self {
            token: None,
            ..self.clone()
        }
    }
}

/// Input for creating (or re-creating) a user
#[derive(Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// User id (username or email)
    pub user_id: String,

    /// Plaintext password, hashed before storage
    pub password: String,

    /// Mark the account as needing a password change at next login
    #[serde(default)]
    pub default_password: bool,

    /// Role to grant (ignored if unknown)
    #[serde(default)]
    pub role: Option<String>,

    /// This call completes a forced password reset
    ///
    /// Clears the pending-change flag instead of touching roles.
    #[serde(default)]
    pub completes_reset: bool,
}

impl CreateUser {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
            default_password: false,
            role: None,
            completes_reset: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn default_password(mut self) -> Self {
        self.default_password = true;
        self
    }

    pub fn completing_reset(mut self) -> Self {
        self.completes_reset = true;
        self
    }
}

// Keep plaintext passwords out of logs
impl fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUser")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("default_password", &self.default_password)
            .field("role", &self.role)
            .field("completes_reset", &self.completes_reset)
            .finish()
    }
}

/// Input for changing a user's role, and optionally their password
#[derive(Clone, Serialize, Deserialize)]
pub struct EditUser {
    pub user_id: String,

    /// Role to move the user to (must exist)
    pub role: String,

    /// New plaintext password, if it changes
    #[serde(default)]
    pub password: Option<String>,
}

impl EditUser {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Debug for EditUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditUser")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_metadata_full() {
        let fields = HashMap::from([
            ("token".to_string(), "tok".to_string()),
            ("role".to_string(), "admin".to_string()),
            ("change_passwd".to_string(), "True".to_string()),
            ("nickname".to_string(), "root".to_string()),
        ]);

        let record = UserRecord::from_metadata("admin@admin.test", fields);

        assert_eq!(record.user_id, "admin@admin.test");
        assert_eq!(record.role.as_deref(), Some("admin"));
        assert_eq!(record.token.as_deref(), Some("tok"));
        assert!(record.change_password);
        assert_eq!(record.extra.get("nickname").map(String::as_str), Some("root"));
    }

    #[test]
    fn test_from_metadata_minimal() {
        let fields = HashMap::from([("token".to_string(), "tok".to_string())]);
        let record = UserRecord::from_metadata("u", fields);

        assert!(record.role.is_none());
        assert!(!record.change_password);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_redacted_hides_token() {
        let fields = HashMap::from([("token".to_string(), "secret".to_string())]);
        let record = UserRecord::from_metadata("u", fields).redacted();
        assert!(record.token.is_none());

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("token"));
    }

    #[test]
    fn test_create_user_builder() {
        let input = CreateUser::new("u@example.com", "pw").with_role("user").completing_reset();

        assert_eq!(input.user_id, "u@example.com");
        assert_eq!(input.role.as_deref(), Some("user"));
        assert!(input.completes_reset);
        assert!(!input.default_password);
    }

    #[test]
    fn test_create_user_debug_redacts_password() {
        let input = CreateUser::new("u", "Sup3rSecret99");
        let debug = format!("{:?}", input);
        assert!(!debug.contains("Sup3rSecret99"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_edit_user_builder() {
        let input = EditUser::new("u@example.com", "analyst");
        assert_eq!(input.role, "analyst");
        assert!(input.password.is_none());

        let input = input.with_password("Changed42Pass");
        assert_eq!(input.password.as_deref(), Some("Changed42Pass"));
    }

    #[test]
    fn test_edit_user_debug_redacts_password() {
        let debug = format!("{:?}", EditUser::new("u", "user").with_password("Sup3rSecret99"));
        assert!(!debug.contains("Sup3rSecret99"));
        assert!(debug.contains("<redacted>"));

        let debug = format!("{:?}", EditUser::new("u", "user"));
        assert!(debug.contains("None"));
    }

    #[test]
    fn test_edit_user_deserialize_without_password() {
        let input: EditUser =
            serde_json::from_str(r#"{"user_id":"u@example.com","role":"user"}"#).unwrap();
        assert_eq!(input.user_id, "u@example.com");
        assert!(input.password.is_none());
    }
}
