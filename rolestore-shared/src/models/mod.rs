/// Data models for rolestore
///
/// # Models
///
/// - `user`: user records read from metadata, and create inputs
///
/// Storage operations live in [`crate::rbac::users::UserStore`]; models are
/// plain data.

pub mod user;
