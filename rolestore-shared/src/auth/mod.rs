/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength policy
/// - [`token`]: random bearer token generation
/// - [`authorization`]: role membership checks
/// - [`middleware`]: axum token auth and role guards
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, 64 MB memory and 3 iterations by default
/// - **Tokens**: 41 bytes from the OS RNG, base64url encoded
/// - **Role Guards**: 401 for anonymous or under-privileged requests
///
/// # Example
///
/// ```
/// use rolestore_shared::auth::password::{hash_password_with, verify_password, HashParams};
/// use rolestore_shared::auth::token::generate_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password_with("Operator2024x", &HashParams::interactive())?;
/// assert!(verify_password("Operator2024x", &hash)?);
///
/// let token = generate_token();
/// assert_eq!(token.len(), 55);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod token;
