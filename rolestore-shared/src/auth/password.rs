/// Password hashing and strength policy
///
/// Passwords are hashed with Argon2id. The salt is random per hash, and the
/// work factor is carried inside the PHC string, so verification needs no
/// configuration.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Default cost**: 64 MB memory, 3 passes, 4 lanes, 32-byte output
/// - **Salt**: 16 bytes from the OS RNG
///
/// # Strength Policy
///
/// A password is accepted when it has:
/// - at least two ASCII digits
/// - at least one ASCII lowercase letter
/// - at least one ASCII uppercase letter
/// - between 10 and 100 characters, inclusive
/// - no line breaks
///
/// # Example
///
/// ```
/// use rolestore_shared::auth::password::{
///     check_password_strength, hash_password_with, verify_password, HashParams,
/// };
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// assert!(check_password_strength("Correct42Horse"));
///
/// let hash = hash_password_with("Correct42Horse", &HashParams::interactive())?;
/// assert!(verify_password("Correct42Horse", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Maximum accepted password length, in characters
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Minimum number of digits
pub const MIN_DIGITS: usize = 2;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Cost parameters rejected by Argon2
    #[error("Invalid hash parameters: {0}")]
    InvalidParams(String),
}

/// Strength policy violations, in the order they are checked
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least 10 characters long")]
    TooShort,

    #[error("Password must be at most 100 characters long")]
    TooLong,

    #[error("Password must not contain line breaks")]
    LineBreak,

    #[error("Password must contain at least 2 digits")]
    NotEnoughDigits,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl HashParams {
    /// Low-cost profile for tests and local tooling
    ///
    /// Do not use for stored production credentials.
    pub fn interactive() -> Self {
        Self {
            memory_kib: 8192,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for HashParams {
    /// 64 MB, 3 passes, 4 lanes
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// Hashes a password with the default cost parameters
///
/// Returns a PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
/// Hashing the same password twice gives different strings.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, &HashParams::default())
}

/// Hashes a password with explicit cost parameters
pub fn hash_password_with(password: &str, params: &HashParams) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = params
        .argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash string
///
/// Comparison is constant-time. Cost parameters are read from the hash.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;
    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash("Hash has no salt or digest".to_string()));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Whether a stored hash was written by this module's Argon2 hashing
///
/// Credentials from older deployments may hold bcrypt (`$2b$`) hashes,
/// which [`verify_password`] cannot check.
pub fn is_argon2_hash(hash: &str) -> bool {
    hash.starts_with("$argon2")
}

/// Checks a password against the strength policy, reporting the first violation
pub fn validate_password_strength(password: &str) -> Result<(), PasswordPolicyError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooLong);
    }

    // Stricter than a `\d`/`$` regex: any newline is refused, including a
    // trailing one, and only ASCII digits and letters count toward the classes.
    if password.contains('\n') {
        return Err(PasswordPolicyError::LineBreak);
    }

    if password.chars().filter(|c| c.is_ascii_digit()).count() < MIN_DIGITS {
        return Err(PasswordPolicyError::NotEnoughDigits);
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordPolicyError::MissingLowercase);
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }

    Ok(())
}

/// Returns true if the password satisfies the strength policy
pub fn check_password_strength(password: &str) -> bool {
    validate_password_strength(password).is_ok()
}

/// Generates a random password that satisfies the strength policy
///
/// Used for first-run bootstrap accounts. The result is 20 characters drawn
/// from `[A-Za-z0-9]` with the policy's character classes guaranteed.
pub fn generate_password() -> String {
    const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const DIGITS: &[u8] = b"0123456789";
    const ALL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const LENGTH: usize = 20;

    let mut rng = rand::thread_rng();
    let pick = |rng: &mut rand::rngs::ThreadRng, set: &[u8]| set[rng.gen_range(0..set.len())];

    let mut chars = vec![
        pick(&mut rng, LOWER),
        pick(&mut rng, UPPER),
        pick(&mut rng, DIGITS),
        pick(&mut rng, DIGITS),
    ];
    while chars.len() < LENGTH {
        chars.push(pick(&mut rng, ALL));
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
