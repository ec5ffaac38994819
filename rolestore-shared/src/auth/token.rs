/// User token generation
///
/// Tokens are opaque bearer credentials: 41 bytes from the OS CSPRNG,
/// base64url-encoded without padding (55 characters). Each token maps to
/// exactly one user through the `user:tokens` hash.
///
/// # Example
///
/// ```
/// use rolestore_shared::auth::token::{generate_token, is_well_formed_token, TOKEN_LENGTH};
///
/// let token = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert!(is_well_formed_token(&token));
/// ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per token
pub const TOKEN_BYTES: usize = 41;

/// Encoded token length (base64 without padding)
pub const TOKEN_LENGTH: usize = (TOKEN_BYTES * 4 + 2) / 3;

/// Generates a new URL-safe user token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Checks that a presented token has the shape of a generated one
///
/// This is a cheap pre-filter before the store lookup. It does not prove the
/// token was issued.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
