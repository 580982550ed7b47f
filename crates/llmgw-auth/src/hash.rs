use argon2::password_hash::rand_core::OsRng as Argon2OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generates a ≥256-bit random token, rendered as URL-safe text.
pub fn generate_raw_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Cheap, indexed digest of the token's leading `prefix_length` characters.
/// Used to locate the candidate record before the expensive password-hash
/// verification.
pub fn prefix_hash(raw_token: &str, prefix_length: usize) -> Option<String> {
    if raw_token.len() <= prefix_length {
        return None;
    }
    let prefix = &raw_token[..prefix_length];
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// Derives a self-describing password-style hash of the full token. The
/// returned string embeds the algorithm and its parameters (PHC format via
/// `argon2`/`password-hash`), so verification never needs external
/// parameters.
pub fn hash_token(raw_token: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut Argon2OsRng);
    let hash = Argon2::default()
        .hash_password(raw_token.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("hash token: {err}"))?;
    Ok(hash.to_string())
}

/// Constant-time verification of `raw_token` against an encoded password
/// hash, parsing the hash's own embedded parameters rather than any global
/// default.
pub fn verify_token(raw_token: &str, encoded_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(encoded_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(raw_token.as_bytes(), &parsed)
        .is_ok()
}
