//! Password hashing and bearer-token issuing/verification.
//!
//! Passwords are hashed with PBKDF2-HMAC-SHA256 and stored as
//! `base64(salt):base64(hash)`. Access tokens are compact HS256 JWTs
//! signed with the configured secret; only `/login` issues them, and
//! every verification failure collapses into one [`AuthError`] so a
//! caller cannot tell which check tripped.

use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD as BASE64_URL};
use base64::Engine;
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{hmac, pbkdf2};
use serde::{Deserialize, Serialize};

/// PBKDF2-HMAC-SHA256 iteration count. Deliberately slow; do not cache or
/// parallelize around it.
const PBKDF2_ITERATIONS: u32 = 600_000;

const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

/// Generic auth failure. Deliberately carries no detail about which
/// check failed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("could not validate credentials")]
pub struct AuthError;

/// Hash a password into a storable `base64(salt):base64(hash)` string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| AuthError)?;

    let mut hash = [0u8; KEY_LEN];
    pbkdf2::derive(
        PBKDF2_ALG,
        iterations(),
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!("{}:{}", BASE64.encode(salt), BASE64.encode(hash)))
}

/// Constant-time check of a password against a stored hash string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(':') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt), BASE64.decode(expected)) else {
        return false;
    };
    pbkdf2::verify(PBKDF2_ALG, iterations(), &salt, password.as_bytes(), &expected).is_ok()
}

fn iterations() -> std::num::NonZeroU32 {
    std::num::NonZeroU32::new(PBKDF2_ITERATIONS).expect("PBKDF2_ITERATIONS is non-zero")
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issue a signed access token with `sub = email`, valid for `ttl`.
pub fn create_access_token(email: &str, secret: &str, ttl: Duration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    // Header is constant: the algorithm is fixed, not negotiated.
    let header = BASE64_URL.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload =
        BASE64_URL.encode(serde_json::to_vec(&claims).expect("claims always serialize"));
    let signing_input = format!("{header}.{payload}");

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let signature = hmac::sign(&key, signing_input.as_bytes());

    format!("{signing_input}.{}", BASE64_URL.encode(signature.as_ref()))
}

/// Verify a token and return its subject (the account email).
///
/// Malformed structure, a bad signature, and an expired `exp` claim all
/// return the same [`AuthError`].
pub fn verify_token(token: &str, secret: &str) -> Result<String, AuthError> {
    let mut parts = token.splitn(3, '.');
    let (Some(header), Some(payload), Some(signature)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError);
    };

    let signature = BASE64_URL.decode(signature).map_err(|_| AuthError)?;
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let signing_input = format!("{header}.{payload}");
    hmac::verify(&key, signing_input.as_bytes(), &signature).map_err(|_| AuthError)?;

    let payload = BASE64_URL.decode(payload).map_err(|_| AuthError)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(AuthError);
    }

    Ok(claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn password_round_trip() {
        let stored = hash_password("SecurePass123").unwrap();
        assert!(verify_password("SecurePass123", &stored));
        assert!(!verify_password("SecurePass124", &stored));
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("SecurePass123").unwrap();
        let b = hash_password("SecurePass123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-hash"));
        assert!(!verify_password("anything", "also:not base64"));
    }

    #[test]
    fn token_round_trip() {
        let token = create_access_token("parent@example.com", SECRET, Duration::minutes(30));
        assert_eq!(verify_token(&token, SECRET).unwrap(), "parent@example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_access_token("parent@example.com", SECRET, Duration::minutes(-1));
        assert_eq!(verify_token(&token, SECRET), Err(AuthError));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_access_token("parent@example.com", SECRET, Duration::minutes(30));
        assert_eq!(verify_token(&token, "other-secret"), Err(AuthError));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = create_access_token("parent@example.com", SECRET, Duration::minutes(30));
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(r#"{"sub":"attacker@example.com","iat":0,"exp":9999999999}"#);
        parts[1] = &forged;
        assert_eq!(verify_token(&parts.join("."), SECRET), Err(AuthError));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(verify_token("", SECRET), Err(AuthError));
        assert_eq!(verify_token("a.b", SECRET), Err(AuthError));
        assert_eq!(verify_token("a.b.c", SECRET), Err(AuthError));
    }
}
