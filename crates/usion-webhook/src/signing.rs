//! Canonical-string construction and HMAC-SHA256 signing (§4.2).
//!
//! Canonical string: `"<unix-seconds>\n<UPPER-METHOD>\n<path>\n<hex sha256 of body>"`.
//! Signature is hex(HMAC-SHA256(canonical, secret)).

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub fn body_digest_hex(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

pub fn canonical_string(unix_seconds: i64, method: &str, path: &str, body_digest_hex: &str) -> String {
    format!("{}\n{}\n{}\n{}", unix_seconds, method.to_uppercase(), path, body_digest_hex)
}

/// Signs `canonical` with `secret`, returning the hex-encoded MAC.
pub fn sign(secret: &str, canonical: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_digest_is_deterministic() {
        assert_eq!(body_digest_hex(b"hello"), body_digest_hex(b"hello"));
        assert_ne!(body_digest_hex(b"hello"), body_digest_hex(b"world"));
    }

    #[test]
    fn canonical_string_has_four_newline_separated_fields() {
        let s = canonical_string(1700000000, "post", "/games/direct/results", "deadbeef");
        let parts: Vec<&str> = s.split('\n').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "1700000000");
        assert_eq!(parts[1], "POST");
    }

    #[test]
    fn same_secret_and_input_signs_identically() {
        let canonical = canonical_string(1, "POST", "/x", "abc");
        assert_eq!(sign("secret", &canonical), sign("secret", &canonical));
    }

    #[test]
    fn different_secrets_sign_differently() {
        let canonical = canonical_string(1, "POST", "/x", "abc");
        assert_ne!(sign("secret-a", &canonical), sign("secret-b", &canonical));
    }
}
