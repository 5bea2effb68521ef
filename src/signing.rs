use rand::Rng;
use std::fmt::{Debug, Formatter};

/// Context string for deriving the signing key from the configured secret.
/// Changing it invalidates every previously issued signature.
const KEY_DERIVATION_CONTEXT: &str = "turnstile v1 identifier signing";

/// Keyed-hash integrity stamp for opaque identifiers.
///
/// Signing is deterministic: the same value always produces the same hex
/// digest under the same secret, so a digest proves that this server issued
/// the identifier but is not a single-use token. Sessions use it to detect
/// tampered cookies, and CSRF tokens are derived from it by signing the
/// session id.
#[derive(Clone, Copy)]
pub struct Signer {
    key: [u8; 32],
}

impl Signer {
    /// Derive a signer from a secret string.
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_DERIVATION_CONTEXT, secret.as_bytes()),
        }
    }

    /// Create a signer with a random key.
    ///
    /// Signatures from a random signer do not survive a process restart.
    /// Make sure to use a cryptographically secure random generator.
    /// According to the docs of the rand crate, `thread_rng()` is secure.
    pub fn random(rng: &mut impl Rng) -> Self {
        let mut key = [0u8; 32];
        rng.fill(&mut key);
        Self { key }
    }

    /// Compute the hex digest of a value under this signer's key.
    pub fn sign(&self, value: &str) -> String {
        blake3::keyed_hash(&self.key, value.as_bytes())
            .to_hex()
            .to_string()
    }

    /// Check a presented digest against a value.
    ///
    /// The comparison is constant-time. Digests that do not parse as hex
    /// verify false.
    pub fn verify(&self, value: &str, digest: &str) -> bool {
        let Ok(presented) = blake3::Hash::from_hex(digest) else {
            return false;
        };
        blake3::keyed_hash(&self.key, value.as_bytes()) == presented
    }

    /// The CSRF token for a session: the signature of its id.
    ///
    /// Deterministic by contract, so a captured token stays valid exactly
    /// as long as the underlying session id does.
    pub fn csrf_token(&self, session_id: &str) -> String {
        self.sign(session_id)
    }
}

impl Debug for Signer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Never print the key.
        f.write_str("Signer(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_is_deterministic_per_secret() {
        let signer = Signer::new("s3cret");
        let digest = signer.sign("some-session-id");
        assert_eq!(digest, signer.sign("some-session-id"));
        assert_eq!(digest.len(), 64);
        assert!(signer.verify("some-session-id", &digest));
    }

    #[test]
    fn different_secrets_produce_different_digests() {
        let first = Signer::new("one");
        let second = Signer::new("two");
        let digest = first.sign("id");
        assert_ne!(digest, second.sign("id"));
        assert!(!second.verify("id", &digest));
    }

    #[test]
    fn malformed_digests_verify_false() {
        let signer = Signer::new("s3cret");
        assert!(!signer.verify("id", "not-hex"));
        assert!(!signer.verify("id", ""));
        assert!(!signer.verify("id", "deadbeef"));
    }

    #[test]
    fn csrf_token_is_the_session_id_signature() {
        let signer = Signer::new("s3cret");
        assert_eq!(signer.csrf_token("abc"), signer.sign("abc"));
    }
}
