//! Node key pairs and their printable encoding.
//!
//! A node is identified by an Ed25519 key pair. Keys travel as text:
//! `priv-v0-` or `pub-v0-` followed by 64 lowercase hex digits.

use crate::utils::{KeyError, Result};
use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;

/// Prefix of an encoded private key
pub const PRIVATE_KEY_PREFIX: &str = "priv-v0-";

/// Prefix of an encoded public key
pub const PUBLIC_KEY_PREFIX: &str = "pub-v0-";

/// Ed25519 key pair identifying a node
#[derive(Clone)]
pub struct NodeKeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl NodeKeyPair {
    /// Generate a new random key pair
    ///
    /// # Example
    ///
    /// ```rust
    /// use addrscout::crypto::NodeKeyPair;
    ///
    /// let keypair = NodeKeyPair::generate();
    /// assert!(keypair.public_string().starts_with("pub-v0-"));
    /// ```
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Rebuild a key pair from its 32-byte private seed
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Parse a `priv-v0-<hex>` string.
    ///
    /// Surrounding whitespace is ignored; hex digits may be either case.
    ///
    /// # Errors
    ///
    /// Returns a `KeyError` if the prefix is missing, the body is not hex,
    /// or it does not decode to exactly 32 bytes.
    pub fn from_private_string(encoded: &str) -> Result<Self> {
        let body = encoded
            .trim()
            .strip_prefix(PRIVATE_KEY_PREFIX)
            .ok_or(KeyError::InvalidPrefix {
                expected: PRIVATE_KEY_PREFIX,
            })?;

        let bytes = hex::decode(body)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| KeyError::InvalidLength {
            expected: SECRET_KEY_LENGTH,
            actual: bytes.len(),
        })?;

        Ok(Self::from_seed(&seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Public key bytes
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.verifying_key.to_bytes()
    }

    /// `priv-v0-<hex>` encoding of the private seed
    pub fn private_string(&self) -> String {
        format!("{}{}", PRIVATE_KEY_PREFIX, hex::encode(self.signing_key.to_bytes()))
    }

    /// `pub-v0-<hex>` encoding of the public key
    pub fn public_string(&self) -> String {
        format!("{}{}", PUBLIC_KEY_PREFIX, hex::encode(self.public_key_bytes()))
    }
}

// Only the public half is ever printed.
impl fmt::Debug for NodeKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeKeyPair")
            .field("public", &self.public_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ScoutError;

    #[test]
    fn test_generate_encodes_both_halves() {
        let keypair = NodeKeyPair::generate();
        let private = keypair.private_string();
        let public = keypair.public_string();

        assert!(private.starts_with(PRIVATE_KEY_PREFIX));
        assert!(public.starts_with(PUBLIC_KEY_PREFIX));
        assert_eq!(private.len(), PRIVATE_KEY_PREFIX.len() + 64);
        assert_eq!(public.len(), PUBLIC_KEY_PREFIX.len() + 64);
        assert_ne!(NodeKeyPair::generate().public_string(), public);
    }

    #[test]
    fn test_derive_public_key_from_private_string() {
        let keypair = NodeKeyPair::generate();
        let derived = NodeKeyPair::from_private_string(&keypair.private_string()).unwrap();
        assert_eq!(derived.public_string(), keypair.public_string());
        assert_eq!(derived.private_string(), keypair.private_string());
    }

    #[test]
    fn test_known_seed() {
        // RFC 8032 test vector 1
        let private = "priv-v0-9D61B19DEFFD5A60BA844AF492EC2CC44449C5697B326919703BAC031CAE7F60\n";
        let keypair = NodeKeyPair::from_private_string(private).unwrap();
        assert_eq!(
            keypair.public_string(),
            "pub-v0-d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn test_rejects_malformed_private_strings() {
        let public = NodeKeyPair::generate().public_string();
        assert!(matches!(
            NodeKeyPair::from_private_string(&public),
            Err(ScoutError::Key(KeyError::InvalidPrefix { .. }))
        ));
        assert!(matches!(
            NodeKeyPair::from_private_string("priv-v0-zz"),
            Err(ScoutError::Key(KeyError::InvalidEncoding { .. }))
        ));
        assert!(matches!(
            NodeKeyPair::from_private_string("priv-v0-abcd"),
            Err(ScoutError::Key(KeyError::InvalidLength { expected: 32, actual: 2 }))
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let keypair = NodeKeyPair::generate();
        let printed = format!("{keypair:?}");
        assert!(printed.contains(&keypair.public_string()));
        assert!(!printed.contains(&keypair.private_string()));
    }
}
