//! Key hashing.

use sha2::{Digest, Sha256};

/// Length of a key hash in hex characters.
pub const KEY_HASH_LEN: usize = 64;

/// Hashes a key within an application identity.
///
/// Returns lowercase hex of `SHA-256(key || app_id)`. The identity scopes
/// the hash, so two applications storing the same key never share a
/// content address.
#[must_use]
pub fn hash_key(key: &str, app_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(app_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vector() {
        // SHA-256("abc")
        assert_eq!(
            hash_key("ab", "c"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn scoped_by_identity() {
        assert_ne!(hash_key("prefix", "app-a"), hash_key("prefix", "app-b"));
    }

    #[test]
    fn swapped_content_differs() {
        assert_ne!(hash_key("key", "app"), hash_key("app", "key"));
    }

    proptest! {
        #[test]
        fn deterministic_lowercase_hex(key in ".{0,32}", app in ".{1,32}") {
            let a = hash_key(&key, &app);
            prop_assert_eq!(&a, &hash_key(&key, &app));
            prop_assert_eq!(a.len(), KEY_HASH_LEN);
            prop_assert!(a.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }
}
