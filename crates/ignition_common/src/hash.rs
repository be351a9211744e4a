//! Content hashing for freshness checks and generation identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3.
///
/// Two inputs with the same `ContentHash` are assumed identical. Used to
/// fingerprint non-file resources and to derive generation class names, so
/// that two distinct compiled graphs never collide on a name and an
/// unchanged graph hashes to the same name it was published under.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns a short 16-hex-char form, used as a generation name suffix.
    pub fn short(&self) -> String {
        self.0[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental hasher for deriving a single identity from several inputs.
///
/// Generation identity mixes the kernel name, environment, debug flag, and
/// the compiled graph's content. Each input is length-prefixed so that
/// `("ab", "c")` and `("a", "bc")` produce different identities.
pub struct IdentityHasher {
    inner: xxhash_rust::xxh3::Xxh3,
}

impl IdentityHasher {
    /// Creates an empty identity hasher.
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh3::Xxh3::new(),
        }
    }

    /// Mixes a byte slice into the identity, length-prefixed.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(&(data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    /// Mixes a string into the identity.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.update(s.as_bytes())
    }

    /// Finalizes the identity into a [`ContentHash`].
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.inner.digest128().to_le_bytes())
    }
}

impl Default for IdentityHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"hello world");
        let b = ContentHash::from_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContentHash::from_bytes(b"hello");
        let b = ContentHash::from_bytes(b"world");
        assert_ne!(a, b);
    }

    #[test]
    fn display_format() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h}");
        assert_eq!(s.len(), 32, "Display should be 32 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn short_form() {
        let h = ContentHash::from_bytes(b"test");
        let s = h.short();
        assert_eq!(s.len(), 16);
        assert!(format!("{h}").starts_with(&s));
    }

    #[test]
    fn debug_abbreviated() {
        let h = ContentHash::from_bytes(b"test");
        let s = format!("{h:?}");
        assert!(s.starts_with("ContentHash("));
        assert!(s.ends_with(")"));
    }

    #[test]
    fn serde_roundtrip() {
        let h = ContentHash::from_bytes(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn identity_hasher_deterministic() {
        let mut a = IdentityHasher::new();
        a.update_str("kernel").update_str("dev");
        let mut b = IdentityHasher::new();
        b.update_str("kernel").update_str("dev");
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn identity_hasher_length_prefixed() {
        let mut a = IdentityHasher::new();
        a.update_str("ab").update_str("c");
        let mut b = IdentityHasher::new();
        b.update_str("a").update_str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn identity_hasher_order_sensitive() {
        let mut a = IdentityHasher::new();
        a.update_str("dev").update_str("prod");
        let mut b = IdentityHasher::new();
        b.update_str("prod").update_str("dev");
        assert_ne!(a.finish(), b.finish());
    }
}
