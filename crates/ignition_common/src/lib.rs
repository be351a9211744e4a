//! Shared primitives for the Ignition bootstrap layer.
//!
//! Currently this is content hashing: generation identity and resource
//! fingerprints are both 128-bit XXH3 hashes.

#![warn(missing_docs)]

mod hash;

pub use hash::{ContentHash, IdentityHasher};
