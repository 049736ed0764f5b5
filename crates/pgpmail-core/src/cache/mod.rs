//! Local content cache.
//!
//! Persists folder snapshots, finished renderings and undecrypted
//! ciphertext so views can be served without network or decrypt work.

mod key;
mod store;

pub use key::CacheKey;
pub use store::ContentCache;
