// Hashing core
// Hash kinds, the per-kind algorithm table and the concurrent batch hasher

pub mod hash;
pub mod kind;
pub mod pool;

// Re-export commonly used types for convenience
pub use hash::{effective_bound, HashRegistry, Hasher, DEFAULT_BOUND};
pub use kind::HashKind;
pub use pool::{parallel_map, BatchResults, ConcurrentHasher, HashJob};
