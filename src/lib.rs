// Library module for yamanifest
// Re-exports modules for use in the yamf binary, integration tests and external crates

pub mod error;
pub mod hash;
pub mod manifest;

pub use error::ManifestError;
pub use hash::{ConcurrentHasher, HashKind, HashRegistry};
pub use manifest::{
    AddOptions, CheckOptions, Condition, ConflictPolicy, HashVals, Manifest, ManifestConfig,
    ManifestEntry, StoredHash,
};
