// Manifest library
// Store, verification, merging and persistence of per-file fingerprints

pub mod compare;
pub mod config;
pub mod format;
pub mod path_utils;
pub mod store;
pub mod verify;
pub mod wildcard;

// Re-export commonly used types for convenience
pub use config::ManifestConfig;
pub use format::{ManifestHeader, FORMAT_TAG, FORMAT_VERSION};
pub use store::{AddOptions, ConflictPolicy, Manifest, ManifestEntry, StoredHash};
pub use verify::{CheckOptions, Condition, HashVals};
