// Merge and comparison of manifests

use std::path::Path;

use tracing::debug;

use super::path_utils;
use super::store::Manifest;

impl Manifest {
    /// True if everything recorded here is recorded identically in `other`
    ///
    /// Every path here must exist in `other` with every kind and value this
    /// manifest records; with `paths` the full paths must match too. Paths
    /// and kinds that only `other` has are ignored, so `a.equals(b)` does
    /// not imply `b.equals(a)`.
    pub fn equals(&self, other: &Manifest, paths: bool) -> bool {
        self.data.iter().all(|(path, entry)| {
            let Some(theirs) = other.data.get(path) else {
                return false;
            };
            if paths && entry.fullpath != theirs.fullpath {
                return false;
            }
            entry
                .hashes
                .iter()
                .all(|(kind, value)| theirs.hashes.get(kind) == Some(value))
        })
    }

    /// Copy every entry of `other` into this manifest
    ///
    /// Entries with the same logical path are replaced. With `newpath`, each
    /// copied entry is first rekeyed to `newpath/<file name>`, so manifests
    /// made from different working directories line up. Full paths are
    /// copied unchanged.
    pub fn update(&mut self, other: &Manifest, newpath: Option<&Path>) {
        for (path, entry) in &other.data {
            let key = match newpath {
                Some(newpath) => path_utils::rekey(path, newpath),
                None => path.clone(),
            };
            self.data.insert(key, entry.clone());
        }
    }

    /// Inherit hashes from `other` through any one shared hash
    ///
    /// For each path here, the recorded `(kind, value)` pairs are looked up
    /// in `other` in order; on the first hit every hash of the matching
    /// entry in `other` is copied onto this entry, replacing values for the
    /// same kinds.
    pub fn update_matching_hashes(&mut self, other: &Manifest) {
        for (path, entry) in self.data.iter_mut() {
            let matched = entry
                .hashes
                .iter()
                .find_map(|(kind, value)| other.find(kind, value));

            if let Some(found) = matched.and_then(|found| other.data.get(found)) {
                debug!(path = %path, "inheriting {} hashes", found.hashes.len());
                entry
                    .hashes
                    .extend(found.hashes.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }
}
