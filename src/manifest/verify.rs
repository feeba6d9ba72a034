// Verification module
// Re-hashes recorded files and reduces the matches into a verdict

use indexmap::IndexMap;
use tracing::debug;

use super::store::Manifest;
use crate::hash::{HashJob, HashKind};

/// Newly computed values for mismatching hashes: path, then kind
///
/// `None` means the hash could not be recomputed at all.
pub type HashVals = IndexMap<String, IndexMap<HashKind, Option<String>>>;

/// How several match results combine into one verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    /// Every result must match; vacuously true when there are none
    #[default]
    All,
    /// At least one result must match; false when there are none
    Any,
}

impl Condition {
    pub fn apply<I: IntoIterator<Item = bool>>(self, results: I) -> bool {
        let mut results = results.into_iter();
        match self {
            Condition::All => results.all(|ok| ok),
            Condition::Any => results.any(|ok| ok),
        }
    }
}

/// Options for [`Manifest::check`]
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub(crate) kinds: Option<Vec<HashKind>>,
    pub(crate) shortcircuit: bool,
    pub(crate) condition: Condition,
}

impl CheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test these kinds instead of the manifest defaults
    pub fn kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<HashKind>,
    {
        self.kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    pub fn kind(self, kind: impl Into<HashKind>) -> Self {
        self.kinds([kind.into()])
    }

    /// Decide each path on the first kind evaluated for it
    ///
    /// The verdict for a path then depends on which kind comes first in
    /// the kind order. Combined with a condition that would look past that
    /// first result (a match under `All`, a mismatch under `Any`) the
    /// outcome is order dependent. Either flag is reliable on its own.
    pub fn shortcircuit(mut self, shortcircuit: bool) -> Self {
        self.shortcircuit = shortcircuit;
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

impl Manifest {
    /// Verify every path in the manifest
    ///
    /// See [`Manifest::check_files`].
    pub fn check(&self, options: &CheckOptions, hashvals: Option<&mut HashVals>) -> bool {
        let paths: Vec<String> = self.data.keys().cloned().collect();
        self.check_files(&paths, options, hashvals)
    }

    /// Recompute recorded hashes for `paths` and compare them with the manifest
    ///
    /// For each path only kinds it actually records are tested, so entries
    /// with different hash sets can share a manifest. A path is good when
    /// `condition` holds over its kind results and at least one kind was
    /// tested; unknown paths and paths with nothing to test are bad. The
    /// overall verdict applies `condition` to the per-path verdicts.
    ///
    /// `hashvals`, if given, is cleared and then filled with the recomputed
    /// value of every mismatching `(path, kind)`.
    pub fn check_files<S: AsRef<str>>(
        &self,
        paths: &[S],
        options: &CheckOptions,
        mut hashvals: Option<&mut HashVals>,
    ) -> bool {
        if let Some(vals) = hashvals.as_deref_mut() {
            vals.clear();
        }

        let kinds: Vec<HashKind> = match &options.kinds {
            Some(kinds) => kinds.clone(),
            None => self.hashes_for_check(),
        };

        let mut jobs = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let Some(entry) = self.data.get(path) else {
                continue;
            };
            for kind in &kinds {
                if entry.hashes.contains_key(kind) {
                    jobs.push(HashJob::new(path, entry.fullpath.as_str(), kind.clone()));
                }
            }
        }
        debug!(paths = paths.len(), jobs = jobs.len(), "checking manifest");

        let results = self.hasher().run_batch(&jobs);

        let mut status = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let Some(entry) = self.data.get(path) else {
                debug!(path = %path, "not in manifest");
                status.push(false);
                continue;
            };

            let mut file_status = Vec::new();
            for kind in &kinds {
                let Some(recorded) = entry.hashes.get(kind) else {
                    continue;
                };
                let Some(computed) = results.get(path, kind) else {
                    continue;
                };

                let matched = computed == Some(recorded.as_str());
                if !matched {
                    if let Some(vals) = hashvals.as_deref_mut() {
                        vals.entry(path.to_string())
                            .or_default()
                            .insert(kind.clone(), computed.map(str::to_string));
                    }
                }
                file_status.push(matched);

                if options.shortcircuit {
                    break;
                }
            }

            // A path with nothing tested fails so it gets regenerated
            status.push(!file_status.is_empty() && options.condition.apply(file_status));
        }

        options.condition.apply(status)
    }

    fn hashes_for_check(&self) -> Vec<HashKind> {
        self.default_kinds().iter().cloned().collect()
    }
}
