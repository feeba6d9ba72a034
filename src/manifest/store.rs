// Manifest store
// Entry table keyed by logical path with add/get/find/delete operations

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use super::config::ManifestConfig;
use super::format::ManifestHeader;
use super::path_utils;
use crate::error::{ManifestError, Result};
use crate::hash::{BatchResults, ConcurrentHasher, HashJob, HashKind};

/// Recorded hashes for one logical path
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ManifestEntry {
    /// Resolved path the hashes were computed from
    pub fullpath: String,
    /// Hex digest per kind, in the order they were first recorded
    #[serde(default)]
    pub hashes: IndexMap<HashKind, String>,
}

/// A recorded hash value as returned by [`Manifest::get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredHash<'a> {
    Valid(&'a str),
    /// Recorded but empty or whitespace; the hash needs regenerating
    Blank,
}

impl<'a> StoredHash<'a> {
    pub fn as_valid(&self) -> Option<&'a str> {
        match self {
            StoredHash::Valid(value) => Some(value),
            StoredHash::Blank => None,
        }
    }
}

/// What `add` does with a kind that is already recorded when `force` is off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Leave recorded kinds alone without recomputing them
    #[default]
    Skip,
    /// Recompute recorded kinds and fail with [`ManifestError::HashExists`]
    /// if any value changed; the manifest is left untouched on failure
    Strict,
}

/// Options for [`Manifest::add`]
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub(crate) kinds: Option<Vec<HashKind>>,
    pub(crate) force: bool,
    pub(crate) shortcircuit: bool,
    pub(crate) fullpaths: Option<Vec<String>>,
    pub(crate) conflict: ConflictPolicy,
}

impl AddOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash with these kinds instead of the manifest defaults
    ///
    /// Every kind named here joins the manifest's default kinds.
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

    /// Overwrite recorded values that differ from the recomputed ones
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Stop hashing a path once one kind has produced a value
    pub fn shortcircuit(mut self, shortcircuit: bool) -> Self {
        self.shortcircuit = shortcircuit;
        self
    }

    /// Record these full paths instead of resolving the logical paths
    pub fn fullpaths<I>(mut self, fullpaths: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fullpaths = Some(fullpaths.into_iter().map(Into::into).collect());
        self
    }

    pub fn conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }
}

// One logical path queued for hashing in an add
struct PendingAdd {
    path: String,
    fullpath: String,
    kinds: Vec<HashKind>,
}

/// A manifest of per-file fingerprints
///
/// Entries keep insertion order, which is the order [`Manifest::find`] scans
/// and the order entries are written out.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub(crate) path: Option<PathBuf>,
    pub(crate) header: ManifestHeader,
    pub(crate) data: IndexMap<String, ManifestEntry>,
    hashes: IndexSet<HashKind>,
    config: ManifestConfig,
}

impl Manifest {
    /// Create an empty manifest backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::build(Some(path.into()), ManifestConfig::default())
    }

    /// Create an empty manifest backed by `path` with custom settings
    pub fn with_config(path: impl Into<PathBuf>, config: ManifestConfig) -> Self {
        Self::build(Some(path.into()), config)
    }

    /// Create an empty manifest with no backing file
    pub fn in_memory() -> Self {
        Self::build(None, ManifestConfig::default())
    }

    fn build(path: Option<PathBuf>, config: ManifestConfig) -> Self {
        Self {
            path,
            header: ManifestHeader::default(),
            data: IndexMap::new(),
            hashes: config.default_kinds.iter().cloned().collect(),
            config,
        }
    }

    /// File this manifest loads from and dumps to
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    /// Kinds used when `add`/`check` are not told which kinds to use
    pub fn default_kinds(&self) -> &IndexSet<HashKind> {
        &self.hashes
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical paths in manifest order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.data.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.data.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.data.contains_key(path)
    }

    /// Full path recorded for a logical path
    pub fn fullpath(&self, path: &str) -> Option<&str> {
        self.data.get(path).map(|entry| entry.fullpath.as_str())
    }

    /// Recorded hash for `path` and `kind`
    ///
    /// `None` if the path or kind was never recorded; [`StoredHash::Blank`]
    /// if a value is recorded but empty.
    pub fn get(&self, path: &str, kind: &HashKind) -> Option<StoredHash<'_>> {
        let value = self.data.get(path)?.hashes.get(kind)?;
        if value.trim().is_empty() {
            Some(StoredHash::Blank)
        } else {
            Some(StoredHash::Valid(value))
        }
    }

    /// First logical path, in manifest order, whose `kind` hash equals `value`
    ///
    /// Blank recorded values never match.
    pub fn find(&self, kind: &HashKind, value: &str) -> Option<&str> {
        self.data
            .keys()
            .find(|path| {
                self.get(path, kind)
                    .and_then(|stored| stored.as_valid())
                    .is_some_and(|stored| stored == value)
            })
            .map(String::as_str)
    }

    /// Insert or replace an entry directly, returning the previous one
    ///
    /// An entry without hashes is not stored; any existing entry for the
    /// path is removed instead.
    pub fn insert(&mut self, path: impl Into<String>, entry: ManifestEntry) -> Option<ManifestEntry> {
        let path = path.into();
        if entry.hashes.is_empty() {
            return self.data.shift_remove(&path);
        }
        self.data.insert(path, entry)
    }

    /// Remove the entry for `path`
    pub fn delete(&mut self, path: &str) -> Result<ManifestEntry> {
        self.data
            .shift_remove(path)
            .ok_or_else(|| ManifestError::PathNotFound {
                path: path.to_string(),
            })
    }

    /// Hash `paths` and record the results
    ///
    /// Kinds come from `options` or, if none are named, the manifest
    /// defaults. Kinds that produce no value for a file (unreadable file,
    /// unsupported kind) are not recorded, and a path that ends up with no
    /// hashes at all is left out of the manifest.
    pub fn add<S: AsRef<str>>(&mut self, paths: &[S], options: &AddOptions) -> Result<()> {
        let paths: Vec<String> = paths.iter().map(|p| p.as_ref().to_string()).collect();
        let fullpaths = match &options.fullpaths {
            Some(fullpaths) => {
                check_lengths(paths.len(), fullpaths.len())?;
                fullpaths.clone()
            }
            None => paths.iter().map(|p| path_utils::realpath(p)).collect(),
        };
        self.add_targets(paths.into_iter().zip(fullpaths).collect(), options)
    }

    /// Hash every path already in the manifest, e.g. to add a new kind to all of them
    ///
    /// Recorded full paths are kept unless `options` supplies new ones.
    pub fn add_existing(&mut self, options: &AddOptions) -> Result<()> {
        let mut targets: Vec<(String, String)> = self
            .data
            .iter()
            .map(|(path, entry)| (path.clone(), entry.fullpath.clone()))
            .collect();

        if let Some(fullpaths) = &options.fullpaths {
            check_lengths(targets.len(), fullpaths.len())?;
            for (target, fullpath) in targets.iter_mut().zip(fullpaths) {
                target.1 = fullpath.clone();
            }
        }

        self.add_targets(targets, options)
    }

    fn add_targets(&mut self, targets: Vec<(String, String)>, options: &AddOptions) -> Result<()> {
        // Later duplicates of a path win
        let targets: IndexMap<String, String> = targets.into_iter().collect();

        let kinds: Vec<HashKind> = match &options.kinds {
            Some(kinds) => {
                for kind in kinds {
                    self.hashes.insert(kind.clone());
                }
                kinds.iter().cloned().collect::<IndexSet<_>>().into_iter().collect()
            }
            None => self.hashes.iter().cloned().collect(),
        };

        let recompute = options.force || options.conflict == ConflictPolicy::Strict;
        let pending: Vec<PendingAdd> = targets
            .into_iter()
            .map(|(path, fullpath)| {
                let recorded = self.data.get(&path).map(|entry| &entry.hashes);
                let kinds = kinds
                    .iter()
                    .filter(|kind| recompute || !recorded.is_some_and(|h| h.contains_key(*kind)))
                    .cloned()
                    .collect();
                PendingAdd {
                    path,
                    fullpath,
                    kinds,
                }
            })
            .collect();

        let hasher = self.config.hasher();
        let results = if options.shortcircuit {
            run_in_rounds(&hasher, &pending)
        } else {
            let jobs: Vec<HashJob> = pending
                .iter()
                .flat_map(|p| {
                    p.kinds
                        .iter()
                        .map(|kind| HashJob::new(p.path.as_str(), p.fullpath.as_str(), kind.clone()))
                })
                .collect();
            hasher.run_batch(&jobs)
        };

        if options.conflict == ConflictPolicy::Strict && !options.force {
            self.check_conflicts(&pending, &results)?;
        }

        for PendingAdd {
            path,
            fullpath,
            kinds,
        } in pending
        {
            let mut hashes = self
                .data
                .get(&path)
                .map(|entry| entry.hashes.clone())
                .unwrap_or_default();

            for kind in &kinds {
                let Some(value) = results.value(&path, kind) else {
                    continue;
                };
                if hashes.get(kind).is_some_and(|old| old != value) && !options.force {
                    continue;
                }
                hashes.insert(kind.clone(), value.to_string());
                if options.shortcircuit {
                    break;
                }
            }

            if hashes.is_empty() {
                warn!(path = %path, "no usable hash, leaving out of manifest");
                self.data.shift_remove(&path);
            } else {
                let entry = self.data.entry(path).or_default();
                entry.fullpath = fullpath;
                entry.hashes = hashes;
            }
        }

        Ok(())
    }

    fn check_conflicts(&self, pending: &[PendingAdd], results: &BatchResults) -> Result<()> {
        for p in pending {
            let Some(entry) = self.data.get(&p.path) else {
                continue;
            };
            for kind in &p.kinds {
                if let (Some(old), Some(new)) = (entry.hashes.get(kind), results.value(&p.path, kind)) {
                    if old != new {
                        return Err(ManifestError::HashExists {
                            path: p.path.clone(),
                            kind: kind.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn hasher(&self) -> ConcurrentHasher {
        self.config.hasher()
    }
}

fn check_lengths(paths: usize, fullpaths: usize) -> Result<()> {
    if paths != fullpaths {
        return Err(ManifestError::InvalidArguments {
            message: format!(
                "{} full paths given for {} paths; counts must match",
                fullpaths, paths
            ),
        });
    }
    Ok(())
}

/// Hash one kind per round, dropping paths as soon as a kind yields a value
fn run_in_rounds(hasher: &ConcurrentHasher, pending: &[PendingAdd]) -> BatchResults {
    let mut results = BatchResults::default();
    let mut unresolved: Vec<&PendingAdd> = pending.iter().collect();
    let mut round = 0;

    loop {
        let jobs: Vec<HashJob> = unresolved
            .iter()
            .filter_map(|p| {
                p.kinds
                    .get(round)
                    .map(|kind| HashJob::new(p.path.as_str(), p.fullpath.as_str(), kind.clone()))
            })
            .collect();
        if jobs.is_empty() {
            break;
        }
        debug!(round, jobs = jobs.len(), "short-circuit hashing round");

        let batch = hasher.run_batch(&jobs);
        unresolved.retain(|p| match p.kinds.get(round) {
            Some(kind) => batch.value(&p.path, kind).is_none(),
            None => false,
        });
        results.merge(batch);
        round += 1;
    }

    results
}
