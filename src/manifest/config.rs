// Manifest configuration
// Defaults applied when a manifest is created

use crate::hash::{ConcurrentHasher, HashKind};

/// Settings a [`Manifest`](super::Manifest) is created with
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestConfig {
    /// Kinds used by `add`/`check` when none are named, cheapest first
    pub default_kinds: Vec<HashKind>,
    /// Content bytes covered by the bounded kinds; `None` means 100MB
    pub hashmax: Option<u64>,
    /// Worker threads per hashing batch
    pub workers: usize,
    /// Draw a progress bar while batches run
    pub progress: bool,
}

impl ManifestConfig {
    pub fn new() -> Self {
        Self {
            default_kinds: vec![HashKind::Binhash, HashKind::Md5],
            hashmax: None,
            workers: num_cpus::get().max(1),
            progress: false,
        }
    }

    pub fn with_default_kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<HashKind>,
    {
        self.default_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hashmax(mut self, hashmax: Option<u64>) -> Self {
        self.hashmax = hashmax;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Batch hasher configured from these settings
    pub(crate) fn hasher(&self) -> ConcurrentHasher {
        ConcurrentHasher::new()
            .with_workers(self.workers)
            .with_bound(self.hashmax)
            .with_progress(self.progress)
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self::new()
    }
}
