// Concurrent batch hashing
// Runs independent (path, kind) jobs on a per-batch worker pool

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::hash::HashRegistry;
use super::kind::HashKind;

/// Map every job to a keyed result on a fresh pool of `workers` threads
///
/// The pool is built for this call and dropped before returning, so every
/// job has completed by the time the table is handed back. If the pool
/// cannot be built the jobs run on the calling thread.
pub fn parallel_map<J, K, V, F>(workers: usize, jobs: &[J], f: F) -> HashMap<K, V>
where
    J: Sync,
    K: Eq + Hash + Send,
    V: Send,
    F: Fn(&J) -> (K, V) + Sync + Send,
{
    let workers = workers.max(1);

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| jobs.par_iter().map(&f).collect()),
        Err(e) => {
            warn!("failed to build worker pool, hashing on the calling thread: {}", e);
            jobs.iter().map(&f).collect()
        }
    }
}

/// One hash computation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashJob {
    /// Logical path the result is keyed by
    pub path: String,
    /// File actually read
    pub fullpath: PathBuf,
    pub kind: HashKind,
}

impl HashJob {
    pub fn new(path: impl Into<String>, fullpath: impl Into<PathBuf>, kind: HashKind) -> Self {
        Self {
            path: path.into(),
            fullpath: fullpath.into(),
            kind,
        }
    }
}

/// Completed batch: `(logical path, kind)` to hex digest, `None` when absent
#[derive(Debug, Default)]
pub struct BatchResults {
    table: HashMap<(String, HashKind), Option<String>>,
}

impl BatchResults {
    /// Look up a result; the outer `None` means the pair was never submitted
    pub fn get(&self, path: &str, kind: &HashKind) -> Option<Option<&str>> {
        self.table
            .get(&(path.to_string(), kind.clone()))
            .map(|value| value.as_deref())
    }

    /// Computed value for a pair, if it was submitted and produced one
    pub fn value(&self, path: &str, kind: &HashKind) -> Option<&str> {
        self.get(path, kind).flatten()
    }

    pub fn contains(&self, path: &str, kind: &HashKind) -> bool {
        self.table.contains_key(&(path.to_string(), kind.clone()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn merge(&mut self, other: BatchResults) {
        self.table.extend(other.table);
    }
}

/// Executes batches of hash jobs in parallel
///
/// Holds no state between batches: each call to [`ConcurrentHasher::run_batch`]
/// gets its own pool.
#[derive(Debug, Clone)]
pub struct ConcurrentHasher {
    workers: usize,
    bound: Option<u64>,
    progress: bool,
}

impl ConcurrentHasher {
    /// Create a hasher sized to the available hardware parallelism
    pub fn new() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            bound: None,
            progress: false,
        }
    }

    /// Set the number of worker threads (minimum 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the byte bound used by the bounded fingerprint kinds
    pub fn with_bound(mut self, bound: Option<u64>) -> Self {
        self.bound = bound;
        self
    }

    /// Show a progress bar on stderr while a batch runs
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Compute every job and return the completed table
    ///
    /// A job whose file cannot be read maps to `None`; its siblings are
    /// unaffected. Duplicate `(path, kind)` pairs are computed once per
    /// occurrence and collapse to a single entry.
    pub fn run_batch(&self, jobs: &[HashJob]) -> BatchResults {
        if jobs.is_empty() {
            return BatchResults::default();
        }
        debug!(jobs = jobs.len(), workers = self.workers, "running hash batch");

        let pb = self.progress_bar(jobs.len());
        let bound = self.bound;

        let table = parallel_map(self.workers, jobs, |job| {
            let value = HashRegistry::compute(&job.fullpath, &job.kind, bound);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            ((job.path.clone(), job.kind.clone()), value)
        });

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        BatchResults { table }
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        match ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hashes ({percent}%)")
        {
            Ok(style) => pb.set_style(style.progress_chars("=>-")),
            Err(e) => debug!("progress template rejected: {}", e),
        }
        Some(pb)
    }
}

impl Default for ConcurrentHasher {
    fn default() -> Self {
        Self::new()
    }
}
