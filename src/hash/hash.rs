// Hash computation module
// Provides the per-kind algorithm table and file hashing logic

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use blake2::Blake2b512;
use blake3::Hasher as Blake3Hasher;
use md5::Md5;
use memmap2::Mmap;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};
use tracing::warn;
use xxhash_rust::xxh3::Xxh3;

use super::kind::HashKind;
use crate::error::{ManifestError, Result};

/// Default number of content bytes covered by the bounded fingerprints (100MB)
pub const DEFAULT_BOUND: u64 = 100 * 1024 * 1024;

// Read buffer for streaming digests
const BUFFER_SIZE: usize = 1024 * 1024;

// Files at or above this size are streamed instead of memory mapped
const MMAP_THRESHOLD: u64 = 2 * 1024 * 1024 * 1024;

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the raw digest bytes
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

// Any RustCrypto digest
struct DigestWrapper<D>(D);

impl<D: Digest + Send> Hasher for DigestWrapper<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

// BLAKE3 with the rayon feature spreads large updates over all cores
struct Blake3Wrapper(Blake3Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update_rayon(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

// XXH3-128, canonical big-endian output
struct Xxh128Wrapper(Xxh3);

impl Hasher for Xxh128Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.digest128().to_be_bytes().to_vec()
    }
}

fn digest<D: Digest + Send + 'static>() -> Box<dyn Hasher> {
    Box::new(DigestWrapper(D::new()))
}

/// Registry mapping each [`HashKind`] to its algorithm
pub struct HashRegistry;

impl HashRegistry {
    /// Get a hasher instance for the digest underlying `kind`
    ///
    /// The bounded kinds return the digest their fingerprint is fed into.
    pub fn get_hasher(kind: &HashKind) -> Result<Box<dyn Hasher>> {
        let hasher = match kind {
            HashKind::Binhash | HashKind::BinhashNomtime | HashKind::Md5 => digest::<Md5>(),
            HashKind::BinhashXxh => Box::new(Xxh128Wrapper(Xxh3::new())),
            HashKind::Sha1 => digest::<Sha1>(),
            HashKind::Sha224 => digest::<Sha224>(),
            HashKind::Sha256 => digest::<Sha256>(),
            HashKind::Sha384 => digest::<Sha384>(),
            HashKind::Sha512 => digest::<Sha512>(),
            HashKind::Sha3_256 => digest::<Sha3_256>(),
            HashKind::Sha3_512 => digest::<Sha3_512>(),
            HashKind::Blake2b => digest::<Blake2b512>(),
            HashKind::Blake3 => Box::new(Blake3Wrapper(Blake3Hasher::new())),
            HashKind::Unsupported(name) => {
                return Err(ManifestError::UnsupportedAlgorithm {
                    algorithm: name.clone(),
                })
            }
        };
        Ok(hasher)
    }

    /// Compute the hex digest of `path` for `kind`, or `None` if it cannot be computed
    ///
    /// Failures are reported through `tracing` and never propagated, so one
    /// bad file cannot abort the rest of a batch.
    pub fn compute(path: &Path, kind: &HashKind, bound: Option<u64>) -> Option<String> {
        match Self::try_compute(path, kind, bound) {
            Ok(hash) => Some(hash),
            Err(ManifestError::UnsupportedAlgorithm { algorithm }) => {
                warn!(
                    path = %path.display(),
                    "unsupported hash function {}, skipping",
                    algorithm
                );
                None
            }
            Err(e) => {
                warn!(path = %path.display(), kind = %kind, "cannot hash, skipping: {}", e);
                None
            }
        }
    }

    /// Compute the hex digest of `path` for `kind`
    ///
    /// `bound` only applies to the bounded kinds; `None` or zero means
    /// [`DEFAULT_BOUND`].
    pub fn try_compute(path: &Path, kind: &HashKind, bound: Option<u64>) -> Result<String> {
        let mut hasher = Self::get_hasher(kind)?;

        if kind.is_bounded() {
            let bound = effective_bound(bound);
            hash_bounded(&mut hasher, path, bound, kind.is_mtime_sensitive())?;
        } else {
            hash_full(&mut hasher, path)?;
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

/// Resolve an optional bound to the number of bytes actually hashed
pub fn effective_bound(bound: Option<u64>) -> u64 {
    match bound {
        Some(0) | None => DEFAULT_BOUND,
        Some(n) => n,
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| ManifestError::from_io_error(e, "reading", Some(path.to_path_buf())))
}

/// Stream the entire file through `hasher`
///
/// Files smaller than 2GB are memory mapped; larger or empty files are read
/// through a 1MB buffer.
fn hash_full(hasher: &mut Box<dyn Hasher>, path: &Path) -> Result<()> {
    let file = open(path)?;
    let file_size = file
        .metadata()
        .map_err(|e| ManifestError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?
        .len();

    if file_size > 0 && file_size < MMAP_THRESHOLD {
        // SAFETY: the mapping is read-only and dropped before returning. A file
        // modified concurrently yields an inconsistent digest, which check
        // reports as a mismatch.
        if let Ok(mmap) = unsafe { Mmap::map(&file) } {
            hasher.update(&mmap[..]);
            return Ok(());
        }
    }

    hash_reader(hasher, file, path)
}

/// Hash the metadata preamble followed by exactly the first `bound` bytes
fn hash_bounded(
    hasher: &mut Box<dyn Hasher>,
    path: &Path,
    bound: u64,
    include_mtime: bool,
) -> Result<()> {
    let file = open(path)?;
    let metadata = file
        .metadata()
        .map_err(|e| ManifestError::from_io_error(e, "reading metadata", Some(path.to_path_buf())))?;

    let mut preamble = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    preamble.push_str(&metadata.len().to_string());
    if include_mtime {
        let modified = metadata
            .modified()
            .map_err(|e| ManifestError::from_io_error(e, "reading mtime", Some(path.to_path_buf())))?;
        preamble.push_str(&format_mtime(modified));
    }
    hasher.update(preamble.as_bytes());

    hash_reader(hasher, file.take(bound), path)
}

fn hash_reader(hasher: &mut Box<dyn Hasher>, mut reader: impl Read, path: &Path) -> Result<()> {
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| ManifestError::from_io_error(e, "reading", Some(path.to_path_buf())))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(())
}

/// Render a modification time as fractional seconds since the epoch
///
/// Shortest round-trip decimal, always with a fractional part, e.g.
/// `1700000000.0` or `1700000000.25`.
pub(crate) fn format_mtime(modified: SystemTime) -> String {
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    };
    let mut text = secs.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}
