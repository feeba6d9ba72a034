// Hash kind enumeration
// Names every fingerprinting algorithm a manifest can record

use std::fmt;
use std::str::FromStr;

/// A named fingerprinting algorithm recorded in a manifest
///
/// Names that are not recognised parse to [`HashKind::Unsupported`] so that
/// manifests written with other kinds still load and round-trip. Computing an
/// unsupported kind always yields no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HashKind {
    /// Bounded fingerprint over name, size, mtime and a content prefix
    Binhash,
    /// Bounded fingerprint over name, size and a content prefix
    BinhashNomtime,
    /// As `Binhash`, digested with XXH3-128
    BinhashXxh,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_512,
    Blake2b,
    Blake3,
    Unsupported(String),
}

impl HashKind {
    /// Every kind this build can compute, cheapest first
    pub const SUPPORTED: [HashKind; 13] = [
        HashKind::Binhash,
        HashKind::BinhashNomtime,
        HashKind::BinhashXxh,
        HashKind::Md5,
        HashKind::Sha1,
        HashKind::Sha224,
        HashKind::Sha256,
        HashKind::Sha384,
        HashKind::Sha512,
        HashKind::Sha3_256,
        HashKind::Sha3_512,
        HashKind::Blake2b,
        HashKind::Blake3,
    ];

    /// Persisted name of this kind
    pub fn as_str(&self) -> &str {
        match self {
            HashKind::Binhash => "binhash",
            HashKind::BinhashNomtime => "binhash-nomtime",
            HashKind::BinhashXxh => "binhash-xxh",
            HashKind::Md5 => "md5",
            HashKind::Sha1 => "sha1",
            HashKind::Sha224 => "sha224",
            HashKind::Sha256 => "sha256",
            HashKind::Sha384 => "sha384",
            HashKind::Sha512 => "sha512",
            HashKind::Sha3_256 => "sha3-256",
            HashKind::Sha3_512 => "sha3-512",
            HashKind::Blake2b => "blake2b",
            HashKind::Blake3 => "blake3",
            HashKind::Unsupported(name) => name,
        }
    }

    /// True for the size-limited fingerprints
    pub fn is_bounded(&self) -> bool {
        matches!(
            self,
            HashKind::Binhash | HashKind::BinhashNomtime | HashKind::BinhashXxh
        )
    }

    /// True if the digest changes when only the modification time changes
    pub fn is_mtime_sensitive(&self) -> bool {
        matches!(self, HashKind::Binhash | HashKind::BinhashXxh)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, HashKind::Unsupported(_))
    }
}

impl From<&str> for HashKind {
    fn from(name: &str) -> Self {
        match name {
            "binhash" => HashKind::Binhash,
            "binhash-nomtime" => HashKind::BinhashNomtime,
            "binhash-xxh" => HashKind::BinhashXxh,
            "md5" => HashKind::Md5,
            "sha1" => HashKind::Sha1,
            "sha224" => HashKind::Sha224,
            "sha256" => HashKind::Sha256,
            "sha384" => HashKind::Sha384,
            "sha512" => HashKind::Sha512,
            "sha3-256" => HashKind::Sha3_256,
            "sha3-512" => HashKind::Sha3_512,
            "blake2b" => HashKind::Blake2b,
            "blake3" => HashKind::Blake3,
            other => HashKind::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for HashKind {
    fn from(name: String) -> Self {
        HashKind::from(name.as_str())
    }
}

impl From<HashKind> for String {
    fn from(kind: HashKind) -> Self {
        match kind {
            HashKind::Unsupported(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl FromStr for HashKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HashKind::from(s))
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
