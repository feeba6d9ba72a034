// Manifest file format
// Reads and writes the two-document YAML stream: header, then entry table

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yml::Value;
use tracing::{debug, warn};

use super::config::ManifestConfig;
use super::store::{Manifest, ManifestEntry};
use super::wildcard;
use crate::error::{ManifestError, Result};

/// Value the header `format` key must hold
pub const FORMAT_TAG: &str = "yamanifest";

/// Version written into new manifests
pub const FORMAT_VERSION: f64 = 1.0;

// Placeholder origin for manifests without a backing file
const IN_MEMORY: &str = "<memory>";

/// First document of a manifest file
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestHeader {
    pub format: String,
    #[serde(default = "default_version")]
    pub version: f64,
    /// Any further metadata keys, preserved on round trip
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

fn default_version() -> f64 {
    FORMAT_VERSION
}

impl Default for ManifestHeader {
    fn default() -> Self {
        Self {
            format: FORMAT_TAG.to_string(),
            version: FORMAT_VERSION,
            extra: IndexMap::new(),
        }
    }
}

type EntryTable = IndexMap<String, ManifestEntry>;

impl Manifest {
    /// Create a manifest backed by `path` and load it
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(path, ManifestConfig::default())
    }

    pub fn open_with_config(path: impl Into<PathBuf>, config: ManifestConfig) -> Result<Self> {
        let mut manifest = Self::with_config(path, config);
        manifest.load()?;
        Ok(manifest)
    }

    pub fn header(&self) -> &ManifestHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut ManifestHeader {
        &mut self.header
    }

    /// Replace header and entries with the contents of the backing file
    ///
    /// Default kinds are not touched. On error the manifest is unchanged.
    pub fn load(&mut self) -> Result<()> {
        let path = self.require_path()?.to_path_buf();
        let text = fs::read_to_string(&path)
            .map_err(|e| ManifestError::from_io_error(e, "reading manifest", Some(path.clone())))?;

        let (header, data) = parse_documents(&text, &path)?;
        debug!(path = %path.display(), entries = data.len(), "loaded manifest");
        self.header = header;
        self.data = data;
        Ok(())
    }

    /// Replace header and entries with those parsed from a YAML stream
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let origin = self.origin();
        let (header, data) = parse_documents(text, &origin)?;
        self.header = header;
        self.data = data;
        Ok(())
    }

    /// Write the manifest to its backing file
    pub fn dump(&self) -> Result<()> {
        let path = self.require_path()?;
        let text = self.to_yaml()?;
        fs::write(path, text)
            .map_err(|e| ManifestError::from_io_error(e, "writing manifest", Some(path.to_path_buf())))?;
        debug!(path = %path.display(), entries = self.data.len(), "wrote manifest");
        Ok(())
    }

    /// Render the header and entry documents as one YAML stream
    pub fn to_yaml(&self) -> Result<String> {
        let header = serde_yml::to_string(&self.header).map_err(|e| self.yaml_error(e))?;
        let body = serde_yml::to_string(&self.data).map_err(|e| self.yaml_error(e))?;
        Ok(format!("{}---\n{}", header, body))
    }

    /// Search `dir` recursively for the first loadable, non-empty manifest
    ///
    /// Candidates are `*.yml` and `*.yaml` files in sorted order.
    pub fn find_manifest(dir: &Path) -> Option<Manifest> {
        for file in wildcard::find_files(dir, &["*.yml", "*.yaml"]) {
            match Manifest::open(&file) {
                Ok(manifest) if !manifest.is_empty() => return Some(manifest),
                Ok(_) => debug!(path = %file.display(), "skipping empty manifest"),
                Err(e) => debug!(path = %file.display(), "not a manifest: {}", e),
            }
        }
        None
    }

    fn require_path(&self) -> Result<&Path> {
        self.path().ok_or_else(|| ManifestError::InvalidArguments {
            message: "manifest has no backing file".to_string(),
        })
    }

    fn origin(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(IN_MEMORY))
    }

    fn yaml_error(&self, source: serde_yml::Error) -> ManifestError {
        ManifestError::Yaml {
            path: self.origin(),
            source,
        }
    }
}

/// Parse a header document and an entry document, validating the format tag
fn parse_documents(text: &str, origin: &Path) -> Result<(ManifestHeader, EntryTable)> {
    let yaml_error = |source: serde_yml::Error| ManifestError::Yaml {
        path: origin.to_path_buf(),
        source,
    };

    let mut documents = Vec::new();
    for document in serde_yml::Deserializer::from_str(text) {
        documents.push(Value::deserialize(document).map_err(yaml_error)?);
    }

    let [header, body]: [Value; 2] = documents.try_into().map_err(|docs: Vec<Value>| {
        ManifestError::MalformedManifest {
            path: origin.to_path_buf(),
            reason: format!("expected a header and an entry document, found {} documents", docs.len()),
        }
    })?;

    match header.get("format") {
        Some(Value::String(tag)) if tag == FORMAT_TAG => {}
        Some(other) => {
            return Err(ManifestError::FormatMismatch {
                found: Some(render(other)),
            })
        }
        None => return Err(ManifestError::FormatMismatch { found: None }),
    }
    let header: ManifestHeader = serde_yml::from_value(header).map_err(yaml_error)?;

    let data: EntryTable = match body {
        Value::Null => IndexMap::new(),
        body => serde_yml::from_value(body).map_err(yaml_error)?,
    };

    let data = data
        .into_iter()
        .filter(|(path, entry)| {
            if entry.hashes.is_empty() {
                warn!(path = %path, "dropping manifest entry without hashes");
            }
            !entry.hashes.is_empty()
        })
        .collect();

    Ok((header, data))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}
