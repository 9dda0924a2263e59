//! Corpus loading: reference text files plus the tool metadata catalog
//!
//! The catalog is a JSON object keyed by tool name:
//!
//! ```json
//! {
//!   "nmap": {
//!     "file": "nmap_help.txt",
//!     "category": "reconnaissance",
//!     "subcategory": "network_scanning",
//!     "description": "Network exploration tool",
//!     "tags": ["network", "scanning"],
//!     "use_cases": ["port scanning"]
//!   }
//! }
//! ```
//!
//! Nothing here is fatal. A missing directory yields no documents; a missing
//! or malformed catalog yields documents with default metadata.

use crate::config::RagConfig;
use cyberquery_domain::{DocumentId, DocumentRecord, ToolMetadata, UNKNOWN_CATEGORY};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One tool entry in the metadata catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    /// File name of the reference text this entry describes
    pub file: String,

    /// Display name (falls back to the catalog key)
    #[serde(default)]
    pub name: Option<String>,

    /// Broad category
    #[serde(default)]
    pub category: String,

    /// Narrower category
    #[serde(default)]
    pub subcategory: String,

    /// One-line description
    #[serde(default)]
    pub description: String,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Typical use cases
    #[serde(default)]
    pub use_cases: Vec<String>,
}

impl CatalogEntry {
    /// Convert this entry into document metadata
    pub fn to_metadata(&self, key: &str) -> ToolMetadata {
        let tool_name = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => key.to_string(),
        };
        let category = if self.category.trim().is_empty() {
            UNKNOWN_CATEGORY.to_string()
        } else {
            self.category.trim().to_string()
        };

        ToolMetadata {
            tool_name,
            category,
            subcategory: self.subcategory.trim().to_string(),
            description: self.description.trim().to_string(),
            tags: clean_set(&self.tags),
            use_cases: clean_set(&self.use_cases),
            catalogued: true,
        }
    }
}

fn clean_set(values: &[String]) -> std::collections::BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// The tool metadata catalog, keyed by tool name
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl ToolCatalog {
    /// Parse a catalog from JSON text
    ///
    /// Entries that do not match the expected shape are skipped; only a
    /// document that is not a JSON object is an error.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Map<String, Value> = serde_json::from_str(json)?;
        let mut entries = BTreeMap::new();

        for (key, value) in raw {
            match serde_json::from_value::<CatalogEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => warn!(tool = %key, error = %e, "Skipping malformed catalog entry"),
            }
        }

        Ok(Self { entries })
    }

    /// Load a catalog from disk, falling back to an empty catalog
    pub fn from_file(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Tool catalog unavailable, using default metadata");
                return Self::default();
            }
        };

        match Self::from_json_str(&contents) {
            Ok(catalog) => {
                debug!(path = %path.display(), tools = catalog.len(), "Loaded tool catalog");
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Tool catalog is not valid JSON, using default metadata");
                Self::default()
            }
        }
    }

    /// Find the entry whose `file` matches `file_name`
    pub fn entry_for_file(&self, file_name: &str) -> Option<(&str, &CatalogEntry)> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.file == file_name)
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Look up an entry by tool name
    pub fn get(&self, tool: &str) -> Option<&CatalogEntry> {
        self.entries.get(tool)
    }

    /// Number of catalog entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata for a file, from its catalog entry or derived from its name
    pub fn metadata_for(&self, file_name: &str) -> ToolMetadata {
        match self.entry_for_file(file_name) {
            Some((key, entry)) => entry.to_metadata(key),
            None => ToolMetadata::unknown(tool_name_from_file(file_name)),
        }
    }
}

/// Derive a tool name from a reference file name
///
/// `nmap_help.txt` → `nmap`, `john_man.txt` → `john`
pub fn tool_name_from_file(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    stem.replace("_man", "").replace("_help", "")
}

/// Reads the reference corpus from disk
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    data_dir: PathBuf,
    catalog_path: PathBuf,
}

impl CorpusLoader {
    /// Create a loader for `data_dir` with the catalog at `catalog_path`
    pub fn new(data_dir: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            catalog_path: catalog_path.into(),
        }
    }

    /// Create a loader from retrieval configuration
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.data_dir.clone(), config.catalog_path())
    }

    /// Directory the loader reads from
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load every `*.txt` file in the data directory, sorted by file name
    pub fn load(&self) -> Vec<DocumentRecord> {
        if !self.data_dir.is_dir() {
            warn!(dir = %self.data_dir.display(), "Corpus directory not found, no documents loaded");
            return Vec::new();
        }

        let mut files = match self.text_files() {
            Ok(files) => files,
            Err(e) => {
                warn!(dir = %self.data_dir.display(), error = %e, "Failed to list corpus directory");
                return Vec::new();
            }
        };
        files.sort();

        let catalog = ToolCatalog::from_file(&self.catalog_path);
        let mut documents = Vec::with_capacity(files.len());

        for path in files {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Skipping unreadable corpus file");
                    continue;
                }
            };

            let metadata = catalog.metadata_for(file_name);
            if !metadata.is_catalogued() {
                debug!(file = %file_name, "No catalog entry for corpus file");
            }
            documents.push(DocumentRecord::new(DocumentId::new(file_name), text, metadata));
        }

        info!(
            dir = %self.data_dir.display(),
            documents = documents.len(),
            catalogued_tools = catalog.len(),
            "Loaded reference corpus"
        );
        documents
    }

    fn text_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let is_txt = path.extension().and_then(|e| e.to_str()) == Some("txt");
            if is_txt && path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}
