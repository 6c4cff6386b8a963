//! YAML catalog loading
//!
//! A catalog file holds one or more YAML documents, each listing queries,
//! data sources and reports. A directory is scanned recursively for
//! `*.yaml` / `*.yml` files in path order. Everything lands in a
//! [`CatalogIndex`].

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ReportDepsError, ResourceKind};
use crate::lookup::CatalogIndex;
use crate::model::{DataSource, GenerationQuery, Report};

/// Namespace for entries that name none, in a document that names none
pub const DEFAULT_NAMESPACE: &str = "default";

const MAX_NAME_LEN: usize = 253;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?$").expect("valid name regex"));

/// One catalog document
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    /// Default namespace for the entries below
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub queries: Vec<GenerationQuery>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

/// Check a definition name (lowercase DNS subdomain style)
pub fn validate_name(kind: ResourceKind, name: &str) -> Result<(), ReportDepsError> {
    if name.len() <= MAX_NAME_LEN && NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(ReportDepsError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Loads catalog files into an index
pub struct CatalogLoader {
    index: CatalogIndex,
    default_namespace: String,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            index: CatalogIndex::new(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Load a catalog file, or every YAML file below a directory
    pub fn load_path(mut self, path: impl AsRef<Path>) -> Result<Self, ReportDepsError> {
        let path = path.as_ref();
        for file in catalog_files(path)? {
            let content = std::fs::read_to_string(&file).map_err(|source| {
                ReportDepsError::CatalogIo {
                    path: file.clone(),
                    source,
                }
            })?;
            self = self.load_str(&content, &file)?;
        }
        Ok(self)
    }

    /// Load catalog documents from YAML text; `origin` is used in errors
    pub fn load_str(mut self, yaml: &str, origin: &Path) -> Result<Self, ReportDepsError> {
        for document in serde_yaml::Deserializer::from_str(yaml) {
            let doc = CatalogDocument::deserialize(document).map_err(|source| {
                ReportDepsError::CatalogParse {
                    path: origin.to_path_buf(),
                    source,
                }
            })?;
            self.add_document(doc)?;
        }
        debug!(origin = %origin.display(), definitions = self.index.len(), "loaded catalog");
        Ok(self)
    }

    /// Add every entry of `doc`, rejecting invalid names and duplicates
    pub fn add_document(&mut self, doc: CatalogDocument) -> Result<(), ReportDepsError> {
        let namespace = doc
            .namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| self.default_namespace.clone());

        for mut query in doc.queries {
            fill_namespace(&mut query.namespace, &namespace);
            self.check_new(ResourceKind::GenerationQuery, &query.namespace, &query.name)?;
            self.index.insert_query(query);
        }
        for mut ds in doc.data_sources {
            fill_namespace(&mut ds.namespace, &namespace);
            self.check_new(ResourceKind::DataSource, &ds.namespace, &ds.name)?;
            self.index.insert_data_source(ds);
        }
        for mut report in doc.reports {
            fill_namespace(&mut report.namespace, &namespace);
            self.check_new(ResourceKind::Report, &report.namespace, &report.name)?;
            self.index.insert_report(report);
        }
        Ok(())
    }

    pub fn finish(self) -> CatalogIndex {
        self.index
    }

    fn check_new(&self, kind: ResourceKind, namespace: &str, name: &str) -> Result<(), ReportDepsError> {
        validate_name(kind, name)?;
        if self.index.contains(kind, namespace, name) {
            return Err(ReportDepsError::DuplicateEntry {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

fn fill_namespace(target: &mut String, namespace: &str) {
    if target.is_empty() {
        *target = namespace.to_string();
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// The file itself, or the sorted YAML files below a directory
fn catalog_files(path: &Path) -> Result<Vec<PathBuf>, ReportDepsError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| ReportDepsError::CatalogIo {
            path: e.path().map_or_else(|| path.to_path_buf(), Path::to_path_buf),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
        })?;
        if entry.file_type().is_file() && is_yaml(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Load a catalog file or directory with the default namespace
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogIndex, ReportDepsError> {
    Ok(CatalogLoader::new().load_path(path)?.finish())
}
