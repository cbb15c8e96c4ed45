// Document references and resolved locations across storage backends

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions the translation service accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx", "doc"];

/// Storage backend kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Local,
    Blob,
}

/// A concrete storage coordinate, without any existence claim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Place {
    Local(PathBuf),
    Blob { container: String, key: String },
}

impl Place {
    pub fn backend(&self) -> Backend {
        match self {
            Place::Local(_) => Backend::Local,
            Place::Blob { .. } => Backend::Blob,
        }
    }

    /// Final path segment
    pub fn file_name(&self) -> String {
        match self {
            Place::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            Place::Blob { key, .. } => key
                .rsplit('/')
                .next()
                .unwrap_or(key.as_str())
                .to_string(),
        }
    }

    /// Lowercase extension, without the dot
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.file_name())
    }

    /// Output coordinate for a translation into `target_code`: same
    /// backend, same directory or container, stem suffixed with the
    /// language code, same extension.
    pub fn derive_output(&self, target_code: &str) -> Place {
        match self {
            Place::Local(path) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                let name = match path.extension() {
                    Some(ext) => format!("{}_{}.{}", stem, target_code, ext.to_string_lossy()),
                    None => format!("{}_{}", stem, target_code),
                };
                Place::Local(path.with_file_name(name))
            }
            Place::Blob { container, key } => {
                let (dir, file) = match key.rsplit_once('/') {
                    Some((dir, file)) => (Some(dir), file),
                    None => (None, key.as_str()),
                };
                let renamed = match file.rsplit_once('.') {
                    Some((stem, ext)) => format!("{}_{}.{}", stem, target_code, ext),
                    None => format!("{}_{}", file, target_code),
                };
                let key = match dir {
                    Some(dir) => format!("{}/{}", dir, renamed),
                    None => renamed,
                };
                Place::Blob {
                    container: container.clone(),
                    key,
                }
            }
        }
    }
}

impl std::fmt::Display for Place {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Place::Local(path) => write!(f, "{}", path.display()),
            Place::Blob { container, key } => write!(f, "{}/{}", container, key),
        }
    }
}

/// How the user referred to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// Explicit filesystem path, absolute or relative
    LocalPath(PathBuf),
    /// Explicit container/key coordinate
    BlobPath { container: String, key: String },
    /// Fully-qualified storage URL
    BlobUrl { container: String, key: String },
    /// No separators or scheme; needs a multi-root search
    BareFilename(String),
}

/// A user-supplied document reference, keeping the original string for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    pub raw: String,
    pub kind: RefKind,
}

impl DocumentReference {
    /// Classify a raw reference. A relative path whose first segment
    /// names one of the configured blob containers is treated as a blob
    /// coordinate; any other separated path is a local path.
    pub fn parse(raw: &str, containers: &[String]) -> Self {
        let trimmed = raw.trim();

        if let Some(rest) = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
        {
            let path = rest.split_once('/').map(|(_, p)| p).unwrap_or("");
            let (container, key) = match path.split_once('/') {
                Some((c, k)) => (c.to_string(), k.to_string()),
                None => (path.to_string(), String::new()),
            };
            return Self {
                raw: trimmed.to_string(),
                kind: RefKind::BlobUrl { container, key },
            };
        }

        if trimmed.contains('/') || trimmed.contains('\\') {
            let normalized = trimmed.replace('\\', "/");
            let relative = !normalized.starts_with('/') && !has_drive_prefix(trimmed);
            if relative {
                if let Some((first, rest)) = normalized.split_once('/') {
                    if !rest.is_empty() && containers.iter().any(|c| c == first) {
                        return Self {
                            raw: trimmed.to_string(),
                            kind: RefKind::BlobPath {
                                container: first.to_string(),
                                key: rest.to_string(),
                            },
                        };
                    }
                }
            }
            return Self {
                raw: trimmed.to_string(),
                kind: RefKind::LocalPath(PathBuf::from(trimmed)),
            };
        }

        Self {
            raw: trimmed.to_string(),
            kind: RefKind::BareFilename(trimmed.to_string()),
        }
    }

    /// Final path segment of the reference
    pub fn file_name(&self) -> String {
        match &self.kind {
            RefKind::LocalPath(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| self.raw.clone()),
            RefKind::BlobPath { key, .. } | RefKind::BlobUrl { key, .. } => key
                .rsplit('/')
                .next()
                .unwrap_or(key.as_str())
                .to_string(),
            RefKind::BareFilename(name) => name.clone(),
        }
    }

    /// Lowercase extension of the referenced file, without the dot
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.file_name())
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic()
}

/// A storage coordinate confirmed to exist, with size and content type.
/// Never constructed before an existence check succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub place: Place,
    pub size: u64,
    pub content_type: String,
}

impl ResolvedLocation {
    pub fn new(place: Place, size: u64) -> Self {
        let content_type = place
            .extension()
            .map(|ext| content_type_for(&ext))
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            place,
            size,
            content_type,
        }
    }
}

/// Lowercase extension of a filename, without the dot
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// MIME type the translation service expects for a given extension
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        _ => "application/octet-stream",
    }
}
