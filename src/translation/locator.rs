// Storage locator - resolves a document reference to one concrete,
// existing location across local roots and blob containers

use super::blob::{ObjectStore, StorageError};
use super::reference::{
    Backend, DocumentReference, Place, RefKind, ResolvedLocation, SUPPORTED_EXTENSIONS,
    extension_of,
};
use crate::config::StorageConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error(
        "unsupported file format '.{extension}' for '{reference}': supported formats are .pdf, .docx, .doc"
    )]
    UnsupportedFormat { reference: String, extension: String },

    #[error("{}", describe_not_found(.reference, .searched, .similar))]
    NotFound {
        reference: String,
        searched: Vec<String>,
        similar: Vec<String>,
    },

    #[error(
        "'{reference}' matches more than one stored document: {}",
        .candidates.join(", ")
    )]
    Ambiguous {
        reference: String,
        candidates: Vec<String>,
    },

    #[error("access denied while checking {0}")]
    AccessDenied(String),

    #[error("storage request failed: {0}")]
    Storage(String),
}

fn describe_not_found(reference: &str, searched: &[String], similar: &[String]) -> String {
    let mut message = format!("document '{}' not found. Searched:", reference);
    for location in searched {
        message.push_str(&format!("\n  - {}", location));
    }
    if !similar.is_empty() {
        message.push_str("\nDid you mean:");
        for name in similar {
            message.push_str(&format!("\n  - {}", name));
        }
    }
    message
}

impl From<StorageError> for LocateError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::AccessDenied(what) => LocateError::AccessDenied(what),
            StorageError::Request(what) => LocateError::Storage(what),
        }
    }
}

/// Resolves user-supplied document references. Holds only configuration
/// read at construction; nothing persists between calls.
pub struct StorageLocator {
    roots: Vec<PathBuf>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl StorageLocator {
    pub fn new(config: &StorageConfig, store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self {
            roots: default_roots(config.documents_dir.as_deref()),
            store,
        }
    }

    /// Locator with an explicit ordered root list instead of the
    /// platform defaults
    pub fn with_roots(roots: Vec<PathBuf>, store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { roots, store }
    }

    /// Resolve a reference to exactly one existing location.
    ///
    /// Explicit paths and blob coordinates are checked at that exact
    /// location only; a bare filename walks the candidate local roots in
    /// order and then falls back to a blob filename search.
    pub async fn resolve(
        &self,
        reference: &DocumentReference,
        force: Option<Backend>,
    ) -> Result<ResolvedLocation, LocateError> {
        // Cheap rejection before any filesystem or network probe
        let extension = reference.extension().unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(LocateError::UnsupportedFormat {
                reference: reference.raw.clone(),
                extension,
            });
        }

        match (&reference.kind, force) {
            (RefKind::BlobUrl { container, key }, _)
            | (RefKind::BlobPath { container, key }, _) => {
                self.resolve_blob_exact(&reference.raw, container, key).await
            }
            (RefKind::BareFilename(name), Some(Backend::Blob)) => {
                self.resolve_blob_by_filename(&reference.raw, name).await
            }
            (RefKind::LocalPath(_), Some(Backend::Blob)) => {
                // Forced onto the blob backend: read the path as
                // container/key
                let normalized = reference.raw.replace('\\', "/");
                let trimmed = normalized.trim_start_matches('/');
                match trimmed.split_once('/') {
                    Some((container, key)) if !key.is_empty() => {
                        self.resolve_blob_exact(&reference.raw, container, key).await
                    }
                    _ => Err(LocateError::NotFound {
                        reference: reference.raw.clone(),
                        searched: vec![format!("blob coordinate '{}'", trimmed)],
                        similar: Vec::new(),
                    }),
                }
            }
            (RefKind::LocalPath(path), _) => self.resolve_local_exact(&reference.raw, path).await,
            (RefKind::BareFilename(name), force) => {
                self.resolve_bare(&reference.raw, name, force).await
            }
        }
    }

    /// Candidate local roots in priority order
    pub fn candidate_roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Container names recognized as the first segment of container/key
    /// references. Empty when no blob store is configured, so a
    /// container-looking relative path stays a local path.
    pub fn blob_containers(&self) -> &[String] {
        self.store.as_ref().map(|s| s.containers()).unwrap_or(&[])
    }

    /// Check one exact blob coordinate. Absence is a hard NotFound; an
    /// explicit coordinate never triggers a wider search.
    async fn resolve_blob_exact(
        &self,
        raw: &str,
        container: &str,
        key: &str,
    ) -> Result<ResolvedLocation, LocateError> {
        let Some(store) = &self.store else {
            return Err(LocateError::NotFound {
                reference: raw.to_string(),
                searched: vec!["blob storage (not configured)".to_string()],
                similar: Vec::new(),
            });
        };

        match store.head(container, key).await? {
            Some(size) => Ok(ResolvedLocation::new(
                Place::Blob {
                    container: container.to_string(),
                    key: key.to_string(),
                },
                size,
            )),
            None => Err(LocateError::NotFound {
                reference: raw.to_string(),
                searched: vec![format!("blob container '{}', key '{}'", container, key)],
                similar: Vec::new(),
            }),
        }
    }

    /// Check one exact local path; no search beyond it.
    async fn resolve_local_exact(
        &self,
        raw: &str,
        path: &Path,
    ) -> Result<ResolvedLocation, LocateError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(ResolvedLocation::new(
                Place::Local(path.to_path_buf()),
                meta.len(),
            )),
            Ok(_) => Err(LocateError::NotFound {
                reference: raw.to_string(),
                searched: vec![format!("{} (not a regular file)", path.display())],
                similar: Vec::new(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(LocateError::AccessDenied(path.display().to_string()))
            }
            Err(_) => Err(LocateError::NotFound {
                reference: raw.to_string(),
                searched: vec![path.display().to_string()],
                similar: Vec::new(),
            }),
        }
    }

    /// Walk candidate local roots in order, then fall back to a blob
    /// filename search. First existing exact-name match wins.
    async fn resolve_bare(
        &self,
        raw: &str,
        name: &str,
        force: Option<Backend>,
    ) -> Result<ResolvedLocation, LocateError> {
        let roots = &self.roots;
        let mut searched: Vec<String> = Vec::new();

        for root in roots {
            searched.push(root.display().to_string());
            let candidate = root.join(name);
            match tokio::fs::metadata(&candidate).await {
                Ok(meta) if meta.is_file() => {
                    debug!(path = %candidate.display(), "resolved bare filename locally");
                    return Ok(ResolvedLocation::new(Place::Local(candidate), meta.len()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                    return Err(LocateError::AccessDenied(candidate.display().to_string()));
                }
                _ => {}
            }
        }

        // Blob fallback, unless the caller pinned the local backend
        if force != Some(Backend::Local) {
            if let Some(store) = &self.store {
                match self.search_blob_filename(store, name, &mut searched).await? {
                    BlobMatches::One(location) => return Ok(location),
                    BlobMatches::Many(candidates) => {
                        return Err(LocateError::Ambiguous {
                            reference: raw.to_string(),
                            candidates,
                        });
                    }
                    BlobMatches::None => {}
                }
            }
        }

        let similar = self.similar_names(name, roots).await;
        Err(LocateError::NotFound {
            reference: raw.to_string(),
            searched,
            similar,
        })
    }

    /// Blob-only search used when the blob backend is forced for a bare
    /// filename.
    async fn resolve_blob_by_filename(
        &self,
        raw: &str,
        name: &str,
    ) -> Result<ResolvedLocation, LocateError> {
        let Some(store) = &self.store else {
            return Err(LocateError::NotFound {
                reference: raw.to_string(),
                searched: vec!["blob storage (not configured)".to_string()],
                similar: Vec::new(),
            });
        };

        let mut searched = Vec::new();
        match self.search_blob_filename(store, name, &mut searched).await? {
            BlobMatches::One(location) => Ok(location),
            BlobMatches::Many(candidates) => Err(LocateError::Ambiguous {
                reference: raw.to_string(),
                candidates,
            }),
            BlobMatches::None => Err(LocateError::NotFound {
                reference: raw.to_string(),
                searched,
                similar: Vec::new(),
            }),
        }
    }

    async fn search_blob_filename(
        &self,
        store: &Arc<dyn ObjectStore>,
        name: &str,
        searched: &mut Vec<String>,
    ) -> Result<BlobMatches, LocateError> {
        let mut matches: Vec<(String, String)> = Vec::new();

        for container in store.containers() {
            searched.push(format!("blob container '{}'", container));
            let keys = store.list(container, None).await?;
            for key in keys {
                let last = key.rsplit('/').next().unwrap_or(key.as_str());
                if last == name {
                    matches.push((container.clone(), key));
                }
            }
        }

        match matches.len() {
            0 => Ok(BlobMatches::None),
            1 => {
                let (container, key) = matches.remove(0);
                let size = store.head(&container, &key).await?.unwrap_or(0);
                Ok(BlobMatches::One(ResolvedLocation::new(
                    Place::Blob { container, key },
                    size,
                )))
            }
            _ => Ok(BlobMatches::Many(
                matches
                    .into_iter()
                    .map(|(c, k)| format!("{}/{}", c, k))
                    .collect(),
            )),
        }
    }

    /// Lexically similar supported filenames found in existing roots,
    /// for "did you mean" diagnostics.
    async fn similar_names(&self, name: &str, roots: &[PathBuf]) -> Vec<String> {
        let wanted_stem = stem_of(name).to_lowercase();
        let mut similar = Vec::new();

        for root in roots {
            let Ok(mut entries) = tokio::fs::read_dir(root).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let candidate = entry.file_name().to_string_lossy().to_string();
                let Some(extension) = extension_of(&candidate) else {
                    continue;
                };
                if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
                    continue;
                }
                let candidate_stem = stem_of(&candidate).to_lowercase();
                if candidate_stem.contains(&wanted_stem) || wanted_stem.contains(&candidate_stem) {
                    if !similar.contains(&candidate) {
                        similar.push(candidate);
                    }
                }
            }
            if similar.len() >= 5 {
                break;
            }
        }

        similar.truncate(5);
        similar
    }
}

enum BlobMatches {
    None,
    One(ResolvedLocation),
    Many(Vec<String>),
}

fn stem_of(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

/// Default candidate roots: configured override, project Documents,
/// parent Documents, home Documents, then platform-specific locations.
/// Duplicates removed, order kept.
fn default_roots(override_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(dir) = override_dir {
        roots.push(dir.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.join("Documents"));
        if let Some(parent) = cwd.parent() {
            roots.push(parent.join("Documents"));
        }
    }

    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Documents"));

        #[cfg(target_os = "windows")]
        {
            roots.push(home.join("OneDrive").join("Documents"));
            if let Ok(user) = std::env::var("USERNAME") {
                roots.push(PathBuf::from(format!("C:/Users/{}/Documents", user)));
            }
        }

        #[cfg(target_os = "macos")]
        {
            roots.push(
                home.join("Library")
                    .join("Mobile Documents")
                    .join("com~apple~CloudDocs")
                    .join("Documents"),
            );
            if let Ok(user) = std::env::var("USER") {
                roots.push(PathBuf::from(format!("/Users/{}/Documents", user)));
            }
        }

        #[cfg(target_os = "linux")]
        {
            if let Ok(user) = std::env::var("USER") {
                roots.push(PathBuf::from(format!("/home/{}/Documents", user)));
            }
        }
    }

    let mut unique = Vec::new();
    for root in roots {
        if !unique.contains(&root) {
            unique.push(root);
        }
    }
    unique
}
