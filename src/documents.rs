//! Managed directory for the PDF (or any other) files attached to catalog
//! entries. Files are copied in on import so the catalog never references
//! paths the user might move or delete, and removal is restricted to paths
//! inside the managed directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::DocumentError;

/// Owns the directory that holds copied documents. Constructed once alongside
/// the database connection and injected into the [`crate::db::Store`].
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Create the store, making sure the backing directory exists.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).context("failed to create document directory")?;
        Ok(Self { dir })
    }

    /// Directory the store manages.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy `source` into the managed directory and return the stored path.
    /// File name collisions are resolved by appending `-1`, `-2`, ... before
    /// the extension, so importing the same file twice keeps both copies.
    ///
    /// Callers persist the book record only after this succeeds; a failed
    /// copy therefore never leaves a dangling reference.
    pub fn import(&self, source: &Path) -> Result<PathBuf> {
        if !source.exists() {
            return Err(DocumentError::SourceMissing(source.to_path_buf()).into());
        }
        if !source.is_file() {
            return Err(DocumentError::NotAFile(source.to_path_buf()).into());
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| DocumentError::NotAFile(source.to_path_buf()))?;
        let target = self.unique_target(Path::new(file_name));

        fs::copy(source, &target).with_context(|| {
            format!(
                "failed to copy document {} into {}",
                source.display(),
                self.dir.display()
            )
        })?;
        log::info!("imported document {}", target.display());

        Ok(target)
    }

    /// Delete a previously imported file. Missing files are tolerated (the
    /// user may have cleaned the directory by hand), but paths outside the
    /// managed directory are rejected outright. `..` components are rejected
    /// too: `starts_with` compares raw components, so a path like
    /// `<dir>/../victim` would otherwise pass the prefix check while
    /// resolving outside the store.
    pub fn remove(&self, path: &Path) -> Result<()> {
        let escapes = path
            .components()
            .any(|component| matches!(component, Component::ParentDir));
        if escapes || !path.starts_with(&self.dir) {
            return Err(DocumentError::OutsideStore(path.to_path_buf()).into());
        }
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("document already gone: {}", path.display());
                Ok(())
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove document {}", path.display()))
            }
        }
    }

    /// Find a path inside the managed directory that does not collide with an
    /// existing file.
    fn unique_target(&self, file_name: &Path) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file_name.extension().map(|e| e.to_string_lossy().into_owned());

        for counter in 1.. {
            let name = match &extension {
                Some(ext) => format!("{stem}-{counter}.{ext}"),
                None => format!("{stem}-{counter}"),
            };
            let candidate = self.dir.join(name);
            if !candidate.exists() {
                return candidate;
            }
        }
        unreachable!("counter exhausted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;

    fn store() -> (tempfile::TempDir, DocumentStore) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = DocumentStore::new(tmp.path().join("documents")).expect("store");
        (tmp, store)
    }

    #[test]
    fn import_copies_file_into_managed_dir() {
        let (tmp, store) = store();
        let source = tmp.path().join("novel.pdf");
        fs::write(&source, b"%PDF-1.4 fake").unwrap();

        let stored = store.import(&source).unwrap();

        assert!(stored.starts_with(store.dir()));
        assert_eq!(fs::read(&stored).unwrap(), b"%PDF-1.4 fake");
        // Source untouched.
        assert!(source.exists());
    }

    #[test]
    fn import_deduplicates_colliding_names() {
        let (tmp, store) = store();
        let source = tmp.path().join("novel.pdf");
        fs::write(&source, b"first").unwrap();
        let first = store.import(&source).unwrap();

        fs::write(&source, b"second").unwrap();
        let second = store.import(&source).unwrap();

        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "novel-1.pdf");
        assert_eq!(fs::read(&first).unwrap(), b"first");
        assert_eq!(fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn import_missing_source_fails() {
        let (tmp, store) = store();
        let err = store
            .import(&tmp.path().join("nope.pdf"))
            .expect_err("missing source must fail");
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::SourceMissing(_))
        ));
    }

    #[test]
    fn remove_rejects_paths_outside_store() {
        let (tmp, store) = store();
        let outside = tmp.path().join("elsewhere.pdf");
        fs::write(&outside, b"keep me").unwrap();

        let err = store.remove(&outside).expect_err("outside path must fail");
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::OutsideStore(_))
        ));
        assert!(outside.exists());
    }

    #[test]
    fn remove_rejects_parent_dir_traversal() {
        let (tmp, store) = store();
        let victim = tmp.path().join("victim.pdf");
        fs::write(&victim, b"keep me").unwrap();

        // Starts with the managed directory but resolves outside of it.
        let sneaky = store.dir().join("..").join("victim.pdf");
        let err = store.remove(&sneaky).expect_err("traversal must fail");
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::OutsideStore(_))
        ));
        assert!(victim.exists());
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let (_tmp, store) = store();
        store.remove(&store.dir().join("gone.pdf")).unwrap();
    }
}
