//! Where deck text comes from.
//!
//! The [`SourceProvider`] trait abstracts deck file access so the parser can
//! read from disk or from an in-memory file map.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Component, Path, PathBuf};

/// File access used by the parse driver. Canonical paths identify files on
/// the include stack.
pub trait SourceProvider {
    /// Open `path` for buffered reading. The reader is dropped as soon as
    /// the file is finished or its parse fails.
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, std::io::Error>;

    /// Resolve an INCLUDE path against the root deck directory. Absolute
    /// includes are returned unchanged.
    fn resolve_include(&self, root_dir: &Path, include: &str) -> PathBuf;

    /// Canonicalize a path; fails if it does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;
}

/// Reads decks from disk through `std::fs`.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, std::io::Error> {
        let file = std::fs::File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn resolve_include(&self, root_dir: &Path, include: &str) -> PathBuf {
        root_dir.join(include)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        path.canonicalize()
    }
}

/// Decks held in memory, keyed by path. Used by tests and by
/// [`crate::parse_str`]. Paths are normalized lexically and never touch
/// the filesystem.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    /// Build a provider from `(path, text)` pairs.
    pub fn from_files<P, T>(files: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: AsRef<Path>,
        T: Into<String>,
    {
        files
            .into_iter()
            .fold(InMemoryProvider::default(), |provider, (path, text)| {
                provider.with_file(path, text)
            })
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.files
            .insert(Self::normalize_path(path.as_ref()), text.into());
        self
    }

    /// Lexical `.` and `..` folding; `..` never climbs above the root.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for part in path.components() {
            match part {
                Component::CurDir => {}
                Component::ParentDir if out.file_name().is_some() => {
                    out.pop();
                }
                Component::ParentDir => {}
                part => out.push(part),
            }
        }
        out
    }

    fn not_found(path: &Path) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found in memory: {}", path.display()),
        )
    }
}

impl SourceProvider for InMemoryProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>, std::io::Error> {
        let normalized = Self::normalize_path(path);
        let text = self
            .files
            .get(&normalized)
            .ok_or_else(|| Self::not_found(&normalized))?;
        Ok(Box::new(Cursor::new(text.clone().into_bytes())))
    }

    fn resolve_include(&self, root_dir: &Path, include: &str) -> PathBuf {
        Self::normalize_path(&root_dir.join(include))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let normalized = Self::normalize_path(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(Self::not_found(&normalized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{ErrorKind, Read};

    #[test]
    fn dot_segments_fold_lexically() {
        assert_eq!(
            InMemoryProvider::normalize_path(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(
            InMemoryProvider::normalize_path(Path::new("/../x")),
            PathBuf::from("/x")
        );
    }

    #[test]
    fn open_reads_registered_text() {
        let provider = InMemoryProvider::from_files([("/CASE.DATA", "RUNSPEC\n")]);
        let mut text = String::new();
        provider
            .open(Path::new("/CASE.DATA"))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "RUNSPEC\n");
    }

    #[test]
    fn open_unknown_path_is_not_found() {
        let provider = InMemoryProvider::default();
        match provider.open(Path::new("/missing.DATA")) {
            Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            Ok(_) => panic!("opened a file that was never registered"),
        }
    }

    #[test]
    fn includes_resolve_against_root_dir() {
        let provider = InMemoryProvider::default();
        assert_eq!(
            provider.resolve_include(Path::new("/a/b"), "sub/INC.DATA"),
            PathBuf::from("/a/b/sub/INC.DATA")
        );
        assert_eq!(
            provider.resolve_include(Path::new("/a/b"), "/abs/INC.DATA"),
            PathBuf::from("/abs/INC.DATA")
        );
    }

    #[test]
    fn canonical_path_of_registered_file() {
        let provider = InMemoryProvider::default().with_file("/a/b/CASE.DATA", "");
        assert_eq!(
            provider.canonicalize(Path::new("/a/b/../b/CASE.DATA")).unwrap(),
            PathBuf::from("/a/b/CASE.DATA")
        );
        let err = provider.canonicalize(Path::new("/a/OTHER.DATA")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
