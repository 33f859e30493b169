use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::FetchError;

/// What a stored file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A known-good sample of the identity (e.g. a handwriting sample).
    Reference,
    /// The sample to verify (e.g. the latest submitted document).
    Probe,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Probe => write!(f, "probe"),
        }
    }
}

/// Supplies stored image/document bytes for an identity.
pub trait FileSource: Send + Sync {
    fn fetch(&self, identity_id: &str, role: Role) -> Result<Vec<u8>, FetchError>;
}

/// In-memory [`FileSource`] for tests and embedding in other programs.
#[derive(Debug, Default, Clone)]
pub struct MemoryFiles {
    files: HashMap<(String, Role), Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identity_id: &str, role: Role, data: impl Into<Vec<u8>>) -> Self {
        self.insert(identity_id, role, data);
        self
    }

    pub fn insert(&mut self, identity_id: &str, role: Role, data: impl Into<Vec<u8>>) {
        self.files.insert((identity_id.to_string(), role), data.into());
    }
}

impl FileSource for MemoryFiles {
    fn fetch(&self, identity_id: &str, role: Role) -> Result<Vec<u8>, FetchError> {
        self.files
            .get(&(identity_id.to_string(), role))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                identity_id: identity_id.to_string(),
                role,
            })
    }
}

/// Reads `{dir}/{identity_id}.{role}.{ext}`, trying each configured
/// extension in order.
#[derive(Debug, Clone)]
pub struct DirFileSource {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl DirFileSource {
    /// Creates a source over `dir` with the default extension `json`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extensions: vec!["json".into()],
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }
}

impl FileSource for DirFileSource {
    fn fetch(&self, identity_id: &str, role: Role) -> Result<Vec<u8>, FetchError> {
        let not_found = || FetchError::NotFound {
            identity_id: identity_id.to_string(),
            role,
        };
        // Ids become file names.
        if identity_id.is_empty() || !identity_id.chars().all(char::is_alphanumeric) {
            return Err(not_found());
        }

        for ext in &self.extensions {
            let path = self.dir.join(format!("{identity_id}.{role}.{ext}"));
            match std::fs::read(&path) {
                Ok(data) => {
                    debug!(path = %path.display(), bytes = data.len(), "file fetched");
                    return Ok(data);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(FetchError::Unavailable(format!("{}: {e}", path.display())));
                }
            }
        }
        Err(not_found())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn memory_files_fetch() {
        let files = MemoryFiles::new().with("S1", Role::Reference, b"ref".to_vec());
        assert_eq!(files.fetch("S1", Role::Reference).unwrap(), b"ref");
        assert!(matches!(
            files.fetch("S1", Role::Probe),
            Err(FetchError::NotFound { role: Role::Probe, .. })
        ));
    }

    #[test]
    fn dir_source_tries_extensions_in_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("S1.probe.png"), b"png").unwrap();
        std::fs::write(dir.path().join("S1.probe.pdf"), b"pdf").unwrap();

        let src = DirFileSource::new(dir.path()).with_extensions(&["pdf", "png"]);
        assert_eq!(src.fetch("S1", Role::Probe).unwrap(), b"pdf");

        let src = DirFileSource::new(dir.path()).with_extensions(&["jpg", "png"]);
        assert_eq!(src.fetch("S1", Role::Probe).unwrap(), b"png");
    }

    #[test]
    fn dir_source_not_found() {
        let dir = tempdir().unwrap();
        let src = DirFileSource::new(dir.path());
        assert!(matches!(
            src.fetch("S1", Role::Reference),
            Err(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            src.fetch("../S1", Role::Reference),
            Err(FetchError::NotFound { .. })
        ));
    }

    #[test]
    fn role_display() {
        assert_eq!(Role::Reference.to_string(), "reference");
        assert_eq!(Role::Probe.to_string(), "probe");
    }
}
