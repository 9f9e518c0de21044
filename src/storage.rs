use std::path::{Path, PathBuf};

/// Flat file store rooted at a single directory.
pub trait StorageManager: Send + Sync {
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()>;
    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>>;
    fn exists(&self, ident: &str) -> bool;
    fn path(&self, ident: &str) -> PathBuf;
}

#[derive(Clone, Debug)]
pub struct BackendLocal {
    pub base_dir: PathBuf,
}

impl BackendLocal {
    pub fn new(storage_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        Ok(BackendLocal { base_dir: path })
    }
}

impl StorageManager for BackendLocal {
    fn exists(&self, ident: &str) -> bool {
        std::fs::metadata(self.path(ident)).is_ok()
    }

    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.path(ident))
    }

    /// Writes through a temp file and renames it over the target, so readers
    /// never observe a half-written file.
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()> {
        let temp_path = self
            .base_dir
            .join(format!("{}-{ident}", rusty_ulid::generate_ulid_string()));

        std::fs::write(&temp_path, data)?;

        std::fs::rename(&temp_path, self.path(ident))
    }

    fn path(&self, ident: &str) -> PathBuf {
        self.base_dir.join(ident)
    }
}
