// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for tests.
///
/// Setup helpers (`add_file`, `add_dir`) create missing parents implicitly;
/// the `FileSystem` methods behave like the real thing and refuse to write
/// into a directory that does not exist.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    read_only: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            read_only: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(&mut files, parent);
        }
        Self::insert_entry(&mut files, &path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Make every write, append or rename touching `dir` fail.
    pub fn make_read_only(&self, dir: impl AsRef<Path>) {
        self.read_only
            .lock()
            .unwrap()
            .insert(dir.as_ref().to_path_buf());
    }

    /// Contents of a file as UTF-8, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let files = self.files.lock().unwrap();
        match files.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(String::from_utf8_lossy(content).into_owned()),
            _ => None,
        }
    }

    /// Full paths of the entries directly inside `dir`.
    pub fn list_dir(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        let files = self.files.lock().unwrap();
        match files.get(dir) {
            Some(MockEntry::Dir(children)) => children.iter().map(|name| dir.join(name)).collect(),
            _ => Vec::new(),
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(files, parent);
        }
        Self::insert_entry(files, path, MockEntry::Dir(Vec::new()));
    }

    fn insert_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, entry: MockEntry) {
        files.insert(path.to_path_buf(), entry);
        let (Some(parent), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str()))
        else {
            return;
        };
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }

    fn remove_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) -> Option<MockEntry> {
        let entry = files.remove(path)?;
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str())) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                children.retain(|c| c != name);
            }
        }
        Some(entry)
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        let read_only = self.read_only.lock().unwrap();
        if read_only.iter().any(|dir| path.starts_with(dir)) {
            bail!("Permission denied: {:?}", path);
        }
        Ok(())
    }

    fn check_parent(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !matches!(files.get(parent), Some(MockEntry::Dir(_))) => {
                Err(anyhow!("No such directory: {:?}", parent))
            }
            _ => Ok(()),
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        let mut files = self.files.lock().unwrap();
        Self::check_parent(&files, path)?;
        if matches!(files.get(path), Some(MockEntry::Dir(_))) {
            bail!("Is a directory: {:?}", path);
        }
        Self::insert_entry(&mut files, path, MockEntry::File(contents.to_vec()));
        Ok(())
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        let mut files = self.files.lock().unwrap();
        Self::check_parent(&files, path)?;
        match files.get_mut(path) {
            Some(MockEntry::File(existing)) => existing.extend_from_slice(contents),
            Some(MockEntry::Dir(_)) => bail!("Is a directory: {:?}", path),
            None => Self::insert_entry(&mut files, path, MockEntry::File(contents.to_vec())),
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check_writable(from)?;
        self.check_writable(to)?;
        let mut files = self.files.lock().unwrap();
        Self::check_parent(&files, to)?;
        let entry = Self::remove_entry(&mut files, from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        Self::insert_entry(&mut files, to, entry);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        let mut files = self.files.lock().unwrap();
        if matches!(files.get(path), Some(MockEntry::File(_))) {
            bail!("File exists: {:?}", path);
        }
        Self::ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::Dir(_)))
    }
}
