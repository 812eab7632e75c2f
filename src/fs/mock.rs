// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Paths whose removal is rejected with an error.
    locked: HashSet<PathBuf>,
    /// Every path passed to a remove call, in order.
    removals: Vec<PathBuf>,
    temp_counter: usize,
}

/// In-memory filesystem for tests.
///
/// Cloning shares the underlying state, so a test can keep one clone for
/// assertions while the supervisor owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            insert_dir_chain(&mut state.entries, parent);
        }
        state.entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        insert_dir_chain(&mut state.entries, path.as_ref());
    }

    /// Make every later removal of `path` fail.
    pub fn lock_path(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.locked.insert(path.as_ref().to_path_buf());
    }

    /// Paths passed to `remove_file` / `remove_dir_all`, in call order.
    pub fn removals(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().removals.clone()
    }
}

fn insert_dir_chain(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(MockEntry::File(_)) = state.entries.get(path) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        insert_dir_chain(&mut state.entries, path);
        Ok(())
    }

    fn create_temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        let mut state = self.state.lock().unwrap();
        state.temp_counter += 1;
        let path = PathBuf::from("/tmp").join(format!("{prefix}{}", state.temp_counter));
        insert_dir_chain(&mut state.entries, &path);
        Ok(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let content = match state.entries.get(from) {
            Some(MockEntry::File(content)) => content.clone(),
            Some(MockEntry::Dir) => return Err(anyhow!("Is a directory: {:?}", from)),
            None => return Err(anyhow!("File not found: {:?}", from)),
        };
        if let Some(parent) = to.parent() {
            insert_dir_chain(&mut state.entries, parent);
        }
        state.entries.insert(to.to_path_buf(), MockEntry::File(content));
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.removals.push(path.to_path_buf());
        if state.locked.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir) => {
                state.entries.retain(|p, _| !p.starts_with(path));
                Ok(())
            }
            Some(MockEntry::File(_)) => Err(anyhow!("Not a directory: {:?}", path)),
            None => Err(anyhow!("Not found: {:?}", path)),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.removals.push(path.to_path_buf());
        if state.locked.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            Some(MockEntry::File(_)) => {
                state.entries.remove(path);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::Dir) => Ok(state
                .entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
