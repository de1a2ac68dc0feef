use crate::types::Result;
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persisted set of article links that were already summarized. The on-disk
/// form is a plain JSON array of strings so it stays human-inspectable.
///
/// Membership is checked before any expensive work; new links are buffered
/// in memory and appended to the file by [`ProcessedStore::commit`], which
/// performs a read-modify-write under an exclusive lock so that separate
/// invocations cannot clobber each other's appends.
pub struct ProcessedStore {
    path: PathBuf,
    links: HashSet<String>,
    pending: Vec<String>,
}

/// Exclusive lock on the store's sidecar lock file, released on drop so
/// every exit path (including errors) unlocks.
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(store_path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(store_path);
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut os = store_path.as_os_str().to_os_string();
    os.push(".lock");
    PathBuf::from(os)
}

impl ProcessedStore {
    /// Loads the store, taking the file lock for the duration of the read.
    /// A missing file yields an empty store; an unreadable one is logged
    /// and treated as empty rather than failing the run.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let links = if path.exists() {
            let _lock = StoreLock::acquire(&path)?;
            match read_links(&path) {
                Ok(links) => {
                    info!(count = links.len(), path = %path.display(), "Loaded processed articles");
                    links
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load processed articles, starting empty");
                    HashSet::new()
                }
            }
        } else {
            info!(path = %path.display(), "Processed articles file not found, starting empty");
            HashSet::new()
        };

        Ok(Self {
            path,
            links,
            pending: Vec::new(),
        })
    }

    pub fn is_processed(&self, link: &str) -> bool {
        self.links.contains(link)
    }

    /// Records a link as processed. Returns false when the link was already
    /// known, in which case nothing is buffered for the next commit.
    pub fn mark_processed(&mut self, link: &str) -> bool {
        if self.links.insert(link.to_string()) {
            self.pending.push(link.to_string());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Transactional append: under the exclusive lock, re-reads the on-disk
    /// set, merges the links marked during this run, and rewrites the file.
    /// Returns how many links were actually appended on disk.
    pub fn commit(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            debug!("No new processed links to commit");
            return Ok(0);
        }

        let _lock = StoreLock::acquire(&self.path)?;

        let mut on_disk = if self.path.exists() {
            read_links(&self.path).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Rewriting unreadable processed articles file");
                HashSet::new()
            })
        } else {
            HashSet::new()
        };

        let mut appended = 0;
        for link in self.pending.drain(..) {
            if on_disk.insert(link) {
                appended += 1;
            }
        }

        let mut sorted: Vec<&String> = on_disk.iter().collect();
        sorted.sort();
        let json = serde_json::to_string_pretty(&sorted)?;
        fs::write(&self.path, json)?;

        info!(appended, total = on_disk.len(), path = %self.path.display(), "Committed processed articles");
        self.links = on_disk;
        Ok(appended)
    }
}

fn read_links(path: &Path) -> Result<HashSet<String>> {
    let raw = fs::read_to_string(path)?;
    let links: Vec<String> = serde_json::from_str(&raw)?;
    Ok(links.into_iter().collect())
}
