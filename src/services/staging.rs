use crate::models::StagedFile;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Prefix of in-flight writes; these never show up as staged files
const PARTIAL_PREFIX: &str = ".upload-";

#[derive(Debug, Clone)]
pub struct StagedEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Directory staged files live in
    fn root(&self) -> &Path;

    /// Path a file with this (already validated) name is staged at
    fn path_for(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Create the staging directory if missing; a no-op when it exists
    async fn ensure_dir(&self) -> io::Result<()>;

    /// Write `data` under `name`, replacing any previous file with that name
    async fn persist(&self, name: &str, data: Bytes) -> io::Result<StagedFile>;

    async fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    async fn list(&self) -> io::Result<Vec<StagedEntry>>;

    /// Remove staged files last modified more than `age` ago, returning how many went
    async fn purge_older_than(&self, age: Duration) -> io::Result<usize>;
}

/// Staging area on the local filesystem
pub struct LocalStagingStore {
    root: PathBuf,
}

impl LocalStagingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StagingStore for LocalStagingStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    async fn persist(&self, name: &str, data: Bytes) -> io::Result<StagedFile> {
        let root = self.root.clone();
        let dest = self.path_for(name);
        let size = data.len() as u64;

        // Write beside the destination, then rename over it so readers only
        // ever see a complete file. The last rename wins.
        let target = dest.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut partial = tempfile::Builder::new()
                .prefix(PARTIAL_PREFIX)
                .tempfile_in(&root)?;
            partial.write_all(&data)?;
            partial.as_file().sync_all()?;
            partial.persist(&target)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;

        tracing::debug!("Staged {} ({} bytes) at {}", name, size, dest.display());

        Ok(StagedFile {
            name: name.to_string(),
            path: dest,
            size,
        })
    }

    async fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path_for(name)).await
    }

    async fn list(&self) -> io::Result<Vec<StagedEntry>> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e),
        };

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(PARTIAL_PREFIX) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            entries.push(StagedEntry {
                name,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn purge_older_than(&self, age: Duration) -> io::Result<usize> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        // Leftover partial writes are swept too
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let expired = now
                .duration_since(modified)
                .map(|elapsed| elapsed > age)
                .unwrap_or(false);

            if expired {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    // Raced with another sweep or an overwrite
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStagingStore::new(tmp.path().join("temp"));

        store.ensure_dir().await.unwrap();
        store.ensure_dir().await.unwrap();
        assert!(tmp.path().join("temp").is_dir());
    }

    #[tokio::test]
    async fn test_persist_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStagingStore::new(tmp.path());
        store.ensure_dir().await.unwrap();

        store
            .persist("a.xlsx", Bytes::from_static(b"first version"))
            .await
            .unwrap();
        let staged = store
            .persist("a.xlsx", Bytes::from_static(b"second"))
            .await
            .unwrap();

        assert_eq!(staged.size, 6);
        assert_eq!(staged.path, tmp.path().join("a.xlsx"));
        assert_eq!(store.read("a.xlsx").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_list_skips_directories_and_partials() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStagingStore::new(tmp.path());

        store.persist("b.xls", Bytes::from_static(b"bb")).await.unwrap();
        store.persist("a.xlsx", Bytes::from_static(b"a")).await.unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join(".upload-leftover"), b"x").unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.size))
            .collect();
        assert_eq!(
            names,
            vec![("a.xlsx".to_string(), 1), ("b.xls".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStagingStore::new(tmp.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.purge_older_than(Duration::ZERO).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_respects_age() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalStagingStore::new(tmp.path());
        store.persist("keep.xlsx", Bytes::from_static(b"k")).await.unwrap();

        // Nothing is older than an hour
        assert_eq!(
            store.purge_older_than(Duration::from_secs(3600)).await.unwrap(),
            0
        );
        assert_eq!(store.list().await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            store.purge_older_than(Duration::from_millis(1)).await.unwrap(),
            1
        );
        assert!(store.list().await.unwrap().is_empty());
    }
}
