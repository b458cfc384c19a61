//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── screen_names.txt          # final crawl roster
//! ├── broken_not_found.txt      # append-only resume ledger
//! ├── broken_forbidden.txt      # append-only resume ledger
//! ├── {account}.posts.json      # one timeline per account
//! └── {account}.posts.json.gz   # gzip variant
//! ```
//!
//! Timeline files are written atomically (temp file + rename) so an
//! interrupted run never leaves a half-written file that a resume
//! would mistake for a completed download.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Post, ScreenName};
use crate::storage::{BrokenKind, TimelineStore};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Path of the timeline file for `account`.
    fn timeline_path(&self, account: &ScreenName, compressed: bool) -> PathBuf {
        let suffix = if compressed { ".posts.json.gz" } else { ".posts.json" };
        self.root_dir.join(format!("{}{}", account, suffix))
    }

    /// Path of the ledger file for `kind`.
    fn ledger_path(&self, kind: BrokenKind) -> PathBuf {
        let name = match kind {
            BrokenKind::NotFound => "broken_not_found.txt",
            BrokenKind::Forbidden => "broken_forbidden.txt",
        };
        self.root_dir.join(name)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl TimelineStore for LocalStore {
    async fn exists(&self, account: &ScreenName) -> bool {
        // Either compression mode counts: a run started plain can
        // resume compressed without re-downloading.
        for compressed in [false, true] {
            let path = self.timeline_path(account, compressed);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }

    async fn save_timeline(
        &self,
        account: &ScreenName,
        posts: &[Post],
        compressed: bool,
    ) -> Result<()> {
        let json = serde_json::to_vec(posts)?;
        let bytes = if compressed {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&json).map_err(AppError::Io)?;
            encoder.finish().map_err(AppError::Io)?
        } else {
            json
        };

        let path = self.timeline_path(account, compressed);
        self.write_bytes(&path, &bytes).await
    }

    async fn append_broken(&self, kind: BrokenKind, account: &ScreenName) -> Result<()> {
        let path = self.ledger_path(kind);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{}\n", account).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load_broken(&self, kind: BrokenKind) -> Result<HashSet<ScreenName>> {
        let path = self.ledger_path(kind);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ScreenName::new)
            .collect())
    }

    async fn save_roster(&self, accounts: &[ScreenName]) -> Result<()> {
        let mut content = accounts
            .iter()
            .map(ScreenName::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        content.push('\n');

        let path = self.root_dir.join("screen_names.txt");
        self.write_bytes(&path, content.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use flate2::read::GzDecoder;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_posts() -> Vec<Post> {
        vec![
            Post(json!({"id": 2, "text": "newer"})),
            Post(json!({"id": 1, "text": "older"})),
        ]
    }

    #[tokio::test]
    async fn test_save_then_exists_plain() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let account = ScreenName::new("alice");

        assert!(!store.exists(&account).await);
        store
            .save_timeline(&account, &sample_posts(), false)
            .await
            .unwrap();
        assert!(store.exists(&account).await);

        let content = std::fs::read_to_string(dir.path().join("alice.posts.json")).unwrap();
        let decoded: Vec<Post> = serde_json::from_str(&content).unwrap();
        assert_eq!(decoded, sample_posts());
    }

    #[tokio::test]
    async fn test_save_compressed_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let account = ScreenName::new("bob");

        store
            .save_timeline(&account, &sample_posts(), true)
            .await
            .unwrap();

        let raw = std::fs::read(dir.path().join("bob.posts.json.gz")).unwrap();
        let mut decoder = GzDecoder::new(raw.as_slice());
        let mut json = String::new();
        decoder.read_to_string(&mut json).unwrap();
        let decoded: Vec<Post> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, sample_posts());
    }

    #[tokio::test]
    async fn test_exists_across_compression_modes() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let account = ScreenName::new("carol");

        store
            .save_timeline(&account, &sample_posts(), true)
            .await
            .unwrap();

        // A plain-mode run still sees the gzipped file.
        assert!(store.exists(&account).await);
    }

    #[tokio::test]
    async fn test_broken_ledger_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        assert!(
            store
                .load_broken(BrokenKind::NotFound)
                .await
                .unwrap()
                .is_empty()
        );

        store
            .append_broken(BrokenKind::NotFound, &ScreenName::new("gone"))
            .await
            .unwrap();
        store
            .append_broken(BrokenKind::NotFound, &ScreenName::new("gone2"))
            .await
            .unwrap();
        store
            .append_broken(BrokenKind::Forbidden, &ScreenName::new("locked"))
            .await
            .unwrap();

        let not_found = store.load_broken(BrokenKind::NotFound).await.unwrap();
        assert_eq!(not_found.len(), 2);
        assert!(not_found.contains(&ScreenName::new("gone")));

        let forbidden = store.load_broken(BrokenKind::Forbidden).await.unwrap();
        assert_eq!(forbidden.len(), 1);
        assert!(forbidden.contains(&ScreenName::new("locked")));
    }

    #[tokio::test]
    async fn test_save_roster() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .save_roster(&[ScreenName::new("a"), ScreenName::new("b")])
            .await
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("screen_names.txt")).unwrap();
        assert_eq!(content, "a\nb\n");
    }
}
