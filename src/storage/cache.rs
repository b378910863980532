//! On-disk page cache.
//!
//! Holds everything the crawler ever persists:
//!
//! ```text
//! {root}/
//! ├── browse/               # raw browse index pages
//! │   └── <hex(word)>
//! └── dict/                 # zstd-compressed definition pages
//!     └── <sharded path>.zst
//! ```
//!
//! Entries are written once and never mutated or deleted. Existence of
//! a file is the single source of truth for "already fetched": callers
//! check before going to the network, and a plain (uncompressed) dict
//! file left by an earlier dataset still counts as present.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::path::{browse_key, dict_rel_path};

/// zstd level for definition pages.
const COMPRESSION_LEVEL: i32 = 3;

/// Filesystem cache for browse and definition pages.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    /// Create a cache rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding browse index pages.
    pub fn browse_dir(&self) -> PathBuf {
        self.root.join("browse")
    }

    /// Directory holding definition pages.
    pub fn dict_dir(&self) -> PathBuf {
        self.root.join("dict")
    }

    /// Create the browse/ and dict/ directories if missing.
    pub async fn ensure_layout(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.browse_dir()).await?;
        tokio::fs::create_dir_all(self.dict_dir()).await?;
        Ok(())
    }

    /// Path of the browse cache file for a word.
    pub fn browse_path(&self, word: &str) -> PathBuf {
        self.browse_dir().join(browse_key(word))
    }

    /// Load a browse page by word, or None if it was never fetched.
    pub async fn load_browse(&self, word: &str) -> Result<Option<String>> {
        self.read_optional(&self.browse_path(word)).await
    }

    /// Load a browse page by its cache filename.
    pub async fn load_browse_key(&self, key: &str) -> Result<String> {
        let path = self.browse_dir().join(key);
        match self.read_optional(&path).await? {
            Some(text) => Ok(text),
            None => Err(AppError::cache_key(key, "browse entry missing on disk")),
        }
    }

    /// Persist a browse page. The write is atomic (temp file + rename).
    pub async fn store_browse(&self, word: &str, text: &str) -> Result<()> {
        self.write_bytes(&self.browse_path(word), text.as_bytes())
            .await
    }

    /// Path a definition page would occupy uncompressed.
    pub fn dict_path(&self, word: &str) -> PathBuf {
        self.dict_dir().join(dict_rel_path(word))
    }

    /// Path of the compressed definition page.
    pub fn dict_path_compressed(&self, word: &str) -> PathBuf {
        Self::with_zst_suffix(&self.dict_path(word))
    }

    /// Idempotence gate: is this word's definition already on disk,
    /// compressed or not?
    pub async fn has_definition(&self, word: &str) -> bool {
        let plain = self.dict_path(word);
        if tokio::fs::try_exists(&plain).await.unwrap_or(false) {
            return true;
        }
        tokio::fs::try_exists(Self::with_zst_suffix(&plain))
            .await
            .unwrap_or(false)
    }

    /// Persist a definition page, zstd-compressed.
    pub async fn store_definition(&self, word: &str, text: &str) -> Result<()> {
        let bytes = zstd::encode_all(text.as_bytes(), COMPRESSION_LEVEL)?;
        self.write_bytes(&self.dict_path_compressed(word), &bytes)
            .await
    }

    /// Load a definition page, decompressing if needed.
    pub async fn load_definition(&self, word: &str) -> Result<Option<String>> {
        let compressed = self.dict_path_compressed(word);
        match tokio::fs::read(&compressed).await {
            Ok(bytes) => {
                let text = zstd::decode_all(bytes.as_slice())?;
                return Ok(Some(String::from_utf8_lossy(&text).into_owned()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AppError::Io(e)),
        }
        self.read_optional(&self.dict_path(word)).await
    }

    /// Enumerate the browse cache filenames on disk.
    ///
    /// This single scan is the whole work list for a download run.
    pub async fn browse_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(self.browse_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // In-flight temp files are not work items
            if name.ends_with(".tmp") {
                continue;
            }
            keys.push(name.to_string());
        }
        Ok(keys)
    }

    fn with_zst_suffix(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".zst");
        PathBuf::from(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// The temp name is unique per call so two workers racing on the
    /// same word cannot interleave writes; the loser's rename simply
    /// replaces the same content.
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static SEQ: AtomicU64 = AtomicU64::new(0);

        self.ensure_dir(path).await?;

        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{seq}.tmp"));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a file as UTF-8 text, returning None if it doesn't exist.
    async fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
