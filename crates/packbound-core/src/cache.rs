//! Content-addressed cache of extracted references.
//!
//! Entries are keyed by a digest of the file's absolute path and gated by a
//! digest of the file's contents, so a stale entry is detected without
//! parsing. The cache is strictly an optimization: every read failure,
//! corruption, or format mismatch degrades to a miss and recomputation, and
//! writes are best-effort. It must never change a run's result, only its
//! speed.

use crate::digest;
use crate::reference::UnresolvedReference;
use crate::syntax::ParseError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Serialized cache entry format version.
///
/// Bumped whenever [`CacheContents`] changes shape; entries written by any
/// other version are treated as misses.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Name of the marker file recording the configuration digest the cache
/// was populated under.
const CONFIG_DIGEST_MARKER: &str = "config-digest";

/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheContents {
    /// Format version of this entry.
    pub version: u32,
    /// Digest of the source file's contents at extraction time.
    pub file_content_digest: String,
    /// References extracted from the file.
    pub unresolved_references: Vec<UnresolvedReference>,
}

/// On-disk cache of extracted references, sharded across subdirectories.
///
/// Entries live at `<directory>/<digest[..2]>/<digest>` where `digest` is
/// the SHA-256 of the file's absolute path. Sharding keeps individual
/// directories small on codebases with many thousands of files; lookups
/// behave identically regardless of sharding depth.
#[derive(Debug)]
pub struct Cache {
    directory: PathBuf,
}

impl Cache {
    /// Opens a cache rooted at `directory`.
    ///
    /// Compares the persisted configuration digest against `config_digest`
    /// and busts the whole cache on mismatch, since extraction behavior may
    /// depend on configuration not reflected in any single file's contents.
    #[must_use]
    pub fn new(directory: PathBuf, config_digest: &str) -> Self {
        let cache = Self { directory };
        cache.ensure_config_digest(config_digest);
        cache
    }

    /// Looks up the entry for a file by its absolute path.
    ///
    /// Returns `None` on miss, unreadable or corrupt entries, and entries
    /// written by an incompatible format version.
    #[must_use]
    pub fn get(&self, file: &Path) -> Option<CacheContents> {
        let entry = self.entry_path(file);
        let data = fs::read_to_string(&entry).ok()?;
        let contents: CacheContents = match serde_json::from_str(&data) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("discarding corrupt cache entry {}: {e}", entry.display());
                return None;
            }
        };
        if contents.version != CACHE_FORMAT_VERSION {
            debug!(
                "discarding cache entry {} with format version {}",
                entry.display(),
                contents.version
            );
            return None;
        }
        Some(contents)
    }

    /// Returns cached references for `file` when its contents are unchanged,
    /// otherwise invokes `compute`, stores the fresh result, and returns it.
    ///
    /// # Errors
    ///
    /// Propagates the error from `compute`; failed computations are never
    /// cached.
    pub fn fetch_or_compute<F>(
        &self,
        file: &Path,
        compute: F,
    ) -> Result<Vec<UnresolvedReference>, ParseError>
    where
        F: FnOnce() -> Result<Vec<UnresolvedReference>, ParseError>,
    {
        let Ok(bytes) = fs::read(file) else {
            // Unreadable file: let the computation surface the real error.
            return compute();
        };
        let current_digest = digest::hex_digest(&bytes);

        if let Some(contents) = self.get(file) {
            if contents.file_content_digest == current_digest {
                debug!("cache hit for {}", file.display());
                return Ok(contents.unresolved_references);
            }
            debug!("cache stale for {}", file.display());
        }

        let references = compute()?;
        self.store(
            file,
            &CacheContents {
                version: CACHE_FORMAT_VERSION,
                file_content_digest: current_digest,
                unresolved_references: references.clone(),
            },
        );
        Ok(references)
    }

    /// Deletes all persisted entries.
    pub fn bust(&self) {
        if self.directory.exists() {
            if let Err(e) = fs::remove_dir_all(&self.directory) {
                warn!("failed to bust cache at {}: {e}", self.directory.display());
            }
        }
    }

    /// Writes an entry atomically (temp-file-then-rename), best effort.
    ///
    /// A concurrent reader never observes a partially written entry;
    /// concurrent writers for the same key are last-write-wins.
    fn store(&self, file: &Path, contents: &CacheContents) {
        if let Err(e) = self.try_store(file, contents) {
            warn!("failed to write cache entry for {}: {e}", file.display());
        }
    }

    fn try_store(&self, file: &Path, contents: &CacheContents) -> std::io::Result<()> {
        let entry = self.entry_path(file);
        let shard = entry.parent().unwrap_or(&self.directory);
        fs::create_dir_all(shard)?;

        let data = serde_json::to_string(contents)?;
        let mut temp = tempfile::NamedTempFile::new_in(shard)?;
        temp.write_all(data.as_bytes())?;
        temp.persist(&entry).map_err(|e| e.error)?;
        Ok(())
    }

    /// Busts the cache when the stored configuration digest differs, then
    /// records the current digest. Best effort on all IO.
    fn ensure_config_digest(&self, config_digest: &str) {
        let marker = self.directory.join(CONFIG_DIGEST_MARKER);
        match fs::read_to_string(&marker) {
            Ok(stored) if stored == config_digest => return,
            Ok(_) => {
                debug!("configuration digest changed, busting cache");
                self.bust();
            }
            Err(_) => {}
        }
        if let Err(e) =
            fs::create_dir_all(&self.directory).and_then(|()| fs::write(&marker, config_digest))
        {
            warn!("failed to record cache config digest: {e}");
        }
    }

    fn entry_path(&self, file: &Path) -> PathBuf {
        let key = digest::hex_digest(file.to_string_lossy().as_bytes());
        self.directory.join(&key[..2]).join(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceLocation;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn sample_references(file: &str) -> Vec<UnresolvedReference> {
        vec![UnresolvedReference {
            constant_name: "MyConstant".to_string(),
            namespace_path: vec!["Billing".to_string()],
            referencing_file: PathBuf::from(file),
            location: SourceLocation::new(5, 5),
        }]
    }

    fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn second_fetch_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "class MyClass; end");
        let cache = Cache::new(dir.path().join("cache"), "cfg");
        let computations = AtomicUsize::new(0);

        for _ in 0..2 {
            let refs = cache
                .fetch_or_compute(&source, || {
                    computations.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_references("exile.rb"))
                })
                .unwrap();
            assert_eq!(refs, sample_references("exile.rb"));
        }

        assert_eq!(computations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn content_change_invalidates_entry() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "v1");
        let cache = Cache::new(dir.path().join("cache"), "cfg");
        let computations = AtomicUsize::new(0);

        let run = || {
            cache
                .fetch_or_compute(&source, || {
                    computations.fetch_add(1, Ordering::SeqCst);
                    Ok(sample_references("exile.rb"))
                })
                .unwrap()
        };

        run();
        fs::write(&source, "v2").unwrap();
        run();
        run();

        assert_eq!(computations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn one_entry_per_distinct_file() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        let cache = Cache::new(cache_dir.clone(), "cfg");

        for i in 0..5 {
            let source = write_source(&dir, &format!("file_{i}.rb"), "contents");
            cache
                .fetch_or_compute(&source, || Ok(sample_references("f")))
                .unwrap();
        }

        let entries = walkdir::WalkDir::new(&cache_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name() != CONFIG_DIGEST_MARKER)
            .count();
        assert_eq!(entries, 5);
    }

    #[test]
    fn version_mismatch_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "contents");
        let cache = Cache::new(dir.path().join("cache"), "cfg");

        cache
            .fetch_or_compute(&source, || Ok(sample_references("exile.rb")))
            .unwrap();

        let mut contents = cache.get(&source).unwrap();
        contents.version = CACHE_FORMAT_VERSION + 1;
        cache.store(&source, &contents);

        assert!(cache.get(&source).is_none());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "contents");
        let cache = Cache::new(dir.path().join("cache"), "cfg");

        cache
            .fetch_or_compute(&source, || Ok(sample_references("exile.rb")))
            .unwrap();
        fs::write(cache.entry_path(&source), "{not json").unwrap();

        assert!(cache.get(&source).is_none());

        // And the next fetch recomputes and repairs the entry.
        let computations = AtomicUsize::new(0);
        cache
            .fetch_or_compute(&source, || {
                computations.fetch_add(1, Ordering::SeqCst);
                Ok(sample_references("exile.rb"))
            })
            .unwrap();
        assert_eq!(computations.load(Ordering::SeqCst), 1);
        assert!(cache.get(&source).is_some());
    }

    #[test]
    fn bust_removes_all_entries() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "contents");
        let cache = Cache::new(dir.path().join("cache"), "cfg");

        cache
            .fetch_or_compute(&source, || Ok(sample_references("exile.rb")))
            .unwrap();
        cache.bust();

        assert!(cache.get(&source).is_none());
    }

    #[test]
    fn config_digest_change_busts_cache() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "contents");
        let cache_dir = dir.path().join("cache");

        let cache = Cache::new(cache_dir.clone(), "digest-a");
        cache
            .fetch_or_compute(&source, || Ok(sample_references("exile.rb")))
            .unwrap();
        assert!(cache.get(&source).is_some());

        let rebuilt = Cache::new(cache_dir.clone(), "digest-b");
        assert!(rebuilt.get(&source).is_none());

        // Same digest keeps entries.
        let cache = Cache::new(cache_dir.clone(), "digest-b");
        cache
            .fetch_or_compute(&source, || Ok(sample_references("exile.rb")))
            .unwrap();
        let unchanged = Cache::new(cache_dir, "digest-b");
        assert!(unchanged.get(&source).is_some());
    }

    #[test]
    fn failed_computations_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, "exile.rb", "contents");
        let cache = Cache::new(dir.path().join("cache"), "cfg");

        let result = cache.fetch_or_compute(&source, || {
            Err(ParseError::Syntax {
                path: source.clone(),
                message: "unexpected end".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(cache.get(&source).is_none());
    }
}
