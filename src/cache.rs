use crate::document::BuilderPlan;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub plan: BuilderPlan,
}

/// Compiled builder plans keyed by document, invalidated by content hash.
pub struct IncrementalCache {
    cache_dir: PathBuf,
    /// Mixed into every hash so a changed type universe invalidates all entries.
    fingerprint: String,
}

impl IncrementalCache {
    pub fn new(cache_dir: impl Into<PathBuf>, fingerprint: impl Into<String>) -> Self {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            if let Err(error) = fs::create_dir_all(&cache_dir) {
                warn!(dir = %cache_dir.display(), %error, "cannot create cache directory");
            }
        }
        Self {
            cache_dir,
            fingerprint: fingerprint.into(),
        }
    }

    pub fn compute_hash(source: &str, fingerprint: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update([0u8]);
        hasher.update(fingerprint.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Hash of every metadata file, in order, for use as a cache fingerprint.
    pub fn fingerprint_files(paths: &[PathBuf]) -> String {
        let mut hasher = Sha256::new();
        for path in paths {
            hasher.update(path.to_string_lossy().as_bytes());
            match fs::read(path) {
                Ok(bytes) => hasher.update(&bytes),
                Err(error) => warn!(path = %path.display(), %error, "metadata unreadable for fingerprint"),
            }
        }
        format!("{:x}", hasher.finalize())
    }

    fn cache_path(&self, document: &Path) -> PathBuf {
        let safe_name = document
            .to_string_lossy()
            .replace(['/', '\\', ':'], "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, document: &Path, source: &str) -> Option<BuilderPlan> {
        let cache_path = self.cache_path(document);
        if !cache_path.exists() {
            return None;
        }

        let data = fs::read_to_string(&cache_path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(document = %document.display(), %error, "removing corrupt cache entry");
                fs::remove_file(&cache_path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(source, &self.fingerprint) {
            debug!(document = %document.display(), "cache hit");
            Some(entry.plan)
        } else {
            None
        }
    }

    pub fn set(&self, document: &Path, source: &str, plan: &BuilderPlan) {
        let cache_path = self.cache_path(document);
        let entry = CacheEntry {
            hash: Self::compute_hash(source, &self.fingerprint),
            plan: plan.clone(),
        };

        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(error) = fs::write(&cache_path, data) {
                    warn!(path = %cache_path.display(), %error, "cannot write cache entry");
                }
            }
            Err(error) => warn!(document = %document.display(), %error, "cannot serialize cache entry"),
        }
    }
}
