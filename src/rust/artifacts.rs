use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::config::{ClassifierConfig, LABELS_FILE, MODEL_FILE, VOCABULARY_FILE};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifacts not present: {0}")]
    NotPresent(String),
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid bundle manifest: {0}")]
    Manifest(String),
}

/// The three files a classifier needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    Vocabulary,
    Labels,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Model, ArtifactKind::Vocabulary, ArtifactKind::Labels];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Model => MODEL_FILE,
            Self::Vocabulary => VOCABULARY_FILE,
            Self::Labels => LABELS_FILE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub url: String,
    /// Lower-case hex SHA-256 of the file contents
    pub sha256: String,
}

/// A named set of model, vocabulary and label files, as described by a
/// JSON manifest:
///
/// ```json
/// {
///   "name": "emotion-bilstm",
///   "model": { "url": "https://example.org/model.onnx", "sha256": "..." },
///   "vocabulary": { "url": "https://example.org/word_index.txt", "sha256": "..." },
///   "labels": { "url": "https://example.org/labels.txt", "sha256": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub name: String,
    pub model: RemoteFile,
    pub vocabulary: RemoteFile,
    pub labels: RemoteFile,
}

impl ArtifactBundle {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let content = fs::read_to_string(path.as_ref())?;
        let bundle: Self = serde_json::from_str(&content).map_err(|e| ArtifactError::Manifest(e.to_string()))?;
        if bundle.name.is_empty() || bundle.name.contains(&['/', '\\'][..]) || bundle.name == ".." {
            return Err(ArtifactError::Manifest(format!("Invalid bundle name '{}'", bundle.name)));
        }
        Ok(bundle)
    }

    pub fn file(&self, kind: ArtifactKind) -> &RemoteFile {
        match kind {
            ArtifactKind::Model => &self.model,
            ArtifactKind::Vocabulary => &self.vocabulary,
            ArtifactKind::Labels => &self.labels,
        }
    }
}

/// Local cache of artifact bundles, one directory per bundle name.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore in the default cache directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_dir())
    }

    /// Returns the default cache directory path
    pub fn default_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("EMOTION_CLASSIFIER_CACHE") {
            return PathBuf::from(path).join("artifacts");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("emotion-classifier").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("emotion-classifier").join("artifacts");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("emotion-classifier").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_dir(&self, bundle: &ArtifactBundle) -> PathBuf {
        self.root.join(&bundle.name)
    }

    pub fn path(&self, bundle: &ArtifactBundle, kind: ArtifactKind) -> PathBuf {
        self.bundle_dir(bundle).join(kind.file_name())
    }

    /// Classifier settings pointing at this bundle's cached files.
    pub fn config_for(&self, bundle: &ArtifactBundle) -> ClassifierConfig {
        ClassifierConfig::from_base_dir(self.bundle_dir(bundle))
    }

    /// Settings for a bundle that must already be in the cache.
    pub fn require(&self, bundle: &ArtifactBundle) -> Result<ClassifierConfig, ArtifactError> {
        if !self.is_present(bundle) {
            return Err(ArtifactError::NotPresent(format!(
                "bundle '{}' is not in {:?}, fetch it first",
                bundle.name, self.root
            )));
        }
        Ok(self.config_for(bundle))
    }

    pub fn is_present(&self, bundle: &ArtifactBundle) -> bool {
        ArtifactKind::ALL.iter().all(|&kind| {
            let path = self.path(bundle, kind);
            log::debug!("  {:?} (exists: {})", path, path.exists());
            path.exists()
        })
    }

    /// Whether every file exists and matches its expected hash.
    pub fn verify(&self, bundle: &ArtifactBundle) -> Result<bool, ArtifactError> {
        log::info!("Verifying artifacts of bundle '{}'", bundle.name);
        for kind in ArtifactKind::ALL {
            let path = self.path(bundle, kind);
            if !path.exists() {
                log::info!("{:?} is missing", path);
                return Ok(false);
            }
            if !verify_file(&path, &bundle.file(kind).sha256)? {
                log::warn!("{:?} failed hash verification", path);
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Downloads every file that is missing or fails verification.
    ///
    /// Files are checked against their hash before being written. On any
    /// failure the bundle directory is cleaned up so no partial bundle is
    /// left behind.
    pub async fn fetch(&self, bundle: &ArtifactBundle) -> Result<(), ArtifactError> {
        let _lock = self.download_lock.lock().await;

        let dir = self.bundle_dir(bundle);
        log::info!("Creating bundle directory at {:?}", dir);
        fs::create_dir_all(&dir)?;

        for kind in ArtifactKind::ALL {
            let path = self.path(bundle, kind);
            let remote = bundle.file(kind);
            if path.exists() && verify_file(&path, &remote.sha256)? {
                log::info!("Existing {:?} verified successfully", path);
                continue;
            }
            if let Err(e) = download_and_verify(remote, &path, kind.file_name()).await {
                log::error!("Failed to fetch {}: {}", kind.file_name(), e);
                let _ = self.remove(bundle);
                return Err(e);
            }
        }

        log::info!("Bundle '{}' ready to use", bundle.name);
        Ok(())
    }

    /// Fetches the bundle unless it is already present and intact.
    pub async fn ensure(&self, bundle: &ArtifactBundle) -> Result<(), ArtifactError> {
        if self.is_present(bundle) && self.verify(bundle)? {
            log::info!("Bundle '{}' verification successful", bundle.name);
            return Ok(());
        }
        self.fetch(bundle).await
    }

    pub fn remove(&self, bundle: &ArtifactBundle) -> Result<(), ArtifactError> {
        for kind in ArtifactKind::ALL {
            let path = self.path(bundle, kind);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
    let bytes = fs::read(path)?;
    let hash = sha256_hex(&bytes);
    log::debug!("{:?}: {} bytes, hash {} (expected {})", path, bytes.len(), hash, expected_hash);
    Ok(hash.eq_ignore_ascii_case(expected_hash))
}

async fn download_and_verify(remote: &RemoteFile, path: &Path, file: &str) -> Result<(), ArtifactError> {
    log::info!("Downloading {} from {} to {:?}", file, remote.url, path);
    let response = reqwest::get(&remote.url).await?.error_for_status()?;
    let bytes = response.bytes().await?;
    log::info!("Downloaded {} bytes", bytes.len());

    let hash = sha256_hex(&bytes);
    if !hash.eq_ignore_ascii_case(&remote.sha256) {
        return Err(ArtifactError::HashMismatch {
            file: file.to_string(),
            expected: remote.sha256.clone(),
            actual: hash,
        });
    }

    // Written next to the target and renamed so readers never see a partial file.
    let partial = path.with_extension("part");
    fs::write(&partial, &bytes)?;
    fs::rename(&partial, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODEL: &[u8] = b"not really onnx";
    const VOCAB: &[u8] = b"happy 1\nsad 2\n";
    const LABELS: &[u8] = b"joy\nsadness\n";

    fn bundle() -> ArtifactBundle {
        let remote = |name: &str, bytes: &[u8]| RemoteFile {
            url: format!("http://127.0.0.1:9/{}", name),
            sha256: sha256_hex(bytes),
        };
        ArtifactBundle {
            name: "test-bundle".to_string(),
            model: remote("model.onnx", MODEL),
            vocabulary: remote("word_index.txt", VOCAB),
            labels: remote("labels.txt", LABELS),
        }
    }

    fn populate(store: &ArtifactStore, bundle: &ArtifactBundle) {
        fs::create_dir_all(store.bundle_dir(bundle)).unwrap();
        fs::write(store.path(bundle, ArtifactKind::Model), MODEL).unwrap();
        fs::write(store.path(bundle, ArtifactKind::Vocabulary), VOCAB).unwrap();
        fs::write(store.path(bundle, ArtifactKind::Labels), LABELS).unwrap();
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_paths_and_config() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let bundle = bundle();
        assert!(store.path(&bundle, ArtifactKind::Model).ends_with("test-bundle/model.onnx"));
        let config = store.config_for(&bundle);
        assert_eq!(config.labels_path, dir.path().join("test-bundle").join("labels.txt"));
    }

    #[test]
    fn test_verify_absent_present_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let bundle = bundle();

        assert!(!store.is_present(&bundle));
        assert!(!store.verify(&bundle).unwrap());
        assert!(matches!(store.require(&bundle), Err(ArtifactError::NotPresent(_))));

        populate(&store, &bundle);
        assert!(store.require(&bundle).is_ok());
        assert!(store.is_present(&bundle));
        assert!(store.verify(&bundle).unwrap());

        fs::write(store.path(&bundle, ArtifactKind::Labels), "corrupted data").unwrap();
        assert!(!store.verify(&bundle).unwrap());

        store.remove(&bundle).unwrap();
        assert!(!store.is_present(&bundle));
    }

    #[test]
    fn test_ensure_skips_download_when_intact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let bundle = bundle();
        populate(&store, &bundle);

        // The URLs point at a closed port, so this only passes without a download.
        tokio_test::block_on(store.ensure(&bundle)).unwrap();
    }

    #[tokio::test]
    async fn test_failed_fetch_cleans_up() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let bundle = bundle();
        populate(&store, &bundle);
        fs::write(store.path(&bundle, ArtifactKind::Model), "corrupted data").unwrap();

        assert!(store.fetch(&bundle).await.is_err());
        assert!(!store.is_present(&bundle));
    }

    #[test]
    fn test_manifest_rejects_path_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bundle.json");
        let mut manifest = bundle();
        manifest.name = "../escape".to_string();
        fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
        assert!(matches!(ArtifactBundle::from_json_file(&path), Err(ArtifactError::Manifest(_))));

        manifest.name = "ok".to_string();
        fs::write(&path, serde_json::to_string(&manifest).unwrap()).unwrap();
        assert_eq!(ArtifactBundle::from_json_file(&path).unwrap().name, "ok");
    }

    #[test]
    fn test_default_dir() {
        env::set_var("EMOTION_CLASSIFIER_CACHE", "/tmp/test-cache");
        let path = ArtifactStore::default_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-cache/artifacts"));
        env::remove_var("EMOTION_CLASSIFIER_CACHE");
    }
}
