//! Downloads missing artifacts from their configured remote locations.

use std::{
    io::{BufWriter, Write},
    path::PathBuf,
    time::Duration,
};

use reqwest::blocking::Client;
use tracing::{info, warn};

use super::{ArtifactId, ArtifactStore};
use crate::{
    config::SourcesConfig,
    error::{RecommendError, Result},
};

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub struct ArtifactFetcher {
    client: Client,
    store: ArtifactStore,
    sources: SourcesConfig,
}

impl ArtifactFetcher {
    pub fn new(store: ArtifactStore, sources: SourcesConfig) -> Result<Self> {
        let timeout = sources
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RecommendError::Download { artifact: "client", source })?;
        Ok(Self { client, store, sources })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Local path of `id`, downloading it first when absent.
    ///
    /// A present file is never re-downloaded. A download goes to a temp
    /// file in the artifact directory and is renamed into place only after
    /// the whole body arrived.
    pub fn ensure_local(&self, id: ArtifactId) -> Result<PathBuf> {
        let path = self.store.path(id);
        if path.is_file() {
            return Ok(path);
        }
        let url = self.sources.url(id).ok_or(RecommendError::NoSource(id.name()))?;
        let dir = self.store.dir();
        std::fs::create_dir_all(dir).map_err(|e| RecommendError::io(dir, e))?;

        info!(artifact = id.name(), url, "downloading artifact");
        let download = |source: reqwest::Error| RecommendError::Download { artifact: id.name(), source };
        let mut resp = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(download)?;

        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| RecommendError::io(dir, e))?;
        let bytes = {
            let mut writer = BufWriter::new(tmp.as_file());
            let n = resp.copy_to(&mut writer).map_err(download)?;
            writer.flush().map_err(|e| RecommendError::io(&path, e))?;
            n
        };
        tmp.persist(&path).map_err(|e| RecommendError::io(&path, e.error))?;
        info!(artifact = id.name(), bytes, path = %path.display(), "artifact downloaded");
        Ok(path)
    }

    /// Ensure corpus and features. The similarity matrix is optional, so a
    /// missing source for it only logs.
    pub fn ensure_all(&self) -> Result<()> {
        self.ensure_local(ArtifactId::Corpus)?;
        self.ensure_local(ArtifactId::Features)?;
        match self.ensure_local(ArtifactId::Similarity) {
            Ok(_) => Ok(()),
            Err(RecommendError::NoSource(_)) => {
                warn!("no source for the similarity matrix, it will be computed on demand");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
