use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::models::Model;

pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

/// Where a model's artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A local directory, e.g. the platform's `/opt/ml/model` mount.
    Directory(PathBuf),
    /// A named repository on the model hub.
    Pretrained(String),
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Directory(dir) => write!(f, "{}", dir.display()),
            ModelSource::Pretrained(repo) => write!(f, "pretrained:{repo}"),
        }
    }
}

/// Raw artifact bytes keyed by file name.
#[derive(Debug, Default)]
pub struct Artifacts {
    files: HashMap<&'static str, Vec<u8>>,
}

impl Artifacts {
    pub fn insert(&mut self, name: &'static str, bytes: Vec<u8>) {
        self.files.insert(name, bytes);
    }

    pub fn get(&self, name: &str) -> Result<&[u8], LoadError> {
        self.files
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| LoadError::NotFound {
                location: name.to_string(),
            })
    }

    pub fn text(&self, name: &str) -> Result<&str, LoadError> {
        std::str::from_utf8(self.get(name)?).map_err(|e| LoadError::corrupt(name, e))
    }
}

/// Reads artifacts from a [`ModelSource`].
#[derive(Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    hub_url: String,
    hub_token: Option<String>,
}

impl Default for ArtifactFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_URL, None)
    }
}

impl ArtifactFetcher {
    pub fn new(hub_url: impl Into<String>, hub_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            hub_url: hub_url.into().trim_end_matches('/').to_string(),
            hub_token,
        }
    }

    pub async fn fetch(
        &self,
        source: &ModelSource,
        names: &[&'static str],
    ) -> Result<Artifacts, LoadError> {
        let mut artifacts = Artifacts::default();
        for &name in names {
            let bytes = match source {
                ModelSource::Directory(dir) => read_file(dir.join(name)).await?,
                ModelSource::Pretrained(repo) => self.download(repo, name).await?,
            };
            artifacts.insert(name, bytes);
        }
        Ok(artifacts)
    }

    async fn download(&self, repo: &str, name: &str) -> Result<Vec<u8>, LoadError> {
        let location = format!("{}/{}/resolve/main/{}", self.hub_url, repo, name);

        let mut request = self.client.get(&location);
        if let Some(token) = &self.hub_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|source| LoadError::Fetch {
            location: location.clone(),
            source,
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LoadError::NotFound { location });
        }
        if !status.is_success() {
            return Err(LoadError::HubStatus {
                location,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| LoadError::Fetch { location, source })?;
        Ok(bytes.to_vec())
    }
}

async fn read_file(path: PathBuf) -> Result<Vec<u8>, LoadError> {
    let location = path.display().to_string();
    tokio::fs::read(&path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound { location }
        } else {
            LoadError::Io { location, source }
        }
    })
}

/// A successfully loaded model.
pub struct LoadedModel<M> {
    pub model: M,
    pub loaded_at: DateTime<Utc>,
}

/// Process-scoped holder of one lazily loaded, immutable model.
///
/// Concurrent first callers of [`acquire`](Self::acquire) wait on a single
/// load. A failed load leaves the cell empty so the next call retries.
pub struct ModelHandle<M> {
    source: ModelSource,
    fetcher: ArtifactFetcher,
    cell: OnceCell<Arc<LoadedModel<M>>>,
    load_attempts: AtomicUsize,
}

impl<M: Model> ModelHandle<M> {
    pub fn new(source: ModelSource, fetcher: ArtifactFetcher) -> Self {
        Self {
            source,
            fetcher,
            cell: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    pub async fn acquire(&self) -> Result<Arc<LoadedModel<M>>, LoadError> {
        let loaded = self.cell.get_or_try_init(|| self.load()).await?;
        Ok(Arc::clone(loaded))
    }

    async fn load(&self) -> Result<Arc<LoadedModel<M>>, LoadError> {
        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(model = M::KIND, source = %self.source, attempt, "Loading model");

        let result = async {
            let artifacts = self.fetcher.fetch(&self.source, M::ARTIFACTS).await?;
            tokio::task::spawn_blocking(move || M::load(&artifacts))
                .await
                .map_err(|e| LoadError::Panicked(e.to_string()))?
        }
        .await;

        match result {
            Ok(model) => {
                info!(model = M::KIND, source = %self.source, "Model loaded");
                Ok(Arc::new(LoadedModel {
                    model,
                    loaded_at: Utc::now(),
                }))
            }
            Err(e) => {
                warn!(model = M::KIND, source = %self.source, error = %e, "Model load failed");
                Err(e)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.cell.get().map(|loaded| loaded.loaded_at)
    }

    /// Number of load attempts made so far, successful or not.
    pub fn load_count(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }
}
