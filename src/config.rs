use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::handle::{ArtifactFetcher, ModelSource, DEFAULT_HUB_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    /// Decision-tree iris species classifier
    Iris,
    /// Nearest neighbours over word vectors
    WordSimilarity,
    /// WordPiece tokens and ids for a text
    BertTokenizer,
    /// Mean-pooled token embedding of a text
    BertEmbedding,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "inference-shim", version, about = "Serve one model over /ping and /invocations")]
pub struct Config {
    /// Which model to serve
    #[arg(long, env = "MODEL_KIND", value_enum)]
    pub model: ModelKind,

    /// Directory holding the model artifacts
    #[arg(long, env = "MODEL_DIR", default_value = "/opt/ml/model")]
    pub model_dir: PathBuf,

    /// Fetch artifacts from this model hub repository instead of MODEL_DIR
    #[arg(long, env = "PRETRAINED_MODEL")]
    pub pretrained: Option<String>,

    #[arg(long, env = "HF_HUB_URL", default_value = DEFAULT_HUB_URL)]
    pub hub_url: String,

    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub hub_token: Option<String>,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Load the model on first request instead of before binding
    #[arg(long)]
    pub lazy_load: bool,
}

impl Config {
    pub fn model_source(&self) -> ModelSource {
        match &self.pretrained {
            Some(repo) => ModelSource::Pretrained(repo.clone()),
            None => ModelSource::Directory(self.model_dir.clone()),
        }
    }

    pub fn fetcher(&self) -> ArtifactFetcher {
        ArtifactFetcher::new(self.hub_url.clone(), self.hub_token.clone())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
