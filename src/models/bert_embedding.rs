use tokenizers::{Tokenizer, TruncationParams};

use super::bert_tokenizer::{load_tokenizer, TextInput, TOKENIZER_ARTIFACT};
use super::vectors::VectorTable;
use super::Model;
use crate::error::{InferenceError, LoadError};
use crate::handle::Artifacts;
use crate::schema::Single;

pub const EMBEDDINGS_ARTIFACT: &str = "embeddings.txt";

/// Longest token sequence pooled per request.
pub const MAX_TOKENS: usize = 512;

/// Sentence embedding: the mean of the token embedding rows of the encoded
/// text, special tokens included. The tokenizer truncates the content so the
/// special tokens survive inside the [`MAX_TOKENS`] window.
pub struct BertEmbedding {
    tokenizer: Tokenizer,
    table: VectorTable,
}

impl BertEmbedding {
    pub fn dimension(&self) -> usize {
        self.table.dim
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;
        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Err(InferenceError::EmptyInput);
        }

        let mut pooled = vec![0.0f32; self.table.dim];
        for &id in ids {
            let row = self.table.row(id as usize).ok_or(InferenceError::TokenOutOfRange {
                id,
                rows: self.table.len(),
            })?;
            pooled.iter_mut().zip(row).for_each(|(acc, v)| *acc += v);
        }
        let n = ids.len() as f32;
        pooled.iter_mut().for_each(|v| *v /= n);
        Ok(pooled)
    }
}

impl Model for BertEmbedding {
    const KIND: &'static str = "bert-embedding";
    const ARTIFACTS: &'static [&'static str] = &[TOKENIZER_ARTIFACT, EMBEDDINGS_ARTIFACT];

    type Request = Single<TextInput>;
    type Response = Vec<f32>;

    fn load(artifacts: &Artifacts) -> Result<Self, LoadError> {
        let mut tokenizer = load_tokenizer(artifacts)?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| LoadError::incompatible(TOKENIZER_ARTIFACT, e))?;

        let table =
            VectorTable::parse(EMBEDDINGS_ARTIFACT, artifacts.text(EMBEDDINGS_ARTIFACT)?, false)?;

        let vocab = tokenizer.get_vocab_size(true);
        if table.len() < vocab {
            return Err(LoadError::incompatible(
                EMBEDDINGS_ARTIFACT,
                format!("{} rows cannot cover a vocabulary of {vocab}", table.len()),
            ));
        }

        Ok(Self { tokenizer, table })
    }

    fn invoke(&self, Single(input): Self::Request) -> Result<Self::Response, InferenceError> {
        self.embed(&input.text)
    }
}
