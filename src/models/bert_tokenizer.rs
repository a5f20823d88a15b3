use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use super::Model;
use crate::error::{InferenceError, LoadError};
use crate::handle::Artifacts;
use crate::schema::{Field, FieldKind, Record, Single};

pub const TOKENIZER_ARTIFACT: &str = "tokenizer.json";

#[derive(Debug, Clone, Deserialize)]
pub struct TextInput {
    pub text: String,
}

impl Record for TextInput {
    const FIELDS: &'static [Field] = &[Field::required("text", FieldKind::Text)];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedText {
    pub tokens: Vec<String>,
    pub id_tokens: Vec<u32>,
}

pub(crate) fn load_tokenizer(artifacts: &Artifacts) -> Result<Tokenizer, LoadError> {
    Tokenizer::from_bytes(artifacts.get(TOKENIZER_ARTIFACT)?)
        .map_err(|e| LoadError::corrupt(TOKENIZER_ARTIFACT, e))
}

/// Splits text into word pieces and their vocabulary ids, without special
/// tokens.
pub struct BertTokenizer {
    tokenizer: Tokenizer,
}

impl BertTokenizer {
    pub fn tokenize(&self, text: &str) -> Result<TokenizedText, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;
        Ok(TokenizedText {
            tokens: encoding.get_tokens().to_vec(),
            id_tokens: encoding.get_ids().to_vec(),
        })
    }
}

impl Model for BertTokenizer {
    const KIND: &'static str = "bert-tokenizer";
    const ARTIFACTS: &'static [&'static str] = &[TOKENIZER_ARTIFACT];

    type Request = Single<TextInput>;
    type Response = TokenizedText;

    fn load(artifacts: &Artifacts) -> Result<Self, LoadError> {
        Ok(Self {
            tokenizer: load_tokenizer(artifacts)?,
        })
    }

    fn invoke(&self, Single(input): Self::Request) -> Result<Self::Response, InferenceError> {
        self.tokenize(&input.text)
    }
}
