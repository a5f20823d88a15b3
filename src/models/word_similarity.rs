use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::vectors::VectorTable;
use super::Model;
use crate::error::{InferenceError, LoadError};
use crate::handle::Artifacts;
use crate::schema::{Field, FieldKind, Record, Single};

pub const VECTORS_ARTIFACT: &str = "word-vectors.txt";

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct WordQuery {
    pub word: String,
    #[serde(default)]
    pub topn: Option<usize>,
}

impl Record for WordQuery {
    const FIELDS: &'static [Field] = &[
        Field::required("word", FieldKind::Text),
        Field::optional("topn", FieldKind::Integer),
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordScore {
    pub word: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarWords {
    pub word_similarities: Vec<WordScore>,
}

/// Nearest neighbours by cosine similarity over unit-normalized word vectors.
#[derive(Debug)]
pub struct WordSimilarity {
    vectors: VectorTable,
    index: HashMap<String, usize>,
}

impl WordSimilarity {
    pub fn most_similar(&self, word: &str, topn: usize) -> Result<Vec<WordScore>, InferenceError> {
        let &query = self
            .index
            .get(word)
            .ok_or_else(|| InferenceError::UnknownWord(word.to_string()))?;
        let target = self.vectors.row(query).unwrap_or_default();

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .rows()
            .enumerate()
            .filter(|&(i, _)| i != query)
            .map(|(i, row)| (i, row.iter().zip(target).map(|(a, b)| a * b).sum()))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(topn);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| WordScore {
                word: self.vectors.labels[i].clone(),
                similarity,
            })
            .collect())
    }
}

impl Model for WordSimilarity {
    const KIND: &'static str = "word-similarity";
    const ARTIFACTS: &'static [&'static str] = &[VECTORS_ARTIFACT];

    type Request = Single<WordQuery>;
    type Response = SimilarWords;

    fn load(artifacts: &Artifacts) -> Result<Self, LoadError> {
        let mut vectors =
            VectorTable::parse(VECTORS_ARTIFACT, artifacts.text(VECTORS_ARTIFACT)?, true)?;
        vectors.normalize();

        let mut index = HashMap::with_capacity(vectors.labels.len());
        for (i, word) in vectors.labels.iter().enumerate() {
            if index.insert(word.clone(), i).is_some() {
                return Err(LoadError::corrupt(
                    VECTORS_ARTIFACT,
                    format!("duplicate word '{word}'"),
                ));
            }
        }

        Ok(Self { vectors, index })
    }

    fn invoke(&self, Single(query): Self::Request) -> Result<Self::Response, InferenceError> {
        let topn = query.topn.unwrap_or(DEFAULT_TOP_N);
        Ok(SimilarWords {
            word_similarities: self.most_similar(&query.word, topn)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORS: &str = "4 2\nking 1.0 0.1\nqueen 0.9 0.2\napple 0.0 1.0\nprince 0.8 0.0\n";

    fn model() -> WordSimilarity {
        let mut artifacts = Artifacts::default();
        artifacts.insert(VECTORS_ARTIFACT, VECTORS.as_bytes().to_vec());
        WordSimilarity::load(&artifacts).unwrap()
    }

    #[test]
    fn ranks_neighbours_by_cosine() {
        let response = model()
            .invoke(Single(WordQuery {
                word: "king".to_string(),
                topn: None,
            }))
            .unwrap();
        let words: Vec<_> = response
            .word_similarities
            .iter()
            .map(|s| s.word.as_str())
            .collect();
        assert_eq!(words, vec!["prince", "queen", "apple"]);
        assert!(response.word_similarities[0].similarity > 0.99);
        assert!(response.word_similarities[2].similarity < 0.2);
    }

    #[test]
    fn topn_limits_results() {
        let scores = model().most_similar("apple", 1).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].word, "queen");
        assert!(model().most_similar("apple", 0).unwrap().is_empty());
    }

    #[test]
    fn unknown_word_is_an_inference_error() {
        let err = model().most_similar("zebra", 3).unwrap_err();
        assert!(matches!(err, InferenceError::UnknownWord(w) if w == "zebra"));
    }

    #[test]
    fn duplicate_words_fail_to_load() {
        let mut artifacts = Artifacts::default();
        artifacts.insert(VECTORS_ARTIFACT, b"2 1\nsame 1\nsame 2\n".to_vec());
        assert!(matches!(
            WordSimilarity::load(&artifacts),
            Err(LoadError::Corrupt { .. })
        ));
    }
}
