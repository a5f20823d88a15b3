pub mod bert_embedding;
pub mod bert_tokenizer;
pub mod iris;
pub mod vectors;
pub mod word_similarity;

pub use bert_embedding::BertEmbedding;
pub use bert_tokenizer::BertTokenizer;
pub use iris::IrisClassifier;
pub use word_similarity::WordSimilarity;

use serde::Serialize;

use crate::error::{InferenceError, LoadError};
use crate::handle::Artifacts;
use crate::schema::{Envelope, Predictions};

/// A servable model: how to build it from its artifacts and how to answer
/// one request envelope.
pub trait Model: Sized + Send + Sync + 'static {
    /// Short name used in logs and the model description endpoint.
    const KIND: &'static str;

    /// File names fetched from the model source before [`Model::load`].
    const ARTIFACTS: &'static [&'static str];

    type Request: Envelope;
    type Response: Serialize + Send + 'static;

    fn load(artifacts: &Artifacts) -> Result<Self, LoadError>;

    /// Score a whole envelope in one call. All-or-nothing.
    fn invoke(&self, request: Self::Request) -> Result<Self::Response, InferenceError>;
}

/// Run a batched scorer and check it produced one prediction per record.
pub fn score_batch<R, P, F>(records: &[R], score: F) -> Result<Predictions<P>, InferenceError>
where
    F: FnOnce(&[R]) -> Result<Vec<P>, InferenceError>,
{
    let predictions = score(records)?;
    if predictions.len() != records.len() {
        return Err(InferenceError::Misaligned {
            expected: records.len(),
            actual: predictions.len(),
        });
    }
    Ok(Predictions { predictions })
}
