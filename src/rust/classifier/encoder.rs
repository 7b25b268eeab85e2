use std::sync::Arc;
use ndarray::Array1;
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::vocabulary::{VocabularyTable, MAX_INDEX};

/// Sequence length the bundled model was trained with.
pub const DEFAULT_MAX_LEN: usize = 100;

/// Index written into unused trailing positions.
pub const PAD_INDEX: u32 = 0;

/// Fixed-length model input, one entry per token position.
///
/// Indices are stored as `f32`, exact up to [`MAX_INDEX`]; the vocabulary
/// loader rejects larger ones.
pub type FeatureVector = Array1<f32>;

/// How tokens missing from the vocabulary are indexed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OovPolicy {
    /// Unknown tokens share the padding index (0).
    #[default]
    Pad,
    /// Unknown tokens map to this index.
    Reserved(u32),
    /// Unknown tokens map to the index of this vocabulary entry, e.g. `<OOV>`.
    Token(String),
}

/// Turns raw text into a fixed-length [`FeatureVector`].
///
/// Text is split on whitespace, each piece keeps only its alphanumeric
/// characters (lower-cased), pieces that end up empty are dropped, and the
/// remaining tokens are indexed through the vocabulary. The index sequence is
/// right-padded with [`PAD_INDEX`] or truncated to `max_len`.
///
/// Encoding is a pure function of the text: the vocabulary is never mutated
/// and repeated calls produce identical vectors.
#[derive(Debug, Clone)]
pub struct TextEncoder {
    vocabulary: Arc<VocabularyTable>,
    max_len: usize,
    oov_policy: OovPolicy,
    oov_index: u32,
}

impl TextEncoder {
    /// Creates an encoder with the legacy OOV behavior ([`OovPolicy::Pad`]).
    pub fn new(vocabulary: Arc<VocabularyTable>, max_len: usize) -> Result<Self, ClassifierError> {
        Self::with_oov_policy(vocabulary, max_len, OovPolicy::Pad)
    }

    /// Creates an encoder with an explicit OOV policy.
    ///
    /// Fails if `max_len` is zero or if [`OovPolicy::Token`] names an entry
    /// the vocabulary does not contain.
    pub fn with_oov_policy(
        vocabulary: Arc<VocabularyTable>,
        max_len: usize,
        oov_policy: OovPolicy,
    ) -> Result<Self, ClassifierError> {
        if max_len == 0 {
            return Err(ClassifierError::BuildError("max_len must be at least 1".into()));
        }

        let oov_index = match &oov_policy {
            OovPolicy::Pad => PAD_INDEX,
            OovPolicy::Reserved(index) if *index > MAX_INDEX => {
                return Err(ClassifierError::BuildError(format!(
                    "OOV index {} exceeds the largest exact index {}",
                    index, MAX_INDEX
                )))
            }
            OovPolicy::Reserved(index) => *index,
            OovPolicy::Token(token) => vocabulary.get(token).ok_or_else(|| {
                ClassifierError::BuildError(format!("OOV token '{}' is not in the vocabulary", token))
            })?,
        };

        Ok(Self { vocabulary, max_len, oov_policy, oov_index })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn vocabulary(&self) -> &VocabularyTable {
        &self.vocabulary
    }

    pub fn oov_policy(&self) -> &OovPolicy {
        &self.oov_policy
    }

    /// Index assigned to tokens missing from the vocabulary.
    pub fn oov_index(&self) -> u32 {
        self.oov_index
    }

    /// Normalized tokens of `text`, in order, lazily.
    pub fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        tokenize(text)
    }

    /// Vocabulary indices of every token, before padding or truncation.
    pub fn token_ids(&self, text: &str) -> Vec<u32> {
        tokenize(text).map(|token| self.index_of(&token)).collect()
    }

    /// Number of tokens that survive normalization.
    pub fn count_tokens(&self, text: &str) -> usize {
        tokenize(text).count()
    }

    /// Whether encoding `text` drops tokens past `max_len`.
    pub fn is_truncated(&self, text: &str) -> bool {
        tokenize(text).nth(self.max_len).is_some()
    }

    /// Encodes `text` into a vector of exactly `max_len` values.
    pub fn encode(&self, text: &str) -> FeatureVector {
        let mut ids: Vec<u32> = tokenize(text)
            .take(self.max_len)
            .map(|token| self.index_of(&token))
            .collect();

        if ids.is_empty() {
            debug!("Input has no tokens after normalization, encoding as all padding");
        }
        ids.resize(self.max_len, PAD_INDEX);

        ids.into_iter().map(|id| id as f32).collect()
    }

    fn index_of(&self, token: &str) -> u32 {
        self.vocabulary.get(token).unwrap_or(self.oov_index)
    }
}

/// Splits on whitespace and normalizes each piece, dropping pieces that
/// normalize to nothing.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(normalize_token)
        .filter(|token| !token.is_empty())
}

/// Keeps alphanumeric characters only, lower-cased.
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
