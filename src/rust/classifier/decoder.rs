use ndarray::Array1;
use serde::Serialize;

use super::error::ClassifierError;
use super::labels::LabelTable;

/// Model output, one score per known class.
pub type ScoreVector = Array1<f32>;

/// A decoded model output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The winning label, verbatim from the label table
    pub label: String,
    /// Class index of the winning label
    pub index: usize,
    /// Score of the winning class
    pub score: f32,
    /// All scores, in class-index order
    pub scores: Vec<f32>,
}

impl Prediction {
    /// Pairs every label with its score, highest score first.
    pub fn ranked<'a>(&self, labels: &'a LabelTable) -> Vec<(&'a str, f32)> {
        let mut ranked: Vec<(&str, f32)> = labels.iter().zip(self.scores.iter().copied()).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Index of the largest score. Ties go to the lowest index and NaN never
/// wins; `None` when no score is comparable.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Returns the label of the highest score.
///
/// Fails with [`ClassifierError::LabelCountMismatch`] when the widths differ
/// or there are no labels, never guessing a label.
pub fn decode<'a>(scores: &[f32], labels: &'a LabelTable) -> Result<&'a str, ClassifierError> {
    winner(scores, labels).map(|(_, label)| label)
}

/// Like [`decode`], keeping the index and scores.
pub fn decode_prediction(scores: &[f32], labels: &LabelTable) -> Result<Prediction, ClassifierError> {
    let (index, label) = winner(scores, labels)?;
    Ok(Prediction {
        label: label.to_string(),
        index,
        score: scores[index],
        scores: scores.to_vec(),
    })
}

fn winner<'a>(scores: &[f32], labels: &'a LabelTable) -> Result<(usize, &'a str), ClassifierError> {
    let mismatch = || ClassifierError::LabelCountMismatch {
        scores: scores.len(),
        labels: labels.len(),
    };
    if scores.len() != labels.len() || labels.is_empty() {
        return Err(mismatch());
    }
    let index = argmax(scores)
        .ok_or_else(|| ClassifierError::Inference("model produced no comparable scores".into()))?;
    let label = labels.get(index).ok_or_else(mismatch)?;
    Ok((index, label))
}
