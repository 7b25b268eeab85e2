use emotion_classifier::{argmax, decode, decode_prediction, ClassifierError, LabelTable};

fn labels(names: &[&str]) -> LabelTable {
    LabelTable::from_labels(names.iter().copied())
}

#[test]
fn test_highest_score_wins() {
    let labels = labels(&["joy", "sadness", "anger"]);
    assert_eq!(decode(&[0.1, 0.9, 0.05], &labels).unwrap(), "sadness");
}

#[test]
fn test_ties_go_to_first_index() {
    let labels = labels(&["a", "b"]);
    assert_eq!(decode(&[0.5, 0.5], &labels).unwrap(), "a");
    assert_eq!(argmax(&[0.2, 0.7, 0.7, 0.1]), Some(1));
}

#[test]
fn test_length_mismatch_never_guesses() {
    let table = labels(&["joy", "sadness"]);
    let result = decode(&[0.1, 0.2, 0.7], &table);
    match result {
        Err(ClassifierError::LabelCountMismatch { scores, labels }) => {
            assert_eq!(scores, 3);
            assert_eq!(labels, 2);
        }
        other => panic!("expected a label count mismatch, got {:?}", other),
    }
}

#[test]
fn test_empty_labels_is_a_mismatch() {
    let empty = LabelTable::default();
    assert!(matches!(
        decode(&[], &empty),
        Err(ClassifierError::LabelCountMismatch { scores: 0, labels: 0 })
    ));
    assert!(matches!(
        decode(&[1.0], &empty),
        Err(ClassifierError::LabelCountMismatch { scores: 1, labels: 0 })
    ));
}

#[test]
fn test_nan_scores_are_ignored() {
    let labels = labels(&["joy", "sadness", "anger"]);
    assert_eq!(decode(&[f32::NAN, 0.2, 0.1], &labels).unwrap(), "sadness");
    assert!(matches!(
        decode(&[f32::NAN, f32::NAN, f32::NAN], &labels),
        Err(ClassifierError::Inference(_))
    ));
}

#[test]
fn test_negative_scores() {
    let labels = labels(&["low", "high"]);
    assert_eq!(decode(&[-3.0, -1.5], &labels).unwrap(), "high");
}

#[test]
fn test_prediction_carries_scores() {
    let labels = labels(&["joy", "sadness", "anger"]);
    let prediction = decode_prediction(&[0.2, 0.1, 0.7], &labels).unwrap();
    assert_eq!(prediction.label, "anger");
    assert_eq!(prediction.index, 2);
    assert_eq!(prediction.score, 0.7);
    assert_eq!(prediction.scores, vec![0.2, 0.1, 0.7]);

    let ranked = prediction.ranked(&labels);
    let order: Vec<&str> = ranked.iter().map(|(label, _)| *label).collect();
    assert_eq!(order, vec!["anger", "joy", "sadness"]);
}
