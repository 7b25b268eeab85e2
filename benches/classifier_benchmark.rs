use criterion::{black_box, criterion_group, criterion_main, Criterion};
use emotion_classifier::{
    decode, Classifier, ClassifierError, FeatureVector, LabelTable, ScoreVector, ScoringModel,
    TextEncoder, VocabularyTable,
};
use std::sync::Arc;

const SHORT_TEXT: &str = "i feel so happy today";
const MEDIUM_TEXT: &str = "i have been feeling a little down since the weekend, nothing seems to \
     go right and i keep thinking about what happened at work on friday afternoon";
const LONG_TEXT: &str = "This is a much longer text that contains multiple paragraphs and should \
     take significantly more time to process. It includes various words, \
     punctuation marks, and different types of sentences.\n\n\
     The second paragraph adds more content and complexity to the text, \
     making it a good test case for encoding performance with longer \
     documents, well past the point where the token sequence is truncated.\n\n\
     Finally, this last paragraph helps us understand how the encoder scales \
     with input size and whether it maintains good performance even with \
     substantial amounts of text that might be encountered in real-world scenarios.";

/// Stand-in scorer so the pipeline can be measured without a model file.
struct UniformModel(usize);

impl ScoringModel for UniformModel {
    fn score(&self, features: &FeatureVector) -> Result<ScoreVector, ClassifierError> {
        let seed = features.sum();
        Ok((0..self.0).map(|i| ((seed + i as f32) % 7.0) / 7.0).collect())
    }
}

fn bench_vocabulary() -> Arc<VocabularyTable> {
    let words = LONG_TEXT
        .split_whitespace()
        .chain(MEDIUM_TEXT.split_whitespace())
        .map(emotion_classifier::classifier::encoder::normalize_token)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>();
    let pairs = words.iter().enumerate().map(|(i, w)| (w.as_str(), i as u32 + 1));
    Arc::new(VocabularyTable::from_pairs(pairs))
}

fn bench_encoding(c: &mut Criterion) {
    let encoder = TextEncoder::new(bench_vocabulary(), 100).unwrap();
    let mut group = c.benchmark_group("Encoding");

    // Configure sampling
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| encoder.encode(black_box(SHORT_TEXT))));
    group.bench_function("medium_text", |b| b.iter(|| encoder.encode(black_box(MEDIUM_TEXT))));
    group.bench_function("long_text", |b| b.iter(|| encoder.encode(black_box(LONG_TEXT))));

    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("Decoding");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    // Scaling with number of classes
    for &count in &[4usize, 16, 64, 256] {
        let labels = LabelTable::from_labels((0..count).map(|i| format!("class_{}", i)));
        let scores: Vec<f32> = (0..count).map(|i| (i * 37 % count) as f32).collect();

        group.bench_function(format!("classes_{}", count), |b| {
            b.iter(|| decode(black_box(&scores), &labels).unwrap().len())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let classifier = Classifier::builder()
        .with_vocabulary(bench_vocabulary())
        .with_labels(LabelTable::from_labels(["sadness", "joy", "love", "anger", "fear", "surprise"]))
        .with_scoring_model(UniformModel(6))
        .build()
        .unwrap();

    group.bench_function("predict_short", |b| b.iter(|| classifier.predict(black_box(SHORT_TEXT))));
    group.bench_function("predict_long", |b| b.iter(|| classifier.predict(black_box(LONG_TEXT))));

    group.finish();
}

criterion_group!(benches, bench_encoding, bench_decoding, bench_prediction);
criterion_main!(benches);
