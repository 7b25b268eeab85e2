use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use anyhow::Context;
use clap::Parser;
use log::info;

use emotion_classifier::{
    ArtifactBundle, ArtifactStore, Classifier, ClassifierConfig, DisplayState, OovPolicy,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Texts to classify; lines from stdin are classified when none are given
    text: Vec<String>,

    /// Directory holding model.onnx, word_index.txt and labels.txt
    #[arg(long, env = "EMOTION_CLASSIFIER_HOME")]
    base_dir: Option<PathBuf>,

    /// JSON config file; command-line options override its values
    #[arg(short, long, env = "EMOTION_CLASSIFIER_CONFIG")]
    config: Option<PathBuf>,

    /// Bundle manifest naming cached artifacts to use
    #[arg(long, env = "EMOTION_CLASSIFIER_BUNDLE")]
    bundle: Option<PathBuf>,

    /// Download the bundle's artifacts if they are missing or corrupt
    #[arg(long, requires = "bundle")]
    fetch: bool,

    /// Remove cached bundle artifacts before fetching
    #[arg(long, requires = "fetch")]
    fresh: bool,

    #[arg(long, env = "EMOTION_CLASSIFIER_MODEL")]
    model: Option<PathBuf>,

    #[arg(long, env = "EMOTION_CLASSIFIER_VOCAB")]
    vocab: Option<PathBuf>,

    #[arg(long, env = "EMOTION_CLASSIFIER_LABELS")]
    labels: Option<PathBuf>,

    /// Fixed number of token positions fed to the model
    #[arg(long, env = "EMOTION_CLASSIFIER_MAX_LEN")]
    max_len: Option<usize>,

    #[arg(long, env = "EMOTION_CLASSIFIER_INPUT_NAME")]
    input_name: Option<String>,

    #[arg(long, env = "EMOTION_CLASSIFIER_OUTPUT_NAME")]
    output_name: Option<String>,

    /// Index for out-of-vocabulary tokens (default: same as padding, 0)
    #[arg(long, conflicts_with = "oov_token")]
    oov_index: Option<u32>,

    /// Vocabulary entry whose index is used for out-of-vocabulary tokens
    #[arg(long)]
    oov_token: Option<String>,

    /// Upper bound on one model call, in milliseconds
    #[arg(long, env = "EMOTION_CLASSIFIER_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Print every class score, highest first
    #[arg(long)]
    scores: bool,
}

async fn resolve_config(args: &Args) -> anyhow::Result<ClassifierConfig> {
    let mut config = match (&args.config, &args.bundle, &args.base_dir) {
        (Some(path), _, _) => ClassifierConfig::from_json_file(path)?,
        (None, Some(manifest), _) => {
            let bundle = ArtifactBundle::from_json_file(manifest)
                .with_context(|| format!("reading bundle manifest {}", manifest.display()))?;
            let store = ArtifactStore::new_default()?;
            if args.fresh {
                info!("Fresh download requested - removing any existing artifacts...");
                store.remove(&bundle)?;
            }
            if args.fetch {
                store.ensure(&bundle).await?;
            }
            store.require(&bundle)?
        }
        (None, None, Some(dir)) => ClassifierConfig::from_base_dir(dir),
        (None, None, None) => ClassifierConfig::default(),
    };

    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(vocab) = &args.vocab {
        config.vocabulary_path = vocab.clone();
    }
    if let Some(labels) = &args.labels {
        config.labels_path = labels.clone();
    }
    if let Some(max_len) = args.max_len {
        config.max_len = max_len;
    }
    if args.input_name.is_some() {
        config.input_name = args.input_name.clone();
    }
    if args.output_name.is_some() {
        config.output_name = args.output_name.clone();
    }
    if let Some(index) = args.oov_index {
        config.oov_policy = OovPolicy::Reserved(index);
    }
    if let Some(token) = &args.oov_token {
        config.oov_policy = OovPolicy::Token(token.clone());
    }
    if args.timeout_ms.is_some() {
        config.inference_timeout_ms = args.timeout_ms;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_time = Instant::now();
    let config = resolve_config(&args).await?;
    info!("Building classifier from {:?}", config);
    let classifier = Classifier::from_config(&config)?;
    info!("Classifier ready (took {:.2?})", start_time.elapsed());

    let timeout = classifier.inference_timeout();

    if !args.text.is_empty() {
        for text in &args.text {
            process_input(&classifier, text, timeout, args.scores).await;
        }
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        process_input(&classifier, &line, timeout, args.scores).await;
    }
    Ok(())
}

async fn process_input(classifier: &Classifier, text: &str, timeout: Option<Duration>, show_scores: bool) {
    info!("Processing: {}", text);
    let started = Instant::now();

    let result = match timeout {
        Some(limit) => classifier.classify_with_timeout(text, limit).await,
        None => classifier.classify(text),
    };

    match result {
        Ok(prediction) => {
            let state = DisplayState::from_prediction(&prediction.label);
            println!("{} [{}]", DisplayState::message(&prediction.label), state);
            if show_scores {
                for (label, score) in prediction.ranked(classifier.labels()) {
                    println!("    {}: {:.1}%", label, score * 100.0);
                }
            }
        }
        Err(e) => {
            log::error!("Prediction failed [{}]: {}", e.kind(), e);
            println!("{}", DisplayState::message(emotion_classifier::ERROR_SENTINEL));
        }
    }
    info!("Classified in {:.2?}", started.elapsed());
}
