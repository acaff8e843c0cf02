use {
    anyhow::{Context, Result, bail},
    classifier::{Classifier, ClassifierConfig, Prediction},
    std::path::{Path, PathBuf},
};

const LOG_DIR_ENV: &str = "CLASSIFIER_LOG_DIR";

/// The boundary decision: only the `food` class counts as food.
fn decision(prediction: &Prediction) -> &'static str {
    if prediction.label == "food" { "food" } else { "not_food" }
}

fn format_list<T: Into<f64> + Copy>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(|&v| format!("{:.4}", v.into())).collect();
    format!("[{}]", items.join(", "))
}

async fn classify_file(classifier: &Classifier, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let prediction = classifier.predict_from_buffer(&bytes).await?;
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    log::info!(
        "{} -> model:{} -> result:{} top_prob:{:.4} probs:{} logits:{}",
        name,
        prediction.label.to_uppercase(),
        decision(&prediction),
        prediction.top_probability(),
        format_list(&prediction.probs),
        format_list(&prediction.scores)
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => base::init_file_logger(PathBuf::from(dir)).context("failed to open log directory")?,
        None => base::init_stdout_logger(),
    }

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("usage: classify <image>...");
    }

    let classifier = Classifier::new(ClassifierConfig::from_env());
    log::info!(
        "model {}, labels {}",
        classifier.model_path().display(),
        classifier.labels_path().display()
    );
    if let Err(e) = classifier.warmup().await {
        log::warn!("warmup failed, will try again on the first image: {}", e);
    }

    let mut classified = 0;
    for path in &paths {
        if !path.is_file() {
            log::warn!("skipping {}: no such file", path.display());
            continue;
        }
        match classify_file(&classifier, path).await {
            Ok(()) => classified += 1,
            Err(e) => log::error!("{}: {:#}", path.display(), e),
        }
    }
    log::info!("classified {} of {} files", classified, paths.len());
    Ok(())
}
