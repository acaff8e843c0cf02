use {crate::labels::ClassNames, serde::Serialize};

/// Softmax with the maximum subtracted before exponentiating.
///
/// Runs in f64. An empty input yields an empty output.
pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .map(|&v| v as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; the first one wins ties.
pub fn argmax<T: PartialOrd + Copy>(values: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if !(value > current) => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Class name for `index`, or the index itself when there is none.
pub fn label_for(names: &ClassNames, index: usize) -> String {
    names
        .get(index)
        .map(str::to_string)
        .unwrap_or_else(|| index.to_string())
}

/// Outcome of classifying one image.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub label: String,
    /// Raw logits of the first output.
    pub scores: Vec<f32>,
    /// Softmax of `scores`.
    pub probs: Vec<f64>,
    pub top_index: usize,
}

impl Prediction {
    /// `None` for empty logits.
    pub fn from_logits(logits: Vec<f32>, names: &ClassNames) -> Option<Self> {
        let probs = softmax(&logits);
        let top_index = argmax(&probs)?;
        Some(Self {
            label: label_for(names, top_index),
            scores: logits,
            probs,
            top_index,
        })
    }

    pub fn top_probability(&self) -> f64 {
        self.probs.get(self.top_index).copied().unwrap_or(0.0)
    }
}
