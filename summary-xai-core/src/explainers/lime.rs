//! LIME for text: bag-of-words perturbations and a locally weighted linear surrogate.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::ridge::{RidgeFit, fit_weighted_ridge};
use crate::config::{FeatureSelection, LimeConfig};
use crate::error::{Result, XaiError};
use crate::model::TextClassifier;

/// Auto selection switches to highest weights above this many features.
const FORWARD_SELECTION_MAX: usize = 6;

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\W+").expect("static separator pattern is valid"))
}

/// A text split into words and separators, with each distinct word as a feature.
#[derive(Debug, Clone)]
pub struct IndexedText {
    pieces: Vec<String>,
    /// Distinct words, in order of first appearance.
    vocabulary: Vec<String>,
    /// For each distinct word, the piece positions where it occurs.
    positions: Vec<Vec<usize>>,
}

impl IndexedText {
    pub fn new(text: &str) -> Self {
        let mut pieces = Vec::new();
        let mut is_word = Vec::new();
        let mut last = 0;
        for m in separator_pattern().find_iter(text) {
            if m.start() > last {
                pieces.push(text[last..m.start()].to_string());
                is_word.push(true);
            }
            pieces.push(m.as_str().to_string());
            is_word.push(false);
            last = m.end();
        }
        if last < text.len() {
            pieces.push(text[last..].to_string());
            is_word.push(true);
        }

        let mut vocabulary: Vec<String> = Vec::new();
        let mut positions: Vec<Vec<usize>> = Vec::new();
        let mut lookup: HashMap<&str, usize> = HashMap::new();
        for (i, piece) in pieces.iter().enumerate() {
            if !is_word[i] {
                continue;
            }
            match lookup.get(piece.as_str()) {
                Some(&feature) => positions[feature].push(i),
                None => {
                    lookup.insert(piece.as_str(), vocabulary.len());
                    vocabulary.push(piece.clone());
                    positions.push(vec![i]);
                }
            }
        }

        Self {
            pieces,
            vocabulary,
            positions,
        }
    }

    pub fn num_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn word(&self, feature: usize) -> &str {
        &self.vocabulary[feature]
    }

    /// Rebuild the text with every occurrence of the given features removed.
    pub fn without(&self, removed: &[usize]) -> String {
        let mut drop = vec![false; self.pieces.len()];
        for &feature in removed {
            for &pos in &self.positions[feature] {
                drop[pos] = true;
            }
        }
        self.pieces
            .iter()
            .zip(drop)
            .filter(|(_, d)| !d)
            .map(|(p, _)| p.as_str())
            .collect()
    }
}

/// Result of explaining one text for one label.
#[derive(Debug, Clone)]
pub struct LimeExplanation {
    pub label: usize,
    /// `(word, weight)` ranked by absolute weight, largest first.
    pub weights: Vec<(String, f64)>,
    pub intercept: f64,
    /// Weighted R² of the surrogate on the perturbation samples.
    pub score: f64,
    /// Surrogate prediction for the unperturbed text.
    pub local_prediction: f64,
}

impl LimeExplanation {
    pub fn as_list(&self) -> &[(String, f64)] {
        &self.weights
    }
}

/// Local linear explainer for text classifiers.
#[derive(Debug, Clone)]
pub struct LimeTextExplainer {
    kernel_width: f64,
    num_samples: usize,
    feature_selection: FeatureSelection,
    seed: u64,
}

impl LimeTextExplainer {
    pub fn new(config: &LimeConfig) -> Self {
        Self {
            kernel_width: config.kernel_width,
            num_samples: config.num_samples,
            feature_selection: config.feature_selection,
            seed: config.seed,
        }
    }

    /// Explain `classifier`'s probability for `label` on `text` with at most
    /// `num_features` words.
    pub fn explain_instance<C: TextClassifier + ?Sized>(
        &self,
        text: &str,
        classifier: &C,
        label: usize,
        num_features: usize,
    ) -> Result<LimeExplanation> {
        let classes = classifier.class_names();
        if label >= classes.len() {
            return Err(XaiError::explainer(format!(
                "label {} out of range for {} classes",
                label,
                classes.len()
            )));
        }
        let indexed = IndexedText::new(text);
        let d = indexed.num_features();
        if d == 0 {
            return Err(XaiError::explainer("text contains no words to perturb"));
        }
        if self.num_samples < 2 {
            return Err(XaiError::explainer("LIME needs at least 2 samples"));
        }

        let (rows, texts) = self.sample(&indexed);
        let predictions = classifier.predict_proba(&texts);
        let targets: Vec<f64> = predictions
            .iter()
            .map(|row| row.get(label).copied().unwrap_or(0.0))
            .collect();
        let weights: Vec<f64> = rows.iter().map(|r| self.kernel(r, d)).collect();

        let selected = self.select_features(&rows, &targets, &weights, num_features.min(d));
        let fit = fit_weighted_ridge(&rows, &targets, &weights, &selected, 1.0);
        let score = fit.score(&rows, &targets, &weights);
        let local_prediction = fit.predict(&rows[0]);

        let mut ranked: Vec<(String, f64)> = selected
            .iter()
            .zip(&fit.coefficients)
            .map(|(&f, &w)| (indexed.word(f).to_string(), w))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.abs()
                .partial_cmp(&a.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            class = classes[label],
            features = d,
            samples = rows.len(),
            selected = selected.len(),
            score,
            "LIME explanation fitted"
        );
        Ok(LimeExplanation {
            label,
            weights: ranked,
            intercept: fit.intercept,
            score,
            local_prediction,
        })
    }

    /// Binary presence rows and their texts; row 0 is the unperturbed text.
    fn sample(&self, indexed: &IndexedText) -> (Vec<Vec<f64>>, Vec<String>) {
        let d = indexed.num_features();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut rows = Vec::with_capacity(self.num_samples);
        let mut texts = Vec::with_capacity(self.num_samples);
        rows.push(vec![1.0; d]);
        texts.push(indexed.without(&[]));
        for _ in 1..self.num_samples {
            let remove = rng.gen_range(1..=d);
            let removed = index::sample(&mut rng, d, remove).into_vec();
            let mut row = vec![1.0; d];
            for &f in &removed {
                row[f] = 0.0;
            }
            texts.push(indexed.without(&removed));
            rows.push(row);
        }
        (rows, texts)
    }

    /// Exponential kernel over the scaled cosine distance to the all-ones row.
    fn kernel(&self, row: &[f64], d: usize) -> f64 {
        let present: f64 = row.iter().sum();
        let similarity = if present > 0.0 {
            (present / d as f64).sqrt()
        } else {
            0.0
        };
        let distance = (1.0 - similarity) * 100.0;
        (-(distance * distance) / (self.kernel_width * self.kernel_width))
            .exp()
            .sqrt()
    }

    fn select_features(
        &self,
        rows: &[Vec<f64>],
        targets: &[f64],
        weights: &[f64],
        num_features: usize,
    ) -> Vec<usize> {
        let d = rows[0].len();
        match self.feature_selection {
            FeatureSelection::None => (0..d).collect(),
            FeatureSelection::ForwardSelection => forward_selection(rows, targets, weights, num_features),
            FeatureSelection::HighestWeights => highest_weights(rows, targets, weights, num_features),
            FeatureSelection::Auto if num_features <= FORWARD_SELECTION_MAX => {
                forward_selection(rows, targets, weights, num_features)
            }
            FeatureSelection::Auto => highest_weights(rows, targets, weights, num_features),
        }
    }
}

fn highest_weights(rows: &[Vec<f64>], targets: &[f64], weights: &[f64], num_features: usize) -> Vec<usize> {
    let d = rows[0].len();
    let all: Vec<usize> = (0..d).collect();
    let RidgeFit { coefficients, .. } = fit_weighted_ridge(rows, targets, weights, &all, 0.01);
    let mut order: Vec<usize> = all;
    // Row 0 is all ones, so coef * x0 is the coefficient itself.
    order.sort_by(|&a, &b| {
        coefficients[b]
            .abs()
            .partial_cmp(&coefficients[a].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(num_features);
    order
}

fn forward_selection(rows: &[Vec<f64>], targets: &[f64], weights: &[f64], num_features: usize) -> Vec<usize> {
    let d = rows[0].len();
    let mut used: Vec<usize> = Vec::with_capacity(num_features);
    for _ in 0..num_features {
        let mut best: Option<(usize, f64)> = None;
        for feature in (0..d).filter(|f| !used.contains(f)) {
            let mut candidate = used.clone();
            candidate.push(feature);
            let fit = fit_weighted_ridge(rows, targets, weights, &candidate, 0.0);
            let score = fit.score(rows, targets, weights);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((feature, score));
            }
        }
        match best {
            Some((feature, _)) => used.push(feature),
            None => break,
        }
    }
    used
}
