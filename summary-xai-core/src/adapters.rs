//! Glue between the bullet attribution model and the generic explainers.

use crate::config::{LimeConfig, ShapConfig};
use crate::error::Result;
use crate::explainers::{LimeTextExplainer, PartitionExplainer, TextMasker};
use crate::model::{BulletAttributionModel, ClassProbability, RELATED};

/// Top-`top_k` LIME `(token, weight)` pairs for the `related` class, in the
/// explainer's ranking (largest absolute coefficient first).
pub fn run_lime(
    model: &BulletAttributionModel,
    article: &str,
    top_k: usize,
    config: &LimeConfig,
) -> Result<Vec<(String, f64)>> {
    let explainer = LimeTextExplainer::new(config);
    let explanation = explainer.explain_instance(article, model, RELATED, top_k)?;
    Ok(explanation.as_list().iter().take(top_k).cloned().collect())
}

/// Top-`top_k` SHAP `(token, weight)` pairs for the `related` probability,
/// blank tokens dropped, sorted by descending absolute weight.
pub fn run_shap(
    model: &BulletAttributionModel,
    article: &str,
    top_k: usize,
    config: &ShapConfig,
) -> Result<Vec<(String, f64)>> {
    let explainer = PartitionExplainer::new(TextMasker::default(), config.batch_size);
    let scorer = ClassProbability::new(model, RELATED);
    let explanation = explainer.explain(article, &scorer, config.max_evals)?;

    let mut pairs: Vec<(String, f64)> = explanation
        .tokens
        .iter()
        .zip(&explanation.values)
        .filter_map(|(token, &value)| {
            let token = token.trim();
            (!token.is_empty()).then(|| (token.to_string(), value))
        })
        .collect();
    // Stable sort keeps text order among equal magnitudes.
    pairs.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pairs.truncate(top_k);
    Ok(pairs)
}
