//! Property-based tests for the relevance model, payload normalisation and SHAP.

use proptest::prelude::*;

use summary_xai_core::BulletAttributionModel;
use summary_xai_core::TextClassifier;
use summary_xai_core::explainers::{PartitionExplainer, TextMasker};
use summary_xai_core::model::{ClassProbability, RELATED};
use summary_xai_core::payload::normalize_bullets;

const WORDS: [&str; 12] = [
    "council", "budget", "parks", "city", "approved", "new", "the", "a", "for", "river",
    "school", "funding",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..15).prop_map(|w| w.join(" "))
}

// --- Relevance model properties ---

proptest! {
    #[test]
    fn predict_proba_rows_are_distributions(
        article in sentence(),
        bullet in sentence(),
        texts in prop::collection::vec(sentence(), 0..8),
    ) {
        // Sentences of stop words only cannot be fitted; skip those.
        let Ok(model) = BulletAttributionModel::new(&article, &bullet) else {
            return Ok(());
        };
        let rows = model.predict_proba(&texts);
        prop_assert_eq!(rows.len(), texts.len());
        for row in rows {
            prop_assert_eq!(row.len(), 2);
            prop_assert!((row[0] + row[1] - 1.0).abs() < 1e-9);
            prop_assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn bullet_is_maximally_related_to_itself(article in sentence(), bullet in sentence()) {
        let Ok(model) = BulletAttributionModel::new(&article, &bullet) else {
            return Ok(());
        };
        let rows = model.predict_proba(&[bullet.clone(), article.clone()]);
        prop_assert!(rows[0][RELATED] >= rows[1][RELATED] - 1e-9);
    }
}

// --- Payload normalisation properties ---

proptest! {
    #[test]
    fn normalized_bullets_are_trimmed_and_non_blank(
        lines in prop::collection::vec("[ \\t\\-\\*•]{0,3}[a-z ]{0,10}", 0..10)
    ) {
        let text = lines.join("\n");
        let bullets = normalize_bullets(&serde_json::Value::String(text)).unwrap();
        for bullet in bullets {
            prop_assert!(!bullet.is_empty());
            prop_assert_eq!(bullet.trim(), bullet.as_str());
        }
    }
}

// --- SHAP properties ---

proptest! {
    #[test]
    fn shap_values_sum_to_output_difference(
        article in sentence(),
        bullet in sentence(),
        max_evals in 2usize..80,
    ) {
        let Ok(model) = BulletAttributionModel::new(&article, &bullet) else {
            return Ok(());
        };
        let scorer = ClassProbability::new(&model, RELATED);
        let explainer = PartitionExplainer::new(TextMasker::default(), 10);
        let exp = explainer.explain(&article, &scorer, max_evals).unwrap();
        let total: f64 = exp.values.iter().sum();
        prop_assert!((total - (exp.output_value - exp.base_value)).abs() < 1e-9);
        prop_assert!(exp.evaluations <= max_evals);
        prop_assert_eq!(exp.tokens.concat(), article);
    }
}
