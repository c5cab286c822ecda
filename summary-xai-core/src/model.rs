//! Surrogate relevance model: TF-IDF cosine similarity as a two-class classifier.
//!
//! The explainers only see the [`TextClassifier`] and [`TextScorer`] traits, so
//! any text model can be explained the same way.

use crate::error::Result;
use crate::vectorizer::{SparseVector, TfidfVectorizer, VectorizerConfig, cosine_similarity};

/// Class labels produced by [`BulletAttributionModel`].
pub const CLASS_NAMES: [&str; 2] = ["not_related", "related"];

/// Index of the `related` class.
pub const RELATED: usize = 1;

/// Trait for models mapping texts to a probability distribution over classes.
pub trait TextClassifier {
    /// Class labels, in column order.
    fn class_names(&self) -> &[&str];

    /// One probability row per input text, input order preserved.
    fn predict_proba(&self, texts: &[String]) -> Vec<Vec<f64>>;
}

/// Trait for models mapping texts to a single real-valued output.
pub trait TextScorer {
    fn score(&self, texts: &[String]) -> Vec<f64>;
}

/// Exposes one probability column of a classifier as a scalar scorer.
pub struct ClassProbability<'a, C: TextClassifier + ?Sized> {
    classifier: &'a C,
    label: usize,
}

impl<'a, C: TextClassifier + ?Sized> ClassProbability<'a, C> {
    pub fn new(classifier: &'a C, label: usize) -> Self {
        Self { classifier, label }
    }
}

impl<C: TextClassifier + ?Sized> TextScorer for ClassProbability<'_, C> {
    fn score(&self, texts: &[String]) -> Vec<f64> {
        self.classifier
            .predict_proba(texts)
            .into_iter()
            .map(|row| row.get(self.label).copied().unwrap_or(0.0))
            .collect()
    }
}

/// Relevance of arbitrary text to one summary bullet.
///
/// The vectorizer is fitted on exactly `{article, bullet}`, so the model is
/// only meaningful for that pair and is rebuilt for every bullet.
#[derive(Debug, Clone)]
pub struct BulletAttributionModel {
    vectorizer: TfidfVectorizer,
    bullet_vector: SparseVector,
}

impl BulletAttributionModel {
    pub fn new(article: &str, bullet: &str) -> Result<Self> {
        let vectorizer = TfidfVectorizer::fit(VectorizerConfig::default(), &[article, bullet])?;
        let bullet_vector = vectorizer.transform(bullet);
        tracing::debug!(
            vocabulary = vectorizer.vocabulary_len(),
            bullet_terms = bullet_vector.entries().len(),
            "Built bullet attribution model"
        );
        Ok(Self {
            vectorizer,
            bullet_vector,
        })
    }

    /// Probability that `text` supports the bullet.
    pub fn relevance(&self, text: &str) -> f64 {
        let similarity = cosine_similarity(&self.vectorizer.transform(text), &self.bullet_vector);
        (0.5 * (similarity + 1.0)).clamp(0.0, 1.0)
    }
}

impl TextClassifier for BulletAttributionModel {
    fn class_names(&self) -> &[&str] {
        &CLASS_NAMES
    }

    fn predict_proba(&self, texts: &[String]) -> Vec<Vec<f64>> {
        texts
            .iter()
            .map(|text| {
                let p = self.relevance(text);
                vec![1.0 - p, p]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = "The city council approved a new budget for parks.";
    const BULLET: &str = "The council approved a parks budget.";

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_predict_proba_shape_and_rows() {
        let model = BulletAttributionModel::new(ARTICLE, BULLET).unwrap();
        let rows = model.predict_proba(&texts(&[ARTICLE, "", "parks", "weather report"]));
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.len(), 2);
            assert!((row[0] + row[1] - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_bullet_self_similarity_is_maximal() {
        let model = BulletAttributionModel::new(ARTICLE, BULLET).unwrap();
        let rows = model.predict_proba(&texts(&[BULLET]));
        assert!((rows[0][RELATED] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_text_is_half() {
        let model = BulletAttributionModel::new(ARTICLE, BULLET).unwrap();
        assert!((model.relevance("") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_removing_shared_term_lowers_relevance() {
        let model = BulletAttributionModel::new(ARTICLE, BULLET).unwrap();
        let full = model.relevance(ARTICLE);
        let without = model.relevance("The city approved a new budget for parks.");
        assert!(without < full);
    }

    #[test]
    fn test_no_shared_vocabulary_is_not_an_error() {
        let model = BulletAttributionModel::new("Rain expected tomorrow.", "Stocks rallied.").unwrap();
        assert!((model.relevance("Rain expected tomorrow.") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_class_probability_scorer() {
        let model = BulletAttributionModel::new(ARTICLE, BULLET).unwrap();
        let scorer = ClassProbability::new(&model, RELATED);
        let scores = scorer.score(&texts(&[BULLET, ""]));
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
        assert_eq!(model.class_names(), &CLASS_NAMES);
    }
}
