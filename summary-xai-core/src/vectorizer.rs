//! TF-IDF vectorizer over word unigrams and bigrams.
//!
//! Text is accent-stripped (NFKD decomposition, then every character with a
//! non-zero canonical combining class dropped), lowercased, tokenized into
//! runs of two or more word characters, filtered against the English
//! stop-word list and expanded into n-grams. IDF uses the
//! smoothed form `ln((1 + n) / (1 + df)) + 1` and every row is L2-normalized.

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, XaiError};
use crate::stop_words::is_stop_word;

/// Analyzer settings for [`TfidfVectorizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerConfig {
    pub lowercase: bool,
    pub strip_accents: bool,
    /// Inclusive `(min_n, max_n)` n-gram range.
    pub ngram_range: (usize, usize),
    pub stop_words: bool,
    /// Minimum number of fitted documents a term must appear in.
    pub min_df: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_accents: true,
            ngram_range: (1, 2),
            stop_words: true,
            min_df: 1,
        }
    }
}

/// A sparse vector stored as `(index, value)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    fn from_map(map: HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(usize, f64)> = map.into_iter().filter(|(_, v)| *v != 0.0).collect();
        entries.sort_unstable_by_key(|(i, _)| *i);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ai, av) = self.entries[i];
            let (bj, bv) = other.entries[j];
            match ai.cmp(&bj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += av * bv;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, v) in &mut self.entries {
                *v /= norm;
            }
        }
    }
}

/// Cosine similarity between two sparse vectors; 0.0 when either is zero.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    a.dot(b) / denom
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Two or more word characters, Unicode-aware.
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("static token pattern is valid"))
}

/// A TF-IDF model fitted on a fixed document set.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and IDF weights on `documents`.
    ///
    /// Fails when no term survives analysis and the `min_df` cut.
    pub fn fit(config: VectorizerConfig, documents: &[&str]) -> Result<Self> {
        if config.ngram_range.0 == 0 || config.ngram_range.0 > config.ngram_range.1 {
            return Err(XaiError::vectorizer(format!(
                "invalid n-gram range {:?}",
                config.ngram_range
            )));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let terms: BTreeSet<String> = analyze(&config, doc).into_iter().collect();
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let kept: BTreeSet<&String> = document_frequency
            .iter()
            .filter(|(_, df)| **df >= config.min_df)
            .map(|(term, _)| term)
            .collect();
        if kept.is_empty() {
            return Err(XaiError::vectorizer(
                "empty vocabulary; perhaps the documents only contain stop words",
            ));
        }

        let n_docs = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (index, term) in kept.into_iter().enumerate() {
            let df = document_frequency[term] as f64;
            idf.push(((1.0 + n_docs) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.clone(), index);
        }

        tracing::trace!(terms = vocabulary.len(), docs = documents.len(), "Fitted TF-IDF vocabulary");
        Ok(Self {
            config,
            vocabulary,
            idf,
        })
    }

    /// Project `text` into the fitted space. Out-of-vocabulary terms are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in analyze(&self.config, text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        for (index, value) in counts.iter_mut() {
            *value *= self.idf[*index];
        }
        let mut vector = SparseVector::from_map(counts);
        vector.normalize();
        vector
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

}

/// Turn a document into its n-gram terms.
pub fn analyze(config: &VectorizerConfig, text: &str) -> Vec<String> {
    let mut prepared = if config.strip_accents {
        strip_accents(text)
    } else {
        text.to_string()
    };
    if config.lowercase {
        prepared = prepared.to_lowercase();
    }

    let tokens: Vec<&str> = token_pattern()
        .find_iter(&prepared)
        .map(|m| m.as_str())
        .filter(|t| !(config.stop_words && is_stop_word(t)))
        .collect();

    let (min_n, max_n) = config.ngram_range;
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

fn strip_accents(text: &str) -> String {
    text.nfkd()
        .filter(|&c| unicode_normalization::char::canonical_combining_class(c) == 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_analyze_unigrams_and_bigrams() {
        let terms = analyze(&VectorizerConfig::default(), "The council approved a parks budget.");
        assert_eq!(
            terms,
            vec![
                "council",
                "approved",
                "parks",
                "budget",
                "council approved",
                "approved parks",
                "parks budget"
            ]
        );
    }

    #[test]
    fn test_analyze_strips_accents_and_case() {
        let terms = analyze(&VectorizerConfig::default(), "Café NAÏVE");
        assert_eq!(terms, vec!["cafe", "naive", "cafe naive"]);
    }

    #[test]
    fn test_strip_accents_keeps_spacing_marks() {
        assert_eq!(strip_accents("naïve café"), "naive cafe");
        // Devanagari vowel signs are spacing marks with combining class 0.
        assert_eq!(strip_accents("किताब"), "किताब");
    }

    #[test]
    fn test_analyze_drops_single_char_tokens() {
        let config = VectorizerConfig {
            stop_words: false,
            ngram_range: (1, 1),
            ..Default::default()
        };
        assert_eq!(analyze(&config, "x y zz"), vec!["zz"]);
    }

    #[test]
    fn test_fit_smoothed_idf() {
        let vectorizer = TfidfVectorizer::fit(
            VectorizerConfig::default(),
            &["city council budget", "council budget"],
        )
        .unwrap();
        // Shared terms: ln(3/3) + 1 = 1; article-only terms: ln(3/2) + 1.
        let idf = |term: &str| vectorizer.idf[vectorizer.vocabulary[term]];
        assert!((idf("council") - 1.0).abs() < 1e-12);
        assert!((idf("city") - (1.5f64.ln() + 1.0)).abs() < 1e-12);
        assert!(vectorizer.vocabulary.contains_key("council budget"));
    }

    #[test]
    fn test_fit_empty_vocabulary_fails() {
        let result = TfidfVectorizer::fit(VectorizerConfig::default(), &["the and of", "a"]);
        assert!(matches!(result, Err(XaiError::Vectorizer(_))));
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let vectorizer = TfidfVectorizer::fit(
            VectorizerConfig::default(),
            &["budget for parks and roads", "parks budget"],
        )
        .unwrap();
        let v = vectorizer.transform("parks parks roads");
        assert!((v.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_transform_unknown_text_is_zero() {
        let vectorizer =
            TfidfVectorizer::fit(VectorizerConfig::default(), &["budget parks", "parks"]).unwrap();
        let v = vectorizer.transform("completely unrelated words");
        assert!(v.is_empty());
        assert_eq!(cosine_similarity(&v, &vectorizer.transform("parks")), 0.0);
    }

    #[test]
    fn test_cosine_of_identical_vectors_is_one() {
        let vectorizer = TfidfVectorizer::fit(
            VectorizerConfig::default(),
            &["council approved budget", "budget"],
        )
        .unwrap();
        let a = vectorizer.transform("council approved budget");
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sparse_dot_merges_indices() {
        let a = SparseVector::from_map(HashMap::from([(0, 1.0), (3, 2.0), (5, 1.0)]));
        let b = SparseVector::from_map(HashMap::from([(3, 4.0), (5, -1.0), (7, 9.0)]));
        assert_eq!(a.dot(&b), 7.0);
    }
}
