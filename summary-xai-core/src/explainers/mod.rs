//! Model-agnostic text explainers.
//!
//! Nothing here knows about TF-IDF or summaries: explainers only see the
//! [`TextClassifier`](crate::model::TextClassifier) and
//! [`TextScorer`](crate::model::TextScorer) traits.

pub mod lime;
pub mod ridge;
pub mod shap;

pub use lime::{LimeExplanation, LimeTextExplainer};
pub use shap::{PartitionExplainer, ShapExplanation, TextMasker};
