//! # summary-xai-core — explainability for AI-generated summaries
//!
//! For each summary bullet, a TF-IDF cosine-similarity model scoped to the
//! article and that bullet acts as a two-class "related / not related"
//! classifier. LIME and partition SHAP explainers then attribute its output to
//! article tokens, and the results are gathered into a per-bullet report.

pub mod adapters;
pub mod config;
pub mod error;
pub mod explainers;
pub mod model;
pub mod payload;
pub mod report;
pub mod stop_words;
pub mod vectorizer;

pub use config::{FeatureSelection, LimeConfig, ShapConfig, XaiConfig, load_config};
pub use error::{Result, XaiError};
pub use model::{BulletAttributionModel, TextClassifier, TextScorer};
pub use payload::{SummaryPayload, load_payload};
pub use report::{ReportEntry, TokenWeight, build_report, load_report, write_report};
