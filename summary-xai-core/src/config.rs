//! Configuration system for summary-xai.
//!
//! Uses `figment` for layered configuration: defaults -> config files -> environment.
//! CLI flags are applied on top by the binary after extraction.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, XaiError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XaiConfig {
    /// LIME explainer settings.
    #[serde(default)]
    pub lime: LimeConfig,
    /// SHAP explainer settings.
    #[serde(default)]
    pub shap: ShapConfig,
}

/// Strategy LIME uses to pick the features that enter the final surrogate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSelection {
    /// Forward selection for small feature counts, highest weights otherwise.
    #[default]
    Auto,
    ForwardSelection,
    HighestWeights,
    None,
}

/// LIME explainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimeConfig {
    /// Number of tokens kept in the report.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Number of perturbed samples, including the unperturbed text.
    #[serde(default = "default_lime_samples")]
    pub num_samples: usize,
    /// Width of the exponential locality kernel.
    #[serde(default = "default_kernel_width")]
    pub kernel_width: f64,
    /// Seed for perturbation sampling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub feature_selection: FeatureSelection,
}

impl Default for LimeConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            num_samples: default_lime_samples(),
            kernel_width: default_kernel_width(),
            seed: default_seed(),
            feature_selection: FeatureSelection::Auto,
        }
    }
}

/// SHAP explainer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapConfig {
    /// Number of tokens kept in the report.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Model evaluation budget per explanation.
    #[serde(default = "default_max_evals")]
    pub max_evals: usize,
    /// Number of masked texts scored per model call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ShapConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_evals: default_max_evals(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_top_k() -> usize {
    8
}

fn default_lime_samples() -> usize {
    5000
}

fn default_kernel_width() -> f64 {
    25.0
}

fn default_seed() -> u64 {
    42
}

fn default_max_evals() -> usize {
    300
}

fn default_batch_size() -> usize {
    10
}

impl XaiConfig {
    /// Reject settings the explainers cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.lime.num_samples < 2 {
            return Err(XaiError::config(format!(
                "lime.num_samples must be at least 2, got {}",
                self.lime.num_samples
            )));
        }
        if self.lime.kernel_width.is_nan() || self.lime.kernel_width <= 0.0 {
            return Err(XaiError::config(format!(
                "lime.kernel_width must be positive, got {}",
                self.lime.kernel_width
            )));
        }
        if self.shap.max_evals < 2 {
            return Err(XaiError::config(format!(
                "shap.max_evals must be at least 2, got {}",
                self.shap.max_evals
            )));
        }
        if self.shap.batch_size == 0 {
            return Err(XaiError::config("shap.batch_size must be at least 1"));
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `SUMMARY_XAI_`, nested with `__`)
/// 2. Explicit config file (`--config`)
/// 3. Workspace-local config (`.summary-xai/config.toml`)
/// 4. User config (`~/.config/summary-xai/config.toml`)
/// 5. Built-in defaults
pub fn load_config(workspace: Option<&Path>, explicit: Option<&Path>) -> Result<XaiConfig> {
    let mut figment = Figment::from(Serialized::defaults(XaiConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "summary-xai", "summary-xai") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".summary-xai").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(XaiError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    // SUMMARY_XAI_SHAP__MAX_EVALS, SUMMARY_XAI_LIME__SEED, etc.
    figment = figment.merge(Env::prefixed("SUMMARY_XAI_").split("__"));

    let config: XaiConfig = figment
        .extract()
        .map_err(|e| XaiError::config(e.to_string()))?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
