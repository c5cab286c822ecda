//! Per-bullet explanation report: assembly and JSON persistence.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

use crate::adapters::{run_lime, run_shap};
use crate::config::XaiConfig;
use crate::error::Result;
use crate::model::BulletAttributionModel;
use crate::payload::SummaryPayload;

/// Decimal places kept for serialized weights.
pub const WEIGHT_DECIMALS: i32 = 6;

/// One attributed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenWeight {
    pub token: String,
    pub weight: f64,
}

impl TokenWeight {
    fn rounded(token: String, weight: f64) -> Self {
        Self {
            token,
            weight: round_weight(weight),
        }
    }
}

/// Explanations for a single summary bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// 1-based position of the bullet in the input.
    pub bullet_index: usize,
    pub bullet_text: String,
    pub lime: Vec<TokenWeight>,
    pub shap: Vec<TokenWeight>,
}

pub fn round_weight(weight: f64) -> f64 {
    let factor = 10f64.powi(WEIGHT_DECIMALS);
    let rounded = (weight * factor).round() / factor;
    // Avoid serializing -0.0.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Explain every bullet of `payload` in input order.
///
/// Each bullet gets its own model, fitted on the article and that bullet only.
pub fn build_report(payload: &SummaryPayload, config: &XaiConfig) -> Result<Vec<ReportEntry>> {
    config.validate()?;
    let article = payload.article();
    let mut report = Vec::with_capacity(payload.bullets().len());

    for (idx, bullet) in payload.bullets().iter().enumerate() {
        let bullet_index = idx + 1;
        let started = Instant::now();
        let model = BulletAttributionModel::new(article, bullet)?;
        let lime = run_lime(&model, article, config.lime.top_k, &config.lime)?;
        let shap = run_shap(&model, article, config.shap.top_k, &config.shap)?;
        tracing::info!(
            bullet = bullet_index,
            lime_tokens = lime.len(),
            shap_tokens = shap.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Explained summary bullet"
        );

        report.push(ReportEntry {
            bullet_index,
            bullet_text: bullet.clone(),
            lime: lime
                .into_iter()
                .map(|(t, w)| TokenWeight::rounded(t, w))
                .collect(),
            shap: shap
                .into_iter()
                .map(|(t, w)| TokenWeight::rounded(t, w))
                .collect(),
        });
    }

    Ok(report)
}

/// Write the report as pretty-printed JSON, creating parent directories.
pub fn write_report(path: &Path, report: &[ReportEntry]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), entries = report.len(), "Wrote explanation report");
    Ok(())
}

/// Read a report previously written by [`write_report`].
pub fn load_report(path: &Path) -> Result<Vec<ReportEntry>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_entry() -> ReportEntry {
        ReportEntry {
            bullet_index: 1,
            bullet_text: "The council approved a parks budget.".into(),
            lime: vec![TokenWeight {
                token: "council".into(),
                weight: 0.123457,
            }],
            shap: vec![TokenWeight {
                token: "parks.".into(),
                weight: -0.01,
            }],
        }
    }

    #[test]
    fn test_round_weight() {
        assert_eq!(round_weight(0.1234567), 0.123457);
        assert_eq!(round_weight(-0.0000001), 0.0);
        assert_eq!(round_weight(2.0), 2.0);
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(sample_entry()).unwrap();
        assert_eq!(value["bullet_index"], 1);
        assert_eq!(value["lime"][0]["token"], "council");
        assert_eq!(value["shap"][0]["weight"], -0.01);
    }

    #[test]
    fn test_write_creates_parent_dirs_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("report.json");
        let report = vec![sample_entry()];
        write_report(&path, &report).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert_eq!(load_report(&path).unwrap(), report);
    }

    #[test]
    fn test_build_report_orders_bullets() {
        let payload = SummaryPayload::new(
            "The city council approved a new budget for parks. Residents welcomed the plan.",
            vec![
                "Council approved the parks budget.".into(),
                "Residents welcomed the plan.".into(),
            ],
        )
        .unwrap();
        let mut config = XaiConfig::default();
        config.lime.num_samples = 300;
        let report = build_report(&payload, &config).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].bullet_index, 1);
        assert_eq!(report[1].bullet_index, 2);
        assert_eq!(report[1].bullet_text, "Residents welcomed the plan.");
        for entry in &report {
            assert!(entry.lime.len() <= 8);
            assert!(entry.shap.len() <= 8);
        }
    }

    #[test]
    fn test_build_report_rejects_invalid_config() {
        let payload = SummaryPayload::new("Parks budget.", vec!["Budget.".into()]).unwrap();
        let mut config = XaiConfig::default();
        config.shap.max_evals = 0;
        assert!(build_report(&payload, &config).is_err());
    }
}
