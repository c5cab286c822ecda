//! Console rendering of explanation reports.

use std::fmt::Write;
use summary_xai_core::{ReportEntry, TokenWeight};

const EMPTY_PLACEHOLDER: &str = "  (no influential tokens found)";

/// Render the human-readable report, one block per bullet.
pub fn render_report(report: &[ReportEntry]) -> String {
    let mut out = String::new();
    for entry in report {
        let _ = writeln!(out, "=== Bullet {} ===", entry.bullet_index);
        let _ = writeln!(out, "{}", entry.bullet_text);
        render_section(&mut out, "LIME top tokens:", &entry.lime);
        render_section(&mut out, "SHAP top tokens:", &entry.shap);
        out.push('\n');
    }
    out
}

fn render_section(out: &mut String, title: &str, items: &[TokenWeight]) {
    let _ = writeln!(out, "{title}");
    if items.is_empty() {
        let _ = writeln!(out, "{EMPTY_PLACEHOLDER}");
        return;
    }
    for item in items {
        let _ = writeln!(out, "  {:>10.4}  {}", item.weight, item.token);
    }
}
