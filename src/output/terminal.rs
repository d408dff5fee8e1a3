//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::analysis::DecompositionPlan;
use crate::result::{Decomposition, MeasureSummary};

/// Format a Decomposition summary for human-readable terminal output.
pub fn format_summary(result: &Decomposition) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let meta = &result.metadata;

    output.push_str("fairness-cookbook\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  Plan: {}\n", format_plan(meta.plan)));
    output.push_str(&format!(
        "  Replicates: {}/{} outer, {} inner each (seed {})\n",
        meta.successful_replicates, meta.nboot1, meta.nboot2, meta.seed
    ));
    if !result.failures.is_empty() {
        output.push_str(&format!(
            "  {}\n",
            format!("\u{26A0} {} replicate(s) skipped", result.failures.len())
                .yellow()
                .bold()
        ));
        for failure in &result.failures {
            output.push_str(&format!("    rep {}: {}\n", failure.rep, failure.error));
        }
    }
    output.push('\n');

    output.push_str(&format!("    {:<10} {:>10} {:>10}\n", "measure", "mean", "std"));
    for summary in &result.summary {
        output.push_str(&format_row(summary));
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!("Runtime: {:.2}s\n", meta.runtime_secs));

    output
}

fn format_row(summary: &MeasureSummary) -> String {
    let row = format!(
        "{:<10} {:>10} {:>10}",
        summary.measure.name(),
        format_value(summary.mean),
        format_value(summary.std)
    );
    if summary.is_placeholder() {
        let note = if summary.mean.is_nan() {
            "not identified"
        } else {
            "no path"
        };
        format!("    {}  {}\n", row.dimmed(), format!("({})", note).dimmed())
    } else if summary.estimated_replicates == 0 && summary.aliased_replicates > 0 {
        format!("    {}  {}\n", row, "(coincides)".cyan())
    } else {
        format!("    {}\n", row)
    }
}

fn format_value(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.4}", x)
    }
}

/// Format DecompositionPlan for display.
fn format_plan(plan: DecompositionPlan) -> &'static str {
    match plan {
        DecompositionPlan::Raw => "no mediators, no confounders",
        DecompositionPlan::MediatorOnly => "mediators only",
        DecompositionPlan::ConfounderOnly => "confounders only",
        DecompositionPlan::Full => "mediators and confounders",
    }
}
