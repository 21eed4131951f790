// Human-readable text rendering; the JSON contract is the Estimate itself

use crate::diff::EstimateDiff;
use crate::model::{Confidence, Estimate, MatchType};
use colored::*;

fn confidence_label(confidence: Confidence) -> ColoredString {
    match confidence {
        Confidence::High => "HIGH".green(),
        Confidence::Medium => "MEDIUM".yellow(),
        Confidence::Low => "LOW".red(),
    }
}

fn match_label(match_type: MatchType) -> &'static str {
    match match_type {
        MatchType::Exact => "EXACT",
        MatchType::Fallback => "FALLBACK",
        MatchType::Heuristic => "HEURISTIC",
    }
}

/// Render the presentational text report. Contracts live in the JSON
/// serialization, not here.
pub fn render_estimate(estimate: &Estimate) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Cost Estimate".bold()));
    out.push_str(&format!(
        "Total monthly cost: {} {} ({}, confidence {})\n",
        format!("${:.4}", estimate.total_cost).green().bold(),
        estimate.currency,
        estimate.evaluation_mode,
        confidence_label(estimate.confidence),
    ));
    out.push_str(&format!("Catalog version:    {}\n", display_or_dash(&estimate.catalog_version)));
    out.push_str(&format!("Input fingerprint:  {}\n", estimate.input_fingerprint));
    out.push_str(&format!("Estimate id:        {}\n", estimate.id));

    if !estimate.service_breakdown.is_empty() {
        out.push_str(&format!("\n{}\n", "By service".bold()));
        for (service, total) in &estimate.service_breakdown {
            out.push_str(&format!("  {service:<24} ${total:.4}\n"));
        }
    }

    if !estimate.cost_items.is_empty() {
        out.push_str(&format!("\n{}\n", "Line items".bold()));
        for item in &estimate.cost_items {
            out.push_str(&format!(
                "  {} {} [{}/{}]\n      {}\n",
                item.resource_address.cyan(),
                item.usage_type,
                match_label(item.match_type),
                confidence_label(item.confidence),
                item.formula,
            ));
        }
    }

    if !estimate.assumptions.is_empty() {
        out.push_str(&format!("\n{}\n", "Assumptions".bold()));
        for assumption in &estimate.assumptions {
            out.push_str(&format!(
                "  - {} {}: {}\n",
                assumption.resource_address, assumption.field, assumption.message
            ));
        }
    }

    out
}

pub fn render_diff(diff: &EstimateDiff) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Cost Diff".bold()));

    let delta = format!("${:+.4}", diff.delta);
    let delta = if diff.delta > 0.0 {
        delta.red()
    } else if diff.delta < 0.0 {
        delta.green()
    } else {
        delta.normal()
    };
    out.push_str(&format!(
        "Before ${:.4}  After ${:.4}  Delta {} ({:+.1}%)\n",
        diff.before_total, diff.after_total, delta, diff.percent
    ));

    if !diff.resource_changes.is_empty() {
        out.push_str(&format!("\n{}\n", "Resources".bold()));
        for change in &diff.resource_changes {
            out.push_str(&format!(
                "  {:<10} {} ${:.4} -> ${:.4} ({:+.4})\n",
                format!("{:?}", change.change_type).to_lowercase(),
                change.address,
                change.cost_before,
                change.cost_after,
                change.delta
            ));
        }
    }

    if !diff.service_changes.is_empty() {
        out.push_str(&format!("\n{}\n", "Services".bold()));
        for change in &diff.service_changes {
            out.push_str(&format!(
                "  {:<24} ${:.4} -> ${:.4} ({:+.4})\n",
                change.service, change.cost_before, change.cost_after, change.delta
            ));
        }
    }

    out
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
