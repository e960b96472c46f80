//! Markdown, JSON and console report generation.
//!
//! This module renders the aggregated rankings for people (Markdown and
//! the console summary) and for machines (pretty JSON).

use crate::models::{AggregatedReport, Methodology, RankedLanguage, ReportMeta, SourceMetrics};
use crate::models::{RankingSummary, SourceId};
use anyhow::Result;
use std::collections::BTreeMap;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AggregatedReport, top_n: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.meta.title));
    output.push_str(&format!("{}\n\n", report.meta.description));

    output.push_str(&generate_metadata_section(&report.meta, &report.summary));
    output.push_str(&generate_table_of_contents(top_n));
    output.push_str(&generate_rankings_section(report, top_n));
    output.push_str(&generate_methodology_section(&report.methodology));
    output.push_str(&generate_sources_section(&report.sources));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(meta: &ReportMeta, summary: &RankingSummary) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Generated At:** {}\n", meta.generated_at));
    section.push_str(&format!("- **Version:** {}\n", meta.version));
    section.push_str(&format!("- **Sources Used:** {}\n", summary.sources_used));
    section.push_str(&format!(
        "- **Languages Ranked:** {}\n",
        summary.total_languages
    ));
    if let Some(ref top) = summary.top_language {
        section.push_str(&format!("- **Top Language:** {}\n", top));
    }
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(top_n: usize) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str(&format!("- [Top {} Languages](#top-{}-languages)\n", top_n, top_n));
    toc.push_str("- [Methodology](#methodology)\n");
    toc.push_str("- [Sources](#sources)\n");
    toc.push('\n');

    toc
}

fn source_cell(language: &RankedLanguage, id: SourceId) -> String {
    match language.sources.get(&id) {
        Some(contribution) => match contribution.rank {
            Some(rank) => format!("#{}", rank),
            None => format!("{:.2}%", contribution.score * 100.0),
        },
        None => "-".to_string(),
    }
}

/// Generate the rankings table.
fn generate_rankings_section(report: &AggregatedReport, top_n: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Top {} Languages\n\n", top_n));

    if report.rankings.is_empty() {
        section.push_str("No languages were ranked.\n\n");
        return section;
    }

    let ids: Vec<SourceId> = report.sources.keys().copied().collect();

    section.push_str("| Rank | Language | Score | Confidence |");
    for id in &ids {
        section.push_str(&format!(" {} |", id.display_name()));
    }
    section.push('\n');
    section.push_str("|:---:|:---|:---:|:---:|");
    for _ in &ids {
        section.push_str(":---:|");
    }
    section.push('\n');

    for language in report.rankings.iter().take(top_n) {
        section.push_str(&format!(
            "| {} | {} | {} | {:.0}% |",
            language.rank,
            language.name,
            language.score_percent,
            language.confidence * 100.0
        ));
        for &id in &ids {
            section.push_str(&format!(" {} |", source_cell(language, id)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the methodology section.
fn generate_methodology_section(methodology: &Methodology) -> String {
    let mut section = String::new();

    section.push_str("## Methodology\n\n");
    section.push_str(&methodology.description);
    section.push_str("\n\n");

    section.push_str("| Source | Weight | Normalized | Measures |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");
    for (id, info) in &methodology.weights {
        section.push_str(&format!(
            "| {} | {:.2} | {} | {} |\n",
            id.display_name(),
            info.weight,
            info.normalized_weight,
            info.description
        ));
    }
    section.push_str(&format!(
        "\n*Total weight of loaded sources: {}*\n\n",
        methodology.total_weight
    ));

    section
}

/// Generate the per-source details.
fn generate_sources_section(sources: &BTreeMap<SourceId, SourceMetrics>) -> String {
    let mut section = String::new();

    section.push_str("## Sources\n\n");

    for (id, metrics) in sources {
        section.push_str(&format!("### {}\n\n", id.display_name()));
        section.push_str(&format!("{}\n\n", metrics.description));
        section.push_str(&format!("- **Methodology:** {}\n", metrics.methodology));
        section.push_str(&format!(
            "- **Update Frequency:** {}\n",
            metrics.update_frequency
        ));
        section.push_str(&format!("- **Data Size:** {}\n", metrics.data_size));
        section.push_str(&format!("- **Languages:** {}\n", metrics.language_count));
        if let Some(ref date) = metrics.latest_data_date {
            section.push_str(&format!("- **Latest Data:** {}\n", date));
        }
        if let Some(ref fetched) = metrics.fetched_at {
            section.push_str(&format!("- **Fetched At:** {}\n", fetched));
        }
        if let Some(ref origin) = metrics.data_origin {
            section.push_str(&format!("- **Data Origin:** {}\n", origin));
        }
        section.push('\n');

        if !metrics.strengths.is_empty() {
            section.push_str("**Strengths:**\n\n");
            for strength in &metrics.strengths {
                section.push_str(&format!("- {}\n", strength));
            }
            section.push('\n');
        }
        if !metrics.weaknesses.is_empty() {
            section.push_str("**Weaknesses:**\n\n");
            for weakness in &metrics.weaknesses {
                section.push_str(&format!("- {}\n", weakness));
            }
            section.push('\n');
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by langtops v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AggregatedReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// One console line per language: rank, name, score, confidence and sources.
pub fn format_ranking_line(language: &RankedLanguage) -> String {
    let sources: Vec<&str> = language.sources.keys().map(SourceId::as_str).collect();
    format!(
        "  {:>2}. {:<15} {:>7} (confidence: {:.0}%, sources: {})",
        language.rank,
        language.name,
        language.score_percent,
        language.confidence * 100.0,
        sources.join(", ")
    )
}

/// Plain-text summary printed after aggregation.
pub fn format_console_summary(report: &AggregatedReport, top_n: usize) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    out.push_str(&format!("\n{}\nAGGREGATED PROGRAMMING LANGUAGE RANKINGS\n{}\n", rule, rule));
    out.push_str(&format!("\nSources used: {}\n", report.summary.sources_used));
    out.push_str(&format!(
        "Total languages ranked: {}\n",
        report.summary.total_languages
    ));
    out.push_str(&format!("Generated at: {}\n", report.meta.generated_at));

    out.push_str("\nSource weights:\n");
    for (id, info) in &report.methodology.weights {
        out.push_str(&format!(
            "  {}: {} ({})\n",
            id, info.normalized_weight, info.description
        ));
    }

    out.push_str(&format!("\nTop {} Programming Languages:\n", top_n));
    out.push_str(&format!("{}\n", "-".repeat(60)));
    for language in report.rankings.iter().take(top_n) {
        out.push_str(&format_ranking_line(language));
        out.push('\n');
    }

    out
}
