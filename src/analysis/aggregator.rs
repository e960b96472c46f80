//! Weighted multi-source aggregation.
//!
//! Every source contributes each language's score multiplied by the source
//! weight. A language's composite score is the weighted average over the
//! sources that mention it, and its confidence is the fraction of loaded
//! sources that do.

use super::normalize::normalize_language_name;
use crate::models::{
    AggregatedReport, Methodology, RankedLanguage, RankingEntry, RankingSummary, ReportMeta,
    SourceContribution, SourceDocument, SourceId, SourceMetrics, WeightInfo,
};
use crate::sources::WeightTable;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Languages scoring at or below this are dropped as noise.
pub const MIN_SCORE: f64 = 0.001;

/// Version stamped into the report header.
pub const REPORT_VERSION: &str = "1.0.0";

/// Errors raised by the aggregator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregateError {
    #[error("No source data found. Run the fetch command first.")]
    EmptyInput,

    #[error("No weight configured for source '{0}'")]
    MissingWeight(SourceId),

    #[error("Weight for source '{id}' must be a positive finite number, got {weight}")]
    InvalidWeight { id: SourceId, weight: f64 },
}

/// Running totals for one canonical language name.
#[derive(Debug, Clone)]
struct LanguageScore {
    name: String,
    total_weighted_score: f64,
    total_weight: f64,
    sources: BTreeMap<SourceId, SourceContribution>,
}

impl LanguageScore {
    fn new(name: String) -> Self {
        Self {
            name,
            total_weighted_score: 0.0,
            total_weight: 0.0,
            sources: BTreeMap::new(),
        }
    }

    fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn final_score(&self) -> f64 {
        if self.total_weight > 0.0 {
            self.total_weighted_score / self.total_weight
        } else {
            0.0
        }
    }
}

/// Extract the single score used for an entry.
///
/// The first usable field wins: `share`, then `normalizedScore`, then
/// `usage / 100`. Entries without any of them score zero.
pub fn extract_score(entry: &RankingEntry) -> f64 {
    let finite = |v: &f64| v.is_finite();

    entry
        .share
        .filter(finite)
        .or_else(|| entry.normalized_score.filter(finite))
        .or_else(|| entry.usage.filter(finite).map(|u| u / 100.0))
        .unwrap_or(0.0)
}

/// Format a 0-1 fraction as a percentage string, e.g. `0.4215` → `"42.15%"`.
///
/// Exact midpoints round away from zero, so `0.00125` is `"0.13%"`.
pub fn format_percent(fraction: f64, decimals: usize) -> String {
    let percent = fraction * 100.0;
    match Decimal::from_f64_retain(percent) {
        Some(exact) => {
            let rounded =
                exact.round_dp_with_strategy(decimals as u32, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}%", decimals, rounded)
        }
        None => format!("{:.*}%", decimals, percent),
    }
}

fn checked_weight(weights: &WeightTable, id: SourceId) -> Result<f64, AggregateError> {
    let weight = weights
        .weight(id)
        .ok_or(AggregateError::MissingWeight(id))?;

    if weight.is_finite() && weight > 0.0 {
        Ok(weight)
    } else {
        Err(AggregateError::InvalidWeight { id, weight })
    }
}

/// Combine per-source rankings into one ranked list.
///
/// Ties keep the order in which languages were first encountered, walking
/// sources in [`SourceId`] order.
pub fn aggregate_rankings(
    sources: &BTreeMap<SourceId, SourceDocument>,
    weights: &WeightTable,
) -> Result<Vec<RankedLanguage>, AggregateError> {
    if sources.is_empty() {
        return Err(AggregateError::EmptyInput);
    }

    let mut scores: Vec<LanguageScore> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (&id, document) in sources {
        let weight = checked_weight(weights, id)?;

        for entry in &document.rankings {
            if entry.name.trim().is_empty() {
                warn!("Skipping {} entry without a language name", id);
                continue;
            }

            let name = normalize_language_name(&entry.name).into_owned();
            let slot = *index.entry(name.clone()).or_insert_with(|| {
                scores.push(LanguageScore::new(name.clone()));
                scores.len() - 1
            });
            let language = &mut scores[slot];

            if language.sources.contains_key(&id) {
                debug!(
                    "{} lists '{}' more than once, keeping the first entry",
                    id, name
                );
                continue;
            }

            let score = extract_score(entry);
            language.total_weighted_score += score * weight;
            language.total_weight += weight;
            language.sources.insert(
                id,
                SourceContribution {
                    rank: entry.rank,
                    score,
                    raw_value: entry.raw_value(),
                },
            );
        }
    }

    let source_total = sources.len() as f64;

    let mut ranked: Vec<RankedLanguage> = scores
        .into_iter()
        .map(|language| {
            let score = language.final_score();
            RankedLanguage {
                rank: 0,
                score,
                score_percent: format_percent(score, 2),
                confidence: language.source_count() as f64 / source_total,
                source_count: language.source_count(),
                name: language.name,
                sources: language.sources,
            }
        })
        .filter(|language| language.score > MIN_SCORE)
        .collect();

    // Stable: equal scores keep first-encounter order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    for (position, language) in ranked.iter_mut().enumerate() {
        language.rank = position + 1;
    }

    debug!(
        "Aggregated {} languages from {} sources",
        ranked.len(),
        sources.len()
    );

    Ok(ranked)
}

/// Describe the weights of the sources present in this run.
///
/// Percentages are renormalized over the present sources only; the scoring
/// itself uses the configured weights.
pub fn build_methodology(
    sources: &BTreeMap<SourceId, SourceDocument>,
    weights: &WeightTable,
) -> Result<Methodology, AggregateError> {
    let total_weight = weights.total_for(sources.keys());

    let mut weight_infos = BTreeMap::new();
    for &id in sources.keys() {
        let weight = checked_weight(weights, id)?;
        weight_infos.insert(
            id,
            WeightInfo {
                weight,
                normalized_weight: format_percent(weight / total_weight, 1),
                description: id.profile().description.to_string(),
            },
        );
    }

    Ok(Methodology {
        description: "Languages are scored using a weighted combination of multiple data \
                      sources. Each source measures a different aspect of language popularity \
                      (learning intent, actual usage, community activity)."
            .to_string(),
        weights: weight_infos,
        total_weight: format!("{:.2}", total_weight),
        normalized_weight_sum: "100%".to_string(),
    })
}

/// Profile and provenance for each loaded source.
pub fn source_metrics(
    sources: &BTreeMap<SourceId, SourceDocument>,
    weights: &WeightTable,
) -> BTreeMap<SourceId, SourceMetrics> {
    sources
        .iter()
        .map(|(&id, document)| {
            let profile = id.profile();
            let metrics = SourceMetrics {
                weight: weights.weight(id).unwrap_or(profile.weight),
                description: profile.description.to_string(),
                update_frequency: profile.update_frequency.to_string(),
                data_size: profile.data_size.to_string(),
                methodology: profile.methodology.to_string(),
                strengths: profile.strengths.iter().map(|s| s.to_string()).collect(),
                weaknesses: profile.weaknesses.iter().map(|s| s.to_string()).collect(),
                language_count: document.rankings.len(),
                fetched_at: document.fetched_at.clone(),
                latest_data_date: document.data_date(),
                data_origin: document.data_origin.clone(),
            };
            (id, metrics)
        })
        .collect()
}

/// Run the full aggregation and assemble the report document.
pub fn aggregate(
    sources: &BTreeMap<SourceId, SourceDocument>,
    weights: &WeightTable,
    generated_at: DateTime<Utc>,
) -> Result<AggregatedReport, AggregateError> {
    let rankings = aggregate_rankings(sources, weights)?;
    let methodology = build_methodology(sources, weights)?;

    Ok(AggregatedReport {
        meta: ReportMeta {
            title: "Aggregated Programming Language Rankings".to_string(),
            description: "Scientifically weighted ranking of programming languages based on \
                          multiple independent data sources"
                .to_string(),
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: REPORT_VERSION.to_string(),
        },
        methodology,
        sources: source_metrics(sources, weights),
        summary: RankingSummary::from_rankings(&rankings, sources.len()),
        rankings,
    })
}
