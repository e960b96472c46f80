//! Data models for the language rankings pipeline.
//!
//! This module contains the per-source ranking documents produced by the
//! fetchers and the aggregated report structures written to disk.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a ranking data source.
///
/// The variant order is the fixed processing order of the aggregator and the
/// key order of every per-source map in the output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// GitHub activity statistics (GitHut)
    Githut,
    /// TIOBE search engine index
    Tiobe,
    /// PYPL Google Trends tutorial searches
    Pypl,
    /// Stack Overflow developer survey
    #[value(name = "stackoverflow")]
    StackOverflow,
}

impl SourceId {
    /// All known sources in processing order.
    pub const ALL: [SourceId; 4] = [
        SourceId::Githut,
        SourceId::Tiobe,
        SourceId::Pypl,
        SourceId::StackOverflow,
    ];

    /// Identifier used for file names and map keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Githut => "githut",
            SourceId::Tiobe => "tiobe",
            SourceId::Pypl => "pypl",
            SourceId::StackOverflow => "stackoverflow",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::Githut => "GitHut",
            SourceId::Tiobe => "TIOBE",
            SourceId::Pypl => "PYPL",
            SourceId::StackOverflow => "Stack Overflow",
        }
    }

    /// File name of the cached document inside the data directory.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "githut" => Ok(SourceId::Githut),
            "tiobe" => Ok(SourceId::Tiobe),
            "pypl" => Ok(SourceId::Pypl),
            "stackoverflow" | "stack-overflow" | "so" => Ok(SourceId::StackOverflow),
            other => Err(format!("Unknown source: {}", other)),
        }
    }
}

/// One language entry in a source's ranking list.
///
/// Score fields are read leniently: numeric strings are accepted, anything
/// else (including non-finite numbers) reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// Language name as reported by the source.
    #[serde(default)]
    pub name: String,
    /// Position in the source's own ranking (1-indexed).
    #[serde(
        default,
        deserialize_with = "de::lenient_rank",
        skip_serializing_if = "Option::is_none"
    )]
    pub rank: Option<u32>,
    /// Fraction of the source's total (0-1).
    #[serde(
        default,
        deserialize_with = "de::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub share: Option<f64>,
    /// Source-normalized score (0-1).
    #[serde(
        default,
        deserialize_with = "de::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub normalized_score: Option<f64>,
    /// Usage percentage (0-100).
    #[serde(
        default,
        deserialize_with = "de::lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub usage: Option<f64>,
    /// Display percentage, e.g. `"22.61%"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_percent: Option<String>,
    /// Source-specific extras (counts, sentiment ranks, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RankingEntry {
    /// Creates an entry with only a name and a share.
    pub fn with_share(name: impl Into<String>, share: f64) -> Self {
        Self {
            name: name.into(),
            share: Some(share),
            ..Self::default()
        }
    }

    /// The value the source originally reported, for provenance.
    pub fn raw_value(&self) -> Option<Value> {
        self.share
            .and_then(number)
            .or_else(|| self.share_percent.clone().map(Value::String))
            .or_else(|| self.usage.and_then(number))
    }
}

fn number(value: f64) -> Option<Value> {
    serde_json::Number::from_f64(value).map(Value::Number)
}

/// A ranking document as written by one fetcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_data_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_data_period: Option<String>,
    #[serde(
        default,
        deserialize_with = "de::lenient_rank",
        skip_serializing_if = "Option::is_none"
    )]
    pub survey_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_languages: Option<usize>,
    #[serde(default)]
    pub rankings: Vec<RankingEntry>,
    /// Pass-through fields (historical data, sentiment, metric details).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceDocument {
    /// Most specific data date the source reports.
    pub fn data_date(&self) -> Option<String> {
        self.latest_data_date
            .clone()
            .or_else(|| self.latest_data_period.clone())
            .or_else(|| self.survey_year.map(|y| y.to_string()))
    }
}

/// One source's contribution to an aggregated language entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub score: f64,
    pub raw_value: Option<Value>,
}

/// A language in the final composite ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedLanguage {
    /// Position in the composite ranking (1-indexed).
    pub rank: usize,
    /// Canonical language name.
    pub name: String,
    /// Weighted average score (0-1).
    pub score: f64,
    /// Score as a percentage with two decimals.
    pub score_percent: String,
    /// Fraction of loaded sources that mention this language.
    pub confidence: f64,
    /// Number of sources that mention this language.
    pub source_count: usize,
    /// Per-source details.
    pub sources: BTreeMap<SourceId, SourceContribution>,
}

/// Report header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub title: String,
    pub description: String,
    pub generated_at: String,
    pub version: String,
}

/// Weight reported for one source in the methodology section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightInfo {
    pub weight: f64,
    /// Weight renormalized over the sources present in this run.
    pub normalized_weight: String,
    pub description: String,
}

/// How the composite score was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Methodology {
    pub description: String,
    pub weights: BTreeMap<SourceId, WeightInfo>,
    pub total_weight: String,
    pub normalized_weight_sum: String,
}

/// Profile and provenance of one loaded source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetrics {
    pub weight: f64,
    pub description: String,
    pub update_frequency: String,
    pub data_size: String,
    pub methodology: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub language_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_data_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_origin: Option<String>,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingSummary {
    pub total_languages: usize,
    pub sources_used: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_language: Option<String>,
    pub top10: Vec<String>,
}

impl RankingSummary {
    /// Creates a summary from the ranked list.
    pub fn from_rankings(rankings: &[RankedLanguage], sources_used: usize) -> Self {
        Self {
            total_languages: rankings.len(),
            sources_used,
            top_language: rankings.first().map(|l| l.name.clone()),
            top10: rankings.iter().take(10).map(|l| l.name.clone()).collect(),
        }
    }
}

/// The complete aggregated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub meta: ReportMeta,
    pub methodology: Methodology,
    pub sources: BTreeMap<SourceId, SourceMetrics>,
    pub summary: RankingSummary,
    pub rankings: Vec<RankedLanguage>,
}

/// Lenient field deserializers for hand-edited or scraped documents.
pub(crate) mod de {
    use super::*;

    fn as_finite(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|v| v.is_finite())
    }

    /// Number or numeric string; anything else reads as `None`.
    pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_finite))
    }

    /// Non-negative integer or integer string; anything else reads as `None`.
    pub fn lenient_rank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(as_finite)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_id_ordering() {
        assert!(SourceId::Githut < SourceId::Tiobe);
        assert!(SourceId::Tiobe < SourceId::Pypl);
        assert!(SourceId::Pypl < SourceId::StackOverflow);
    }

    #[test]
    fn test_source_id_from_str() {
        assert_eq!("GitHut".parse::<SourceId>(), Ok(SourceId::Githut));
        assert_eq!(
            "stackoverflow".parse::<SourceId>(),
            Ok(SourceId::StackOverflow)
        );
        assert!("reddit".parse::<SourceId>().is_err());
    }

    #[test]
    fn test_source_id_serializes_as_map_key() {
        let mut map = BTreeMap::new();
        map.insert(SourceId::StackOverflow, 1);
        map.insert(SourceId::Githut, 2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"githut":2,"stackoverflow":1}"#);
    }

    #[test]
    fn test_ranking_entry_lenient_scores() {
        let entry: RankingEntry = serde_json::from_value(json!({
            "name": "Python",
            "share": "high",
            "normalizedScore": "0.25",
            "usage": null,
            "rank": "3"
        }))
        .unwrap();

        assert_eq!(entry.share, None);
        assert_eq!(entry.normalized_score, Some(0.25));
        assert_eq!(entry.usage, None);
        assert_eq!(entry.rank, Some(3));
    }

    #[test]
    fn test_ranking_entry_keeps_extra_fields() {
        let entry: RankingEntry = serde_json::from_value(json!({
            "name": "Rust",
            "usage": 12.8,
            "usagePercent": "12.8%",
            "admirationRank": 1
        }))
        .unwrap();

        assert_eq!(entry.extra.get("usagePercent"), Some(&json!("12.8%")));
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["admirationRank"], json!(1));
    }

    #[test]
    fn test_raw_value_preference() {
        let mut entry = RankingEntry {
            name: "Go".to_string(),
            share_percent: Some("4.10%".to_string()),
            usage: Some(14.2),
            ..RankingEntry::default()
        };
        assert_eq!(entry.raw_value(), Some(json!("4.10%")));

        entry.share = Some(0.041);
        assert_eq!(entry.raw_value(), Some(json!(0.041)));

        entry.share = None;
        entry.share_percent = None;
        assert_eq!(entry.raw_value(), Some(json!(14.2)));
    }

    #[test]
    fn test_document_data_date_fallback() {
        let mut doc = SourceDocument {
            survey_year: Some(2025),
            ..SourceDocument::default()
        };
        assert_eq!(doc.data_date().as_deref(), Some("2025"));

        doc.latest_data_period = Some("2025-Q2".to_string());
        assert_eq!(doc.data_date().as_deref(), Some("2025-Q2"));

        doc.latest_data_date = Some("2025-06".to_string());
        assert_eq!(doc.data_date().as_deref(), Some("2025-06"));
    }

    #[test]
    fn test_summary_from_rankings() {
        let rankings: Vec<RankedLanguage> = (1..=12)
            .map(|i| RankedLanguage {
                rank: i,
                name: format!("Lang{}", i),
                score: 0.5 / i as f64,
                score_percent: String::new(),
                confidence: 1.0,
                source_count: 1,
                sources: BTreeMap::new(),
            })
            .collect();

        let summary = RankingSummary::from_rankings(&rankings, 3);
        assert_eq!(summary.total_languages, 12);
        assert_eq!(summary.sources_used, 3);
        assert_eq!(summary.top_language.as_deref(), Some("Lang1"));
        assert_eq!(summary.top10.len(), 10);

        let empty = RankingSummary::from_rankings(&[], 1);
        assert_eq!(empty.top_language, None);
        assert!(empty.top10.is_empty());
    }
}
