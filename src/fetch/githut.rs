//! GitHut (GitHub language statistics) fetcher.
//!
//! GitHut publishes per-quarter event counts by language for four GitHub
//! Archive metrics. Each metric's latest quarter is turned into shares, and
//! the shares are combined with fixed metric weights.

use super::{timestamp, FetchError, HttpFetcher};
use crate::analysis::format_percent;
use crate::models::{RankingEntry, SourceDocument};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{info, warn};

const SOURCE: &str = "GitHut";

/// Languages kept per metric and in the combined ranking by default.
pub const DEFAULT_TOP_N: usize = 50;

/// Languages kept per metric in the `individualMetrics` detail.
const DETAIL_TOP_N: usize = 30;

/// GitHub Archive metric published by GitHut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    PullRequests,
    PushEvents,
    StarEvents,
    IssueEvents,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::PullRequests,
        Metric::PushEvents,
        Metric::StarEvents,
        Metric::IssueEvents,
    ];

    /// Key used in the output document.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::PullRequests => "pullRequests",
            Metric::PushEvents => "pushEvents",
            Metric::StarEvents => "starEvents",
            Metric::IssueEvents => "issueEvents",
        }
    }

    /// Data file name in the GitHut repository.
    pub fn file_name(&self) -> &'static str {
        match self {
            Metric::PullRequests => "gh-pull-request.json",
            Metric::PushEvents => "gh-push-event.json",
            Metric::StarEvents => "gh-star-event.json",
            Metric::IssueEvents => "gh-issue-event.json",
        }
    }

    /// Contribution to the combined score.
    ///
    /// Pull requests track active development most closely.
    pub fn weight(&self) -> f64 {
        match self {
            Metric::PullRequests => 0.40,
            Metric::PushEvents => 0.30,
            Metric::StarEvents => 0.15,
            Metric::IssueEvents => 0.15,
        }
    }
}

/// One row of a GitHut data file. Numbers are usually encoded as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHutRecord {
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub year: String,
    #[serde(deserialize_with = "text")]
    pub quarter: String,
    #[serde(deserialize_with = "count")]
    pub count: u64,
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// One language in a single metric's latest quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEntry {
    pub rank: u32,
    pub name: String,
    pub count: u64,
    pub share: f64,
}

/// A single metric's ranking for its latest quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRanking {
    pub metric: Metric,
    pub period: String,
    pub total: u64,
    pub rankings: Vec<MetricEntry>,
}

/// Rank the latest quarter of one metric.
pub fn process_metric(
    records: &[GitHutRecord],
    metric: Metric,
    top_n: usize,
) -> Result<MetricRanking, FetchError> {
    let period = records
        .iter()
        .map(|r| format!("{}-Q{}", r.year, r.quarter))
        .max()
        .ok_or_else(|| FetchError::parse(SOURCE, format!("{} has no records", metric.key())))?;

    let mut latest: Vec<&GitHutRecord> = records
        .iter()
        .filter(|r| format!("{}-Q{}", r.year, r.quarter) == period)
        .collect();
    latest.sort_by(|a, b| b.count.cmp(&a.count));

    let total: u64 = latest.iter().map(|r| r.count).sum();
    if total == 0 {
        return Err(FetchError::parse(
            SOURCE,
            format!("{} has no events in {}", metric.key(), period),
        ));
    }

    let rankings = latest
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, r)| MetricEntry {
            rank: i as u32 + 1,
            name: r.name.clone(),
            count: r.count,
            share: r.count as f64 / total as f64,
        })
        .collect();

    Ok(MetricRanking {
        metric,
        period,
        total,
        rankings,
    })
}

/// Combine metric rankings into weighted, normalized scores.
///
/// Returns `(name, normalized score)` pairs sorted by score, highest first.
pub fn combine_metrics(metrics: &[MetricRanking]) -> Vec<(String, f64)> {
    let mut order: Vec<String> = Vec::new();
    let mut weighted: HashMap<String, f64> = HashMap::new();

    for metric in metrics {
        let weight = metric.metric.weight();
        for entry in &metric.rankings {
            if !weighted.contains_key(&entry.name) {
                order.push(entry.name.clone());
            }
            *weighted.entry(entry.name.clone()).or_default() += entry.share * weight;
        }
    }

    let mut combined: Vec<(String, f64)> = order
        .into_iter()
        .map(|name| {
            let score = weighted.get(&name).copied().unwrap_or_default();
            (name, score)
        })
        .collect();
    combined.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total: f64 = combined.iter().map(|(_, s)| s).sum();
    if total > 0.0 {
        for (_, score) in combined.iter_mut() {
            *score /= total;
        }
    }

    combined
}

/// Fetch all four metric files and combine them.
///
/// A metric that cannot be fetched is skipped; at least one must succeed.
pub async fn fetch(
    http: &HttpFetcher,
    base_url: &str,
    top_n: usize,
) -> Result<SourceDocument, FetchError> {
    let mut metrics = Vec::new();

    for metric in Metric::ALL {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), metric.file_name());
        info!("Fetching GitHut {}", metric.key());

        let result = match http.get_json::<Vec<GitHutRecord>>(&url).await {
            Ok(records) => process_metric(&records, metric, top_n),
            Err(e) => Err(e),
        };
        match result {
            Ok(ranking) => metrics.push(ranking),
            Err(e) => warn!("Could not fetch GitHut {}: {}", metric.key(), e),
        }
    }

    build(&metrics, top_n, timestamp())
}

/// Build the GitHut ranking document.
pub fn build(
    metrics: &[MetricRanking],
    top_n: usize,
    fetched_at: String,
) -> Result<SourceDocument, FetchError> {
    if metrics.is_empty() {
        return Err(FetchError::parse(SOURCE, "no metric could be fetched"));
    }

    let combined = combine_metrics(metrics);
    let total_languages = combined.len();

    let rankings: Vec<RankingEntry> = combined
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, (name, score))| RankingEntry {
            name,
            rank: Some(i as u32 + 1),
            normalized_score: Some(score),
            share_percent: Some(format_percent(score, 2)),
            ..RankingEntry::default()
        })
        .collect();

    let mut metric_weights = Map::new();
    let mut metric_details = Map::new();
    let mut individual = Map::new();
    for metric in Metric::ALL {
        metric_weights.insert(
            metric.key().to_string(),
            json!(format!("{:.0}%", metric.weight() * 100.0)),
        );
    }
    for m in metrics {
        metric_details.insert(
            m.metric.key().to_string(),
            json!({
                "period": m.period,
                "totalCount": m.total,
                "topLanguage": m.rankings.first().map(|e| e.name.clone()),
            }),
        );
        let detail: Vec<Value> = m
            .rankings
            .iter()
            .take(DETAIL_TOP_N)
            .map(|e| {
                json!({
                    "rank": e.rank,
                    "name": e.name,
                    "count": e.count,
                    "share": e.share,
                    "sharePercent": format_percent(e.share, 2),
                })
            })
            .collect();
        individual.insert(m.metric.key().to_string(), Value::Array(detail));
    }

    let mut extra = Map::new();
    extra.insert(
        "repositoryUrl".to_string(),
        json!("https://github.com/madnight/githut"),
    );
    extra.insert("metricWeights".to_string(), Value::Object(metric_weights));
    extra.insert("metricDetails".to_string(), Value::Object(metric_details));
    extra.insert("individualMetrics".to_string(), Value::Object(individual));

    Ok(SourceDocument {
        source: Some(SOURCE.to_string()),
        source_url: Some("https://madnight.github.io/githut/".to_string()),
        description: Some(
            "GitHub Language Statistics - based on GitHub Archive data via BigQuery".to_string(),
        ),
        methodology: Some(
            "Aggregated rankings based on weighted combination of pull requests (40%), push \
             events (30%), star events (15%), and issue events (15%)"
                .to_string(),
        ),
        update_frequency: Some("quarterly".to_string()),
        data_origin: Some("GitHub Archive (BigQuery)".to_string()),
        fetched_at: Some(fetched_at),
        latest_data_period: Some(metrics[0].period.clone()),
        total_languages: Some(total_languages),
        rankings,
        extra,
        ..SourceDocument::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn records(value: Value) -> Vec<GitHutRecord> {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> Value {
        json!([
            {"name": "Python", "year": "2025", "quarter": "1", "count": "300"},
            {"name": "JavaScript", "year": "2025", "quarter": "2", "count": "500"},
            {"name": "Python", "year": "2025", "quarter": "2", "count": "300"},
            {"name": "Rust", "year": 2025, "quarter": 2, "count": 200}
        ])
    }

    #[test]
    fn process_metric_uses_latest_quarter() {
        let ranking = process_metric(&records(sample()), Metric::PushEvents, 50).unwrap();

        assert_eq!(ranking.period, "2025-Q2");
        assert_eq!(ranking.total, 1000);
        let names: Vec<_> = ranking.rankings.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["JavaScript", "Python", "Rust"]);
        assert_eq!(ranking.rankings[0].share, 0.5);
        assert_eq!(ranking.rankings[2].rank, 3);
    }

    #[test]
    fn process_metric_truncates() {
        let ranking = process_metric(&records(sample()), Metric::PushEvents, 2).unwrap();
        assert_eq!(ranking.rankings.len(), 2);
        assert_eq!(ranking.total, 1000);
    }

    #[test]
    fn process_metric_empty_is_error() {
        assert!(process_metric(&[], Metric::StarEvents, 50).is_err());
    }

    #[test]
    fn combine_weights_and_normalizes() {
        let pulls = MetricRanking {
            metric: Metric::PullRequests,
            period: "2025-Q2".to_string(),
            total: 10,
            rankings: vec![
                MetricEntry { rank: 1, name: "Go".to_string(), count: 6, share: 0.6 },
                MetricEntry { rank: 2, name: "C".to_string(), count: 4, share: 0.4 },
            ],
        };
        let stars = MetricRanking {
            metric: Metric::StarEvents,
            period: "2025-Q2".to_string(),
            total: 10,
            rankings: vec![MetricEntry { rank: 1, name: "C".to_string(), count: 10, share: 1.0 }],
        };

        let combined = combine_metrics(&[pulls, stars]);
        // Go: 0.6 * 0.40 = 0.24, C: 0.4 * 0.40 + 1.0 * 0.15 = 0.31
        assert_eq!(combined[0].0, "C");
        assert!((combined[0].1 - 0.31 / 0.55).abs() < 1e-12);
        assert!((combined[1].1 - 0.24 / 0.55).abs() < 1e-12);
        let sum: f64 = combined.iter().map(|(_, s)| s).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn build_requires_a_metric() {
        assert!(matches!(
            build(&[], DEFAULT_TOP_N, String::new()),
            Err(FetchError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_skips_failing_metrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/gh-pull-request.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let doc = fetch(&http, &format!("{}/data/", server.uri()), DEFAULT_TOP_N)
            .await
            .unwrap();

        assert_eq!(doc.latest_data_period.as_deref(), Some("2025-Q2"));
        assert_eq!(doc.rankings[0].name, "JavaScript");
        assert!((doc.rankings[0].normalized_score.unwrap() - 0.5).abs() < 1e-12);
        assert!(doc.extra["metricDetails"].get("pullRequests").is_some());
        assert!(doc.extra["metricDetails"].get("pushEvents").is_none());
        assert_eq!(doc.extra["metricWeights"]["pullRequests"], "40%");
    }
}
