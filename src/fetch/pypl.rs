//! PYPL (PopularitY of Programming Language) fetcher.
//!
//! PYPL publishes its Google Trends tutorial-search shares as a JavaScript
//! data file: a header listing language names followed by one
//! `[new Date(y,m,d),v1,v2,...]` row per month.

use super::{timestamp, FetchError, HttpFetcher};
use crate::analysis::format_percent;
use crate::models::{RankingEntry, SourceDocument};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map};

const SOURCE: &str = "PYPL";

/// Months of history kept in the document.
const HISTORY_MONTHS: usize = 24;

static LANGUAGES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\['Date',\s*//\s*begin section languages\s*(.*?)//\s*end section languages")
        .expect("valid languages regex")
});

static ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[new Date\((\d+),(\d+),\d+\),([\d.,]+)\]").expect("valid row regex")
});

/// One monthly data row.
#[derive(Debug, Clone, PartialEq)]
struct DataRow {
    year: u32,
    month: u32,
    values: Vec<f64>,
}

impl DataRow {
    fn date(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

/// Download and parse the PYPL data file.
pub async fn fetch(http: &HttpFetcher, url: &str) -> Result<SourceDocument, FetchError> {
    let raw = http.get_text(url).await?;
    parse(&raw, timestamp())
}

fn language_names(raw: &str) -> Result<Vec<String>, FetchError> {
    let section = LANGUAGES_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .ok_or_else(|| FetchError::parse(SOURCE, "could not find languages section"))?;

    Ok(section
        .as_str()
        .split(',')
        .map(|s| s.trim().trim_start_matches('\'').trim_end_matches('\''))
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

fn data_rows(raw: &str, columns: usize) -> Vec<DataRow> {
    ROW_RE
        .captures_iter(raw)
        .filter_map(|c| {
            let year = c[1].parse().ok()?;
            // JavaScript months are 0-based.
            let month = c[2].parse::<u32>().ok()? + 1;
            let values = c[3]
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            (values.len() == columns).then_some(DataRow {
                year,
                month,
                values,
            })
        })
        .collect()
}

/// Parse the PYPL JavaScript data file into a ranking document.
pub fn parse(raw: &str, fetched_at: String) -> Result<SourceDocument, FetchError> {
    let names = language_names(raw)?;
    let rows = data_rows(raw, names.len());
    let latest = rows
        .last()
        .ok_or_else(|| FetchError::parse(SOURCE, "no data rows match the language list"))?;

    let mut rankings: Vec<RankingEntry> = names
        .iter()
        .zip(&latest.values)
        .map(|(name, &share)| RankingEntry {
            share_percent: Some(format_percent(share, 2)),
            ..RankingEntry::with_share(name.clone(), share)
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.share
            .unwrap_or_default()
            .total_cmp(&a.share.unwrap_or_default())
    });
    for (i, entry) in rankings.iter_mut().enumerate() {
        entry.rank = Some(i as u32 + 1);
    }

    let history: Vec<_> = rows
        .iter()
        .skip(rows.len().saturating_sub(HISTORY_MONTHS))
        .map(|row| {
            json!({
                "year": row.year,
                "month": row.month,
                "date": row.date(),
                "values": row.values,
            })
        })
        .collect();

    let mut extra = Map::new();
    extra.insert(
        "historicalData".to_string(),
        json!({ "languages": names, "dataPoints": history }),
    );

    Ok(SourceDocument {
        source: Some(SOURCE.to_string()),
        source_url: Some("https://pypl.github.io/PYPL.html".to_string()),
        description: Some(
            "PopularitY of Programming Language index - based on Google Trends tutorial search frequency"
                .to_string(),
        ),
        methodology: Some(
            "The PYPL index is created by analyzing how often language tutorials are searched on Google."
                .to_string(),
        ),
        update_frequency: Some("monthly".to_string()),
        data_origin: Some("Google Trends".to_string()),
        fetched_at: Some(fetched_at),
        latest_data_date: Some(latest.date()),
        total_languages: Some(rankings.len()),
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

    const SAMPLE: &str = r#"
var graphData = [
  ['Date', // begin section languages
    'Python','Java','JavaScript'
  // end section languages
  ],
  [new Date(2025,0,1),0.28,0.16,0.08],
  [new Date(2025,1,1),0.29,0.15,0.08],
  [new Date(2025,2,1),0.30,0.12]
];
"#;

    #[test]
    fn parses_latest_complete_row() {
        let doc = parse(SAMPLE, "2025-03-01T00:00:00.000Z".to_string()).unwrap();

        // The March row is short one value and is dropped.
        assert_eq!(doc.latest_data_date.as_deref(), Some("2025-02"));
        assert_eq!(doc.total_languages, Some(3));

        let names: Vec<_> = doc.rankings.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Python", "Java", "JavaScript"]);
        assert_eq!(doc.rankings[0].share, Some(0.29));
        assert_eq!(doc.rankings[0].share_percent.as_deref(), Some("29.00%"));
        assert_eq!(doc.rankings[2].rank, Some(3));
    }

    #[test]
    fn keeps_history() {
        let doc = parse(SAMPLE, String::new()).unwrap();
        let history = &doc.extra["historicalData"];
        assert_eq!(history["languages"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(history["dataPoints"][0]["date"], "2025-01");
        assert_eq!(history["dataPoints"][0]["month"], 1);
    }

    #[test]
    fn missing_language_section_is_parse_error() {
        let result = parse("[new Date(2025,0,1),0.5]", String::new());
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[test]
    fn no_rows_is_parse_error() {
        let raw = "['Date', // begin section languages\n'Go'\n// end section languages\n]";
        assert!(matches!(
            parse(raw, String::new()),
            Err(FetchError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_downloads_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/PYPL/All.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
            .mount(&server)
            .await;

        let http = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let doc = fetch(&http, &format!("{}/PYPL/All.js", server.uri()))
            .await
            .unwrap();
        assert_eq!(doc.source.as_deref(), Some("PYPL"));
        assert_eq!(doc.rankings.len(), 3);
    }
}
