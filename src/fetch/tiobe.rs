//! TIOBE index fetcher.
//!
//! Official TIOBE history is not freely available, so ratings come from a
//! community-maintained CSV mirror: a `DATE` column followed by one column
//! per language holding its rating in percent.

use super::{timestamp, FetchError, HttpFetcher};
use crate::models::{RankingEntry, SourceDocument};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

const SOURCE: &str = "TIOBE";
const DATE_COLUMN: &str = "DATE";
const HISTORY_MONTHS: usize = 24;

/// Parsed CSV table.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn cell<'a>(&'a self, row: &'a [String], column: &str) -> Option<&'a str> {
        let index = self.headers.iter().position(|h| h == column)?;
        row.get(index).map(String::as_str)
    }
}

/// Split one CSV line, honouring double-quoted fields.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Parse CSV text with a header line.
pub fn parse_csv(text: &str) -> CsvTable {
    let mut lines = text.trim().lines().filter(|l| !l.trim().is_empty());
    let headers = lines.next().map(parse_csv_line).unwrap_or_default();
    let rows = lines.map(parse_csv_line).collect();
    CsvTable { headers, rows }
}

/// Leading numeric value of a cell; empty or non-numeric cells read as zero.
fn rating(cell: Option<&str>) -> f64 {
    cell.map(|c| c.trim().trim_end_matches('%').trim())
        .and_then(|c| c.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Try each candidate URL in order and parse the first usable CSV.
pub async fn fetch(http: &HttpFetcher, urls: &[String]) -> Result<SourceDocument, FetchError> {
    for url in urls {
        info!("Trying TIOBE data from: {}", url);
        match http.get_text(url).await {
            Ok(text) if is_usable(&text) => {
                info!("Fetched TIOBE data from: {}", url);
                return build(&parse_csv(&text), url, timestamp());
            }
            Ok(_) => debug!("Empty or not-found body from {}", url),
            Err(e) => debug!("Failed to fetch {}: {}", url, e),
        }
    }

    Err(FetchError::parse(
        SOURCE,
        "could not fetch historical data from any candidate URL",
    ))
}

fn is_usable(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && !text.starts_with("404")
}

/// Build a ranking document from the latest CSV row.
pub fn build(
    table: &CsvTable,
    data_url: &str,
    fetched_at: String,
) -> Result<SourceDocument, FetchError> {
    let latest = table
        .rows
        .last()
        .ok_or_else(|| FetchError::parse(SOURCE, "CSV has no data rows"))?;
    let languages: Vec<&String> = table.headers.iter().filter(|h| *h != DATE_COLUMN).collect();

    let mut rankings: Vec<RankingEntry> = languages
        .iter()
        .map(|name| {
            let value = rating(table.cell(latest, name));
            RankingEntry {
                share_percent: Some(format!("{:.2}%", value)),
                ..RankingEntry::with_share(name.as_str(), value / 100.0)
            }
        })
        .filter(|entry| entry.share.unwrap_or_default() > 0.0)
        .collect();

    rankings.sort_by(|a, b| {
        b.share
            .unwrap_or_default()
            .total_cmp(&a.share.unwrap_or_default())
    });
    for (i, entry) in rankings.iter_mut().enumerate() {
        entry.rank = Some(i as u32 + 1);
    }

    let history: Vec<Value> = table
        .rows
        .iter()
        .skip(table.rows.len().saturating_sub(HISTORY_MONTHS))
        .map(|row| {
            let mut point = Map::new();
            point.insert(
                "date".to_string(),
                json!(table.cell(row, DATE_COLUMN).unwrap_or_default()),
            );
            for name in &languages {
                let cell = table.cell(row, name).unwrap_or_default();
                if let Ok(value) = cell.trim_end_matches('%').parse::<f64>() {
                    point.insert(name.to_string(), json!(value));
                }
            }
            Value::Object(point)
        })
        .collect();

    let ranked_languages: Vec<&str> = languages
        .iter()
        .map(|l| l.as_str())
        .filter(|l| rankings.iter().any(|r| r.name == *l))
        .collect();

    let mut extra = Map::new();
    extra.insert("dataUrl".to_string(), json!(data_url));
    extra.insert(
        "historicalData".to_string(),
        json!({ "languages": ranked_languages, "dataPoints": history }),
    );

    Ok(SourceDocument {
        source: Some(SOURCE.to_string()),
        source_url: Some("https://www.tiobe.com/tiobe-index/".to_string()),
        description: Some(
            "TIOBE Programming Community index - based on search engine query analysis".to_string(),
        ),
        methodology: Some(
            "The ratings are based on the number of skilled engineers world-wide, courses and \
             third party vendors. Popular search engines are used to calculate the ratings."
                .to_string(),
        ),
        update_frequency: Some("monthly".to_string()),
        data_origin: Some(
            "Search engines (Google, Bing, Yahoo, Wikipedia, Amazon, YouTube, Baidu)".to_string(),
        ),
        fetched_at: Some(fetched_at),
        latest_data_date: table.cell(latest, DATE_COLUMN).map(String::from),
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

    const SAMPLE: &str = "\
DATE,Python,C,\"C++\",Cobol
Nov 2025,23.37,9.68,8.95,
Dec 2025,22.61,10.99,8.67,0
";

    #[test]
    fn csv_line_respects_quotes() {
        assert_eq!(
            parse_csv_line(r#"a, "b,c" ,d"#),
            vec!["a".to_string(), "b,c".to_string(), "d".to_string()]
        );
        assert_eq!(parse_csv_line(""), vec![String::new()]);
    }

    #[test]
    fn csv_table_headers_and_rows() {
        let table = parse_csv(SAMPLE);
        assert_eq!(table.headers, vec!["DATE", "Python", "C", "C++", "Cobol"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn builds_from_latest_row() {
        let doc = build(&parse_csv(SAMPLE), "https://example.test/t.csv", String::new()).unwrap();

        assert_eq!(doc.latest_data_date.as_deref(), Some("Dec 2025"));
        let names: Vec<_> = doc.rankings.iter().map(|r| r.name.as_str()).collect();
        // Zero ratings are dropped.
        assert_eq!(names, vec!["Python", "C", "C++"]);
        assert!((doc.rankings[0].share.unwrap() - 0.2261).abs() < 1e-12);
        assert_eq!(doc.rankings[0].share_percent.as_deref(), Some("22.61%"));
        assert_eq!(doc.rankings[1].rank, Some(2));
        assert_eq!(doc.extra["dataUrl"], "https://example.test/t.csv");
    }

    #[test]
    fn history_skips_empty_cells() {
        let doc = build(&parse_csv(SAMPLE), "", String::new()).unwrap();
        let points = doc.extra["historicalData"]["dataPoints"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["date"], "Nov 2025");
        assert!(points[0].get("Cobol").is_none());
        assert_eq!(points[1]["Cobol"], 0.0);

        let languages = &doc.extra["historicalData"]["languages"];
        assert_eq!(languages.as_array().map(|a| a.len()), Some(3));
    }

    #[test]
    fn header_only_csv_is_parse_error() {
        let result = build(&parse_csv("DATE,Python\n"), "", String::new());
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[tokio::test]
    async fn fetch_falls_back_to_next_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/January.csv"))
            .respond_with(ResponseTemplate::new(404).set_body_string("404: Not Found"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/December.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
            .mount(&server)
            .await;

        let urls = vec![
            format!("{}/January.csv", server.uri()),
            format!("{}/December.csv", server.uri()),
        ];
        let http = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let doc = fetch(&http, &urls).await.unwrap();

        assert_eq!(doc.extra["dataUrl"], json!(urls[1]));
        assert_eq!(doc.rankings.len(), 3);
    }

    #[tokio::test]
    async fn fetch_fails_when_no_url_works() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("404: Not Found"))
            .mount(&server)
            .await;

        let http = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let result = fetch(&http, &[format!("{}/x.csv", server.uri())]).await;
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }
}
