//! Stack Overflow Developer Survey source.
//!
//! The full survey export is a ~134MB CSV, so the published summary
//! percentages from the survey results page are embedded instead.
//! No network access is needed.

use crate::models::{RankingEntry, SourceDocument};
use serde_json::{json, Map};

const SURVEY_YEAR: u32 = 2025;
const SURVEY_URL: &str = "https://survey.stackoverflow.co/2025/";
const TECHNOLOGY_URL: &str = "https://survey.stackoverflow.co/2025/technology";
const RESPONDENTS: u32 = 49_000;
const COUNTRIES: u32 = 177;

/// Share of respondents who used each language in the past year, in percent.
static LANGUAGE_USAGE: &[(&str, f64)] = &[
    ("JavaScript", 66.2),
    ("HTML/CSS", 56.5),
    ("Python", 54.8),
    ("SQL", 49.3),
    ("TypeScript", 43.2),
    ("Bash/Shell", 34.1),
    ("Java", 30.5),
    ("C#", 27.4),
    ("C++", 20.1),
    ("C", 18.7),
    ("PHP", 17.4),
    ("Go", 14.2),
    ("Rust", 12.8),
    ("Kotlin", 9.7),
    ("Ruby", 6.2),
    ("Swift", 5.8),
    ("R", 5.1),
    ("Dart", 4.9),
    ("Scala", 2.8),
    ("Elixir", 2.5),
    ("Clojure", 1.6),
    ("Haskell", 1.4),
    ("Lua", 5.3),
    ("Assembly", 4.2),
    ("Perl", 2.9),
    ("MATLAB", 3.8),
    ("Objective-C", 2.4),
    ("Groovy", 2.1),
    ("Julia", 1.2),
    ("F#", 1.1),
    ("Erlang", 0.9),
    ("Zig", 1.5),
    ("Nim", 0.4),
    ("Crystal", 0.3),
    ("OCaml", 0.6),
    ("Fortran", 1.8),
    ("COBOL", 0.8),
    ("Ada", 0.5),
    ("Prolog", 0.4),
    ("Lisp", 0.7),
    ("Delphi", 1.9),
    ("VBA", 3.2),
    ("PowerShell", 11.2),
];

/// Developers who want to keep using the language, in percent.
static ADMIRED: &[(&str, f64)] = &[
    ("Rust", 72.1),
    ("Gleam", 70.0),
    ("Elixir", 66.4),
    ("Zig", 64.2),
    ("Clojure", 61.8),
    ("Go", 60.5),
    ("TypeScript", 58.9),
    ("Kotlin", 57.2),
    ("Python", 56.8),
    ("Swift", 54.1),
];

/// Developers who want to learn the language, in percent.
static DESIRED: &[(&str, f64)] = &[
    ("Python", 18.2),
    ("JavaScript", 12.1),
    ("Go", 11.8),
    ("Rust", 11.5),
    ("TypeScript", 10.9),
    ("Kotlin", 6.2),
    ("C++", 5.8),
    ("Java", 5.4),
    ("C#", 4.9),
    ("Swift", 4.2),
];

fn position(table: &[(&str, f64)], name: &str) -> Option<(usize, f64)> {
    table
        .iter()
        .position(|(n, _)| *n == name)
        .map(|i| (i + 1, table[i].1))
}

/// Build the survey ranking document.
pub fn build(fetched_at: String) -> SourceDocument {
    let mut usage: Vec<(&str, f64)> = LANGUAGE_USAGE.to_vec();
    usage.sort_by(|a, b| b.1.total_cmp(&a.1));

    let rankings: Vec<RankingEntry> = usage
        .iter()
        .enumerate()
        .map(|(i, &(name, percent))| {
            let mut extra = Map::new();
            extra.insert("usagePercent".to_string(), json!(format!("{:.1}%", percent)));
            if let Some((rank, score)) = position(ADMIRED, name) {
                extra.insert("admirationRank".to_string(), json!(rank));
                extra.insert("admirationScore".to_string(), json!(score));
            }
            if let Some((rank, score)) = position(DESIRED, name) {
                extra.insert("desireRank".to_string(), json!(rank));
                extra.insert("desireScore".to_string(), json!(score));
            }

            RankingEntry {
                name: name.to_string(),
                rank: Some(i as u32 + 1),
                usage: Some(percent),
                share: Some(percent / 100.0),
                extra,
                ..RankingEntry::default()
            }
        })
        .collect();

    let sentiment = |table: &[(&str, f64)], key: &str| -> Vec<serde_json::Value> {
        table
            .iter()
            .map(|(name, value)| json!({ "name": name, key: value }))
            .collect()
    };

    let mut extra = Map::new();
    extra.insert("technologyUrl".to_string(), json!(TECHNOLOGY_URL));
    extra.insert("respondents".to_string(), json!(RESPONDENTS));
    extra.insert("countries".to_string(), json!(COUNTRIES));
    extra.insert(
        "sentiment".to_string(),
        json!({
            "mostAdmired": sentiment(ADMIRED, "admiration"),
            "mostDesired": sentiment(DESIRED, "desire"),
        }),
    );

    SourceDocument {
        source: Some("Stack Overflow Developer Survey".to_string()),
        source_url: Some(SURVEY_URL.to_string()),
        description: Some(
            "Annual Stack Overflow Developer Survey - usage statistics from professional developers"
                .to_string(),
        ),
        methodology: Some(
            "Self-reported survey of professional developers. Usage represents percentage of \
             respondents who reported using each language in the past year."
                .to_string(),
        ),
        update_frequency: Some("yearly".to_string()),
        data_origin: Some("Stack Overflow Developer Survey".to_string()),
        fetched_at: Some(fetched_at),
        survey_year: Some(SURVEY_YEAR),
        total_languages: Some(rankings.len()),
        rankings,
        extra,
        ..SourceDocument::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_by_usage() {
        let doc = build(String::new());
        assert_eq!(doc.rankings.len(), LANGUAGE_USAGE.len());
        assert_eq!(doc.rankings[0].name, "JavaScript");
        assert_eq!(doc.rankings[0].rank, Some(1));
        assert!(doc
            .rankings
            .windows(2)
            .all(|w| w[0].usage >= w[1].usage));
    }

    #[test]
    fn share_mirrors_usage() {
        let doc = build(String::new());
        let rust = doc.rankings.iter().find(|r| r.name == "Rust").unwrap();
        assert_eq!(rust.usage, Some(12.8));
        assert!((rust.share.unwrap() - 0.128).abs() < 1e-12);
        assert_eq!(rust.extra["usagePercent"], "12.8%");
    }

    #[test]
    fn enriched_with_sentiment() {
        let doc = build(String::new());
        let rust = doc.rankings.iter().find(|r| r.name == "Rust").unwrap();
        assert_eq!(rust.extra["admirationRank"], 1);
        assert_eq!(rust.extra["desireRank"], 4);

        let cobol = doc.rankings.iter().find(|r| r.name == "COBOL").unwrap();
        assert!(cobol.extra.get("admirationRank").is_none());

        assert_eq!(doc.extra["sentiment"]["mostAdmired"][1]["name"], "Gleam");
        assert_eq!(doc.extra["sentiment"]["mostDesired"][0]["desire"], 18.2);
    }

    #[test]
    fn reports_survey_year() {
        let doc = build("2025-08-01T00:00:00.000Z".to_string());
        assert_eq!(doc.data_date().as_deref(), Some("2025"));
        assert_eq!(doc.fetched_at.as_deref(), Some("2025-08-01T00:00:00.000Z"));
    }
}
