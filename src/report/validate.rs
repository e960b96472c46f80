//! Links Notation (lino) syntax checking.
//!
//! A small line-oriented parser: each non-blank line is a link, `key:`
//! opens a block whose children are indented exactly one level (two
//! spaces) deeper, tokens are bare words, quoted strings (`'`, `"` or
//! `` ` ``) or parenthesized groups.

use super::lino::RESERVED_CHARS;
use std::collections::HashMap;
use thiserror::Error;

/// Syntax errors, located by 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinoError {
    #[error("line {line}, column {column}: unterminated {quote} quote")]
    UnterminatedQuote {
        line: usize,
        column: usize,
        quote: char,
    },

    #[error("line {line}, column {column}: tab character in indentation")]
    TabIndent { line: usize, column: usize },

    #[error("line {line}: indentation of {indent} spaces is not a multiple of two")]
    OddIndent { line: usize, indent: usize },

    #[error("line {line}: indentation jumps from level {from} to level {to}")]
    IndentJump { line: usize, from: usize, to: usize },

    #[error("line {line}: indented line does not follow a block opener")]
    UnexpectedIndent { line: usize },

    #[error("line {line}, column {column}: reserved character '{ch}' in unquoted token")]
    ReservedChar { line: usize, column: usize, ch: char },

    #[error("line {line}, column {column}: unbalanced parenthesis")]
    UnbalancedParen { line: usize, column: usize },
}

impl LinoError {
    /// Line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            LinoError::UnterminatedQuote { line, .. }
            | LinoError::TabIndent { line, .. }
            | LinoError::OddIndent { line, .. }
            | LinoError::IndentJump { line, .. }
            | LinoError::UnexpectedIndent { line }
            | LinoError::ReservedChar { line, .. }
            | LinoError::UnbalancedParen { line, .. } => *line,
        }
    }

    /// Column of the error, when it points at a character.
    pub fn column(&self) -> Option<usize> {
        match self {
            LinoError::UnterminatedQuote { column, .. }
            | LinoError::TabIndent { column, .. }
            | LinoError::ReservedChar { column, .. }
            | LinoError::UnbalancedParen { column, .. } => Some(*column),
            _ => None,
        }
    }
}

/// A ranking block whose fields do not describe a ranked language.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionError {
    #[error("line {line}: duplicate block '{name}', first defined on line {first}")]
    Duplicate {
        line: usize,
        name: String,
        first: usize,
    },

    #[error("line {line}: block '{name}' has no {field} line")]
    MissingField {
        line: usize,
        name: String,
        field: &'static str,
    },

    #[error("line {line}: name '{found}' does not match block key '{key}'")]
    NameMismatch {
        line: usize,
        key: String,
        found: String,
    },

    #[error("line {line}: rank '{value}' is not a positive integer")]
    InvalidRank { line: usize, value: String },
}

impl SectionError {
    pub fn line(&self) -> usize {
        match self {
            SectionError::Duplicate { line, .. }
            | SectionError::MissingField { line, .. }
            | SectionError::NameMismatch { line, .. }
            | SectionError::InvalidRank { line, .. } => *line,
        }
    }
}

/// A parsed link.
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    /// A single bare or quoted token.
    Ref(String),
    /// A sequence of links, optionally named by a `key:` prefix.
    Group { id: Option<String>, values: Vec<Link> },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Open,
    Close,
}

#[derive(Debug)]
struct Line {
    number: usize,
    level: usize,
    id: Option<String>,
    tokens: Vec<Token>,
}

fn lex_line(number: usize, raw: &str) -> Result<Option<Line>, LinoError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let indent_end = raw
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(raw.len());
    if let Some(pos) = raw[..indent_end].find('\t') {
        return Err(LinoError::TabIndent {
            line: number,
            column: pos + 1,
        });
    }
    if indent_end % 2 != 0 {
        return Err(LinoError::OddIndent {
            line: number,
            indent: indent_end,
        });
    }

    let chars: Vec<char> = raw[indent_end..].trim_end().chars().collect();
    let column = |i: usize| indent_end + i + 1;
    let mut id = None;
    let mut tokens = Vec::new();
    let mut open_parens: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                open_parens.push(column(i));
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                if open_parens.pop().is_none() {
                    return Err(LinoError::UnbalancedParen {
                        line: number,
                        column: column(i),
                    });
                }
                tokens.push(Token::Close);
                i += 1;
            }
            '\'' | '"' | '`' => {
                let start = i;
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ch)
                    .ok_or(LinoError::UnterminatedQuote {
                        line: number,
                        column: column(start),
                        quote: ch,
                    })?;
                let text: String = chars[start + 1..start + 1 + close].iter().collect();
                i = start + close + 2;

                if chars.get(i) == Some(&':') && tokens.is_empty() && id.is_none() {
                    id = Some(text);
                    i += 1;
                } else {
                    tokens.push(Token::Word(text));
                }
            }
            _ => {
                let start = i;
                while i < chars.len()
                    && !chars[i].is_whitespace()
                    && chars[i] != '('
                    && chars[i] != ')'
                {
                    i += 1;
                }
                let mut word = &chars[start..i];
                let opens_block = word.len() > 1
                    && word.last() == Some(&':')
                    && tokens.is_empty()
                    && id.is_none();
                if opens_block {
                    word = &word[..word.len() - 1];
                }
                if let Some(offset) = word.iter().position(|c| RESERVED_CHARS.contains(c)) {
                    return Err(LinoError::ReservedChar {
                        line: number,
                        column: column(start + offset),
                        ch: word[offset],
                    });
                }

                let text: String = word.iter().collect();
                if opens_block {
                    id = Some(text);
                } else {
                    tokens.push(Token::Word(text));
                }
            }
        }
    }

    if let Some(&column) = open_parens.first() {
        return Err(LinoError::UnbalancedParen {
            line: number,
            column,
        });
    }

    Ok(Some(Line {
        number,
        level: indent_end / 2,
        id,
        tokens,
    }))
}

fn check_indentation(lines: &[Line]) -> Result<(), LinoError> {
    let mut previous: Option<&Line> = None;
    for line in lines {
        let (prev_level, opens_block) = previous
            .map(|p| (p.level, p.id.is_some()))
            .unwrap_or((0, false));

        if line.level > prev_level {
            if line.level > prev_level + 1 {
                return Err(LinoError::IndentJump {
                    line: line.number,
                    from: prev_level,
                    to: line.level,
                });
            }
            if !opens_block {
                return Err(LinoError::UnexpectedIndent { line: line.number });
            }
        }
        previous = Some(line);
    }
    Ok(())
}

fn group(tokens: &mut impl Iterator<Item = Token>) -> Vec<Link> {
    let mut values = Vec::new();
    while let Some(token) = tokens.next() {
        match token {
            Token::Word(word) => values.push(Link::Ref(word)),
            Token::Open => values.push(Link::Group {
                id: None,
                values: group(tokens),
            }),
            Token::Close => break,
        }
    }
    values
}

fn build(lines: &mut std::iter::Peekable<std::vec::IntoIter<Line>>, level: usize) -> Vec<Link> {
    let mut links = Vec::new();
    while let Some(line) = lines.next_if(|l| l.level == level) {
        let mut values = group(&mut line.tokens.into_iter());
        if lines.peek().is_some_and(|next| next.level > level) {
            values.extend(build(lines, level + 1));
        }

        let link = match (line.id, values.len()) {
            (None, 1) => values.remove(0),
            (id, _) => Link::Group { id, values },
        };
        links.push(link);
    }
    links
}

fn lex_lines(text: &str) -> Result<Vec<Line>, LinoError> {
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        if let Some(line) = lex_line(index + 1, raw)? {
            lines.push(line);
        }
    }
    check_indentation(&lines)?;
    Ok(lines)
}

/// Parse lino text into its top-level links.
pub fn parse(text: &str) -> Result<Vec<Link>, LinoError> {
    let lines = lex_lines(text)?;
    Ok(build(&mut lines.into_iter().peekable(), 0))
}

/// One line inside a ranking block: `key value...` or `key:`.
#[derive(Debug, Clone, PartialEq)]
struct Field {
    line: usize,
    key: String,
    values: Vec<String>,
}

/// One block directly under the top-level `rankings:` line.
#[derive(Debug, Clone, PartialEq)]
struct RankingSection {
    name: String,
    first_line: usize,
    fields: Vec<Field>,
}

impl RankingSection {
    fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

fn words(tokens: &[Token]) -> impl Iterator<Item = &str> {
    tokens.iter().filter_map(|t| match t {
        Token::Word(w) => Some(w.as_str()),
        _ => None,
    })
}

/// Collect the keyed blocks under `rankings:` with their direct fields.
///
/// The rankings section ends at the next line that is not indented.
fn ranking_sections(lines: &[Line]) -> Vec<RankingSection> {
    let mut sections: Vec<RankingSection> = Vec::new();
    let mut in_rankings = false;

    for line in lines {
        match line.level {
            0 => in_rankings = line.id.as_deref() == Some("rankings") && line.tokens.is_empty(),
            1 if in_rankings => {
                if let Some(ref id) = line.id {
                    sections.push(RankingSection {
                        name: id.clone(),
                        first_line: line.number,
                        fields: Vec::new(),
                    });
                }
            }
            2 if in_rankings => {
                let mut values = words(&line.tokens).map(str::to_string);
                let key = match line.id {
                    Some(ref id) => Some(id.clone()),
                    None => values.next(),
                };
                if let (Some(key), Some(section)) = (key, sections.last_mut()) {
                    section.fields.push(Field {
                        line: line.number,
                        key,
                        values: values.collect(),
                    });
                }
            }
            _ => {}
        }
    }

    sections
}

/// Check one block: unique key, a positive integer `rank`, and a `name`
/// equal to the key.
fn check_section(
    section: &RankingSection,
    seen: &mut HashMap<String, usize>,
) -> Result<(), SectionError> {
    if let Some(&first) = seen.get(&section.name) {
        return Err(SectionError::Duplicate {
            line: section.first_line,
            name: section.name.clone(),
            first,
        });
    }
    seen.insert(section.name.clone(), section.first_line);

    let missing = |field| SectionError::MissingField {
        line: section.first_line,
        name: section.name.clone(),
        field,
    };

    let rank = section.field("rank").ok_or_else(|| missing("rank"))?;
    let valid_rank = match rank.values.as_slice() {
        [value] => value.parse::<u64>().is_ok_and(|n| n > 0),
        _ => false,
    };
    if !valid_rank {
        return Err(SectionError::InvalidRank {
            line: rank.line,
            value: rank.values.join(" "),
        });
    }

    let name = section.field("name").ok_or_else(|| missing("name"))?;
    if name.values.as_slice() != [section.name.as_str()] {
        return Err(SectionError::NameMismatch {
            line: name.line,
            key: section.name.clone(),
            found: name.values.join(" "),
        });
    }

    Ok(())
}

/// A ranking block that failed its field checks.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFailure {
    pub name: String,
    /// Located in the full document.
    pub error: SectionError,
}

/// Outcome of validating a lino document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub characters: usize,
    pub lines: usize,
    pub top_level_links: usize,
    pub sections_passed: usize,
    pub failures: Vec<SectionFailure>,
}

impl ValidationReport {
    pub fn sections_total(&self) -> usize {
        self.sections_passed + self.failures.len()
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse the full document, then check every ranking block.
///
/// A syntax error in the document is returned as the error; block
/// failures are collected in the report.
pub fn validate(text: &str) -> Result<ValidationReport, LinoError> {
    let links = parse(text)?;
    let lines = lex_lines(text)?;

    let mut sections_passed = 0;
    let mut failures = Vec::new();
    let mut seen = HashMap::new();
    for section in ranking_sections(&lines) {
        match check_section(&section, &mut seen) {
            Ok(()) => sections_passed += 1,
            Err(error) => failures.push(SectionFailure {
                name: section.name,
                error,
            }),
        }
    }

    Ok(ValidationReport {
        characters: text.chars().count(),
        lines: text.split('\n').count(),
        top_level_links: links.len(),
        sections_passed,
        failures,
    })
}

/// Lines around `line`, the offending one marked with `>>>`.
pub fn error_context(text: &str, line: usize, radius: usize) -> Vec<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    if line == 0 || line > lines.len() {
        return Vec::new();
    }

    let start = line.saturating_sub(radius).max(1);
    let end = (line + radius).min(lines.len());
    (start..=end)
        .map(|n| {
            let marker = if n == line { ">>> " } else { "    " };
            format!("{}{}: {}", marker, n, lines[n - 1])
        })
        .collect()
}
