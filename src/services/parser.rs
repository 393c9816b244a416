//! Tolerant extraction of recommendation records from free-form model text.
//!
//! The model is asked for one `title | creator=.. | year=.. | reason=..` line per pick, but in
//! practice answers arrive fenced, numbered, as JSON, tab-separated or as "Title — Creator"
//! prose. Each layout is a [`RecordFormat`] strategy; they are tried in a fixed order and the
//! first one that accepts a record wins.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::{CandidateItem, ContentKind, Provenance};

/// Records examined per response before giving up on the rest
pub const MAX_RECORDS: usize = 20;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•·▪+]\s+|(?:\d{1,2}[.)]|\(\d{1,2}\))\s*)")
        .unwrap_or_else(|_| Regex::new("$^").unwrap())
});

static JSON_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"[A-Za-z_]+"\s*:"#).unwrap_or_else(|_| Regex::new("$^").unwrap())
});

static ROLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.+?)\s*[(（](?P<role>[^():：]{1,20})[:：]\s*(?P<name>[^()（）]+)[)）]\s*$")
        .unwrap_or_else(|_| Regex::new("$^").unwrap())
});

static DIGIT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<rest>.*?)\s*\((?P<digits>\d+)\)\s*$")
        .unwrap_or_else(|_| Regex::new("$^").unwrap())
});

/// Generic reason used when the source gave none
pub fn default_reason(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Movie => "지금 취향에 어울리는 영화로 추천합니다.",
        ContentKind::Book => "지금 취향에 어울리는 책으로 추천합니다.",
    }
}

/// Keeps a year only when it is exactly four ASCII digits
pub fn normalize_year(value: &str) -> String {
    let value = value.trim();
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        value.to_string()
    } else {
        String::new()
    }
}

/// Returns the body of the first fenced block, or the trimmed text when there is none
///
/// A fence with nothing after it is a stray closing marker; the text before it is the answer.
pub fn strip_code_fences(raw: &str) -> &str {
    let Some(start) = raw.find("```") else {
        return raw.trim();
    };
    let after_open = &raw[start + 3..];
    // Skip the language tag on the opening fence line
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    match body.trim() {
        "" => raw[..start].trim(),
        body => body,
    }
}

/// Removes a leading bullet or numbering token; reports whether one was present
pub fn strip_list_marker(record: &str) -> (&str, bool) {
    match LIST_MARKER.find(record) {
        Some(marker) => (record[marker.end()..].trim(), true),
        None => (record.trim(), false),
    }
}

/// One record, with its list marker already removed
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub text: &'a str,
    pub listed: bool,
}

/// Fields pulled out of a record, before normalization
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub title: String,
    pub creator: String,
    pub year: String,
    pub reason: String,
}

impl RecordFields {
    fn titled(title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            ..Self::default()
        }
    }
}

/// Record layouts, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `Title | creator=.. | year=.. | reason=..`
    Tagged,
    /// `Title<TAB>Creator<TAB>Year<TAB>Reason`, or untagged pipes
    Positional,
    /// `Title — Creator`, `Title - Creator`, `Title: Creator`
    Separated,
    /// `Title (director: Name)`
    RoleSuffix,
    /// A listed line holding only a title
    Bare,
}

impl RecordFormat {
    pub const ORDER: [RecordFormat; 5] = [
        RecordFormat::Tagged,
        RecordFormat::Positional,
        RecordFormat::Separated,
        RecordFormat::RoleSuffix,
        RecordFormat::Bare,
    ];

    /// Consumes the whole record or reports no match
    pub fn detect(self, record: Record<'_>) -> Option<RecordFields> {
        match self {
            RecordFormat::Tagged => detect_tagged(record.text),
            RecordFormat::Positional => detect_positional(record.text),
            RecordFormat::Separated => detect_separated(record),
            RecordFormat::RoleSuffix => detect_role_suffix(record.text),
            RecordFormat::Bare => detect_bare(record),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Title,
    Creator,
    Year,
    Reason,
}

fn split_tag(segment: &str) -> Option<(Tag, &str)> {
    let (key, value) = segment.split_once('=')?;
    let tag = match key.trim().to_lowercase().as_str() {
        "title" | "제목" => Tag::Title,
        "creator" | "author" | "director" | "감독" | "저자" | "작가" => Tag::Creator,
        "year" | "연도" => Tag::Year,
        "reason" | "이유" => Tag::Reason,
        _ => return None,
    };
    Some((tag, value.trim()))
}

fn join_reason(reason: &str, extras: &[&str]) -> String {
    std::iter::once(reason)
        .chain(extras.iter().copied())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn detect_tagged(text: &str) -> Option<RecordFields> {
    if !text.contains('|') {
        return None;
    }

    let mut segments = text.split('|').map(str::trim);
    let first = segments.next()?;
    let mut fields = match split_tag(first) {
        Some((Tag::Title, value)) => RecordFields::titled(value),
        _ => RecordFields::titled(first),
    };

    let mut tagged = false;
    let mut extras = Vec::new();
    for segment in segments.filter(|s| !s.is_empty()) {
        match split_tag(segment) {
            Some((Tag::Title, value)) if fields.title.is_empty() => {
                fields.title = value.to_string();
                tagged = true;
            }
            Some((Tag::Creator, value)) => {
                fields.creator = value.to_string();
                tagged = true;
            }
            Some((Tag::Year, value)) => {
                fields.year = value.to_string();
                tagged = true;
            }
            Some((Tag::Reason, value)) => {
                fields.reason = value.to_string();
                tagged = true;
            }
            _ => extras.push(segment),
        }
    }

    if !tagged {
        return None;
    }
    fields.reason = join_reason(&fields.reason, &extras);
    Some(fields)
}

fn detect_positional(text: &str) -> Option<RecordFields> {
    let delimiter = if text.contains('\t') { '\t' } else { '|' };
    let columns: Vec<&str> = text.split(delimiter).map(str::trim).collect();
    if columns.len() < 2 {
        return None;
    }

    let column = |i: usize| columns.get(i).copied().unwrap_or_default();
    let mut fields = RecordFields::titled(column(0));
    fields.creator = column(1).to_string();
    fields.year = column(2).to_string();
    fields.reason = join_reason(column(3), columns.get(4..).unwrap_or_default());
    Some(fields)
}

/// Separators between title and creator, strongest first
const SEPARATORS: [&str; 5] = ["—", " – ", " - ", ":", "："];

/// Separators trusted on lines without a list marker
const DASH_SEPARATORS: [&str; 3] = ["—", " – ", " - "];

/// Longest creator name accepted from an unlisted line, in words
const MAX_UNLISTED_CREATOR_WORDS: usize = 4;

/// Finds the strongest separator outside parentheses
fn find_separator(text: &str, separators: &[&str]) -> Option<(usize, usize)> {
    separators.iter().find_map(|separator| {
        let mut depth = 0i32;
        for (index, ch) in text.char_indices() {
            match ch {
                '(' | '（' | '[' => depth += 1,
                ')' | '）' | ']' => depth -= 1,
                _ if depth <= 0 && text[index..].starts_with(separator) => {
                    return Some((index, index + separator.len()));
                }
                _ => {}
            }
        }
        None
    })
}

/// A creator side that reads like a sentence, e.g. `Note: all three are on streaming.`
fn is_sentence(text: &str) -> bool {
    text.ends_with(['.', '!', '?', '。'])
        || text.split_whitespace().count() > MAX_UNLISTED_CREATOR_WORDS
}

fn detect_separated(record: Record<'_>) -> Option<RecordFields> {
    let text = record.text;
    let separators: &[&str] = if record.listed {
        &SEPARATORS
    } else {
        &DASH_SEPARATORS
    };
    let (start, end) = find_separator(text, separators)?;
    let title = text[..start].trim();
    let rest = text[end..].trim();
    if title.is_empty() || rest.is_empty() {
        return None;
    }

    let mut fields = RecordFields::titled(title);
    match find_separator(rest, &SEPARATORS) {
        Some((start, end)) => {
            fields.creator = rest[..start].trim().to_string();
            fields.reason = rest[end..].trim().to_string();
        }
        None => fields.creator = rest.to_string(),
    }

    // Unlisted prose like "I hope you enjoy these - they are classics." is not a pick
    if !record.listed && is_sentence(&fields.creator) {
        return None;
    }
    Some(fields)
}

fn detect_role_suffix(text: &str) -> Option<RecordFields> {
    let captures = ROLE_SUFFIX.captures(text)?;
    let mut fields = RecordFields::titled(&captures["title"]);
    fields.creator = captures["name"].trim().to_string();
    Some(fields)
}

fn detect_bare(record: Record<'_>) -> Option<RecordFields> {
    // Unlisted lines without structure are prose, not picks
    if !record.listed {
        return None;
    }
    Some(RecordFields::titled(record.text))
}

/// Splits a trailing all-digit parenthetical off `text`, e.g. `Parasite (2019)`
fn lift_digit_suffix(text: &str) -> (String, Option<String>) {
    match DIGIT_SUFFIX.captures(text) {
        Some(captures) => (
            captures["rest"].trim().to_string(),
            Some(captures["digits"].to_string()),
        ),
        None => (text.trim().to_string(), None),
    }
}

fn clean_title(title: &str) -> String {
    title
        .replace("**", "")
        .trim()
        .trim_matches(|c: char| "\"'“”‘’《》「」『』<>`*_".contains(c))
        .trim()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Applies the title, year and reason rules to extracted fields
pub fn finish(fields: RecordFields, kind: ContentKind) -> Option<CandidateItem> {
    let (title, title_year) = lift_digit_suffix(&clean_title(&fields.title));
    let (creator, creator_year) = lift_digit_suffix(&fields.creator.replace("**", ""));

    let title = collapse_whitespace(&title);
    if title.is_empty() {
        return None;
    }

    let year_source = if fields.year.trim().is_empty() {
        title_year.or(creator_year).unwrap_or_default()
    } else {
        fields.year
    };

    let reason = collapse_whitespace(&fields.reason);
    let reason_synthesized = reason.is_empty();

    Some(CandidateItem {
        title,
        creator: collapse_whitespace(&creator),
        year: normalize_year(&year_source),
        reason: if reason_synthesized {
            default_reason(kind).to_string()
        } else {
            reason
        },
        reason_synthesized,
        provenance: Provenance::Model,
    })
}

/// Lines that are structure rather than content: headings and JSON debris
fn is_noise(text: &str) -> bool {
    text.starts_with('#')
        || text.ends_with(':')
        || text.ends_with('：')
        || text.starts_with(['{', '}', '[', ']'])
        || JSON_KEY.is_match(text)
}

/// Parses a single record with the first matching format
pub fn parse_record(raw_record: &str, kind: ContentKind) -> Option<CandidateItem> {
    let (text, listed) = strip_list_marker(raw_record);
    if text.is_empty() || is_noise(text) {
        return None;
    }

    let record = Record { text, listed };
    RecordFormat::ORDER
        .iter()
        .find_map(|format| format.detect(record))
        .and_then(|fields| finish(fields, kind))
}

fn json_string(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match value.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn parse_json_element(value: &Value, kind: ContentKind) -> Option<CandidateItem> {
    if let Value::String(title) = value {
        return finish(RecordFields::titled(title), kind);
    }
    let fields = RecordFields {
        title: json_string(value, &["title", "name"]),
        creator: json_string(value, &["creator", "author", "director"]),
        year: json_string(value, &["year"]),
        reason: json_string(value, &["reason"]),
    };
    finish(fields, kind)
}

/// Finds a JSON array of records, either the whole text or the outermost `[...]`
fn json_array(text: &str) -> Option<Vec<Value>> {
    if let Ok(Value::Array(values)) = serde_json::from_str::<Value>(text) {
        return Some(values);
    }
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if start >= end {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Array(values)) if values.iter().any(Value::is_object) => Some(values),
        _ => None,
    }
}

enum Source<'a> {
    Json(std::iter::Take<std::vec::IntoIter<Value>>),
    Records(Box<dyn Iterator<Item = &'a str> + 'a>),
}

/// Lazily yields candidates from one model response
///
/// Unvalidated: titles may repeat. Stops after [`MAX_RECORDS`] non-blank records.
pub struct CandidateStream<'a> {
    source: Source<'a>,
    kind: ContentKind,
}

impl Iterator for CandidateStream<'_> {
    type Item = CandidateItem;

    fn next(&mut self) -> Option<CandidateItem> {
        let kind = self.kind;
        match &mut self.source {
            Source::Json(values) => values.find_map(|value| parse_json_element(&value, kind)),
            Source::Records(records) => records.find_map(|record| parse_record(record, kind)),
        }
    }
}

/// Parses raw model text into candidate records
pub fn parse(raw: &str, kind: ContentKind) -> CandidateStream<'_> {
    let body = strip_code_fences(raw);

    let source = match json_array(body) {
        Some(values) => Source::Json(values.into_iter().take(MAX_RECORDS)),
        None => Source::Records(Box::new(
            body.split(['\n', ';'])
                .filter(|record| !record.trim().is_empty())
                .take(MAX_RECORDS),
        )),
    };

    CandidateStream { source, kind }
}
