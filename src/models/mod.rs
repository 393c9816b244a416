use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

pub mod gemini;

/// Kind of work being recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Book,
}

impl ContentKind {
    /// Parses the wire value; anything outside `movie`/`book` is rejected
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "movie" => Some(ContentKind::Movie),
            "book" => Some(ContentKind::Book),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Book => "book",
        }
    }

    /// Label for the person credited with a work of this kind
    pub fn creator_role(&self) -> &'static str {
        match self {
            ContentKind::Movie => "director",
            ContentKind::Book => "author",
        }
    }

    /// Label for the work the user already enjoyed
    pub fn prior_work_label(&self) -> &'static str {
        match self {
            ContentKind::Movie => "previously watched movie",
            ContentKind::Book => "previously read book",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inbound JSON body, before validation
///
/// Field names differ between front-end revisions (`mode`/`kind`, `watched`/`priorWork`),
/// so both spellings are accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationPayload {
    #[serde(default, alias = "mode")]
    pub kind: Option<String>,
    #[serde(default, alias = "mood_genre")]
    pub mood_genre: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default, alias = "watched", alias = "prior_work")]
    pub prior_work: Option<String>,
    #[serde(default, alias = "creator_name")]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub constraints: Option<String>,
}

/// A validated preference profile. Empty strings mean "not supplied".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub kind: ContentKind,
    pub mood_genre: String,
    pub theme: String,
    pub prior_work: String,
    pub creator_name: String,
    pub constraints: String,
}

impl RecommendationRequest {
    /// Creates a request with only the kind set
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            mood_genre: String::new(),
            theme: String::new(),
            prior_work: String::new(),
            creator_name: String::new(),
            constraints: String::new(),
        }
    }

    /// Mood/genre when given, otherwise the theme
    pub fn mood_or_theme(&self) -> &str {
        if self.mood_genre.is_empty() {
            &self.theme
        } else {
            &self.mood_genre
        }
    }

    /// Whether anything beyond the mandatory mood/theme was supplied
    pub fn has_supplementary_input(&self) -> bool {
        !self.prior_work.is_empty() || !self.creator_name.is_empty() || !self.constraints.is_empty()
    }
}

impl TryFrom<RecommendationPayload> for RecommendationRequest {
    type Error = AppError;

    fn try_from(payload: RecommendationPayload) -> AppResult<Self> {
        let kind = payload
            .kind
            .as_deref()
            .and_then(ContentKind::parse)
            .ok_or_else(|| AppError::InvalidInput("kind must be 'movie' or 'book'".to_string()))?;

        let clean = |field: Option<String>| field.map(|v| v.trim().to_string()).unwrap_or_default();

        let request = Self {
            kind,
            mood_genre: clean(payload.mood_genre),
            theme: clean(payload.theme),
            prior_work: clean(payload.prior_work),
            creator_name: clean(payload.creator_name),
            constraints: clean(payload.constraints),
        };

        if request.mood_genre.is_empty() && request.theme.is_empty() {
            return Err(AppError::InvalidInput(
                "at least one of moodGenre or theme is required".to_string(),
            ));
        }

        Ok(request)
    }
}

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Model,
    Fallback,
}

/// A single recommendation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub creator: String,
    /// Empty, or exactly four ASCII digits
    pub year: String,
    pub reason: String,
    /// True when `reason` was filled in because the source had none
    pub reason_synthesized: bool,
    pub provenance: Provenance,
}

impl CandidateItem {
    /// Case-insensitive identity used for de-duplication
    pub fn title_key(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

/// Text returned by one generation attempt
#[derive(Debug, Clone)]
pub struct RawModelResponse {
    pub text: String,
    pub temperature: f32,
    pub attempt: u8,
}

/// The bounded, de-duplicated answer to one request
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub kind: ContentKind,
    pub items: Vec<CandidateItem>,
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> RecommendationPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ContentKind::parse("movie"), Some(ContentKind::Movie));
        assert_eq!(ContentKind::parse("book"), Some(ContentKind::Book));
        assert_eq!(ContentKind::parse("tv"), None);
        assert_eq!(ContentKind::parse("Movie"), None);
    }

    #[test]
    fn test_request_trims_fields() {
        let request = RecommendationRequest::try_from(payload(serde_json::json!({
            "kind": "book",
            "moodGenre": "  잔잔한  ",
            "creatorName": " 한강 "
        })))
        .unwrap();

        assert_eq!(request.kind, ContentKind::Book);
        assert_eq!(request.mood_genre, "잔잔한");
        assert_eq!(request.creator_name, "한강");
        assert_eq!(request.theme, "");
    }

    #[test]
    fn test_request_accepts_legacy_field_names() {
        let request = RecommendationRequest::try_from(payload(serde_json::json!({
            "mode": "movie",
            "theme": "family",
            "watched": "기생충"
        })))
        .unwrap();

        assert_eq!(request.kind, ContentKind::Movie);
        assert_eq!(request.prior_work, "기생충");
    }

    #[test]
    fn test_request_rejects_missing_or_unknown_kind() {
        let missing = RecommendationRequest::try_from(payload(serde_json::json!({
            "theme": "space"
        })));
        assert!(matches!(missing, Err(AppError::InvalidInput(_))));

        let unknown = RecommendationRequest::try_from(payload(serde_json::json!({
            "kind": "podcast",
            "theme": "space"
        })));
        assert!(matches!(unknown, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_request_requires_mood_or_theme() {
        let result = RecommendationRequest::try_from(payload(serde_json::json!({
            "kind": "movie",
            "moodGenre": "   ",
            "creatorName": "Bong Joon-ho"
        })));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_mood_or_theme_prefers_mood() {
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.theme = "time travel".to_string();
        assert_eq!(request.mood_or_theme(), "time travel");

        request.mood_genre = "tense".to_string();
        assert_eq!(request.mood_or_theme(), "tense");
    }
}
