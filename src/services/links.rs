use url::Url;

use crate::models::{CandidateItem, ContentKind};

const YOUTUBE_SEARCH_URL: &str = "https://www.youtube.com/results";
const KYOBO_SEARCH_URL: &str = "https://search.kyobobook.co.kr/search";
const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";
const TRAILER_SUFFIX: &str = "예고편";

/// Search phrase for an item: title and creator, optionally the year
pub fn search_query(item: &CandidateItem, include_year: bool) -> String {
    let year = if include_year { item.year.as_str() } else { "" };
    [item.title.as_str(), item.creator.as_str(), year]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn with_query(base: &str, key: &str, value: &str) -> String {
    Url::parse_with_params(base, &[(key, value)])
        .map(String::from)
        .unwrap_or_default()
}

/// Where to look the item up: trailer search for movies, book store search for books
pub fn external_url(kind: ContentKind, query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    match kind {
        ContentKind::Movie => with_query(
            YOUTUBE_SEARCH_URL,
            "search_query",
            &format!("{} {}", query, TRAILER_SUFFIX),
        ),
        ContentKind::Book => with_query(KYOBO_SEARCH_URL, "keyword", query),
    }
}

/// General web search for the item
pub fn detail_url(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    with_query(GOOGLE_SEARCH_URL, "q", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn item(title: &str, creator: &str, year: &str) -> CandidateItem {
        CandidateItem {
            title: title.to_string(),
            creator: creator.to_string(),
            year: year.to_string(),
            reason: String::new(),
            reason_synthesized: true,
            provenance: Provenance::Model,
        }
    }

    #[test]
    fn test_search_query_skips_empty_parts() {
        assert_eq!(search_query(&item("Dune", "", "2021"), false), "Dune");
        assert_eq!(search_query(&item("Dune", "", "2021"), true), "Dune 2021");
        assert_eq!(
            search_query(&item("Dune", "Denis Villeneuve", ""), true),
            "Dune Denis Villeneuve"
        );
    }

    #[test]
    fn test_urls_are_encoded() {
        let url = detail_url("Dune & Arrival?");
        assert!(url.starts_with("https://www.google.com/search?q="));
        assert!(!url.contains(' '));
        assert!(url.contains("%26"));
        assert!(url.contains("%3F"));
    }

    #[test]
    fn test_spaces_use_form_encoding() {
        assert_eq!(
            detail_url("기생충 봉준호"),
            "https://www.google.com/search?q=%EA%B8%B0%EC%83%9D%EC%B6%A9+%EB%B4%89%EC%A4%80%ED%98%B8"
        );
    }

    #[test]
    fn test_external_url_by_kind() {
        let movie = external_url(ContentKind::Movie, "기생충 봉준호");
        let parsed = Url::parse(&movie).unwrap();
        assert_eq!(parsed.host_str(), Some("www.youtube.com"));
        let (key, value) = parsed.query_pairs().next().unwrap();
        assert_eq!(key, "search_query");
        assert_eq!(value, "기생충 봉준호 예고편");

        let book = external_url(ContentKind::Book, "데미안");
        let parsed = Url::parse(&book).unwrap();
        assert_eq!(parsed.host_str(), Some("search.kyobobook.co.kr"));
        assert_eq!(parsed.query_pairs().next().unwrap().1, "데미안");
    }

    #[test]
    fn test_empty_query_has_no_links() {
        assert_eq!(external_url(ContentKind::Movie, ""), "");
        assert_eq!(detail_url(""), "");
    }
}
