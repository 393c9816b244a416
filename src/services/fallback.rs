//! Network-free placeholder recommendations.
//!
//! Used only to fill the gap when the model produced fewer than three usable items. Seeded
//! titles are search phrases built from the user's own input, never claimed as real works.

use crate::models::{CandidateItem, ContentKind, Provenance, RecommendationRequest};
use crate::services::validator::UniqueItems;

const SEEDED_REASON: &str =
    "AI 추천을 받지 못해 입력하신 조건으로 만든 검색용 대체 항목입니다.";
const CURATED_REASON: &str = "AI 응답이 지연되어 기본 추천 목록을 보여드립니다.";

const CURATED_MOVIES: [&str; 3] = ["쇼생크 탈출", "인셉션", "라라랜드"];
const CURATED_BOOKS: [&str; 3] = ["데미안", "어린왕자", "미움받을 용기"];

/// The fixed list used when the request carries nothing to seed from
pub fn curated_titles(kind: ContentKind) -> &'static [&'static str] {
    match kind {
        ContentKind::Movie => &CURATED_MOVIES,
        ContentKind::Book => &CURATED_BOOKS,
    }
}

/// Non-empty input fields joined in a fixed order: prior work, creator, mood/genre, theme,
/// constraints
pub fn seed(request: &RecommendationRequest) -> String {
    [
        request.prior_work.as_str(),
        request.creator_name.as_str(),
        request.mood_genre.as_str(),
        request.theme.as_str(),
        request.constraints.as_str(),
    ]
    .iter()
    .map(|field| field.trim())
    .filter(|field| !field.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

fn fallback_item(title: String, reason: &str) -> CandidateItem {
    CandidateItem {
        title,
        creator: String::new(),
        year: String::new(),
        reason: reason.to_string(),
        reason_synthesized: true,
        provenance: Provenance::Fallback,
    }
}

/// Search-phrase titles derived from the seed
fn seeded_titles(request: &RecommendationRequest, seed: &str) -> Vec<String> {
    let kind = request.kind;
    let mut titles = vec![
        format!("{} similar {}", seed, kind),
        format!("{} recommended {}", seed, kind),
    ];
    let flavour = request.mood_or_theme();
    if !flavour.is_empty() {
        titles.push(format!("{} {} {}", seed, flavour, kind));
    }
    titles
}

/// Candidates in preference order
///
/// Seeded phrases come first when the request names something beyond the mandatory
/// mood/theme; the curated list always follows so there is enough to fill any gap.
pub fn candidates(request: &RecommendationRequest) -> Vec<CandidateItem> {
    let seed = seed(request);
    let mut items = Vec::new();

    if !seed.is_empty() && request.has_supplementary_input() {
        items.extend(
            seeded_titles(request, &seed)
                .into_iter()
                .map(|title| fallback_item(title, SEEDED_REASON)),
        );
    }
    items.extend(
        curated_titles(request.kind)
            .iter()
            .map(|title| fallback_item(title.to_string(), CURATED_REASON)),
    );
    items
}

/// Tops `existing` up to the target count; returns how many fallback items were added
pub fn fill(existing: &mut UniqueItems, request: &RecommendationRequest) -> usize {
    if existing.is_full() {
        return 0;
    }
    let added = existing.extend_from(candidates(request));
    if added > 0 {
        tracing::warn!(
            kind = %request.kind,
            added,
            "Filled recommendations with fallback items"
        );
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_request() -> RecommendationRequest {
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.mood_genre = "긴장감".to_string();
        request
    }

    fn titles(items: &[CandidateItem]) -> Vec<&str> {
        items.iter().map(|item| item.title.as_str()).collect()
    }

    #[test]
    fn test_seed_order_skips_empty_fields() {
        let mut request = movie_request();
        request.constraints = "15세 이하".to_string();
        request.prior_work = "기생충".to_string();

        assert_eq!(seed(&request), "기생충 긴장감 15세 이하");
    }

    #[test]
    fn test_mood_only_uses_curated_list() {
        let mut unique = UniqueItems::new();
        let added = fill(&mut unique, &movie_request());

        assert_eq!(added, 3);
        assert_eq!(titles(unique.items()), vec!["쇼생크 탈출", "인셉션", "라라랜드"]);
        assert!(unique
            .items()
            .iter()
            .all(|item| item.provenance == Provenance::Fallback && item.reason == CURATED_REASON));
    }

    #[test]
    fn test_curated_book_list() {
        let mut request = RecommendationRequest::new(ContentKind::Book);
        request.theme = "성장".to_string();

        let mut unique = UniqueItems::new();
        fill(&mut unique, &request);
        assert_eq!(titles(unique.items()), vec!["데미안", "어린왕자", "미움받을 용기"]);
    }

    #[test]
    fn test_seeded_templates() {
        let mut request = movie_request();
        request.creator_name = "봉준호".to_string();

        let mut unique = UniqueItems::new();
        fill(&mut unique, &request);

        assert_eq!(
            titles(unique.items()),
            vec![
                "봉준호 긴장감 similar movie",
                "봉준호 긴장감 recommended movie",
                "봉준호 긴장감 긴장감 movie",
            ]
        );
        assert!(unique.items().iter().all(|item| item.reason == SEEDED_REASON));
    }

    #[test]
    fn test_fill_only_tops_up_and_skips_duplicates() {
        let mut unique = UniqueItems::new();
        unique.push(CandidateItem {
            title: "인셉션".to_string(),
            creator: "Christopher Nolan".to_string(),
            year: "2010".to_string(),
            reason: "dream heist".to_string(),
            reason_synthesized: false,
            provenance: Provenance::Model,
        });

        let added = fill(&mut unique, &movie_request());

        assert_eq!(added, 2);
        assert_eq!(titles(unique.items()), vec!["인셉션", "쇼생크 탈출", "라라랜드"]);
        assert_eq!(unique.items()[0].provenance, Provenance::Model);
    }

    #[test]
    fn test_full_set_is_untouched() {
        let mut unique = UniqueItems::new();
        fill(&mut unique, &movie_request());
        assert_eq!(fill(&mut unique, &movie_request()), 0);
    }

    #[test]
    fn test_candidates_are_deterministic() {
        let mut request = movie_request();
        request.prior_work = "올드보이".to_string();
        assert_eq!(candidates(&request), candidates(&request));
    }
}
