use crate::models::{ContentKind, RecommendationRequest};

const UNSPECIFIED: &str = "(unspecified)";

/// Model-facing text for one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Output grammar and relevance rules
    pub instruction: String,
    /// The user's preferences, one field per line
    pub context: String,
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() {
        UNSPECIFIED
    } else {
        value
    }
}

fn output_grammar(kind: ContentKind) -> String {
    format!(
        "Output exactly 3 lines and nothing else. Each line is one recommendation in this layout:\n\
         <title> | {role}=<name> | year=<YYYY> | reason=<one sentence>\n\
         Do not number the lines, do not use code fences, do not add commentary.\n\
         Leave year= empty when you are not sure of the four-digit release year.",
        role = kind.creator_role()
    )
}

/// Builds the instruction and context blocks for a first or second attempt
pub fn build(request: &RecommendationRequest) -> Prompt {
    let kind = request.kind;
    let mut rules = vec![
        "Recommend only works that actually exist. Never invent titles.".to_string(),
        "Write the reason in Korean.".to_string(),
        "Fields marked (unspecified) carry no preference; do not guess a value for them."
            .to_string(),
    ];

    if !request.prior_work.is_empty() {
        rules.push(format!(
            "The user liked \"{}\". Every pick must be similar to it in genre, mood and pacing.",
            request.prior_work
        ));
    }
    if !request.creator_name.is_empty() {
        rules.push(format!(
            "Prefer including a work by {} ({}). Otherwise explain the stylistic match to them in the reason.",
            request.creator_name,
            kind.creator_role()
        ));
    }

    let numbered = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect::<Vec<_>>()
        .join("\n");

    let instruction = format!(
        "You are an expert {kind} recommender. Suggest 3 {kind}s that fit the user's taste.\n\n\
         [Format]\n{grammar}\n\n[Rules]\n{numbered}",
        grammar = output_grammar(kind),
    );

    Prompt {
        instruction,
        context: context_block(request),
    }
}

/// Builds a stricter prompt asking the model to reformat its previous answer
pub fn build_repair(request: &RecommendationRequest, previous: &str) -> Prompt {
    let instruction = format!(
        "Your previous answer could not be read. Reformat it into the required layout.\n\
         Keep the same {kind}s; only fix the layout. If it has fewer than 3 usable {kind}s, \
         add real ones that fit the preferences below.\n\n[Format]\n{grammar}",
        kind = request.kind,
        grammar = output_grammar(request.kind),
    );

    Prompt {
        instruction,
        context: format!(
            "{}\n\n[Previous answer]\n{}",
            context_block(request),
            previous.trim()
        ),
    }
}

fn context_block(request: &RecommendationRequest) -> String {
    let kind = request.kind;
    [
        format!("- kind: {}", kind),
        format!("- mood/genre: {}", or_unspecified(&request.mood_genre)),
        format!("- theme: {}", or_unspecified(&request.theme)),
        format!(
            "- {}: {}",
            kind.prior_work_label(),
            or_unspecified(&request.prior_work)
        ),
        format!(
            "- {}: {}",
            kind.creator_role(),
            or_unspecified(&request.creator_name)
        ),
        format!("- constraints: {}", or_unspecified(&request.constraints)),
    ]
    .join("\n")
}
