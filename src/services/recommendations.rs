use crate::{
    models::{RecommendationRequest, ResultSet},
    services::{
        assembler,
        escalator::{self, EscalationPolicy},
        fallback,
        providers::ModelGateway,
    },
};

/// Generates between one and three recommendations for a validated request
///
/// Runs the escalation loop against the model, tops the result up with fallback items when
/// it is short, and assembles the bounded result. Upstream trouble only shows up as the
/// `degraded` flag; this function has no failure path.
pub async fn recommend(
    gateway: &dyn ModelGateway,
    policy: &EscalationPolicy,
    request: &RecommendationRequest,
) -> ResultSet {
    tracing::info!(
        kind = %request.kind,
        provider = gateway.name(),
        has_prior_work = !request.prior_work.is_empty(),
        has_creator = !request.creator_name.is_empty(),
        has_constraints = !request.constraints.is_empty(),
        "Generating recommendations"
    );

    let escalation = escalator::escalate(gateway, policy, request).await;
    let mut items = escalation.items;
    fallback::fill(&mut items, request);

    let result = assembler::assemble(request.kind, items, escalation.final_state);

    tracing::info!(
        kind = %result.kind,
        attempts = escalation.attempts,
        count = result.items.len(),
        degraded = result.degraded,
        "Recommendations ready"
    );

    result
}
