//! Bounded retry policy around the model gateway.
//!
//! The sequence of calls is an explicit state machine:
//! `NotStarted → Attempt(1) → Attempt(2) → RepairAttempt → Exhausted`, with an early exit to
//! `Satisfied` once enough unique items have been collected. Transitions are a pure function
//! of the accumulated count, so they can be tested without any gateway.

use std::time::Duration;

use crate::{
    error::GatewayError,
    models::{RawModelResponse, RecommendationRequest},
    services::{
        parser, prompt,
        providers::{GenerationParams, ModelGateway},
        validator::UniqueItems,
    },
};

/// Sampling schedule and limits for one request
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationPolicy {
    /// First attempt; favors variety
    pub exploratory_temperature: f32,
    /// Second attempt; favors staying on format
    pub deterministic_temperature: f32,
    /// Reformatting the previous answer
    pub repair_temperature: f32,
    pub max_output_tokens: u32,
    /// Bound on each individual call
    pub attempt_timeout: Duration,
    pub repair_enabled: bool,
    /// Unique items after which no further attempt is made
    pub min_accepted: usize,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            exploratory_temperature: 0.9,
            deterministic_temperature: 0.35,
            repair_temperature: 0.1,
            max_output_tokens: 1000,
            attempt_timeout: Duration::from_secs(20),
            repair_enabled: true,
            min_accepted: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationState {
    NotStarted,
    Attempt(u8),
    RepairAttempt,
    /// Stopped early with enough items
    Satisfied,
    /// Budget spent without enough items
    Exhausted,
}

impl EscalationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EscalationState::Satisfied | EscalationState::Exhausted)
    }

    /// Sampling temperature for the call made in this state
    pub fn temperature(self, policy: &EscalationPolicy) -> Option<f32> {
        match self {
            EscalationState::Attempt(1) => Some(policy.exploratory_temperature),
            EscalationState::Attempt(_) => Some(policy.deterministic_temperature),
            EscalationState::RepairAttempt => Some(policy.repair_temperature),
            _ => None,
        }
    }

    /// State after a call in `self` left `accumulated` unique items
    ///
    /// `has_previous_text` says whether any attempt returned text that a repair could work on.
    pub fn next(
        self,
        accumulated: usize,
        policy: &EscalationPolicy,
        has_previous_text: bool,
    ) -> EscalationState {
        match self {
            EscalationState::NotStarted => EscalationState::Attempt(1),
            EscalationState::Satisfied | EscalationState::Exhausted => self,
            _ if accumulated >= policy.min_accepted => EscalationState::Satisfied,
            EscalationState::Attempt(1) => EscalationState::Attempt(2),
            EscalationState::Attempt(_) if policy.repair_enabled && has_previous_text => {
                EscalationState::RepairAttempt
            }
            EscalationState::Attempt(_) | EscalationState::RepairAttempt => {
                EscalationState::Exhausted
            }
        }
    }
}

/// Outcome of the escalation loop
#[derive(Debug)]
pub struct Escalation {
    pub items: UniqueItems,
    pub final_state: EscalationState,
    pub attempts: u8,
}

async fn call_with_timeout(
    gateway: &dyn ModelGateway,
    prompt: &prompt::Prompt,
    params: GenerationParams,
    timeout: Duration,
) -> Result<String, GatewayError> {
    match tokio::time::timeout(timeout, gateway.generate(prompt, params)).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Upstream(format!(
            "generation timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Runs attempts sequentially until enough items are collected or the budget is spent
///
/// Gateway failures count as attempts that produced nothing; they never abort the loop.
pub async fn escalate(
    gateway: &dyn ModelGateway,
    policy: &EscalationPolicy,
    request: &RecommendationRequest,
) -> Escalation {
    let mut items = UniqueItems::new();
    let mut previous: Option<RawModelResponse> = None;
    let mut attempts = 0u8;
    let mut state = EscalationState::NotStarted.next(0, policy, false);

    while !state.is_terminal() {
        let prompt = match (state, &previous) {
            (EscalationState::RepairAttempt, Some(raw)) => prompt::build_repair(request, &raw.text),
            _ => prompt::build(request),
        };
        let temperature = state
            .temperature(policy)
            .unwrap_or(policy.deterministic_temperature);
        let params = GenerationParams {
            temperature,
            max_output_tokens: policy.max_output_tokens,
        };
        attempts += 1;

        match call_with_timeout(gateway, &prompt, params, policy.attempt_timeout).await {
            Ok(text) => {
                let kept = items.extend_from(parser::parse(&text, request.kind));
                tracing::info!(
                    state = ?state,
                    temperature,
                    kept,
                    accumulated = items.len(),
                    "Generation attempt parsed"
                );
                tracing::debug!(raw = %text, "Raw model output");
                if !text.trim().is_empty() {
                    previous = Some(RawModelResponse {
                        text,
                        temperature,
                        attempt: attempts,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(
                    state = ?state,
                    temperature,
                    error = %e,
                    "Generation attempt failed"
                );
            }
        }

        state = state.next(items.len(), policy, previous.is_some());
    }

    if state == EscalationState::Exhausted {
        tracing::warn!(
            attempts,
            accumulated = items.len(),
            last_attempt_with_text = ?previous.as_ref().map(|raw| raw.attempt),
            last_text_temperature = ?previous.as_ref().map(|raw| raw.temperature),
            "Escalation exhausted"
        );
    }

    Escalation {
        items,
        final_state: state,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use crate::services::providers::MockModelGateway;
    use mockall::Sequence;

    const THREE_PICKS: &str = "기생충 | creator=봉준호 | year=2019 | reason=풍자\n\
                               올드보이 | creator=박찬욱 | year=2003 | reason=복수\n\
                               버닝 | creator=이창동 | year=2018 | reason=미스터리";

    fn request() -> RecommendationRequest {
        let mut request = RecommendationRequest::new(ContentKind::Movie);
        request.mood_genre = "긴장감".to_string();
        request
    }

    fn upstream_failure() -> GatewayError {
        GatewayError::Upstream("503 Service Unavailable".to_string())
    }

    #[test]
    fn test_transitions_on_weak_results() {
        let policy = EscalationPolicy::default();

        let mut state = EscalationState::NotStarted.next(0, &policy, false);
        assert_eq!(state, EscalationState::Attempt(1));
        state = state.next(1, &policy, true);
        assert_eq!(state, EscalationState::Attempt(2));
        state = state.next(1, &policy, true);
        assert_eq!(state, EscalationState::RepairAttempt);
        state = state.next(1, &policy, true);
        assert_eq!(state, EscalationState::Exhausted);
        assert_eq!(state.next(3, &policy, true), EscalationState::Exhausted);
    }

    #[test]
    fn test_early_stop_at_two_items() {
        let policy = EscalationPolicy::default();
        assert_eq!(
            EscalationState::Attempt(1).next(2, &policy, true),
            EscalationState::Satisfied
        );
        assert_eq!(
            EscalationState::RepairAttempt.next(2, &policy, true),
            EscalationState::Satisfied
        );
    }

    #[test]
    fn test_repair_needs_text_and_permission() {
        let policy = EscalationPolicy::default();
        assert_eq!(
            EscalationState::Attempt(2).next(0, &policy, false),
            EscalationState::Exhausted
        );

        let no_repair = EscalationPolicy {
            repair_enabled: false,
            ..EscalationPolicy::default()
        };
        assert_eq!(
            EscalationState::Attempt(2).next(0, &no_repair, true),
            EscalationState::Exhausted
        );
    }

    #[test]
    fn test_temperature_schedule_descends() {
        let policy = EscalationPolicy::default();
        let first = EscalationState::Attempt(1).temperature(&policy).unwrap();
        let second = EscalationState::Attempt(2).temperature(&policy).unwrap();
        let repair = EscalationState::RepairAttempt.temperature(&policy).unwrap();

        assert!(first > second && second > repair);
        assert!(repair < 0.2);
        assert_eq!(EscalationState::Exhausted.temperature(&policy), None);
    }

    #[tokio::test]
    async fn test_stops_after_first_good_attempt() {
        let policy = EscalationPolicy::default();
        let mut gateway = MockModelGateway::new();
        gateway
            .expect_generate()
            .withf(|_, params| params.temperature == 0.9 && params.max_output_tokens == 1000)
            .times(1)
            .returning(|_, _| Ok(THREE_PICKS.to_string()));

        let escalation = escalate(&gateway, &policy, &request()).await;

        assert_eq!(escalation.final_state, EscalationState::Satisfied);
        assert_eq!(escalation.attempts, 1);
        assert_eq!(escalation.items.len(), 3);
    }

    #[tokio::test]
    async fn test_failures_exhaust_without_repair() {
        let policy = EscalationPolicy::default();
        let mut gateway = MockModelGateway::new();
        gateway
            .expect_generate()
            .times(2)
            .returning(|_, _| Err(upstream_failure()));

        let escalation = escalate(&gateway, &policy, &request()).await;

        assert_eq!(escalation.final_state, EscalationState::Exhausted);
        assert_eq!(escalation.attempts, 2);
        assert!(escalation.items.is_empty());
    }

    #[tokio::test]
    async fn test_items_accumulate_across_attempts() {
        let policy = EscalationPolicy::default();
        let mut gateway = MockModelGateway::new();
        let mut seq = Sequence::new();

        gateway
            .expect_generate()
            .withf(|_, params| params.temperature == 0.9)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("Here you go:\n- 기생충 (감독: 봉준호)".to_string()));
        gateway
            .expect_generate()
            .withf(|_, params| params.temperature == 0.35)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(upstream_failure()));
        gateway
            .expect_generate()
            .withf(|prompt, params| {
                params.temperature == 0.1
                    && prompt.instruction.contains("Reformat")
                    && prompt.context.contains("- 기생충 (감독: 봉준호)")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("기생충 | creator=봉준호\n마더 | creator=봉준호".to_string()));

        let escalation = escalate(&gateway, &policy, &request()).await;

        assert_eq!(escalation.final_state, EscalationState::Satisfied);
        assert_eq!(escalation.attempts, 3);
        let titles: Vec<&str> = escalation
            .items
            .items()
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(titles, vec!["기생충", "마더"]);
        assert_eq!(escalation.items.items()[0].creator, "봉준호");
    }

    #[tokio::test]
    async fn test_budget_never_exceeds_three_calls() {
        let policy = EscalationPolicy::default();
        let mut gateway = MockModelGateway::new();
        gateway
            .expect_generate()
            .times(3)
            .returning(|_, _| Ok("I cannot help with that.".to_string()));

        let escalation = escalate(&gateway, &policy, &request()).await;

        assert_eq!(escalation.final_state, EscalationState::Exhausted);
        assert_eq!(escalation.attempts, 3);
    }

    struct StalledGateway;

    #[async_trait::async_trait]
    impl ModelGateway for StalledGateway {
        async fn generate(
            &self,
            _prompt: &prompt::Prompt,
            _params: GenerationParams,
        ) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(THREE_PICKS.to_string())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failed_attempt() {
        let policy = EscalationPolicy {
            attempt_timeout: Duration::from_millis(20),
            ..EscalationPolicy::default()
        };

        let escalation = escalate(&StalledGateway, &policy, &request()).await;

        assert_eq!(escalation.final_state, EscalationState::Exhausted);
        assert_eq!(escalation.attempts, 2);
        assert!(escalation.items.is_empty());
    }
}
