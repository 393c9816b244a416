use crate::{
    models::{ContentKind, Provenance, ResultSet},
    services::{escalator::EscalationState, validator::UniqueItems, validator::TARGET_COUNT},
};

/// Builds the final result from the merged, de-duplicated items
///
/// `items` already holds model items first and fallback items after them. The result is
/// degraded when any fallback item made it in or the escalation ran out of attempts.
pub fn assemble(kind: ContentKind, items: UniqueItems, final_state: EscalationState) -> ResultSet {
    let mut items = items.into_items();
    items.truncate(TARGET_COUNT);

    let degraded = final_state == EscalationState::Exhausted
        || items
            .iter()
            .any(|item| item.provenance == Provenance::Fallback);

    ResultSet {
        kind,
        items,
        degraded,
    }
}
