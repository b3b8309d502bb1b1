//! Threshold evaluator.
//!
//! The readiness rule is deliberately trivial: every approver slot counts
//! as exactly one unit, no weighting. It lives in its own module because it
//! is the single source of truth for quorum decisions: the signature ledger
//! consults it after each upsert and the execution coordinator re-applies
//! it as a hard gate against a freshly read count, so a stale cached status
//! can never let an under-signed proposal execute.

/// A proposal is ready once the collected signature count reaches the
/// account threshold.
pub fn ready(signature_count: u32, threshold: u32) -> bool {
    signature_count >= threshold
}

/// Builds the positional signature array the collaborator expects: one slot
/// per declared approver, `None` where that approver has not signed.
pub fn signature_slots(
    approver_count: usize,
    signatures: &[(u32, String)],
) -> Vec<Option<String>> {
    let mut slots = vec![None; approver_count];
    for (index, signature_hex) in signatures {
        if let Some(slot) = slots.get_mut(*index as usize) {
            *slot = Some(signature_hex.clone());
        }
    }
    slots
}
