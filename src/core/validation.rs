//! Input validation helpers shared by the registry and the signature ledger.

use crate::core::errors::MultisigError;

/// Canonical form of an approver public key: lowercase hex without the
/// optional `0x` prefix. Signature slots are matched on this form.
pub fn normalize_public_key(key: &str) -> String {
    let trimmed = key.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    stripped.to_ascii_lowercase()
}

/// Case-insensitive, `0x`-prefix-insensitive key equality.
pub fn keys_match(expected: &str, supplied: &str) -> bool {
    normalize_public_key(expected) == normalize_public_key(supplied)
}

/// Syntactic check only: the key must be non-empty, even-length hex.
/// Cryptographic validity is the execution collaborator's concern.
pub fn validate_public_key(key: &str) -> Result<(), MultisigError> {
    let normalized = normalize_public_key(key);
    if normalized.is_empty() || hex::decode(&normalized).is_err() {
        return Err(MultisigError::Validation(format!(
            "invalid public key: {}",
            key
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: u64) -> Result<(), MultisigError> {
    if amount < 1 {
        return Err(MultisigError::Validation(
            "amount must be at least 1".to_string(),
        ));
    }
    Ok(())
}
