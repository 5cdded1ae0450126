//! Validation and normalization for hex-encoded identifier fields.
//!
//! Hex fields match `^(0x)?[0-9a-fA-F]+$`; the stored/normalized form is
//! always lower-case and `0x`-prefixed.

use crate::error::CoreError;

/// Validates that `value` is a hex string (optionally `0x`-prefixed) and
/// returns its normalized, lower-case, `0x`-prefixed form.
pub fn normalize_hex(field: &str, value: &str) -> Result<String, CoreError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "{field} must be a hex-encoded string, got {value:?}"
        )));
    }
    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

/// Validates a 64-hex-character digest (32 bytes), as required for block
/// hashes under the signature gate.
pub fn normalize_digest_hex(field: &str, value: &str) -> Result<String, CoreError> {
    let normalized = normalize_hex(field, value)?;
    if normalized.len() != 66 {
        return Err(CoreError::Validation(format!(
            "{field} must be a 64-character hex digest, got length {}",
            normalized.len() - 2
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_without_prefix() {
        assert_eq!(normalize_hex("x", "AB12").unwrap(), "0xab12");
    }

    #[test]
    fn normalizes_with_prefix() {
        assert_eq!(normalize_hex("x", "0xAB12").unwrap(), "0xab12");
    }

    #[test]
    fn rejects_non_hex() {
        assert!(normalize_hex("x", "not-hex!").is_err());
    }

    #[test]
    fn rejects_wrong_digest_length() {
        assert!(normalize_digest_hex("hash", "0xabcd").is_err());
    }
}
