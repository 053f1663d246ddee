//! Phone canonicalization for dialable WhatsApp addresses.

/// Country code assumed for numbers that arrive without one.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Canonicalize a raw phone string into a `+`-prefixed dialable address.
///
/// Total: every input produces an address. Separators (spaces, hyphens,
/// parentheses, periods) are dropped and leading zeros stripped; anything
/// not already `+`-prefixed is coerced onto the default country code. This
/// is deliberately permissive, not validation — malformed numbers pass
/// through and fail at send time instead.
pub fn normalize(raw: &str) -> String {
    let mut phone: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')' | '.'))
        .collect();

    if phone.starts_with('0') {
        phone = phone.trim_start_matches('0').to_string();
    }

    if phone.starts_with('+') {
        return phone;
    }
    if phone.starts_with(DEFAULT_COUNTRY_CODE) && phone.len() >= 11 {
        return format!("+{}", phone);
    }
    format!("+{}{}", DEFAULT_COUNTRY_CODE, phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_prefixes_country_code() {
        assert_eq!(normalize("98765 43210"), "+919876543210");
        assert_eq!(normalize("(987) 654-3210"), "+919876543210");
        assert_eq!(normalize("98765.43210"), "+919876543210");
    }

    #[test]
    fn keeps_existing_plus_prefix_unchanged() {
        assert_eq!(normalize("+919876543210"), "+919876543210");
        assert_eq!(normalize("+1 555 123 4567"), "+15551234567");
    }

    #[test]
    fn strips_leading_zeros_before_prefixing() {
        assert_eq!(normalize("09876543210"), "+919876543210");
        assert_eq!(normalize("0098765"), "+9198765");
    }

    #[test]
    fn detects_bare_country_code_of_full_length() {
        assert_eq!(normalize("919876543210"), "+919876543210");
        // too short to be a 91-prefixed full number; treated as a local number
        assert_eq!(normalize("9198765"), "+919198765");
    }

    #[test]
    fn is_total_over_odd_inputs() {
        assert_eq!(normalize(""), "+91");
        assert_eq!(normalize("   "), "+91");
        assert_eq!(normalize("abc"), "+91abc");
        assert!(normalize("12").starts_with('+'));
    }
}
