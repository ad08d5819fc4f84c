//! Phone number normalization.
//!
//! Customer phone numbers were stored in three shapes over time: bare
//! national digits (`5551234567`), digits with the country code
//! (`15551234567`), and whatever the sender typed. Lookups therefore probe
//! every candidate form instead of a single canonical one.

/// Strip everything but ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Stored representations to probe for a sender, without duplicates.
///
/// For digits `d` the forms are `d`, `d` with one leading `1` removed, and
/// `1` + that national form. A sender with no digits has no candidates.
pub fn candidates(raw: &str) -> Vec<String> {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return Vec::new();
    }

    let national = digits.strip_prefix('1').unwrap_or(&digits).to_string();
    let with_country = format!("1{national}");

    let mut forms = Vec::with_capacity(3);
    for form in [digits, national, with_country] {
        if !form.is_empty() && !forms.contains(&form) {
            forms.push(form);
        }
    }
    forms
}

/// E.164 form for outbound messages, assuming North American numbers.
pub fn to_e164(raw: &str) -> String {
    let digits = digits_only(raw);
    if digits.starts_with('1') {
        format!("+{digits}")
    } else {
        format!("+1{digits}")
    }
}
