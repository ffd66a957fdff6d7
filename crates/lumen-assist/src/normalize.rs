//! Locale-safe numeric parsing and text canonicalization.
//!
//! Catalog data mixes decimal commas ("9,6") with decimal dots ("9.6"),
//! article numbers arrive with float noise ("123456.0"), and IP codes come
//! as bare numbers, "IP67", or "67.0". Everything here degrades to a
//! sentinel instead of erroring so ranking and filtering never abort.

use serde_json::Value;

/// Fuzzy-match acceptance threshold on the 0-100 partial-ratio scale.
pub const FUZZY_THRESHOLD: f64 = 70.0;

/// Parse a numeric value that may use a decimal comma or a decimal dot.
/// Returns positive infinity on failure so unparseable values sort last
/// in ascending selections ("smallest", "most affordable") without any
/// extra filtering.
///
/// Known limitation: the comma is always treated as a decimal separator,
/// so thousands-separated integers ("1,200") parse as 1.2.
pub fn parse_float_str(s: &str) -> f64 {
    s.trim()
        .replace(',', ".")
        .parse::<f64>()
        .unwrap_or(f64::INFINITY)
}

/// Like [`parse_float_str`] but returns `None` on failure, for contexts
/// where an unparseable value must be excluded rather than sorted last
/// (capacity matching, efficiency ranking).
pub fn parse_float_opt(s: &str) -> Option<f64> {
    s.trim().replace(',', ".").parse::<f64>().ok()
}

/// Parse a JSON value as a float with the same comma/dot tolerance.
/// Lists contribute their first element.
pub fn parse_float_value(value: &Value) -> f64 {
    let scalar = match value {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    match scalar {
        Value::Number(n) => n.as_f64().unwrap_or(f64::INFINITY),
        Value::String(s) => parse_float_str(s),
        _ => f64::INFINITY,
    }
}

/// Canonicalize an article number: coerce to float, truncate the fraction,
/// stringify. Non-numeric identifiers are returned unchanged so they stay
/// comparable as plain strings. Idempotent on already-canonical input.
pub fn canonical_artnr(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => format!("{}", n.trunc() as i64),
        _ => raw.trim().to_string(),
    }
}

/// Canonicalize an IP code to the form "IP<digits>". Accepts a bare number,
/// or a string possibly prefixed "IP" and possibly carrying a decimal
/// suffix ("67.0"). Anything else is "N/A".
pub fn canonical_ip_value(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => format!("IP{}", f.trunc() as i64),
            _ => "N/A".to_string(),
        },
        Value::String(s) => canonical_ip_str(s),
        _ => "N/A".to_string(),
    }
}

/// String form of [`canonical_ip_value`]: strip an "IP" prefix and a
/// decimal suffix, keep the digit part.
pub fn canonical_ip_str(raw: &str) -> String {
    let digits = raw
        .trim()
        .trim_start_matches("IP")
        .trim_start_matches("ip")
        .split('.')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    format!("IP{}", digits)
}

/// Partial-ratio similarity on a 0-100 scale: the needle (shorter string)
/// is slid over windows of the haystack and the best normalized-Levenshtein
/// similarity wins. Windows range from needle length up to half again the
/// needle length, because an insertion inside the needle ("med" written out
/// as "medium") lengthens the matching region of the haystack; same-length
/// windows alone would misalign every character after the insertion. This
/// mirrors the behaviour of classic fuzzy partial matching, which catalog
/// text needs because of inconsistent abbreviations.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }
    let (needle, haystack) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };
    let needle_str: String = needle.iter().collect();
    let max_window = (needle.len() + needle.len() / 2).min(haystack.len());
    let mut best = 0.0f64;
    for window_len in needle.len()..=max_window {
        for start in 0..=(haystack.len() - window_len) {
            let window: String = haystack[start..start + window_len].iter().collect();
            let score = strsim::normalized_levenshtein(&needle_str, &window) * 100.0;
            if score > best {
                best = score;
            }
            if best >= 100.0 {
                return best;
            }
        }
    }
    best
}

/// Lower-case and strip commas, periods and whitespace variance, producing
/// a single-space-joined token string.
fn normalize_tokens(s: &str) -> String {
    s.to_lowercase()
        .replace([',', '.'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Token-subset match: accept when the query's token set is a subset of
/// the candidate's token set, or either normalized string contains the
/// other verbatim.
pub fn token_subset_match(query: &str, candidate: &str) -> bool {
    let norm_query = normalize_tokens(query);
    let norm_candidate = normalize_tokens(candidate);
    if norm_query.is_empty() || norm_candidate.is_empty() {
        return false;
    }
    let query_words: std::collections::HashSet<&str> = norm_query.split(' ').collect();
    let candidate_words: std::collections::HashSet<&str> = norm_candidate.split(' ').collect();
    query_words.is_subset(&candidate_words)
        || norm_candidate.contains(&norm_query)
        || norm_query.contains(&norm_candidate)
}
