//! Structured query resolver: an ordered chain of intent handlers over the
//! canonical catalog.
//!
//! Dispatch contract, preserved deliberately:
//! - Handlers are consulted in the fixed priority order of [`HANDLERS`];
//!   the first handler that both matches its trigger phrase and produces a
//!   non-empty answer wins and later handlers are not consulted.
//! - A handler whose trigger matches but whose internal preconditions fail
//!   (no numeric token, no qualifying record) returns `None` so a more
//!   specific earlier rule never masks a more general later one.
//! - When the whole chain declines the result is [`Resolution::Unresolved`],
//!   which triggers the semantic fallback pipeline.

pub mod handlers;

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::Catalog;

/// Sentinel text for an unresolved question.
pub const UNRESOLVED_ANSWER: &str = "I do not know the answer to this question.";

/// Outcome of structured resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Answer(String),
    Unresolved,
}

impl Resolution {
    /// The user-visible text, substituting the sentinel for `Unresolved`.
    pub fn into_text(self) -> String {
        match self {
            Resolution::Answer(text) => text,
            Resolution::Unresolved => UNRESOLVED_ANSWER.to_string(),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }
}

/// Domain alias table collapsed before matching, so every handler only has
/// to recognize the canonical wording.
static SYNONYMS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("drivers", "converters"),
        ("driver", "converter"),
        ("ledconverter", "converter"),
        ("led converter", "converter"),
        ("power supply", "converter"),
        ("gear", "converter"),
        ("lamps", "luminaires"),
        ("lamp", "luminaire"),
        ("pricelist", "price"),
    ]
    .into_iter()
    .map(|(alias, canonical)| {
        let re = Regex::new(&format!(r"\b{}\b", alias)).expect("synonym regex is valid");
        (re, canonical)
    })
    .collect()
});

static ARTNR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{6})\b").expect("artnr regex is valid"));
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digits regex is valid"));
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:type|model)\s*:\s*([a-z0-9\s-]+)").expect("type regex is valid")
});
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\s*v\b|\d+\s*ma\b)").expect("class regex is valid"));

/// One question, pre-processed once for the whole chain.
#[derive(Debug)]
pub struct Query {
    /// Original question text, used where digit extraction must see the
    /// untouched input.
    pub raw: String,
    /// Lower-cased, synonym-normalized copy every trigger matches against.
    pub text: String,
}

impl Query {
    pub fn new(question: &str) -> Self {
        let mut text = question.to_lowercase();
        for (re, canonical) in SYNONYMS.iter() {
            text = re.replace_all(&text, *canonical).into_owned();
        }
        Self {
            raw: question.to_string(),
            text,
        }
    }

    /// First six-digit article number in the normalized text, if any.
    pub fn artnr(&self) -> Option<&str> {
        ARTNR_RE
            .captures(&self.text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// All digit runs in the original question, in order of appearance.
    pub fn digit_runs(&self) -> Vec<&str> {
        DIGITS_RE.find_iter(&self.raw).map(|m| m.as_str()).collect()
    }

    /// Explicit "type: xyz" / "model: xyz" query, trimmed and lower-cased.
    pub fn type_query(&self) -> Option<String> {
        TYPE_RE
            .captures(&self.text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    }

    /// Voltage or current class token ("24v", "350ma"), whitespace removed.
    pub fn class_token(&self) -> Option<String> {
        CLASS_RE
            .captures(&self.text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().replace(' ', ""))
    }

    /// Whether any of the given trigger phrases occurs in the normalized text.
    pub fn mentions_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.text.contains(p))
    }
}

/// One rule in the chain: a name for logging plus the handler function.
/// The function declines with `None`; an empty answer is treated the same.
pub struct Handler {
    pub name: &'static str,
    pub run: fn(&Query, &Catalog) -> Option<String>,
}

/// The full chain in priority order. Ordering is part of the contract; new
/// intents are added by inserting at the right position, not by appending.
pub static HANDLERS: &[Handler] = &[
    Handler { name: "price", run: handlers::price },
    Handler { name: "ip_meaning_report", run: handlers::ip_meaning_report },
    Handler { name: "ip_lookup", run: handlers::ip_lookup },
    Handler { name: "lamp_compatibility", run: handlers::lamp_compatibility },
    Handler { name: "capacity_match", run: handlers::capacity_match },
    Handler { name: "lamps_for_converter", run: handlers::lamps_for_converter },
    Handler { name: "lamp_quantity", run: handlers::lamp_quantity },
    Handler { name: "known_lamp_scan", run: handlers::known_lamp_scan },
    Handler { name: "ip_dim_filter", run: handlers::ip_dim_filter },
    Handler { name: "most_efficient", run: handlers::most_efficient },
    Handler { name: "dimmability_report", run: handlers::dimmability_report },
    Handler { name: "strain_relief", run: handlers::strain_relief },
    Handler { name: "outdoor", run: handlers::outdoor },
    Handler { name: "voltage_range", run: handlers::voltage_range },
    Handler { name: "per_unit_lookup", run: handlers::per_unit_lookup },
    Handler { name: "smallest", run: handlers::smallest },
    Handler { name: "compact_filter", run: handlers::compact_filter },
    Handler { name: "for_each_report", run: handlers::for_each_report },
    Handler { name: "compare", run: handlers::compare },
    Handler { name: "ip_listing", run: handlers::ip_listing },
    Handler { name: "class_listing", run: handlers::class_listing },
    Handler { name: "show_all_class", run: handlers::show_all_class },
    Handler { name: "lifecycle", run: handlers::lifecycle },
    Handler { name: "canned_comparisons", run: handlers::canned_comparisons },
];

/// Run the chain. First non-empty answer wins; a fully declined question is
/// `Unresolved` and falls through to semantic retrieval + generation.
pub fn resolve(question: &str, catalog: &Catalog) -> Resolution {
    let query = Query::new(question);
    for handler in HANDLERS {
        if let Some(answer) = (handler.run)(&query, catalog) {
            if !answer.trim().is_empty() {
                tracing::debug!(handler = handler.name, "structured handler answered");
                return Resolution::Answer(answer);
            }
        }
    }
    tracing::debug!("no structured handler matched; falling back");
    Resolution::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture_catalog() -> Catalog {
        let raw = json!({
            "C1": {
                "TYPE": "24V DC",
                "ARTNR": "123456.0",
                "CONVERTER DESCRIPTION:": "LED CONVERTER 24V DC 100W IP20",
                "STRAIN RELIEF": "Yes",
                "LOCATION": "indoor",
                "DIMMABILITY": "1-10V",
                "EFFICIENCY @full load": "0,87",
                "OUTPUT VOLTAGE (V)": "24",
                "NOM. INPUT VOLTAGE (V)": "220-240Vac",
                "SIZE: L*B*H (mm)": "160*43*30",
                "Gross Weight": "0,35",
                "Listprice": 45.50,
                "lamps": { "LEDLINE 9.6W": { "min": 1, "max": 20 } },
                "pdf_link": "https://example.com/c1.pdf",
                "IP": 67,
                "CLASS": "II",
                "LifeCycle": "A",
                "Name": "CONV 24V 100W"
            },
            "C2": {
                "TYPE": "350mA",
                "ARTNR": 234567,
                "CONVERTER DESCRIPTION:": "LED CONVERTER 350mA 20W IP20",
                "STRAIN RELIEF": "No",
                "LOCATION": "in&outdoor",
                "DIMMABILITY": "DALI",
                "EFFICIENCY @full load": "0,91",
                "OUTPUT VOLTAGE (V)": "2-55",
                "NOM. INPUT VOLTAGE (V)": "198-264Vac",
                "SIZE: L*B*H (mm)": "95*30*22",
                "Gross Weight": "0,18",
                "Listprice": "29,90",
                "lamps": { "SPOT 3W": { "min": 1, "max": 6 } },
                "IP": "IP20",
                "CLASS": "III",
                "LifeCycle": "E",
                "Name": "CONV 350MA 20W"
            }
        });
        Catalog::from_raw(raw.as_object().unwrap())
    }

    #[test]
    fn synonym_normalization_rewrites_aliases() {
        let q = Query::new("Which LED converter driver supports these lamps?");
        assert!(q.text.contains("converter converter"));
        assert!(q.text.contains("luminaires"));
        assert!(!q.text.contains("driver"));
    }

    #[test]
    fn price_by_artnr_end_to_end() {
        let catalog = fixture_catalog();
        let resolution = resolve("what is the price of 123456", &catalog);
        let Resolution::Answer(text) = resolution else {
            panic!("price handler must answer");
        };
        assert!(text.contains("45.50"));
        assert!(text.contains("123456"));
    }

    #[test]
    fn ip_rating_by_artnr_end_to_end() {
        let catalog = fixture_catalog();
        let answer = resolve("what is the IP rating of 123456", &catalog).into_text();
        assert!(answer.contains("IP67"));
    }

    #[test]
    fn unrecognized_question_is_unresolved() {
        let catalog = fixture_catalog();
        assert!(resolve("tell me a joke", &catalog).is_unresolved());
        assert_eq!(
            resolve("tell me a joke", &catalog).into_text(),
            UNRESOLVED_ANSWER
        );
    }

    #[test]
    fn capacity_match_end_to_end() {
        let catalog = fixture_catalog();
        let answer = resolve("10 x LEDLINE 9.6W", &catalog).into_text();
        assert!(answer.contains("LED CONVERTER 24V DC 100W IP20"));
        assert!(answer.contains("123456"));
    }

    #[test]
    fn capacity_match_respects_maximum() {
        let catalog = fixture_catalog();
        // 30 > max of 20, and no other entry fits: the chain falls through.
        assert!(resolve("30 x LEDLINE 9.6W", &catalog).is_unresolved());
    }

    #[test]
    fn failed_precondition_falls_through_to_later_handler() {
        let catalog = fixture_catalog();
        // "weight" triggers the per-unit lookup, but without an article
        // number it declines and the aggregate report answers instead.
        let answer = resolve("gross weight of each converter", &catalog).into_text();
        assert!(answer.contains("LED CONVERTER 24V DC 100W IP20"));
        assert!(answer.contains("LED CONVERTER 350mA 20W IP20"));

        // With an article number the earlier per-unit handler wins.
        let answer = resolve("what is the weight of 123456", &catalog).into_text();
        assert!(answer.contains("0,35"));
        assert!(!answer.contains("350mA"));
    }

    #[test]
    fn fuzzy_compatibility_includes_above_threshold_only() {
        let catalog = fixture_catalog();
        let answer = resolve("which converters work with LEDLINE 9.6W", &catalog).into_text();
        assert!(answer.contains("123456"));

        // Unrelated lamp name: the compatibility handler declines and the
        // question ends unresolved.
        assert!(resolve("which converters work with quartz halogen spot", &catalog).is_unresolved());
    }

    #[test]
    fn most_efficient_ranks_parseable_values() {
        let catalog = fixture_catalog();
        let answer = resolve("which is the most efficient converter?", &catalog).into_text();
        assert!(answer.contains("350mA"));

        let scoped = resolve("most efficient 24v converter", &catalog).into_text();
        assert!(scoped.contains("24V DC 100W"));
    }

    #[test]
    fn dimmability_report_counts_rows() {
        let catalog = fixture_catalog();
        let answer = resolve("which converters are dimmable?", &catalog).into_text();
        assert!(answer.contains("Found 2 dimmable converter(s) out of 2 total"));
    }

    #[test]
    fn strain_relief_lists_only_flagged_products() {
        let catalog = fixture_catalog();
        let answer = resolve("which converters have strain relief?", &catalog).into_text();
        assert!(answer.contains("123456"));
        assert!(!answer.contains("234567"));
    }

    #[test]
    fn show_all_class_listing() {
        let catalog = fixture_catalog();
        let answer = resolve("show me all 350ma converters", &catalog).into_text();
        assert!(answer.contains("350mA 20W"));
        assert!(!answer.contains("24V DC 100W"));
    }

    #[test]
    fn lifecycle_filter_reports_active_products() {
        let catalog = fixture_catalog();
        let answer = resolve("which converters are active in the lifecycle?", &catalog).into_text();
        assert!(answer.contains("123456"));
        assert!(!answer.contains("234567"));
    }

    #[test]
    fn canned_comparison_24v_vs_48v() {
        let catalog = fixture_catalog();
        let answer =
            resolve("what is the difference between 24v and 48v converters?", &catalog).into_text();
        assert!(answer.contains("48V converters can deliver the same power at half the current"));
    }

    #[test]
    fn compare_two_article_numbers() {
        let catalog = fixture_catalog();
        let answer = resolve("compare 123456 and 234567", &catalog).into_text();
        assert!(answer.contains("1-10V"));
        assert!(answer.contains("DALI"));
    }

    #[test]
    fn datasheet_lookup_by_artnr() {
        let catalog = fixture_catalog();
        let answer = resolve("where is the datasheet for 123456?", &catalog).into_text();
        assert!(answer.contains("https://example.com/c1.pdf"));
    }
}
