//! The intent handlers, in the order declared by [`super::HANDLERS`].
//!
//! Every handler follows the same shape: check the trigger phrase against
//! the normalized question, extract what it needs, and return `None` the
//! moment a precondition fails so the chain keeps going. Messages that
//! *are* answers ("No converter found with ARTNR ...") are only produced
//! once the intent is unambiguous.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::Catalog;
use crate::normalize::{
    canonical_artnr, parse_float_str, partial_ratio, token_subset_match, FUZZY_THRESHOLD,
};
use crate::types::{CanonicalProduct, NOT_AVAILABLE};

use super::Query;

static LAMP_FOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:compatible with|work with|for)\s+([a-z0-9][a-z0-9\s.,-]*)")
        .expect("lamp-for regex is valid")
});
static NX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*x\s*([\w\s,.*-]+)").expect("n-x regex is valid"));
static CONVERTER_NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:converter|for|with)\s*(\d+)").expect("converter-number regex is valid")
});
static LAMP_QTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"how many ([\w.]+) luminaires?.*converter\s*(\d+)")
        .expect("lamp-quantity regex is valid")
});
static IP_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ip\s*(\d{2})").expect("ip-code regex is valid"));
static DIM_KIND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(1-10v|dali|touchdim|casambi|mains\s*dim)").expect("dim-kind regex is valid")
});
static PRICE_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"€\s*(\d+(?:[.,]\d+)?)").expect("price-limit regex is valid")
});

/// Fixed meanings for the IP codes occurring in the catalog.
const IP_MEANINGS: &[(&str, &str)] = &[
    (
        "IP20",
        "Protected against solid foreign objects >=12mm (e.g. fingers), no protection \
         against water. Suitable for indoor use in protected environments like cabinets.",
    ),
    (
        "IP54",
        "Protected against limited dust ingress and water splashes from any direction. \
         Suitable for outdoor use in sheltered locations.",
    ),
    (
        "IP65",
        "Dust-tight and protected against low-pressure water jets. Suitable for outdoor use.",
    ),
    (
        "IP66",
        "Dust-tight and protected against powerful water jets. Suitable for outdoor use \
         in harsh environments.",
    ),
    (
        "IP67",
        "Dust-tight and protected against temporary immersion in water. Suitable for \
         outdoor use, even in harsh environments.",
    ),
];

// ---------------------------------------------------------------------------
// Shared formatting helpers
// ---------------------------------------------------------------------------

fn product_line(product: &CanonicalProduct) -> String {
    format!(
        "{} (ARTNR: {})",
        product.description,
        product.canonical_artnr()
    )
}

fn markdown_table(header: &[&str], rows: &[String]) -> String {
    let head = format!("| {} |", header.join(" | "));
    let sep = format!(
        "|{}|",
        header.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    );
    let mut out = format!("{}\n{}", head, sep);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn type_matches(product: &CanonicalProduct, class: &str) -> bool {
    let wanted = class.to_lowercase().replace(' ', "");
    product
        .type_code
        .to_lowercase()
        .replace(' ', "")
        .contains(&wanted)
}

fn display_price(product: &CanonicalProduct) -> String {
    match product.price() {
        Some(value) => format!("€{:.2}", value),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// First length dimension of the "L*B*H" size string, in millimeters.
/// Unparseable sizes yield infinity so they sort last.
fn first_dimension_mm(product: &CanonicalProduct) -> f64 {
    let cleaned = product.size.replace(' ', "");
    let first = cleaned.split('*').next().unwrap_or("");
    parse_float_str(first)
}

fn is_dimmable(product: &CanonicalProduct) -> bool {
    let dim = product.dimmability.to_uppercase();
    // "NOT DIMMABLE" contains "DIM"; rule that out before keyword checks.
    if dim.contains("NOT") || dim == NOT_AVAILABLE {
        return false;
    }
    ["DIM", "1-10V", "DALI", "CASAMBI", "TOUCHDIM"]
        .iter()
        .any(|kind| dim.contains(kind))
}

/// The token-subset recommendation table shared by the lamp-scan paths.
fn recommend_converters_for_lamp(lamp_query: &str, catalog: &Catalog) -> Option<String> {
    let mut rows = Vec::new();
    for product in catalog.values() {
        for (lamp_name, range) in &product.lamps {
            if token_subset_match(lamp_query, lamp_name) {
                rows.push(format!(
                    "| {} | {} | {}–{} | {} |",
                    product.description,
                    product.canonical_artnr(),
                    range.min,
                    range.max,
                    lamp_name
                ));
            }
        }
    }
    if rows.is_empty() {
        return None;
    }
    let table = markdown_table(
        &["Converter Description", "ARTNR", "Supported Range", "Lamp Type"],
        &rows,
    );
    Some(format!(
        "## Recommended Converters for '{}'\n\n{}\n\n\
         *Note: Values represent the supported quantity or length range for the lamp type.*",
        lamp_query, table
    ))
}

// ---------------------------------------------------------------------------
// Handlers, in chain order
// ---------------------------------------------------------------------------

/// Price lookup: by article number, "most affordable", "below €N", or by
/// explicit type substring. A price trigger with none of these yields a
/// guidance answer rather than falling through, because no later handler
/// has a price interpretation.
pub fn price(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["price", "cost", "affordable"]) {
        return None;
    }

    if let Some(artnr) = q.artnr() {
        let artnr = canonical_artnr(artnr);
        return Some(match catalog.by_artnr(&artnr) {
            Some(product) => match product.price() {
                Some(value) => format!(
                    "The price for the converter with ARTNR {} is: €{:.2}",
                    artnr, value
                ),
                None => format!(
                    "No price information available for converter with ARTNR {}.",
                    artnr
                ),
            },
            None => format!("No converter found with ARTNR {}.", artnr),
        });
    }

    if q.text.contains("most affordable") {
        let class = q.class_token();
        let cheapest = catalog
            .values()
            .filter(|p| class.as_deref().is_none_or(|c| type_matches(p, c)))
            .filter(|p| p.price().is_some())
            .min_by(|a, b| {
                a.price()
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.price().unwrap_or(f64::INFINITY))
            })?;
        let scope = class.map(|c| format!(" {}", c.to_uppercase())).unwrap_or_default();
        return Some(format!(
            "Most affordable{} converter: {}, price: {}",
            scope,
            product_line(cheapest),
            display_price(cheapest)
        ));
    }

    if q.text.contains("below") {
        let limit = PRICE_LIMIT_RE
            .captures(&q.raw)
            .and_then(|c| c.get(1))
            .map(|m| parse_float_str(m.as_str()))
            .filter(|v| v.is_finite())
            .unwrap_or(65.0);
        let class = q.class_token();
        let lines: Vec<String> = catalog
            .values()
            .filter(|p| class.as_deref().is_none_or(|c| type_matches(p, c)))
            .filter(|p| p.price().is_some_and(|v| v < limit))
            .map(|p| format!("{}, price: {}", product_line(p), display_price(p)))
            .collect();
        if lines.is_empty() {
            return None;
        }
        return Some(lines.join("\n"));
    }

    if let Some(type_query) = q.type_query() {
        let lines: Vec<String> = catalog
            .values()
            .filter(|p| p.type_code.to_lowercase().contains(&type_query))
            .map(|p| format!("{}: {}", product_line(p), display_price(p)))
            .collect();
        return Some(if lines.is_empty() {
            format!("No converters found for type: {}", type_query)
        } else {
            lines.join("\n")
        });
    }

    Some("Please provide a valid ARTNR (6 digits) or converter type.".to_string())
}

/// "IP rating for each converter and what does it mean": per-row IP code
/// plus the fixed installation-guidance table.
pub fn ip_meaning_report(q: &Query, catalog: &Catalog) -> Option<String> {
    if !(q.text.contains("ip rating for each converter") && q.text.contains("what does it mean")) {
        return None;
    }
    let mut lines = vec!["IP rating for each converter and installation meaning:".to_string()];
    for product in catalog.values() {
        let ip = product.canonical_ip();
        let meaning = IP_MEANINGS
            .iter()
            .find(|(code, _)| *code == ip)
            .map(|(_, meaning)| *meaning)
            .unwrap_or("No specific installation guidance available.");
        lines.push(format!("{}: {} – {}", product.description, ip, meaning));
    }
    if lines.len() == 1 {
        return None;
    }
    Some(lines.join("\n"))
}

/// IP rating by article number or by explicit type substring. Without
/// either, control passes on (the distinct-ratings listing sits later in
/// the chain).
pub fn ip_lookup(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["ip rating", "ip protection"]) {
        return None;
    }
    if let Some(artnr) = q.artnr() {
        let artnr = canonical_artnr(artnr);
        return Some(match catalog.by_artnr(&artnr) {
            Some(product) => format!(
                "The IP rating for the converter with ARTNR {} is: {}",
                artnr,
                product.canonical_ip()
            ),
            None => format!("No converter found with ARTNR {}.", artnr),
        });
    }
    if let Some(type_query) = q.type_query() {
        let lines: Vec<String> = catalog
            .values()
            .filter(|p| p.type_code.to_lowercase().contains(&type_query))
            .map(|p| format!("{}: {}", product_line(p), p.canonical_ip()))
            .collect();
        return Some(if lines.is_empty() {
            format!("No converters found for type: {}", type_query)
        } else {
            lines.join("\n")
        });
    }
    None
}

/// Lamp/luminaire compatibility by fuzzy partial-ratio match against the
/// converter description and display name. This is the single canonical
/// fuzzy policy; exact substrings score 100 and are therefore included.
pub fn lamp_compatibility(q: &Query, catalog: &Catalog) -> Option<String> {
    let captures = LAMP_FOR_RE.captures(&q.text)?;
    let lamp_name = captures.get(1)?.as_str().trim().trim_end_matches(['?', '.']);
    // Phrases like "for each converter" or "for 123456" belong to other
    // handlers; declining here keeps them reachable.
    if lamp_name.is_empty()
        || lamp_name.contains("converter")
        || lamp_name.contains("each")
        || lamp_name.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
    {
        return None;
    }
    let matches: Vec<&CanonicalProduct> = catalog
        .values()
        .filter(|p| {
            partial_ratio(lamp_name, &p.description.to_lowercase()) > FUZZY_THRESHOLD
                || partial_ratio(lamp_name, &p.name.to_lowercase()) > FUZZY_THRESHOLD
        })
        .collect();
    if matches.is_empty() {
        return None;
    }
    let rows: Vec<String> = matches
        .iter()
        .map(|p| {
            format!(
                "| {} | {} | {} | {} |",
                p.description,
                p.canonical_artnr(),
                p.output_voltage,
                p.dimmability
            )
        })
        .collect();
    Some(format!(
        "## Converters compatible with {}\n\n{}",
        title_case(lamp_name),
        markdown_table(&["Converter", "ARTNR", "Output Voltage", "Dimming"], &rows)
    ))
}

/// "N x lamp-type": recommend converters whose compatibility entry for the
/// lamp supports at least N units. Entries with unparseable maxima are
/// excluded, not fatal.
pub fn capacity_match(q: &Query, catalog: &Catalog) -> Option<String> {
    let captures = NX_RE.captures(&q.raw)?;
    let wanted: f64 = captures.get(1)?.as_str().parse().ok()?;
    let lamp_query = captures.get(2)?.as_str().trim().to_lowercase();
    if lamp_query.is_empty() {
        return None;
    }
    let query_words: Vec<&str> = lamp_query.split_whitespace().collect();

    let mut lines = Vec::new();
    for product in catalog.values() {
        for (lamp_name, range) in &product.lamps {
            let lamp_norm = lamp_name.to_lowercase().replace(',', ".");
            if !query_words.iter().all(|w| lamp_norm.contains(w)) {
                continue;
            }
            let Some(max) = range.max_quantity() else {
                continue;
            };
            if max >= wanted {
                lines.push(format!(
                    "You can use {} for {}x {} (max supported: {} for '{}').",
                    product_line(product),
                    wanted,
                    title_case(&lamp_query),
                    max,
                    lamp_name
                ));
            }
        }
    }
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Full lamp table for one converter ("recommend luminaires for converter N").
pub fn lamps_for_converter(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&[
        "recommend luminaires for converter",
        "which luminaires for converter",
        "what luminaire can i use for",
        "luminaires for",
    ]) {
        return None;
    }
    let number = CONVERTER_NUM_RE
        .captures(&q.text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;
    let Some(product) = catalog.by_artnr(&number) else {
        return Some(format!("**Sorry, converter `{}` not found.**", number));
    };
    if product.lamps.is_empty() {
        return Some(format!(
            "**No luminaires found for converter `{}`.**",
            number
        ));
    }
    let rows: Vec<String> = product
        .lamps
        .iter()
        .map(|(name, range)| {
            format!("| {} | {}–{} |", name.replace(',', "."), range.min, range.max)
        })
        .collect();
    Some(format!(
        "**Recommended luminaires for converter `{}`:**\n\n{}",
        number,
        markdown_table(&["Lamp Type", "Supported Quantity (luminaires)"], &rows)
    ))
}

/// "How many <lamp> luminaires ... converter N": per-lamp min/max rows for
/// the lamps whose name contains the queried token.
pub fn lamp_quantity(q: &Query, catalog: &Catalog) -> Option<String> {
    let captures = LAMP_QTY_RE.captures(&q.text)?;
    let lamp_name = captures.get(1)?.as_str();
    let number = captures.get(2)?.as_str();
    let Some(product) = catalog.by_artnr(number) else {
        return Some(format!(
            "## Error\n\n**Sorry, I could not find converter `{}`.**",
            number
        ));
    };
    let rows: Vec<String> = product
        .lamps
        .iter()
        .filter(|(name, _)| name.to_lowercase().contains(&lamp_name.to_lowercase()))
        .map(|(name, range)| {
            format!("| {} | {}–{} |", name.replace(',', "."), range.min, range.max)
        })
        .collect();
    if rows.is_empty() {
        return Some(format!(
            "## No Matching Luminaires\n\n**Sorry, no data found for '{}' with converter `{}`.**",
            lamp_name, number
        ));
    }
    Some(format!(
        "## {} Luminaires for Converter `{}`\n\n{}\n\n\
         *Note: Values represent the supported number of luminaires.*",
        title_case(lamp_name),
        number,
        markdown_table(&["Lamp Type", "Supported Quantity (luminaires)"], &rows)
    ))
}

/// Catch-all lamp recognition: if any catalog lamp name's token set is a
/// subset of the question's tokens, recommend converters for that lamp.
pub fn known_lamp_scan(q: &Query, catalog: &Catalog) -> Option<String> {
    // An "N x lamp" question is a capacity question. If the capacity
    // handler already rejected it, a generic recommendation here would
    // contradict that rejection.
    if NX_RE.is_match(&q.raw) {
        return None;
    }
    for product in catalog.values() {
        for lamp_name in product.lamps.keys() {
            if token_subset_match(lamp_name, &q.text) {
                if let Some(answer) = recommend_converters_for_lamp(lamp_name, catalog) {
                    return Some(answer);
                }
            }
        }
    }
    None
}

/// Combined IP / dimmability filter. "ip20 ... ip67" in one question gives
/// the side-by-side listing instead.
pub fn ip_dim_filter(q: &Query, catalog: &Catalog) -> Option<String> {
    if q.text.contains("ip20") && q.text.contains("ip67") {
        let bucket = |code: &str| -> Vec<String> {
            catalog
                .values()
                .filter(|p| p.canonical_ip().eq_ignore_ascii_case(code))
                .map(|p| format!("- {}", product_line(p)))
                .collect()
        };
        let ip20 = bucket("IP20");
        let ip67 = bucket("IP67");
        if ip20.is_empty() && ip67.is_empty() {
            return None;
        }
        return Some(format!(
            "IP20 converters:\n{}\n\nIP67 converters:\n{}",
            ip20.join("\n"),
            ip67.join("\n")
        ));
    }

    let ip_number = IP_CODE_RE
        .captures(&q.text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let dim_kind = DIM_KIND_RE
        .captures(&q.text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace(' ', ""));
    if ip_number.is_none() && dim_kind.is_none() {
        return None;
    }

    let rows: Vec<String> = catalog
        .values()
        .filter(|p| {
            let ip_ok = ip_number.as_deref().is_none_or(|n| {
                p.canonical_ip().to_lowercase().contains(&format!("ip{}", n))
            });
            let dim_ok = dim_kind.as_deref().is_none_or(|d| {
                p.dimmability.to_lowercase().replace(' ', "").contains(d)
            });
            ip_ok && dim_ok
        })
        .map(|p| {
            format!(
                "| {} | {} | {} | {} |",
                p.description,
                p.canonical_artnr(),
                p.dimmability,
                p.canonical_ip()
            )
        })
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(markdown_table(&["Converter", "ARTNR", "Dimming", "IP"], &rows))
}

/// Efficiency ranking, optionally scoped to a voltage/current class.
/// Products with unparseable efficiency values are excluded from ranking.
pub fn most_efficient(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.text.contains("most efficient") {
        return None;
    }
    let class = q.class_token();
    let best = catalog
        .values()
        .filter(|p| class.as_deref().is_none_or(|c| type_matches(p, c)))
        .filter_map(|p| {
            crate::normalize::parse_float_opt(&p.efficiency)
                .filter(|v| v.is_finite())
                .map(|v| (p, v))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    let (product, _) = best;
    let mut body = String::from("## Most Efficient Converter\n\n");
    if let Some(class) = &class {
        body.push_str(&format!("- **Type:** {}\n", class.to_uppercase()));
    }
    body.push_str(&format!(
        "- **Converter:** {}\n- **Efficiency:** {}\n",
        product_line(product),
        product.efficiency
    ));
    Some(body)
}

/// Dimming capability report: summary count plus a per-row status table,
/// dimmable rows first.
pub fn dimmability_report(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["dimmable", "dimming", "dali", "casambi", "touchdim"]) {
        return None;
    }
    let class = q.class_token();
    let mut entries: Vec<(&CanonicalProduct, bool)> = catalog
        .values()
        .filter(|p| class.as_deref().is_none_or(|c| type_matches(p, c)))
        .map(|p| (p, is_dimmable(p)))
        .collect();
    if entries.is_empty() {
        return None;
    }
    entries.sort_by_key(|(_, dimmable)| !*dimmable);
    let dimmable_count = entries.iter().filter(|(_, d)| *d).count();
    let rows: Vec<String> = entries
        .iter()
        .map(|(p, dimmable)| {
            format!(
                "| {} | {} | {} | {} |",
                p.description,
                p.canonical_artnr(),
                p.dimmability,
                if *dimmable { "Dimmable" } else { "Not dimmable" }
            )
        })
        .collect();
    Some(format!(
        "## Dimming Capabilities\n\n**Found {} dimmable converter(s) out of {} total:**\n\n{}",
        dimmable_count,
        entries.len(),
        markdown_table(&["Converter", "ARTNR", "Dimming", "Status"], &rows)
    ))
}

/// Listing of converters with built-in strain relief, sorted by ARTNR.
pub fn strain_relief(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.text.contains("strain relief") {
        return None;
    }
    let mut candidates: Vec<&CanonicalProduct> = catalog
        .values()
        .filter(|p| p.strain_relief.eq_ignore_ascii_case("yes"))
        .collect();
    if candidates.is_empty() {
        return Some(
            "**No converters with strain relief found in our current catalog.**".to_string(),
        );
    }
    candidates.sort_by_key(|p| p.canonical_artnr());
    let rows: Vec<String> = candidates
        .iter()
        .map(|p| {
            format!(
                "| {} | **{}** | Included |",
                p.description,
                p.canonical_artnr()
            )
        })
        .collect();
    Some(format!(
        "## Converters with Strain Relief\n\n**Found {} models featuring built-in strain relief:**\n\n{}",
        candidates.len(),
        markdown_table(&["Converter", "ARTNR", "Strain Relief"], &rows)
    ))
}

/// Outdoor-capable converters by installation location.
pub fn outdoor(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.text.contains("outdoor") {
        return None;
    }
    let lines: Vec<String> = catalog
        .values()
        .filter(|p| p.location.to_lowercase().contains("outdoor"))
        .map(product_line)
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Input/output voltage ranges (with the Vf alias) for one article number.
pub fn voltage_range(q: &Query, catalog: &Catalog) -> Option<String> {
    static VF_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\bvf\b").expect("vf regex is valid"));
    if !(q.text.contains("voltage range")
        || q.text.contains("forward voltage")
        || VF_RE.is_match(&q.text))
    {
        return None;
    }
    let artnr = q.artnr()?;
    let product = catalog.by_artnr(artnr)?;
    let input = &product.input_voltage;
    let input_display = if input == NOT_AVAILABLE {
        NOT_AVAILABLE.to_string()
    } else if input.to_lowercase().contains("vac") || input.to_lowercase().contains("v~") {
        format!("{} AC", input)
    } else {
        format!("{} DC", input)
    };
    Some(format!(
        "**Voltage ranges for {}:**\n- Forward voltage (Vf): {}\n- Input: {}\n- Output: {} DC",
        canonical_artnr(artnr),
        product.output_voltage,
        input_display,
        product.output_voltage
    ))
}

/// Single-attribute lookups by article number: datasheet link, gross
/// weight, input voltage, output voltage.
pub fn per_unit_lookup(q: &Query, catalog: &Catalog) -> Option<String> {
    let digits = q.digit_runs();
    let product = digits.first().and_then(|d| catalog.by_artnr(d));

    if q.mentions_any(&["datasheet", "manual", "pdf"]) {
        let product = product?;
        if product.datasheet == NOT_AVAILABLE {
            return None;
        }
        return Some(format!(
            "Datasheet/manual for {}: {}",
            product_line(product),
            product.datasheet
        ));
    }
    if q.text.contains("weight") && !q.text.contains("each") {
        let product = product?;
        if product.weight == NOT_AVAILABLE {
            return None;
        }
        return Some(format!(
            "Weight of {}: {} kg",
            product_line(product),
            product.weight
        ));
    }
    if q.text.contains("input voltage") && !q.text.contains("each") {
        let product = product?;
        if product.input_voltage == NOT_AVAILABLE {
            return None;
        }
        return Some(format!(
            "Input voltage range of {}: {}",
            product_line(product),
            product.input_voltage
        ));
    }
    if q.text.contains("output voltage") && !q.text.contains("each") {
        let product = product?;
        if product.output_voltage == NOT_AVAILABLE {
            return None;
        }
        return Some(format!(
            "Output voltage range of {}: {}",
            product_line(product),
            product.output_voltage
        ));
    }
    None
}

/// Smallest converter by the first size dimension, optionally scoped to a
/// class token. Unparseable sizes sort last via the infinity sentinel.
pub fn smallest(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["smallest", "most compact"]) {
        return None;
    }
    let class = q.class_token();
    let winner = catalog
        .values()
        .filter(|p| class.as_deref().is_none_or(|c| type_matches(p, c)))
        .min_by(|a, b| first_dimension_mm(a).total_cmp(&first_dimension_mm(b)))?;
    if !first_dimension_mm(winner).is_finite() {
        return None;
    }
    let scope = class.map(|c| format!(" {}", c.to_uppercase())).unwrap_or_default();
    Some(format!(
        "Smallest{} converter: {}, size: {}",
        scope,
        product_line(winner),
        winner.size
    ))
}

/// Converters with a length under 100mm, sorted ascending.
pub fn compact_filter(q: &Query, catalog: &Catalog) -> Option<String> {
    if !(q.text.contains("under 100mm") || (q.text.contains("length") && q.text.contains("100"))) {
        return None;
    }
    let mut candidates: Vec<(&CanonicalProduct, f64)> = catalog
        .values()
        .map(|p| (p, first_dimension_mm(p)))
        .filter(|(_, length)| length.is_finite() && *length < 100.0)
        .collect();
    if candidates.is_empty() {
        return Some(
            "**No converters under 100mm length found in current catalog.**".to_string(),
        );
    }
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    let rows: Vec<String> = candidates
        .iter()
        .map(|(p, length)| {
            format!(
                "| {} | **{}** | {}mm | {} |",
                p.description,
                p.canonical_artnr(),
                length,
                p.size.replace('*', " × ")
            )
        })
        .collect();
    Some(format!(
        "## Compact Converters (<100mm Length)\n\n**Found {} models meeting size requirements:**\n\n{}\n\n\
         **Key:**\n- Dimensions shown as Length × Width × Height (mm)",
        candidates.len(),
        markdown_table(&["Converter", "ARTNR", "Length", "Full Dimensions"], &rows)
    ))
}

/// Aggregate "for each converter" reports: one line per product for the
/// requested attribute.
pub fn for_each_report(q: &Query, catalog: &Catalog) -> Option<String> {
    if catalog.is_empty() {
        return None;
    }

    let each = q.text.contains("each");
    let per_product = |title: &str, value: fn(&CanonicalProduct) -> &String| -> String {
        let mut lines = vec![title.to_string()];
        lines.extend(
            catalog
                .values()
                .map(|p| format!("{}: {}", p.description, value(p))),
        );
        lines.join("\n")
    };

    if each && q.text.contains("efficiency") {
        return Some(per_product("Efficiency at full load for each converter:", |p| {
            &p.efficiency
        }));
    }
    if each && q.text.contains("input voltage") {
        return Some(per_product("Input voltage range for each converter:", |p| {
            &p.input_voltage
        }));
    }
    if q.text.contains("output voltage")
        && (each || q.text.contains("output voltage for each model"))
    {
        return Some(per_product("Output voltage range for each converter:", |p| {
            &p.output_voltage
        }));
    }
    if each && q.text.contains("class") {
        let mut lines = vec!["Class (electrical safety class) for each converter:".to_string()];
        lines.extend(
            catalog
                .values()
                .map(|p| format!("{}: Class {}", p.description, p.class)),
        );
        return Some(lines.join("\n"));
    }
    if q.text.contains("dimensions") && (each || q.text.contains("lbh") || q.text.contains("l*b*h"))
    {
        return Some(per_product("Dimensions (L*B*H) for each converter:", |p| {
            &p.size
        }));
    }
    if each && q.text.contains("weight") {
        let mut lines = vec!["Gross weight of each converter:".to_string()];
        lines.extend(
            catalog
                .values()
                .map(|p| format!("{}: {} kg", p.description, p.weight)),
        );
        return Some(lines.join("\n"));
    }
    if q.mentions_any(&[
        "minimum and maximum number of luminaires",
        "min and max number of luminaires",
        "min max luminaires",
    ]) {
        let mut lines = vec![
            "Minimum and maximum number of luminaires that can be connected to each converter:"
                .to_string(),
        ];
        for product in catalog.values() {
            if product.lamps.is_empty() {
                lines.push(format!(
                    "{}: No lamp compatibility data available.",
                    product.description
                ));
            } else {
                for (lamp_name, range) in &product.lamps {
                    lines.push(format!(
                        "{}: {} – min: {}, max: {}",
                        product.description, lamp_name, range.min, range.max
                    ));
                }
            }
        }
        return Some(lines.join("\n"));
    }
    None
}

/// Pairwise comparison of two article numbers.
pub fn compare(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.text.contains("compare") {
        return None;
    }
    let digits = q.digit_runs();
    if digits.len() < 2 {
        return None;
    }
    let a = catalog.by_artnr(digits[0])?;
    let b = catalog.by_artnr(digits[1])?;
    let line = |p: &CanonicalProduct| {
        format!(
            "- {}: {}, {}, Efficiency {}",
            product_line(p),
            p.dimmability,
            p.location,
            p.efficiency
        )
    };
    Some(format!("Comparison:\n{}\n{}", line(a), line(b)))
}

/// Distinct IP ratings across the catalog. Runs after the artnr/type IP
/// lookup, so it only sees generic "which IP ratings" questions.
pub fn ip_listing(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["ip rating", "ip protection"]) {
        return None;
    }
    let mut ratings: Vec<String> = catalog
        .values()
        .map(|p| p.canonical_ip())
        .filter(|ip| ip != NOT_AVAILABLE)
        .collect();
    ratings.sort();
    ratings.dedup();
    if ratings.is_empty() {
        return Some("No IP ratings found.".to_string());
    }
    Some(format!(
        "IP ratings for converters:\n{}",
        ratings.join("\n")
    ))
}

/// Electrical safety classes across the catalog.
pub fn class_listing(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["electrical safety class", "class"]) {
        return None;
    }
    let mut lines: Vec<String> = catalog
        .values()
        .filter(|p| p.class != NOT_AVAILABLE)
        .map(|p| format!("Class {} - {}", p.class, product_line(p)))
        .collect();
    lines.sort();
    if lines.is_empty() {
        return Some("No electrical safety classes found.".to_string());
    }
    Some(format!(
        "Electrical safety classes for converters:\n{}",
        lines.join("\n")
    ))
}

/// Enumerated "show all <class>" listings for the fixed voltage/current
/// classes, plus the tabular "list ... 24v" variant.
pub fn show_all_class(q: &Query, catalog: &Catalog) -> Option<String> {
    // Longest token first so "24v dc" wins over "24v".
    const CLASSES: &[&str] = &[
        "24v dc", "180ma", "250ma", "260ma", "350ma", "500ma", "700ma", "24v", "48v",
    ];
    if !q.mentions_any(&["show", "list"]) || !q.text.contains("converter") {
        return None;
    }

    if q.text.contains("all") {
        let class = CLASSES.iter().copied().find(|c| q.text.contains(c))?;
        let lines: Vec<String> = catalog
            .values()
            .filter(|p| type_matches(p, class))
            .map(product_line)
            .collect();
        if lines.is_empty() {
            return None;
        }
        return Some(lines.join("\n"));
    }

    if q.text.contains("24v") {
        let rows: Vec<String> = catalog
            .values()
            .filter(|p| {
                p.output_voltage.to_lowercase().contains("24") || type_matches(p, "24v")
            })
            .map(|p| {
                format!(
                    "| {} | {} | {} | {} | {} |",
                    p.description,
                    p.canonical_artnr(),
                    p.output_voltage,
                    p.dimmability,
                    p.canonical_ip()
                )
            })
            .collect();
        if rows.is_empty() {
            return None;
        }
        return Some(format!(
            "## List of 24V Converters\n\n{}\n\nNeed more details? Ask for a datasheet or comparison.",
            markdown_table(
                &["Description", "ARTNR", "Output Voltage", "Dimmability", "IP"],
                &rows
            )
        ));
    }
    None
}

/// Lifecycle filtering: products whose status code marks them active.
pub fn lifecycle(q: &Query, catalog: &Catalog) -> Option<String> {
    if !q.mentions_any(&["active", "lifecycle"]) {
        return None;
    }
    let lines: Vec<String> = catalog
        .values()
        .filter(|p| p.lifecycle.eq_ignore_ascii_case("a"))
        .map(|p| format!("{} is active.", product_line(p)))
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Canned explanatory answers for fixed comparative questions, keyed by
/// substring detection.
pub fn canned_comparisons(q: &Query, _catalog: &Catalog) -> Option<String> {
    if q.text.contains("difference between remote and in-track")
        || q.text.contains("remote vs in-track")
    {
        return Some(REMOTE_VS_IN_TRACK.to_string());
    }

    if !q.text.contains("difference between") {
        return None;
    }
    if q.text.contains("24v") && q.text.contains("48v") {
        return Some(DIFFERENCE_24V_48V.to_string());
    }
    const MA_PAIRS: &[(&str, &str)] = &[
        ("180ma", "250ma"),
        ("250ma", "260ma"),
        ("260ma", "350ma"),
        ("350ma", "500ma"),
        ("500ma", "700ma"),
    ];
    for (low, high) in MA_PAIRS {
        if q.text.contains(low) && q.text.contains(high) {
            let low = low.trim_end_matches("ma");
            let high = high.trim_end_matches("ma");
            return Some(format!(
                "Difference between {low}mA and {high}mA LED converters:\n\
                 - **Current Output:** {high}mA converters can drive more power-hungry or larger \
                 LED installations compared to {low}mA.\n\
                 - **Application:** {low}mA is typically used for smaller LED strips or modules, \
                 while {high}mA is used for larger or more demanding LED setups.\n\
                 - **Efficiency:** Higher current converters (like {high}mA) may require thicker \
                 cables to minimize voltage drop and power loss over distance.\n"
            ));
        }
    }
    None
}

const DIFFERENCE_24V_48V: &str = "\
Difference between 24V DC and 48V LED converters:
- **Power Delivery:** 48V converters can deliver the same power at half the current compared to 24V, reducing cable size and cost.
- **Efficiency:** 48V systems are generally more efficient, especially over longer cable runs, due to lower current and less voltage drop.
- **Safety:** Both 24V and 48V are considered Safety Extra Low Voltage (SELV), but 48V is still below the 60V SELV limit, so it remains safe for most installations.
- **Compatibility:** 48V converters are better for large LED systems or longer runs, while 24V is common for smaller or standard installations.
- **System Design:** 48V allows for higher power LED arrays and longer cable runs without significant voltage drop or power loss.
";

const REMOTE_VS_IN_TRACK: &str = "\
Difference between 'remote' and 'in-track' LED converters:

- **Remote Converters:**
  - The converter is located outside the LED track or rail, often in a central location or remote enclosure.
  - Multiple LED tracks or fixtures can be powered from a single remote converter.
  - Remote converters are easier to access for maintenance or replacement.
  - They are typically used for larger installations or when you want to centralize power management.

- **In-Track Converters:**
  - The converter is mounted directly inside or alongside the LED track or rail.
  - Each track usually has its own dedicated converter.
  - In-track converters are more compact and can be used for smaller installations or where a centralized converter is not practical.
  - Maintenance or replacement may require access to the track itself.

**Summary:**
Remote converters are best for larger, more complex systems with centralized power, while in-track converters are ideal for smaller, standalone tracks or where space and aesthetics are a concern.";
