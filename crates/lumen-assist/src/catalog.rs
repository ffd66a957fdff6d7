//! Catalog normalizer: projects heterogeneous raw product records into the
//! fixed [`CanonicalProduct`] schema.
//!
//! Projection never fails for a single malformed record: a record missing
//! fields is projected with per-field [`NOT_AVAILABLE`] sentinels, not
//! dropped. The catalog is built once at startup and read-only afterwards;
//! reload means re-running the projection on a fresh raw mapping.

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::normalize;
use crate::types::{CanonicalProduct, LampRange, RetrievedDocument, NOT_AVAILABLE};

/// The canonical catalog: source key -> normalized product. A `BTreeMap`
/// keeps iteration order deterministic, which makes the documented
/// artnr-lookup tie-break ("first match under iteration order") stable.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<String, CanonicalProduct>,
}

impl Catalog {
    /// Project the full raw mapping. Infallible per record; records that
    /// are not JSON objects still produce an all-sentinel product.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let products = raw
            .iter()
            .map(|(key, record)| (key.clone(), project(record)))
            .collect::<BTreeMap<_, _>>();
        tracing::info!(products = products.len(), "catalog projected");
        Self { products }
    }

    /// Parse a JSON document holding the raw mapping and project it.
    /// This is the only fallible entry point; callers report the error and
    /// continue with an empty catalog (fallback-only operation).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let map = value
            .as_object()
            .ok_or_else(|| anyhow!("catalog root must be a JSON object keyed by product"))?;
        Ok(Self::from_raw(map))
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Products in deterministic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CanonicalProduct)> {
        self.products.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &CanonicalProduct> {
        self.products.values()
    }

    /// Look up a product by article number after canonicalization on both
    /// sides. If the uniqueness invariant is violated the first match in
    /// iteration order wins.
    pub fn by_artnr(&self, artnr: &str) -> Option<&CanonicalProduct> {
        let wanted = normalize::canonical_artnr(artnr);
        self.products
            .values()
            .find(|p| p.canonical_artnr() == wanted)
    }

    /// Serialize every product into the flat text form the semantic index
    /// is built over.
    pub fn documents(&self) -> Vec<RetrievedDocument> {
        self.products
            .iter()
            .map(|(key, product)| RetrievedDocument {
                source: key.clone(),
                content: serialize_product(product),
            })
            .collect()
    }
}

/// Project one raw record. Each canonical field is filled from a preferred
/// raw attribute name with fallbacks tried in order.
fn project(record: &Value) -> CanonicalProduct {
    CanonicalProduct {
        type_code: field(record, &["TYPE"]),
        artnr: field(record, &["ARTNR"]),
        description: field(record, &["CONVERTER DESCRIPTION:", "CONVERTER DESCRIPTION"]),
        strain_relief: field(record, &["STRAIN RELIEF"]),
        location: field(record, &["LOCATION"]),
        dimmability: field(record, &["DIMMABILITY"]),
        efficiency: field(record, &["EFFICIENCY @full load", "EFFICIENCY"]),
        output_voltage: field(record, &["OUTPUT VOLTAGE (V)", "OUTPUT VOLTAGE"]),
        input_voltage: field(record, &["NOM. INPUT VOLTAGE (V)", "INPUT VOLTAGE"]),
        size: field(record, &["SIZE: L*B*H (mm)", "SIZE"]),
        weight: field(record, &["Gross Weight", "WEIGHT"]),
        list_price: field(record, &["Listprice"]),
        lamps: lamp_map(record),
        datasheet: field(record, &["pdf_link", "PDF_LINK"]),
        ip: field(record, &["IP", "IP RATING"]),
        class: field(record, &["CLASS"]),
        lifecycle: field(record, &["LifeCycle"]),
        name: field(record, &["Name"]),
    }
}

fn field(record: &Value, names: &[&str]) -> String {
    for name in names {
        if let Some(value) = record.get(name) {
            if let Some(text) = value_to_string(value) {
                return text;
            }
        }
    }
    NOT_AVAILABLE.to_string()
}

/// Best-effort string form of a raw attribute value. `None` for JSON null
/// so fallback attribute names still get a chance.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Nested structures are kept as compact JSON so nothing is lost.
        other => serde_json::to_string(other).ok(),
    }
}

fn lamp_map(record: &Value) -> BTreeMap<String, LampRange> {
    let lamps = record
        .get("lamps")
        .or_else(|| record.get("LAMPS"))
        .and_then(Value::as_object);
    let Some(lamps) = lamps else {
        return BTreeMap::new();
    };
    lamps
        .iter()
        .map(|(name, entry)| {
            let min = entry
                .get("min")
                .and_then(value_to_string)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let max = entry
                .get("max")
                .and_then(value_to_string)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            (name.clone(), LampRange { min, max })
        })
        .collect()
}

/// Flat "ATTRIBUTE: value" serialization used as retrieval document text.
fn serialize_product(product: &CanonicalProduct) -> String {
    let lamps = if product.lamps.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        product
            .lamps
            .iter()
            .map(|(name, range)| format!("{} (min={}, max={})", name, range.min, range.max))
            .collect::<Vec<_>>()
            .join("; ")
    };
    format!(
        "TYPE: {}\nARTNR: {}\nCONVERTER DESCRIPTION: {}\nSTRAIN RELIEF: {}\nLOCATION: {}\n\
         DIMMABILITY: {}\nEFFICIENCY: {}\nOUTPUT VOLTAGE: {}\nINPUT VOLTAGE: {}\nSIZE: {}\n\
         WEIGHT: {}\nLISTPRICE: {}\nLAMPS: {}\nPDF_LINK: {}\nIP: {}\nCLASS: {}\n\
         LIFECYCLE: {}\nNAME: {}",
        product.type_code,
        product.artnr,
        product.description,
        product.strain_relief,
        product.location,
        product.dimmability,
        product.efficiency,
        product.output_voltage,
        product.input_voltage,
        product.size,
        product.weight,
        product.list_price,
        lamps,
        product.datasheet,
        product.ip,
        product.class,
        product.lifecycle,
        product.name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test fixture is an object")
    }

    #[test]
    fn projection_fills_sentinels_for_missing_fields() {
        let raw = raw_map(json!({
            "K1": { "ARTNR": 123456.0 },
            "K2": "not even an object",
        }));
        let catalog = Catalog::from_raw(&raw);
        assert_eq!(catalog.len(), 2);

        let p1 = catalog.iter().next().map(|(_, p)| p).unwrap();
        assert_eq!(p1.artnr, "123456.0");
        assert_eq!(p1.description, NOT_AVAILABLE);
        assert_eq!(p1.list_price, NOT_AVAILABLE);
        assert!(p1.lamps.is_empty());

        let p2 = catalog.by_artnr("nope");
        assert!(p2.is_none());
    }

    #[test]
    fn artnr_lookup_canonicalizes_both_sides() {
        let raw = raw_map(json!({
            "K1": { "ARTNR": "123456.0", "Listprice": "45,50" },
        }));
        let catalog = Catalog::from_raw(&raw);
        let product = catalog.by_artnr("123456").expect("found by bare number");
        assert_eq!(product.canonical_artnr(), "123456");
        assert_eq!(product.price(), Some(45.5));
    }

    #[test]
    fn artnr_tie_break_is_first_in_key_order() {
        let raw = raw_map(json!({
            "A": { "ARTNR": 111111, "Name": "first" },
            "B": { "ARTNR": "111111.0", "Name": "second" },
        }));
        let catalog = Catalog::from_raw(&raw);
        assert_eq!(catalog.by_artnr("111111").unwrap().name, "first");
    }

    #[test]
    fn lamp_map_reads_both_spellings_and_keeps_sentinels() {
        let raw = raw_map(json!({
            "K1": { "lamps": { "LEDLINE 9,6W": { "min": 1, "max": "20" } } },
            "K2": { "LAMPS": { "SPOT 3W": { "max": 8.0 } } },
        }));
        let catalog = Catalog::from_raw(&raw);
        let mut values = catalog.values();
        let p1 = values.next().unwrap();
        assert_eq!(
            p1.lamps.get("LEDLINE 9,6W"),
            Some(&LampRange { min: "1".into(), max: "20".into() })
        );
        let p2 = values.next().unwrap();
        let range = p2.lamps.get("SPOT 3W").unwrap();
        assert_eq!(range.min, NOT_AVAILABLE);
        assert_eq!(range.max_quantity(), Some(8.0));
    }

    #[test]
    fn documents_serialize_every_product() {
        let raw = raw_map(json!({
            "K1": { "ARTNR": 123456, "TYPE": "24V DC" },
        }));
        let docs = Catalog::from_raw(&raw).documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "K1");
        assert!(docs[0].content.contains("TYPE: 24V DC"));
        assert!(docs[0].content.contains("ARTNR: 123456"));
    }

    #[test]
    fn malformed_catalog_json_is_an_error_not_a_panic() {
        assert!(Catalog::from_json_str("[1, 2, 3]").is_err());
        assert!(Catalog::from_json_str("not json").is_err());
        let ok = Catalog::from_json_str(r#"{"K1": {"ARTNR": 1}}"#).unwrap();
        assert_eq!(ok.len(), 1);
    }
}
