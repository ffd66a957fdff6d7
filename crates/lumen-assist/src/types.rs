use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize;

/// Sentinel for a canonical attribute absent from the raw record.
/// Distinct from the empty string and from zero: callers must never
/// conflate "not available" with "the value is empty".
pub const NOT_AVAILABLE: &str = "N/A";

/// Supported quantity or length range for one lamp type under a converter.
/// Values are kept as raw text (numeric-or-unknown) and parsed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LampRange {
    pub min: String,
    pub max: String,
}

impl LampRange {
    /// Maximum supported quantity, or `None` when the value is not numeric.
    /// Capacity matching excludes such entries instead of aborting.
    pub fn max_quantity(&self) -> Option<f64> {
        normalize::parse_float_opt(&self.max)
    }
}

/// Normalized, fixed-schema projection of a raw catalog record.
/// Derived once per record at startup and immutable thereafter; every
/// scalar field holds either the real value or [`NOT_AVAILABLE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub type_code: String,
    pub artnr: String,
    pub description: String,
    pub strain_relief: String,
    pub location: String,
    pub dimmability: String,
    pub efficiency: String,
    pub output_voltage: String,
    pub input_voltage: String,
    /// Physical size as "L*B*H" in millimeters.
    pub size: String,
    pub weight: String,
    pub list_price: String,
    pub lamps: BTreeMap<String, LampRange>,
    pub datasheet: String,
    pub ip: String,
    pub class: String,
    pub lifecycle: String,
    pub name: String,
}

impl CanonicalProduct {
    /// Article number with float/locale noise stripped ("123456.0" -> "123456").
    pub fn canonical_artnr(&self) -> String {
        normalize::canonical_artnr(&self.artnr)
    }

    /// IP code in canonical "IP<digits>" form.
    pub fn canonical_ip(&self) -> String {
        if self.ip == NOT_AVAILABLE {
            NOT_AVAILABLE.to_string()
        } else {
            normalize::canonical_ip_str(&self.ip)
        }
    }

    /// List price as a float, or `None` when missing/unparseable.
    pub fn price(&self) -> Option<f64> {
        if self.list_price == NOT_AVAILABLE {
            None
        } else {
            normalize::parse_float_opt(&self.list_price)
        }
    }
}

/// One entry returned by the semantic retrieval fallback: the source key of
/// a catalog record plus its serialized text. Produced transiently per
/// query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub source: String,
    pub content: String,
}
