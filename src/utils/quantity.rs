//! Quantity normalization: raw textual value/unit pairs into typed
//! quantities carrying the canonical unit system.

use crate::types::datatypes::Quantity;
use crate::types::source::SourceQuantity;

pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// Parse a raw source quantity. Returns `None` when the value is absent or
/// not numeric; the unit is optional and defaults to the UCUM unity unit.
pub fn normalize_quantity(raw: &SourceQuantity) -> Option<Quantity> {
    let value: f64 = raw.value.as_deref()?.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let unit = raw
        .unit
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or("1");
    Some(Quantity {
        value,
        unit: Some(unit.to_string()),
        system: Some(UCUM_SYSTEM.to_string()),
        code: Some(unit.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: &str, unit: Option<&str>) -> SourceQuantity {
        SourceQuantity {
            value: Some(value.to_string()),
            unit: unit.map(String::from),
        }
    }

    #[test]
    fn numeric_value_with_unit() {
        let q = normalize_quantity(&raw("81", Some("mg"))).unwrap();
        assert_eq!(q.value, 81.0);
        assert_eq!(q.unit.as_deref(), Some("mg"));
        assert_eq!(q.system.as_deref(), Some(UCUM_SYSTEM));
    }

    #[test]
    fn missing_unit_defaults_to_unity() {
        let q = normalize_quantity(&raw("2.5", None)).unwrap();
        assert_eq!(q.code.as_deref(), Some("1"));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        assert!(normalize_quantity(&raw("eighty", Some("mg"))).is_none());
        assert!(normalize_quantity(&SourceQuantity::default()).is_none());
        assert!(normalize_quantity(&raw("NaN", Some("mg"))).is_none());
    }
}
