//! Per-column coercion of snapshot values.
//!
//! Coercion never fails: every input maps to a value or to NULL. Malformed
//! numbers become NULL; zero is kept as zero.

use crate::domain::record::Record;
use crate::domain::schema::{CoercionClass, TableSchema};
use crate::domain::value::{FieldValue, SqlValue};

/// Coerces one (possibly missing) field according to its column class.
pub fn coerce_field(class: CoercionClass, value: Option<&FieldValue>) -> SqlValue {
    let value = value.unwrap_or(&FieldValue::Null);
    match class {
        CoercionClass::StringTrimmed => SqlValue::Text(coerce_string(value)),
        CoercionClass::IntegerOrNull => SqlValue::Integer(coerce_integer(value)),
        CoercionClass::FloatOrNull => SqlValue::Float(coerce_float(value)),
        CoercionClass::DatePassthrough => SqlValue::Date(coerce_date(value)),
    }
}

/// Produces the record's values in schema column order.
pub fn coerce_record(record: &Record, schema: &TableSchema) -> Vec<SqlValue> {
    schema
        .columns()
        .iter()
        .map(|c| coerce_field(c.class, record.get(&c.name)))
        .collect()
}

fn coerce_string(value: &FieldValue) -> Option<String> {
    let s = match value {
        FieldValue::Null => return None,
        FieldValue::Text(s) => s.trim().to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Float(f) => f.to_string(),
        FieldValue::Bool(b) => b.to_string(),
    };
    (!s.is_empty()).then_some(s)
}

/// Fractional input, JSON float or numeric text alike, rounds to the nearest
/// integer (half away from zero): `12.9` and `"12.9"` both give 13.
fn coerce_integer(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Integer(i) => Some(*i),
        FieldValue::Float(f) => float_to_i64(f.round()),
        FieldValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(|f| float_to_i64(f.round())))
        }
        FieldValue::Null | FieldValue::Bool(_) => None,
    }
}

fn coerce_float(value: &FieldValue) -> Option<f64> {
    let f = match value {
        FieldValue::Integer(i) => *i as f64,
        FieldValue::Float(f) => *f,
        FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        FieldValue::Null | FieldValue::Bool(_) => return None,
    };
    f.is_finite().then_some(f)
}

fn coerce_date(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Float(f) => Some(f.to_string()),
        FieldValue::Bool(b) => Some(b.to_string()),
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::approx_constant)]
mod tests {
    use super::*;
    use crate::domain::schema::ColumnSpec;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn string_is_trimmed_and_empty_becomes_null() {
        let c = CoercionClass::StringTrimmed;
        assert_eq!(
            coerce_field(c, Some(&text("  Acme  "))),
            SqlValue::Text(Some("Acme".to_string()))
        );
        assert_eq!(coerce_field(c, Some(&text("   "))), SqlValue::Text(None));
        assert_eq!(coerce_field(c, Some(&text(""))), SqlValue::Text(None));
        assert_eq!(coerce_field(c, None), SqlValue::Text(None));
        assert_eq!(coerce_field(c, Some(&FieldValue::Null)), SqlValue::Text(None));
    }

    #[test]
    fn string_renders_scalars() {
        let c = CoercionClass::StringTrimmed;
        assert_eq!(
            coerce_field(c, Some(&FieldValue::Integer(0))),
            SqlValue::Text(Some("0".to_string()))
        );
        assert_eq!(
            coerce_field(c, Some(&FieldValue::Float(3.0))),
            SqlValue::Text(Some("3".to_string()))
        );
        assert_eq!(
            coerce_field(c, Some(&FieldValue::Bool(false))),
            SqlValue::Text(Some("false".to_string()))
        );
    }

    #[test]
    fn integer_parse_or_null() {
        let c = CoercionClass::IntegerOrNull;
        assert_eq!(coerce_field(c, Some(&text("42"))), SqlValue::Integer(Some(42)));
        assert_eq!(coerce_field(c, Some(&text(" -7 "))), SqlValue::Integer(Some(-7)));
        assert_eq!(coerce_field(c, Some(&text("12.9"))), SqlValue::Integer(Some(13)));
        assert_eq!(coerce_field(c, Some(&text(""))), SqlValue::Integer(None));
        assert_eq!(coerce_field(c, Some(&text("abc"))), SqlValue::Integer(None));
        assert_eq!(coerce_field(c, Some(&text("1e400"))), SqlValue::Integer(None));
        assert_eq!(coerce_field(c, Some(&FieldValue::Bool(true))), SqlValue::Integer(None));
        assert_eq!(coerce_field(c, None), SqlValue::Integer(None));
    }

    #[test]
    fn fractional_text_rounds_like_a_float() {
        let c = CoercionClass::IntegerOrNull;
        for (raw, float) in [("12.9", 12.9), ("-2.5", -2.5), ("0.4", 0.4)] {
            assert_eq!(
                coerce_field(c, Some(&text(raw))),
                coerce_field(c, Some(&FieldValue::Float(float))),
                "{}",
                raw
            );
        }
        assert_eq!(coerce_field(c, Some(&text("-2.5"))), SqlValue::Integer(Some(-3)));
    }

    #[test]
    fn integer_keeps_zero() {
        let c = CoercionClass::IntegerOrNull;
        assert_eq!(coerce_field(c, Some(&text("0"))), SqlValue::Integer(Some(0)));
        assert_eq!(coerce_field(c, Some(&FieldValue::Integer(0))), SqlValue::Integer(Some(0)));
    }

    #[test]
    fn integer_from_float_rounds() {
        let c = CoercionClass::IntegerOrNull;
        assert_eq!(coerce_field(c, Some(&FieldValue::Float(2.6))), SqlValue::Integer(Some(3)));
        assert_eq!(coerce_field(c, Some(&FieldValue::Float(1e30))), SqlValue::Integer(None));
    }

    #[test]
    fn float_parse_or_null() {
        let c = CoercionClass::FloatOrNull;
        assert_eq!(coerce_field(c, Some(&text("3.14"))), SqlValue::Float(Some(3.14)));
        assert_eq!(coerce_field(c, Some(&text("0"))), SqlValue::Float(Some(0.0)));
        assert_eq!(coerce_field(c, Some(&FieldValue::Integer(5))), SqlValue::Float(Some(5.0)));
        assert_eq!(coerce_field(c, Some(&text(""))), SqlValue::Float(None));
        assert_eq!(coerce_field(c, Some(&text("n/a"))), SqlValue::Float(None));
        assert_eq!(coerce_field(c, Some(&text("NaN"))), SqlValue::Float(None));
        assert_eq!(coerce_field(c, Some(&text("inf"))), SqlValue::Float(None));
    }

    #[test]
    fn date_is_passed_through() {
        let c = CoercionClass::DatePassthrough;
        assert_eq!(
            coerce_field(c, Some(&text("2024-03-01T00:00:00.000Z"))),
            SqlValue::Date(Some("2024-03-01T00:00:00.000Z".to_string()))
        );
        assert_eq!(
            coerce_field(c, Some(&text(" 2024-03-01 "))),
            SqlValue::Date(Some(" 2024-03-01 ".to_string()))
        );
        assert_eq!(coerce_field(c, None), SqlValue::Date(None));
    }

    #[test]
    fn record_follows_column_order() {
        let schema = TableSchema::new(
            vec![
                ColumnSpec::new("name", CoercionClass::StringTrimmed),
                ColumnSpec::new("clients", CoercionClass::IntegerOrNull),
                ColumnSpec::new("amcamt", CoercionClass::FloatOrNull),
            ],
            10,
        )
        .unwrap();
        let record: Record = [
            ("amcamt", text("3.14")),
            ("name", text(" Acme ")),
            ("extra", text("ignored")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            coerce_record(&record, &schema),
            vec![
                SqlValue::Text(Some("Acme".to_string())),
                SqlValue::Integer(None),
                SqlValue::Float(Some(3.14)),
            ]
        );
    }
}
