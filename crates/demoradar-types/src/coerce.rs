//! Total coercion functions from raw cells to typed values.
//!
//! Every function here accepts any cell, including a missing one, and
//! returns either a correctly typed value or `None`. None of them can
//! panic. A cell that cannot be coerced nulls only that field; it never
//! aborts the snapshot.

use crate::raw::RawValue;

/// Lower bound (inclusive) of floats that truncate into `i64`.
#[allow(clippy::cast_precision_loss)]
const I64_MIN_F: f64 = i64::MIN as f64;

/// Upper bound (exclusive) of floats that truncate into `i64`.
///
/// `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
#[allow(clippy::cast_precision_loss)]
const I64_MAX_F: f64 = i64::MAX as f64;

/// Coerce a cell to an integer.
///
/// Booleans become 0/1, finite floats truncate toward zero when in range,
/// and text must be a base-10 integer (surrounding whitespace allowed).
pub fn coerce_int(value: Option<&RawValue>) -> Option<i64> {
    match value? {
        RawValue::Bool(b) => Some(i64::from(*b)),
        RawValue::Int(i) => Some(*i),
        RawValue::Float(x) => float_to_int(*x),
        RawValue::Text(s) => s.trim().parse().ok(),
    }
}

/// Coerce a cell to a finite float.
///
/// Non-finite results are rejected so that the outbound payload always
/// encodes as valid JSON.
pub fn coerce_float(value: Option<&RawValue>) -> Option<f64> {
    let x = match value? {
        RawValue::Bool(b) => f64::from(u8::from(*b)),
        #[allow(clippy::cast_precision_loss)]
        RawValue::Int(i) => *i as f64,
        RawValue::Float(x) => *x,
        RawValue::Text(s) => s.trim().parse().ok()?,
    };
    x.is_finite().then_some(x)
}

/// Coerce a cell to a boolean.
///
/// Numbers are truthy when non-zero. Text is accepted only in the usual
/// spellings (`true`/`false`, `1`/`0`, `yes`/`no`, any case); other text
/// and NaN are unparseable and yield `None`.
pub fn coerce_bool(value: Option<&RawValue>) -> Option<bool> {
    match value? {
        RawValue::Bool(b) => Some(*b),
        RawValue::Int(i) => Some(*i != 0),
        RawValue::Float(x) if x.is_nan() => None,
        RawValue::Float(x) => Some(*x != 0.0),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
    }
}

/// Coerce a cell to text. Non-text cells use their display form.
pub fn coerce_text(value: Option<&RawValue>) -> Option<String> {
    match value? {
        RawValue::Text(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_int(x: f64) -> Option<i64> {
    if x.is_finite() && (I64_MIN_F..I64_MAX_F).contains(&x) {
        Some(x.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_owned())
    }

    #[test]
    fn int_from_every_variant() {
        assert_eq!(coerce_int(None), None);
        assert_eq!(coerce_int(Some(&RawValue::Bool(true))), Some(1));
        assert_eq!(coerce_int(Some(&RawValue::Int(-7))), Some(-7));
        assert_eq!(coerce_int(Some(&RawValue::Float(99.9))), Some(99));
        assert_eq!(coerce_int(Some(&RawValue::Float(-0.5))), Some(0));
        assert_eq!(coerce_int(Some(&text(" 800 "))), Some(800));
    }

    #[test]
    fn int_rejects_garbage() {
        assert_eq!(coerce_int(Some(&text("abc"))), None);
        assert_eq!(coerce_int(Some(&text("3.5"))), None);
        assert_eq!(coerce_int(Some(&RawValue::Float(f64::NAN))), None);
        assert_eq!(coerce_int(Some(&RawValue::Float(f64::INFINITY))), None);
        assert_eq!(coerce_int(Some(&RawValue::Float(1e300))), None);
    }

    #[test]
    fn int_keeps_steam_ids_exact() {
        let id = 76_561_198_034_202_275_i64;
        assert_eq!(coerce_int(Some(&RawValue::Int(id))), Some(id));
        assert_eq!(coerce_int(Some(&text("76561198034202275"))), Some(id));
    }

    #[test]
    fn float_from_every_variant() {
        assert_eq!(coerce_float(None), None);
        assert_eq!(coerce_float(Some(&RawValue::Bool(false))), Some(0.0));
        assert_eq!(coerce_float(Some(&RawValue::Int(3))), Some(3.0));
        assert_eq!(coerce_float(Some(&RawValue::Float(-12.5))), Some(-12.5));
        assert_eq!(coerce_float(Some(&text("1.25"))), Some(1.25));
    }

    #[test]
    fn float_rejects_non_finite_and_garbage() {
        assert_eq!(coerce_float(Some(&RawValue::Float(f64::NAN))), None);
        assert_eq!(coerce_float(Some(&RawValue::Float(f64::NEG_INFINITY))), None);
        assert_eq!(coerce_float(Some(&text("inf"))), None);
        assert_eq!(coerce_float(Some(&text("north"))), None);
    }

    #[test]
    fn bool_missing_is_none_not_false() {
        assert_eq!(coerce_bool(None), None);
    }

    #[test]
    fn bool_from_every_variant() {
        assert_eq!(coerce_bool(Some(&RawValue::Bool(true))), Some(true));
        assert_eq!(coerce_bool(Some(&RawValue::Int(0))), Some(false));
        assert_eq!(coerce_bool(Some(&RawValue::Int(2))), Some(true));
        assert_eq!(coerce_bool(Some(&RawValue::Float(0.0))), Some(false));
        assert_eq!(coerce_bool(Some(&RawValue::Float(f64::NAN))), None);
        assert_eq!(coerce_bool(Some(&text("TRUE"))), Some(true));
        assert_eq!(coerce_bool(Some(&text("no"))), Some(false));
        assert_eq!(coerce_bool(Some(&text("maybe"))), None);
    }

    #[test]
    fn text_passes_through_and_stringifies() {
        assert_eq!(coerce_text(None), None);
        assert_eq!(coerce_text(Some(&text("BombsiteA"))), Some("BombsiteA".to_owned()));
        assert_eq!(coerce_text(Some(&RawValue::Int(4))), Some("4".to_owned()));
    }

    fn arb_raw_value() -> impl Strategy<Value = RawValue> {
        prop_oneof![
            any::<bool>().prop_map(RawValue::Bool),
            any::<i64>().prop_map(RawValue::Int),
            any::<f64>().prop_map(RawValue::Float),
            prop_oneof![
                Just(f64::NAN),
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
                Just(-0.0),
            ]
            .prop_map(RawValue::Float),
            "\\PC{0,24}".prop_map(RawValue::Text),
            any::<i64>().prop_map(|i| RawValue::Text(format!(" {i} "))),
        ]
    }

    proptest! {
        #[test]
        fn coercion_is_total(value in proptest::option::of(arb_raw_value())) {
            let cell = value.as_ref();
            let _ = coerce_int(cell);
            let _ = coerce_bool(cell);
            if let Some(x) = coerce_float(cell) {
                prop_assert!(x.is_finite());
            }
            prop_assert_eq!(coerce_text(cell).is_some(), cell.is_some());
        }

        #[test]
        fn integers_survive_every_numeric_form(i in any::<i64>()) {
            prop_assert_eq!(coerce_int(Some(&RawValue::Int(i))), Some(i));
            prop_assert_eq!(coerce_int(Some(&RawValue::Text(i.to_string()))), Some(i));
            prop_assert_eq!(coerce_bool(Some(&RawValue::Int(i))), Some(i != 0));
        }

        #[test]
        fn float_to_int_truncates_toward_zero(x in -1.0e15f64..1.0e15) {
            let truncated = coerce_int(Some(&RawValue::Float(x))).unwrap_or_default();
            #[allow(clippy::cast_precision_loss)]
            let back = truncated as f64;
            prop_assert!((back - x.trunc()).abs() < f64::EPSILON);
        }
    }
}
