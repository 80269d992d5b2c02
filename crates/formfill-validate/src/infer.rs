//! Apparent-type inference for mapped values.
//!
//! Used by the datatype check to decide whether a mapped value plausibly
//! coerces to the target field's declared type.

use std::sync::OnceLock;

use regex::Regex;

use formfill_model::FieldType;

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
    })
}

fn date_patterns() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"^\d{4}[-/.]\d{1,2}[-/.]\d{1,2}$").expect("iso date pattern"),
            Regex::new(r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}$").expect("dmy date pattern"),
            Regex::new(
                r"(?i)^\d{1,2}\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{4}$",
            )
            .expect("month name pattern"),
        ]
    })
}

fn currency_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[$€£]\s?\d{1,3}(,\d{3})*(\.\d{1,2})?$|^[$€£]\s?\d+(\.\d{1,2})?$")
            .expect("currency pattern")
    })
}

/// Infers the apparent type of a raw value string.
///
/// Empty values infer `Unknown` (coercible to anything); values that match
/// no recognizer infer `Text`. Name and address content is
/// indistinguishable from free text, so those never come back from here.
pub fn infer_value_type(value: &str) -> FieldType {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return FieldType::Unknown;
    }
    if matches!(
        trimmed.to_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "y" | "n" | "on" | "off"
    ) {
        return FieldType::Boolean;
    }
    if email_pattern().is_match(trimmed) {
        return FieldType::Email;
    }
    if date_patterns().iter().any(|re| re.is_match(trimmed)) {
        return FieldType::Date;
    }
    if currency_pattern().is_match(trimmed) {
        return FieldType::Currency;
    }
    if trimmed.replace(',', "").parse::<f64>().is_ok() {
        return FieldType::Numeric;
    }
    if looks_like_phone(trimmed) {
        return FieldType::Phone;
    }
    FieldType::Text
}

fn looks_like_phone(value: &str) -> bool {
    if !value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | '.' | ' '))
    {
        return false;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

/// Whether a value of apparent type `apparent` plausibly fills a target
/// declared as `declared`. Total over [`FieldType`].
pub fn coercible(apparent: FieldType, declared: FieldType) -> bool {
    use FieldType as F;
    if apparent == declared {
        return true;
    }
    matches!(
        (apparent, declared),
        (F::Unknown, _)
            | (_, F::Unknown)
            | (_, F::Text)
            | (F::Text, F::Name | F::Address)
            | (F::Numeric, F::Currency | F::Phone)
            | (F::Currency, F::Numeric)
            | (F::Boolean, F::Numeric)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_value_shapes() {
        assert_eq!(infer_value_type("john@example.com"), FieldType::Email);
        assert_eq!(infer_value_type("1990-04-01"), FieldType::Date);
        assert_eq!(infer_value_type("4/1/1990"), FieldType::Date);
        assert_eq!(infer_value_type("12 Mar 1990"), FieldType::Date);
        assert_eq!(infer_value_type("$1,234.56"), FieldType::Currency);
        assert_eq!(infer_value_type("1234.56"), FieldType::Numeric);
        assert_eq!(infer_value_type("555-123-4567"), FieldType::Phone);
        assert_eq!(infer_value_type("yes"), FieldType::Boolean);
        assert_eq!(infer_value_type("John Doe"), FieldType::Text);
        assert_eq!(infer_value_type(""), FieldType::Unknown);
    }

    #[test]
    fn plain_digit_runs_prefer_numeric() {
        // A bare ten-digit run parses as a number first; coercion rules
        // still allow it into a phone target.
        assert_eq!(infer_value_type("5551234567"), FieldType::Numeric);
        assert!(coercible(FieldType::Numeric, FieldType::Phone));
    }

    #[test]
    fn coercion_is_total_over_the_enum() {
        for apparent in FieldType::ALL {
            for declared in FieldType::ALL {
                // Just exercise every pair; the function must not panic.
                let _ = coercible(apparent, declared);
            }
        }
        assert!(coercible(FieldType::Unknown, FieldType::Date));
        assert!(coercible(FieldType::Text, FieldType::Name));
        assert!(!coercible(FieldType::Email, FieldType::Date));
        assert!(!coercible(FieldType::Date, FieldType::Email));
    }
}
