//! SI-prefixed number formatting for tooltips and the side panel.

const PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Round `x` to `precision` significant digits and return
/// (digits without the decimal point, decimal exponent).
fn decimal_parts(x: f64, precision: usize) -> (String, i32) {
    let s = format!("{:.*e}", precision.saturating_sub(1), x);
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits, exp.parse().unwrap_or(0))
}

/// Format with an SI prefix and `precision` significant digits.
/// With `trim`, insignificant trailing zeros are dropped.
pub fn si(value: f64, precision: usize, trim: bool) -> String {
    if !value.is_finite() {
        return "NA".to_string();
    }
    let precision = precision.max(1);
    let negative = value < 0.0;
    let x = value.abs();

    let (digits, exponent) = decimal_parts(x, precision);
    let prefix_exp = if x == 0.0 {
        0
    } else {
        exponent.div_euclid(3).clamp(-8, 8)
    };
    let i = exponent - prefix_exp * 3 + 1;
    let n = digits.len() as i32;

    let mut body = if i == n {
        digits
    } else if i > n {
        format!("{digits}{}", "0".repeat((i - n) as usize))
    } else if i > 0 {
        let (int, frac) = digits.split_at(i as usize);
        format!("{int}.{frac}")
    } else {
        let (tail, _) = decimal_parts(x, (precision as i32 + i - 1).max(1) as usize);
        format!("0.{}{tail}", "0".repeat((-i) as usize))
    };

    if trim && body.contains('.') {
        body = body.trim_end_matches('0').trim_end_matches('.').to_string();
    }

    let sign = if negative && body.chars().any(|c| c != '0' && c != '.') { "-" } else { "" };
    format!("{sign}{body}{}", PREFIXES[(8 + prefix_exp) as usize])
}

/// Population count the way the panel shows it: trimmed SI, `B` for billions
pub fn people(value: f64) -> String {
    si(value.round(), 6, true).replace('G', "B")
}

/// Population count with 3 significant digits (tooltip style)
pub fn people_short(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => si(v, 3, false).replace('G', "B"),
        _ => "NA".to_string(),
    }
}

/// Percent with one decimal
pub fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1} %"),
        _ => "NA".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_si_fixed_precision() {
        assert_eq!(si(1234.0, 3, false), "1.23k");
        assert_eq!(si(1000.0, 3, false), "1.00k");
        assert_eq!(si(999.0, 3, false), "999");
        assert_eq!(si(12_345_678.0, 3, false), "12.3M");
        assert_eq!(si(42.0, 3, false), "42.0");
    }

    #[test]
    fn test_si_trimmed() {
        assert_eq!(si(1_000_000.0, 6, true), "1M");
        assert_eq!(si(1234.0, 6, true), "1.234k");
        assert_eq!(si(0.0, 6, true), "0");
        assert_eq!(si(-2500.0, 6, true), "-2.5k");
    }

    #[test]
    fn test_si_rounding_carries_exponent() {
        assert_eq!(si(999_999.0, 3, false), "1.00M");
    }

    #[test]
    fn test_billions() {
        assert_eq!(people(759_000_000.0), "759M");
        assert_eq!(people(1_230_000_000.0), "1.23B");
        assert_eq!(people_short(Some(2_540_000_000.0)), "2.54B");
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(people_short(None), "NA");
        assert_eq!(people_short(Some(0.0)), "NA");
        assert_eq!(pct(None), "NA");
        assert_eq!(pct(Some(57.345)), "57.3 %");
    }
}
