//! Number parsing and display formatting for grid cells.
//!
//! Display strings follow German notation: `.` groups thousands, `,` is
//! the decimal separator. Missing or non-finite values render as `–`.

/// Input columns holding euro amounts
const EURO_INPUTS: &[&str] = &["Adspend", "Revenue", "Cash"];

/// KPI columns holding euro amounts
const EURO_KPIS: &[&str] = &[
    "CPM", "CPC", "CPL", "CPS", "SurveyQuali-€", "Booking-€", "Termin-€", "SUR-€", "ST-€",
    "CT-€", "SB-€", "SS-€", "CB-€", "CS-€", "CPA", "EPA-C", "R-P/L", "C-P/L",
];

const ROI_KPIS: &[&str] = &["R-ROI", "C-ROI"];

pub const MISSING: &str = "–";

/// Column part of a field key (`Adspend_3` -> `Adspend`, `CPM_W2` -> `CPM`)
pub fn column_of(key: &str) -> &str {
    key.rsplit_once('_').map(|(col, _)| col).unwrap_or(key)
}

/// Parse user input typed in German notation.
///
/// Everything except digits, `,`, `.` and `-` is dropped, `.` is treated as a
/// thousands separator and `,` as the decimal point. So `"1.234,5 €"` is
/// 1234.5 and `"1.5"` is 15.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .filter(|&c| c != '.')
        .collect();
    let cleaned = cleaned.replacen(',', ".", 1);

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Raw value as shown while editing: no grouping, decimal comma
pub fn edit_text(value: f64) -> String {
    format!("{}", value).replace('.', ",")
}

/// Group an unsigned integer string with `.` every three digits
fn group_thousands(digits: &str) -> String {
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect::<Vec<_>>()
        .join(".")
}

/// Fixed decimals with German separators (e.g., 1234.567, 2 -> 1.234,57)
pub fn format_decimal(val: f64, decimals: usize) -> String {
    if !val.is_finite() {
        return MISSING.to_string();
    }

    let rendered = format!("{:.prec$}", val.abs(), prec = decimals);
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    // -0,00 reads as noise
    let is_negative = val < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0');
    let sign = if is_negative { "-" } else { "" };

    match frac_part {
        Some(f) => format!("{}{},{}", sign, group_thousands(int_part), f),
        None => format!("{}{}", sign, group_thousands(int_part)),
    }
}

/// Euro amount (e.g., 1234.5 -> 1.234,50 €)
pub fn format_euro(val: f64) -> String {
    if !val.is_finite() {
        return MISSING.to_string();
    }
    format!("{} €", format_decimal(val, 2))
}

/// Whole count (e.g., 1234 -> 1.234)
pub fn format_count(val: f64) -> String {
    format_decimal(val, 0)
}

/// Format the value of an input field for display
pub fn format_input(val: f64, key: &str) -> String {
    if EURO_INPUTS.contains(&column_of(key)) {
        format_euro(val)
    } else {
        format_count(val)
    }
}

/// Format a derived KPI value for display
pub fn format_kpi(val: f64, key: &str) -> String {
    if !val.is_finite() {
        return MISSING.to_string();
    }
    let col = column_of(key);

    if EURO_KPIS.contains(&col) {
        return format_euro(val);
    }
    if col.contains('%') {
        return format!("{} %", format_decimal(val, 2));
    }
    if ROI_KPIS.contains(&col) {
        return format!("{}×", format_decimal(val, 2));
    }
    format_decimal(val, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_of() {
        assert_eq!(column_of("Adspend_3"), "Adspend");
        assert_eq!(column_of("CPM_W2"), "CPM");
        assert_eq!(column_of("Emails Sent_12"), "Emails Sent");
        assert_eq!(column_of("R-P/L"), "R-P/L");
    }

    #[test]
    fn test_parse_number_german() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("1234,5"), Some(1234.5));
        assert_eq!(parse_number("1.234,56 €"), Some(1234.56));
        assert_eq!(parse_number("-12,5"), Some(-12.5));
        assert_eq!(parse_number("  7  "), Some(7.0));
    }

    #[test]
    fn test_parse_number_dot_is_grouping() {
        assert_eq!(parse_number("1.5"), Some(15.0));
        assert_eq!(parse_number("1.000.000"), Some(1_000_000.0));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number(","), None);
    }

    #[test]
    fn test_edit_text() {
        assert_eq!(edit_text(42.0), "42");
        assert_eq!(edit_text(1234.5), "1234,5");
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(1234.567, 2), "1.234,57");
        assert_eq!(format_decimal(1_000_000.0, 0), "1.000.000");
        assert_eq!(format_decimal(-1234.5, 1), "-1.234,5");
        assert_eq!(format_decimal(-0.001, 2), "0,00");
        assert_eq!(format_decimal(f64::NAN, 2), "–");
    }

    #[test]
    fn test_format_input() {
        assert_eq!(format_input(1234.5, "Adspend_3"), "1.234,50 €");
        assert_eq!(format_input(42.0, "Clicks_3"), "42");
        assert_eq!(format_input(1234.0, "Leads"), "1.234");
    }

    #[test]
    fn test_format_kpi() {
        assert_eq!(format_kpi(2.5, "CPC_4"), "2,50 €");
        assert_eq!(format_kpi(12.5, "CTR-%_W1"), "12,50 %");
        assert_eq!(format_kpi(3.0, "R-ROI"), "3,00×");
        assert_eq!(format_kpi(1.0, "Unknown"), "1,00");
        assert_eq!(format_kpi(f64::INFINITY, "CPC"), "–");
    }
}
