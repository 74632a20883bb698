/// Format a number with comma thousands separators and a fixed number of
/// decimal places.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 2), "-9,876.50");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let fixed = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| b != b'0' && b != b'.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format an energy quantity with two decimals and a `kWh` suffix.
///
/// No thousands grouping is applied, so the value matches what per-building
/// reports print.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_kwh;
///
/// assert_eq!(format_kwh(30.0), "30.00 kWh");
/// assert_eq!(format_kwh(1234.567), "1234.57 kWh");
/// ```
pub fn format_kwh(value: f64) -> String {
    format!("{:.2} kWh", value)
}

/// Format an optional statistic for tabular output: two decimals when
/// present, an empty cell when absent.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_optional;
///
/// assert_eq!(format_optional(Some(5.0)), "5.00");
/// assert_eq!(format_optional(None), "");
/// ```
pub fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

/// `(part / whole) * 100`, rounded to `decimal_places`; `0.0` when `whole`
/// is zero.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::percentage;
///
/// assert!((percentage(30.0, 35.0, 1) - 85.7).abs() < 1e-9);
/// assert_eq!(percentage(1.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    (part / whole * 100.0 * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert a comma every three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
