//! Axis tick formatting

use fd_core::value::format_js_number;

/// Abbreviate large values: `1.2B`, `3.4M`, `5.6K`, otherwise a whole number
pub fn format_axis_value(value: f64) -> String {
    if !value.is_finite() {
        return format_js_number(value);
    }

    if value >= 1e9 {
        format!("{}B", one_decimal(value / 1e9))
    } else if value >= 1e6 {
        format!("{}M", one_decimal(value / 1e6))
    } else if value >= 1e3 {
        format!("{}K", one_decimal(value / 1e3))
    } else {
        let rounded = value.round();
        format!("{:.0}", if rounded == 0.0 { 0.0 } else { rounded })
    }
}

/// One decimal place, halves rounded away from zero
fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}
