//! Number formatting for display

/// Fixed-point formatting; a missing value renders as zero at the same precision
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    let value = value.filter(|v| !v.is_nan()).unwrap_or(0.0);
    format!("{:.*}", decimals, value)
}

/// Scale to a B/M/K suffix with two decimals
pub fn format_magnitude(value: f64) -> String {
    if !value.is_finite() {
        return "0.00".to_string();
    }
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}
