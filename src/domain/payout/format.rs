//! Human-readable renderings of payout amounts

use super::amount::Scale;

/// Scales tried by [`format_abbreviated`], largest first
const ABBREVIATIONS: [Scale; 3] = [Scale::Billion, Scale::Million, Scale::Thousand];

// Drops ".00", otherwise trailing zeros and a dangling dot.
fn strip_decimals(rendered: &str) -> &str {
    if let Some(stripped) = rendered.strip_suffix(".00") {
        return stripped;
    }
    if rendered.contains('.') {
        rendered.trim_end_matches('0').trim_end_matches('.')
    } else {
        rendered
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// `1500` → `1,500`, `1500.5` → `1,500.5`, `0.25` → `0.25`
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rendered = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    let full = format!("{}{}.{}", sign, group_thousands(int_part), frac_part);

    strip_decimals(&full).to_string()
}

/// `1000` → `1K`, `1500` → `1.5K`, `1234567` → `1.23M`; below 1000 the
/// grouped form is used.
pub fn format_abbreviated(value: f64) -> String {
    for scale in ABBREVIATIONS {
        let quotient = value / scale.multiplier();
        if quotient >= 1.0 {
            let rendered = format!("{:.2}", quotient);
            return format!("{}{}", strip_decimals(&rendered), scale.letter());
        }
    }
    format_grouped(value)
}
