//! Display formatting for ages and amounts.
//!
//! The engine reports unrounded balances; rounding to cents happens here.

pub fn currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc();
    let frac = cents - whole * 100.0;
    let sign = if value < 0.0 && cents > 0.0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(whole), frac as u64)
}

/// Axis-tick style amount: `$1.2B`, `$3.4M`, otherwise whole units.
pub fn compact_currency(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("${:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else {
        format!("${value:.0}")
    }
}

pub fn age_label(age: f64) -> String {
    if age.fract() == 0.0 {
        format!("Age {age:.0}")
    } else {
        format!("Age {age:.2}")
    }
}

fn group_thousands(whole: f64) -> String {
    let digits = format!("{whole:.0}");
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
