use chrono::{DateTime, NaiveDate, Utc};

/// Formats a fraction as a percentage, e.g. `0.472` → `47.2%`.
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

/// Formats an already-scaled percentage point value with an explicit sign.
pub fn format_signed_points(points: f64, decimals: usize) -> String {
    if points > 0.0 {
        format!("+{:.*}%", decimals, points)
    } else {
        format!("{:.*}%", decimals, points)
    }
}

/// `11 Feb 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

/// `Feb`
pub fn format_short_month(date: NaiveDate) -> String {
    date.format("%b").to_string()
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Coarse "time ago" label relative to `now`.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_days() > 0 {
        format!("{}d ago", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m ago", elapsed.num_minutes())
    } else {
        "Just now".into()
    }
}
