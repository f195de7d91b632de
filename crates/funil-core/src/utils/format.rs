use chrono::{DateTime, Utc};

/// Format a percentage with one decimal place, or "0" when zero
pub fn format_percentage(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        "0".to_string()
    } else {
        format!("{:.1}", value)
    }
}

/// Group the integer digits with `sep` every three places
fn group_digits(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Format a count with thousands separators (1.234.567)
pub fn format_count(value: u64) -> String {
    group_digits(&value.to_string(), '.')
}

/// Format a money amount the way the dashboard shows it.
/// BRL renders as "R$ 1.234,50"; other codes are suffixed ("1.234,50 USD").
pub fn format_currency(amount: f64, currency: &str) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let body = format!(
        "{},{:02}",
        group_digits(&(cents / 100).to_string(), '.'),
        cents % 100
    );
    let sign = if negative && cents > 0 { "-" } else { "" };

    match currency.to_uppercase().as_str() {
        "" | "BRL" => format!("{}R$ {}", sign, body),
        code => format!("{}{} {}", sign, body, code),
    }
}

/// Format seconds as "45s", "5m 7s" or "2h 3m"
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// dd/mm/yyyy HH:MM, or "-" when unknown
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.0), "0");
        assert_eq!(format_percentage(12.5), "12.5");
        assert_eq!(format_percentage(33.333), "33.3");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5, "BRL"), "R$ 1.234,50");
        assert_eq!(format_currency(0.0, "BRL"), "R$ 0,00");
        assert_eq!(format_currency(97.0, "brl"), "R$ 97,00");
        assert_eq!(format_currency(1_000_000.0, "USD"), "1.000.000,00 USD");
        assert_eq!(format_currency(-5.25, "BRL"), "-R$ 5,25");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1234), "1.234");
        assert_eq!(format_count(1234567), "1.234.567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(307), "5m 7s");
        assert_eq!(format_duration(7380), "2h 3m");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Funil Empréstimo", 8), "Funil...");
    }

    #[test]
    fn test_format_date() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 3, 18, 30, 0).unwrap();
        assert_eq!(format_date(Some(dt)), "03/02/2024 18:30");
        assert_eq!(format_date(None), "-");
    }
}
