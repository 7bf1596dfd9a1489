// Display formatting for result cells

use chrono::{DateTime, NaiveDate, NaiveDateTime};

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(value, crate::search_params::DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

// "2024-01-15T08:05:00" -> "08:05"; unparsable input is shown as is
pub fn format_time(value: &str) -> String {
    parse_timestamp(value)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

// "2024-01-15" -> "Jan 15"
pub fn format_date(value: &str) -> String {
    parse_timestamp(value)
        .map(|dt| dt.format("%b %d").to_string())
        .unwrap_or_else(|| value.to_string())
}

pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn stops_label(stops: u32) -> String {
    match stops {
        0 => "Nonstop".to_string(),
        1 => "1 Stop".to_string(),
        n => format!("{} Stops", n),
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

// en-US currency style: "$1,234.50", "€89.00", "¥1,235"
pub fn format_price(amount: f64, currency: &str) -> String {
    let code = currency.trim().to_ascii_uppercase();
    let (prefix, decimals) = match code.as_str() {
        "USD" => ("$".to_string(), 2),
        "EUR" => ("€".to_string(), 2),
        "GBP" => ("£".to_string(), 2),
        "JPY" => ("¥".to_string(), 0),
        _ => (format!("{}\u{a0}", code), 2),
    };

    if !amount.is_finite() {
        return format!("{}-", prefix);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let mut formatted = format!("{}{}{}", sign, prefix, group_thousands(whole));
    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}
