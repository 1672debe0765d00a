use chrono::{Datelike, NaiveDate};
use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Date Formatting
// ============================================================================

/// Describe an expiry date relative to `today`
pub fn format_expiry(expires: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(date) = expires else {
        return "unknown expiry".to_string();
    };
    if date.year() == 9999 {
        return "never expires".to_string();
    }

    let days = (date - today).num_days();
    match days {
        d if d < 0 => format!("expired {} ({} days ago)", date, -d),
        0 => format!("expires today ({date})"),
        1 => format!("expires tomorrow ({date})"),
        d => format!("expires {date} (in {d} days)"),
    }
}
